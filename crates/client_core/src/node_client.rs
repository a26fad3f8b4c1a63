//! HTTP client for the fullnode REST API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::AccountAddress,
    error::{ApiError, ApiException, ErrorCode},
    protocol::{
        AccountData, EntryFunctionId, PendingTransaction, SubmitTransactionRequest,
        TransactionInfo, UserTransactionRequest, ViewRequest,
    },
};
use tracing::{debug, info};
use url::Url;

use crate::{chain::ChainReader, error::NodeError};

const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct NodeClient {
    http: Client,
    base_url: String,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl NodeClient {
    /// Accepts either the node root (`https://host`) or the API root (`https://host/v1`).
    pub fn new(node_url: &str) -> Result<Self, NodeError> {
        let base_url = normalize_base_url(node_url)?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|source| NodeError::Transport {
                path: base_url.clone(),
                source,
            })?;
        Ok(Self {
            http,
            base_url,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn account(&self, address: AccountAddress) -> Result<AccountData, NodeError> {
        self.get_json(&format!("accounts/{address}")).await
    }

    pub async fn view_function(&self, request: &ViewRequest) -> Result<Vec<Value>, NodeError> {
        self.post_json("view", request).await
    }

    /// Returns the bytes the sender must sign for `request`.
    pub async fn encode_submission(
        &self,
        request: &UserTransactionRequest,
    ) -> Result<Vec<u8>, NodeError> {
        let path = "transactions/encode_submission";
        let encoded: String = self.post_json(path, request).await?;
        let digits = encoded.strip_prefix("0x").unwrap_or(&encoded);
        hex::decode(digits).map_err(|err| NodeError::Decode {
            path: path.to_string(),
            message: format!("signing message is not hex: {err}"),
        })
    }

    pub async fn submit_transaction(
        &self,
        request: &SubmitTransactionRequest,
    ) -> Result<PendingTransaction, NodeError> {
        let pending: PendingTransaction = self.post_json("transactions", request).await?;
        info!(hash = %pending.hash, "transaction submitted");
        Ok(pending)
    }

    /// `None` while the node has not seen the transaction yet.
    pub async fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionInfo>, NodeError> {
        match self
            .get_json::<TransactionInfo>(&format!("transactions/by_hash/{hash}"))
            .await
        {
            Ok(info) => Ok(Some(info)),
            Err(NodeError::Api { status, error, .. })
                if status == StatusCode::NOT_FOUND.as_u16()
                    || error.code == ErrorCode::TransactionNotFound =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn wait_for_committed(&self, hash: &str) -> Result<TransactionInfo, NodeError> {
        let started = Instant::now();
        loop {
            if let Some(info) = self.transaction_by_hash(hash).await? {
                if !info.is_pending() {
                    return match info.success {
                        Some(true) => Ok(info),
                        _ => Err(NodeError::TransactionFailed {
                            hash: hash.to_string(),
                            vm_status: info
                                .vm_status
                                .clone()
                                .unwrap_or_else(|| "unknown vm status".to_string()),
                        }),
                    };
                }
            }

            if started.elapsed() >= self.confirmation_timeout {
                return Err(NodeError::ConfirmationTimeout {
                    hash: hash.to_string(),
                });
            }
            debug!(hash, "transaction still pending");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|source| NodeError::Transport {
                path: path.to_string(),
                source,
            })?;
        decode_response(path, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NodeError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|source| NodeError::Transport {
                path: path.to_string(),
                source,
            })?;
        decode_response(path, response).await
    }
}

#[async_trait]
impl ChainReader for NodeClient {
    async fn view(
        &self,
        function: &EntryFunctionId,
        arguments: Vec<Value>,
    ) -> Result<Vec<Value>, NodeError> {
        self.view_function(&ViewRequest::new(function.clone(), arguments))
            .await
    }

    async fn wait_for_transaction(&self, hash: &str) -> Result<(), NodeError> {
        self.wait_for_committed(hash).await.map(|_| ())
    }
}

async fn decode_response<T: DeserializeOwned>(
    path: &str,
    response: Response,
) -> Result<T, NodeError> {
    let status = response.status();
    let body = response.bytes().await.map_err(|source| NodeError::Transport {
        path: path.to_string(),
        source,
    })?;

    if !status.is_success() {
        let error = serde_json::from_slice::<ApiError>(&body)
            .map(ApiException::from)
            .unwrap_or_else(|_| {
                ApiException::new(
                    ErrorCode::Unknown,
                    String::from_utf8_lossy(&body).trim().to_string(),
                )
            });
        return Err(NodeError::Api {
            path: path.to_string(),
            status: status.as_u16(),
            error,
        });
    }

    serde_json::from_slice(&body).map_err(|err| NodeError::Decode {
        path: path.to_string(),
        message: err.to_string(),
    })
}

fn normalize_base_url(node_url: &str) -> Result<String, NodeError> {
    let trimmed = node_url.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| NodeError::InvalidUrl {
        url: node_url.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(NodeError::InvalidUrl {
            url: node_url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    if trimmed.ends_with("/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/v1"))
    }
}

#[cfg(test)]
#[path = "tests/node_client_tests.rs"]
mod tests;
