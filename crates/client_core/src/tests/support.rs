//! In-memory chain and wallet doubles shared by the unit tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::AccountAddress,
    error::{ApiException, ErrorCode},
    protocol::{
        EntryFunctionId, EntryFunctionPayload, PendingTransaction, TransactionOptions,
        GET_NEXT_IDS, GET_SKILL,
    },
};
use tokio::sync::Notify;

use crate::{
    chain::{ChainReader, Wallet},
    error::{NodeError, WalletError},
};

pub fn address(raw: &str) -> AccountAddress {
    raw.parse().expect("address")
}

pub fn module() -> AccountAddress {
    address("0xcafe")
}

pub fn skill_row(name: &str, owner: AccountAddress, verified: bool) -> Vec<Value> {
    vec![
        json!(name),
        json!(format!("{name} description")),
        json!(format!("https://example.com/{name}")),
        json!(verified),
        json!(owner.to_hex_literal()),
    ]
}

fn not_found(path: &str) -> NodeError {
    NodeError::Api {
        path: path.to_string(),
        status: 400,
        error: ApiException::new(ErrorCode::VmError, "Move abort: E_SKILL_NOT_FOUND"),
    }
}

#[derive(Default)]
pub struct FakeChain {
    /// `None` behaves like an undeployed module.
    pub next_id: Mutex<Option<u64>>,
    pub rows: Mutex<BTreeMap<u64, Vec<Value>>>,
    pub view_calls: Mutex<Vec<(String, Vec<Value>)>>,
    pub waited: Mutex<Vec<String>>,
    pub wait_failure: Mutex<Option<String>>,
    /// Parks the next `get_next_ids` call until notified; the answer is taken before parking.
    pub hold_next_ids: Mutex<Option<Arc<Notify>>>,
}

impl FakeChain {
    pub fn with_skills(rows: Vec<(u64, Vec<Value>)>, next_id: u64) -> Arc<Self> {
        let chain = Self::default();
        *chain.next_id.lock().expect("lock") = Some(next_id);
        chain.rows.lock().expect("lock").extend(rows);
        Arc::new(chain)
    }

    pub fn undeployed() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_skills(&self, rows: Vec<(u64, Vec<Value>)>, next_id: u64) {
        *self.next_id.lock().expect("lock") = Some(next_id);
        let mut stored = self.rows.lock().expect("lock");
        stored.clear();
        stored.extend(rows);
    }

    pub fn view_count(&self) -> usize {
        self.view_calls.lock().expect("lock").len()
    }

    pub fn skill_lookups(&self) -> Vec<String> {
        self.view_calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|(function, _)| function == GET_SKILL)
            .map(|(_, args)| args[0].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn view(
        &self,
        function: &EntryFunctionId,
        arguments: Vec<Value>,
    ) -> Result<Vec<Value>, NodeError> {
        self.view_calls
            .lock()
            .expect("lock")
            .push((function.function_name.clone(), arguments.clone()));

        match function.function_name.as_str() {
            GET_NEXT_IDS => {
                let answer = *self.next_id.lock().expect("lock");
                let hold = self.hold_next_ids.lock().expect("lock").take();
                if let Some(hold) = hold {
                    hold.notified().await;
                }
                match answer {
                    Some(next) => Ok(vec![json!(next.to_string()), json!("1")]),
                    None => Err(NodeError::Api {
                        path: "view".to_string(),
                        status: 400,
                        error: ApiException::new(ErrorCode::ModuleNotFound, "Module not found"),
                    }),
                }
            }
            GET_SKILL => {
                let id: u64 = arguments[0]
                    .as_str()
                    .and_then(|raw| raw.parse().ok())
                    .expect("skill id argument");
                self.rows
                    .lock()
                    .expect("lock")
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| not_found("view"))
            }
            other => panic!("unexpected view function {other}"),
        }
    }

    async fn wait_for_transaction(&self, hash: &str) -> Result<(), NodeError> {
        self.waited.lock().expect("lock").push(hash.to_string());
        match self.wait_failure.lock().expect("lock").clone() {
            Some(vm_status) => Err(NodeError::TransactionFailed {
                hash: hash.to_string(),
                vm_status,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakeWallet {
    pub account: Option<AccountAddress>,
    pub submitted: Mutex<Vec<(EntryFunctionPayload, TransactionOptions)>>,
    pub reject_with: Mutex<Option<String>>,
    /// Parks submissions until notified.
    pub hold: Mutex<Option<Arc<Notify>>>,
}

impl FakeWallet {
    pub fn connected(account: AccountAddress) -> Arc<Self> {
        Arc::new(Self {
            account: Some(account),
            ..Self::default()
        })
    }

    pub fn submissions(&self) -> Vec<EntryFunctionPayload> {
        self.submitted
            .lock()
            .expect("lock")
            .iter()
            .map(|(payload, _)| payload.clone())
            .collect()
    }
}

#[async_trait]
impl Wallet for FakeWallet {
    fn account(&self) -> Option<AccountAddress> {
        self.account
    }

    async fn sign_and_submit_transaction(
        &self,
        payload: EntryFunctionPayload,
        options: TransactionOptions,
    ) -> Result<PendingTransaction, WalletError> {
        let count = {
            let mut submitted = self.submitted.lock().expect("lock");
            submitted.push((payload, options));
            submitted.len()
        };

        let hold = self.hold.lock().expect("lock").clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        if let Some(reason) = self.reject_with.lock().expect("lock").clone() {
            return Err(WalletError::Rejected(reason));
        }
        Ok(PendingTransaction {
            hash: format!("0x{count:064x}"),
        })
    }
}

pub mod fake_node {
    use std::sync::Arc;

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use tokio::{net::TcpListener, sync::Mutex};

    pub const SUBMITTED_HASH: &str = "0xfeedbeef";
    pub const SIGNING_MESSAGE: [u8; 4] = [1, 2, 3, 4];

    #[derive(Clone, Default)]
    pub struct FakeNodeState {
        pub view_bodies: Arc<Mutex<Vec<Value>>>,
        pub encode_bodies: Arc<Mutex<Vec<Value>>>,
        pub submitted_bodies: Arc<Mutex<Vec<Value>>>,
        pub account_lookups: Arc<Mutex<Vec<String>>>,
        /// Responses for `by_hash`, consumed in order; the last one repeats.
        pub by_hash_script: Arc<Mutex<Vec<(StatusCode, Value)>>>,
        pub by_hash_polls: Arc<Mutex<u32>>,
    }

    impl FakeNodeState {
        pub async fn script_by_hash(&self, responses: Vec<(StatusCode, Value)>) {
            *self.by_hash_script.lock().await = responses;
        }
    }

    pub fn committed(hash: &str, success: bool, vm_status: &str) -> (StatusCode, Value) {
        (
            StatusCode::OK,
            json!({
                "type": "user_transaction",
                "hash": hash,
                "version": "42",
                "success": success,
                "vm_status": vm_status,
            }),
        )
    }

    pub fn pending(hash: &str) -> (StatusCode, Value) {
        (
            StatusCode::OK,
            json!({"type": "pending_transaction", "hash": hash}),
        )
    }

    pub fn missing() -> (StatusCode, Value) {
        (
            StatusCode::NOT_FOUND,
            json!({
                "message": "Transaction not found",
                "error_code": "transaction_not_found",
                "vm_error_code": null,
            }),
        )
    }

    async fn view(State(state): State<FakeNodeState>, Json(body): Json<Value>) -> impl IntoResponse {
        state.view_bodies.lock().await.push(body.clone());
        let function = body["function"].as_str().unwrap_or_default().to_string();
        if function.ends_with("::get_skill") && body["arguments"][0] == json!("404") {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Move abort in skillchain: E_SKILL_NOT_FOUND(0x1)",
                    "error_code": "vm_error",
                    "vm_error_code": 4016,
                })),
            );
        }
        (StatusCode::OK, Json(json!(["3", "1"])))
    }

    async fn account(
        State(state): State<FakeNodeState>,
        Path(address): Path<String>,
    ) -> Json<Value> {
        state.account_lookups.lock().await.push(address);
        Json(json!({"sequence_number": "5", "authentication_key": "0x00"}))
    }

    async fn encode_submission(
        State(state): State<FakeNodeState>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        state.encode_bodies.lock().await.push(body);
        Json(json!(format!("0x{}", hex::encode(SIGNING_MESSAGE))))
    }

    async fn submit(
        State(state): State<FakeNodeState>,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        state.submitted_bodies.lock().await.push(body);
        (
            StatusCode::ACCEPTED,
            Json(json!({"type": "pending_transaction", "hash": SUBMITTED_HASH})),
        )
    }

    async fn by_hash(
        State(state): State<FakeNodeState>,
        Path(_hash): Path<String>,
    ) -> impl IntoResponse {
        *state.by_hash_polls.lock().await += 1;
        let mut script = state.by_hash_script.lock().await;
        let (status, body) = if script.len() > 1 {
            script.remove(0)
        } else {
            script.first().cloned().unwrap_or_else(missing)
        };
        (status, Json(body))
    }

    /// Serves the fullnode routes the client uses; returns the node root URL.
    pub async fn spawn() -> (String, FakeNodeState) {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let state = FakeNodeState::default();
        let app = Router::new()
            .route("/v1/view", post(view))
            .route("/v1/accounts/:address", get(account))
            .route("/v1/transactions/encode_submission", post(encode_submission))
            .route("/v1/transactions", post(submit))
            .route("/v1/transactions/by_hash/:hash", get(by_hash))
            .with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), state)
    }
}
