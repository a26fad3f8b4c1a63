use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes reported by the fullnode REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    AccountNotFound,
    ResourceNotFound,
    ModuleNotFound,
    StructFieldNotFound,
    VersionNotFound,
    TransactionNotFound,
    TableItemNotFound,
    BlockNotFound,
    VersionPruned,
    InvalidInput,
    InvalidTransactionUpdate,
    SequenceNumberTooOld,
    VmError,
    HealthCheckFailed,
    MempoolIsFull,
    InternalError,
    WebFrameworkError,
    #[serde(other)]
    Unknown,
}

/// Body of a non-2xx fullnode response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_error_code: Option<u64>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: Some(code),
            vm_error_code: None,
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            code: value.error_code.unwrap_or(ErrorCode::Unknown),
            message: value.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_node_error_body_with_unknown_code() {
        let body = r#"{"message":"boom","error_code":"something_new","vm_error_code":null}"#;
        let err: ApiError = serde_json::from_str(body).expect("decode");
        assert_eq!(err.error_code, Some(ErrorCode::Unknown));
    }

    #[test]
    fn wraps_missing_transaction_body() {
        let body = r#"{"message":"Transaction not found","error_code":"transaction_not_found"}"#;
        let err: ApiError = serde_json::from_str(body).expect("decode");
        assert_eq!(err.error_code, Some(ErrorCode::TransactionNotFound));
        let exception = ApiException::from(err);
        assert_eq!(exception.to_string(), "TransactionNotFound: Transaction not found");
    }
}
