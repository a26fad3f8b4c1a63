use shared::{
    domain::{AddressParseError, SkillId},
    error::ApiException,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid node url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("node rejected {path} (HTTP {status}): {error}")]
    Api {
        path: String,
        status: u16,
        error: ApiException,
    },
    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },
    #[error("transaction {hash} failed: {vm_status}")]
    TransactionFailed { hash: String, vm_status: String },
    #[error("timed out waiting for transaction {hash}")]
    ConfirmationTimeout { hash: String },
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no wallet connected")]
    NotConnected,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("invalid account address: {0}")]
    InvalidAddress(#[from] AddressParseError),
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Node(#[from] NodeError),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read next ids: {0}")]
    NextIds(#[source] NodeError),
    #[error("malformed next ids response: {0}")]
    MalformedNextIds(String),
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("missing information: {0}")]
    MissingInformation(&'static str),
    #[error("'{0}' is not a valid skill id")]
    InvalidSkillId(String),
    #[error("skill {0} is owned by the connected account")]
    OwnSkill(SkillId),
    #[error("bounty creation not implemented in current contract")]
    Unavailable,
    #[error("another transaction is in progress")]
    InProgress,
    #[error(transparent)]
    Submission(#[from] WalletError),
    #[error(transparent)]
    Confirmation(#[from] NodeError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("wallet needs both an account address and a private key")]
    IncompleteWallet,
}
