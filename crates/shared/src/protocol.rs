use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::domain::AccountAddress;

/// Name of the on-chain module every call targets.
pub const SKILLCHAIN_MODULE: &str = "skillchain";

pub const GET_NEXT_IDS: &str = "get_next_ids";
pub const GET_SKILL: &str = "get_skill";
pub const MINT_SKILL: &str = "mint_skill";
pub const VALIDATE_SKILL: &str = "validate_skill";

/// Aptos encodes `u64` as a decimal string on the wire; accept both forms on input.
pub mod string_u64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(de::Error::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}

/// Fully qualified `address::module::function` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFunctionId {
    pub module_address: AccountAddress,
    pub module_name: String,
    pub function_name: String,
}

impl EntryFunctionId {
    pub fn skillchain(module_address: AccountAddress, function_name: &str) -> Self {
        Self {
            module_address,
            module_name: SKILLCHAIN_MODULE.to_string(),
            function_name: function_name.to_string(),
        }
    }
}

impl fmt::Display for EntryFunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}",
            self.module_address, self.module_name, self.function_name
        )
    }
}

impl Serialize for EntryFunctionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewRequest {
    pub function: EntryFunctionId,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl ViewRequest {
    pub fn new(function: EntryFunctionId, arguments: Vec<Value>) -> Self {
        Self {
            function,
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryFunctionPayload {
    pub function: EntryFunctionId,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl EntryFunctionPayload {
    pub fn new(function: EntryFunctionId, arguments: Vec<Value>) -> Self {
        Self {
            function,
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionPayload {
    EntryFunctionPayload(EntryFunctionPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_gas_amount: 10_000,
            gas_unit_price: 100,
        }
    }
}

/// Unsigned user transaction, as accepted by `encode_submission`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTransactionRequest {
    pub sender: AccountAddress,
    #[serde(with = "string_u64")]
    pub sequence_number: u64,
    #[serde(with = "string_u64")]
    pub max_gas_amount: u64,
    #[serde(with = "string_u64")]
    pub gas_unit_price: u64,
    #[serde(with = "string_u64")]
    pub expiration_timestamp_secs: u64,
    pub payload: TransactionPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionSignature {
    Ed25519Signature {
        public_key: String,
        signature: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitTransactionRequest {
    #[serde(flatten)]
    pub transaction: UserTransactionRequest,
    pub signature: TransactionSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountData {
    #[serde(with = "string_u64")]
    pub sequence_number: u64,
    pub authentication_key: String,
}

/// The subset of a transaction-by-hash response needed to decide whether it committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub vm_status: Option<String>,
}

impl TransactionInfo {
    pub fn is_pending(&self) -> bool {
        self.kind == "pending_transaction"
    }
}
