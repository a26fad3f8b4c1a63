//! Seams between the client and the chain: read-only calls and the signing wallet.

use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::AccountAddress,
    protocol::{EntryFunctionId, EntryFunctionPayload, PendingTransaction, TransactionOptions},
};

use crate::error::{NodeError, WalletError};

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Read-only call of a `#[view]` function.
    async fn view(&self, function: &EntryFunctionId, arguments: Vec<Value>)
        -> Result<Vec<Value>, NodeError>;

    /// Resolves once the transaction has committed successfully.
    async fn wait_for_transaction(&self, hash: &str) -> Result<(), NodeError>;
}

#[async_trait]
pub trait Wallet: Send + Sync {
    fn account(&self) -> Option<AccountAddress>;

    async fn sign_and_submit_transaction(
        &self,
        payload: EntryFunctionPayload,
        options: TransactionOptions,
    ) -> Result<PendingTransaction, WalletError>;
}

pub struct DisconnectedWallet;

#[async_trait]
impl Wallet for DisconnectedWallet {
    fn account(&self) -> Option<AccountAddress> {
        None
    }

    async fn sign_and_submit_transaction(
        &self,
        _payload: EntryFunctionPayload,
        _options: TransactionOptions,
    ) -> Result<PendingTransaction, WalletError> {
        Err(WalletError::NotConnected)
    }
}
