//! Single-key ed25519 wallet that signs through the node's `encode_submission` endpoint.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use shared::{
    domain::AccountAddress,
    protocol::{
        EntryFunctionPayload, PendingTransaction, SubmitTransactionRequest, TransactionOptions,
        TransactionPayload, TransactionSignature, UserTransactionRequest,
    },
};
use tracing::info;
use zeroize::Zeroize;

use crate::{chain::Wallet, error::WalletError, node_client::NodeClient};

/// AIP-80 prefix some tools put in front of exported keys.
const AIP80_ED25519_PREFIX: &str = "ed25519-priv-";
pub const DEFAULT_EXPIRATION_SECS: u64 = 60;

pub struct LocalWallet {
    node: NodeClient,
    account: AccountAddress,
    signing_key: SigningKey,
    expiration_secs: u64,
}

impl LocalWallet {
    /// The address is not derived from the key: a rotated account keeps its address.
    pub fn new(node: NodeClient, account: AccountAddress, signing_key: SigningKey) -> Self {
        Self {
            node,
            account,
            signing_key,
            expiration_secs: DEFAULT_EXPIRATION_SECS,
        }
    }

    pub fn from_hex_key(
        node: NodeClient,
        account: AccountAddress,
        private_key_hex: &str,
    ) -> Result<Self, WalletError> {
        Ok(Self::new(node, account, parse_signing_key(private_key_hex)?))
    }

    pub fn with_expiration_secs(mut self, secs: u64) -> Self {
        self.expiration_secs = secs;
        self
    }

    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.verifying_key().as_bytes()))
    }

    fn expiration_timestamp(&self) -> u64 {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        now + self.expiration_secs
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    fn account(&self) -> Option<AccountAddress> {
        Some(self.account)
    }

    async fn sign_and_submit_transaction(
        &self,
        payload: EntryFunctionPayload,
        options: TransactionOptions,
    ) -> Result<PendingTransaction, WalletError> {
        let account = self.node.account(self.account).await?;
        let transaction = UserTransactionRequest {
            sender: self.account,
            sequence_number: account.sequence_number,
            max_gas_amount: options.max_gas_amount,
            gas_unit_price: options.gas_unit_price,
            expiration_timestamp_secs: self.expiration_timestamp(),
            payload: TransactionPayload::EntryFunctionPayload(payload),
        };

        let signing_message = self.node.encode_submission(&transaction).await?;
        let signature = self.signing_key.sign(&signing_message);
        info!(
            sender = %self.account,
            sequence_number = transaction.sequence_number,
            "signed transaction"
        );

        let request = SubmitTransactionRequest {
            transaction,
            signature: TransactionSignature::Ed25519Signature {
                public_key: self.public_key_hex(),
                signature: format!("0x{}", hex::encode(signature.to_bytes())),
            },
        };
        Ok(self.node.submit_transaction(&request).await?)
    }
}

pub fn parse_signing_key(raw: &str) -> Result<SigningKey, WalletError> {
    let trimmed = raw.trim();
    let without_prefix = trimmed
        .strip_prefix(AIP80_ED25519_PREFIX)
        .unwrap_or(trimmed);
    let digits = without_prefix
        .strip_prefix("0x")
        .unwrap_or(without_prefix);

    let mut bytes =
        hex::decode(digits).map_err(|err| WalletError::InvalidKey(format!("not hex: {err}")))?;
    if bytes.len() != SECRET_KEY_LENGTH {
        let len = bytes.len();
        bytes.zeroize();
        return Err(WalletError::InvalidKey(format!(
            "expected {SECRET_KEY_LENGTH} bytes, got {len}"
        )));
    }

    let mut secret = [0u8; SECRET_KEY_LENGTH];
    secret.copy_from_slice(&bytes);
    bytes.zeroize();
    let key = SigningKey::from_bytes(&secret);
    secret.zeroize();
    Ok(key)
}

#[cfg(test)]
#[path = "tests/wallet_tests.rs"]
mod tests;
