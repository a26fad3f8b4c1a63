//! Local validation, payload construction and the single in-flight transaction guard.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;
use shared::{
    domain::{AccountAddress, SkillId},
    protocol::{
        EntryFunctionId, EntryFunctionPayload, PendingTransaction, TransactionOptions,
        MINT_SKILL, VALIDATE_SKILL,
    },
};
use tracing::info;

use crate::{
    chain::{ChainReader, Wallet},
    error::MutationError,
    snapshot::Snapshot,
};

pub const MISSING_FIELDS: &str = "Please fill in all fields";
pub const MISSING_SKILL_ID: &str = "Please enter skill ID";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MintSkillForm {
    pub name: String,
    pub description: String,
    pub evidence_url: String,
}

impl MintSkillForm {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        evidence_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            evidence_url: evidence_url.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.name, &self.description, &self.evidence_url]
            .iter()
            .all(|field| !field.is_empty())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateBountyForm {
    pub title: String,
    pub description: String,
    pub reward_apt: f64,
}

impl Default for CreateBountyForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            reward_apt: 1.0,
        }
    }
}

/// Parses the validate form's id field.
pub fn parse_skill_id(raw: &str) -> Result<SkillId, MutationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MutationError::MissingInformation(MISSING_SKILL_ID));
    }
    trimmed
        .parse::<u64>()
        .map(SkillId)
        .map_err(|_| MutationError::InvalidSkillId(trimmed.to_string()))
}

/// Advisory only: the contract enforces the real rule. Unknown ids pass.
pub fn ensure_not_own_skill(
    snapshot: &Snapshot,
    id: SkillId,
    account: AccountAddress,
) -> Result<(), MutationError> {
    match snapshot.find_skill(id) {
        Some(skill) if skill.owner == account => Err(MutationError::OwnSkill(id)),
        _ => Ok(()),
    }
}

pub fn mint_skill_payload(module_address: AccountAddress, form: &MintSkillForm) -> EntryFunctionPayload {
    EntryFunctionPayload::new(
        EntryFunctionId::skillchain(module_address, MINT_SKILL),
        vec![
            json!(form.name),
            json!(form.description),
            json!(form.evidence_url),
        ],
    )
}

pub fn validate_skill_payload(module_address: AccountAddress, id: SkillId) -> EntryFunctionPayload {
    EntryFunctionPayload::new(
        EntryFunctionId::skillchain(module_address, VALIDATE_SKILL),
        vec![json!(id.0.to_string())],
    )
}

/// Mutual exclusion flag for mutations: a second caller is refused, not queued.
#[derive(Debug, Default)]
pub struct TransactionGuard {
    in_progress: AtomicBool,
}

impl TransactionGuard {
    pub fn try_acquire(&self) -> Option<TransactionPermit<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TransactionPermit { guard: self })
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

pub struct TransactionPermit<'a> {
    guard: &'a TransactionGuard,
}

impl Drop for TransactionPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_progress.store(false, Ordering::Release);
    }
}

/// Signs and submits `payload`, then blocks until the node reports it committed.
pub async fn submit_and_confirm(
    reader: &dyn ChainReader,
    wallet: &dyn Wallet,
    payload: EntryFunctionPayload,
    options: TransactionOptions,
) -> Result<PendingTransaction, MutationError> {
    let function = payload.function.to_string();
    let pending = wallet.sign_and_submit_transaction(payload, options).await?;
    reader.wait_for_transaction(&pending.hash).await?;
    info!(hash = %pending.hash, function, "transaction confirmed");
    Ok(pending)
}

#[cfg(test)]
#[path = "tests/mutations_tests.rs"]
mod tests;
