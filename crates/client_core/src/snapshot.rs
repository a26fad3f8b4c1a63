//! Rebuilds the on-chain skill list by walking the contract's id space.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{
    domain::{AccountAddress, Bounty, Skill, SkillId, UserProfile},
    protocol::{EntryFunctionId, GET_NEXT_IDS, GET_SKILL},
};
use tracing::{debug, info, warn};

use crate::{chain::ChainReader, error::FetchError};

/// Wholesale copy of everything the front-end displays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub skills: Vec<Skill>,
    /// The deployed contract has no bounty storage; always empty.
    pub bounties: Vec<Bounty>,
    pub profile: UserProfile,
}

impl Snapshot {
    pub fn find_skill(&self, id: SkillId) -> Option<&Skill> {
        self.skills.iter().find(|skill| skill.id == id)
    }

    pub fn unverified_skills(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(|skill| !skill.is_verified)
    }

    pub fn active_bounties(&self) -> impl Iterator<Item = &Bounty> {
        self.bounties.iter().filter(|bounty| bounty.is_active)
    }
}

/// Calls `get_next_ids`, then `get_skill` for each id in `1..next`, one at a time.
pub async fn fetch_snapshot(
    reader: &dyn ChainReader,
    module_address: AccountAddress,
) -> Result<Snapshot, FetchError> {
    let next_ids = reader
        .view(
            &EntryFunctionId::skillchain(module_address, GET_NEXT_IDS),
            Vec::new(),
        )
        .await
        .map_err(FetchError::NextIds)?;
    let next_skill_id = next_ids
        .first()
        .and_then(parse_u64)
        .ok_or_else(|| FetchError::MalformedNextIds(Value::Array(next_ids.clone()).to_string()))?;

    let get_skill = EntryFunctionId::skillchain(module_address, GET_SKILL);
    let mut skills = Vec::new();
    for id in 1..next_skill_id {
        let row = match reader.view(&get_skill, vec![json!(id.to_string())]).await {
            Ok(row) => row,
            Err(err) => {
                debug!(skill_id = id, "skill {id} not found: {err}");
                continue;
            }
        };
        match decode_skill_row(SkillId(id), &row) {
            Ok(skill) => skills.push(skill),
            Err(reason) => warn!(skill_id = id, "skipping undecodable skill row: {reason}"),
        }
    }

    info!(
        next_skill_id,
        fetched = skills.len(),
        "skill snapshot fetched"
    );
    Ok(Snapshot {
        skills,
        bounties: Vec::new(),
        profile: UserProfile::default(),
    })
}

/// `get_skill` returns `[name, description, evidence_url, is_verified, owner]`.
pub fn decode_skill_row(id: SkillId, row: &[Value]) -> Result<Skill, String> {
    let [name, description, evidence_url, is_verified, owner, ..] = row else {
        return Err(format!("expected 5 values, got {}", row.len()));
    };

    let text = |value: &Value, field: &str| {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| format!("{field} is not a string"))
    };

    let owner = text(owner, "owner")?
        .parse::<AccountAddress>()
        .map_err(|err| format!("owner: {err}"))?;

    Ok(Skill {
        id,
        name: text(name, "name")?,
        description: text(description, "description")?,
        evidence_url: text(evidence_url, "evidence_url")?,
        is_verified: is_verified
            .as_bool()
            .ok_or_else(|| "is_verified is not a bool".to_string())?,
        validation_count: 0,
        owner,
    })
}

fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(text) => text.parse().ok(),
        Value::Number(number) => number.as_u64(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
