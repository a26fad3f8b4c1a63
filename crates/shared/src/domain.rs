use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Octas per APT.
pub const OCTAS_PER_APT: u64 = 100_000_000;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(SkillId);
id_newtype!(BountyId);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("account address is empty")]
    Empty,
    #[error("account address is longer than 32 bytes")]
    TooLong,
    #[error("account address is not valid hex: {0}")]
    InvalidHex(String),
}

/// 32-byte account address. Short forms such as `0x1` are left-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountAddress([u8; AccountAddress::LENGTH]);

impl AccountAddress {
    pub const LENGTH: usize = 32;
    pub const ZERO: Self = Self([0u8; Self::LENGTH]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Long form, `0x` followed by 64 hex digits.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(AddressParseError::Empty);
        }
        if digits.len() > Self::LENGTH * 2 {
            return Err(AddressParseError::TooLong);
        }

        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; Self::LENGTH];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|err| AddressParseError::InvalidHex(err.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_literal())
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_literal())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A claimed competency, owned by one address and optionally peer-verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub description: String,
    pub evidence_url: String,
    pub is_verified: bool,
    /// Not exposed by the contract's read path; always zero.
    pub validation_count: u64,
    pub owner: AccountAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounty {
    pub id: BountyId,
    pub title: String,
    pub description: String,
    /// Reward in octas.
    pub reward_amount: u64,
    pub is_active: bool,
    pub creator: AccountAddress,
    pub assigned_to: AccountAddress,
}

impl Bounty {
    pub fn is_assigned(&self) -> bool {
        !self.assigned_to.is_zero()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub reputation_score: u64,
    pub bounties_completed: u64,
    pub total_earned: f64,
}

/// Shortens an address for display, e.g. `0x1234...cdef`.
pub fn truncate_address(address: &str) -> String {
    let address = address.trim();
    if address.is_empty() || address == "0x0" {
        return "None".to_string();
    }
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub fn format_apt(octas: u64) -> String {
    format!("{:.2}", octas as f64 / OCTAS_PER_APT as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_addresses_to_the_same_value() {
        let short: AccountAddress = "0x1".parse().expect("short");
        let long: AccountAddress =
            "0x0000000000000000000000000000000000000000000000000000000000000001"
                .parse()
                .expect("long");
        assert_eq!(short, long);
        assert_eq!(
            short.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!("0x".parse::<AccountAddress>(), Err(AddressParseError::Empty));
        assert!(matches!(
            "0xzz".parse::<AccountAddress>(),
            Err(AddressParseError::InvalidHex(_))
        ));
        let too_long = format!("0x{}", "a".repeat(65));
        assert_eq!(
            too_long.parse::<AccountAddress>(),
            Err(AddressParseError::TooLong)
        );
    }

    #[test]
    fn address_serde_uses_long_hex_string() {
        let addr: AccountAddress = "0xabc".parse().expect("addr");
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, format!("\"{}\"", addr.to_hex_literal()));
        let back: AccountAddress = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, addr);
    }

    #[test]
    fn truncates_addresses_for_display() {
        assert_eq!(truncate_address(""), "None");
        assert_eq!(truncate_address("0x0"), "None");
        assert_eq!(
            truncate_address("0x1234567890abcdef1234567890abcdef"),
            "0x1234...cdef"
        );
    }

    #[test]
    fn formats_octas_as_apt() {
        assert_eq!(format_apt(0), "0.00");
        assert_eq!(format_apt(150_000_000), "1.50");
        assert_eq!(format_apt(1), "0.00");
    }
}
