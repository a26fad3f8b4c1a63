use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use shared::{domain::AccountAddress, protocol::TransactionOptions};

use crate::{error::SettingsError, session::SessionConfig};

pub const DEFAULT_CONFIG_FILE: &str = "skillchain.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub node_url: String,
    pub module_address: String,
    pub account_address: Option<String>,
    pub private_key: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub refresh_delay_ms: u64,
    pub confirmation_timeout_secs: u64,
    pub expiration_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        let options = TransactionOptions::default();
        Self {
            node_url: "https://fullnode.devnet.aptoslabs.com".into(),
            module_address: "0x1".into(),
            account_address: None,
            private_key: None,
            private_key_path: None,
            max_gas_amount: options.max_gas_amount,
            gas_unit_price: options.gas_unit_price,
            refresh_delay_ms: 2000,
            confirmation_timeout_secs: 30,
            expiration_secs: 60,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    node_url: Option<String>,
    module_address: Option<String>,
    account_address: Option<String>,
    private_key: Option<String>,
    private_key_path: Option<PathBuf>,
    max_gas_amount: Option<u64>,
    gas_unit_price: Option<u64>,
    refresh_delay_ms: Option<u64>,
    confirmation_timeout_secs: Option<u64>,
    expiration_secs: Option<u64>,
}

impl ClientSettings {
    pub fn module_address(&self) -> Result<AccountAddress, SettingsError> {
        self.module_address
            .parse()
            .map_err(|err| SettingsError::InvalidValue {
                key: "module_address",
                reason: format!("{err}"),
            })
    }

    pub fn account_address(&self) -> Result<Option<AccountAddress>, SettingsError> {
        self.account_address
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                raw.parse().map_err(|err| SettingsError::InvalidValue {
                    key: "account_address",
                    reason: format!("{err}"),
                })
            })
            .transpose()
    }

    /// Inline key wins over the key file.
    pub fn resolve_private_key(&self) -> Result<Option<String>, SettingsError> {
        if let Some(key) = self.private_key.as_ref().filter(|key| !key.trim().is_empty()) {
            return Ok(Some(key.trim().to_string()));
        }
        let Some(path) = &self.private_key_path else {
            return Ok(None);
        };
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(raw.trim().to_string()))
    }

    pub fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions {
            max_gas_amount: self.max_gas_amount,
            gas_unit_price: self.gas_unit_price,
        }
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn session_config(&self) -> Result<SessionConfig, SettingsError> {
        Ok(SessionConfig {
            module_address: self.module_address()?,
            transaction_options: self.transaction_options(),
            refresh_delay: self.refresh_delay(),
        })
    }
}

/// Defaults, then `path` (or `skillchain.toml` when present), then the environment.
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings, SettingsError> {
    let mut settings = ClientSettings::default();

    match path {
        Some(path) => apply_file(&mut settings, path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                apply_file(&mut settings, default_path)?;
            }
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, path: &Path) -> Result<(), SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    apply_toml(settings, &raw).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn apply_toml(settings: &mut ClientSettings, raw: &str) -> Result<(), toml::de::Error> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.node_url {
        settings.node_url = v;
    }
    if let Some(v) = file_cfg.module_address {
        settings.module_address = v;
    }
    if let Some(v) = file_cfg.account_address {
        settings.account_address = Some(v);
    }
    if let Some(v) = file_cfg.private_key {
        settings.private_key = Some(v);
    }
    if let Some(v) = file_cfg.private_key_path {
        settings.private_key_path = Some(v);
    }
    if let Some(v) = file_cfg.max_gas_amount {
        settings.max_gas_amount = v;
    }
    if let Some(v) = file_cfg.gas_unit_price {
        settings.gas_unit_price = v;
    }
    if let Some(v) = file_cfg.refresh_delay_ms {
        settings.refresh_delay_ms = v;
    }
    if let Some(v) = file_cfg.confirmation_timeout_secs {
        settings.confirmation_timeout_secs = v;
    }
    if let Some(v) = file_cfg.expiration_secs {
        settings.expiration_secs = v;
    }
    Ok(())
}

/// `SKILLCHAIN_*` names first, then `APP__*`; later sources win.
pub fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    let pick = |names: &[&str]| names.iter().rev().find_map(|name| lookup(name));

    if let Some(v) = pick(&["SKILLCHAIN_NODE_URL", "APP__NODE_URL"]) {
        settings.node_url = v;
    }
    if let Some(v) = pick(&["SKILLCHAIN_MODULE_ADDRESS", "APP__MODULE_ADDRESS"]) {
        settings.module_address = v;
    }
    if let Some(v) = pick(&["SKILLCHAIN_ACCOUNT_ADDRESS", "APP__ACCOUNT_ADDRESS"]) {
        settings.account_address = Some(v);
    }
    if let Some(v) = pick(&["SKILLCHAIN_PRIVATE_KEY"]) {
        settings.private_key = Some(v);
    }
    if let Some(v) = pick(&["SKILLCHAIN_PRIVATE_KEY_PATH"]) {
        settings.private_key_path = Some(PathBuf::from(v));
    }

    let numeric = |key: &'static str, raw: String| {
        raw.trim()
            .parse::<u64>()
            .map_err(|err| SettingsError::InvalidValue {
                key,
                reason: err.to_string(),
            })
    };
    if let Some(v) = pick(&["APP__MAX_GAS_AMOUNT"]) {
        settings.max_gas_amount = numeric("max_gas_amount", v)?;
    }
    if let Some(v) = pick(&["APP__GAS_UNIT_PRICE"]) {
        settings.gas_unit_price = numeric("gas_unit_price", v)?;
    }
    if let Some(v) = pick(&["APP__REFRESH_DELAY_MS"]) {
        settings.refresh_delay_ms = numeric("refresh_delay_ms", v)?;
    }
    if let Some(v) = pick(&["APP__CONFIRMATION_TIMEOUT_SECS"]) {
        settings.confirmation_timeout_secs = numeric("confirmation_timeout_secs", v)?;
    }
    if let Some(v) = pick(&["APP__EXPIRATION_SECS"]) {
        settings.expiration_secs = numeric("expiration_secs", v)?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
