use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn temp_dir(label: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("skillchain_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[test]
fn defaults_match_the_deployed_front_end() {
    let settings = ClientSettings::default();
    assert_eq!(settings.transaction_options(), TransactionOptions::default());
    assert_eq!(settings.max_gas_amount, 10_000);
    assert_eq!(settings.gas_unit_price, 100);
    assert_eq!(settings.refresh_delay(), Duration::from_millis(2000));
    assert_eq!(settings.account_address().expect("account"), None);
    assert_eq!(settings.resolve_private_key().expect("key"), None);
}

#[test]
fn toml_overrides_defaults() {
    let mut settings = ClientSettings::default();
    apply_toml(
        &mut settings,
        r#"
            node_url = "http://127.0.0.1:8080"
            module_address = "0xcafe"
            account_address = "0xa11ce"
            private_key = "0x01"
            max_gas_amount = 2000
            refresh_delay_ms = 500
        "#,
    )
    .expect("parse");

    assert_eq!(settings.node_url, "http://127.0.0.1:8080");
    assert_eq!(settings.max_gas_amount, 2000);
    assert_eq!(settings.gas_unit_price, 100);
    assert_eq!(settings.refresh_delay(), Duration::from_millis(500));
    assert_eq!(
        settings.account_address().expect("account"),
        Some("0xa11ce".parse().expect("addr"))
    );

    let config = settings.session_config().expect("session config");
    assert_eq!(config.module_address, "0xcafe".parse().expect("addr"));
    assert_eq!(config.transaction_options.max_gas_amount, 2000);
}

#[test]
fn unknown_toml_keys_are_rejected() {
    let mut settings = ClientSettings::default();
    assert!(apply_toml(&mut settings, "bind_addr = \"0.0.0.0\"").is_err());
}

#[test]
fn app_prefixed_env_wins_over_skillchain_prefix() {
    let mut settings = ClientSettings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("SKILLCHAIN_NODE_URL", "http://first"),
            ("APP__NODE_URL", "http://second"),
            ("SKILLCHAIN_MODULE_ADDRESS", "0xbeef"),
            ("APP__GAS_UNIT_PRICE", "150"),
        ]),
    )
    .expect("env");

    assert_eq!(settings.node_url, "http://second");
    assert_eq!(settings.module_address, "0xbeef");
    assert_eq!(settings.gas_unit_price, 150);
}

#[test]
fn malformed_numeric_env_is_an_error() {
    let mut settings = ClientSettings::default();
    let err = apply_env_overrides(&mut settings, env_from(&[("APP__REFRESH_DELAY_MS", "soon")]))
        .expect_err("invalid");
    assert!(matches!(
        err,
        SettingsError::InvalidValue {
            key: "refresh_delay_ms",
            ..
        }
    ));
}

#[test]
fn invalid_module_address_is_reported() {
    let settings = ClientSettings {
        module_address: "0xnope".into(),
        ..ClientSettings::default()
    };
    assert!(matches!(
        settings.module_address(),
        Err(SettingsError::InvalidValue {
            key: "module_address",
            ..
        })
    ));
}

#[test]
fn private_key_is_read_from_file_when_not_inline() {
    let dir = temp_dir("key");
    let key_path = dir.join("wallet.key");
    fs::write(&key_path, "0xabc123\n").expect("write key");

    let mut settings = ClientSettings {
        private_key_path: Some(key_path),
        ..ClientSettings::default()
    };
    assert_eq!(
        settings.resolve_private_key().expect("key"),
        Some("0xabc123".to_string())
    );

    settings.private_key = Some("0xinline".into());
    assert_eq!(
        settings.resolve_private_key().expect("key"),
        Some("0xinline".to_string())
    );

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn explicit_config_path_must_exist() {
    let dir = temp_dir("missing");
    let err = load_settings(Some(&dir.join("absent.toml"))).expect_err("missing file");
    assert!(matches!(err, SettingsError::Read { .. }));
    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn loads_explicit_config_file() {
    let dir = temp_dir("load");
    let path = dir.join("skillchain.toml");
    fs::write(&path, "confirmation_timeout_secs = 9\nexpiration_secs = 120\n").expect("write");

    let settings = load_settings(Some(&path)).expect("load");

    assert_eq!(settings.confirmation_timeout(), Duration::from_secs(9));
    assert_eq!(settings.expiration_secs, 120);
    fs::remove_dir_all(dir).expect("cleanup");
}
