use ed25519_dalek::{Signature, Verifier};
use serde_json::json;
use shared::domain::SkillId;

use super::*;
use crate::{
    chain::DisconnectedWallet,
    mutations::validate_skill_payload,
    test_support::{address, fake_node, module},
};

const KEY_HEX: &str = "9bf49a6a0755f953811fce125f2683d50429c3bb49e074147e0089a52eae155f";

#[test]
fn accepts_common_key_encodings() {
    let plain = parse_signing_key(KEY_HEX).expect("plain");
    let prefixed = parse_signing_key(&format!("0x{KEY_HEX}")).expect("0x");
    let aip80 = parse_signing_key(&format!("ed25519-priv-0x{KEY_HEX}\n")).expect("aip-80");

    assert_eq!(plain.to_bytes(), prefixed.to_bytes());
    assert_eq!(plain.to_bytes(), aip80.to_bytes());
}

#[test]
fn rejects_malformed_keys() {
    assert!(matches!(
        parse_signing_key("0xnothex"),
        Err(WalletError::InvalidKey(_))
    ));
    assert!(matches!(
        parse_signing_key("0xabcd"),
        Err(WalletError::InvalidKey(reason)) if reason.contains("got 2")
    ));
}

#[tokio::test]
async fn signs_the_node_encoded_message_and_submits() {
    let (url, state) = fake_node::spawn().await;
    let node = NodeClient::new(&url).expect("client");
    let account = address("0xa11ce");
    let wallet = LocalWallet::from_hex_key(node, account, KEY_HEX)
        .expect("wallet")
        .with_expiration_secs(30);

    let pending = wallet
        .sign_and_submit_transaction(
            validate_skill_payload(module(), SkillId(7)),
            TransactionOptions::default(),
        )
        .await
        .expect("submit");

    assert_eq!(pending.hash, fake_node::SUBMITTED_HASH);
    assert_eq!(wallet.account(), Some(account));
    assert_eq!(
        state.account_lookups.lock().await.as_slice(),
        &[account.to_string()]
    );

    let submitted = state.submitted_bodies.lock().await;
    let body = &submitted[0];
    assert_eq!(body["sender"], json!(account.to_string()));
    assert_eq!(body["sequence_number"], json!("5"));
    assert_eq!(body["max_gas_amount"], json!("10000"));
    assert_eq!(body["gas_unit_price"], json!("100"));
    assert_eq!(body["payload"]["type"], json!("entry_function_payload"));
    assert_eq!(body["payload"]["arguments"], json!(["7"]));
    assert_eq!(body["signature"]["type"], json!("ed25519_signature"));
    assert_eq!(body["signature"]["public_key"], json!(wallet.public_key_hex()));

    let expiration: u64 = body["expiration_timestamp_secs"]
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .expect("expiration");
    assert!(expiration > chrono::Utc::now().timestamp() as u64);

    let signature_hex = body["signature"]["signature"].as_str().expect("signature");
    let signature_bytes: [u8; 64] = hex::decode(signature_hex.trim_start_matches("0x"))
        .expect("hex")
        .try_into()
        .expect("64 bytes");
    let signature = Signature::from_bytes(&signature_bytes);
    parse_signing_key(KEY_HEX)
        .expect("key")
        .verifying_key()
        .verify(&fake_node::SIGNING_MESSAGE, &signature)
        .expect("signature over the encoded message");

    let encoded = state.encode_bodies.lock().await;
    assert!(encoded[0].get("signature").is_none());
}

#[tokio::test]
async fn disconnected_wallet_refuses_to_sign() {
    let err = DisconnectedWallet
        .sign_and_submit_transaction(
            validate_skill_payload(module(), SkillId(1)),
            TransactionOptions::default(),
        )
        .await
        .expect_err("no wallet");

    assert!(matches!(err, WalletError::NotConnected));
    assert_eq!(DisconnectedWallet.account(), None);
}
