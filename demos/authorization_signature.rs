//! Authorization Signature Example
//!
//! Prints the canonical signing envelope for a wallet RPC request, the
//! `privy-authorization-signature` value for it, and the public key to
//! register for the authorization key.
//!
//! Usage:
//!   PRIVY_AUTHORIZATION_KEY=wallet-auth:... cargo run --example authorization_signature

use privy_rs::canonical::SigningEnvelope;
use privy_rs::{signer, Endpoints};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let key = std::env::var("PRIVY_AUTHORIZATION_KEY")
        .map_err(|_| "PRIVY_AUTHORIZATION_KEY must be set")?;
    let app_id = std::env::var("PRIVY_APP_ID").unwrap_or_else(|_| "demo-app".to_string());

    let url = Endpoints::default().wallet_rpc_url()?;
    let body = json!({
        "method": "eth_sendTransaction",
        "caip2": "eip155:11155111",
        "chain_type": "ethereum",
        "address": "0x0000000000000000000000000000000000000000",
        "params": {"transaction": {"to": "0x0000000000000000000000000000000000000001", "value": "0x1"}}
    });

    let envelope = SigningEnvelope::new("POST", url.as_str(), Some(&body), &app_id)?;
    let payload = envelope.to_canonical_bytes();
    println!("Canonical envelope:\n{}\n", String::from_utf8_lossy(&payload));

    let signature = signer::sign(&payload, &key)?;
    println!("privy-authorization-signature: {signature}\n");

    let public_key = signer::public_key_pem(&key)?;
    signer::verify(&payload, &signature, &public_key)?;
    println!("✓ Signature verifies against:\n{public_key}");

    Ok(())
}
