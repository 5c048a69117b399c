//! Create Server Wallet Example
//!
//! Creates a server wallet and, if `PRIVY_AUTHORIZATION_KEY` is set, signs a
//! small EIP-712 message with it.
//!
//! Usage:
//!   cargo run --example create_wallet
//!   cargo run --example create_wallet -- <chain_type>

use privy_rs::PrivyClient;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let chain_type = std::env::args().nth(1).unwrap_or_default();

    println!("=== Create Server Wallet Example ===\n");

    let client = PrivyClient::from_env()?;
    println!("✓ Client initialized for app {}\n", client.app_id());

    let wallet = client.create_wallet(&chain_type).await?;
    println!("✓ Wallet created:");
    println!("  ID: {}", wallet.id);
    println!("  Address: {}", wallet.address);
    println!("  Chain type: {}", wallet.chain_type);

    if !client.has_authorization_key() {
        println!("\nPRIVY_AUTHORIZATION_KEY not set, skipping typed data signing");
        return Ok(());
    }

    let typed_data = json!({
        "types": {
            "EIP712Domain": [{"name": "name", "type": "string"}, {"name": "chainId", "type": "uint256"}],
            "Greeting": [{"name": "text", "type": "string"}]
        },
        "primaryType": "Greeting",
        "domain": {"name": "privy-rs", "chainId": 11155111},
        "message": {"text": "hello"}
    });

    match client
        .sign_typed_data_v4(&wallet.id, &wallet.address, &typed_data)
        .await
    {
        Ok(signature) => println!("\n✓ Typed data signature: {signature}"),
        Err(e) => println!("\n✗ Signing failed: {e}"),
    }

    Ok(())
}
