//! Verify Access Token Example
//!
//! Usage:
//!   cargo run --example verify_access_token -- <access_token>

use privy_rs::{Credentials, PrivyClient};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let token = std::env::args()
        .nth(1)
        .ok_or("usage: verify_access_token <access_token>")?;

    let client = PrivyClient::from_credentials(Credentials::from_env()?);

    match client.verify_access_token(&token) {
        Ok(claims) => {
            println!("✓ Token is valid");
            println!("  User: {}", claims.user_id);
            println!("  App: {}", claims.app_id);
            if let Some(expires_at) = claims.expires_at() {
                println!("  Expires: {expires_at}");
            }
        }
        Err(e) => println!("✗ Token rejected: {e}"),
    }

    Ok(())
}
