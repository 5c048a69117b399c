//! # Privy Client Library
//!
//! A Rust client for the Privy server API: server wallet creation, delegated
//! wallet actions (EIP-712 signing, transaction sending), user lookup and
//! access token verification.
//!
//! Delegated wallet actions must carry a `privy-authorization-signature`
//! header: an ECDSA P-256 signature over the RFC 8785 canonical JSON of the
//! request, made with the app's authorization key.
//!
//! ## Modules
//!
//! - [`client`] - HTTP API client for Privy operations
//! - [`canonical`] - RFC 8785 canonical JSON and the signing envelope
//! - [`signer`] - request signature creation and verification
//! - [`jwt`] - access token verification
//! - [`config`] - credentials and endpoints
//! - [`model`] - Data structures for API requests and responses
//! - [`mocks`] - test keys and HTTP mock fixtures
//! - [`mock_client`] - in-memory client for integration testing
//!
//! ```rust,no_run
//! use privy_rs::PrivyClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), privy_rs::Error> {
//! let client = PrivyClient::from_env()?;
//! let wallet = client.create_wallet("ethereum").await?;
//! println!("{} {}", wallet.id, wallet.address);
//! # Ok(())
//! # }
//! ```

pub mod canonical;
pub mod client;
pub mod client_trait;
pub mod config;
pub mod error;
pub mod jwt;
pub mod mock_client;
pub mod mocks;
pub mod model;
pub mod signer;

pub use canonical::SigningEnvelope;
pub use client::PrivyClient;
pub use client_trait::WalletClient;
pub use config::{Credentials, Endpoints};
pub use error::Error;
pub use jwt::{AccessTokenClaims, TokenVerifier};
pub use mock_client::MockPrivyClient;
pub use model::{CreateWalletResponse, LinkedAccount, User};
