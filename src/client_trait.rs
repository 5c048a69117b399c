//! Trait for Privy client implementations
//!
//! Application code that needs wallet operations can take a `WalletClient`
//! and receive either the production [`PrivyClient`] or the in-memory
//! [`MockPrivyClient`](crate::MockPrivyClient) in tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::client::PrivyClient;
use crate::jwt::AccessTokenClaims;
use crate::model::{CreateWalletResponse, User};
use crate::Error;

#[async_trait]
pub trait WalletClient: Send + Sync {
    /// Create a server wallet; an empty chain type means `"ethereum"`
    async fn create_wallet(&self, chain_type: &str) -> Result<CreateWalletResponse, Error>;

    /// Sign EIP-712 typed data with a delegated wallet
    async fn sign_typed_data_v4(
        &self,
        wallet_id: &str,
        address: &str,
        typed_data: &Value,
    ) -> Result<String, Error>;

    /// Send a transaction on `eip155:<chain_id>` and return its hash
    async fn send_transaction(
        &self,
        chain_id: &str,
        owner: &str,
        transaction: &Value,
    ) -> Result<String, Error>;

    async fn get_user(&self, user_id: &str) -> Result<User, Error>;

    fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, Error>;
}

#[async_trait]
impl WalletClient for PrivyClient {
    async fn create_wallet(&self, chain_type: &str) -> Result<CreateWalletResponse, Error> {
        self.create_wallet(chain_type).await
    }

    async fn sign_typed_data_v4(
        &self,
        wallet_id: &str,
        address: &str,
        typed_data: &Value,
    ) -> Result<String, Error> {
        self.sign_typed_data_v4(wallet_id, address, typed_data).await
    }

    async fn send_transaction(
        &self,
        chain_id: &str,
        owner: &str,
        transaction: &Value,
    ) -> Result<String, Error> {
        self.send_transaction(chain_id, owner, transaction).await
    }

    async fn get_user(&self, user_id: &str) -> Result<User, Error> {
        self.get_user(user_id).await
    }

    fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, Error> {
        self.verify_access_token(token)
    }
}
