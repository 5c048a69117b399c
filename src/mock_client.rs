//! Mock Privy Client for Testing
//!
//! `MockPrivyClient` implements [`WalletClient`] entirely in memory so that
//! applications can test their wallet flows without network access or real
//! credentials. Wallet ids, addresses, signatures and transaction hashes are
//! derived deterministically from the inputs.
//!
//! Access tokens are checked for real against the verification key; by
//! default that is the test key from [`mocks`](crate::mocks), so tokens minted
//! with [`sign_test_token`](crate::mocks::sign_test_token) are accepted.
//!
//! # Examples
//!
//! ```rust
//! use privy_rs::MockPrivyClient;
//! use privy_rs::mocks::TEST_AUTHORIZATION_KEY;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), privy_rs::Error> {
//! let client = MockPrivyClient::new().with_authorization_key(TEST_AUTHORIZATION_KEY);
//!
//! let wallet = client.create_wallet("").await?;
//! assert_eq!(wallet.chain_type, "ethereum");
//!
//! let tx = serde_json::json!({"to": "0x0000000000000000000000000000000000000000", "value": "0x1"});
//! let hash = client.send_transaction("11155111", &wallet.address, &tx).await?;
//! assert!(hash.starts_with("0x"));
//! assert_eq!(client.sent_transactions().len(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::canonicalize;
use crate::client_trait::WalletClient;
use crate::jwt::{AccessTokenClaims, TokenVerifier};
use crate::mocks::{MOCK_APP_ID, TEST_VERIFICATION_KEY};
use crate::model::{CreateWalletResponse, LinkedAccount, User, DEFAULT_CHAIN_TYPE};
use crate::Error;

/// A transaction accepted by [`MockPrivyClient::send_transaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentTransaction {
    pub caip2: String,
    pub owner: String,
    pub transaction: Value,
    pub hash: String,
}

#[derive(Debug, Clone)]
pub struct MockPrivyClient {
    inner: Arc<MockPrivyClientInner>,
    authorization_key: Option<String>,
    verifier: TokenVerifier,
}

#[derive(Debug)]
struct MockPrivyClientInner {
    wallets: Mutex<HashMap<String, CreateWalletResponse>>,
    users: Mutex<HashMap<String, User>>,
    transactions: Mutex<Vec<SentTransaction>>,
    next_wallet: AtomicU64,
}

impl Default for MockPrivyClient {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn hex_digest(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

impl MockPrivyClient {
    /// Creates a mock with no wallets, no users and no authorization key,
    /// verifying tokens for [`MOCK_APP_ID`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockPrivyClientInner {
                wallets: Mutex::new(HashMap::new()),
                users: Mutex::new(HashMap::new()),
                transactions: Mutex::new(Vec::new()),
                next_wallet: AtomicU64::new(1),
            }),
            authorization_key: None,
            verifier: TokenVerifier::new(MOCK_APP_ID, TEST_VERIFICATION_KEY),
        }
    }

    /// Enables the signed operations. The key itself is not used.
    #[must_use]
    pub fn with_authorization_key(mut self, key: impl Into<String>) -> Self {
        self.set_authorization_key(key);
        self
    }

    /// Verifies tokens for `app_id` against `verification_key` instead of the test key.
    #[must_use]
    pub fn with_verifier(mut self, app_id: &str, verification_key: &str) -> Self {
        self.verifier = TokenVerifier::new(app_id, verification_key);
        self
    }

    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        lock(&self.inner.users).insert(user.id.clone(), user);
        self
    }

    pub fn set_authorization_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.authorization_key = (!key.is_empty()).then_some(key);
    }

    pub fn clear_authorization_key(&mut self) {
        self.authorization_key = None;
    }

    /// Wallets created so far, keyed by id.
    pub fn wallets(&self) -> HashMap<String, CreateWalletResponse> {
        lock(&self.inner.wallets).clone()
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        lock(&self.inner.transactions).clone()
    }

    fn require_authorization_key(&self) -> Result<(), Error> {
        if self.authorization_key.is_none() {
            return Err(Error::MissingCredential(
                "authorization key is required for signed requests".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create_wallet(&self, chain_type: &str) -> Result<CreateWalletResponse, Error> {
        let chain_type = if chain_type.is_empty() {
            DEFAULT_CHAIN_TYPE
        } else {
            chain_type
        };
        let n = self.inner.next_wallet.fetch_add(1, Ordering::SeqCst);
        let id = format!("mock-wallet-{n}");
        let digest = hex_digest(&[id.as_bytes()]);

        let wallet = CreateWalletResponse {
            id: id.clone(),
            address: format!("0x{}", &digest[..40]),
            chain_type: chain_type.to_string(),
            authorization_threshold: 0,
        };
        lock(&self.inner.wallets).insert(id, wallet.clone());

        // Created wallets show up as delegated wallets of a per-wallet user.
        let user = User {
            id: format!("did:privy:{}", wallet.id),
            created_at: chrono::Utc::now().timestamp(),
            linked_accounts: vec![LinkedAccount {
                account_type: "wallet".to_string(),
                address: wallet.address.clone(),
                chain_type: wallet.chain_type.clone(),
                wallet_client: "privy".to_string(),
                wallet_client_type: "privy".to_string(),
                connector_type: "embedded".to_string(),
                delegated: true,
                ..LinkedAccount::default()
            }],
            ..User::default()
        };
        lock(&self.inner.users).insert(user.id.clone(), user);

        Ok(wallet)
    }

    /// Returns `0x` + SHA-256 of the canonical typed data, repeated to
    /// signature length.
    pub async fn sign_typed_data_v4(
        &self,
        _wallet_id: &str,
        address: &str,
        typed_data: &Value,
    ) -> Result<String, Error> {
        self.require_authorization_key()?;
        let digest = hex_digest(&[address.as_bytes(), canonicalize(typed_data).as_slice()]);
        Ok(format!("0x{digest}{digest}1b"))
    }

    pub async fn send_transaction(
        &self,
        chain_id: &str,
        owner: &str,
        transaction: &Value,
    ) -> Result<String, Error> {
        self.require_authorization_key()?;
        let caip2 = format!("eip155:{chain_id}");

        let mut transactions = lock(&self.inner.transactions);
        let nonce = transactions.len().to_string();
        let hash = format!(
            "0x{}",
            hex_digest(&[
                caip2.as_bytes(),
                owner.as_bytes(),
                canonicalize(transaction).as_slice(),
                nonce.as_bytes(),
            ])
        );
        transactions.push(SentTransaction {
            caip2,
            owner: owner.to_string(),
            transaction: transaction.clone(),
            hash: hash.clone(),
        });
        Ok(hash)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, Error> {
        lock(&self.inner.users)
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::RemoteApi {
                status: StatusCode::NOT_FOUND,
                body: r#"{"error":"not found"}"#.to_string(),
            })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, Error> {
        self.verifier.verify(token)
    }
}

#[async_trait]
impl WalletClient for MockPrivyClient {
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
