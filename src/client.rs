use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::canonical::SigningEnvelope;
use crate::config::{
    Credentials, Endpoints, HEADER_PRIVY_APP_ID, HEADER_PRIVY_AUTHORIZATION_SIGNATURE,
};
use crate::jwt::{AccessTokenClaims, TokenVerifier};
use crate::model::{
    CreateWalletRequest, CreateWalletResponse, SignatureData, TransactionData, User,
    WalletRpcRequest, WalletRpcResponse, DEFAULT_CHAIN_TYPE,
};
use crate::signer;
use crate::Error;

/// Client for the Privy server API.
///
/// Cloning is cheap and clones share the underlying connection pool. All
/// operations take `&self`; the only mutation after construction is
/// [`PrivyClient::set_authorization_key`], which needs `&mut self`.
#[derive(Debug, Clone)]
pub struct PrivyClient {
    client: Client,
    endpoints: Endpoints,
    credentials: Credentials,
    verifier: TokenVerifier,
}

#[allow(clippy::missing_errors_doc)]
impl PrivyClient {
    /// Creates a client without an authorization key.
    ///
    /// Signed wallet operations fail with [`Error::MissingCredential`] until
    /// one is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the app id or app secret is empty.
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        verification_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let credentials = Credentials::new(app_id, app_secret, verification_key)?;
        Ok(Self::from_credentials(credentials))
    }

    /// Creates a client that can sign delegated wallet actions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the app id, app secret or
    /// authorization key is empty.
    pub fn with_authorization_key(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        verification_key: impl Into<String>,
        authorization_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let credentials = Credentials::new(app_id, app_secret, verification_key)?
            .with_authorization_key(authorization_key)?;
        Ok(Self::from_credentials(credentials))
    }

    /// Creates a client talking to the production endpoints.
    pub fn from_credentials(credentials: Credentials) -> Self {
        let verifier = TokenVerifier::new(credentials.app_id(), credentials.verification_key());
        Self {
            client: Client::new(),
            endpoints: Endpoints::default(),
            credentials,
            verifier,
        }
    }

    /// Creates a client from `PRIVY_*` environment variables.
    ///
    /// See [`Credentials::from_env`] and [`Endpoints::from_env`].
    pub fn from_env() -> Result<Self, Error> {
        let credentials = Credentials::from_env()?;
        let endpoints = Endpoints::from_env()?;
        Ok(Self::from_credentials(credentials).with_endpoints(endpoints))
    }

    /// Replaces the base URLs, e.g. to point the client at a mock server.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn app_id(&self) -> &str {
        self.credentials.app_id()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn has_authorization_key(&self) -> bool {
        self.credentials.has_authorization_key()
    }

    /// Sets the authorization key used for signed requests. An empty key
    /// clears it.
    pub fn set_authorization_key(&mut self, key: impl Into<String>) {
        self.credentials.set_authorization_key(Some(key.into()));
    }

    pub fn clear_authorization_key(&mut self) {
        self.credentials.set_authorization_key(None);
    }

    /// Computes the `privy-authorization-signature` value for a request.
    ///
    /// The signature covers the canonical JSON of
    /// `{version, method, url, body, headers: {privy-app-id}}`; `url` must be
    /// exactly the URL the request is sent to.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingCredential`] if no authorization key is configured
    /// - [`Error::Encoding`] if `body` cannot be represented as JSON
    /// - [`Error::KeyFormat`] / [`Error::UnsupportedKey`] for a bad key
    pub fn authorization_signature<B>(
        &self,
        method: &str,
        url: &str,
        body: Option<&B>,
    ) -> Result<String, Error>
    where
        B: Serialize + ?Sized,
    {
        let key = self.credentials.authorization_key().ok_or_else(|| {
            Error::MissingCredential("authorization key is required for signed requests".to_string())
        })?;

        let envelope = SigningEnvelope::new(method, url, body, self.credentials.app_id())?;
        signer::sign(&envelope.to_canonical_bytes(), key)
    }

    async fn request_raw<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        signed: bool,
    ) -> Result<reqwest::Response, Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        // Signing happens before anything touches the network.
        let signature = if signed {
            Some(self.authorization_signature(method.as_str(), url.as_str(), body)?)
        } else {
            None
        };

        tracing::debug!("Sending {} {} (signed: {})", method, url, signed);

        let mut request_builder = self
            .client
            .request(method.clone(), url.clone())
            .basic_auth(self.credentials.app_id(), Some(self.credentials.app_secret()))
            .header(HEADER_PRIVY_APP_ID, self.credentials.app_id())
            .header(CONTENT_TYPE, "application/json");

        if let Some(signature) = signature {
            request_builder = request_builder.header(HEADER_PRIVY_AUTHORIZATION_SIGNATURE, signature);
        }
        if let Some(body) = body {
            request_builder = request_builder.json(body);
        }

        let response = request_builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("{} {} failed with status {}", method, url, status);
            return Err(Error::RemoteApi { status, body });
        }

        Ok(response)
    }

    async fn request_json<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        signed: bool,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let response = self.request_raw(method, url, body, signed).await?;
        response
            .json()
            .await
            .map_err(|e| Error::ResponseParsingFailed(e.to_string()))
    }

    /// Creates a server wallet. An empty `chain_type` means `"ethereum"`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails
    /// - The server returns an error status
    /// - The response cannot be parsed
    pub async fn create_wallet(&self, chain_type: &str) -> Result<CreateWalletResponse, Error> {
        let chain_type = if chain_type.is_empty() {
            DEFAULT_CHAIN_TYPE
        } else {
            chain_type
        };
        let request = CreateWalletRequest {
            chain_type: chain_type.to_string(),
        };

        let wallet: CreateWalletResponse = self
            .request_json(Method::POST, self.endpoints.wallets_url()?, Some(&request), false)
            .await?;
        tracing::info!("Created {} wallet {} at {}", wallet.chain_type, wallet.id, wallet.address);
        Ok(wallet)
    }

    /// Signs EIP-712 typed data with a delegated wallet and returns the signature.
    ///
    /// The call goes to the shared wallet RPC endpoint; `wallet_id` is only
    /// used for logging.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No authorization key is configured (no request is sent)
    /// - The HTTP request fails
    /// - The server returns an error status
    /// - The response cannot be parsed
    pub async fn sign_typed_data_v4(
        &self,
        wallet_id: &str,
        address: &str,
        typed_data: &Value,
    ) -> Result<String, Error> {
        tracing::debug!("Signing typed data with wallet {} ({})", wallet_id, address);
        let request = WalletRpcRequest::sign_typed_data_v4(address, typed_data.clone());

        let response: WalletRpcResponse<SignatureData> = self
            .request_json(Method::POST, self.endpoints.wallet_rpc_url()?, Some(&request), true)
            .await?;
        Ok(response.data.signature)
    }

    /// Sends an EVM transaction from `owner` on chain `eip155:<chain_id>` and
    /// returns the transaction hash.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No authorization key is configured (no request is sent)
    /// - The HTTP request fails
    /// - The server returns an error status
    /// - The response cannot be parsed
    pub async fn send_transaction(
        &self,
        chain_id: &str,
        owner: &str,
        transaction: &Value,
    ) -> Result<String, Error> {
        let request = WalletRpcRequest::send_transaction(chain_id, owner, transaction.clone());

        let response: WalletRpcResponse<TransactionData> = self
            .request_json(Method::POST, self.endpoints.wallet_rpc_url()?, Some(&request), true)
            .await?;
        tracing::info!("Sent transaction {} on {}", response.data.hash, response.data.caip2);
        Ok(response.data.hash)
    }

    /// Fetches a user by Privy DID.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails
    /// - The server returns an error status, e.g. 404 for an unknown user
    /// - The response cannot be parsed
    pub async fn get_user(&self, user_id: &str) -> Result<User, Error> {
        self.request_json(Method::GET, self.endpoints.user_url(user_id)?, None::<&()>, false)
            .await
    }

    /// Verifies an access token issued to this app and returns its claims.
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::verify`].
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, Error> {
        self.verifier.verify(token)
    }
}
