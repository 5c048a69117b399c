use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chain type used when `create_wallet` is called with an empty one.
pub const DEFAULT_CHAIN_TYPE: &str = "ethereum";

pub const METHOD_SIGN_TYPED_DATA_V4: &str = "eth_signTypedData_v4";
pub const METHOD_SEND_TRANSACTION: &str = "eth_sendTransaction";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateWalletRequest {
    pub chain_type: String,
}

/// Response from server wallet creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateWalletResponse {
    pub id: String,
    pub address: String,
    pub chain_type: String,
    pub authorization_threshold: i64,
}

/// An identity or wallet linked to a Privy user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedAccount {
    #[serde(rename = "type")]
    pub account_type: String,
    pub address: String,
    pub chain_type: String,
    pub chain_id: String,
    pub wallet_client: String,
    pub wallet_client_type: String,
    pub connector_type: String,
    pub verified_at: i64,
    pub first_verified_at: i64,
    pub latest_verified_at: i64,
    pub delegated: bool,
    pub imported: bool,
    pub recovery_method: String,
}

impl LinkedAccount {
    pub fn is_wallet(&self) -> bool {
        self.account_type == "wallet"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Privy DID, e.g. `did:privy:...`
    pub id: String,
    /// Unix seconds
    pub created_at: i64,
    pub linked_accounts: Vec<LinkedAccount>,
    pub mfa_methods: Vec<Value>,
    pub has_accepted_terms: bool,
    pub is_guest: bool,
}

impl User {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }

    /// Linked accounts that are wallets delegated to the app.
    pub fn delegated_wallets(&self) -> impl Iterator<Item = &LinkedAccount> {
        self.linked_accounts
            .iter()
            .filter(|account| account.is_wallet() && account.delegated)
    }
}

/// Body of a call to the wallet RPC endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletRpcRequest<P> {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caip2: Option<String>,
    pub chain_type: String,
    pub address: String,
    pub params: P,
}

impl WalletRpcRequest<SignTypedDataParams> {
    pub fn sign_typed_data_v4(address: &str, typed_data: Value) -> Self {
        Self {
            method: METHOD_SIGN_TYPED_DATA_V4.to_string(),
            caip2: None,
            chain_type: DEFAULT_CHAIN_TYPE.to_string(),
            address: address.to_string(),
            params: SignTypedDataParams { typed_data },
        }
    }
}

impl WalletRpcRequest<SendTransactionParams> {
    pub fn send_transaction(chain_id: &str, owner: &str, transaction: Value) -> Self {
        Self {
            method: METHOD_SEND_TRANSACTION.to_string(),
            caip2: Some(format!("eip155:{chain_id}")),
            chain_type: DEFAULT_CHAIN_TYPE.to_string(),
            address: owner.to_string(),
            params: SendTransactionParams { transaction },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignTypedDataParams {
    pub typed_data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionParams {
    pub transaction: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletRpcResponse<D> {
    pub method: String,
    pub data: D,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionData {
    pub hash: String,
    pub caip2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureData {
    pub signature: String,
    pub encoding: String,
}
