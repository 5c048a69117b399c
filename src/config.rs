//! Credentials, endpoint defaults and header names.

use std::env;

use once_cell::sync::Lazy;
use reqwest::Url;
use secrecy::{ExposeSecret, Secret};

use crate::Error;

pub const HEADER_PRIVY_APP_ID: &str = "privy-app-id";
pub const HEADER_PRIVY_AUTHORIZATION_SIGNATURE: &str = "privy-authorization-signature";

pub const PRIVY_API_BASE: &str = "https://api.privy.io";
pub const PRIVY_AUTH_BASE: &str = "https://auth.privy.io";

/// Expected `iss` claim of access tokens issued by Privy.
pub const PRIVY_ISSUER: &str = "privy.io";

/// Literal marker Privy puts in front of exported authorization keys.
pub const AUTHORIZATION_KEY_PREFIX: &str = "wallet-auth:";

const PUBLIC_KEY_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PUBLIC_KEY_FOOTER: &str = "-----END PUBLIC KEY-----";

static DEFAULT_ENDPOINTS: Lazy<Endpoints> = Lazy::new(|| Endpoints {
    api_base: Url::parse(PRIVY_API_BASE).expect("PRIVY_API_BASE is a valid URL"),
    auth_base: Url::parse(PRIVY_AUTH_BASE).expect("PRIVY_AUTH_BASE is a valid URL"),
});

/// Base URLs the client talks to.
///
/// Production code uses [`Endpoints::default`]; tests point both bases at a
/// local mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Base for the server wallet API (`/v1/wallets`)
    pub api_base: Url,
    /// Base for the auth API (`/api/v1/users`, `/api/v1/wallets/rpc`)
    pub auth_base: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        DEFAULT_ENDPOINTS.clone()
    }
}

impl Endpoints {
    /// Uses the same base URL for both APIs.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            api_base: base_url.clone(),
            auth_base: base_url,
        }
    }

    /// Reads endpoint overrides from the environment.
    ///
    /// Environment variables:
    /// - `PRIVY_API_BASE_URL` (default: `https://api.privy.io`)
    /// - `PRIVY_AUTH_BASE_URL` (default: `https://auth.privy.io`)
    ///
    /// # Errors
    ///
    /// Returns an error if either variable holds an invalid URL
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();
        let api_base = match env::var("PRIVY_API_BASE_URL") {
            Ok(val) => Url::parse(&val)?,
            Err(_) => defaults.api_base,
        };
        let auth_base = match env::var("PRIVY_AUTH_BASE_URL") {
            Ok(val) => Url::parse(&val)?,
            Err(_) => defaults.auth_base,
        };
        Ok(Self {
            api_base,
            auth_base,
        })
    }

    /// `POST` target for server wallet creation.
    pub fn wallets_url(&self) -> Result<Url, Error> {
        join_segments(&self.api_base, &["v1", "wallets"])
    }

    /// `POST` target for delegated wallet RPC calls.
    pub fn wallet_rpc_url(&self) -> Result<Url, Error> {
        join_segments(&self.auth_base, &["api", "v1", "wallets", "rpc"])
    }

    /// `GET` target for a single user.
    pub fn user_url(&self, user_id: &str) -> Result<Url, Error> {
        join_segments(&self.auth_base, &["api", "v1", "users", user_id])
    }
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::configuration(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Application credentials for the Privy API.
///
/// `app_secret` and the authorization key are kept in [`Secret`] so they are
/// redacted from `Debug` output and zeroized on drop.
#[derive(Debug, Clone)]
pub struct Credentials {
    app_id: String,
    app_secret: Secret<String>,
    verification_key: String,
    authorization_key: Option<Secret<String>>,
}

impl Credentials {
    /// Creates credentials without an authorization key.
    ///
    /// The verification key may be given bare (just the base64 body) or
    /// already wrapped in `PUBLIC KEY` PEM armor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the app id or app secret is empty.
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        verification_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let app_id = app_id.into();
        let app_secret = app_secret.into();
        if app_id.is_empty() || app_secret.is_empty() {
            return Err(Error::configuration("AppID or app secret is empty"));
        }

        Ok(Self {
            app_id,
            app_secret: Secret::new(app_secret),
            verification_key: armor_public_key(&verification_key.into()),
            authorization_key: None,
        })
    }

    /// Adds the authorization key used to sign delegated wallet actions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the key is empty.
    pub fn with_authorization_key(mut self, key: impl Into<String>) -> Result<Self, Error> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::configuration("authorization key is empty"));
        }
        self.authorization_key = Some(Secret::new(key));
        Ok(self)
    }

    /// Loads credentials from the environment.
    ///
    /// Environment variables:
    /// - `PRIVY_APP_ID` (required)
    /// - `PRIVY_APP_SECRET` (required)
    /// - `PRIVY_VERIFICATION_KEY` (required)
    /// - `PRIVY_AUTHORIZATION_KEY` (optional)
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEnvVar`] for an unset required variable and
    /// [`Error::Configuration`] for an empty one.
    pub fn from_env() -> Result<Self, Error> {
        let app_id = required_var("PRIVY_APP_ID")?;
        let app_secret = required_var("PRIVY_APP_SECRET")?;
        let verification_key = required_var("PRIVY_VERIFICATION_KEY")?;

        let credentials = Self::new(app_id, app_secret, verification_key)?;
        match env::var("PRIVY_AUTHORIZATION_KEY") {
            Ok(key) if !key.is_empty() => credentials.with_authorization_key(key),
            _ => Ok(credentials),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub(crate) fn app_secret(&self) -> &str {
        self.app_secret.expose_secret()
    }

    /// The verification key in PEM armor.
    pub fn verification_key(&self) -> &str {
        &self.verification_key
    }

    pub(crate) fn authorization_key(&self) -> Option<&str> {
        self.authorization_key
            .as_ref()
            .map(|key| key.expose_secret().as_str())
    }

    pub fn has_authorization_key(&self) -> bool {
        self.authorization_key.is_some()
    }

    pub(crate) fn set_authorization_key(&mut self, key: Option<String>) {
        self.authorization_key = key.filter(|k| !k.is_empty()).map(Secret::new);
    }
}

fn required_var(name: &str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::MissingEnvVar(name.to_string()))
}

/// Wraps a bare public key body in PEM armor; armored input is returned as is.
pub fn armor_public_key(key: &str) -> String {
    if key.contains(PUBLIC_KEY_HEADER) {
        key.to_string()
    } else {
        format!("{PUBLIC_KEY_HEADER}\n{}\n{PUBLIC_KEY_FOOTER}", key.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.wallets_url().unwrap().as_str(),
            "https://api.privy.io/v1/wallets"
        );
        assert_eq!(
            endpoints.wallet_rpc_url().unwrap().as_str(),
            "https://auth.privy.io/api/v1/wallets/rpc"
        );
        assert_eq!(
            endpoints.user_url("did:privy:abc123").unwrap().as_str(),
            "https://auth.privy.io/api/v1/users/did:privy:abc123"
        );
    }

    #[test]
    fn test_endpoints_with_base_url_path() {
        let endpoints = Endpoints::with_base_url(Url::parse("http://127.0.0.1:8080/prefix/").unwrap());
        assert_eq!(
            endpoints.wallets_url().unwrap().as_str(),
            "http://127.0.0.1:8080/prefix/v1/wallets"
        );
    }

    #[test]
    fn test_credentials_require_app_id_and_secret() {
        assert!(matches!(
            Credentials::new("", "secret", "key"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Credentials::new("app", "", "key"),
            Err(Error::Configuration(_))
        ));
        assert!(Credentials::new("app", "secret", "key").is_ok());
    }

    #[test]
    fn test_verification_key_is_armored_once() {
        let bare = Credentials::new("app", "secret", "MFkwEwYH").unwrap();
        assert_eq!(
            bare.verification_key(),
            "-----BEGIN PUBLIC KEY-----\nMFkwEwYH\n-----END PUBLIC KEY-----"
        );

        let armored = Credentials::new("app", "secret", bare.verification_key()).unwrap();
        assert_eq!(armored.verification_key(), bare.verification_key());
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let credentials = Credentials::new("app", "super-secret", "key")
            .unwrap()
            .with_authorization_key("wallet-auth:private")
            .unwrap();
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("wallet-auth:private"));
        assert!(credentials.has_authorization_key());
    }

    #[test]
    fn test_empty_authorization_key_rejected() {
        let credentials = Credentials::new("app", "secret", "key").unwrap();
        assert!(matches!(
            credentials.with_authorization_key(""),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    #[serial]
    fn test_credentials_from_env() {
        env::set_var("PRIVY_APP_ID", "env-app");
        env::set_var("PRIVY_APP_SECRET", "env-secret");
        env::set_var("PRIVY_VERIFICATION_KEY", "MFkw");
        env::remove_var("PRIVY_AUTHORIZATION_KEY");

        let credentials = Credentials::from_env().unwrap();
        assert_eq!(credentials.app_id(), "env-app");
        assert_eq!(credentials.app_secret(), "env-secret");
        assert!(!credentials.has_authorization_key());

        env::set_var("PRIVY_AUTHORIZATION_KEY", "wallet-auth:abc");
        let credentials = Credentials::from_env().unwrap();
        assert_eq!(credentials.authorization_key(), Some("wallet-auth:abc"));

        env::remove_var("PRIVY_APP_ID");
        match Credentials::from_env() {
            Err(Error::MissingEnvVar(name)) => assert_eq!(name, "PRIVY_APP_ID"),
            other => panic!("Expected MissingEnvVar, got: {other:?}"),
        }

        // Clean up
        env::remove_var("PRIVY_APP_SECRET");
        env::remove_var("PRIVY_VERIFICATION_KEY");
        env::remove_var("PRIVY_AUTHORIZATION_KEY");
    }

    #[test]
    #[serial]
    fn test_endpoints_from_env() {
        env::set_var("PRIVY_API_BASE_URL", "http://localhost:9000");
        env::remove_var("PRIVY_AUTH_BASE_URL");

        let endpoints = Endpoints::from_env().unwrap();
        assert_eq!(endpoints.api_base.as_str(), "http://localhost:9000/");
        assert_eq!(endpoints.auth_base.as_str(), "https://auth.privy.io/");

        env::set_var("PRIVY_AUTH_BASE_URL", "not a url");
        assert!(matches!(Endpoints::from_env(), Err(Error::UrlParse(_))));

        // Clean up
        env::remove_var("PRIVY_API_BASE_URL");
        env::remove_var("PRIVY_AUTH_BASE_URL");
    }
}
