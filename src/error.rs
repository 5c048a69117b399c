use thiserror::Error;

/// Errors returned by every fallible operation in this crate.
///
/// Variants are grouped by the stage that produces them: configuration,
/// request signing, access token verification and the HTTP exchange itself.
/// Nothing is retried internally; callers decide what to do with each kind.
#[derive(Error, Debug)]
pub enum Error {
    /// Required credentials are missing or empty when building a client.
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    #[error("Missing {0} environment variable")]
    MissingEnvVar(String),

    /// The request body could not be represented as a JSON value.
    #[error("Failed to encode signing payload: {0}")]
    Encoding(String),

    /// The authorization key is not a PEM wrapped PKCS#8 private key.
    #[error("Invalid authorization key format: {0}")]
    KeyFormat(String),

    /// The authorization key decoded fine but is not a P-256 EC key.
    #[error("Unsupported authorization key: {0}")]
    UnsupportedKey(String),

    /// The key loaded but the ECDSA signer itself failed.
    #[error("Failed to sign request: {0}")]
    Signing(String),

    /// A signed operation was requested without an authorization key configured.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Malformed access token: {0}")]
    MalformedToken(String),

    /// The token header declares an algorithm other than ES256.
    #[error("Unexpected JWT signing method: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Signature is invalid: {0}")]
    SignatureInvalid(String),

    #[error("aud claim must be the application id {expected}, got {actual}")]
    AudienceMismatch { expected: String, actual: String },

    #[error("iss claim must be {expected}, got {actual}")]
    IssuerMismatch { expected: String, actual: String },

    #[error("Token is expired (exp {expired_at})")]
    TokenExpired { expired_at: i64 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote API answered with a non-2xx status. `body` is the raw response text.
    #[error("Privy request failed with status {status}: {body}")]
    RemoteApi {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse Privy response: {0}")]
    ResponseParsingFailed(String),

    #[error("Failed to parse url: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Creates a new Configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a new Encoding error
    pub fn encoding<S: Into<String>>(message: S) -> Self {
        Self::Encoding(message.into())
    }

    /// Creates a new KeyFormat error
    pub fn key_format<S: Into<String>>(message: S) -> Self {
        Self::KeyFormat(message.into())
    }

    /// Creates a new Signing error
    pub fn signing<S: Into<String>>(message: S) -> Self {
        Self::Signing(message.into())
    }

    /// Creates a new MalformedToken error
    pub fn malformed_token<S: Into<String>>(message: S) -> Self {
        Self::MalformedToken(message.into())
    }

    /// Returns true if this error came out of access token verification
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedToken(_)
                | Error::UnsupportedAlgorithm(_)
                | Error::SignatureInvalid(_)
                | Error::AudienceMismatch { .. }
                | Error::IssuerMismatch { .. }
                | Error::TokenExpired { .. }
        )
    }

    /// Returns true if the remote API rejected the request
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Error::RemoteApi { .. })
    }

    /// Returns the HTTP status of a remote API error
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Error::RemoteApi { status, .. } => Some(*status),
            Error::Network(e) => e.status(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::configuration("AppID or app secret is empty");
        assert_eq!(
            err.to_string(),
            "Invalid client configuration: AppID or app secret is empty"
        );

        let err = Error::AudienceMismatch {
            expected: "app1".to_string(),
            actual: "app2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "aud claim must be the application id app1, got app2"
        );

        let err = Error::TokenExpired { expired_at: 42 };
        assert_eq!(err.to_string(), "Token is expired (exp 42)");
    }

    #[test]
    fn test_remote_error_carries_status_and_body() {
        let err = Error::RemoteApi {
            status: reqwest::StatusCode::NOT_FOUND,
            body: r#"{"error":"not found"}"#.to_string(),
        };
        assert!(err.is_remote_error());
        assert!(!err.is_token_error());
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        assert!(err.to_string().contains(r#"{"error":"not found"}"#));
    }

    #[test]
    fn test_token_error_classification() {
        assert!(Error::malformed_token("bad").is_token_error());
        assert!(Error::UnsupportedAlgorithm("HS256".to_string()).is_token_error());
        assert!(Error::TokenExpired { expired_at: 0 }.is_token_error());
        assert!(!Error::key_format("bad pem").is_token_error());
        assert!(!Error::signing("rng failure").is_token_error());
        assert_eq!(
            Error::signing("rng failure").to_string(),
            "Failed to sign request: rng failure"
        );
        assert_eq!(Error::encoding("x").status(), None);
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
