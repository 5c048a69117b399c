//! Access token verification.
//!
//! Privy access tokens are ES256 JWTs. Verification runs in three stages and
//! stops at the first failure:
//!
//! 1. parse the header (`MalformedToken`)
//! 2. require `alg == ES256`, then check the signature against the app's
//!    verification key (`UnsupportedAlgorithm`, `SignatureInvalid`)
//! 3. validate claims: expiration, audience, issuer
//!
//! Expiration is compared to the wall clock at call time with no leeway.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{armor_public_key, PRIVY_ISSUER};
use crate::Error;

/// Claims carried by a Privy access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// `aud`: the Privy application id
    #[serde(rename = "aud", default)]
    pub app_id: String,
    /// `exp`: unix seconds
    #[serde(rename = "exp", default)]
    pub expiration: i64,
    #[serde(rename = "iss", default)]
    pub issuer: String,
    /// `sub`: the Privy user DID
    #[serde(rename = "sub", default)]
    pub user_id: String,
    #[serde(rename = "sid", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
}

impl AccessTokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expiration, 0)
    }
}

/// Validates decoded claims for `app_id` at instant `now`.
///
/// Expiration is checked first so an expired token is always reported as
/// [`Error::TokenExpired`], whatever else is wrong with it.
pub fn validate_claims(
    claims: &AccessTokenClaims,
    app_id: &str,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    if claims.expiration <= now.timestamp() {
        return Err(Error::TokenExpired {
            expired_at: claims.expiration,
        });
    }
    if claims.app_id != app_id {
        return Err(Error::AudienceMismatch {
            expected: app_id.to_string(),
            actual: claims.app_id.clone(),
        });
    }
    if claims.issuer != PRIVY_ISSUER {
        return Err(Error::IssuerMismatch {
            expected: PRIVY_ISSUER.to_string(),
            actual: claims.issuer.clone(),
        });
    }
    Ok(())
}

/// Verifies access tokens for one application.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    app_id: String,
    verification_key: String,
}

impl TokenVerifier {
    /// `verification_key` may be bare or PEM armored.
    pub fn new(app_id: impl Into<String>, verification_key: &str) -> Self {
        Self {
            app_id: app_id.into(),
            verification_key: armor_public_key(verification_key),
        }
    }

    /// Verifies `token` against the current time.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage: `MalformedToken`,
    /// `UnsupportedAlgorithm`, `KeyFormat`, `SignatureInvalid`,
    /// `TokenExpired`, `AudienceMismatch` or `IssuerMismatch`.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, Error> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies `token` as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AccessTokenClaims, Error> {
        let result = self
            .verify_signature(token)
            .and_then(|claims| validate_claims(&claims, &self.app_id, now).map(|_| claims));

        if let Err(ref e) = result {
            tracing::warn!("Access token rejected: {}", e);
        }
        result
    }

    fn verify_signature(&self, token: &str) -> Result<AccessTokenClaims, Error> {
        let header = decode_header(token).map_err(|e| Error::malformed_token(e.to_string()))?;
        if header.alg != Algorithm::ES256 {
            return Err(Error::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let key = DecodingKey::from_ec_pem(self.verification_key.as_bytes())
            .map_err(|e| Error::key_format(format!("invalid verification key: {e}")))?;

        // Claim checks are done by validate_claims.
        let mut validation = Validation::new(Algorithm::ES256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data = decode::<AccessTokenClaims>(token, &key, &validation)
            .map_err(|e| classify_decode_error(&e))?;

        Ok(token_data.claims)
    }
}

/// Only signature failures become [`Error::SignatureInvalid`]; kinds not
/// listed here are reported as a malformed token.
fn classify_decode_error(e: &jsonwebtoken::errors::Error) -> Error {
    match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::Crypto(_) => Error::SignatureInvalid(e.to_string()),
        ErrorKind::InvalidAlgorithm => Error::UnsupportedAlgorithm(e.to_string()),
        ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidKeyFormat => Error::key_format(e.to_string()),
        _ => Error::malformed_token(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{sign_test_token, TEST_VERIFICATION_KEY};
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use p256::ecdsa::SigningKey;
    use p256::pkcs8::{EncodePrivateKey, LineEnding};

    const APP_ID: &str = "test-app";

    fn valid_claims() -> AccessTokenClaims {
        AccessTokenClaims {
            app_id: APP_ID.to_string(),
            expiration: (Utc::now() + Duration::hours(1)).timestamp(),
            issuer: PRIVY_ISSUER.to_string(),
            user_id: "did:privy:user123".to_string(),
            session_id: Some("session-1".to_string()),
            issued_at: Some(Utc::now().timestamp()),
        }
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(APP_ID, TEST_VERIFICATION_KEY)
    }

    #[test]
    fn test_valid_token_is_accepted() {
        let claims = valid_claims();
        let token = sign_test_token(&claims);

        let decoded = verifier().verify(&token).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.user_id, "did:privy:user123");
    }

    #[test]
    fn test_expired_token_rejected_regardless_of_other_claims() {
        let mut claims = valid_claims();
        claims.expiration = (Utc::now() - Duration::minutes(1)).timestamp();
        claims.app_id = "other-app".to_string();
        claims.issuer = "evil.example".to_string();
        let token = sign_test_token(&claims);

        match verifier().verify(&token) {
            Err(Error::TokenExpired { expired_at }) => assert_eq!(expired_at, claims.expiration),
            other => panic!("Expected TokenExpired, got: {other:?}"),
        }
    }

    #[test]
    fn test_expiration_is_evaluated_at_call_time() {
        let claims = valid_claims();
        let token = sign_test_token(&claims);
        let verifier = verifier();

        assert!(verifier.verify_at(&token, Utc::now()).is_ok());
        let later = Utc::now() + Duration::hours(2);
        assert!(matches!(
            verifier.verify_at(&token, later),
            Err(Error::TokenExpired { .. })
        ));

        let at_expiry = DateTime::from_timestamp(claims.expiration, 0).unwrap();
        assert!(matches!(
            verifier.verify_at(&token, at_expiry),
            Err(Error::TokenExpired { .. })
        ));
    }

    #[test]
    fn test_audience_mismatch() {
        let mut claims = valid_claims();
        claims.app_id = "other-app".to_string();
        let token = sign_test_token(&claims);

        match verifier().verify(&token) {
            Err(Error::AudienceMismatch { expected, actual }) => {
                assert_eq!(expected, APP_ID);
                assert_eq!(actual, "other-app");
            }
            other => panic!("Expected AudienceMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn test_issuer_mismatch() {
        let mut claims = valid_claims();
        claims.issuer = "example.com".to_string();
        let token = sign_test_token(&claims);

        assert!(matches!(
            verifier().verify(&token),
            Err(Error::IssuerMismatch { .. })
        ));
    }

    #[test]
    fn test_non_es256_token_rejected_before_claims() {
        // expired as well, so a claims check would have produced TokenExpired
        let mut claims = valid_claims();
        claims.expiration = 1;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"shared secret"),
        )
        .unwrap();

        match verifier().verify(&token) {
            Err(Error::UnsupportedAlgorithm(alg)) => assert_eq!(alg, "HS256"),
            other => panic!("Expected UnsupportedAlgorithm, got: {other:?}"),
        }
    }

    #[test]
    fn test_token_signed_by_other_key_is_rejected() {
        let other_key = SigningKey::random(&mut rand::rngs::OsRng);
        let pem = other_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let token = encode(
            &Header::new(Algorithm::ES256),
            &valid_claims(),
            &EncodingKey::from_ec_pem(pem.as_bytes()).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            verifier().verify(&token),
            Err(Error::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "abc", "not.a.token", "a.b.c.d"] {
            assert!(
                matches!(verifier().verify(token), Err(Error::MalformedToken(_))),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let forged = sign_test_token(&AccessTokenClaims {
            user_id: "did:privy:attacker".to_string(),
            ..valid_claims()
        });
        let forged_payload = forged.split('.').nth(1).unwrap();

        let token = sign_test_token(&valid_claims());
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged_payload;

        assert!(matches!(
            verifier().verify(&parts.join(".")),
            Err(Error::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_missing_claims_default_and_fail_validation() {
        #[derive(Serialize)]
        struct Empty {}
        let token = crate::mocks::sign_test_token(&Empty {});
        assert!(matches!(
            verifier().verify(&token),
            Err(Error::TokenExpired { expired_at: 0 })
        ));
    }

    #[test]
    fn test_unlisted_decode_errors_are_malformed_tokens() {
        for kind in [
            ErrorKind::InvalidIssuer,
            ErrorKind::ImmatureSignature,
            ErrorKind::MissingRequiredClaim("sub".to_string()),
        ] {
            let err = jsonwebtoken::errors::Error::from(kind);
            assert!(
                matches!(classify_decode_error(&err), Error::MalformedToken(_)),
                "{err:?}"
            );
        }

        let err = jsonwebtoken::errors::Error::from(ErrorKind::InvalidSignature);
        assert!(matches!(classify_decode_error(&err), Error::SignatureInvalid(_)));
    }
}
