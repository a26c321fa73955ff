//! Session token issuance and verification.
//!
//! Tokens are HS256-signed JWTs carrying the account ID and an absolute expiry.
//! They are stateless: nothing is stored server-side when one is issued.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Session duration: 24 hours
pub const SESSION_DURATION_SECS: u64 = 24 * 60 * 60;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account ID the token is bound to
    pub id: i64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of issuing a session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

/// Signing configuration, built once at startup and shared by reference.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    has_secret: bool,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            has_secret: !secret.is_empty(),
        }
    }

    /// Issue a session token for an account, valid for 24 hours from now.
    pub fn issue(&self, account_id: i64) -> Result<IssuedToken, JwtError> {
        self.issue_at(account_id, unix_now()?)
    }

    /// Issue a session token as if the current time were `now`.
    pub fn issue_at(&self, account_id: i64, now: u64) -> Result<IssuedToken, JwtError> {
        if !self.has_secret {
            return Err(JwtError::MissingSecret);
        }

        let claims = SessionClaims {
            id: account_id,
            exp: now + SESSION_DURATION_SECS,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Verify a session token against the current time.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, JwtError> {
        self.verify_at(token, unix_now()?)
    }

    /// Verify a session token as if the current time were `now`.
    ///
    /// Signature and expiry are checked on the raw payload first. Only then is
    /// the payload decoded into [`SessionClaims`], so a tampered token always
    /// fails with [`JwtError::Decoding`] or [`JwtError::Expired`], never with
    /// [`JwtError::Claims`].
    pub fn verify_at(&self, token: &str, now: u64) -> Result<SessionClaims, JwtError> {
        if !self.has_secret {
            return Err(JwtError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is compared against `now` below.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let token_data =
            jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding_key, &validation)
                .map_err(JwtError::Decoding)?;

        let exp = token_data
            .claims
            .get("exp")
            .and_then(Value::as_u64)
            .ok_or(JwtError::Expired)?;
        if now >= exp {
            return Err(JwtError::Expired);
        }

        serde_json::from_value(Value::Object(token_data.claims)).map_err(JwtError::Claims)
    }
}

/// Return the signature segment of a compact JWT, if it has three segments.
pub fn signature_of(token: &str) -> Option<&str> {
    let mut parts = token.split('.');
    let (_, _, signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || signature.is_empty() {
        return None;
    }
    Some(signature)
}

fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// No signing secret configured
    MissingSecret,
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Malformed token, bad signature or missing expiry
    Decoding(jsonwebtoken::errors::Error),
    /// Expiry has passed (or is not a valid timestamp)
    Expired,
    /// Signature is valid but the claims do not carry a usable account ID
    Claims(serde_json::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::MissingSecret => write!(f, "Signing secret is not configured"),
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::Expired => write!(f, "Token has expired"),
            JwtError::Claims(e) => write!(f, "Invalid token claims: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-testing-1234";
    const T0: u64 = 1_700_000_000;

    fn sign_raw(claims: &Value, secret: &[u8]) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let config = JwtConfig::new(SECRET);

        let issued = config.issue(42).unwrap();
        let claims = config.verify(&issued.token).unwrap();

        assert_eq!(claims.id, 42);
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[test]
    fn test_expiry_boundary() {
        let config = JwtConfig::new(SECRET);
        let issued = config.issue_at(7, T0).unwrap();

        assert_eq!(issued.expires_at, T0 + SESSION_DURATION_SECS);

        let just_before = T0 + SESSION_DURATION_SECS - 1;
        assert_eq!(config.verify_at(&issued.token, just_before).unwrap().id, 7);

        let just_after = T0 + SESSION_DURATION_SECS + 1;
        assert!(matches!(
            config.verify_at(&issued.token, just_after),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_expired_token_rejected_by_wall_clock() {
        let config = JwtConfig::new(SECRET);
        let issued = config.issue_at(7, 1_000).unwrap();

        assert!(matches!(config.verify(&issued.token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig::new(b"secret-1");
        let config2 = JwtConfig::new(b"secret-2");

        let issued = config1.issue(1).unwrap();

        assert!(matches!(
            config2.verify(&issued.token),
            Err(JwtError::Decoding(_))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let config = JwtConfig::new(SECRET);

        assert!(matches!(
            config.verify("invalid-token"),
            Err(JwtError::Decoding(_))
        ));
    }

    #[test]
    fn test_empty_secret_cannot_sign() {
        let config = JwtConfig::new(b"");

        assert!(matches!(config.issue(1), Err(JwtError::MissingSecret)));
    }

    #[test]
    fn test_missing_id_claim() {
        let config = JwtConfig::new(SECRET);
        let token = sign_raw(&serde_json::json!({ "exp": T0 + 10 }), SECRET);

        assert!(matches!(
            config.verify_at(&token, T0),
            Err(JwtError::Claims(_))
        ));
    }

    #[test]
    fn test_non_numeric_id_claim() {
        let config = JwtConfig::new(SECRET);
        let token = sign_raw(&serde_json::json!({ "id": "7", "exp": T0 + 10 }), SECRET);

        assert!(matches!(
            config.verify_at(&token, T0),
            Err(JwtError::Claims(_))
        ));
    }

    #[test]
    fn test_missing_expiry_is_not_a_claims_error() {
        let config = JwtConfig::new(SECRET);
        let token = sign_raw(&serde_json::json!({ "id": 7 }), SECRET);

        assert!(matches!(
            config.verify_at(&token, T0),
            Err(JwtError::Decoding(_))
        ));
    }

    #[test]
    fn test_expired_token_without_id_reports_expiry() {
        let config = JwtConfig::new(SECRET);
        let token = sign_raw(&serde_json::json!({ "exp": T0 - 10 }), SECRET);

        assert!(matches!(
            config.verify_at(&token, T0),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_tampered_token_never_reports_claims_error() {
        let config = JwtConfig::new(SECRET);
        let token = config.issue_at(42, T0).unwrap().token;

        for (i, original) in token.char_indices() {
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            match config.verify_at(&tampered, T0) {
                Err(JwtError::Decoding(_)) | Err(JwtError::Expired) => {}
                other => panic!("position {} accepted or misclassified: {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_signature_of() {
        assert_eq!(signature_of("a.b.c"), Some("c"));
        assert_eq!(signature_of("a.b"), None);
        assert_eq!(signature_of("a.b."), None);
        assert_eq!(signature_of("a.b.c.d"), None);
    }
}
