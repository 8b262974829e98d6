//! Token issuance and verification
//!
//! [`TokenService`] owns the signing key, algorithm and expiry for the whole
//! process. It is constructed exactly once from [`AuthConfig`] and injected
//! wherever tokens are issued or verified, which guarantees both sides of
//! the flow observe the same secret and algorithm. The environment is never
//! consulted after construction.
//!
//! Tokens are stateless and self-contained: subject and expiry live in the
//! signed claims, nothing is persisted server-side. The tradeoff is that
//! there is no revocation; a token stays valid until its `exp` passes.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

/// Internal verification failure kinds.
///
/// These are for diagnostics only; at the API boundary all of them collapse
/// into the same generic unauthorized response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token claims are malformed")]
    Malformed,
}

/// Signed claim set: subject, expiry and issue instant.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    /// Subject (the user's unique name)
    sub: String,
    /// Expiration time (Unix timestamp)
    exp: i64,
    /// Issued at (Unix timestamp)
    iat: i64,
}

/// Issues and verifies signed, expiring session tokens.
pub struct TokenService {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_minutes: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            header: Header::new(config.algorithm),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            expiry_minutes: config.token_expiry_minutes,
        }
    }

    /// Issue a signed token binding `subject` to an absolute expiry instant.
    pub fn issue(&self, subject: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            exp: (now + Duration::minutes(self.expiry_minutes)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&self.header, &claims, &self.encoding_key)
    }

    /// Verify a token and extract its subject.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(e.kind()))?;

        if data.claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(data.claims.sub)
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    fn service(secret: &str, expiry_minutes: i64) -> TokenService {
        TokenService::new(&AuthConfig {
            secret: secret.to_string(),
            algorithm: Algorithm::HS256,
            token_expiry_minutes: expiry_minutes,
        })
    }

    #[test]
    fn issue_then_verify_returns_subject() {
        let tokens = service("test-secret", 60);
        let token = tokens.issue("ana").unwrap();
        assert!(!token.is_empty());
        assert_eq!(tokens.verify(&token).unwrap(), "ana");
    }

    #[test]
    fn expired_token_is_classified_as_expired() {
        let tokens = service("test-secret", -5);
        let token = tokens.issue("ana").unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_signed_with_another_secret_fails() {
        let issuer = service("secret-one", 60);
        let verifier = service("secret-two", 60);
        let token = issuer.issue("ana").unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn algorithm_mismatch_fails() {
        let issuer = TokenService::new(&AuthConfig {
            secret: "shared-secret".to_string(),
            algorithm: Algorithm::HS512,
            token_expiry_minutes: 60,
        });
        let verifier = service("shared-secret", 60);
        let token = issuer.issue("ana").unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service("test-secret", 60);
        assert_eq!(tokens.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn token_without_subject_is_malformed() {
        let tokens = service("test-secret", 60);
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "exp": exp, "iat": Utc::now().timestamp() }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Malformed));
    }
}
