use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoded, verified token payload: identity plus validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric user id, owned by the external user store
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization token required")]
    MissingToken,

    #[error("Token expired")]
    Expired,

    #[error("Token not yet valid")]
    NotYetValid,

    #[error("Token signature invalid")]
    InvalidSignature,

    #[error("Token malformed: {0}")]
    Malformed(String),
}

/// Stateless JWT verifier.
///
/// The verification algorithm is pinned to HS256 at construction; the
/// `alg` field of an inbound token is never consulted, so a token
/// claiming some other signing method fails instead of choosing its
/// own verification path.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        // Exact [nbf, exp) semantics, no grace period
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and timing, then claim well-formedness.
    /// Pure function of token, secret, and current time.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::ImmatureSignature => AuthError::NotYetValid,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed(e.to_string()),
            }
        })?;

        let claims = data.claims;
        if claims.sub < 0 {
            return Err(AuthError::Malformed("negative subject".into()));
        }
        if claims.username.is_empty() {
            return Err(AuthError::Malformed("empty username".into()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn claims_valid_for(hours: i64) -> Claims {
        let now = Utc::now();
        Claims {
            sub: 42,
            username: "alice".into(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(hours)).timestamp(),
            nbf: now.timestamp(),
            role: None,
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode")
    }

    #[test]
    fn round_trips_identity_claims() {
        let verifier = TokenVerifier::new(SECRET);
        let token = sign(&claims_valid_for(1), SECRET);

        let claims = verifier.verify(&token).expect("valid token");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, None);
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = TokenVerifier::new(SECRET);
        let mut claims = claims_valid_for(1);
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = sign(&claims, SECRET);

        assert!(matches!(verifier.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn rejects_not_yet_valid_token() {
        let verifier = TokenVerifier::new(SECRET);
        let mut claims = claims_valid_for(2);
        claims.nbf = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign(&claims, SECRET);

        assert!(matches!(verifier.verify(&token), Err(AuthError::NotYetValid)));
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = TokenVerifier::new(SECRET);
        let token = sign(&claims_valid_for(1), "other-secret");

        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_token_declaring_other_algorithm() {
        // A token whose header names a different HMAC variant must not
        // get to pick its own verification path.
        let verifier = TokenVerifier::new(SECRET);
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims_valid_for(1),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encode");

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn rejects_garbage_and_ill_formed_claims() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(matches!(
            verifier.verify("not.a.token"),
            Err(AuthError::Malformed(_))
        ));

        let mut claims = claims_valid_for(1);
        claims.sub = -1;
        let token = sign(&claims, SECRET);
        assert!(matches!(verifier.verify(&token), Err(AuthError::Malformed(_))));

        let mut claims = claims_valid_for(1);
        claims.username = String::new();
        let token = sign(&claims, SECRET);
        assert!(matches!(verifier.verify(&token), Err(AuthError::Malformed(_))));
    }
}
