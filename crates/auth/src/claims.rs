use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use bazaar_core::UserId;

use crate::{Principal, Role};

/// JWT claims model (transport-agnostic).
///
/// This is the minimal set of claims the service expects once a token has
/// been decoded and its signature verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Marketplace role granted to the user.
    pub role: Role,

    /// Admin capability flags.
    pub is_staff: bool,
    pub is_superuser: bool,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.sub,
            role: self.role,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification is done by
/// the [`JwtValidator`] implementation.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Token verification boundary consumed by the request layer.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// On-the-wire claim encoding (standard JWT numeric dates).
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: Uuid,
    role: Role,
    #[serde(default)]
    staff: bool,
    #[serde(default)]
    superuser: bool,
    iat: i64,
    exp: i64,
}

/// HMAC-SHA256 token validator (shared-secret deployments).
pub struct Hs256JwtValidator {
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(&secret),
            decoding: jsonwebtoken::DecodingKey::from_secret(&secret),
        }
    }

    /// Issue a signed token for the given claims (dev tooling and tests).
    pub fn issue(&self, claims: &JwtClaims) -> Result<String, TokenValidationError> {
        let wire = WireClaims {
            sub: (*claims.sub.as_uuid()),
            role: claims.role,
            staff: claims.is_staff,
            superuser: claims.is_superuser,
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &wire,
            &self.encoding,
        )
        .map_err(|e| TokenValidationError::Malformed(e.to_string()))
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        // Expiry is checked by validate_claims against the caller-provided clock.
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        let wire = data.claims;
        let timestamp = |secs: i64| {
            Utc.timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| TokenValidationError::Malformed("bad timestamp".to_string()))
        };

        let claims = JwtClaims {
            sub: UserId::from_uuid(wire.sub),
            role: wire.role,
            is_staff: wire.staff,
            is_superuser: wire.superuser,
            issued_at: timestamp(wire.iat)?,
            expires_at: timestamp(wire.exp)?,
        };

        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            role: Role::Seller,
            is_staff: false,
            is_superuser: false,
            issued_at: now,
            expires_at: now + Duration::hours(1),
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let now = Utc::now();
        let validator = Hs256JwtValidator::new(b"test-secret".to_vec());
        let original = claims(now);

        let token = validator.issue(&original).unwrap();
        let decoded = validator.validate(&token, now).unwrap();

        assert_eq!(decoded.sub, original.sub);
        assert_eq!(decoded.role, Role::Seller);
        assert!(!decoded.principal().is_admin());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let validator = Hs256JwtValidator::new(b"test-secret".to_vec());
        let token = validator.issue(&claims(now)).unwrap();

        let later = now + Duration::hours(2);
        assert_eq!(
            validator.validate(&token, later),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn tampered_token_is_rejected() {
        let now = Utc::now();
        let validator = Hs256JwtValidator::new(b"test-secret".to_vec());
        let other = Hs256JwtValidator::new(b"other-secret".to_vec());
        let token = validator.issue(&claims(now)).unwrap();

        assert!(matches!(
            other.validate(&token, now),
            Err(TokenValidationError::Malformed(_))
        ));
    }

    #[test]
    fn claim_window_is_validated() {
        let now = Utc::now();
        let mut c = claims(now);
        c.expires_at = c.issued_at;
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
