//! Bearer-token verification for shop staff.
//!
//! Staff tokens are HS256 JWTs minted by the shop's identity provider. The
//! server only verifies them: [`verify_token`] checks signature and expiry,
//! and [`token_digest`] gives the key under which the decoded identity is
//! cached.
//!
//! [`issue_token`] mints a token with the same claims. Nothing on the
//! request path calls it; it exists for the integration tests and for
//! minting local development tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use repairdesk_core::types::DbId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Claims carried by a staff token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Staff member id.
    pub sub: DbId,
    /// Staff email. Tickets store it as the assigned technician.
    pub email: String,
    /// Managers may deactivate customers and assign other technicians.
    #[serde(default)]
    pub is_manager: bool,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    /// Claims for one staff member, valid for `ttl_mins` from `now`.
    pub fn for_staff(
        user_id: DbId,
        email: &str,
        is_manager: bool,
        ttl_mins: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let iat = now.timestamp();
        Self {
            sub: user_id,
            email: email.to_string(),
            is_manager,
            exp: iat + ttl_mins * 60,
            iat,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Signing secret and lifetime of staff tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of tokens minted by [`issue_token`], in minutes.
    pub access_token_expiry_mins: i64,
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Read the token settings from the environment.
    ///
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or empty, or if the expiry is not
    /// a positive integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");
        assert!(
            access_token_expiry_mins > 0,
            "JWT_ACCESS_EXPIRY_MINS must be greater than zero"
        );

        Self {
            secret,
            access_token_expiry_mins,
        }
    }
}

/// Mint a staff token for tests and local tooling.
pub fn issue_token(
    user_id: DbId,
    email: &str,
    is_manager: bool,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::for_staff(
        user_id,
        email,
        is_manager,
        config.access_token_expiry_mins,
        Utc::now(),
    );
    sign(&claims, config)
}

fn sign(claims: &Claims, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check signature and expiry of a bearer token and return its claims.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Hex SHA-256 of a bearer token. The identity cache never sees raw tokens.
pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 15,
        }
    }

    #[test]
    fn issued_token_verifies_with_staff_claims() {
        let config = config("bench-secret");
        let token = issue_token(42, "tech@shop.test", true, &config).unwrap();

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "tech@shop.test");
        assert!(claims.is_manager);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn missing_manager_flag_means_technician() {
        let config = config("bench-secret");
        let claims = Claims::for_staff(7, "tech@shop.test", false, 15, Utc::now());
        let mut value = serde_json::to_value(&claims).unwrap();
        value.as_object_mut().unwrap().remove("is_manager");
        let token = encode(
            &Header::default(),
            &value,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(!verify_token(&token, &config).unwrap().is_manager);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config("bench-secret");
        // Past the 60 second leeway of the default validation.
        let claims = Claims::for_staff(1, "tech@shop.test", false, 5, Utc::now() - Duration::minutes(10));
        let token = sign(&claims, &config).unwrap();

        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = issue_token(1, "tech@shop.test", false, &config("front-desk")).unwrap();
        assert!(verify_token(&token, &config("back-office")).is_err());
    }

    #[test]
    fn digest_is_stable_hex() {
        let digest = token_digest("abc.def.ghi");
        assert_eq!(digest, token_digest("abc.def.ghi"));
        assert_ne!(digest, token_digest("abc.def.ghj"));
        assert_eq!(digest.len(), 64);
    }
}
