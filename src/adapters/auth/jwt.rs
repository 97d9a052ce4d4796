//! HS256 JWT adapter for handshake token validation.
//!
//! The platform's auth service signs session tokens with a shared secret.
//! This adapter validates them by:
//!
//! 1. Verifying the HS256 signature against the configured secret
//! 2. Validating issuer, audience, and expiry claims
//! 3. Mapping `sub` and the optional `tenant_id` claim to `AuthenticatedUser`
//!
//! # Example
//!
//! ```ignore
//! use project_pulse::adapters::auth::{JwtConfig, JwtSessionValidator};
//!
//! let validator = JwtSessionValidator::new(JwtConfig::new(secret, "pulse-auth", "pulse-realtime"));
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, TenantId, UserId};
use crate::ports::SessionValidator;

/// Configuration for the JWT adapter.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HS256 signing secret.
    pub secret: Secret<String>,

    /// Expected `iss` claim.
    pub issuer: String,

    /// Expected `aud` claim.
    pub audience: String,
}

impl JwtConfig {
    pub fn new(
        secret: Secret<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            secret,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - the user ID
    pub sub: String,

    /// Tenant the user is scoped to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub iss: String,

    /// Audience - array or single string
    pub aud: Audience,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: u64,
}

/// Audience can be a single string or array of strings in JWTs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

/// Validates HS256 session tokens.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            decoding_key,
            validation,
            config,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                    tracing::warn!(
                        issuer = %self.config.issuer,
                        audience = %self.config.audience,
                        "Token issued for another service"
                    );
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::debug!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            },
        )?;
        let claims = data.claims;

        let user_id = UserId::new(claims.sub).map_err(|_| {
            tracing::warn!("Token has empty subject");
            AuthError::InvalidToken
        })?;
        let mut user = AuthenticatedUser::new(user_id);

        if let Some(tenant) = claims.tenant_id.filter(|t| !t.is_empty()) {
            let tenant_id = TenantId::new(tenant).map_err(|_| AuthError::InvalidToken)?;
            user = user.with_tenant(tenant_id);
        }
        if let Some(name) = claims.name {
            user = user.with_display_name(name);
        }

        Ok(user)
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-long-enough";

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(JwtConfig::new(
            Secret::new(SECRET.to_string()),
            "pulse-auth",
            "pulse-realtime",
        ))
    }

    fn claims(sub: &str, tenant: Option<&str>) -> SessionClaims {
        SessionClaims {
            sub: sub.to_string(),
            tenant_id: tenant.map(str::to_string),
            name: None,
            iss: "pulse-auth".to_string(),
            aud: Audience::Single("pulse-realtime".to_string()),
            exp: Timestamp::now().plus_secs(600).as_unix_secs(),
        }
    }

    fn sign(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_maps_to_identity() {
        let token = sign(&claims("u1", Some("t1")), SECRET);

        let user = validator().validate(&token).await.unwrap();

        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.tenant_id.unwrap().as_str(), "t1");
    }

    #[tokio::test]
    async fn token_without_tenant_is_unscoped() {
        let token = sign(&claims("u1", None), SECRET);
        let user = validator().validate(&token).await.unwrap();
        assert!(!user.is_tenant_scoped());
    }

    #[tokio::test]
    async fn audience_array_is_accepted() {
        let mut c = claims("u1", None);
        c.aud = Audience::Multiple(vec!["other".to_string(), "pulse-realtime".to_string()]);
        assert!(validator().validate(&sign(&c, SECRET)).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let token = sign(&claims("u1", None), "another-secret");
        assert_eq!(
            validator().validate(&token).await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn wrong_audience_is_invalid() {
        let mut c = claims("u1", None);
        c.aud = Audience::Single("billing".to_string());
        assert_eq!(
            validator().validate(&sign(&c, SECRET)).await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let mut c = claims("u1", None);
        c.exp = Timestamp::now().as_unix_secs().saturating_sub(3600);
        assert_eq!(
            validator().validate(&sign(&c, SECRET)).await.unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_eq!(
            validator().validate("not-a-jwt").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn debug_output_redacts_secret() {
        let debug = format!("{:?}", validator());
        assert!(!debug.contains(SECRET));
    }
}
