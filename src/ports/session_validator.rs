//! Session validation port for the connection handshake.
//!
//! Resolves the bearer credential a client presents when it opens a realtime
//! connection into an `AuthenticatedUser` (user id plus optional tenant). It
//! is provider-agnostic: a JWT implementation and a mock exist.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates bearer credentials and extracts the connection identity.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{TenantId, UserId};
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Simple mock implementation for testing the trait
    struct TestSessionValidator {
        tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    }

    impl TestSessionValidator {
        fn new() -> Self {
            Self {
                tokens: RwLock::new(HashMap::new()),
            }
        }

        fn add_token(&self, token: &str, user: AuthenticatedUser) {
            self.tokens.write().unwrap().insert(token.to_string(), user);
        }
    }

    #[async_trait]
    impl SessionValidator for TestSessionValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.tokens
                .read()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn validator_returns_identity_for_known_token() {
        let validator = TestSessionValidator::new();
        let user = AuthenticatedUser::new(UserId::new("u1").unwrap())
            .with_tenant(TenantId::new("t1").unwrap());
        validator.add_token("good", user.clone());

        assert_eq!(validator.validate("good").await.unwrap(), user);
    }

    #[tokio::test]
    async fn validator_rejects_unknown_token() {
        let validator = TestSessionValidator::new();
        assert_eq!(
            validator.validate("bad").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn session_validator_is_object_safe() {
        fn _assert(_: &dyn SessionValidator) {}
    }
}
