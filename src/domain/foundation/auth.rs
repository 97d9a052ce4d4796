//! Authentication types for the domain layer.
//!
//! An `AuthenticatedUser` is the identity a realtime connection carries for
//! its whole lifetime. It is produced by a `SessionValidator` during the
//! connection handshake and never changes afterwards; the user and tenant
//! rooms a connection belongs to are derived from it.

use super::{TenantId, UserId};
use thiserror::Error;

/// Authenticated actor extracted from a validated bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the auth provider.
    pub id: UserId,

    /// Tenant the user is acting within, if the credential is tenant-scoped.
    pub tenant_id: Option<TenantId>,

    /// Display name if available.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a user that is not bound to any tenant.
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            tenant_id: None,
            display_name: None,
        }
    }

    /// Binds the user to a tenant.
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Sets a display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Returns true if the credential carried a tenant.
    pub fn is_tenant_scoped(&self) -> bool {
        self.tenant_id.is_some()
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("Missing credential")]
    MissingToken,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The authentication service is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if the client should obtain a new credential.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::TokenExpired
        )
    }
}
