//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 session tokens signed by the platform auth service
//! - `mock` - Test implementation that doesn't require signed tokens

mod jwt;
mod mock;

pub use jwt::{Audience, JwtConfig, JwtSessionValidator, SessionClaims};
pub use mock::MockSessionValidator;
