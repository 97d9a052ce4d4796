//! Project access adapters - implementations of `ProjectAccessChecker`.
//!
//! - `InMemoryProjectAccess` - Explicit grant table for development/testing
//! - `PostgresProjectAccess` - Membership lookup in the platform database

mod in_memory;
mod postgres;

pub use in_memory::InMemoryProjectAccess;
pub use postgres::PostgresProjectAccess;
