//! Application layer - the write path and runtime wiring.
//!
//! - `interceptor` - committed write → emit effect
//! - `scoped_store` - tenant-scoped façade that applies the interceptor
//! - `runtime` - gateway, dispatcher, and router bundle for host applications

pub mod interceptor;
pub mod runtime;
pub mod scoped_store;

pub use interceptor::MutationInterceptor;
pub use runtime::{RealtimeRuntime, RealtimeRuntimeBuilder};
pub use scoped_store::{AutoEmitStore, ScopedStore, Written};
