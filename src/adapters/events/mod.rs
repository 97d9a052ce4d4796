//! Event delivery adapters.
//!
//! - `EmitDispatcher` - FIFO background delivery of emit effects to the
//!   broadcast gateway

mod dispatcher;

pub use dispatcher::EmitDispatcher;
