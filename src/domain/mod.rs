//! Domain layer containing the realtime distribution types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, auth, errors)
//! - `realtime` - Rooms, entity kinds, emit context, resolver and payload builder

pub mod foundation;
pub mod realtime;
