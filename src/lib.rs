//! Project Pulse - realtime distribution for a multi-tenant project platform
//!
//! Business code writes records through an auto-emitting store. Every
//! mutation is turned into a realtime event, addressed to project, user,
//! or tenant rooms, and fanned out to connected WebSocket clients.
//!
//! - [`domain`] - rooms, entity kinds, event naming, room resolution
//! - [`ports`] - traits the core depends on
//! - [`adapters`] - gateway, dispatcher, auth, storage, access checks
//! - [`application`] - interceptor, scoped stores, runtime wiring
//! - [`client`] - subscription manager for consumers of events
//! - [`config`] - environment-driven configuration for the gateway binary

pub mod adapters;
pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;
