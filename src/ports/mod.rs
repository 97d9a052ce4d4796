//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the realtime layer and the outside world. Adapters implement these ports.
//!
//! ## Gateway Ports
//!
//! - `SessionValidator` - Resolves a handshake credential to an identity
//! - `ProjectAccessChecker` - Authorizes explicit project room joins
//! - `Broadcaster` - Fans an event out to a room
//!
//! ## Write-path Ports
//!
//! - `RecordStore` - Tenant-scoped persistence behind the façade
//! - `DownloadUrlSigner` - Presigned URLs for file payload enrichment

mod broadcaster;
mod project_access;
mod record_store;
mod session_validator;
mod url_signer;

pub use broadcaster::Broadcaster;
pub use project_access::ProjectAccessChecker;
pub use record_store::{RecordStore, UpsertOutcome};
pub use session_validator::SessionValidator;
pub use url_signer::{DownloadUrlSigner, SignedUrl};
