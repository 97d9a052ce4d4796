//! Storage Adapters
//!
//! ## Available Adapters
//!
//! - **HmacUrlSigner** - Presigned download URLs (`DownloadUrlSigner`)
//! - **InMemoryRecordStore** - Tenant-partitioned records in memory (`RecordStore`)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{HmacUrlSigner, InMemoryRecordStore};
//!
//! let signer = HmacUrlSigner::new(secret, "https://files.example.com", 3600);
//! let store = InMemoryRecordStore::new();
//! ```

mod hmac_signer;
mod in_memory_store;

pub use hmac_signer::{HmacUrlSigner, DEFAULT_URL_TTL_SECS};
pub use in_memory_store::InMemoryRecordStore;
