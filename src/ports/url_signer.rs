//! Download URL signing port used for payload enrichment.

use crate::domain::foundation::{DomainError, Timestamp};

/// A time-limited URL for fetching a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: Timestamp,
}

/// Port for presigning object-storage download URLs.
///
/// Signing is local computation for every backend we target, so the port
/// is synchronous and safe to call from the payload builder.
pub trait DownloadUrlSigner: Send + Sync {
    fn sign_download(&self, storage_key: &str) -> Result<SignedUrl, DomainError>;
}
