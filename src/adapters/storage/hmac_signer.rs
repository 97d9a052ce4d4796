//! HMAC-SHA256 presigned download URLs.
//!
//! URLs have the form
//!
//! ```text
//! <base_url>/<storage_key>?expires=<unix-secs>&signature=<hex hmac>
//! ```
//!
//! where the signature covers `<storage_key>\n<expires>`. The download
//! service verifies with the same secret via [`HmacUrlSigner::verify`].

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{DownloadUrlSigner, SignedUrl};

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of a presigned URL.
pub const DEFAULT_URL_TTL_SECS: u64 = 3600;

/// Signs download URLs with a shared secret.
pub struct HmacUrlSigner {
    secret: Secret<String>,
    base_url: String,
    ttl_secs: u64,
}

impl HmacUrlSigner {
    pub fn new(secret: Secret<String>, base_url: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ttl_secs,
        }
    }

    /// Sign `storage_key` with an explicit issue time.
    pub fn sign_at(&self, storage_key: &str, now: Timestamp) -> Result<SignedUrl, DomainError> {
        validate_key(storage_key)?;

        let expires_at = now.plus_secs(self.ttl_secs);
        let expires = expires_at.as_unix_secs();
        let signature = to_hex(&self.mac(storage_key, expires)?);

        Ok(SignedUrl {
            url: format!(
                "{}/{}?expires={}&signature={}",
                self.base_url, storage_key, expires, signature
            ),
            expires_at,
        })
    }

    /// Check a presented signature. Fails for expired or tampered URLs.
    pub fn verify(&self, storage_key: &str, expires: u64, signature: &str, now: Timestamp) -> bool {
        if expires < now.as_unix_secs() {
            return false;
        }
        match self.mac(storage_key, expires) {
            Ok(expected) => to_hex(&expected)
                .as_bytes()
                .ct_eq(signature.as_bytes())
                .into(),
            Err(_) => false,
        }
    }

    fn mac(&self, storage_key: &str, expires: u64) -> Result<Vec<u8>, DomainError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| DomainError::new(ErrorCode::SigningError, e.to_string()))?;
        mac.update(storage_key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl DownloadUrlSigner for HmacUrlSigner {
    fn sign_download(&self, storage_key: &str) -> Result<SignedUrl, DomainError> {
        self.sign_at(storage_key, Timestamp::now())
    }
}

impl std::fmt::Debug for HmacUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacUrlSigner")
            .field("base_url", &self.base_url)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

/// Keys become a URL path, so reserved query/fragment characters are rejected.
fn validate_key(storage_key: &str) -> Result<(), DomainError> {
    if storage_key.is_empty() {
        return Err(DomainError::validation("storage_key", "must not be empty"));
    }
    if storage_key
        .chars()
        .any(|c| c.is_whitespace() || c == '?' || c == '#')
    {
        return Err(
            DomainError::new(ErrorCode::SigningError, "storage key is not URL-safe")
                .with_detail("storage_key", storage_key),
        );
    }
    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> HmacUrlSigner {
        HmacUrlSigner::new(
            Secret::new("signing-secret".to_string()),
            "https://files.example.com/dl/",
            300,
        )
    }

    fn at(secs: u64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn signature_of(url: &str) -> &str {
        url.rsplit("signature=").next().unwrap()
    }

    #[test]
    fn signed_url_has_expiry_and_signature() {
        let signed = signer().sign_at("tenants/t1/report.pdf", at(1_000)).unwrap();

        assert!(signed
            .url
            .starts_with("https://files.example.com/dl/tenants/t1/report.pdf?expires=1300&signature="));
        assert_eq!(signed.expires_at, at(1_300));
        assert_eq!(signature_of(&signed.url).len(), 64);
    }

    #[test]
    fn signature_verifies_until_expiry() {
        let s = signer();
        let signed = s.sign_at("a/b.txt", at(1_000)).unwrap();
        let sig = signature_of(&signed.url);

        assert!(s.verify("a/b.txt", 1_300, sig, at(1_200)));
        assert!(!s.verify("a/b.txt", 1_300, sig, at(1_301)));
    }

    #[test]
    fn tampered_key_or_expiry_fails_verification() {
        let s = signer();
        let signed = s.sign_at("a/b.txt", at(1_000)).unwrap();
        let sig = signature_of(&signed.url);

        assert!(!s.verify("a/c.txt", 1_300, sig, at(1_000)));
        assert!(!s.verify("a/b.txt", 9_999, sig, at(1_000)));
    }

    #[test]
    fn different_secret_produces_different_signature() {
        let other = HmacUrlSigner::new(Secret::new("other".to_string()), "https://x", 300);
        let a = signer().sign_at("k", at(0)).unwrap();
        let b = other.sign_at("k", at(0)).unwrap();
        assert_ne!(signature_of(&a.url), signature_of(&b.url));
    }

    #[test]
    fn unsafe_keys_are_rejected() {
        assert_eq!(
            signer().sign_at("", at(0)).unwrap_err().code,
            ErrorCode::ValidationFailed
        );
        assert_eq!(
            signer().sign_at("a b?c", at(0)).unwrap_err().code,
            ErrorCode::SigningError
        );
    }
}
