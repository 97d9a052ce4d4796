//! Attachment download URL signing

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::storage::DEFAULT_URL_TTL_SECS;

const MAX_URL_TTL_SECS: u64 = 7 * 24 * 3600;

/// Signing settings for attachment download URLs.
///
/// Optional as a whole: without it, attachment events carry no URL.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// HMAC key shared with the download endpoint
    pub signing_secret: Secret<String>,

    /// Public base the storage key is appended to
    pub download_base_url: String,

    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
}

impl StorageConfig {
    pub fn url_ttl(&self) -> Duration {
        Duration::from_secs(self.url_ttl_secs)
    }

    /// Validate storage configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.signing_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__SIGNING_SECRET"));
        }
        if self.download_base_url.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__DOWNLOAD_BASE_URL"));
        }
        if *environment == Environment::Production
            && !self.download_base_url.starts_with("https://")
        {
            return Err(ValidationError::DownloadUrlMustBeHttps);
        }
        if self.url_ttl_secs == 0 || self.url_ttl_secs > MAX_URL_TTL_SECS {
            return Err(ValidationError::InvalidUrlTtl);
        }
        Ok(())
    }
}

fn default_url_ttl_secs() -> u64 {
    DEFAULT_URL_TTL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> StorageConfig {
        StorageConfig {
            signing_secret: Secret::new("signing-key".to_string()),
            download_base_url: base.to_string(),
            url_ttl_secs: default_url_ttl_secs(),
        }
    }

    #[test]
    fn test_http_allowed_in_development() {
        let config = config("http://localhost:9000/files");
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(config.url_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_http_rejected_in_production() {
        let config = config("http://files.example.com");
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::DownloadUrlMustBeHttps)
        );
    }

    #[test]
    fn test_missing_secret() {
        let config = StorageConfig {
            signing_secret: Secret::new(String::new()),
            ..config("https://files.example.com")
        };
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::MissingRequired("STORAGE__SIGNING_SECRET"))
        );
    }

    #[test]
    fn test_ttl_out_of_range() {
        let config = StorageConfig {
            url_ttl_secs: 0,
            ..config("https://files.example.com")
        };
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::InvalidUrlTtl)
        );
    }
}
