//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! session. Nothing in the core reads environment variables; the binary
//! collects raw values and hands them to the `*_from_env_value` parsers here.

use crate::constants::{
    AUDIT_DISPLAY_LIMIT, DEFAULT_AUTHOR, DEFAULT_DATA_DIR, MAX_NOTICE_LIFETIME_SECS,
    NOTICE_LIFETIME_SECS,
    REGISTRY_STORAGE_KEY,
};
use crate::storage::validate_storage_key;
use crate::{RegistryError, RegistryResult};
use chrono::Duration;
use std::path::{Path, PathBuf};
use tcth_types::NonEmptyText;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    data_dir: PathBuf,
    storage_key: String,
    author: NonEmptyText,
    audit_display_limit: usize,
    notice_lifetime: Duration,
}

impl RegistryConfig {
    /// Create a new `RegistryConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidInput`] if the storage key contains characters that
    /// cannot name a storage slot, if the audit limit is zero, or if the notice lifetime is
    /// not positive or exceeds [`MAX_NOTICE_LIFETIME_SECS`].
    pub fn new(
        data_dir: PathBuf,
        storage_key: String,
        author: NonEmptyText,
        audit_display_limit: usize,
        notice_lifetime: Duration,
    ) -> RegistryResult<Self> {
        validate_storage_key(&storage_key)
            .map_err(|e| RegistryError::InvalidInput(e.to_string()))?;

        if audit_display_limit == 0 {
            return Err(RegistryError::InvalidInput(
                "audit display limit must be at least 1".into(),
            ));
        }

        if notice_lifetime <= Duration::zero() {
            return Err(RegistryError::InvalidInput(
                "notice lifetime must be positive".into(),
            ));
        }

        if notice_lifetime.num_seconds() > MAX_NOTICE_LIFETIME_SECS {
            return Err(RegistryError::InvalidInput(format!(
                "notice lifetime must be at most {MAX_NOTICE_LIFETIME_SECS} seconds"
            )));
        }

        Ok(Self {
            data_dir,
            storage_key,
            author,
            audit_display_limit,
            notice_lifetime,
        })
    }

    /// Configuration with every default, rooted at `data_dir`.
    pub fn with_defaults(data_dir: PathBuf) -> RegistryResult<Self> {
        Self::new(
            data_dir,
            REGISTRY_STORAGE_KEY.into(),
            NonEmptyText::new(DEFAULT_AUTHOR)?,
            AUDIT_DISPLAY_LIMIT,
            Duration::seconds(NOTICE_LIFETIME_SECS),
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn author(&self) -> &NonEmptyText {
        &self.author
    }

    pub fn audit_display_limit(&self) -> usize {
        self.audit_display_limit
    }

    pub fn notice_lifetime(&self) -> Duration {
        self.notice_lifetime
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data directory; blank or missing values fall back to [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn storage_key_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| REGISTRY_STORAGE_KEY.into())
}

pub fn author_from_env_value(value: Option<String>) -> RegistryResult<NonEmptyText> {
    let raw = non_blank(value).unwrap_or_else(|| DEFAULT_AUTHOR.into());
    Ok(NonEmptyText::new(raw)?)
}

/// Parse the audit display limit. Missing or blank values give [`AUDIT_DISPLAY_LIMIT`].
pub fn audit_limit_from_env_value(value: Option<String>) -> RegistryResult<usize> {
    match non_blank(value) {
        None => Ok(AUDIT_DISPLAY_LIMIT),
        Some(v) => v.parse::<usize>().map_err(|_| {
            RegistryError::InvalidInput(format!("TCTH_AUDIT_LIMIT must be a positive integer, got '{v}'"))
        }),
    }
}

/// Parse the notice lifetime in seconds. Missing or blank values give [`NOTICE_LIFETIME_SECS`].
pub fn notice_lifetime_from_env_value(value: Option<String>) -> RegistryResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::seconds(NOTICE_LIFETIME_SECS)),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                RegistryError::InvalidInput(format!(
                    "TCTH_NOTICE_SECS must be an integer number of seconds, got '{v}'"
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RegistryConfig::with_defaults(PathBuf::from("/tmp/x")).unwrap();
        assert_eq!(cfg.storage_key(), REGISTRY_STORAGE_KEY);
        assert_eq!(cfg.audit_display_limit(), 6);
        assert_eq!(cfg.notice_lifetime(), Duration::seconds(5));
        assert_eq!(cfg.author().as_str(), DEFAULT_AUTHOR);
    }

    #[test]
    fn rejects_unsafe_storage_key() {
        let err = RegistryConfig::new(
            PathBuf::from("/tmp/x"),
            "../escape".into(),
            NonEmptyText::new("Tester").unwrap(),
            6,
            Duration::seconds(5),
        )
        .expect_err("path-like key should be rejected");
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_audit_limit() {
        let err = RegistryConfig::new(
            PathBuf::from("/tmp/x"),
            REGISTRY_STORAGE_KEY.into(),
            NonEmptyText::new("Tester").unwrap(),
            0,
            Duration::seconds(5),
        )
        .expect_err("zero limit should be rejected");
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }

    #[test]
    fn env_value_parsers_fall_back_on_blank() {
        assert_eq!(audit_limit_from_env_value(Some("  ".into())).unwrap(), 6);
        assert_eq!(audit_limit_from_env_value(Some("10".into())).unwrap(), 10);
        assert!(audit_limit_from_env_value(Some("ten".into())).is_err());
        assert_eq!(
            notice_lifetime_from_env_value(None).unwrap(),
            Duration::seconds(5)
        );
        assert_eq!(
            data_dir_from_env_value(Some(String::new())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(storage_key_from_env_value(None), REGISTRY_STORAGE_KEY);
        assert_eq!(
            author_from_env_value(Some(" Enf. Paula ".into()))
                .unwrap()
                .as_str(),
            "Enf. Paula"
        );
    }

    #[test]
    fn out_of_range_notice_lifetime_is_an_error() {
        let err = notice_lifetime_from_env_value(Some("9223372036854775807".into()))
            .expect_err("seconds beyond the duration range should be rejected");
        assert!(matches!(err, RegistryError::InvalidInput(_)));

        let huge = notice_lifetime_from_env_value(Some("86400000".into())).unwrap();
        let err = RegistryConfig::new(
            PathBuf::from("/tmp/x"),
            REGISTRY_STORAGE_KEY.into(),
            NonEmptyText::new("Tester").unwrap(),
            6,
            huge,
        )
        .expect_err("lifetime above the cap should be rejected");
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }
}
