//! Versioned bucket names.
//!
//! A bucket is named `<prefix>-v<version>`, e.g. `yfo-cache-v19`. Bumping the
//! version on each deployment is what retires the previous bucket at
//! activation time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Name of a versioned cache bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketName {
    prefix: String,
    version: u32,
}

impl BucketName {
    /// Build a bucket name.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBucket` for an empty prefix, a prefix containing
    /// whitespace, or version 0.
    pub fn new(prefix: impl Into<String>, version: u32) -> Result<Self, Error> {
        let prefix = prefix.into();
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(Error::InvalidBucket(format!("bad prefix: {prefix:?}")));
        }
        if version == 0 {
            return Err(Error::InvalidBucket("version must be at least 1".into()));
        }
        Ok(Self { prefix, version })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}", self.prefix, self.version)
    }
}

impl FromStr for BucketName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, version) = s
            .rsplit_once("-v")
            .ok_or_else(|| Error::InvalidBucket(format!("missing -v<version> suffix: {s}")))?;
        let version: u32 = version
            .parse()
            .map_err(|_| Error::InvalidBucket(format!("non-numeric version: {s}")))?;
        Self::new(prefix, version)
    }
}
