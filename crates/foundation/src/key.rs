use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized province name used as the join key between sources.
///
/// Construction always trims surrounding whitespace and uppercases, so two
/// keys compare equal exactly when their source names differ only in case
/// or padding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvinceKey(String);

impl ProvinceKey {
    pub fn new(raw: &str) -> Self {
        Self(normalize_key(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The empty key never participates in a join.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProvinceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProvinceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}
