use crate::enums::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A market/geography partition (e.g. "USA", "CHN"). Correlation comparisons
/// never cross regions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A candidate trading signal registered with the remote platform.
///
/// Identity is the `id` string. The PnL itself is not part of the record; it
/// is fetched separately and lives in the wide `PnlTable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alpha {
    pub id: String,
    pub region: Region,
    pub stage: Stage,
    /// Names of the classification tags attached to the alpha
    /// (e.g. "Power Pool Alpha").
    pub classifications: Vec<String>,
}

impl Alpha {
    pub fn has_classification(&self, name: &str) -> bool {
        self.classifications.iter().any(|c| c == name)
    }
}
