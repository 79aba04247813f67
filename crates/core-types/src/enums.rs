use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle stage of an alpha on the platform.
///
/// `IS` alphas are still in-sample candidates, `OS` alphas have been submitted
/// and are the universe the self-correlation check compares against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Stage {
    InSample,
    OutOfSample,
    Other(String),
}

impl Stage {
    /// The query/response text used by the remote API.
    pub fn as_str(&self) -> &str {
        match self {
            Stage::InSample => "IS",
            Stage::OutOfSample => "OS",
            Stage::Other(s) => s,
        }
    }
}

impl From<String> for Stage {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IS" => Stage::InSample,
            "OS" => Stage::OutOfSample,
            _ => Stage::Other(value),
        }
    }
}

impl From<Stage> for String {
    fn from(value: Stage) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
