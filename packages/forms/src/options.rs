use formwork_common::FormResult;
use serde::{Deserialize, Serialize};

/// Output options for string rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Separator placed between rendered children
    pub linebreak: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            linebreak: "\n".to_string(),
        }
    }
}

impl Options {
    /// Load options from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> FormResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
