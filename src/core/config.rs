//! Save modes and codec settings

use serde::{Deserialize, Serialize};

/// How a save call treats an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    /// Truncate and write a fresh file
    #[default]
    Create,
    /// Grow an existing file; behaves like `Create` if the path does not exist
    Append,
}

/// Codec-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Call `sync_all` on the file before a save returns
    pub sync_on_write: bool,

    /// Verify the CRC32 of each archive member on read
    pub verify_checksums: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            sync_on_write: false,
            verify_checksums: true,
        }
    }
}

impl CodecConfig {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
