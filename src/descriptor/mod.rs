//! Plugin identity and engine compatibility.

use semver::Version;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    pub author: String,
    pub display_name: String,
    pub version: Version,
    pub min_engine_version: Version,
    pub max_engine_version: Version,
}

impl PluginDescriptor {
    pub fn new(
        author: impl Into<String>,
        display_name: impl Into<String>,
        version: Version,
        min_engine_version: Version,
        max_engine_version: Version,
    ) -> Self {
        Self {
            author: author.into(),
            display_name: display_name.into(),
            version,
            min_engine_version,
            max_engine_version,
        }
    }

    /// Inclusive on both ends.
    pub fn supports_engine(&self, engine: &Version) -> bool {
        &self.min_engine_version <= engine && engine <= &self.max_engine_version
    }
}
