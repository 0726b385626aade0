//! Plugin settings: the upload provider and deep populate.

use crate::storage::StorageConfig;
use serde::Serialize;

/// Options of the deep-populate plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepPopulateOptions {
    /// Cache computed populate trees per content type
    pub use_cache: bool,
    /// Expand `populate=*` recursively
    pub replace_wildcard: bool,
}

impl Default for DeepPopulateOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            replace_wildcard: true,
        }
    }
}

/// Deep-populate plugin entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeepPopulatePlugin {
    /// Whether the plugin is loaded
    pub enabled: bool,
    /// Plugin options
    pub config: DeepPopulateOptions,
}

impl Default for DeepPopulatePlugin {
    fn default() -> Self {
        Self {
            enabled: true,
            config: DeepPopulateOptions::default(),
        }
    }
}

/// Upload plugin entry.
#[derive(Debug, Serialize)]
pub struct UploadPlugin {
    /// Provider configuration
    pub config: StorageConfig,
}

/// Plugin settings handed to the framework.
#[derive(Debug, Default, Serialize)]
pub struct PluginsConfig {
    /// Object storage upload provider; the local provider is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadPlugin>,
    /// Deep populate
    #[serde(rename = "deep-populate")]
    pub deep_populate: DeepPopulatePlugin,
}

impl PluginsConfig {
    /// Plugin settings with the given upload storage.
    #[must_use]
    pub fn new(storage: Option<StorageConfig>) -> Self {
        Self {
            upload: storage.map(|config| UploadPlugin { config }),
            deep_populate: DeepPopulatePlugin::default(),
        }
    }

    /// Storage settings of the upload provider.
    #[must_use]
    pub fn storage(&self) -> Option<&StorageConfig> {
        self.upload.as_ref().map(|upload| &upload.config)
    }
}
