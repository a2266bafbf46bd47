//! Deployment configuration for the desktop store.

use crate::persistence::DEFAULT_STORAGE_KEY;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where assets live and which storage key holds the snapshot.
pub struct RuntimeConfig {
    /// URL prefix for bundled sounds and wallpapers, without a trailing slash.
    pub asset_base_path: String,
    /// Key under which the snapshot envelope is stored.
    pub storage_key: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            asset_base_path: String::new(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Reads `PURPLEOS_BASE_PATH` captured at compile time, for builds served below the site root.
    pub fn from_build_env() -> Self {
        Self::default().with_asset_base_path(option_env!("PURPLEOS_BASE_PATH").unwrap_or_default())
    }

    pub fn with_asset_base_path(mut self, base_path: impl AsRef<str>) -> Self {
        self.asset_base_path = crate::sound::normalize_base_path(base_path.as_ref());
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.storage_key = key;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builder_normalizes_base_path_and_ignores_blank_keys() {
        let config = RuntimeConfig::default()
            .with_asset_base_path("/purple-os/")
            .with_storage_key("  ");
        assert_eq!(config.asset_base_path, "/purple-os");
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);

        let config = config.with_storage_key("purpleos-test");
        assert_eq!(config.storage_key, "purpleos-test");
    }
}
