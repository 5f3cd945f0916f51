use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use polyver_backend::{LanguageConfig, ScanPathSpec};
use polyver_platform::write_atomic;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    #[serde(default)]
    pub auto_activate: AutoActivate,

    /// User-added scan paths keyed by language identifier, appended to the
    /// language's own paths on every scan.
    #[serde(default)]
    pub extra_scan_paths: HashMap<String, Vec<ScanPathSpec>>,
}

/// Which languages get their highest version activated when nothing has ever
/// been activated for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoActivate {
    #[default]
    CustomOnly,
    All,
    None,
}

impl AutoActivate {
    #[must_use]
    pub fn applies_to(self, language: &LanguageConfig) -> bool {
        match self {
            Self::CustomOnly => !language.is_built_in,
            Self::All => true,
            Self::None => false,
        }
    }
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_command_timeout() -> u64 {
    5
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            command_timeout_secs: default_command_timeout(),
            auto_activate: AutoActivate::default(),
            extra_scan_paths: HashMap::new(),
        }
    }
}

impl AppSettings {
    /// Read settings from `path`. Missing, unreadable or malformed files
    /// yield the defaults.
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!("Ignoring malformed {}: {error}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Write pretty-printed settings to `path`, replacing the file
    /// atomically and creating its directory if needed.
    ///
    /// # Errors
    /// Returns the I/O error when the directory cannot be created or the file
    /// cannot be replaced.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path, content.as_bytes())
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }

    #[must_use]
    pub fn extra_scan_paths_for(&self, identifier: &str) -> &[ScanPathSpec] {
        self.extra_scan_paths
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use polyver_backend::{LanguageConfig, ScanPathSpec};

    use super::{AppSettings, AutoActivate};

    #[test]
    fn defaults() {
        let settings = AppSettings::default();

        assert!(!settings.debug_logging);
        assert_eq!(settings.max_log_size_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.command_timeout_secs, 5);
        assert_eq!(settings.auto_activate, AutoActivate::CustomOnly);
        assert!(settings.extra_scan_paths.is_empty());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: AppSettings = serde_json::from_value(json!({
            "debug_logging": true,
            "auto_activate": "all",
        }))
        .expect("partial settings should deserialize");

        assert!(settings.debug_logging);
        assert_eq!(settings.auto_activate, AutoActivate::All);
        assert_eq!(settings.command_timeout_secs, 5);
    }

    #[test]
    fn save_then_load_preserves_extra_scan_paths() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("config").join("settings.json");
        let mut settings = AppSettings::default();
        settings
            .extra_scan_paths
            .insert("go".to_string(), vec![ScanPathSpec::custom("~/toolchains/go*")]);

        settings.save_to(&path).expect("save settings");

        assert_eq!(AppSettings::load_from(&path), settings);
    }

    #[test]
    fn malformed_file_loads_defaults() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").expect("write garbage");

        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }

    #[test]
    fn auto_activate_policy() {
        let custom = LanguageConfig::custom("ruby", "Ruby", None, Vec::new());
        let mut built_in = custom.clone();
        built_in.is_built_in = true;

        assert!(AutoActivate::CustomOnly.applies_to(&custom));
        assert!(!AutoActivate::CustomOnly.applies_to(&built_in));
        assert!(AutoActivate::All.applies_to(&built_in));
        assert!(!AutoActivate::None.applies_to(&custom));
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let settings = AppSettings {
            command_timeout_secs: 0,
            ..AppSettings::default()
        };
        assert_eq!(settings.command_timeout().as_secs(), 1);
    }
}
