use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    Homebrew,
    Pyenv,
    Nvm,
    Gvm,
    Asdf,
    Rbenv,
    Rvm,
    Rustup,
    JavaHome,
    System,
    Custom,
}

impl SourceTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Homebrew => "homebrew",
            Self::Pyenv => "pyenv",
            Self::Nvm => "nvm",
            Self::Gvm => "gvm",
            Self::Asdf => "asdf",
            Self::Rbenv => "rbenv",
            Self::Rvm => "rvm",
            Self::Rustup => "rustup",
            Self::JavaHome => "java-home",
            Self::System => "system",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured location to search for installations. May contain a leading
/// `~` and at most one `*` per path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanPathSpec {
    pub raw: String,
    pub source: SourceTag,
    #[serde(default)]
    pub is_built_in: bool,
}

impl ScanPathSpec {
    #[must_use]
    pub fn built_in(raw: &str, source: SourceTag) -> Self {
        Self {
            raw: raw.to_string(),
            source,
            is_built_in: true,
        }
    }

    #[must_use]
    pub fn custom(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            source: SourceTag::Custom,
            is_built_in: false,
        }
    }

    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.raw.contains('*')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    /// Allocate an id unique for the lifetime of the process.
    #[must_use]
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub id: RecordId,
    pub version: String,
    pub source_label: String,
    pub install_path: PathBuf,
}

impl VersionRecord {
    #[must_use]
    pub fn new(
        version: impl Into<String>,
        source_label: impl Into<String>,
        install_path: PathBuf,
    ) -> Self {
        Self {
            id: RecordId::next(),
            version: version.into(),
            source_label: source_label.into(),
            install_path,
        }
    }

    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.install_path.join("bin")
    }

    #[must_use]
    pub fn normalized_path(&self) -> PathBuf {
        normalize_install_path(&self.install_path)
    }

    #[must_use]
    pub fn matches_path(&self, path: &Path) -> bool {
        self.normalized_path() == normalize_install_path(path)
    }
}

/// Canonical form used to compare install paths across discovery strategies.
///
/// Existing paths are canonicalized so symlinked Homebrew `opt/` entries and
/// their `Cellar/` targets collapse; otherwise `.`/`..` and trailing
/// separators are removed lexically.
#[must_use]
pub fn normalize_install_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub identifier: String,
    pub display_name: String,
    #[serde(default)]
    pub scan_paths: Vec<ScanPathSpec>,
    #[serde(default)]
    pub env_var_name: Option<String>,
    #[serde(default)]
    pub script_file_name: Option<String>,
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default = "default_display_order")]
    pub display_order: u32,
    #[serde(default)]
    pub is_built_in: bool,
}

fn default_display_order() -> u32 {
    1_000
}

impl LanguageConfig {
    #[must_use]
    pub fn custom(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        env_var_name: Option<String>,
        scan_paths: Vec<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            scan_paths: scan_paths.into_iter().map(ScanPathSpec::custom).collect(),
            env_var_name,
            script_file_name: None,
            executable: None,
            display_order: default_display_order(),
            is_built_in: false,
        }
    }

    #[must_use]
    pub fn script_file_name(&self) -> String {
        self.script_file_name
            .clone()
            .unwrap_or_else(|| format!("{}_env.sh", self.identifier))
    }

    #[must_use]
    pub fn executable_name(&self) -> &str {
        self.executable.as_deref().unwrap_or(&self.identifier)
    }

    #[must_use]
    pub fn env_var(&self) -> Option<&str> {
        self.env_var_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
