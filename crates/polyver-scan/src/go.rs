use async_trait::async_trait;
use log::debug;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

use polyver_backend::{LanguageConfig, RuntimeScanner, ScanContext, VersionRecord};

use crate::command::run_query;
use crate::extract::{VersionHint, extract_install_version, source_label};
use crate::layout::InstallLayout;
use crate::merge::merge_records;
use crate::walk::walk_in_background;

static GO_VERSION_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"go version go(\d+(?:\.\d+)*\S*)").expect("valid regex"));

/// `1.21.0` from `go version go1.21.0 darwin/arm64`.
fn parse_go_version(output: &str) -> Option<String> {
    GO_VERSION_OUTPUT
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|version| version.as_str().to_string())
}

#[derive(Debug, Clone)]
pub struct GoScanner {
    go_binary: Option<PathBuf>,
    layout: InstallLayout,
}

impl Default for GoScanner {
    fn default() -> Self {
        Self {
            go_binary: None,
            layout: InstallLayout::new(&["", "libexec", "go"], &["go"]),
        }
    }
}

impl GoScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query this binary instead of the `go` found on `PATH`.
    #[must_use]
    pub fn with_go_binary(mut self, binary: PathBuf) -> Self {
        self.go_binary = Some(binary);
        self
    }

    /// The installation the `go` on `PATH` belongs to, if any.
    async fn command_records(&self, context: &ScanContext) -> Vec<VersionRecord> {
        let binary = match &self.go_binary {
            Some(binary) => binary.clone(),
            None => match tokio::task::spawn_blocking(|| which::which("go")).await {
                Ok(Ok(binary)) => binary,
                Ok(Err(_)) | Err(_) => {
                    debug!("go not found on PATH");
                    return Vec::new();
                }
            },
        };

        let Some(goroot) = run_query(&binary, &["env", "GOROOT"], context.command_timeout)
            .await
            .map(|output| PathBuf::from(output.trim()))
            .filter(|goroot| !goroot.as_os_str().is_empty())
        else {
            return Vec::new();
        };

        let reported = match run_query(&binary, &["version"], context.command_timeout).await {
            Some(output) => parse_go_version(&output),
            None => None,
        };

        let layout = self.layout.clone();
        tokio::task::spawn_blocking(move || goroot_record(&layout, goroot, reported))
            .await
            .ok()
            .flatten()
            .into_iter()
            .collect()
    }
}

/// Record for the GOROOT reported by `go env`. Falls back to the `VERSION`
/// file and directory name when `go version` gave nothing usable.
fn goroot_record(
    layout: &InstallLayout,
    goroot: PathBuf,
    reported: Option<String>,
) -> Option<VersionRecord> {
    if !layout.has_executable(&goroot) {
        debug!("GOROOT {} has no bin/go, ignoring", goroot.display());
        return None;
    }

    let version = reported.unwrap_or_else(|| {
        let name = goroot
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        extract_install_version(VersionHint::Go, &name, &goroot)
    });

    let label = match source_label(&goroot, "go").as_str() {
        "Local" => "System".to_string(),
        other => other.to_string(),
    };

    Some(VersionRecord::new(version, label, goroot))
}

#[async_trait]
impl RuntimeScanner for GoScanner {
    fn name(&self) -> &'static str {
        "go"
    }

    async fn scan(&self, language: &LanguageConfig, context: &ScanContext) -> Vec<VersionRecord> {
        let from_command = self.command_records(context).await;
        let from_walk = walk_in_background(language, &self.layout, VersionHint::Go, context).await;
        merge_records(vec![from_command, from_walk])
    }
}
