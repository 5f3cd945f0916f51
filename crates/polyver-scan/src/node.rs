use async_trait::async_trait;

use polyver_backend::{LanguageConfig, RuntimeScanner, ScanContext, VersionRecord};

use crate::extract::VersionHint;
use crate::layout::InstallLayout;
use crate::merge::merge_records;
use crate::walk::walk_in_background;

/// Node.js installs from nvm, fnm, asdf and Homebrew. fnm nests each version
/// under `installation/`.
#[derive(Debug, Clone)]
pub struct NodeScanner {
    layout: InstallLayout,
}

impl Default for NodeScanner {
    fn default() -> Self {
        Self {
            layout: InstallLayout::new(&["", "installation"], &["node"]),
        }
    }
}

impl NodeScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuntimeScanner for NodeScanner {
    fn name(&self) -> &'static str {
        "node"
    }

    async fn scan(&self, language: &LanguageConfig, context: &ScanContext) -> Vec<VersionRecord> {
        let records =
            walk_in_background(language, &self.layout, VersionHint::Generic, context).await;
        merge_records(vec![records])
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use polyver_backend::{LanguageConfig, RuntimeScanner, ScanContext, ScanPathSpec, SourceTag};

    use super::NodeScanner;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().expect("path has parent")).expect("create parent");
        std::fs::write(path, "").expect("write marker");
    }

    fn exe(name: &str) -> String {
        format!("{name}{}", std::env::consts::EXE_SUFFIX)
    }

    #[tokio::test]
    async fn fnm_installation_dir_is_the_install_path() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let installation = temp_dir
            .path()
            .join(".local/share/fnm/node-versions/v22.1.0/installation");
        touch(&installation.join("bin").join(exe("node")));

        let mut language = LanguageConfig::custom("node", "Node.js", None, Vec::new());
        language.scan_paths = vec![ScanPathSpec::built_in(
            "~/.local/share/fnm/node-versions",
            SourceTag::Custom,
        )];

        let context = ScanContext::default().with_home(Some(temp_dir.path().to_path_buf()));
        let records = NodeScanner::new().scan(&language, &context).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].version, "22.1.0");
        assert_eq!(records[0].source_label, "fnm");
        assert_eq!(records[0].install_path, installation);
    }
}
