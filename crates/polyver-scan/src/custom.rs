use async_trait::async_trait;

use polyver_backend::{LanguageConfig, RuntimeScanner, ScanContext, VersionRecord};

use crate::extract::VersionHint;
use crate::layout::InstallLayout;
use crate::merge::merge_records;
use crate::walk::walk_in_background;

/// Scanner for user-defined languages. Everything it needs comes from the
/// [`LanguageConfig`]: scan paths, and the executable expected under `bin/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomScanner;

#[async_trait]
impl RuntimeScanner for CustomScanner {
    fn name(&self) -> &'static str {
        "custom"
    }

    async fn scan(&self, language: &LanguageConfig, context: &ScanContext) -> Vec<VersionRecord> {
        let layout = InstallLayout::flat(language.executable_name());
        let records = walk_in_background(language, &layout, VersionHint::Generic, context).await;
        merge_records(vec![records])
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use polyver_backend::{LanguageConfig, RuntimeScanner, ScanContext};

    use super::CustomScanner;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().expect("path has parent")).expect("create parent");
        std::fs::write(path, "").expect("write marker");
    }

    fn exe(name: &str) -> String {
        format!("{name}{}", std::env::consts::EXE_SUFFIX)
    }

    #[tokio::test]
    async fn uses_configured_executable_and_paths() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        touch(&temp_dir.path().join("rubies/ruby-3.2.0/bin").join(exe("ruby")));
        touch(&temp_dir.path().join("rubies/ruby-3.3.0/bin").join(exe("ruby")));
        touch(&temp_dir.path().join("rubies/jruby-9.4/bin").join(exe("jruby")));

        let language = LanguageConfig::custom(
            "ruby",
            "Ruby",
            Some("RUBY_ROOT".to_string()),
            vec!["~/rubies".to_string()],
        );
        let context = ScanContext::default().with_home(Some(temp_dir.path().to_path_buf()));
        let records = CustomScanner.scan(&language, &context).await;

        let versions: Vec<&str> = records.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["3.3.0", "3.2.0"]);
        assert!(records.iter().all(|r| r.source_label == "Local"));
    }

    #[tokio::test]
    async fn explicit_executable_overrides_identifier() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        touch(&temp_dir.path().join("dotnet/8.0.100/bin").join(exe("dotnet")));

        let mut language =
            LanguageConfig::custom("csharp", "C#", None, vec!["~/dotnet".to_string()]);
        language.executable = Some("dotnet".to_string());

        let context = ScanContext::default().with_home(Some(temp_dir.path().to_path_buf()));
        let records = CustomScanner.scan(&language, &context).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].version, "8.0.100");
    }
}
