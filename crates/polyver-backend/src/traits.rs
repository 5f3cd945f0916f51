use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::types::{LanguageConfig, VersionRecord};

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Gate consulted before every directory listing. Sandboxed hosts deny paths
/// the user has not granted; a denial is treated exactly like "not found".
pub trait DirectoryAccess: Send + Sync {
    fn can_read(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllAccess;

impl DirectoryAccess for AllowAllAccess {
    fn can_read(&self, _path: &Path) -> bool {
        true
    }
}

#[derive(Clone)]
pub struct ScanContext {
    pub home: Option<PathBuf>,
    pub access: Arc<dyn DirectoryAccess>,
    pub command_timeout: Duration,
}

impl Default for ScanContext {
    fn default() -> Self {
        Self {
            home: dirs::home_dir(),
            access: Arc::new(AllowAllAccess),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl ScanContext {
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: Arc<dyn DirectoryAccess>) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    #[must_use]
    pub fn can_read(&self, path: &Path) -> bool {
        self.access.can_read(path)
    }
}

impl std::fmt::Debug for ScanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanContext")
            .field("home", &self.home)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

/// Discovers the installations of one language.
///
/// Implementations never fail: unreadable paths, broken metadata and failing
/// commands only shrink the result. The returned list is de-duplicated by
/// install path and sorted highest version first.
#[async_trait]
pub trait RuntimeScanner: Send + Sync {
    fn name(&self) -> &'static str;

    async fn scan(&self, language: &LanguageConfig, context: &ScanContext) -> Vec<VersionRecord>;
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct DenyAll;

    impl DirectoryAccess for DenyAll {
        fn can_read(&self, _path: &Path) -> bool {
            false
        }
    }

    struct FixedScanner(Vec<VersionRecord>);

    #[async_trait]
    impl RuntimeScanner for FixedScanner {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn scan(
            &self,
            _language: &LanguageConfig,
            _context: &ScanContext,
        ) -> Vec<VersionRecord> {
            self.0.clone()
        }
    }

    #[test]
    fn default_context_allows_everything() {
        let context = ScanContext::default();
        assert!(context.can_read(Path::new("/anywhere")));
        assert_eq!(context.command_timeout, Duration::from_secs(5));
    }

    #[test]
    fn builder_methods_override_fields() {
        let context = ScanContext::default()
            .with_home(Some(PathBuf::from("/home/dev")))
            .with_access(Arc::new(DenyAll))
            .with_command_timeout(Duration::from_millis(250));

        assert_eq!(context.home, Some(PathBuf::from("/home/dev")));
        assert!(!context.can_read(Path::new("/home/dev")));
        assert_eq!(context.command_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn boxed_scanner_is_usable_through_trait_object() {
        let record = VersionRecord::new("1.2.3", "Local", PathBuf::from("/opt/tool"));
        let scanner: Arc<dyn RuntimeScanner> = Arc::new(FixedScanner(vec![record.clone()]));
        let language = LanguageConfig::custom("tool", "Tool", None, Vec::new());

        let records = scanner.scan(&language, &ScanContext::default()).await;

        assert_eq!(scanner.name(), "fixed");
        assert_eq!(records, vec![record]);
    }
}
