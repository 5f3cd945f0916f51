use async_trait::async_trait;

use polyver_backend::{LanguageConfig, RuntimeScanner, ScanContext, VersionRecord};

use crate::extract::VersionHint;
use crate::layout::InstallLayout;
use crate::merge::merge_records;
use crate::walk::walk_in_background;

#[derive(Debug, Clone)]
pub struct PythonScanner {
    layout: InstallLayout,
}

impl Default for PythonScanner {
    fn default() -> Self {
        Self {
            layout: InstallLayout::new(&[""], &["python3", "python"]),
        }
    }
}

impl PythonScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuntimeScanner for PythonScanner {
    fn name(&self) -> &'static str {
        "python"
    }

    async fn scan(&self, language: &LanguageConfig, context: &ScanContext) -> Vec<VersionRecord> {
        let records =
            walk_in_background(language, &self.layout, VersionHint::Generic, context).await;
        merge_records(vec![records])
    }
}
