use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use polyver_backend::VersionRecord;

use crate::error::AppError;

/// The published result of one refresh. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub identifier: String,
    /// Active record first, then highest version first.
    pub records: Vec<VersionRecord>,
    pub active: Option<VersionRecord>,
    pub scanned_at: DateTime<Utc>,
}

impl Snapshot {
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        records: Vec<VersionRecord>,
        active: Option<VersionRecord>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            records,
            active,
            scanned_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn is_active(&self, record: &VersionRecord) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.matches_path(&record.install_path))
    }
}

#[derive(Debug, Clone)]
pub enum ServiceEvent {
    SnapshotUpdated {
        identifier: String,
        snapshot: Arc<Snapshot>,
    },
    ActiveChanged {
        identifier: String,
        record: VersionRecord,
        script_path: PathBuf,
    },
    ActivationFailed {
        identifier: String,
        error: AppError,
    },
    LanguageAdded {
        identifier: String,
    },
    LanguageUpdated {
        identifier: String,
    },
    LanguageRemoved {
        identifier: String,
    },
}

impl ServiceEvent {
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::SnapshotUpdated { identifier, .. }
            | Self::ActiveChanged { identifier, .. }
            | Self::ActivationFailed { identifier, .. }
            | Self::LanguageAdded { identifier }
            | Self::LanguageUpdated { identifier }
            | Self::LanguageRemoved { identifier } => identifier,
        }
    }
}
