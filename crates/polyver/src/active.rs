use log::{debug, warn};
use std::path::{Path, PathBuf};

use polyver_backend::{LanguageConfig, VersionRecord};
use polyver_shell::EnvScriptWriter;

use crate::preferences::PreferenceStore;

#[must_use]
pub fn active_version_key(identifier: &str) -> String {
    format!("active_version.{identifier}")
}

/// What persisted state says about a language's active version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveState {
    Active(VersionRecord),
    /// A path was recorded but none of the scanned records live there.
    Unmatched(PathBuf),
    /// Neither the preference nor a script has ever recorded anything.
    Unset,
}

impl ActiveState {
    #[must_use]
    pub fn into_record(self) -> Option<VersionRecord> {
        match self {
            Self::Active(record) => Some(record),
            Self::Unmatched(_) | Self::Unset => None,
        }
    }
}

/// Matches the stored preference, or failing that the generated script, back
/// to a scanned record.
pub struct ActiveVersionResolver<'a> {
    preferences: &'a dyn PreferenceStore,
    writer: &'a EnvScriptWriter,
}

impl<'a> ActiveVersionResolver<'a> {
    #[must_use]
    pub fn new(preferences: &'a dyn PreferenceStore, writer: &'a EnvScriptWriter) -> Self {
        Self {
            preferences,
            writer,
        }
    }

    #[must_use]
    pub fn resolve_active(
        &self,
        records: &[VersionRecord],
        language: &LanguageConfig,
    ) -> Option<VersionRecord> {
        self.resolve_state(records, language).into_record()
    }

    /// A path found only in the script is copied into the preference store
    /// when it matches a record.
    #[must_use]
    pub fn resolve_state(
        &self,
        records: &[VersionRecord],
        language: &LanguageConfig,
    ) -> ActiveState {
        let key = active_version_key(&language.identifier);

        if let Some(stored) = self.preferences.get(&key) {
            let path = PathBuf::from(stored);
            return match find_record(records, &path) {
                Some(record) => ActiveState::Active(record.clone()),
                None => {
                    debug!(
                        "Stored {} version {} is no longer installed",
                        language.identifier,
                        path.display()
                    );
                    ActiveState::Unmatched(path)
                }
            };
        }

        let Some(path) = self.writer.read_active_path(language) else {
            return ActiveState::Unset;
        };

        let Some(record) = find_record(records, &path) else {
            return ActiveState::Unmatched(path);
        };

        let value = record.install_path.to_string_lossy();
        if let Err(error) = self.preferences.set(&key, &value) {
            warn!(
                "Could not migrate {} active version: {error}",
                language.identifier
            );
        }
        ActiveState::Active(record.clone())
    }
}

fn find_record<'r>(records: &'r [VersionRecord], path: &Path) -> Option<&'r VersionRecord> {
    records.iter().find(|record| record.matches_path(path))
}

/// Move `active` to the front, keeping the relative order of the rest.
#[must_use]
pub fn order_with_active_first(
    mut records: Vec<VersionRecord>,
    active: Option<&VersionRecord>,
) -> Vec<VersionRecord> {
    if let Some(active) = active
        && let Some(index) = records
            .iter()
            .position(|record| record.matches_path(&active.install_path))
    {
        let record = records.remove(index);
        records.insert(0, record);
    }
    records
}
