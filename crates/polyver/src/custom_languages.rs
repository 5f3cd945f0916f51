use log::warn;

use polyver_backend::LanguageConfig;

use crate::preferences::{PreferenceError, PreferenceStore};

pub const CUSTOM_LANGUAGES_KEY: &str = "custom_languages";

/// User-defined languages stored as a JSON array. A malformed value is logged
/// and treated as no languages.
pub fn load_custom_languages(store: &dyn PreferenceStore) -> Vec<LanguageConfig> {
    let Some(raw) = store.get(CUSTOM_LANGUAGES_KEY) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<LanguageConfig>>(&raw) {
        Ok(mut configs) => {
            for config in &mut configs {
                config.is_built_in = false;
            }
            configs
        }
        Err(error) => {
            warn!("Ignoring malformed {CUSTOM_LANGUAGES_KEY} preference: {error}");
            Vec::new()
        }
    }
}

/// # Errors
/// Returns [`PreferenceError`] when the store rejects the write.
pub fn save_custom_languages(
    store: &dyn PreferenceStore,
    configs: &[LanguageConfig],
) -> Result<(), PreferenceError> {
    let encoded = serde_json::to_string(configs).map_err(|error| PreferenceError::Encode {
        message: error.to_string(),
    })?;
    store.set(CUSTOM_LANGUAGES_KEY, &encoded)
}
