use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use polyver_backend::{LanguageConfig, RegistryError, RuntimeScanner};
use polyver_scan::{builtin_languages, is_builtin_identifier};

#[derive(Clone)]
pub struct RegisteredLanguage {
    pub config: LanguageConfig,
    pub scanner: Arc<dyn RuntimeScanner>,
}

impl std::fmt::Debug for RegisteredLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredLanguage")
            .field("config", &self.config)
            .field("scanner", &self.scanner.name())
            .finish()
    }
}

/// Identifier → language table shared between the caller's thread and
/// background refreshes. Registration never triggers a scan.
#[derive(Debug, Default)]
pub struct LanguageRegistry {
    entries: RwLock<HashMap<String, RegisteredLanguage>>,
}

/// Identifiers are non-empty and limited to `[a-z0-9_-]`.
///
/// # Errors
/// Returns [`RegistryError::InvalidIdentifier`] otherwise.
pub fn validate_identifier(identifier: &str) -> Result<(), RegistryError> {
    let valid = !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidIdentifier {
            identifier: identifier.to_string(),
        })
    }
}

impl LanguageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with Java, Node.js, Python and Go.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        {
            let mut entries = registry.write();
            for (config, scanner) in builtin_languages() {
                entries.insert(config.identifier.clone(), RegisteredLanguage { config, scanner });
            }
        }
        registry
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, RegisteredLanguage>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, RegisteredLanguage>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a user-defined language.
    ///
    /// # Errors
    /// Fails when the identifier is malformed, belongs to a built-in language
    /// or is already taken.
    pub fn register(
        &self,
        mut config: LanguageConfig,
        scanner: Arc<dyn RuntimeScanner>,
    ) -> Result<(), RegistryError> {
        validate_identifier(&config.identifier)?;
        if is_builtin_identifier(&config.identifier) {
            return Err(RegistryError::ReservedIdentifier {
                identifier: config.identifier,
            });
        }

        let mut entries = self.write();
        if entries.contains_key(&config.identifier) {
            return Err(RegistryError::DuplicateIdentifier {
                identifier: config.identifier,
            });
        }

        config.is_built_in = false;
        log::debug!("Registered language {}", config.identifier);
        entries.insert(config.identifier.clone(), RegisteredLanguage { config, scanner });
        Ok(())
    }

    /// # Errors
    /// Built-in languages cannot be removed; unknown identifiers are
    /// [`RegistryError::NotFound`].
    pub fn unregister(&self, identifier: &str) -> Result<RegisteredLanguage, RegistryError> {
        let mut entries = self.write();
        match entries.get(identifier) {
            None => Err(RegistryError::NotFound {
                identifier: identifier.to_string(),
            }),
            Some(entry) if entry.config.is_built_in => Err(RegistryError::BuiltInRemoval {
                identifier: identifier.to_string(),
            }),
            Some(_) => entries.remove(identifier).ok_or_else(|| RegistryError::NotFound {
                identifier: identifier.to_string(),
            }),
        }
    }

    /// Replace a custom language's configuration, keeping its scanner.
    ///
    /// # Errors
    /// Fails for unknown identifiers and for built-in languages.
    pub fn update_config(&self, mut config: LanguageConfig) -> Result<(), RegistryError> {
        let mut entries = self.write();
        let Some(entry) = entries.get_mut(&config.identifier) else {
            return Err(RegistryError::NotFound {
                identifier: config.identifier,
            });
        };
        if entry.config.is_built_in {
            return Err(RegistryError::BuiltInModification {
                identifier: config.identifier,
            });
        }

        config.is_built_in = false;
        entry.config = config;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<RegisteredLanguage> {
        self.read().get(identifier).cloned()
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.read().contains_key(identifier)
    }

    /// All languages ordered by display order, then display name.
    #[must_use]
    pub fn all(&self) -> Vec<RegisteredLanguage> {
        let mut languages: Vec<RegisteredLanguage> = self.read().values().cloned().collect();
        languages.sort_by(|a, b| {
            a.config
                .display_order
                .cmp(&b.config.display_order)
                .then_with(|| a.config.display_name.cmp(&b.config.display_name))
        });
        languages
    }

    #[must_use]
    pub fn custom_configs(&self) -> Vec<LanguageConfig> {
        self.all()
            .into_iter()
            .filter(|entry| !entry.config.is_built_in)
            .map(|entry| entry.config)
            .collect()
    }
}
