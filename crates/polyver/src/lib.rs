//! Discovers installed language runtimes, tracks which version of each is
//! active, and writes the shell scripts that put it on `PATH`.

pub mod active;
pub mod custom_languages;
pub mod error;
pub mod events;
pub mod logging;
pub mod preferences;
pub mod registry;
pub mod service;
pub mod settings;

pub use active::{
    ActiveState, ActiveVersionResolver, active_version_key, order_with_active_first,
};
pub use error::{AppError, AppErrorDetail};
pub use events::{ServiceEvent, Snapshot};
pub use preferences::{
    JsonPreferenceStore, MemoryPreferenceStore, PreferenceError, PreferenceStore,
};
pub use registry::{LanguageRegistry, RegisteredLanguage, validate_identifier};
pub use service::RuntimeService;
pub use settings::{AppSettings, AutoActivate};

pub use polyver_backend::{
    DirectoryAccess, LanguageConfig, RuntimeScanner, ScanContext, ScanPathSpec, SourceTag,
    VersionRecord,
};
pub use polyver_platform::AppPaths;
