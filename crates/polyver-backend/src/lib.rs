mod error;
mod traits;
mod types;
mod version;

pub use error::RegistryError;
pub use traits::{AllowAllAccess, DirectoryAccess, RuntimeScanner, ScanContext};
pub use types::{
    LanguageConfig, RecordId, ScanPathSpec, SourceTag, VersionRecord, normalize_install_path,
};
pub use version::{compare_versions, sort_records};
