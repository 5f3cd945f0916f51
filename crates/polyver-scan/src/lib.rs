//! Discovery of installed language runtimes.
//!
//! Scanners combine up to three strategies: a metadata command (`java_home`),
//! a runtime query (`go env`), and a walk over configured scan paths. Results
//! are merged by install path, first strategy wins.

mod command;
mod custom;
mod extract;
mod go;
mod java;
mod languages;
mod layout;
mod merge;
mod node;
mod python;
mod resolve;
mod walk;

pub use custom::CustomScanner;
pub use extract::{
    VersionHint, extract_install_version, extract_version, go_version_file, java_release_version,
    source_label,
};
pub use go::GoScanner;
pub use java::{JavaScanner, JvmEntry, parse_java_home_plist};
pub use languages::{
    BUILTIN_IDENTIFIERS, builtin_languages, go_language, is_builtin_identifier, java_language,
    node_language, python_language,
};
pub use layout::InstallLayout;
pub use merge::merge_records;
pub use node::NodeScanner;
pub use python::PythonScanner;
pub use resolve::resolve;
pub use walk::walk_scan_paths;
