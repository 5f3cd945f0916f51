use log::debug;
use std::path::Path;

use polyver_backend::{LanguageConfig, ScanContext, VersionRecord};

use crate::extract::{VersionHint, extract_install_version, source_label};
use crate::layout::InstallLayout;
use crate::resolve::{list_directory_names, resolve};

/// Directory-walk strategy: every resolved scan path is checked itself, then
/// each visible subdirectory, against `layout`.
///
/// Blocking; callers run it on a blocking thread. Records are returned in
/// discovery order and may contain duplicates across scan paths.
#[must_use]
pub fn walk_scan_paths(
    language: &LanguageConfig,
    layout: &InstallLayout,
    hint: VersionHint,
    context: &ScanContext,
) -> Vec<VersionRecord> {
    let mut records = Vec::new();

    for spec in &language.scan_paths {
        for root in resolve(spec, context) {
            walk_root(&root, language, layout, hint, context, &mut records);
        }
    }

    debug!(
        "Directory walk for {} found {} candidate(s)",
        language.identifier,
        records.len()
    );
    records
}

fn walk_root(
    root: &Path,
    language: &LanguageConfig,
    layout: &InstallLayout,
    hint: VersionHint,
    context: &ScanContext,
    records: &mut Vec<VersionRecord>,
) {
    if !root.is_dir() {
        return;
    }

    if context.can_read(root)
        && let Some(home) = layout.locate_home(root)
    {
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        records.push(make_record(&name, &home, language, hint));
    }

    let Some(mut names) = list_directory_names(root, context) else {
        return;
    };
    names.sort();

    for name in names.iter().filter(|name| !name.starts_with('.')) {
        let candidate = root.join(name);
        if let Some(home) = layout.locate_home(&candidate) {
            records.push(make_record(name, &home, language, hint));
        }
    }
}

fn make_record(
    name: &str,
    home: &Path,
    language: &LanguageConfig,
    hint: VersionHint,
) -> VersionRecord {
    VersionRecord::new(
        extract_install_version(hint, name, home),
        source_label(home, &language.identifier),
        home.to_path_buf(),
    )
}

/// Run [`walk_scan_paths`] on tokio's blocking pool.
pub(crate) async fn walk_in_background(
    language: &LanguageConfig,
    layout: &InstallLayout,
    hint: VersionHint,
    context: &ScanContext,
) -> Vec<VersionRecord> {
    let language = language.clone();
    let layout = layout.clone();
    let context = context.clone();

    match tokio::task::spawn_blocking(move || walk_scan_paths(&language, &layout, hint, &context))
        .await
    {
        Ok(records) => records,
        Err(error) => {
            debug!("Directory walk task failed: {error}");
            Vec::new()
        }
    }
}
