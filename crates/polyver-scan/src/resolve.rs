use log::debug;
use std::path::{Component, Path, PathBuf};

use polyver_backend::{ScanContext, ScanPathSpec, SourceTag};
use polyver_platform::expand_home;

/// One wildcard path component: `node*`, `*.jdk`, `go1.2*`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SegmentPattern {
    prefix: String,
    suffix: String,
}

impl SegmentPattern {
    fn parse(segment: &str) -> Self {
        let (prefix, rest) = segment.split_once('*').unwrap_or((segment, ""));
        let suffix = rest.rsplit('*').next().unwrap_or("");
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    fn matches(&self, name: &str, formula_root: bool) -> bool {
        if name.starts_with('.') {
            return false;
        }

        if formula_root && !self.prefix.is_empty() {
            return name == self.prefix || name.starts_with(&format!("{}@", self.prefix));
        }

        name.len() >= self.prefix.len() + self.suffix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.suffix)
    }
}

/// Expand a scan path into concrete directories.
///
/// Paths without a wildcard come back as-is, existing or not. A wildcard
/// component is matched against the children of its parent; under a Homebrew
/// `Cellar/` (or `opt/`) root only the formula itself and its `@`-versioned
/// variants match, so `node*` keeps `node@18` but not `nodenv`.
#[must_use]
pub fn resolve(spec: &ScanPathSpec, context: &ScanContext) -> Vec<PathBuf> {
    let expanded = expand_home(spec.raw.trim(), context.home.as_deref());
    resolve_path(&expanded, spec.source, context)
}

fn resolve_path(path: &Path, source: SourceTag, context: &ScanContext) -> Vec<PathBuf> {
    let components: Vec<Component<'_>> = path.components().collect();
    let Some(glob_index) = components
        .iter()
        .position(|component| component.as_os_str().to_string_lossy().contains('*'))
    else {
        return vec![path.to_path_buf()];
    };

    let parent: PathBuf = if glob_index == 0 {
        PathBuf::from(".")
    } else {
        components[..glob_index].iter().collect()
    };
    let segment = components[glob_index].as_os_str().to_string_lossy();
    let pattern = SegmentPattern::parse(&segment);
    let remainder: PathBuf = components[glob_index + 1..].iter().collect();
    let formula_root = is_formula_root(&parent, source);

    let Some(names) = list_directory_names(&parent, context) else {
        return Vec::new();
    };

    let mut matches: Vec<PathBuf> = names
        .into_iter()
        .filter(|name| pattern.matches(name, formula_root))
        .map(|name| parent.join(name))
        .collect();
    matches.sort();

    if remainder.as_os_str().is_empty() {
        return matches;
    }

    matches
        .into_iter()
        .flat_map(|matched| resolve_path(&matched.join(&remainder), source, context))
        .collect()
}

fn is_formula_root(parent: &Path, source: SourceTag) -> bool {
    match parent.file_name().and_then(|name| name.to_str()) {
        Some("Cellar") => true,
        Some("opt") => source == SourceTag::Homebrew,
        _ => false,
    }
}

/// Names of the immediate subdirectories of `dir`, or `None` when it cannot
/// be listed.
pub(crate) fn list_directory_names(dir: &Path, context: &ScanContext) -> Option<Vec<String>> {
    if !context.can_read(dir) {
        debug!("Access to {} denied, skipping", dir.display());
        return None;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            debug!("Cannot list {}: {error}", dir.display());
            return None;
        }
    };

    Some(
        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use polyver_backend::{DirectoryAccess, ScanContext, ScanPathSpec, SourceTag};

    use super::{SegmentPattern, resolve};

    fn make_dirs(root: &Path, names: &[&str]) {
        for name in names {
            std::fs::create_dir_all(root.join(name)).expect("create test dir");
        }
    }

    fn context(home: &Path) -> ScanContext {
        ScanContext::default().with_home(Some(home.to_path_buf()))
    }

    #[test]
    fn literal_path_is_returned_without_existence_check() {
        let spec = ScanPathSpec::built_in("/nonexistent-polyver/go", SourceTag::System);
        let resolved = resolve(&spec, &context(Path::new("/home/dev")));
        assert_eq!(resolved, vec![PathBuf::from("/nonexistent-polyver/go")]);
    }

    #[test]
    fn tilde_is_expanded_against_context_home() {
        let spec = ScanPathSpec::built_in("~/.nvm/versions/node", SourceTag::Nvm);
        let resolved = resolve(&spec, &context(Path::new("/home/dev")));
        assert_eq!(resolved, vec![PathBuf::from("/home/dev/.nvm/versions/node")]);
    }

    #[test]
    fn cellar_wildcard_keeps_formula_and_versioned_variants() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cellar = temp_dir.path().join("Cellar");
        make_dirs(&cellar, &["node", "node@18", "nodenv", "python"]);

        let raw = format!("{}/node*", cellar.display());
        let spec = ScanPathSpec::built_in(&raw, SourceTag::Homebrew);
        let resolved = resolve(&spec, &context(temp_dir.path()));

        assert_eq!(resolved, vec![cellar.join("node"), cellar.join("node@18")]);
    }

    #[test]
    fn cellar_rule_applies_even_for_custom_specs() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cellar = temp_dir.path().join("Cellar");
        make_dirs(&cellar, &["go", "go@1.21", "gopls"]);

        let spec = ScanPathSpec::custom(format!("{}/go*", cellar.display()));
        let resolved = resolve(&spec, &context(temp_dir.path()));

        assert_eq!(resolved, vec![cellar.join("go"), cellar.join("go@1.21")]);
    }

    #[test]
    fn generic_wildcard_uses_prefix_matching() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let sdk = temp_dir.path().join("sdk");
        make_dirs(&sdk, &["go1.21.0", "go1.22.1", "gotip-old", "rust", ".go-hidden"]);

        let spec = ScanPathSpec::custom(format!("{}/go1*", sdk.display()));
        let resolved = resolve(&spec, &context(temp_dir.path()));

        assert_eq!(resolved, vec![sdk.join("go1.21.0"), sdk.join("go1.22.1")]);
    }

    #[test]
    fn wildcard_with_suffix_requires_both_ends() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let jvms = temp_dir.path().join("JavaVirtualMachines");
        make_dirs(&jvms, &["temurin-17.jdk", "temurin-21.jdk", "temurin-notes"]);

        let spec = ScanPathSpec::custom(format!("{}/temurin-*.jdk", jvms.display()));
        let resolved = resolve(&spec, &context(temp_dir.path()));

        assert_eq!(
            resolved,
            vec![jvms.join("temurin-17.jdk"), jvms.join("temurin-21.jdk")]
        );
    }

    #[test]
    fn trailing_components_are_joined_and_resolved_recursively() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cellar = temp_dir.path().join("Cellar");
        make_dirs(
            &cellar,
            &[
                "openjdk/21.0.1/libexec",
                "openjdk@17/17.0.9/libexec",
                "openjdk@17/17.0.8/libexec",
            ],
        );

        let raw = format!("{}/openjdk*/17*/libexec", cellar.display());
        let spec = ScanPathSpec::built_in(&raw, SourceTag::Homebrew);
        let resolved = resolve(&spec, &context(temp_dir.path()));

        assert_eq!(
            resolved,
            vec![
                cellar.join("openjdk@17/17.0.8/libexec"),
                cellar.join("openjdk@17/17.0.9/libexec"),
            ]
        );
    }

    #[test]
    fn missing_parent_yields_no_matches() {
        let spec = ScanPathSpec::built_in("/nonexistent-polyver/Cellar/node*", SourceTag::Homebrew);
        assert!(resolve(&spec, &context(Path::new("/home/dev"))).is_empty());
    }

    #[test]
    fn denied_parent_yields_no_matches() {
        struct DenyAll;
        impl DirectoryAccess for DenyAll {
            fn can_read(&self, _path: &Path) -> bool {
                false
            }
        }

        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cellar = temp_dir.path().join("Cellar");
        make_dirs(&cellar, &["node"]);

        let spec = ScanPathSpec::built_in(
            &format!("{}/node*", cellar.display()),
            SourceTag::Homebrew,
        );
        let context = context(temp_dir.path()).with_access(Arc::new(DenyAll));

        assert!(resolve(&spec, &context).is_empty());
    }

    #[test]
    fn segment_pattern_parses_prefix_and_suffix() {
        let pattern = SegmentPattern::parse("temurin-*.jdk");
        assert_eq!(pattern.prefix, "temurin-");
        assert_eq!(pattern.suffix, ".jdk");
        assert!(!pattern.matches("temurin-", false));
        assert!(pattern.matches("temurin-8.jdk", false));
    }
}
