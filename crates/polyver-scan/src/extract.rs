use regex::Regex;
use std::path::{Component, Path};
use std::sync::LazyLock;

static DOTTED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+(?:\.\d+)?$").expect("valid regex"));
static NAMED_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]+(?:[-_][A-Za-z]+)*[-_@](\d+(?:\.\d+)*)").expect("valid regex")
});
static V_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+(?:\.\d+)*)").expect("valid regex"));
static FUSED_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+(\d+(?:\.\d+)*)").expect("valid regex"));
static ANY_DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+(?:\.\d+)*)").expect("valid regex"));
static JAVA_VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*JAVA_VERSION\s*=\s*"?([^"\r\n]+?)"?\s*$"#).expect("valid regex")
});

/// Which metadata file, if any, outranks the directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionHint {
    Generic,
    Java,
    Go,
}

/// Derive a version string from an install directory name.
///
/// Never fails: a name that matches no rule is returned verbatim.
#[must_use]
pub fn extract_version(directory_name: &str) -> String {
    let name = directory_name.trim();

    if DOTTED_NAME.is_match(name) {
        return name.to_string();
    }

    for pattern in [&*NAMED_VERSION, &*V_PREFIXED, &*FUSED_VERSION, &*ANY_DOTTED] {
        if let Some(captures) = pattern.captures(name)
            && let Some(version) = captures.get(1)
        {
            return version.as_str().to_string();
        }
    }

    name.to_string()
}

/// `JAVA_VERSION` from a JDK's `release` file.
#[must_use]
pub fn java_release_version(java_home: &Path) -> Option<String> {
    let content = std::fs::read_to_string(java_home.join("release")).ok()?;
    let captures = JAVA_VERSION_LINE.captures(&content)?;
    let version = captures.get(1)?.as_str().trim();
    (!version.is_empty()).then(|| version.to_string())
}

/// Version from the `VERSION` file shipped at the root of Go distributions
/// (`go1.21.0`, optionally followed by build metadata lines).
#[must_use]
pub fn go_version_file(goroot: &Path) -> Option<String> {
    let content = std::fs::read_to_string(goroot.join("VERSION")).ok()?;
    let first = content.lines().next()?.trim();
    let version = first.strip_prefix("go").unwrap_or(first);
    version
        .starts_with(|c: char| c.is_ascii_digit())
        .then(|| version.to_string())
}

#[must_use]
pub fn extract_install_version(hint: VersionHint, directory_name: &str, home: &Path) -> String {
    let from_metadata = match hint {
        VersionHint::Generic => None,
        VersionHint::Java => java_release_version(home),
        VersionHint::Go => go_version_file(home),
    };

    from_metadata.unwrap_or_else(|| extract_version(directory_name))
}

const VERSION_MANAGER_MARKERS: &[(&str, &str)] = &[
    ("/.pyenv/", "pyenv"),
    ("/.nvm/", "NVM"),
    ("/fnm/", "fnm"),
    ("/.fnm/", "fnm"),
    ("/.gvm/", "GVM"),
    ("/.asdf/", "asdf"),
    ("/.rbenv/", "rbenv"),
    ("/.rvm/", "RVM"),
    ("/.rustup/", "rustup"),
    ("/.sdkman/", "SDKMAN"),
    ("/mise/", "mise"),
];

const SYSTEM_MARKERS: &[&str] = &["/usr/", "/library/", "/system/", "/opt/"];

/// Human-readable provenance for an install path.
///
/// Package managers win over version managers, which win over system
/// locations; anything else is "Local". `language` only changes how system
/// JDKs are labelled.
#[must_use]
pub fn source_label(path: &Path, language: &str) -> String {
    let mut haystack = path.to_string_lossy().replace('\\', "/").to_lowercase();
    haystack.push('/');

    if ["homebrew", "linuxbrew", "/cellar/"]
        .iter()
        .any(|marker| haystack.contains(marker))
    {
        return match formula_qualifier(path) {
            Some(formula) => format!("Homebrew ({formula})"),
            None => "Homebrew".to_string(),
        };
    }

    if let Some((_, label)) = VERSION_MANAGER_MARKERS
        .iter()
        .find(|(marker, _)| haystack.contains(marker))
    {
        return (*label).to_string();
    }

    let is_java = language == "java";
    if is_java && (haystack.contains("/javavirtualmachines/") || haystack.contains("/usr/lib/jvm/"))
    {
        return "System JDK".to_string();
    }

    if SYSTEM_MARKERS.iter().any(|marker| haystack.starts_with(marker)) {
        return if is_java { "System JDK" } else { "System" }.to_string();
    }

    "Local".to_string()
}

/// `node@20` from `.../Cellar/node@20/20.11.0` or `.../opt/node@20`.
fn formula_qualifier(path: &Path) -> Option<String> {
    let names: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    names.windows(2).find_map(|pair| {
        let parent = pair[0].to_lowercase();
        let is_formula_parent = parent == "cellar" || parent == "opt";
        (is_formula_parent && pair[1].contains('@') && !pair[1].starts_with('@'))
            .then(|| pair[1].clone())
    })
}
