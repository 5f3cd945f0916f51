use std::sync::Arc;

use polyver_backend::{LanguageConfig, RuntimeScanner, ScanPathSpec, SourceTag};

use crate::go::GoScanner;
use crate::java::JavaScanner;
use crate::node::NodeScanner;
use crate::python::PythonScanner;

/// Identifiers that custom languages may not claim.
pub const BUILTIN_IDENTIFIERS: [&str; 4] = ["java", "node", "python", "go"];

#[must_use]
pub fn is_builtin_identifier(identifier: &str) -> bool {
    BUILTIN_IDENTIFIERS.contains(&identifier)
}

fn built_in(
    identifier: &str,
    display_name: &str,
    env_var_name: Option<&str>,
    display_order: u32,
    scan_paths: &[(&str, SourceTag)],
) -> LanguageConfig {
    LanguageConfig {
        identifier: identifier.to_string(),
        display_name: display_name.to_string(),
        scan_paths: scan_paths
            .iter()
            .map(|(raw, source)| ScanPathSpec::built_in(raw, *source))
            .collect(),
        env_var_name: env_var_name.map(str::to_string),
        script_file_name: None,
        executable: None,
        display_order,
        is_built_in: true,
    }
}

#[must_use]
pub fn java_language() -> LanguageConfig {
    built_in(
        "java",
        "Java",
        Some("JAVA_HOME"),
        0,
        &[
            ("/Library/Java/JavaVirtualMachines", SourceTag::JavaHome),
            ("/opt/homebrew/opt/openjdk*", SourceTag::Homebrew),
            ("/usr/local/opt/openjdk*", SourceTag::Homebrew),
            ("/opt/homebrew/Cellar/openjdk*", SourceTag::Homebrew),
            ("/usr/local/Cellar/openjdk*", SourceTag::Homebrew),
            ("~/.sdkman/candidates/java", SourceTag::Custom),
            ("~/.asdf/installs/java", SourceTag::Asdf),
            ("/usr/lib/jvm", SourceTag::System),
        ],
    )
}

#[must_use]
pub fn node_language() -> LanguageConfig {
    built_in(
        "node",
        "Node.js",
        None,
        1,
        &[
            ("~/.nvm/versions/node", SourceTag::Nvm),
            ("/opt/homebrew/Cellar/node*", SourceTag::Homebrew),
            ("/usr/local/Cellar/node*", SourceTag::Homebrew),
            ("~/.local/share/fnm/node-versions", SourceTag::Custom),
            ("~/.fnm/node-versions", SourceTag::Custom),
            ("~/.asdf/installs/nodejs", SourceTag::Asdf),
        ],
    )
}

#[must_use]
pub fn python_language() -> LanguageConfig {
    built_in(
        "python",
        "Python",
        None,
        2,
        &[
            ("~/.pyenv/versions", SourceTag::Pyenv),
            ("/opt/homebrew/Cellar/python*", SourceTag::Homebrew),
            ("/usr/local/Cellar/python*", SourceTag::Homebrew),
            ("/Library/Frameworks/Python.framework/Versions", SourceTag::System),
            ("~/.asdf/installs/python", SourceTag::Asdf),
        ],
    )
}

#[must_use]
pub fn go_language() -> LanguageConfig {
    built_in(
        "go",
        "Go",
        Some("GOROOT"),
        3,
        &[
            ("/usr/local/go", SourceTag::System),
            ("/opt/homebrew/Cellar/go*", SourceTag::Homebrew),
            ("/usr/local/Cellar/go*", SourceTag::Homebrew),
            ("~/.gvm/gos", SourceTag::Gvm),
            ("~/sdk", SourceTag::Custom),
            ("~/.asdf/installs/golang", SourceTag::Asdf),
        ],
    )
}

/// The four built-in languages paired with their scanners, in display order.
#[must_use]
pub fn builtin_languages() -> Vec<(LanguageConfig, Arc<dyn RuntimeScanner>)> {
    vec![
        (java_language(), Arc::new(JavaScanner::new())),
        (node_language(), Arc::new(NodeScanner::new())),
        (python_language(), Arc::new(PythonScanner::new())),
        (go_language(), Arc::new(GoScanner::new())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_ordered_and_flagged() {
        let languages = builtin_languages();
        let identifiers: Vec<&str> = languages
            .iter()
            .map(|(config, _)| config.identifier.as_str())
            .collect();

        assert_eq!(identifiers, BUILTIN_IDENTIFIERS);
        assert!(languages.iter().all(|(config, _)| config.is_built_in));
        assert!(
            languages
                .windows(2)
                .all(|pair| pair[0].0.display_order < pair[1].0.display_order)
        );
    }

    #[test]
    fn scanner_names_match_identifiers() {
        for (config, scanner) in builtin_languages() {
            assert_eq!(scanner.name(), config.identifier);
        }
    }

    #[test]
    fn home_variables() {
        assert_eq!(java_language().env_var(), Some("JAVA_HOME"));
        assert_eq!(go_language().env_var(), Some("GOROOT"));
        assert_eq!(node_language().env_var(), None);
        assert_eq!(python_language().env_var(), None);
        assert_eq!(node_language().script_file_name(), "node_env.sh");
    }

    #[test]
    fn built_in_scan_paths_are_tagged() {
        let java = java_language();
        assert!(java.scan_paths.iter().all(|spec| spec.is_built_in));
        assert!(
            java.scan_paths
                .iter()
                .any(|spec| spec.raw == "/usr/lib/jvm" && spec.source == SourceTag::System)
        );
    }

    #[test]
    fn reserved_identifiers() {
        assert!(is_builtin_identifier("python"));
        assert!(!is_builtin_identifier("ruby"));
    }
}
