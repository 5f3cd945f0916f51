use async_trait::async_trait;
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use polyver_backend::{LanguageConfig, RuntimeScanner, ScanContext, VersionRecord};

use crate::command::run_query;
use crate::extract::{VersionHint, extract_install_version, source_label};
use crate::layout::InstallLayout;
use crate::merge::merge_records;
use crate::walk::walk_in_background;

const JAVA_HOME_TOOL: &str = "/usr/libexec/java_home";

static PLIST_DICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<dict>(.*?)</dict>").expect("valid regex"));
static PLIST_STRING_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<key>([^<]*)</key>\s*<string>([^<]*)</string>").expect("valid regex")
});

/// One JVM reported by `java_home -X`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvmEntry {
    pub home: PathBuf,
    pub name: String,
    pub version: String,
}

/// Parse the XML property list printed by `java_home -X`: an array of dicts
/// carrying `JVMHomePath`, `JVMName` and `JVMVersion`. Dicts without a home
/// path are skipped.
#[must_use]
pub fn parse_java_home_plist(xml: &str) -> Vec<JvmEntry> {
    PLIST_DICT
        .captures_iter(xml)
        .filter_map(|dict| {
            let body = dict.get(1)?.as_str();
            let fields: HashMap<&str, String> = PLIST_STRING_ENTRY
                .captures_iter(body)
                .filter_map(|entry| {
                    Some((entry.get(1)?.as_str().trim(), unescape_xml(entry.get(2)?.as_str())))
                })
                .collect();

            let home = fields.get("JVMHomePath").filter(|home| !home.is_empty())?;
            Some(JvmEntry {
                home: PathBuf::from(home),
                name: fields.get("JVMName").cloned().unwrap_or_default(),
                version: fields.get("JVMVersion").cloned().unwrap_or_default(),
            })
        })
        .collect()
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[derive(Debug, Clone)]
pub struct JavaScanner {
    java_home_tool: PathBuf,
    layout: InstallLayout,
}

impl Default for JavaScanner {
    fn default() -> Self {
        Self {
            java_home_tool: PathBuf::from(JAVA_HOME_TOOL),
            layout: InstallLayout::new(
                &["Contents/Home", "libexec/openjdk.jdk/Contents/Home", ""],
                &["java"],
            ),
        }
    }
}

impl JavaScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different JDK enumeration tool (must accept `-X` and print a
    /// property list).
    #[must_use]
    pub fn with_java_home_tool(mut self, tool: PathBuf) -> Self {
        self.java_home_tool = tool;
        self
    }

    async fn metadata_records(&self, context: &ScanContext) -> Vec<VersionRecord> {
        let is_tool = tokio::fs::metadata(&self.java_home_tool)
            .await
            .is_ok_and(|metadata| metadata.is_file());
        if !is_tool {
            return Vec::new();
        }

        let Some(xml) = run_query(&self.java_home_tool, &["-X"], context.command_timeout).await
        else {
            return Vec::new();
        };

        let layout = self.layout.clone();
        tokio::task::spawn_blocking(move || {
            parse_java_home_plist(&xml)
                .into_iter()
                .filter_map(|entry| record_from_entry(entry, &layout))
                .collect::<Vec<_>>()
        })
        .await
        .unwrap_or_default()
    }
}

fn record_from_entry(entry: JvmEntry, layout: &InstallLayout) -> Option<VersionRecord> {
    if !layout.has_executable(&entry.home) {
        debug!(
            "java_home reported {} ({}) without bin/java, skipping",
            entry.home.display(),
            entry.name
        );
        return None;
    }

    let version = if entry.version.trim().is_empty() {
        extract_install_version(VersionHint::Java, &bundle_name(&entry.home), &entry.home)
    } else {
        entry.version.trim().to_string()
    };

    Some(VersionRecord::new(
        version,
        source_label(&entry.home, "java"),
        entry.home,
    ))
}

/// `temurin-17.jdk` for `.../temurin-17.jdk/Contents/Home`.
fn bundle_name(home: &Path) -> String {
    home.ancestors()
        .find_map(|ancestor| {
            let name = ancestor.file_name()?.to_string_lossy();
            (name != "Home" && name != "Contents").then(|| name.into_owned())
        })
        .unwrap_or_default()
}

#[async_trait]
impl RuntimeScanner for JavaScanner {
    fn name(&self) -> &'static str {
        "java"
    }

    async fn scan(&self, language: &LanguageConfig, context: &ScanContext) -> Vec<VersionRecord> {
        let from_metadata = self.metadata_records(context).await;
        let from_walk =
            walk_in_background(language, &self.layout, VersionHint::Java, context).await;
        merge_records(vec![from_metadata, from_walk])
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    const SAMPLE_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<array>
	<dict>
		<key>JVMArch</key>
		<string>arm64</string>
		<key>JVMEnabled</key>
		<true/>
		<key>JVMHomePath</key>
		<string>/Library/Java/JavaVirtualMachines/temurin-21.jdk/Contents/Home</string>
		<key>JVMName</key>
		<string>OpenJDK 21.0.1</string>
		<key>JVMVersion</key>
		<string>21.0.1</string>
	</dict>
	<dict>
		<key>JVMHomePath</key>
		<string>/Library/Java/JavaVirtualMachines/R&amp;D 17.jdk/Contents/Home</string>
		<key>JVMName</key>
		<string>Java SE 17</string>
		<key>JVMVersion</key>
		<string>17.0.9</string>
	</dict>
	<dict>
		<key>JVMName</key>
		<string>Broken</string>
	</dict>
</array>
</plist>
"#;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().expect("path has parent")).expect("create parent");
        std::fs::write(path, "").expect("write marker");
    }

    fn exe(name: &str) -> String {
        format!("{name}{}", std::env::consts::EXE_SUFFIX)
    }

    #[test]
    fn parses_java_home_property_list() {
        let entries = parse_java_home_plist(SAMPLE_PLIST);

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            JvmEntry {
                home: PathBuf::from(
                    "/Library/Java/JavaVirtualMachines/temurin-21.jdk/Contents/Home"
                ),
                name: "OpenJDK 21.0.1".to_string(),
                version: "21.0.1".to_string(),
            }
        );
        assert_eq!(
            entries[1].home,
            PathBuf::from("/Library/Java/JavaVirtualMachines/R&D 17.jdk/Contents/Home")
        );
    }

    #[test]
    fn malformed_plist_yields_nothing() {
        assert!(parse_java_home_plist("Unable to find any JVMs").is_empty());
        assert!(parse_java_home_plist("").is_empty());
    }

    #[test]
    fn bundle_name_skips_contents_home() {
        assert_eq!(
            bundle_name(Path::new("/jvms/temurin-17.jdk/Contents/Home")),
            "temurin-17.jdk"
        );
    }

    #[test]
    fn entry_without_java_binary_is_rejected() {
        let entry = JvmEntry {
            home: PathBuf::from("/nonexistent-polyver/jdk/Contents/Home"),
            name: "ghost".to_string(),
            version: "17".to_string(),
        };

        assert!(record_from_entry(entry, &JavaScanner::default().layout).is_none());
    }

    #[tokio::test]
    async fn walk_finds_nested_bundle_homes_and_reads_release() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let jvms = temp_dir.path().join("JavaVirtualMachines");
        let home = jvms.join("temurin-17.jdk/Contents/Home");
        touch(&home.join("bin").join(exe("java")));
        std::fs::write(home.join("release"), "JAVA_VERSION=\"17.0.9\"\n").expect("write release");

        let cellar_home = temp_dir
            .path()
            .join("Cellar/openjdk@21/21.0.1/libexec/openjdk.jdk/Contents/Home");
        touch(&cellar_home.join("bin").join(exe("java")));

        let mut language = LanguageConfig::custom("java", "Java", None, Vec::new());
        language.scan_paths = vec![
            polyver_backend::ScanPathSpec::built_in(
                "~/JavaVirtualMachines",
                polyver_backend::SourceTag::JavaHome,
            ),
            polyver_backend::ScanPathSpec::built_in(
                "~/Cellar/openjdk*",
                polyver_backend::SourceTag::Homebrew,
            ),
        ];

        let scanner =
            JavaScanner::new().with_java_home_tool(PathBuf::from("/nonexistent-polyver/java_home"));
        let context = ScanContext::default().with_home(Some(temp_dir.path().to_path_buf()));
        let records = scanner.scan(&language, &context).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].version, "21.0.1");
        assert_eq!(records[0].install_path, cellar_home);
        assert_eq!(records[0].source_label, "Homebrew (openjdk@21)");
        assert_eq!(records[1].version, "17.0.9");
        assert_eq!(records[1].install_path, home);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn metadata_command_outranks_walk_for_same_home() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let home = temp_dir.path().join("jvms/custom-17.jdk/Contents/Home");
        touch(&home.join("bin").join("java"));

        let plist = format!(
            "<plist><array><dict><key>JVMHomePath</key><string>{}</string>\
             <key>JVMName</key><string>Custom</string>\
             <key>JVMVersion</key><string>17.0.10</string></dict></array></plist>",
            home.display()
        );
        let tool = temp_dir.path().join("java_home");
        std::fs::write(&tool, format!("#!/bin/sh\ncat <<'EOF'\n{plist}\nEOF\n"))
            .expect("write fake tool");
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755))
            .expect("make tool executable");

        let mut language = LanguageConfig::custom("java", "Java", None, Vec::new());
        language.scan_paths = vec![polyver_backend::ScanPathSpec::built_in(
            "~/jvms",
            polyver_backend::SourceTag::JavaHome,
        )];

        let scanner = JavaScanner::new().with_java_home_tool(tool);
        let context = ScanContext::default().with_home(Some(temp_dir.path().to_path_buf()));
        let records = scanner.scan(&language, &context).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].version, "17.0.10");
        assert_eq!(records[0].install_path, home);
    }
}
