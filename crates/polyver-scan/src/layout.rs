use std::path::{Path, PathBuf};

/// Where a runtime keeps its executable relative to a scanned directory.
///
/// `homes` are tried in order; the empty string is the scanned directory
/// itself. A home qualifies when `bin/<executable>` exists under it for any
/// of `executables`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    homes: Vec<PathBuf>,
    executables: Vec<String>,
}

impl InstallLayout {
    #[must_use]
    pub fn new(homes: &[&str], executables: &[&str]) -> Self {
        Self {
            homes: homes.iter().map(PathBuf::from).collect(),
            executables: executables.iter().map(|name| (*name).to_string()).collect(),
        }
    }

    /// A layout that only accepts `bin/<executable>` directly under the
    /// scanned directory.
    #[must_use]
    pub fn flat(executable: &str) -> Self {
        Self::new(&[""], &[executable])
    }

    #[must_use]
    pub fn locate_home(&self, dir: &Path) -> Option<PathBuf> {
        self.homes
            .iter()
            .map(|relative| {
                if relative.as_os_str().is_empty() {
                    dir.to_path_buf()
                } else {
                    dir.join(relative)
                }
            })
            .find(|home| self.has_executable(home))
    }

    #[must_use]
    pub fn has_executable(&self, home: &Path) -> bool {
        let bin = home.join("bin");
        self.executables.iter().any(|name| {
            bin.join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
                .is_file()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::InstallLayout;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().expect("path has parent")).expect("create parent");
        std::fs::write(path, "").expect("write marker");
    }

    fn exe(name: &str) -> String {
        format!("{name}{}", std::env::consts::EXE_SUFFIX)
    }

    #[test]
    fn flat_layout_accepts_bin_directly_under_dir() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        touch(&temp_dir.path().join("bin").join(exe("node")));

        let layout = InstallLayout::flat("node");

        assert_eq!(
            layout.locate_home(temp_dir.path()),
            Some(temp_dir.path().to_path_buf())
        );
    }

    #[test]
    fn nested_home_is_returned_instead_of_scanned_dir() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let jdk = temp_dir.path().join("temurin-17.jdk");
        touch(&jdk.join("Contents/Home/bin").join(exe("java")));

        let layout = InstallLayout::new(&["Contents/Home", ""], &["java"]);

        assert_eq!(layout.locate_home(&jdk), Some(jdk.join("Contents/Home")));
    }

    #[test]
    fn missing_executable_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(temp_dir.path().join("bin")).expect("create bin");

        let layout = InstallLayout::flat("node");

        assert!(layout.locate_home(temp_dir.path()).is_none());
    }

    #[test]
    fn any_listed_executable_qualifies() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        touch(&temp_dir.path().join("bin").join(exe("python")));

        let layout = InstallLayout::new(&[""], &["python3", "python"]);

        assert!(layout.has_executable(temp_dir.path()));
    }
}
