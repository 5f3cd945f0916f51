use log::{debug, info};
use std::path::{Path, PathBuf};

use polyver_backend::{LanguageConfig, VersionRecord};
use polyver_platform::write_atomic;

use crate::error::ScriptWriteError;
use crate::script::{parse_active_path, render_script};

/// Writes one environment script per language into `script_dir`.
#[derive(Debug, Clone)]
pub struct EnvScriptWriter {
    script_dir: PathBuf,
}

impl EnvScriptWriter {
    #[must_use]
    pub fn new(script_dir: PathBuf) -> Self {
        Self { script_dir }
    }

    #[must_use]
    pub fn script_dir(&self) -> &Path {
        &self.script_dir
    }

    #[must_use]
    pub fn script_path(&self, language: &LanguageConfig) -> PathBuf {
        self.script_dir.join(language.script_file_name())
    }

    /// Overwrite the language's script so that it activates `record`.
    ///
    /// # Errors
    /// Returns [`ScriptWriteError::InvalidPath`] for install paths a script
    /// line cannot carry (line breaks, non-UTF-8), and other
    /// [`ScriptWriteError`]s when the script directory cannot be created or
    /// the script cannot be replaced.
    pub fn write(
        &self,
        language: &LanguageConfig,
        record: &VersionRecord,
    ) -> Result<PathBuf, ScriptWriteError> {
        check_exportable(&record.install_path)?;
        std::fs::create_dir_all(&self.script_dir)
            .map_err(|error| ScriptWriteError::create_dir(self.script_dir.clone(), &error))?;

        let path = self.script_path(language);
        let content = render_script(language, record);
        write_atomic(&path, content.as_bytes())
            .map_err(|error| ScriptWriteError::write(path.clone(), &error))?;

        info!(
            "Activated {} {} via {}",
            language.identifier,
            record.version,
            path.display()
        );
        Ok(path)
    }

    /// Delete the language's script. A missing script is not an error.
    ///
    /// # Errors
    /// Returns [`ScriptWriteError::Remove`] for any other I/O failure.
    pub fn remove(&self, language: &LanguageConfig) -> Result<(), ScriptWriteError> {
        let path = self.script_path(language);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ScriptWriteError::remove(path, &error)),
        }
    }

    /// Install path currently exported by the language's script, if the
    /// script exists and can be parsed.
    #[must_use]
    pub fn read_active_path(&self, language: &LanguageConfig) -> Option<PathBuf> {
        let path = self.script_path(language);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    debug!("Could not read {}: {error}", path.display());
                }
                return None;
            }
        };
        parse_active_path(&content, language)
    }
}

fn check_exportable(install_path: &Path) -> Result<(), ScriptWriteError> {
    let Some(text) = install_path.to_str() else {
        return Err(ScriptWriteError::invalid_path(
            install_path.to_path_buf(),
            "path is not valid UTF-8",
        ));
    };
    if text.contains(['\n', '\r']) {
        return Err(ScriptWriteError::invalid_path(
            install_path.to_path_buf(),
            "path contains a line break",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use polyver_backend::{LanguageConfig, VersionRecord};

    use super::EnvScriptWriter;
    use crate::error::ScriptWriteError;

    fn go() -> LanguageConfig {
        LanguageConfig::custom("go", "Go", Some("GOROOT".to_string()), Vec::new())
    }

    #[test]
    fn creates_missing_script_dir() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let writer = EnvScriptWriter::new(temp_dir.path().join("nested/config"));
        let record = VersionRecord::new("1.22.1", "GVM", PathBuf::from("/sdk/go1.22.1"));

        let path = writer.write(&go(), &record).expect("write script");

        assert_eq!(path, temp_dir.path().join("nested/config/go_env.sh"));
        assert!(path.is_file());
    }

    #[test]
    fn custom_script_file_name_is_honored() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let writer = EnvScriptWriter::new(temp_dir.path().to_path_buf());
        let mut language = go();
        language.script_file_name = Some("golang.sh".to_string());

        assert_eq!(
            writer.script_path(&language),
            temp_dir.path().join("golang.sh")
        );
    }

    #[test]
    fn remove_tolerates_missing_script() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let writer = EnvScriptWriter::new(temp_dir.path().to_path_buf());
        let record = VersionRecord::new("1.22.1", "GVM", PathBuf::from("/sdk/go1.22.1"));

        writer.write(&go(), &record).expect("write script");
        writer.remove(&go()).expect("remove script");
        writer.remove(&go()).expect("second remove is a no-op");

        assert!(!writer.script_path(&go()).exists());
        assert!(writer.read_active_path(&go()).is_none());
    }

    #[test]
    fn unwritable_destination_reports_path() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").expect("create blocking file");
        let writer = EnvScriptWriter::new(blocker.clone());
        let record = VersionRecord::new("1.22.1", "GVM", PathBuf::from("/sdk/go1.22.1"));

        let error = writer.write(&go(), &record).expect_err("dir is a file");

        assert!(matches!(error, ScriptWriteError::CreateDir { .. }));
        assert_eq!(error.path(), blocker);
    }

    #[test]
    fn line_break_in_install_path_is_refused() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let writer = EnvScriptWriter::new(temp_dir.path().to_path_buf());
        let record = VersionRecord::new("1.22.1", "Local", PathBuf::from("/sdk/go\nexport X=1"));

        let error = writer.write(&go(), &record).expect_err("line break refused");

        assert!(matches!(error, ScriptWriteError::InvalidPath { .. }));
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
        assert!(!writer.script_path(&go()).exists());
    }
}
