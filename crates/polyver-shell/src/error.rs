use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptWriteError {
    #[error("Failed to create script directory {}: {message}", path.display())]
    CreateDir {
        path: PathBuf,
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Failed to write environment script {}: {message}", path.display())]
    Write {
        path: PathBuf,
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Failed to remove environment script {}: {message}", path.display())]
    Remove {
        path: PathBuf,
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Cannot export install path {}: {message}", path.display())]
    InvalidPath {
        path: PathBuf,
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl ScriptWriteError {
    pub(crate) fn create_dir(path: PathBuf, error: &std::io::Error) -> Self {
        Self::CreateDir {
            path,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub(crate) fn write(path: PathBuf, error: &std::io::Error) -> Self {
        Self::Write {
            path,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub(crate) fn remove(path: PathBuf, error: &std::io::Error) -> Self {
        Self::Remove {
            path,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub(crate) fn invalid_path(path: PathBuf, message: &str) -> Self {
        Self::InvalidPath {
            path,
            kind: std::io::ErrorKind::InvalidInput,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::CreateDir { path, .. }
            | Self::Write { path, .. }
            | Self::Remove { path, .. }
            | Self::InvalidPath { path, .. } => path,
        }
    }

    #[must_use]
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            Self::CreateDir { kind, .. }
            | Self::Write { kind, .. }
            | Self::Remove { kind, .. }
            | Self::InvalidPath { kind, .. } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::ScriptWriteError;

    #[test]
    fn keeps_path_and_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = ScriptWriteError::write(PathBuf::from("/etc/polyver/go_env.sh"), &io);

        assert_eq!(error.kind(), std::io::ErrorKind::PermissionDenied);
        assert_eq!(error.path(), PathBuf::from("/etc/polyver/go_env.sh"));
        assert!(error.to_string().contains("/etc/polyver/go_env.sh"));
    }
}
