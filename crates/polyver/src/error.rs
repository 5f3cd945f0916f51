use std::path::PathBuf;

use polyver_backend::RegistryError;
use polyver_shell::ScriptWriteError;

use crate::preferences::PreferenceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorDetail {
    Message(String),
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl std::fmt::Display for AppErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::Io { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

impl From<String> for AppErrorDetail {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<std::io::Error> for AppErrorDetail {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Registry(RegistryError),
    ScriptWrite(ScriptWriteError),
    Preferences(PreferenceError),
    SettingsSaveFailed {
        details: AppErrorDetail,
    },
    BackgroundTaskFailed {
        details: AppErrorDetail,
    },
    RefreshCancelled {
        identifier: String,
    },
    InvalidScanPath {
        raw: String,
    },
    ScanPathNotFound {
        identifier: String,
        raw: String,
    },
    NotInstalled {
        identifier: String,
        install_path: PathBuf,
    },
}

impl AppError {
    pub fn settings_save_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::SettingsSaveFailed {
            details: details.into(),
        }
    }

    pub fn background_task_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::BackgroundTaskFailed {
            details: details.into(),
        }
    }

    pub fn refresh_cancelled(identifier: impl Into<String>) -> Self {
        Self::RefreshCancelled {
            identifier: identifier.into(),
        }
    }

    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::Registry(RegistryError::NotFound {
            identifier: identifier.into(),
        })
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::RefreshCancelled { .. })
    }
}

impl From<RegistryError> for AppError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<ScriptWriteError> for AppError {
    fn from(value: ScriptWriteError) -> Self {
        Self::ScriptWrite(value)
    }
}

impl From<PreferenceError> for AppError {
    fn from(value: PreferenceError) -> Self {
        Self::Preferences(value)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(error) => write!(f, "{error}"),
            Self::ScriptWrite(error) => write!(f, "{error}"),
            Self::Preferences(error) => write!(f, "{error}"),
            Self::SettingsSaveFailed { details } => {
                write!(f, "Failed to save settings: {details}")
            }
            Self::BackgroundTaskFailed { details } => {
                write!(f, "Background file task failed: {details}")
            }
            Self::RefreshCancelled { identifier } => {
                write!(f, "Refresh of {identifier} was superseded")
            }
            Self::InvalidScanPath { raw } => write!(f, "Invalid scan path: {raw:?}"),
            Self::ScanPathNotFound { identifier, raw } => {
                write!(f, "{identifier} has no user scan path {raw}")
            }
            Self::NotInstalled {
                identifier,
                install_path,
            } => write!(
                f,
                "{} is not a known {identifier} installation",
                install_path.display()
            ),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registry(error) => Some(error),
            Self::ScriptWrite(error) => Some(error),
            Self::Preferences(error) => Some(error),
            _ => None,
        }
    }
}
