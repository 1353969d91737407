//! Provisioning Error Types
//!
//! Every step reports failure as a `ProvisionError` tagged with the kind of
//! step that failed, so the orchestrator can branch on the kind instead of
//! on log output.

use std::fmt;
use thiserror::Error;

/// Which provisioning step produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Package manager could not install the language binding
    BindingInstall,
    /// Engine installer could not be fetched
    Download,
    /// Installer ran but failed, or could not be started
    Install,
    /// Installer artifact was not on disk
    MissingArtifact,
    /// Machine environment could not be read or written
    Environment,
    /// Trained language data could not be provisioned
    LanguageData,
    /// An environment override held an invalid value
    Config,
}

impl ErrorKind {
    /// Fatal kinds abort the run; the rest degrade to warnings.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::BindingInstall
                | ErrorKind::Download
                | ErrorKind::Install
                | ErrorKind::MissingArtifact
        )
    }

    /// Process exit code reported when a run aborts with this kind
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorKind::Config => 1,
            ErrorKind::BindingInstall => 2,
            ErrorKind::Download => 3,
            ErrorKind::MissingArtifact => 4,
            ErrorKind::Install => 5,
            ErrorKind::Environment | ErrorKind::LanguageData => 0,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::BindingInstall => "binding install",
            ErrorKind::Download => "download",
            ErrorKind::Install => "install",
            ErrorKind::MissingArtifact => "missing artifact",
            ErrorKind::Environment => "environment",
            ErrorKind::LanguageData => "language data",
            ErrorKind::Config => "config",
        };
        f.write_str(label)
    }
}

/// Error raised by a provisioning step
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct ProvisionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProvisionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn binding_install(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BindingInstall, message)
    }

    pub fn download(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Download, message)
    }

    pub fn install(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Install, message)
    }

    pub fn missing_artifact(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingArtifact, message)
    }

    pub fn environment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Environment, message)
    }

    pub fn language_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LanguageData, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Result type alias for provisioning operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;
