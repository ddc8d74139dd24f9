//! Error types for crdsafe-core

use thiserror::Error;

use crate::validator::ValidationErrors;

/// Result type for manifest loading
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while loading a CRD manifest
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Failed to parse CRD manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid CRD manifest: {message}")]
    InvalidManifest { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::invalid(e.to_string())
    }
}

/// Outcome of a validator run that did not pass
#[derive(Debug, Error)]
pub enum CheckError {
    /// One or more rules reported a breaking change
    #[error(transparent)]
    Failed(#[from] ValidationErrors),

    /// The check context was cancelled or its deadline passed
    #[error("check aborted: {reason}")]
    Aborted { reason: String },
}

/// Error returned by [`UpgradeChecker::check`](crate::UpgradeChecker::check)
#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("validating upgrade for CRD {crd:?} failed:\n{failures}")]
    Incompatible {
        crd: String,
        failures: ValidationErrors,
    },

    #[error("checking upgrade for CRD {crd:?} aborted: {reason}")]
    Aborted { crd: String, reason: String },
}

impl UpgradeError {
    pub(crate) fn for_crd(crd: &str, err: CheckError) -> Self {
        match err {
            CheckError::Failed(failures) => Self::Incompatible {
                crd: crd.to_string(),
                failures,
            },
            CheckError::Aborted { reason } => Self::Aborted {
                crd: crd.to_string(),
                reason,
            },
        }
    }

    /// Failures behind an incompatible result
    pub fn failures(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Incompatible { failures, .. } => Some(failures),
            Self::Aborted { .. } => None,
        }
    }

    /// Check if the check was aborted rather than completed
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}
