//! CLI error types with exit code handling

use crdsafe_core::UpgradeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// Errors surfaced by the crdsafe binary
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Bad flag combination not caught by clap
    #[error("{message}")]
    #[diagnostic(code(crdsafe::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifest file missing or not a valid CRD
    #[error("Error loading {flag}: {message}")]
    #[diagnostic(code(crdsafe::cli::load))]
    Load { flag: &'static str, message: String },

    /// Kubeconfig missing, unreadable or rejected
    #[error("Error getting kubeconfig: {message}")]
    #[diagnostic(
        code(crdsafe::cli::kubeconfig),
        help("pass --kubeconfig or set the KUBECONFIG environment variable")
    )]
    Kubeconfig { message: String },

    /// Live CRD could not be read from the cluster
    #[error("Error fetching CRD {name:?} from cluster: {message}")]
    #[diagnostic(code(crdsafe::cli::cluster))]
    Cluster { name: String, message: String },

    /// The new CRD is not a safe upgrade, or the check was cut short
    #[error("CRDs are not compatible for upgrade: {0}")]
    #[diagnostic(code(crdsafe::cli::incompatible))]
    Incompatible(#[from] UpgradeError),

    /// Output could not be rendered
    #[error("Internal error: {message}")]
    #[diagnostic(code(crdsafe::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. }
            | CliError::Load { .. }
            | CliError::Kubeconfig { .. }
            | CliError::Cluster { .. }
            | CliError::Incompatible(_)
            | CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn usage(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn load(flag: &'static str, message: impl ToString) -> Self {
        Self::Load {
            flag,
            message: message.to_string(),
        }
    }

    pub fn kubeconfig(message: impl ToString) -> Self {
        Self::Kubeconfig {
            message: message.to_string(),
        }
    }

    pub fn internal(message: impl ToString) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
