//! Error types for crdsafe-kube

use std::path::PathBuf;

use thiserror::Error;

/// Result type for crdsafe-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while talking to a cluster
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Kubeconfig could not be read or resolved
    #[error("failed to build config from kubeconfig path {path}: {source}")]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },

    /// No kubeconfig location could be determined
    #[error("kubeconfig file not found. Please set the KUBECONFIG environment variable or use the --kubeconfig flag")]
    KubeconfigNotFound,

    /// Kubeconfig path does not exist
    #[error("kubeconfig file {0} does not exist")]
    KubeconfigMissing(PathBuf),

    /// CRD returned by the cluster could not be converted
    #[error("invalid CRD '{name}' from cluster: {message}")]
    InvalidCrd { name: String, message: String },
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }
}
