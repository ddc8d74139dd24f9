//! Kubeconfig resolution
//!
//! Lookup order: explicit path, then the first entry of `$KUBECONFIG`, then
//! `~/.kube/config`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};
use tracing::debug;

use crate::error::{KubeError, Result};

/// Environment variable listing kubeconfig files
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Resolve the kubeconfig path from a flag, the environment and the home directory
pub fn resolve_kubeconfig_path(explicit: Option<&Path>) -> Option<PathBuf> {
    resolve_from(
        explicit,
        std::env::var_os(KUBECONFIG_ENV),
        dirs::home_dir(),
    )
}

fn resolve_from(
    explicit: Option<&Path>,
    env: Option<OsString>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(first) = env
        .as_deref()
        .and_then(|value| std::env::split_paths(value).find(|p| !p.as_os_str().is_empty()))
    {
        return Some(first);
    }

    home.map(|h| h.join(".kube").join("config"))
}

/// Load a client config from a kubeconfig file, using its current context
pub async fn load_config(path: &Path) -> Result<kube::Config> {
    if !path.exists() {
        return Err(KubeError::KubeconfigMissing(path.to_path_buf()));
    }

    let wrap = |source| KubeError::Kubeconfig {
        path: path.to_path_buf(),
        source,
    };

    let kubeconfig = Kubeconfig::read_from(path).map_err(wrap)?;
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(wrap)?;

    debug!(
        path = %path.display(),
        cluster = %config.cluster_url,
        "loaded kubeconfig"
    );
    Ok(config)
}
