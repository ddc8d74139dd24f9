//! crdsafe Kube - cluster access for crdsafe
//!
//! This crate provides:
//! - **Kubeconfig resolution**: `--kubeconfig`, `$KUBECONFIG`, `~/.kube/config`
//! - **CRD client**: a typed `apiextensions.k8s.io/v1` handle able to fetch
//!   the live CRD an upgrade is checked against

pub mod client;
pub mod error;
pub mod kubeconfig;

pub use client::{CrdClient, to_crd};
pub use error::{KubeError, Result};
pub use kubeconfig::{KUBECONFIG_ENV, load_config, resolve_kubeconfig_path};
