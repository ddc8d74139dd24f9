//! The upgrade check: load both CRDs, build the cluster handle, compare

use std::path::Path;
use std::time::Duration;

use crdsafe_core::{CheckContext, Crd, CrdParser, UpgradeChecker};
use crdsafe_kube::{CrdClient, KubeError, resolve_kubeconfig_path};
use tracing::debug;

use crate::Cli;
use crate::display;
use crate::error::{CliError, Result};

pub async fn run(cli: &Cli) -> Result<()> {
    if cli.timeout == Some(0) {
        return Err(CliError::usage(
            "--timeout must be greater than zero",
            "omit --timeout to run without a deadline",
        ));
    }

    let old = cli
        .old_crd
        .as_deref()
        .map(|path| load_crd("oldCRD", path))
        .transpose()?;
    let new = load_crd("newCRD", &cli.new_crd)?;

    let client = connect(cli.kubeconfig.as_deref()).await?;

    let old = match old {
        Some(old) => old,
        None => fetch_live(&client, &new.name).await?,
    };

    let ctx = match cli.timeout {
        Some(secs) => CheckContext::with_timeout(Duration::from_secs(secs)),
        None => CheckContext::background(),
    };

    match UpgradeChecker::new().check(&ctx, &old, &new) {
        Ok(()) => display::print_compatible(cli.output, &new.name),
        Err(err) => {
            display::print_incompatible(cli.output, &err)?;
            Err(err.into())
        }
    }
}

fn load_crd(flag: &'static str, path: &Path) -> Result<Crd> {
    if !path.exists() {
        return Err(CliError::load(
            flag,
            format!("File {} does not exist.", path.display()),
        ));
    }

    let crd = CrdParser::from_file(path).map_err(|e| CliError::load(flag, e))?;
    debug!(
        flag,
        path = %path.display(),
        crd = %crd.name,
        versions = crd.versions.len(),
        "loaded CRD"
    );
    Ok(crd)
}

async fn connect(explicit: Option<&Path>) -> Result<CrdClient> {
    let path = resolve_kubeconfig_path(explicit)
        .ok_or_else(|| CliError::kubeconfig(KubeError::KubeconfigNotFound))?;
    debug!(path = %path.display(), "using kubeconfig");

    CrdClient::from_kubeconfig(&path)
        .await
        .map_err(CliError::kubeconfig)
}

async fn fetch_live(client: &CrdClient, name: &str) -> Result<Crd> {
    client.fetch(name).await.map_err(|e| CliError::Cluster {
        name: name.to_string(),
        message: if e.is_not_found() {
            "not installed".to_string()
        } else {
            e.to_string()
        },
    })
}
