//! CRD API handle
//!
//! Builds an `apiextensions.k8s.io/v1` client from a kubeconfig. Building the
//! handle does not contact the cluster; only [`CrdClient::fetch`] does.

use std::path::Path;

use crdsafe_core::{Crd, CrdParser};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::Api;
use tracing::debug;

use crate::error::{KubeError, Result};
use crate::kubeconfig::load_config;

/// Client for reading CustomResourceDefinitions from a cluster
#[derive(Clone)]
pub struct CrdClient {
    api: Api<CustomResourceDefinition>,
}

impl CrdClient {
    /// Create from an existing Kubernetes client
    pub fn new(client: kube::Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }

    /// Create from a kubeconfig file
    pub async fn from_kubeconfig(path: &Path) -> Result<Self> {
        let config = load_config(path).await?;
        let client = kube::Client::try_from(config)?;
        Ok(Self::new(client))
    }

    /// Fetch the live CRD named `name`
    pub async fn fetch(&self, name: &str) -> Result<Crd> {
        let live = self.api.get(name).await?;
        debug!(crd = name, "fetched live CRD");
        to_crd(name, &live)
    }
}

/// Convert a typed CRD object into the comparison model
pub fn to_crd(name: &str, crd: &CustomResourceDefinition) -> Result<Crd> {
    let invalid = |message: String| KubeError::InvalidCrd {
        name: name.to_string(),
        message,
    };

    let value = serde_json::to_value(crd).map_err(|e| invalid(e.to_string()))?;
    CrdParser::parse_value(&value).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn typed_crd(scope: &str) -> CustomResourceDefinition {
        serde_json::from_value(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": "widgets.example.com" },
            "spec": {
                "group": "example.com",
                "scope": scope,
                "names": { "kind": "Widget", "plural": "widgets" },
                "versions": [{
                    "name": "v1",
                    "served": true,
                    "storage": true,
                    "schema": { "openAPIV3Schema": {
                        "type": "object",
                        "properties": { "spec": {
                            "type": "object",
                            "properties": { "size": { "type": "integer", "maximum": 10 } }
                        }}
                    }}
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_typed_crd_converts_into_model() {
        let crd = to_crd("widgets.example.com", &typed_crd("Cluster")).unwrap();

        assert_eq!(crd.name, "widgets.example.com");
        assert_eq!(crd.scope, crdsafe_core::CrdScope::Cluster);
        assert!(crd.has_version("v1"));

        let size = crd.versions[0]
            .schema
            .as_ref()
            .and_then(|root| root.get_nested("spec.size"))
            .unwrap();
        assert_eq!(size.kind.type_name(), "integer");
    }

    #[test]
    fn test_invalid_typed_crd_is_reported() {
        let err = to_crd("widgets.example.com", &typed_crd("Galaxy")).unwrap_err();
        assert!(matches!(err, KubeError::InvalidCrd { .. }));
        assert!(err.to_string().contains("unknown scope 'Galaxy'"));
    }
}
