//! CRD representation for upgrade safety checks
//!
//! A simplified, owned model of a `CustomResourceDefinition` keeping only the
//! fields that matter when deciding whether an upgrade is safe. Schema trees
//! are a tagged union keyed by the OpenAPI `type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A parsed CustomResourceDefinition ready for comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Crd {
    /// Full CRD name (e.g., "certificates.cert-manager.io")
    pub name: String,
    /// API group (e.g., "cert-manager.io")
    pub group: String,
    /// Resource scope
    pub scope: CrdScope,
    /// Resource names (kind, plural, singular, shortNames)
    pub names: CrdNames,
    /// API versions with their schemas, in manifest order
    pub versions: Vec<CrdVersion>,
    /// Versions objects have ever been persisted in (`status.storedVersions`)
    pub stored_versions: Vec<String>,
}

impl Crd {
    /// Get the storage version
    pub fn storage_version(&self) -> Option<&CrdVersion> {
        self.versions.iter().find(|v| v.storage)
    }

    /// Get all served versions
    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersion> {
        self.versions.iter().filter(|v| v.served)
    }

    /// Look up a version by name
    pub fn version(&self, name: &str) -> Option<&CrdVersion> {
        self.versions.iter().find(|v| v.name == name)
    }

    /// Check if a specific version exists
    pub fn has_version(&self, name: &str) -> bool {
        self.version(name).is_some()
    }
}

/// CRD scope - whether resources are namespaced or cluster-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CrdScope {
    #[default]
    Namespaced,
    Cluster,
}

impl std::fmt::Display for CrdScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespaced => write!(f, "Namespaced"),
            Self::Cluster => write!(f, "Cluster"),
        }
    }
}

/// CRD naming information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    pub kind: String,
    pub plural: String,
    pub singular: Option<String>,
    pub short_names: Vec<String>,
    pub list_kind: Option<String>,
    pub categories: Vec<String>,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersion {
    /// Version name (e.g., "v1", "v1beta1")
    pub name: String,
    /// Whether this version is served by the API server
    pub served: bool,
    /// Whether this is the storage version
    pub storage: bool,
    /// Root of the `openAPIV3Schema`, if declared
    pub schema: Option<SchemaNode>,
}

/// A node in a structural schema tree
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Allowed values
    pub enum_values: Option<Vec<Value>>,
    /// Default value applied by the API server
    pub default: Option<Value>,
    /// Whether null is allowed
    pub nullable: bool,
    /// Type-specific shape and constraints
    pub kind: NodeKind,
}

/// Type-specific part of a schema node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    String {
        min_length: Option<u64>,
        max_length: Option<u64>,
        pattern: Option<String>,
        format: Option<String>,
    },
    Integer(NumericBounds),
    Number(NumericBounds),
    Boolean,
    Array {
        items: Option<Box<SchemaNode>>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    Object {
        properties: BTreeMap<String, SchemaNode>,
        required: BTreeSet<String>,
        min_properties: Option<u64>,
        max_properties: Option<u64>,
        additional_properties: Option<AdditionalProperties>,
    },
    /// Untyped node (`x-kubernetes-int-or-string`, preserve-unknown-fields)
    Any,
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericBounds {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

/// Additional properties configuration for objects
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allowed,
    Denied,
    Schema(Box<SchemaNode>),
}

impl NodeKind {
    /// OpenAPI type name of this node
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Boolean => "boolean",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Any => "any",
        }
    }
}

impl SchemaNode {
    /// Create a node of the given kind with no common attributes
    pub fn new(kind: NodeKind) -> Self {
        Self {
            enum_values: None,
            default: None,
            nullable: false,
            kind,
        }
    }

    /// Create an unconstrained string node
    pub fn string() -> Self {
        Self::new(NodeKind::String {
            min_length: None,
            max_length: None,
            pattern: None,
            format: None,
        })
    }

    /// Create an unconstrained integer node
    pub fn integer() -> Self {
        Self::new(NodeKind::Integer(NumericBounds::default()))
    }

    /// Create an object node with nested properties and nothing required
    pub fn object(properties: BTreeMap<String, SchemaNode>) -> Self {
        Self::new(NodeKind::Object {
            properties,
            required: BTreeSet::new(),
            min_properties: None,
            max_properties: None,
            additional_properties: None,
        })
    }

    /// Create an array node with an item schema
    pub fn array(items: SchemaNode) -> Self {
        Self::new(NodeKind::Array {
            items: Some(Box::new(items)),
            min_items: None,
            max_items: None,
        })
    }

    /// Nested properties, empty for non-object nodes
    pub fn properties(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        match &self.kind {
            NodeKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Array item schema
    pub fn items(&self) -> Option<&SchemaNode> {
        match &self.kind {
            NodeKind::Array { items, .. } => items.as_deref(),
            _ => None,
        }
    }

    /// Schema for additional properties, if it is a schema
    pub fn additional_schema(&self) -> Option<&SchemaNode> {
        match &self.kind {
            NodeKind::Object {
                additional_properties: Some(AdditionalProperties::Schema(schema)),
                ..
            } => Some(schema),
            _ => None,
        }
    }

    /// Check if a nested property is required
    pub fn is_required(&self, name: &str) -> bool {
        match &self.kind {
            NodeKind::Object { required, .. } => required.contains(name),
            _ => false,
        }
    }

    /// Get a nested property by dot-separated path
    pub fn get_nested(&self, path: &str) -> Option<&SchemaNode> {
        let mut current = self;
        for part in path.split('.') {
            current = current.properties()?.get(part)?;
        }
        Some(current)
    }
}
