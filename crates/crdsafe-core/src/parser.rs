//! CRD manifest parser
//!
//! Parses `apiextensions.k8s.io/v1` CustomResourceDefinition manifests (YAML
//! or JSON) into the structured [`Crd`] model used by the upgrade checker.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::schema::{
    AdditionalProperties, Crd, CrdNames, CrdScope, CrdVersion, NodeKind, NumericBounds,
    SchemaNode,
};

/// Parser for CRD manifests
pub struct CrdParser;

impl CrdParser {
    /// Read and parse a CRD manifest file
    pub fn from_file(path: &Path) -> Result<Crd> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a CRD manifest (YAML is a superset of JSON, both are accepted)
    pub fn parse(manifest: &str) -> Result<Crd> {
        let value: Value = serde_yaml::from_str(manifest)?;
        Self::parse_value(&value)
    }

    /// Parse from a serde_json::Value (useful for objects fetched from a cluster)
    pub fn parse_value(value: &Value) -> Result<Crd> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid("missing 'kind' field"))?;

        if kind != "CustomResourceDefinition" {
            return Err(CoreError::invalid(format!(
                "expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid("missing 'metadata.name' field"))?
            .to_string();

        let spec = value
            .get("spec")
            .ok_or_else(|| CoreError::invalid("missing 'spec' field"))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid("missing 'spec.group' field"))?
            .to_string();

        let scope = match spec.get("scope").and_then(Value::as_str) {
            Some("Namespaced") | None => CrdScope::Namespaced,
            Some("Cluster") => CrdScope::Cluster,
            Some(other) => {
                return Err(CoreError::invalid(format!("unknown scope '{}'", other)));
            }
        };

        let names = Self::parse_names(spec.get("names"))?;
        let versions = Self::parse_versions(spec.get("versions"))?;

        let stored_versions = value
            .get("status")
            .and_then(|s| s.get("storedVersions"))
            .map(string_list)
            .unwrap_or_default();

        Ok(Crd {
            name,
            group,
            scope,
            names,
            versions,
            stored_versions,
        })
    }

    fn parse_names(names_value: Option<&Value>) -> Result<CrdNames> {
        let names = names_value.ok_or_else(|| CoreError::invalid("missing 'spec.names' field"))?;

        Ok(CrdNames {
            kind: names
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            plural: names
                .get("plural")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            singular: names
                .get("singular")
                .and_then(Value::as_str)
                .map(String::from),
            short_names: names.get("shortNames").map(string_list).unwrap_or_default(),
            list_kind: names
                .get("listKind")
                .and_then(Value::as_str)
                .map(String::from),
            categories: names.get("categories").map(string_list).unwrap_or_default(),
        })
    }

    fn parse_versions(versions_value: Option<&Value>) -> Result<Vec<CrdVersion>> {
        let versions = versions_value
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::invalid("missing 'spec.versions' array"))?;

        let mut seen = BTreeSet::new();
        let mut parsed = Vec::with_capacity(versions.len());
        for version in versions {
            let version = Self::parse_version(version)?;
            if !seen.insert(version.name.clone()) {
                return Err(CoreError::invalid(format!(
                    "duplicate version '{}'",
                    version.name
                )));
            }
            parsed.push(version);
        }
        Ok(parsed)
    }

    fn parse_version(version: &Value) -> Result<CrdVersion> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid("version missing 'name' field"))?
            .to_string();

        let flag = |key: &str, default: bool| {
            version
                .get(key)
                .and_then(Value::as_bool)
                .unwrap_or(default)
        };

        let schema = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"))
            .map(|s| Self::parse_node(s, &format!("versions[{}]", name)))
            .transpose()?;

        Ok(CrdVersion {
            served: flag("served", true),
            storage: flag("storage", false),
            name,
            schema,
        })
    }

    /// Parse a schema node (recursive)
    fn parse_node(node: &Value, location: &str) -> Result<SchemaNode> {
        let properties = node
            .get("properties")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| {
                        Self::parse_node(v, &format!("{}.{}", location, k)).map(|n| (k.clone(), n))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()
            })
            .transpose()?;

        let type_name = node.get("type").and_then(Value::as_str);
        let kind = match (type_name, properties) {
            (Some("string"), _) => NodeKind::String {
                min_length: parse_count(node, "minLength", location)?,
                max_length: parse_count(node, "maxLength", location)?,
                pattern: node
                    .get("pattern")
                    .and_then(Value::as_str)
                    .map(String::from),
                format: node.get("format").and_then(Value::as_str).map(String::from),
            },
            (Some("integer"), _) => NodeKind::Integer(Self::parse_bounds(node)),
            (Some("number"), _) => NodeKind::Number(Self::parse_bounds(node)),
            (Some("boolean"), _) => NodeKind::Boolean,
            (Some("array"), _) => NodeKind::Array {
                items: match node.get("items") {
                    Some(Value::Array(_)) => {
                        return Err(CoreError::invalid(format!(
                            "{}: tuple 'items' are not allowed in structural schemas",
                            location
                        )));
                    }
                    Some(items) => Some(Box::new(Self::parse_node(
                        items,
                        &format!("{}[*]", location),
                    )?)),
                    None => None,
                },
                min_items: parse_count(node, "minItems", location)?,
                max_items: parse_count(node, "maxItems", location)?,
            },
            (Some("object"), properties) => Self::parse_object(node, properties, location)?,
            (None, Some(properties)) => Self::parse_object(node, Some(properties), location)?,
            (None, None) => NodeKind::Any,
            (Some(other), _) => {
                return Err(CoreError::invalid(format!(
                    "{}: unknown schema type '{}'",
                    location, other
                )));
            }
        };

        Ok(SchemaNode {
            enum_values: node.get("enum").and_then(Value::as_array).cloned(),
            default: node.get("default").cloned(),
            nullable: node
                .get("nullable")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            kind,
        })
    }

    fn parse_object(
        node: &Value,
        properties: Option<BTreeMap<String, SchemaNode>>,
        location: &str,
    ) -> Result<NodeKind> {
        let additional_properties = match node.get("additionalProperties") {
            None => None,
            Some(Value::Bool(true)) => Some(AdditionalProperties::Allowed),
            Some(Value::Bool(false)) => Some(AdditionalProperties::Denied),
            Some(schema) => Some(AdditionalProperties::Schema(Box::new(Self::parse_node(
                schema,
                &format!("{}.*", location),
            )?))),
        };

        Ok(NodeKind::Object {
            properties: properties.unwrap_or_default(),
            required: node
                .get("required")
                .map(string_list)
                .unwrap_or_default()
                .into_iter()
                .collect(),
            min_properties: parse_count(node, "minProperties", location)?,
            max_properties: parse_count(node, "maxProperties", location)?,
            additional_properties,
        })
    }

    fn parse_bounds(node: &Value) -> NumericBounds {
        NumericBounds {
            minimum: node.get("minimum").and_then(Value::as_f64),
            maximum: node.get("maximum").and_then(Value::as_f64),
        }
    }
}

/// Read a count bound, accepting whole floats such as `5.0`
fn parse_count(node: &Value, key: &str, location: &str) -> Result<Option<u64>> {
    let value = match node.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    if let Some(count) = value.as_u64() {
        return Ok(Some(count));
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        _ => Err(CoreError::invalid(format!(
            "{}: '{}' must be a non-negative integer, got {}",
            location, key, value
        ))),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
