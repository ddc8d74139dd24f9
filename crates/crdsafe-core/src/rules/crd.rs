//! CRD-level invariants
//!
//! These compare whole CRD objects and never consult the schema differ.

use tracing::debug;

use super::Rule;
use crate::context::CheckContext;
use crate::diff::{FieldPath, PathToken};
use crate::error::CheckError;
use crate::schema::{Crd, SchemaNode};

/// The resource scope may never change
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScopeChange;

impl Rule for NoScopeChange {
    fn name(&self) -> &str {
        "NoScopeChange"
    }

    fn check(&self, _ctx: &CheckContext, old: &Crd, new: &Crd) -> Result<Vec<String>, CheckError> {
        if old.scope == new.scope {
            return Ok(vec![]);
        }
        Ok(vec![format!(
            "scope changed from {:?} to {:?}",
            old.scope.to_string(),
            new.scope.to_string()
        )])
    }
}

/// Every version objects may be persisted in must stay declared
///
/// Covers `status.storedVersions` of the old CRD plus its current storage
/// version, which matters for manifests that carry no status.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStoredVersionRemoved;

impl Rule for NoStoredVersionRemoved {
    fn name(&self) -> &str {
        "NoStoredVersionRemoved"
    }

    fn check(&self, _ctx: &CheckContext, old: &Crd, new: &Crd) -> Result<Vec<String>, CheckError> {
        let mut stored: Vec<&str> = old.stored_versions.iter().map(String::as_str).collect();
        if let Some(current) = old.storage_version() {
            if !stored.contains(&current.name.as_str()) {
                stored.push(&current.name);
            }
        }

        Ok(stored
            .into_iter()
            .filter(|name| !new.has_version(name))
            .map(|name| format!("stored version {:?} removed", name))
            .collect())
    }
}

/// No property of a version's schema may disappear
///
/// Applies to every version present in both CRDs, served or not.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExistingFieldRemoved;

impl Rule for NoExistingFieldRemoved {
    fn name(&self) -> &str {
        "NoExistingFieldRemoved"
    }

    fn check(&self, _ctx: &CheckContext, old: &Crd, new: &Crd) -> Result<Vec<String>, CheckError> {
        let mut failures = Vec::new();

        for old_version in &old.versions {
            let (Some(old_schema), Some(new_version)) =
                (&old_version.schema, new.version(&old_version.name))
            else {
                continue;
            };

            let mut removed = Vec::new();
            collect_removed(
                old_schema,
                new_version.schema.as_ref(),
                &FieldPath::root(),
                &mut removed,
            );
            debug!(
                version = %old_version.name,
                removed = removed.len(),
                "compared fields"
            );

            failures.extend(removed.into_iter().map(|path| {
                format!(
                    "version {:?}, field {:?} may not be removed",
                    old_version.name,
                    path.to_string()
                )
            }));
        }

        Ok(failures)
    }
}

/// Record every property under `old` with no counterpart under `new`
fn collect_removed(
    old: &SchemaNode,
    new: Option<&SchemaNode>,
    path: &FieldPath,
    removed: &mut Vec<FieldPath>,
) {
    if let Some(properties) = old.properties() {
        for (name, old_child) in properties {
            let child_path = path.property(name);
            let new_child = new.and_then(SchemaNode::properties).and_then(|p| p.get(name));
            if new_child.is_none() {
                removed.push(child_path.clone());
            }
            collect_removed(old_child, new_child, &child_path, removed);
        }
    }

    if let Some(items) = old.items() {
        collect_removed(
            items,
            new.and_then(SchemaNode::items),
            &path.child(PathToken::Items),
            removed,
        );
    }

    if let Some(extra) = old.additional_schema() {
        collect_removed(
            extra,
            new.and_then(SchemaNode::additional_schema),
            &path.child(PathToken::AdditionalProperties),
            removed,
        );
    }
}
