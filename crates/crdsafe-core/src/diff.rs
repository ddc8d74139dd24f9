//! Structural schema differ
//!
//! Walks two schema trees in lock-step and reports every tightening change
//! between them. Only nodes present on both sides are compared: removed
//! properties are the concern of the field-removal rule, and added optional
//! properties are always safe.

use std::fmt;

use serde_json::Value;
use tracing::trace;

use crate::schema::{AdditionalProperties, NodeKind, NumericBounds, SchemaNode};

/// One step in a path through a schema tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathToken {
    /// A named object property
    Property(String),
    /// The item schema of an array
    Items,
    /// The schema of an object's additional properties
    AdditionalProperties,
}

/// Location of a node inside a schema tree
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<PathToken>);

impl FieldPath {
    /// The schema root
    pub fn root() -> Self {
        Self::default()
    }

    /// Path extended by one token
    pub fn child(&self, token: PathToken) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(token);
        Self(tokens)
    }

    /// Path extended by a property name
    pub fn property(&self, name: &str) -> Self {
        self.child(PathToken::Property(name.to_string()))
    }

}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "^");
        }
        for (i, token) in self.0.iter().enumerate() {
            match token {
                PathToken::Property(name) if i == 0 => write!(f, "{}", name)?,
                PathToken::Property(name) => write!(f, ".{}", name)?,
                PathToken::Items => write!(f, "[*]")?,
                PathToken::AdditionalProperties if i == 0 => write!(f, "*")?,
                PathToken::AdditionalProperties => write!(f, ".*")?,
            }
        }
        Ok(())
    }
}

/// Categories of breaking schema changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Node type changed (integer to number widening excluded)
    TypeChanged,
    /// Enum restriction added where none existed
    EnumAdded,
    /// Previously allowed enum values removed
    EnumNarrowed,
    /// New entries in the required set
    RequiredAdded,
    MaximumAdded,
    MaximumDecreased,
    MinimumAdded,
    MinimumIncreased,
    MaxItemsAdded,
    MaxItemsDecreased,
    MinItemsAdded,
    MinItemsIncreased,
    MaxLengthAdded,
    MaxLengthDecreased,
    MinLengthAdded,
    MinLengthIncreased,
    MaxPropertiesAdded,
    MaxPropertiesDecreased,
    MinPropertiesAdded,
    MinPropertiesIncreased,
    DefaultAdded,
    DefaultRemoved,
    DefaultChanged,
    /// Any other validation keyword changed (`pattern`, `format`,
    /// `nullable`, `additionalProperties`)
    Other { attribute: &'static str },
}

impl ChangeKind {
    /// Get a short description of this change type
    pub fn description(self) -> &'static str {
        match self {
            Self::TypeChanged => "type changed",
            Self::EnumAdded => "enum constraint added",
            Self::EnumNarrowed => "enum values removed",
            Self::RequiredAdded => "required field added",
            Self::MaximumAdded => "maximum added",
            Self::MaximumDecreased => "maximum decreased",
            Self::MinimumAdded => "minimum added",
            Self::MinimumIncreased => "minimum increased",
            Self::MaxItemsAdded => "maxItems added",
            Self::MaxItemsDecreased => "maxItems decreased",
            Self::MinItemsAdded => "minItems added",
            Self::MinItemsIncreased => "minItems increased",
            Self::MaxLengthAdded => "maxLength added",
            Self::MaxLengthDecreased => "maxLength decreased",
            Self::MinLengthAdded => "minLength added",
            Self::MinLengthIncreased => "minLength increased",
            Self::MaxPropertiesAdded => "maxProperties added",
            Self::MaxPropertiesDecreased => "maxProperties decreased",
            Self::MinPropertiesAdded => "minProperties added",
            Self::MinPropertiesIncreased => "minProperties increased",
            Self::DefaultAdded => "default value added",
            Self::DefaultRemoved => "default value removed",
            Self::DefaultChanged => "default value changed",
            Self::Other { attribute } => attribute,
        }
    }
}

/// A single breaking change between two schema nodes
///
/// `old_value` and `new_value` hold the compared attribute on each side:
/// the full enum or required list for set changes, the bound for bound
/// changes, the default for default changes, the type name for type
/// changes, and the keyword's value for other changes (`None` when unset).
/// An `additionalProperties` schema is shown as `"schema"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: FieldPath,
    pub kind: ChangeKind,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Recursive schema tree comparison
pub struct SchemaDiffer;

impl SchemaDiffer {
    /// Compare two schema trees, returning changes in path-discovery order
    ///
    /// Properties are visited in lexicographic order, then array items, then
    /// additional-properties schemas, so output is stable across runs.
    pub fn diff(old: &SchemaNode, new: &SchemaNode) -> Vec<Change> {
        let mut changes = Vec::new();
        Self::compare_node(old, new, &FieldPath::root(), &mut changes);
        changes
    }

    fn compare_node(
        old: &SchemaNode,
        new: &SchemaNode,
        path: &FieldPath,
        changes: &mut Vec<Change>,
    ) {
        if !Self::same_type(&old.kind, &new.kind) {
            Self::push(
                changes,
                path,
                ChangeKind::TypeChanged,
                Some(Value::from(old.kind.type_name())),
                Some(Value::from(new.kind.type_name())),
            );
            return;
        }

        Self::compare_enums(old, new, path, changes);

        if let (
            NodeKind::Object {
                required: old_required,
                ..
            },
            NodeKind::Object {
                required: new_required,
                ..
            },
        ) = (&old.kind, &new.kind)
        {
            if !new_required.is_subset(old_required) {
                Self::push(
                    changes,
                    path,
                    ChangeKind::RequiredAdded,
                    Some(Value::from_iter(old_required.iter().cloned())),
                    Some(Value::from_iter(new_required.iter().cloned())),
                );
            }
        }

        Self::compare_bounds(&old.kind, &new.kind, path, changes);
        Self::compare_default(old, new, path, changes);
        Self::compare_other(old, new, path, changes);

        // Children
        if let (Some(old_props), Some(new_props)) = (old.properties(), new.properties()) {
            for (name, old_child) in old_props {
                if let Some(new_child) = new_props.get(name) {
                    Self::compare_node(old_child, new_child, &path.property(name), changes);
                }
            }
        }

        if let (Some(old_items), Some(new_items)) = (old.items(), new.items()) {
            Self::compare_node(old_items, new_items, &path.child(PathToken::Items), changes);
        }

        if let (Some(old_extra), Some(new_extra)) = (old.additional_schema(), new.additional_schema())
        {
            Self::compare_node(
                old_extra,
                new_extra,
                &path.child(PathToken::AdditionalProperties),
                changes,
            );
        }
    }

    fn same_type(old: &NodeKind, new: &NodeKind) -> bool {
        matches!(
            (old, new),
            (NodeKind::Integer(_), NodeKind::Number(_))
        ) || std::mem::discriminant(old) == std::mem::discriminant(new)
    }

    fn compare_enums(old: &SchemaNode, new: &SchemaNode, path: &FieldPath, changes: &mut Vec<Change>) {
        match (&old.enum_values, &new.enum_values) {
            (None, Some(new_enum)) => Self::push(
                changes,
                path,
                ChangeKind::EnumAdded,
                None,
                Some(Value::Array(new_enum.clone())),
            ),
            (Some(old_enum), Some(new_enum)) if old_enum.iter().any(|v| !new_enum.contains(v)) => {
                Self::push(
                    changes,
                    path,
                    ChangeKind::EnumNarrowed,
                    Some(Value::Array(old_enum.clone())),
                    Some(Value::Array(new_enum.clone())),
                )
            }
            _ => {}
        }
    }

    fn compare_bounds(old: &NodeKind, new: &NodeKind, path: &FieldPath, changes: &mut Vec<Change>) {
        match (old, new) {
            (
                NodeKind::Integer(old_b) | NodeKind::Number(old_b),
                NodeKind::Integer(new_b) | NodeKind::Number(new_b),
            ) => Self::compare_numeric(old_b, new_b, path, changes),
            (
                NodeKind::String {
                    min_length: old_min,
                    max_length: old_max,
                    ..
                },
                NodeKind::String {
                    min_length: new_min,
                    max_length: new_max,
                    ..
                },
            ) => {
                Self::compare_upper(
                    *old_max,
                    *new_max,
                    (ChangeKind::MaxLengthAdded, ChangeKind::MaxLengthDecreased),
                    path,
                    changes,
                );
                Self::compare_lower(
                    *old_min,
                    *new_min,
                    (ChangeKind::MinLengthAdded, ChangeKind::MinLengthIncreased),
                    path,
                    changes,
                );
            }
            (
                NodeKind::Array {
                    min_items: old_min,
                    max_items: old_max,
                    ..
                },
                NodeKind::Array {
                    min_items: new_min,
                    max_items: new_max,
                    ..
                },
            ) => {
                Self::compare_upper(
                    *old_max,
                    *new_max,
                    (ChangeKind::MaxItemsAdded, ChangeKind::MaxItemsDecreased),
                    path,
                    changes,
                );
                Self::compare_lower(
                    *old_min,
                    *new_min,
                    (ChangeKind::MinItemsAdded, ChangeKind::MinItemsIncreased),
                    path,
                    changes,
                );
            }
            (
                NodeKind::Object {
                    min_properties: old_min,
                    max_properties: old_max,
                    ..
                },
                NodeKind::Object {
                    min_properties: new_min,
                    max_properties: new_max,
                    ..
                },
            ) => {
                Self::compare_upper(
                    *old_max,
                    *new_max,
                    (
                        ChangeKind::MaxPropertiesAdded,
                        ChangeKind::MaxPropertiesDecreased,
                    ),
                    path,
                    changes,
                );
                Self::compare_lower(
                    *old_min,
                    *new_min,
                    (
                        ChangeKind::MinPropertiesAdded,
                        ChangeKind::MinPropertiesIncreased,
                    ),
                    path,
                    changes,
                );
            }
            _ => {}
        }
    }

    fn compare_numeric(
        old: &NumericBounds,
        new: &NumericBounds,
        path: &FieldPath,
        changes: &mut Vec<Change>,
    ) {
        Self::compare_upper(
            old.maximum.map(Bound::Float),
            new.maximum.map(Bound::Float),
            (ChangeKind::MaximumAdded, ChangeKind::MaximumDecreased),
            path,
            changes,
        );
        Self::compare_lower(
            old.minimum.map(Bound::Float),
            new.minimum.map(Bound::Float),
            (ChangeKind::MinimumAdded, ChangeKind::MinimumIncreased),
            path,
            changes,
        );
    }

    /// An upper bound tightens when added or lowered
    fn compare_upper<B: Into<Bound> + Copy>(
        old: Option<B>,
        new: Option<B>,
        (added, decreased): (ChangeKind, ChangeKind),
        path: &FieldPath,
        changes: &mut Vec<Change>,
    ) {
        let old: Option<Bound> = old.map(Into::into);
        let new: Option<Bound> = new.map(Into::into);
        match (old, new) {
            (None, Some(n)) => Self::push(changes, path, added, None, Some(n.to_value())),
            (Some(o), Some(n)) if n.as_f64() < o.as_f64() => {
                Self::push(changes, path, decreased, Some(o.to_value()), Some(n.to_value()))
            }
            _ => {}
        }
    }

    /// A lower bound tightens when added or raised
    fn compare_lower<B: Into<Bound> + Copy>(
        old: Option<B>,
        new: Option<B>,
        (added, increased): (ChangeKind, ChangeKind),
        path: &FieldPath,
        changes: &mut Vec<Change>,
    ) {
        let old: Option<Bound> = old.map(Into::into);
        let new: Option<Bound> = new.map(Into::into);
        match (old, new) {
            (None, Some(n)) => Self::push(changes, path, added, None, Some(n.to_value())),
            (Some(o), Some(n)) if n.as_f64() > o.as_f64() => {
                Self::push(changes, path, increased, Some(o.to_value()), Some(n.to_value()))
            }
            _ => {}
        }
    }

    fn compare_default(old: &SchemaNode, new: &SchemaNode, path: &FieldPath, changes: &mut Vec<Change>) {
        let kind = match (&old.default, &new.default) {
            (None, Some(_)) => ChangeKind::DefaultAdded,
            (Some(_), None) => ChangeKind::DefaultRemoved,
            (Some(o), Some(n)) if o != n => ChangeKind::DefaultChanged,
            _ => return,
        };
        Self::push(changes, path, kind, old.default.clone(), new.default.clone());
    }

    /// Keywords without a dedicated change kind; `description` is ignored
    fn compare_other(old: &SchemaNode, new: &SchemaNode, path: &FieldPath, changes: &mut Vec<Change>) {
        if old.nullable != new.nullable {
            Self::push(
                changes,
                path,
                ChangeKind::Other {
                    attribute: "nullable",
                },
                Some(Value::Bool(old.nullable)),
                Some(Value::Bool(new.nullable)),
            );
        }

        match (&old.kind, &new.kind) {
            (
                NodeKind::String {
                    pattern: old_pattern,
                    format: old_format,
                    ..
                },
                NodeKind::String {
                    pattern: new_pattern,
                    format: new_format,
                    ..
                },
            ) => {
                Self::compare_keyword("pattern", old_pattern, new_pattern, path, changes);
                Self::compare_keyword("format", old_format, new_format, path, changes);
            }
            (
                NodeKind::Object {
                    additional_properties: old_extra,
                    ..
                },
                NodeKind::Object {
                    additional_properties: new_extra,
                    ..
                },
            ) => {
                let old_flag = additional_flag(old_extra.as_ref());
                let new_flag = additional_flag(new_extra.as_ref());
                if old_flag != new_flag {
                    Self::push(
                        changes,
                        path,
                        ChangeKind::Other {
                            attribute: "additionalProperties",
                        },
                        old_flag,
                        new_flag,
                    );
                }
            }
            _ => {}
        }
    }

    fn compare_keyword(
        attribute: &'static str,
        old: &Option<String>,
        new: &Option<String>,
        path: &FieldPath,
        changes: &mut Vec<Change>,
    ) {
        if old != new {
            Self::push(
                changes,
                path,
                ChangeKind::Other { attribute },
                old.clone().map(Value::from),
                new.clone().map(Value::from),
            );
        }
    }

    fn push(
        changes: &mut Vec<Change>,
        path: &FieldPath,
        kind: ChangeKind,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) {
        trace!(path = %path, kind = kind.description(), "schema change");
        changes.push(Change {
            path: path.clone(),
            kind,
            old_value,
            new_value,
        });
    }
}

/// `additionalProperties` as a comparable value; schemas on both sides are
/// compared as children instead
fn additional_flag(extra: Option<&AdditionalProperties>) -> Option<Value> {
    extra.map(|extra| match extra {
        AdditionalProperties::Allowed => Value::Bool(true),
        AdditionalProperties::Denied => Value::Bool(false),
        AdditionalProperties::Schema(_) => Value::from("schema"),
    })
}

/// A numeric or count bound, kept apart so counts render without a fraction
#[derive(Debug, Clone, Copy)]
enum Bound {
    Count(u64),
    Float(f64),
}

impl From<u64> for Bound {
    fn from(v: u64) -> Self {
        Bound::Count(v)
    }
}

impl Bound {
    fn as_f64(self) -> f64 {
        match self {
            Bound::Count(v) => v as f64,
            Bound::Float(v) => v,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Bound::Count(v) => Value::from(v),
            Bound::Float(v) if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 => {
                Value::from(v as i64)
            }
            Bound::Float(v) => Value::from(v),
        }
    }
}
