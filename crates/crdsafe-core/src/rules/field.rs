//! Field-constraint rules
//!
//! Each rule owns a few [`ChangeKind`]s and turns a matching [`Change`] into
//! a failure message. A rule returns `None` for changes it does not handle.

use serde_json::Value;

use crate::diff::{Change, ChangeKind};

/// Classifier for a single category of schema change
pub trait FieldRule: Send + Sync {
    /// Get a human-readable name for this rule
    fn name(&self) -> &str;

    /// Failure message if this rule handles `change`
    fn classify(&self, change: &Change) -> Option<String>;
}

/// The eleven field rules in their default order
pub fn default_field_rules() -> Vec<Box<dyn FieldRule>> {
    vec![
        Box::new(EnumChange),
        Box::new(RequiredFieldChange),
        Box::new(BoundRule::maximum()),
        Box::new(BoundRule::max_items()),
        Box::new(BoundRule::max_length()),
        Box::new(BoundRule::max_properties()),
        Box::new(BoundRule::minimum()),
        Box::new(BoundRule::min_items()),
        Box::new(BoundRule::min_length()),
        Box::new(BoundRule::min_properties()),
        Box::new(DefaultValueChange),
    ]
}

/// Enum restrictions may not be added or narrowed
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumChange;

impl FieldRule for EnumChange {
    fn name(&self) -> &str {
        "EnumChange"
    }

    fn classify(&self, change: &Change) -> Option<String> {
        match change.kind {
            ChangeKind::EnumAdded => Some(format!(
                "enum constraint {} added when there were no restrictions previously",
                render(change.new_value.as_ref())
            )),
            ChangeKind::EnumNarrowed => {
                let new_values = as_list(change.new_value.as_ref());
                let removed: Vec<Value> = as_list(change.old_value.as_ref())
                    .iter()
                    .filter(|v| !new_values.contains(v))
                    .cloned()
                    .collect();
                Some(format!(
                    "enums {} removed from the set of previously allowed values",
                    Value::Array(removed)
                ))
            }
            _ => None,
        }
    }
}

/// Existing objects may lack newly required fields
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredFieldChange;

impl FieldRule for RequiredFieldChange {
    fn name(&self) -> &str {
        "RequiredFieldChange"
    }

    fn classify(&self, change: &Change) -> Option<String> {
        if change.kind != ChangeKind::RequiredAdded {
            return None;
        }
        let old_required = as_list(change.old_value.as_ref());
        let added: Vec<&str> = as_list(change.new_value.as_ref())
            .iter()
            .filter(|v| !old_required.contains(v))
            .filter_map(Value::as_str)
            .collect();
        Some(format!("new required fields [{}] added", added.join(", ")))
    }
}

/// Numeric, length, item or property-count bound that may not tighten
#[derive(Debug, Clone, Copy)]
pub struct BoundRule {
    name: &'static str,
    keyword: &'static str,
    added: ChangeKind,
    tightened: ChangeKind,
    direction: &'static str,
}

impl BoundRule {
    const fn upper(
        name: &'static str,
        keyword: &'static str,
        added: ChangeKind,
        tightened: ChangeKind,
    ) -> Self {
        Self {
            name,
            keyword,
            added,
            tightened,
            direction: "decreased",
        }
    }

    const fn lower(
        name: &'static str,
        keyword: &'static str,
        added: ChangeKind,
        tightened: ChangeKind,
    ) -> Self {
        Self {
            name,
            keyword,
            added,
            tightened,
            direction: "increased",
        }
    }

    pub const fn maximum() -> Self {
        Self::upper(
            "MaximumChange",
            "maximum",
            ChangeKind::MaximumAdded,
            ChangeKind::MaximumDecreased,
        )
    }

    pub const fn max_items() -> Self {
        Self::upper(
            "MaximumItemsChange",
            "maxItems",
            ChangeKind::MaxItemsAdded,
            ChangeKind::MaxItemsDecreased,
        )
    }

    pub const fn max_length() -> Self {
        Self::upper(
            "MaximumLengthChange",
            "maxLength",
            ChangeKind::MaxLengthAdded,
            ChangeKind::MaxLengthDecreased,
        )
    }

    pub const fn max_properties() -> Self {
        Self::upper(
            "MaximumPropertiesChange",
            "maxProperties",
            ChangeKind::MaxPropertiesAdded,
            ChangeKind::MaxPropertiesDecreased,
        )
    }

    pub const fn minimum() -> Self {
        Self::lower(
            "MinimumChange",
            "minimum",
            ChangeKind::MinimumAdded,
            ChangeKind::MinimumIncreased,
        )
    }

    pub const fn min_items() -> Self {
        Self::lower(
            "MinimumItemsChange",
            "minItems",
            ChangeKind::MinItemsAdded,
            ChangeKind::MinItemsIncreased,
        )
    }

    pub const fn min_length() -> Self {
        Self::lower(
            "MinimumLengthChange",
            "minLength",
            ChangeKind::MinLengthAdded,
            ChangeKind::MinLengthIncreased,
        )
    }

    pub const fn min_properties() -> Self {
        Self::lower(
            "MinimumPropertiesChange",
            "minProperties",
            ChangeKind::MinPropertiesAdded,
            ChangeKind::MinPropertiesIncreased,
        )
    }
}

impl FieldRule for BoundRule {
    fn name(&self) -> &str {
        self.name
    }

    fn classify(&self, change: &Change) -> Option<String> {
        if change.kind == self.added {
            Some(format!(
                "{}: constraint {} added when there were no restrictions previously",
                self.keyword,
                render(change.new_value.as_ref())
            ))
        } else if change.kind == self.tightened {
            Some(format!(
                "{}: constraint {} from {} to {}",
                self.keyword,
                self.direction,
                render(change.old_value.as_ref()),
                render(change.new_value.as_ref())
            ))
        } else {
            None
        }
    }
}

/// Defaulting must keep producing the same objects
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultValueChange;

impl FieldRule for DefaultValueChange {
    fn name(&self) -> &str {
        "DefaultValueChange"
    }

    fn classify(&self, change: &Change) -> Option<String> {
        let old = render(change.old_value.as_ref());
        let new = render(change.new_value.as_ref());
        match change.kind {
            ChangeKind::DefaultAdded => Some(format!(
                "default value {} added when there was no default previously",
                new
            )),
            ChangeKind::DefaultRemoved => Some(format!("default value {} removed", old)),
            ChangeKind::DefaultChanged => {
                Some(format!("default value changed from {} to {}", old, new))
            }
            _ => None,
        }
    }
}

fn render(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_else(|| "<none>".to_string())
}

fn as_list(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
