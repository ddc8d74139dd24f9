//! Served-version rule
//!
//! Pairs versions by name and runs the field rules over every pair whose
//! version is still served by the new CRD. Versions that are new, or no
//! longer served, are not compared.

use tracing::debug;

use super::Rule;
use super::field::{FieldRule, default_field_rules};
use crate::context::CheckContext;
use crate::diff::{FieldPath, SchemaDiffer};
use crate::error::CheckError;
use crate::schema::{Crd, CrdVersion};

/// Field rules scoped to versions served by the new CRD
pub struct ServedVersionRule {
    field_rules: Vec<Box<dyn FieldRule>>,
}

impl Default for ServedVersionRule {
    fn default() -> Self {
        Self::new(default_field_rules())
    }
}

impl ServedVersionRule {
    pub fn new(field_rules: Vec<Box<dyn FieldRule>>) -> Self {
        Self { field_rules }
    }

    /// Names of the configured field rules, in evaluation order
    pub fn field_rule_names(&self) -> impl Iterator<Item = &str> {
        self.field_rules.iter().map(|r| r.name())
    }

    fn compare_pair(&self, old: &CrdVersion, new: &CrdVersion, failures: &mut Vec<String>) {
        let (old_schema, new_schema) = match (&old.schema, &new.schema) {
            (Some(o), Some(n)) => (o, n),
            (None, Some(_)) => {
                failures.push(unknown_change(&new.name, &FieldPath::root()));
                return;
            }
            // A dropped schema only loosens validation; dropped fields are
            // reported by the field-removal rule.
            _ => return,
        };

        let changes = SchemaDiffer::diff(old_schema, new_schema);
        debug!(version = %new.name, changes = changes.len(), "diffed served version");

        for change in &changes {
            let message = self
                .field_rules
                .iter()
                .find_map(|rule| rule.classify(change));
            failures.push(match message {
                Some(message) => format!(
                    "version {:?}, field {:?}: {}",
                    new.name,
                    change.path.to_string(),
                    message
                ),
                None => unknown_change(&new.name, &change.path),
            });
        }
    }
}

impl Rule for ServedVersionRule {
    fn name(&self) -> &str {
        "ServedVersionValidator"
    }

    fn check(&self, ctx: &CheckContext, old: &Crd, new: &Crd) -> Result<Vec<String>, CheckError> {
        let mut failures = Vec::new();

        for old_version in &old.versions {
            let Some(new_version) = new.version(&old_version.name) else {
                continue;
            };
            if !new_version.served {
                debug!(version = %new_version.name, "skipping unserved version");
                continue;
            }

            ctx.poll(&format!("version {}", new_version.name))?;
            self.compare_pair(old_version, new_version, &mut failures);
        }

        Ok(failures)
    }
}

fn unknown_change(version: &str, path: &FieldPath) -> String {
    format!(
        "version {:?}, field {:?} has unknown change, refusing to determine that change is safe",
        version,
        path.to_string()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CrdParser;
    use crate::rules::{BoundRule, RequiredFieldChange};

    fn crd(served: bool, required: &str, name_type: &str) -> Crd {
        CrdParser::parse(&format!(
            r#"
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1
      served: {}
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          required: {}
          properties:
            name:
              type: {}
"#,
            served, required, name_type
        ))
        .unwrap()
    }

    fn crd_with_field(field: &str) -> Crd {
        let field: String = field
            .lines()
            .map(|l| format!("              {}\n", l))
            .collect();
        CrdParser::parse(&format!(
            r#"
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            field:
{}"#,
            field
        ))
        .unwrap()
    }

    fn unknown_on_field() -> Vec<String> {
        vec![
            r#"version "v1", field "field" has unknown change, refusing to determine that change is safe"#
                .to_string(),
        ]
    }

    fn check(rule: &ServedVersionRule, old: &Crd, new: &Crd) -> Vec<String> {
        rule.check(&CheckContext::background(), old, new).unwrap()
    }

    #[test]
    fn test_required_added_on_served_version() {
        let old = crd(true, "[]", "string");
        let new = crd(true, "[name]", "string");

        assert_eq!(
            check(&ServedVersionRule::default(), &old, &new),
            vec![r#"version "v1", field "^": new required fields [name] added"#]
        );
    }

    #[test]
    fn test_unserved_version_is_skipped() {
        let old = crd(true, "[]", "string");
        let new = crd(false, "[name]", "string");

        assert!(check(&ServedVersionRule::default(), &old, &new).is_empty());
    }

    #[test]
    fn test_version_served_only_in_new_is_compared() {
        let old = crd(false, "[]", "string");
        let new = crd(true, "[name]", "string");

        assert_eq!(check(&ServedVersionRule::default(), &old, &new).len(), 1);
    }

    #[test]
    fn test_type_change_is_unknown() {
        let old = crd(true, "[]", "string");
        let new = crd(true, "[]", "integer");

        assert_eq!(
            check(&ServedVersionRule::default(), &old, &new),
            vec![
                r#"version "v1", field "name" has unknown change, refusing to determine that change is safe"#
            ]
        );
    }

    #[test]
    fn test_unconfigured_kind_is_unknown() {
        let rule = ServedVersionRule::new(vec![Box::new(BoundRule::maximum())]);
        let old = crd(true, "[]", "string");
        let new = crd(true, "[name]", "string");

        let failures = check(&rule, &old, &new);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("has unknown change"));

        let rule = ServedVersionRule::new(vec![Box::new(RequiredFieldChange)]);
        assert!(check(&rule, &old, &new)[0].contains("new required fields"));
    }

    #[test]
    fn test_pattern_added_is_unknown() {
        let old = crd_with_field("type: string");
        let new = crd_with_field("type: string\npattern: '^[a-z]$'");

        assert_eq!(check(&ServedVersionRule::default(), &old, &new), unknown_on_field());
    }

    #[test]
    fn test_format_changed_is_unknown() {
        let old = crd_with_field("type: string\nformat: date-time");
        let new = crd_with_field("type: string\nformat: email");

        assert_eq!(check(&ServedVersionRule::default(), &old, &new), unknown_on_field());
    }

    #[test]
    fn test_nullable_dropped_is_unknown() {
        let old = crd_with_field("type: string\nnullable: true");
        let new = crd_with_field("type: string\nnullable: false");

        assert_eq!(check(&ServedVersionRule::default(), &old, &new), unknown_on_field());
    }

    #[test]
    fn test_additional_properties_denied_is_unknown() {
        let old = crd_with_field("type: object\nadditionalProperties: true");
        let new = crd_with_field("type: object\nadditionalProperties: false");

        assert_eq!(check(&ServedVersionRule::default(), &old, &new), unknown_on_field());
    }

    #[test]
    fn test_description_change_is_safe() {
        let old = crd_with_field("type: string\ndescription: a name");
        let new = crd_with_field("type: string\ndescription: the name");

        assert!(check(&ServedVersionRule::default(), &old, &new).is_empty());
    }

    #[test]
    fn test_whole_float_bound_is_compared() {
        let old = crd_with_field("type: string\nmaxLength: 10");
        let new = crd_with_field("type: string\nmaxLength: 5.0");

        assert_eq!(
            check(&ServedVersionRule::default(), &old, &new),
            vec![r#"version "v1", field "field": maxLength: constraint decreased from 10 to 5"#]
        );
    }

    #[test]
    fn test_cancelled_context_aborts() {
        let old = crd(true, "[]", "string");
        let ctx = CheckContext::background();
        ctx.cancel();

        let result = ServedVersionRule::default().check(&ctx, &old, &old);
        assert!(matches!(result, Err(CheckError::Aborted { .. })));
    }

    #[test]
    fn test_field_rule_names() {
        let names: Vec<_> = ServedVersionRule::default()
            .field_rule_names()
            .map(String::from)
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("EnumChange"));
        assert_eq!(names.last().map(String::as_str), Some("DefaultValueChange"));
    }
}
