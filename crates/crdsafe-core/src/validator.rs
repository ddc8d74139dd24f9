//! Rule orchestration
//!
//! The validator runs every registered rule against the same pair of CRDs and
//! collects all failures. A failing rule never stops the ones after it.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::context::CheckContext;
use crate::error::CheckError;
use crate::rules::{
    FieldRule, FnRule, NoExistingFieldRemoved, NoScopeChange, NoStoredVersionRemoved, Rule,
    ServedVersionRule, default_field_rules,
};
use crate::schema::Crd;

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// Name of the rule that reported it
    pub rule: String,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// Every failure of a validator run, in rule registration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationFailure>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Failures reported by one rule
    pub fn by_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a ValidationFailure> {
        self.0.iter().filter(move |f| f.rule == rule)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// An ordered, fixed set of upgrade rules
pub struct Validator {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for Validator {
    /// Scope, stored-version and field-removal invariants, then the
    /// eleven field rules scoped to served versions
    fn default() -> Self {
        Self::builder()
            .rule(NoScopeChange)
            .rule(NoStoredVersionRemoved)
            .rule(NoExistingFieldRemoved)
            .rule(ServedVersionRule::new(default_field_rules()))
            .build()
    }
}

impl Validator {
    /// Start an empty rule list
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    /// Names of the registered rules, in execution order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name())
    }

    /// Run every rule and join their failures
    ///
    /// The context is polled before each rule. Cancellation discards any
    /// failures collected so far.
    pub fn validate(&self, ctx: &CheckContext, old: &Crd, new: &Crd) -> Result<(), CheckError> {
        let mut failures = Vec::new();

        for rule in &self.rules {
            ctx.poll(&format!("rule {}", rule.name()))?;

            let messages = rule.check(ctx, old, new)?;
            debug!(rule = rule.name(), failures = messages.len(), "rule finished");

            failures.extend(messages.into_iter().map(|message| ValidationFailure {
                rule: rule.name().to_string(),
                message,
            }));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(failures).into())
        }
    }
}

/// Builder for a custom [`Validator`]
#[derive(Default)]
pub struct ValidatorBuilder {
    rules: Vec<Box<dyn Rule>>,
}

impl ValidatorBuilder {
    /// Append a rule
    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Append a rule backed by a function
    pub fn rule_fn<F>(self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Crd, &Crd) -> Vec<String> + Send + Sync + 'static,
    {
        self.rule(FnRule::new(name, check))
    }

    /// Append the served-version rule with a custom field rule list
    pub fn served_version_rules(self, field_rules: Vec<Box<dyn FieldRule>>) -> Self {
        self.rule(ServedVersionRule::new(field_rules))
    }

    pub fn build(self) -> Validator {
        Validator { rules: self.rules }
    }
}
