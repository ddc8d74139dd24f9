//! crdsafe Core - CRD upgrade safety checks
//!
//! This crate decides whether a new revision of a CustomResourceDefinition
//! can safely replace the one currently installed:
//! - **Schema model** (`schema`): owned CRD and structural schema types
//! - **Parser** (`parser`): manifest YAML/JSON into the schema model
//! - **Differ** (`diff`): recursive, order-stable schema comparison
//! - **Rules** (`rules`): CRD-level invariants and field-constraint rules
//! - **Validator** (`validator`): runs every rule and aggregates failures
//! - **Checker** (`checker`): the facade callers use
//!
//! # Example
//!
//! ```ignore
//! use crdsafe_core::{CheckContext, CrdParser, UpgradeChecker};
//!
//! let old = CrdParser::parse(old_yaml)?;
//! let new = CrdParser::parse(new_yaml)?;
//!
//! UpgradeChecker::new().check(&CheckContext::background(), &old, &new)?;
//! ```

pub mod checker;
pub mod context;
pub mod diff;
pub mod error;
pub mod parser;
pub mod rules;
pub mod schema;
pub mod validator;

pub use checker::UpgradeChecker;
pub use context::CheckContext;
pub use diff::{Change, ChangeKind, FieldPath, PathToken, SchemaDiffer};
pub use error::{CheckError, CoreError, Result, UpgradeError};
pub use parser::CrdParser;
pub use rules::{FieldRule, Rule};
pub use schema::{
    AdditionalProperties, Crd, CrdNames, CrdScope, CrdVersion, NodeKind, NumericBounds,
    SchemaNode,
};
pub use validator::{ValidationErrors, ValidationFailure, Validator, ValidatorBuilder};
