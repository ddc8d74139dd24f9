//! Upgrade safety rules
//!
//! - **CRD-level** (`crd`): whole-object invariants (scope, stored versions,
//!   field removal)
//! - **Field constraints** (`field`): classify individual schema changes
//! - **Served versions** (`served`): run the field rules over every version
//!   still served by the new CRD
//!
//! Rules are independent: none sees the output of another, and each reports
//! every violation it finds.

mod crd;
mod field;
mod served;

pub use crd::{NoExistingFieldRemoved, NoScopeChange, NoStoredVersionRemoved};
pub use field::{
    BoundRule, DefaultValueChange, EnumChange, FieldRule, RequiredFieldChange,
    default_field_rules,
};
pub use served::ServedVersionRule;

use crate::context::CheckContext;
use crate::error::CheckError;
use crate::schema::Crd;

/// A check over a pair of CRD revisions
///
/// Returns one message per violation, in discovery order.
pub trait Rule: Send + Sync {
    /// Name reported alongside each failure
    fn name(&self) -> &str;

    /// Compare `old` against `new`
    fn check(&self, ctx: &CheckContext, old: &Crd, new: &Crd) -> Result<Vec<String>, CheckError>;
}

/// Rule backed by a plain function
pub struct FnRule<F> {
    name: String,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&Crd, &Crd) -> Vec<String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&Crd, &Crd) -> Vec<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, _ctx: &CheckContext, old: &Crd, new: &Crd) -> Result<Vec<String>, CheckError> {
        Ok((self.check)(old, new))
    }
}
