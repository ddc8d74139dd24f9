//! Upgrade checker facade

use tracing::{info, instrument};

use crate::context::CheckContext;
use crate::error::UpgradeError;
use crate::schema::Crd;
use crate::validator::Validator;

/// Entry point for CRD upgrade safety checks
///
/// Holds nothing but its validator, so one checker can serve any number of
/// checks, including concurrent ones.
#[derive(Default)]
pub struct UpgradeChecker {
    validator: Validator,
}

impl UpgradeChecker {
    /// Checker using the default rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Checker using a custom validator
    pub fn with_validator(validator: Validator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Check whether `new` can safely replace `old`
    #[instrument(skip_all, fields(crd = %new.name))]
    pub fn check(&self, ctx: &CheckContext, old: &Crd, new: &Crd) -> Result<(), UpgradeError> {
        self.validator
            .validate(ctx, old, new)
            .map_err(|e| UpgradeError::for_crd(&new.name, e))?;

        info!("upgrade is safe");
        Ok(())
    }
}
