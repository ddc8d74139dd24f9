//! Exit codes for the crdsafe binary
//!
//! Any failure, whether loading, configuration or an unsafe upgrade, exits
//! with [`ERROR`] so scripts only need to test for zero.

/// The upgrade is safe
pub const SUCCESS: i32 = 0;

/// Anything else
pub const ERROR: i32 = 1;
