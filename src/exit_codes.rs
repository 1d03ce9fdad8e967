//! Process exit codes of the `svn-migrate` binary.
//!
//! - `0`: the migration completed.
//! - `1`: anything else: wrong arguments, an existing target, or a failed
//!   migration step.

/// The migration completed.
pub const SUCCESS: i32 = 0;

/// Usage errors and failed migrations alike.
pub const ERROR: i32 = 1;
