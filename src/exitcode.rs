//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination; for `same`, the trees are equivalent
pub const OK: i32 = 0;

/// `same` ran fine and the trees differ
pub const DIFFERENT: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (tree rejected by the depth guard)
pub const DATAERR: i32 = 65;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Configuration error
pub const CONFIG: i32 = 78;
