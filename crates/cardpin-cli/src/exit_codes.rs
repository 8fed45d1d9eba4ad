//! Exit codes for CLI operations
//!
//! These follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - every dependency installed and the store is consistent
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// At least one dependency failed to install
pub const DEPENDENCY_FAILED: i32 = 2;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
