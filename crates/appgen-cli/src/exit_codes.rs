//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - invalid manifest or chart metadata mismatch
pub const VALIDATION_ERROR: i32 = 2;

/// Template error - a template could not be rendered
pub const TEMPLATE_ERROR: i32 = 3;

/// Build error - fetching, linting or packaging a chart failed
pub const BUILD_ERROR: i32 = 4;

/// IO error - file not found, permission denied, existing output, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// Interrupted by Ctrl-C (128 + SIGINT)
pub const INTERRUPTED: i32 = 130;
