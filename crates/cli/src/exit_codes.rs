//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `runcmp` exit codes.
//! Exit codes are part of the shell contract: CI jobs gate releases on them.
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Success; for `compare`, no differences                     |
//! | 1    | Differences found (like `diff(1)`)                         |
//! | 2    | Usage error (bad arguments, fewer than two bundles)        |
//! | 3    | Malformed input (bad manifest, CSV, JSON or table shape)   |
//! | 4    | Invalid configuration (tolerances, baseline, config file)  |
//! | 5    | I/O error (unreadable input, unwritable output)            |

use runcmp_compare::CompareError;

/// Success: command completed, and `compare` found no differences.
pub const EXIT_SUCCESS: u8 = 0;

/// At least one pair has a missing table or a table that is not IDENTICAL.
pub const EXIT_DIFFERENCES: u8 = 1;

/// Bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A bundle failed to parse or violates the table shape contract.
pub const EXIT_MALFORMED_INPUT: u8 = 3;

/// Tolerances, baseline or config file rejected.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Cannot read an input or write an output.
pub const EXIT_IO: u8 = 5;

/// Map an engine error to its exit code.
pub fn compare_exit_code(err: &CompareError) -> u8 {
    match err {
        CompareError::MalformedTable { .. }
        | CompareError::BundleParse { .. }
        | CompareError::TableNotFound { .. } => EXIT_MALFORMED_INPUT,
        CompareError::Configuration(_) | CompareError::ConfigParse(_) => EXIT_INVALID_CONFIG,
        CompareError::Io(_) => EXIT_IO,
    }
}

/// Stable machine-readable name for an engine error.
pub fn compare_error_kind(err: &CompareError) -> &'static str {
    match err {
        CompareError::MalformedTable { .. } => "malformed_table",
        CompareError::TableNotFound { .. } => "table_not_found",
        CompareError::Configuration(_) => "configuration",
        CompareError::ConfigParse(_) => "config_parse",
        CompareError::BundleParse { .. } => "bundle_parse",
        CompareError::Io(_) => "io",
    }
}
