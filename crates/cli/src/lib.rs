//! `runcmp-cli`: command-line surface over `runcmp-compare`.

pub mod commands;
pub mod exit_codes;
pub mod report;

use runcmp_compare::CompareError;

use exit_codes::{compare_error_kind, compare_exit_code, EXIT_USAGE};

/// A failed command: exit code, message for stderr, optional hint.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }
}

impl From<CompareError> for CliError {
    fn from(err: CompareError) -> Self {
        let hint = match &err {
            CompareError::ConfigParse(_) => {
                Some("known keys: absolute_tolerance, relative_tolerance, top_n, baseline_run_id".to_string())
            }
            CompareError::MalformedTable { .. } => {
                Some("dimension values must be non-null and unique per row".to_string())
            }
            _ => None,
        };
        Self { code: compare_exit_code(&err), message: err.to_string(), hint }
    }
}

/// Machine-readable error written to stderr when `--json` is set.
#[derive(Debug, serde::Serialize)]
pub struct ErrorOutput {
    pub error: String,
    pub message: String,
    pub exit_code: u8,
}

impl ErrorOutput {
    pub fn from_compare_error(err: &CompareError) -> Self {
        Self {
            error: compare_error_kind(err).to_string(),
            message: err.to_string(),
            exit_code: compare_exit_code(err),
        }
    }

    pub fn print(&self) {
        if let Ok(output) = serde_json::to_string(self) {
            eprintln!("{output}");
        }
    }
}
