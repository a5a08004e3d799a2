use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompareError>;

#[derive(Debug, Error)]
pub enum CompareError {
    /// Declared schema does not match the row data, or row keys repeat.
    #[error("malformed table '{table}': {reason}")]
    MalformedTable { table: String, reason: String },
    /// Lookup by name failed against a bundle.
    #[error("run '{run_id}': table '{table}' not found")]
    TableNotFound { run_id: String, table: String },
    /// Invalid tolerance, baseline or bundle set supplied at invocation.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// TOML parse / deserialization error for a compare config.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// A bundle manifest, JSON document or CSV file could not be parsed.
    #[error("{source_name}: {message}")]
    BundleParse { source_name: String, message: String },
    #[error("IO error: {0}")]
    Io(String),
}

impl CompareError {
    pub(crate) fn malformed(table: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTable {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn bundle_parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BundleParse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
