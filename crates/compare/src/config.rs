use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};

pub const DEFAULT_ABSOLUTE_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_TOP_N: usize = 20;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Comparison settings. Every key is optional in TOML.
///
/// ```toml
/// absolute_tolerance = 1e-9
/// relative_tolerance = 1e-6
/// top_n = 20
/// baseline_run_id = "ompp-1.15.4"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    pub absolute_tolerance: f64,
    pub relative_tolerance: f64,
    pub top_n: usize,
    /// Reference run when more than two bundles are compared.
    /// `None` means the first bundle supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_run_id: Option<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: DEFAULT_ABSOLUTE_TOLERANCE,
            relative_tolerance: DEFAULT_RELATIVE_TOLERANCE,
            top_n: DEFAULT_TOP_N,
            baseline_run_id: None,
        }
    }
}

/// The pair of thresholds the differ applies to every numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            absolute: DEFAULT_ABSOLUTE_TOLERANCE,
            relative: DEFAULT_RELATIVE_TOLERANCE,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CompareConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        let config = Self::parse_toml(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Deserialize only. Callers that layer overrides on top validate after.
    pub fn parse_toml(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| CompareError::ConfigParse(e.to_string()))
    }

    /// Reject negative or non-finite tolerances. Values are never clamped.
    pub fn validate(&self) -> Result<()> {
        check_tolerance("absolute_tolerance", self.absolute_tolerance)?;
        check_tolerance("relative_tolerance", self.relative_tolerance)?;

        if let Some(ref id) = self.baseline_run_id {
            if id.trim().is_empty() {
                return Err(CompareError::Configuration(
                    "baseline_run_id must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            absolute: self.absolute_tolerance,
            relative: self.relative_tolerance,
        }
    }
}

fn check_tolerance(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(CompareError::Configuration(format!(
            "{name} must be finite, got {value}"
        )));
    }
    if value < 0.0 {
        return Err(CompareError::Configuration(format!(
            "{name} must be >= 0, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_document() {
        let config = CompareConfig::from_toml("").unwrap();
        assert_eq!(config, CompareConfig::default());
        assert_eq!(config.top_n, 20);
        assert_eq!(config.tolerance().absolute, 1e-9);
        assert_eq!(config.tolerance().relative, 1e-6);
    }

    #[test]
    fn parse_full() {
        let config = CompareConfig::from_toml(
            r#"
absolute_tolerance = 0.001
relative_tolerance = 0.0
top_n = 5
baseline_run_id = "ompp-1.15.4"
"#,
        )
        .unwrap();
        assert_eq!(config.absolute_tolerance, 0.001);
        assert_eq!(config.relative_tolerance, 0.0);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.baseline_run_id.as_deref(), Some("ompp-1.15.4"));
    }

    #[test]
    fn negative_tolerance_rejected() {
        let err = CompareConfig::from_toml("absolute_tolerance = -1.0").unwrap_err();
        assert!(matches!(err, CompareError::Configuration(_)));
        assert!(err.to_string().contains("absolute_tolerance must be >= 0"));
    }

    #[test]
    fn non_finite_tolerance_rejected() {
        let config = CompareConfig {
            relative_tolerance: f64::NAN,
            ..CompareConfig::default()
        };
        assert!(matches!(config.validate(), Err(CompareError::Configuration(_))));

        let config = CompareConfig {
            absolute_tolerance: f64::INFINITY,
            ..CompareConfig::default()
        };
        assert!(matches!(config.validate(), Err(CompareError::Configuration(_))));
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let err = CompareConfig::from_toml("tolerance = 1").unwrap_err();
        assert!(matches!(err, CompareError::ConfigParse(_)));
    }

    #[test]
    fn negative_top_n_is_parse_error() {
        let err = CompareConfig::from_toml("top_n = -3").unwrap_err();
        assert!(matches!(err, CompareError::ConfigParse(_)));
    }

    #[test]
    fn empty_baseline_rejected() {
        let err = CompareConfig::from_toml("baseline_run_id = \"  \"").unwrap_err();
        assert!(matches!(err, CompareError::Configuration(_)));
    }
}
