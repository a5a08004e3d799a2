//! `runcmp compare` and `runcmp validate`.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use runcmp_compare::{compare_suite, load_bundle, CompareConfig, CompareError, RunBundle};

use crate::exit_codes::{EXIT_DIFFERENCES, EXIT_IO};
use crate::report::render_suite;
use crate::{CliError, ErrorOutput};

#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  runcmp compare base/bundle.toml candidate/bundle.toml
  runcmp compare base/bundle.toml v2/bundle.toml v3.json --baseline v2
  runcmp compare base/bundle.toml candidate/bundle.toml --json > result.json
  runcmp compare a.json b.json --config tolerances.toml --top-n 50 --output result.json")]
pub struct CompareArgs {
    /// Run bundles: manifest (.toml) or inline JSON (.json). The first is the baseline unless --baseline is set
    #[arg(required = true, num_args = 2..)]
    pub bundles: Vec<PathBuf>,

    /// Tolerance config file (TOML)
    #[arg(long, env = "RUNCMP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run id to compare every other bundle against
    #[arg(long)]
    pub baseline: Option<String>,

    /// Absolute tolerance (overrides the config file)
    #[arg(long)]
    pub abs_tol: Option<f64>,

    /// Relative tolerance (overrides the config file)
    #[arg(long)]
    pub rel_tol: Option<f64>,

    /// Number of largest deviations to keep
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Output JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Suppress the human summary on stderr
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  runcmp validate base/bundle.toml
  runcmp validate base/bundle.toml v2.json --json")]
pub struct ValidateArgs {
    /// Run bundles to load and check
    #[arg(required = true)]
    pub bundles: Vec<PathBuf>,

    /// Output JSON to stdout
    #[arg(long)]
    pub json: bool,
}

/// Turn an engine error into a CLI error, printing it as JSON first when asked.
fn engine_err(json: bool) -> impl Fn(CompareError) -> CliError {
    move |err| {
        if json {
            let output = ErrorOutput::from_compare_error(&err);
            output.print();
            CliError::new(output.exit_code, "")
        } else {
            CliError::from(err)
        }
    }
}

/// File values first, then flag overrides, then one validation pass.
pub fn resolve_config(args: &CompareArgs) -> Result<CompareConfig, CompareError> {
    let mut config = match args.config {
        Some(ref path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CompareError::Io(format!("cannot read config {}: {e}", path.display())))?;
            CompareConfig::parse_toml(&text)?
        }
        None => CompareConfig::default(),
    };

    if let Some(v) = args.abs_tol {
        config.absolute_tolerance = v;
    }
    if let Some(v) = args.rel_tol {
        config.relative_tolerance = v;
    }
    if let Some(v) = args.top_n {
        config.top_n = v;
    }
    if let Some(ref id) = args.baseline {
        config.baseline_run_id = Some(id.clone());
    }

    config.validate()?;
    Ok(config)
}

fn load_all(paths: &[PathBuf]) -> Result<Vec<RunBundle>, CompareError> {
    paths
        .iter()
        .map(|path| {
            let bundle = load_bundle(path)?;
            log::info!(
                "loaded run '{}' from {}: {} tables, {} rows",
                bundle.run_id(),
                path.display(),
                bundle.len(),
                bundle.row_count()
            );
            Ok(bundle)
        })
        .collect()
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    if args.bundles.len() < 2 {
        return Err(CliError::usage("compare needs at least 2 run bundles")
            .with_hint("runcmp compare <BASELINE> <CANDIDATE>..."));
    }

    let on_err = engine_err(args.json);
    let config = resolve_config(&args).map_err(&on_err)?;
    let bundles = load_all(&args.bundles).map_err(&on_err)?;
    let suite = compare_suite(&bundles, &config).map_err(&on_err)?;

    // A single pair is reported as its comparison result, more as the suite.
    let json_str = match suite.comparisons.as_slice() {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(&suite),
    }
    .map_err(|e| CliError::new(EXIT_IO, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = args.output {
        write_output(path, &json_str)?;
        if !args.quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if args.json {
        println!("{json_str}");
    }

    if !args.quiet {
        eprint!("{}", render_suite(&suite));
    }

    if suite.has_differences() {
        return Err(CliError::new(EXIT_DIFFERENCES, "differences found"));
    }
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents)
        .map_err(|e| CliError::new(EXIT_IO, format!("cannot write output {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct BundleReport {
    pub path: String,
    pub run_id: String,
    pub tables: Vec<TableReport>,
}

#[derive(Debug, Serialize)]
pub struct TableReport {
    pub name: String,
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
    pub rows: usize,
}

impl BundleReport {
    pub fn new(path: &Path, bundle: &RunBundle) -> Self {
        Self {
            path: path.display().to_string(),
            run_id: bundle.run_id().to_string(),
            tables: bundle
                .tables()
                .map(|t| TableReport {
                    name: t.name().to_string(),
                    dimensions: t.dimensions().to_vec(),
                    measures: t.measures().to_vec(),
                    rows: t.len(),
                })
                .collect(),
        }
    }
}

pub fn cmd_validate(args: ValidateArgs) -> Result<(), CliError> {
    let on_err = engine_err(args.json);
    let bundles = load_all(&args.bundles).map_err(&on_err)?;

    let reports: Vec<BundleReport> = args
        .bundles
        .iter()
        .zip(&bundles)
        .map(|(path, bundle)| BundleReport::new(path, bundle))
        .collect();

    if args.json {
        let json_str = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::new(EXIT_IO, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    for report in &reports {
        let rows: usize = report.tables.iter().map(|t| t.rows).sum();
        println!("{} ({}): {} tables, {} rows", report.run_id, report.path, report.tables.len(), rows);
        for table in &report.tables {
            println!(
                "  {}: {} rows, dimensions [{}], measures [{}]",
                table.name,
                table.rows,
                table.dimensions.join(", "),
                table.measures.join(", ")
            );
        }
    }
    Ok(())
}
