// runcmp - compare output tables across simulation model runs

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use env_logger::Env;

use runcmp_cli::commands::{cmd_compare, cmd_validate, CompareArgs, ValidateArgs};
use runcmp_cli::exit_codes::EXIT_SUCCESS;
use runcmp_cli::CliError;

#[derive(Parser)]
#[command(name = "runcmp")]
#[command(about = "Align, diff and summarize output tables of simulation model runs")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a baseline run bundle against one or more other runs
    Compare(CompareArgs),

    /// Load run bundles and report their tables without comparing
    Validate(ValidateArgs),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  runcmp-compare ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compare(args) => cmd_compare(args),
        Commands::Validate(args) => cmd_validate(args),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
