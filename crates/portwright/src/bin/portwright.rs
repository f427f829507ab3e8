//! portwright CLI binary entry point.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use portwright::{convert, ConvertError, ConvertOptions, ConversionMode};

/// Convert Cypress test scripts to Playwright.
#[derive(Parser)]
#[command(name = "portwright")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a test file (or stdin) and print the result.
    Convert {
        /// Input file; reads stdin when omitted.
        file: Option<PathBuf>,

        /// Conversion mode: "full" or a rule category such as
        /// "assertions" or "test-structure".
        #[arg(long, default_value = "full")]
        mode: String,

        /// Print the full JSON report instead of just the converted text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), ConvertError> {
    match cli.command {
        Commands::Convert { file, mode, json } => {
            let mode: ConversionMode = mode.parse()?;
            let source = read_input(file.as_deref())?;
            let report = convert(&source, &ConvertOptions { mode })?;

            if json {
                let rendered = serde_json::to_string_pretty(&report)
                    .map_err(|e| ConvertError::internal(e.to_string()))?;
                println!("{}", rendered);
            } else {
                print!("{}", report.output);
                if !report.applied.is_empty() || !report.unresolved.is_empty() {
                    eprintln!("{}", report.explanation());
                }
            }
            Ok(())
        }
    }
}

fn read_input(file: Option<&std::path::Path>) -> Result<String, ConvertError> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| ConvertError::internal(format!("cannot read {}: {}", path.display(), e))),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| ConvertError::internal(format!("cannot read stdin: {}", e)))?;
            Ok(buf)
        }
    }
}
