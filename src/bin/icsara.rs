//! ICSARA command line
//!
//! Usage:
//!   icsara extract report.pdf out/
//!   icsara extract report.pdf out/ --no-exports --config thresholds.json
//!   icsara classify out/questions.json out/ --taxonomy taxonomy.json
//!
//! Logging follows `RUST_LOG` (default `info`). Exits with 2 when the input
//! file is missing or unreadable and with 1 on any other failure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use icsara::classify::{Classifier, Taxonomy};
use icsara::{ClassifierConfig, Error, ExtractionConfig};

#[derive(Parser, Debug)]
#[command(name = "icsara", version, about = "Structure extraction for ICSARA reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract questions, hierarchy and tables/figures from a PDF
    Extract {
        /// Input PDF
        pdf: PathBuf,
        /// Output directory
        out_dir: PathBuf,
        /// Skip rendering table/figure crops
        #[arg(long)]
        no_exports: bool,
        /// JSON file overriding extraction thresholds
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Classify extracted questions by topic
    Classify {
        /// questions.json written by `extract`
        questions_json: PathBuf,
        /// Output directory
        out_dir: PathBuf,
        /// Taxonomy JSON replacing the built-in one
        #[arg(long)]
        taxonomy: Option<PathBuf>,
    },
}

fn run(command: Command) -> icsara::Result<String> {
    match command {
        Command::Extract {
            pdf,
            out_dir,
            no_exports,
            config,
        } => {
            let config = match config {
                Some(path) => ExtractionConfig::from_json_file(&path)?,
                None => ExtractionConfig::default(),
            };
            let summary = icsara::extract_with_config(&pdf, &out_dir, !no_exports, &config)?;
            Ok(serde_json::to_string_pretty(&summary)?)
        },
        Command::Classify {
            questions_json,
            out_dir,
            taxonomy,
        } => {
            let taxonomy = match taxonomy {
                Some(path) => Taxonomy::from_json_file(&path)?,
                None => Taxonomy::embedded()?,
            };
            let summary = Classifier::new(taxonomy, ClassifierConfig::default())
                .run(&questions_json, &out_dir)?;
            Ok(serde_json::to_string_pretty(&summary)?)
        },
    }
}

fn failure_status(err: &Error) -> u8 {
    if err.is_input_failure() {
        2
    } else {
        1
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        },
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(failure_status(&e))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_status() {
        assert_eq!(failure_status(&Error::InputNotFound(PathBuf::from("a.pdf"))), 2);
        assert_eq!(failure_status(&Error::DocumentOpen("corrupt".to_string())), 2);
        assert_eq!(failure_status(&Error::Config("bad ratio".to_string())), 1);
    }
}
