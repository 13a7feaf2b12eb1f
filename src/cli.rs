//! Command line for the `archive-filter` binary.
//!
//! Commands:
//! - archive-filter filter <INPUT> --profile <name> [--format <fmt>] [--output <path>]
//! - archive-filter profiles

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{FilterConfig, CONFIG_ENV};
use crate::data::loader::QueryResultFile;
use crate::data::writer::{write_table, OutputFormat};

/// Filter archive query results down to one observational configuration
#[derive(Parser, Debug)]
#[command(name = "archive-filter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON file with extra or replacement filter profiles
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Filter a saved query result (.parquet, .json or .csv)
    Filter {
        /// Query result file
        input: PathBuf,

        /// Filter profile to apply
        #[arg(long, short, default_value = "hst")]
        profile: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List the available filter profiles
    Profiles,
}

/// Parse arguments and run the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = FilterConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Filter {
            input,
            profile,
            format,
            output,
        } => {
            let filter = config.profile(&profile)?;
            let table = filter
                .apply(&QueryResultFile::new(&input))
                .with_context(|| format!("filtering {}", input.display()))?;

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    write_table(&table, format, BufWriter::new(file))?;
                    log::info!("wrote {} rows to {}", table.len(), path.display());
                }
                None => write_table(&table, format, BufWriter::new(io::stdout()))?,
            }
        }
        Command::Profiles => {
            for (name, filter) in &config.profiles {
                println!("{name} (sorted by {})", filter.sort_by);
                for p in &filter.predicates {
                    println!("    {p}");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_path_falls_back_to_env() {
        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|a| a.get_id() == "config")
            .unwrap();
        assert_eq!(config.get_env(), Some(std::ffi::OsStr::new(CONFIG_ENV)));
    }

    #[test]
    fn filter_args() {
        let cli = Cli::try_parse_from([
            "archive-filter",
            "filter",
            "galex.json",
            "--profile",
            "galex",
            "--format",
            "csv",
        ])
        .unwrap();
        match cli.command {
            Command::Filter {
                input,
                profile,
                format,
                output,
            } => {
                assert_eq!(input, PathBuf::from("galex.json"));
                assert_eq!(profile, "galex");
                assert_eq!(format, OutputFormat::Csv);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn filter_defaults_to_hst_pretty() {
        let cli = Cli::try_parse_from(["archive-filter", "filter", "hst.parquet"]).unwrap();
        match cli.command {
            Command::Filter {
                profile, format, ..
            } => {
                assert_eq!(profile, "hst");
                assert_eq!(format, OutputFormat::Pretty);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
