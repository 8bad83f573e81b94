//! # chop-csv - split CSV files into date partitions
//!
//! Reads every input CSV (or every `*.csv` below an input directory), parses the
//! date in the first column and writes each row to
//! `{out-dir}/year=YYYY/month=M/day=D/{md5 of input path}.csv.bz2`.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Shift_JIS input, default yyyymmdd dates
//! chop-csv sales_2024.csv
//!
//! # UTF-8 input with ISO dates into a custom directory
//! chop-csv --utf8 --date-format 2006-01-02 --out-dir /data/chopped exports/
//!
//! # Settings from a YAML file, with a flag override
//! chop-csv --config chop.yaml --compression-level 6 exports/
//! ```

mod discover;

use anyhow::{Context, Result};
use chop_core::{ChopConfig, TextEncoding};
use chop_io::Chopper;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "chop-csv",
    version,
    about = "Chop CSV files into date-partitioned bzip2 files",
    override_usage = "chop-csv [OPTIONS] help|version|FILE..."
)]
struct Args {
    /// YAML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Date format of the first column (Go layout such as 20060102, or strftime)
    #[arg(long)]
    date_format: Option<String>,

    /// The output directory [default: chopped]
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Decode input as UTF-8 instead of Shift_JIS
    #[arg(long)]
    utf8: bool,

    /// Drop the first row of every input file
    #[arg(long)]
    has_header: bool,

    /// bzip2 compression level, 1-9 [default: 9]
    #[arg(long)]
    compression_level: Option<u32>,

    /// Input CSV files or directories
    inputs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("chop-csv failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let Some(first) = args.inputs.first() else {
        Args::command().print_help()?;
        std::process::exit(2);
    };
    match first.to_str() {
        Some("version") => {
            println!("chop-csv {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("help") => {
            Args::command().print_help()?;
            return Ok(());
        }
        _ => {}
    }

    let chopper = Chopper::new(load_config(&args)?).context("invalid configuration")?;

    for input in &args.inputs {
        for file in discover::csv_files(input)? {
            chopper
                .chop_file(&file)
                .with_context(|| format!("failed to chop {}", file.display()))?;
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<ChopConfig> {
    let mut config = match &args.config {
        Some(path) => ChopConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ChopConfig::default(),
    };

    if let Some(date_format) = &args.date_format {
        config.date_format = date_format.clone();
    }
    if let Some(out_dir) = &args.out_dir {
        config.output_dir = out_dir.clone();
    }
    if args.utf8 {
        config.encoding = TextEncoding::Utf8;
    }
    if args.has_header {
        config.has_header = true;
    }
    if let Some(level) = args.compression_level {
        config.compression_level = level;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chop.yaml");
        std::fs::write(&path, "date_format: \"2006-01-02\"\noutput_dir: from-file\n").unwrap();

        let args = Args::parse_from([
            "chop-csv",
            "--config",
            path.to_str().unwrap(),
            "--out-dir",
            "from-flag",
            "--utf8",
            "in.csv",
        ]);
        let config = load_config(&args).unwrap();

        assert_eq!(config.date_format, "2006-01-02");
        assert_eq!(config.output_dir, PathBuf::from("from-flag"));
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert_eq!(args.inputs, vec![PathBuf::from("in.csv")]);
    }

    #[test]
    fn defaults_without_flags() {
        let args = Args::parse_from(["chop-csv", "in.csv"]);
        assert_eq!(load_config(&args).unwrap(), ChopConfig::default());
    }

    #[test]
    fn missing_input_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let missing = dir.path().join("absent.csv");

        let args = Args::parse_from([
            "chop-csv",
            "--utf8",
            "--out-dir",
            out.to_str().unwrap(),
            missing.to_str().unwrap(),
        ]);

        let err = run(args).unwrap_err();
        assert!(format!("{err:#}").contains("failed to get file information"));
        assert!(!out.exists());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }
}
