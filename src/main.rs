//! cryxmlb - convert files between CryXmlB and XML in place.
//!
//! Each file's original bytes are kept next to it before it is overwritten:
//! `<file>.bak` when converting to XML, `<file>.xml.bak` when converting to
//! CryXmlB.

mod batch;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cryxmlb::{Converter, DecodeOptions, Direction, EncodeOptions};

/// Convert CryXmlB files to XML and back
#[derive(Parser, Debug)]
#[command(name = "cryxmlb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to convert in place
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Convert to XML (default: detect per file)
    #[arg(long, conflicts_with = "to_cryxmlb")]
    to_xml: bool,

    /// Convert to CryXmlB (default: detect per file)
    #[arg(long)]
    to_cryxmlb: bool,

    /// Reject CryXmlB files whose child index table disagrees with the parent links
    #[arg(long, env = "CRYXMLB_STRICT")]
    strict: bool,

    /// Store each distinct string once when writing CryXmlB
    #[arg(long, env = "CRYXMLB_DEDUP_STRINGS")]
    dedup_strings: bool,

    /// Convert files concurrently
    #[arg(short = 'j', long)]
    parallel: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn direction(&self) -> Option<Direction> {
        match (self.to_xml, self.to_cryxmlb) {
            (true, _) => Some(Direction::ToXml),
            (_, true) => Some(Direction::ToCryXmlB),
            _ => None,
        }
    }

    fn converter(&self) -> Converter {
        Converter::new(
            DecodeOptions {
                verify_child_table: self.strict,
            },
            EncodeOptions {
                dedup_strings: self.dedup_strings,
            },
        )
    }

    fn log_filter(&self) -> EnvFilter {
        if self.quiet {
            return EnvFilter::new("error");
        }
        match self.verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let direction = cli.direction();
    let converter = cli.converter();
    debug!(?direction, ?converter, files = cli.files.len(), "starting");

    let summary = if cli.parallel {
        batch::run_parallel(&cli.files, direction, &converter)
    } else {
        batch::run_sequential(&cli.files, direction, &converter)
    };

    debug!(?summary, "done");

    Ok(if summary.aborted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
