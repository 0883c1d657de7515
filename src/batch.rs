//! In-place conversion of files on disk.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cryxmlb::{Converter, Direction, Format};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, info};

/// What happened to a file that was not a failure.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Converted in place; the original bytes are in `backup`.
    Converted { direction: Direction, backup: PathBuf },
    /// Already in the requested format; left untouched.
    AlreadyTarget(Format),
}

/// Why a file was not converted.
#[derive(Debug, Error)]
pub enum FileError {
    /// The file could not be read, converted or written. The batch continues.
    #[error("{0:#}")]
    Failed(anyhow::Error),

    /// The original could not be preserved. The batch stops.
    #[error("could not write backup file {}: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, FileError::Backup { .. })
    }
}

/// Path of the backup kept for `path` when converting in `direction`.
///
/// The suffix is appended to the full file name: `a.xml` becomes
/// `a.xml.bak` or `a.xml.xml.bak`.
pub fn backup_path(path: &Path, direction: Direction) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(direction.backup_suffix());
    PathBuf::from(name)
}

/// Convert one file in place.
///
/// The file is converted in memory first. Only then is the original written
/// to its backup path and the file replaced, so a failed conversion leaves
/// no trace on disk.
pub fn convert_file(
    path: &Path,
    direction: Option<Direction>,
    converter: &Converter,
) -> Result<Outcome, FileError> {
    let data = fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(FileError::Failed)?;

    let converted = match converter.convert(&data, direction) {
        Ok(converted) => converted,
        Err(cryxmlb::Error::AlreadyTargetFormat(format)) => return Ok(Outcome::AlreadyTarget(format)),
        Err(e) => {
            return Err(FileError::Failed(
                anyhow::Error::new(e).context(format!("failed to convert {}", path.display())),
            ))
        }
    };

    let backup = backup_path(path, converted.direction);
    fs::write(&backup, &data).map_err(|source| FileError::Backup {
        path: backup.clone(),
        source,
    })?;

    fs::write(path, &converted.bytes)
        .with_context(|| format!("failed to write {}", path.display()))
        .map_err(FileError::Failed)?;

    Ok(Outcome::Converted {
        direction: converted.direction,
        backup,
    })
}

/// Totals for a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Set when a backup could not be written.
    pub aborted: bool,
}

/// Convert every file in order, stopping at the first backup failure.
pub fn run_sequential(files: &[PathBuf], direction: Option<Direction>, converter: &Converter) -> Summary {
    let mut summary = Summary::default();
    for path in files {
        info!("Processing file: {}", path.display());
        let result = convert_file(path, direction, converter);
        report(path, &result, &mut summary);
        if summary.aborted {
            error!("Aborting.");
            break;
        }
    }
    summary
}

/// Convert files concurrently, one file per task.
///
/// Every file finishes before results are reported in input order.
pub fn run_parallel(files: &[PathBuf], direction: Option<Direction>, converter: &Converter) -> Summary {
    let results: Vec<_> = files
        .par_iter()
        .map(|path| convert_file(path, direction, converter))
        .collect();

    let mut summary = Summary::default();
    for (path, result) in files.iter().zip(&results) {
        info!("Processed file: {}", path.display());
        report(path, result, &mut summary);
    }
    summary
}

fn report(path: &Path, result: &Result<Outcome, FileError>, summary: &mut Summary) {
    match result {
        Ok(Outcome::Converted { direction, .. }) => {
            info!("Successfully converted {} to {} format", path.display(), direction.target());
            summary.converted += 1;
        }
        Ok(Outcome::AlreadyTarget(format)) => {
            info!("File {} is already in {} format", path.display(), format);
            summary.skipped += 1;
        }
        Err(e) => {
            error!("{}", e);
            summary.failed += 1;
            summary.aborted |= e.is_fatal_to_run();
        }
    }
}
