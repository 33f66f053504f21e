//! Append-only log of accepted antithetic pairs.
//!
//! The first line lists the probabilities of strata `1..`, space separated.
//! Every following line is one accepted pair:
//!
//! ```text
//! 2026_1018_14:03:59 3 0.125 -0.25
//! ```
//!
//! Only the orchestrating thread writes, and each record is flushed so a
//! crashed run leaves every completed pair on disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use aiq_core::{PairReturns, StratumId};
use chrono::Local;

use crate::error::AiqError;

const TIMESTAMP_FORMAT: &str = "%Y_%m%d_%H:%M:%S";
const FILE_NAME_TIMESTAMP_FORMAT: &str = "%Y_%m%d_%H_%M_%S";

/// Writer for the pair log.
#[derive(Debug)]
pub struct PairLog {
    path: PathBuf,
    file: BufWriter<File>,
    records: usize,
}

impl PairLog {
    /// Create (truncating) `path` and write the probability header.
    pub fn create(path: impl Into<PathBuf>, probabilities: &[f64]) -> Result<Self, AiqError> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| AiqError::PairLog {
            path: path.clone(),
            source,
        })?;
        let mut log = Self {
            path,
            file: BufWriter::new(file),
            records: 0,
        };

        let header = probabilities
            .iter()
            .skip(1)
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        log.write_line(&header)?;
        Ok(log)
    }

    /// Append one accepted pair.
    pub fn record(&mut self, stratum: StratumId, pair: PairReturns) -> Result<(), AiqError> {
        let line = format!(
            "{} {} {} {}",
            Local::now().format(TIMESTAMP_FORMAT),
            stratum,
            pair.positive,
            pair.negative
        );
        self.write_line(&line)?;
        self.records += 1;
        Ok(())
    }

    /// Path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pairs written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    fn write_line(&mut self, line: &str) -> Result<(), AiqError> {
        writeln!(self.file, "{line}")
            .and_then(|()| self.file.flush())
            .map_err(|source| AiqError::PairLog {
                path: self.path.clone(),
                source,
            })
    }
}

/// Log file name for a run, e.g. `Sequence(2,1000)_0.99_298_Random_2026_1018_14_03_59.log`.
pub fn default_file_name(
    environment: &str,
    discount_rate: f64,
    episode_length: usize,
    agent: &str,
) -> String {
    format!(
        "{environment}_{discount_rate}_{episode_length}_{agent}_{}.log",
        Local::now().format(FILE_NAME_TIMESTAMP_FORMAT)
    )
}
