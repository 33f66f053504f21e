//! Flat-file sample loading.
//!
//! Format: one record per line, `<stratum:int> <program:string>`, separated
//! by whitespace. Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::SampleFileError;

use super::SampleSet;

/// Load program samples from `path`.
///
/// # Errors
/// Returns `SampleFileError` if the file cannot be read, a line is
/// malformed, the strata leave a gap, or the file holds no records.
pub fn load_samples(path: &Path) -> Result<SampleSet, SampleFileError> {
    let io_error = |source| SampleFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let set = parse_samples(BufReader::new(file)).map_err(|e| match e {
        SampleFileError::Io { source, .. } => io_error(source),
        other => other,
    })?;

    tracing::info!(
        "Loaded {} program samples in {} strata from {}",
        set.len(),
        set.num_strata(),
        path.display()
    );
    Ok(set)
}

/// Parse program samples from any buffered reader.
pub fn parse_samples<R: BufRead>(reader: R) -> Result<SampleSet, SampleFileError> {
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|source| SampleFileError::Io {
            path: Default::default(),
            source,
        })?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(stratum), Some(program), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(SampleFileError::Malformed {
                line: line_num + 1,
                content: line.to_string(),
            });
        };

        let stratum: usize = stratum.parse().map_err(|_| SampleFileError::InvalidStratum {
            line: line_num + 1,
            value: stratum.to_string(),
        })?;

        records.push((line_num + 1, stratum, program.to_string()));
    }

    if records.is_empty() {
        return Err(SampleFileError::Empty);
    }

    SampleSet::from_lines(records)
}
