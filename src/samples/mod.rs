//! Program samples and the per-stratum pool they are drawn from.
//!
//! Samples come from a flat file with one `<stratum> <program>` record per
//! line. Stratum 0 is the passive stratum: its programs are loaded (the
//! simple estimator walks them) but carry no weight in the stratified
//! estimate and are never dispatched by it.
//!
//! # Example
//!
//! ```ignore
//! use aiq::samples::{load_samples, SampleRepository};
//! use std::path::Path;
//!
//! let set = load_samples(Path::new("refmachines/samples/BF.samples"))?;
//! println!("{} programs in {} strata", set.len(), set.num_strata());
//! let mut repo = SampleRepository::from_set(&set);
//! let program = repo.pop(1)?;
//! ```

mod loader;

pub use loader::{load_samples, parse_samples};

use std::collections::{BTreeMap, VecDeque};

use aiq_core::constants::PASSIVE_STRATUM;
use aiq_core::StratumId;

use crate::error::{AiqError, SampleFileError};

/// One pre-generated program from the reference machine's distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSample {
    /// Stratum the program belongs to.
    pub stratum: StratumId,
    /// Opaque program text handed to the environment's `reset`.
    pub program: String,
    /// Position of the record in the sample file (0-indexed).
    pub ordinal: usize,
}

/// All programs loaded from a sample source, in file order.
#[derive(Debug, Clone)]
pub struct SampleSet {
    samples: Vec<ProgramSample>,
    counts: Vec<usize>,
}

impl SampleSet {
    /// Build a set from `(stratum, program)` records in order.
    ///
    /// # Errors
    /// Returns [`SampleFileError::StratumGap`] if the active strata are not
    /// numbered `1..=n` without gaps. Record positions stand in for line
    /// numbers.
    pub fn new<I, S>(records: I) -> Result<Self, SampleFileError>
    where
        I: IntoIterator<Item = (StratumId, S)>,
        S: Into<String>,
    {
        Self::from_lines(
            records
                .into_iter()
                .enumerate()
                .map(|(i, (stratum, program))| (i + 1, stratum, program.into())),
        )
    }

    /// Build a set from `(line, stratum, program)` records in order.
    pub(crate) fn from_lines<I>(records: I) -> Result<Self, SampleFileError>
    where
        I: IntoIterator<Item = (usize, StratumId, String)>,
    {
        let mut samples = Vec::new();
        let mut first_lines: BTreeMap<StratumId, usize> = BTreeMap::new();

        for (ordinal, (line, stratum, program)) in records.into_iter().enumerate() {
            first_lines.entry(stratum).or_insert(line);
            samples.push(ProgramSample {
                stratum,
                program,
                ordinal,
            });
        }

        let mut active = 0;
        for (&stratum, &line) in first_lines.range(PASSIVE_STRATUM + 1..) {
            let missing = active + 1;
            if stratum != missing {
                return Err(SampleFileError::StratumGap {
                    line,
                    stratum,
                    missing,
                });
            }
            active = stratum;
        }

        // Contiguous from 1, so every index is below `active + 1`.
        let mut counts = vec![0; active + 1];
        for sample in &samples {
            counts[sample.stratum] += 1;
        }

        Ok(Self { samples, counts })
    }

    /// Number of programs in the set.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of strata (highest stratum index + 1).
    pub fn num_strata(&self) -> usize {
        self.counts.len()
    }

    /// Programs available in each stratum.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Programs outside the passive stratum.
    pub fn active_len(&self) -> usize {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != PASSIVE_STRATUM)
            .map(|(_, &c)| c)
            .sum()
    }

    /// Stratum probabilities as relative frequencies of the active programs.
    ///
    /// The passive stratum always gets probability 0, so the vector sums to
    /// 1 whenever any active program exists.
    pub fn probabilities(&self) -> Vec<f64> {
        let active = self.active_len();
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if i == PASSIVE_STRATUM || active == 0 {
                    0.0
                } else {
                    c as f64 / active as f64
                }
            })
            .collect()
    }

    /// Iterate over all programs in file order.
    pub fn iter(&self) -> impl Iterator<Item = &ProgramSample> {
        self.samples.iter()
    }
}

/// Per-stratum FIFO queues of unused programs.
///
/// Owned and mutated only by the orchestrating thread. Each program is
/// handed out at most once.
#[derive(Debug, Clone)]
pub struct SampleRepository {
    queues: Vec<VecDeque<ProgramSample>>,
    probabilities: Vec<f64>,
}

impl SampleRepository {
    /// Build queues from a loaded set, preserving file order within each stratum.
    pub fn from_set(set: &SampleSet) -> Self {
        let mut queues: Vec<VecDeque<ProgramSample>> = vec![VecDeque::new(); set.num_strata()];
        for sample in set.iter() {
            queues[sample.stratum].push_back(sample.clone());
        }
        Self {
            queues,
            probabilities: set.probabilities(),
        }
    }

    /// Number of strata, including the passive one.
    pub fn num_strata(&self) -> usize {
        self.queues.len()
    }

    /// Probability weight of every stratum.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Unused programs left in `stratum`.
    pub fn remaining(&self, stratum: StratumId) -> usize {
        self.queues.get(stratum).map_or(0, VecDeque::len)
    }

    /// Take the next unused program from `stratum`.
    pub fn pop(&mut self, stratum: StratumId) -> Result<ProgramSample, AiqError> {
        self.queues
            .get_mut(stratum)
            .and_then(VecDeque::pop_front)
            .ok_or(AiqError::StratumExhausted { stratum })
    }
}
