//! Retries that run a stratum out of programs.

use aiq::{AgentSpec, AiqError, EngineConfig, EnvironmentSpec, SampleSet, StratifiedEstimator};

fn sequence() -> EnvironmentSpec {
    EnvironmentSpec::Sequence {
        actions: 2,
        max_steps: 1000,
    }
}

/// Stratum 2 holds a few good programs followed by ones that never halt.
fn poisoned_samples(good_in_stratum_two: usize) -> SampleSet {
    let mut records = Vec::new();
    for i in 0..20 {
        records.push((1, format!("{}", i % 2)));
    }
    for i in 0..10 {
        let program = if i < good_in_stratum_two { "01" } else { "0#" };
        records.push((2, program.to_string()));
    }
    SampleSet::new(records).unwrap()
}

#[test]
fn retries_exhaust_stratum() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("pairs.log");
    let config = EngineConfig::quick()
        .episode_length(5)
        .sample_size(30)
        .threads(2)
        .pair_log(&log_path);
    let estimator =
        StratifiedEstimator::new(sequence(), AgentSpec::Fixed { action: 0 }, config).unwrap();

    let err = estimator.run(&poisoned_samples(1)).unwrap_err();
    assert!(
        matches!(err, AiqError::StratumExhausted { stratum: 2 }),
        "unexpected error: {err}"
    );
    assert!(err.to_string().contains("stratum 2"));

    // Nothing truncated was ever counted: stratum 2 logged at most its one good program.
    let log = std::fs::read_to_string(&log_path).unwrap();
    let stratum_two = log
        .lines()
        .skip(1)
        .filter(|line| line.split(' ').nth(1) == Some("2"))
        .count();
    assert!(stratum_two <= 1);
    for line in log.lines().skip(1) {
        assert!(!line.contains("NaN"), "truncated pair logged: {line}");
    }
}

#[test]
fn truncated_pairs_are_replaced() {
    let config = EngineConfig::quick()
        .episode_length(5)
        .sample_size(12)
        .threads(2);
    let estimator =
        StratifiedEstimator::new(sequence(), AgentSpec::Fixed { action: 0 }, config).unwrap();

    // Stratum 2 alternates between halting and non-halting programs.
    let mut records: Vec<(usize, String)> = (0..12).map(|i| (1, format!("{}", i % 2))).collect();
    records.extend((0..12).map(|i| (2, if i % 2 == 0 { "0#" } else { "11" }.to_string())));
    let report = estimator.run(&SampleSet::new(records).unwrap()).unwrap();

    assert!(report.truncated_pairs > 0);
    assert_eq!(
        report.truncated_pairs,
        report.stages.iter().map(|s| s.retries).sum::<usize>()
    );
    let last = report.stages.last().unwrap();
    let allocated: usize = report.stages.iter().map(|s| s.allocation[2]).sum();
    assert_eq!(last.strata[2].samples, allocated);
}

#[test]
fn initial_allocation_can_exhaust_stratum() {
    // One program in stratum 1 cannot cover the reserve of every stage.
    let records = std::iter::once((1, "0".to_string()))
        .chain((0..40).map(|i| (2, format!("{}", i % 2))));
    let config = EngineConfig::quick().episode_length(3).threads(1);
    let estimator =
        StratifiedEstimator::new(sequence(), AgentSpec::Fixed { action: 0 }, config).unwrap();

    let err = estimator.run(&SampleSet::new(records).unwrap()).unwrap_err();
    assert!(matches!(err, AiqError::StratumExhausted { stratum: 1 }));
}
