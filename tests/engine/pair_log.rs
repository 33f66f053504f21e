//! The accepted-pair log written during a run.

use aiq::{AgentSpec, EngineConfig, EnvironmentSpec, SampleSet, StratifiedEstimator};

#[test]
fn one_line_per_accepted_pair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");

    let estimator = StratifiedEstimator::new(
        EnvironmentSpec::Constant {
            reward: 1.0,
            actions: 2,
        },
        AgentSpec::Fixed { action: 1 },
        EngineConfig::quick()
            .episode_length(4)
            .threads(2)
            .pair_log(&path),
    )
    .unwrap();

    let samples = SampleSet::new((0..30).map(|i| (i % 3, format!("p{i}")))).unwrap();
    let report = estimator.run(&samples).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();

    // Header: probabilities of strata 1 and 2; the passive stratum is left out.
    let header: Vec<f64> = lines
        .next()
        .unwrap()
        .split(' ')
        .map(|p| p.parse().unwrap())
        .collect();
    assert_eq!(header.len(), 2);
    assert!((header[0] - 0.5).abs() < 1e-12);

    let records: Vec<&str> = lines.collect();
    assert_eq!(records.len(), report.accepted_pairs);
    for record in records {
        let fields: Vec<&str> = record.split(' ').collect();
        assert_eq!(fields.len(), 4);
        assert_ne!(fields[1], "0");
        assert_eq!(fields[2].parse::<f64>().unwrap(), 1.0);
        assert_eq!(fields[3].parse::<f64>().unwrap(), -1.0);
    }
}
