//! Known-answer runs of the stratified estimator.

use aiq::{AgentSpec, EngineConfig, EnvironmentSpec, SampleSet, StratifiedEstimator};

fn zero_reward() -> EnvironmentSpec {
    EnvironmentSpec::Constant {
        reward: 0.0,
        actions: 2,
    }
}

fn two_strata(per_stratum: usize) -> SampleSet {
    SampleSet::new(
        (0..2 * per_stratum).map(|i| (1 + i / per_stratum, format!("program{i}"))),
    )
    .unwrap()
}

/// Two equally likely strata, ten programs each, zero reward everywhere.
#[test]
fn zero_reward_two_strata() {
    let config = EngineConfig::quick()
        .episode_length(5)
        .discount_rate(1.0)
        .sample_size(20)
        .threads(2);
    let estimator =
        StratifiedEstimator::new(zero_reward(), AgentSpec::Fixed { action: 0 }, config).unwrap();

    let report = estimator.run(&two_strata(10)).unwrap();

    assert_eq!(report.probabilities, vec![0.0, 0.5, 0.5]);
    assert_eq!(report.schedule, vec![0, 6, 12, 20]);
    let allocations: Vec<Vec<usize>> = report.stages.iter().map(|s| s.allocation.clone()).collect();
    assert_eq!(allocations, vec![vec![0, 2, 4], vec![0, 4, 2], vec![0, 4, 4]]);

    let estimate = report.estimate.unwrap();
    assert_eq!(estimate.value, 0.0);

    // Only stage 3 onward is reported, and the half-widths never grow there.
    let reported: Vec<f64> = report.reportable_stages().map(|s| s.estimate.half_width).collect();
    assert_eq!(reported.len(), 1);
    assert!(reported.windows(2).all(|w| w[1] <= w[0]));

    assert_eq!(report.accepted_pairs, 10);
    assert_eq!(report.truncated_pairs, 0);
    let last = report.stages.last().unwrap();
    assert_eq!(last.strata[1].samples, 10);
    assert_eq!(last.strata[2].samples, 10);
    assert_eq!(last.strata[0].samples, 0);
}

/// Four strata over a long schedule: reported half-widths never grow.
#[test]
fn half_widths_non_increasing_once_reported() {
    let config = EngineConfig::quick().episode_length(5).threads(3);
    let estimator =
        StratifiedEstimator::new(zero_reward(), AgentSpec::Fixed { action: 1 }, config).unwrap();

    let samples = SampleSet::new((0..400).map(|i| (1 + i % 4, format!("program{i}")))).unwrap();
    let report = estimator.run(&samples).unwrap();

    assert_eq!(report.schedule, vec![0, 12, 24, 40, 80, 120, 200, 280, 400]);
    assert_eq!(report.truncated_pairs, 0);

    // Strata still on the fallback deviation keep the first stage wide.
    assert!(report.stages[0].estimate.half_width > 0.0);

    let reported: Vec<f64> = report.reportable_stages().map(|s| s.estimate.half_width).collect();
    assert!(reported.len() >= 5);
    assert!(reported.windows(2).all(|w| w[1] <= w[0]), "{reported:?}");
}

/// A longer undiscounted run: allocations stay even and the interval narrows.
#[test]
fn sequence_run_narrows_interval() {
    let estimator = StratifiedEstimator::new(
        EnvironmentSpec::Sequence {
            actions: 2,
            max_steps: 1000,
        },
        AgentSpec::Random,
        EngineConfig::quick().episode_length(8).threads(4),
    )
    .unwrap();

    let samples = SampleSet::new((0..400).map(|i| {
        let stratum = 1 + i % 4;
        (stratum, format!("{:b}", i * 7 + stratum))
    }))
    .unwrap();
    let report = estimator.run(&samples).unwrap();

    assert!(report.stages.len() >= 5);
    for stage in &report.stages {
        // Every active stratum gets an even share, at least one pair.
        for (i, &m) in stage.allocation.iter().enumerate() {
            assert_eq!(m % 2, 0);
            assert_eq!(m >= 2, i > 0);
        }
        assert_eq!(stage.reportable, stage.stage >= 3);
    }

    let estimate = report.estimate.unwrap();
    assert!(estimate.value.abs() <= 1.0);
    assert!(estimate.half_width.is_finite());
    assert!(estimate.half_width < report.stages[0].estimate.half_width);
}

/// A discounted run over a constant reward reproduces the reward on each run.
#[test]
fn discounted_constant_reward() {
    let estimator = StratifiedEstimator::new(
        EnvironmentSpec::Constant {
            reward: 0.5,
            actions: 3,
        },
        AgentSpec::parse("Q_l,0,0.9,0.5,0.05").unwrap(),
        EngineConfig::quick()
            .discount_rate(0.9)
            .episode_length(20)
            .threads(2),
    )
    .unwrap();

    let report = estimator.run(&two_strata(20)).unwrap();
    assert!(report.estimate.unwrap().value.abs() < 1e-12);
    assert_eq!(report.episode_length, 20);
}
