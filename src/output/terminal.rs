//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use aiq_core::{Estimate, StratumEstimate};

use crate::estimator::{EstimateReport, SimpleMcReport, StageRecord};

/// Format a stratified run for human-readable terminal output.
///
/// Shows the run parameters and schedule, one table per stage, and the
/// final estimate.
pub fn format_report(report: &EstimateReport) -> String {
    let mut output = String::new();

    output.push_str(&format_box_top());
    output.push_str(&format_box_line(&"AIQ STRATIFIED ESTIMATE".bold().to_string()));
    output.push_str(&format_box_separator());
    output.push_str(&format_box_line(&format!("Environment: {}", report.environment)));
    output.push_str(&format_box_line(&format!("Agent: {}", report.agent)));
    output.push_str(&format_box_line(&format!(
        "Discount: {}  Episode length: {}",
        report.discount_rate, report.episode_length
    )));
    output.push_str(&format_box_line(&format_schedule(&report.schedule)));
    output.push_str(&format_box_bottom());

    for stage in &report.stages {
        output.push_str(&format_stage(stage));
    }

    output.push('\n');
    match report.estimate {
        Some(estimate) => {
            output.push_str(&format!("{} {}\n", "AIQ:".bold(), format_estimate(&estimate)));
        }
        None => output.push_str(&format!("{}\n", "No stages were run".yellow())),
    }
    output.push_str(&format!(
        "{}\n",
        format!(
            "{} pairs accepted, {} truncated, {:.1}s",
            report.accepted_pairs, report.truncated_pairs, report.elapsed_secs
        )
        .dimmed()
    ));

    output
}

/// Format the stage targets, e.g. `Schedule: 0 6 12 20`.
pub fn format_schedule(schedule: &[usize]) -> String {
    let targets: Vec<String> = schedule.iter().map(ToString::to_string).collect();
    format!("Schedule: {}", targets.join(" "))
}

/// Format one stage: a row per active stratum and, once reportable, the estimate.
pub fn format_stage(stage: &StageRecord) -> String {
    let mut output = format!(
        "\n{}\n{:>8} {:>8} {:>8} {:>10} {:>10}\n",
        format!("Stage {} (N = {})", stage.stage, stage.target).bold(),
        "stratum",
        "M_i",
        "n_i",
        "mean",
        "+/-"
    );

    for stratum in stage.strata.iter().filter(|s| s.is_active()) {
        let allocated = stage.allocation.get(stratum.stratum).copied().unwrap_or(0);
        output.push_str(&format_stratum_row(stratum, allocated));
    }

    if stage.retries > 0 {
        output.push_str(&format!(
            "{}\n",
            format!("{} truncated pairs resampled", stage.retries).yellow()
        ));
    }
    if stage.reportable {
        output.push_str(&format!("{}\n", format_estimate(&stage.estimate)));
    }
    output
}

fn format_stratum_row(stratum: &StratumEstimate, allocated: usize) -> String {
    let mean = stratum
        .mean
        .filter(|_| stratum.samples > 0)
        .map_or_else(String::new, |m| format!("{m:.4}"));
    let half_width = stratum
        .half_width()
        .map_or_else(String::new, |h| format!("{h:.4}"));
    format!(
        "{:>8} {:>8} {:>8} {:>10} {:>10}\n",
        stratum.stratum, allocated, stratum.samples, mean, half_width
    )
}

/// Format an estimate with its 95% half-width.
pub fn format_estimate(estimate: &Estimate) -> String {
    let text = format!("{:.4} +/- {:.4}", estimate.value, estimate.half_width);
    if estimate.half_width.is_finite() {
        text.green().to_string()
    } else {
        text.yellow().to_string()
    }
}

/// Format a simple Monte Carlo run.
pub fn format_simple_mc(report: &SimpleMcReport) -> String {
    let mut output = String::new();

    output.push_str(&format_box_top());
    output.push_str(&format_box_line(&"AIQ SIMPLE MONTE CARLO".bold().to_string()));
    output.push_str(&format_box_separator());
    output.push_str(&format_box_line(&format!("Environment: {}", report.environment)));
    output.push_str(&format_box_line(&format!("Agent: {}", report.agent)));
    output.push_str(&format_box_line(&format!(
        "Discount: {}  Episode length: {}",
        report.discount_rate, report.episode_length
    )));
    output.push_str(&format_box_bottom());

    for checkpoint in &report.checkpoints {
        output.push_str(&format!(
            "{:>8}  {:>8.4} +/- {:.4}\n",
            checkpoint.samples, checkpoint.mean, checkpoint.half_width
        ));
    }

    match report.estimate {
        Some(estimate) => output.push_str(&format!(
            "\n{} {}\n",
            "AIQ:".bold(),
            format_estimate(&estimate)
        )),
        None => output.push_str(&format!("\n{}\n", "Every run was truncated".red())),
    }
    output.push_str(&format!(
        "{}\n",
        format!(
            "{} runs accepted, {} truncated, {:.1}s",
            report.accepted, report.truncated, report.elapsed_secs
        )
        .dimmed()
    ));

    output
}

// Box drawing helpers

const BOX_WIDTH: usize = 60;

fn format_box_top() -> String {
    format!("\u{250C}{}\u{2510}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_bottom() -> String {
    format!("\u{2514}{}\u{2518}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_separator() -> String {
    format!("\u{251C}{}\u{2524}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_line(content: &str) -> String {
    let visible_len = strip_ansi_codes(content).chars().count();
    let padding = (BOX_WIDTH - 2).saturating_sub(visible_len);
    format!("\u{2502} {}{} \u{2502}\n", content, " ".repeat(padding))
}

/// Strip ANSI escape codes for accurate length calculation.
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::Checkpoint;

    fn stratum(id: usize, probability: f64, samples: usize, mean: Option<f64>) -> StratumEstimate {
        StratumEstimate {
            stratum: id,
            probability,
            samples,
            mean,
            std_dev: 0.5,
        }
    }

    fn make_report() -> EstimateReport {
        let stage = |k: usize, target: usize, reportable: bool| StageRecord {
            stage: k,
            target,
            allocation: vec![0, 2, 4],
            strata: vec![
                stratum(0, 0.0, 0, None),
                stratum(1, 0.5, 2, Some(0.25)),
                stratum(2, 0.5, 8, Some(-0.125)),
            ],
            estimate: Estimate {
                value: 0.0625,
                half_width: 0.2,
            },
            reportable,
            retries: if k == 2 { 3 } else { 0 },
            variance_fallback: false,
        };
        EstimateReport {
            environment: "Constant(0,2)".into(),
            agent: "Fixed(0)".into(),
            discount_rate: 1.0,
            episode_length: 5,
            probabilities: vec![0.0, 0.5, 0.5],
            schedule: vec![0, 6, 12, 20],
            stages: vec![stage(1, 6, false), stage(2, 12, false), stage(3, 20, true)],
            estimate: Some(Estimate {
                value: 0.0625,
                half_width: 0.2,
            }),
            accepted_pairs: 10,
            truncated_pairs: 3,
            elapsed_secs: 0.5,
        }
    }

    #[test]
    fn test_format_report() {
        let output = format_report(&make_report());
        assert!(output.contains("Schedule: 0 6 12 20"));
        assert!(output.contains("Stage 3 (N = 20)"));
        assert!(output.contains("3 truncated pairs resampled"));
        assert!(output.contains("0.0625 +/- 0.2000"));
        assert!(output.contains("10 pairs accepted, 3 truncated"));
    }

    #[test]
    fn test_stratum_row_omits_early_values() {
        let row = format_stratum_row(&stratum(1, 0.5, 2, Some(0.25)), 2);
        assert!(row.contains("0.2500"));
        // Half-width needs at least four samples.
        assert_eq!(row.matches('.').count(), 1);

        let empty = format_stratum_row(&stratum(2, 0.5, 0, None), 2);
        assert!(!empty.contains('.'));
    }

    #[test]
    fn test_only_reportable_stage_shows_estimate() {
        let report = make_report();
        assert!(!format_stage(&report.stages[0]).contains("+/- 0.2000"));
        assert!(format_stage(&report.stages[2]).contains("+/- 0.2000"));
    }

    #[test]
    fn test_format_simple_mc() {
        let report = SimpleMcReport {
            environment: "Sequence(2,1000)".into(),
            agent: "Random".into(),
            discount_rate: 0.9,
            episode_length: 28,
            checkpoints: vec![Checkpoint {
                samples: 20,
                mean: 0.1,
                half_width: 0.3,
            }],
            estimate: None,
            accepted: 0,
            truncated: 4,
            elapsed_secs: 0.1,
        };
        let output = format_simple_mc(&report);
        assert!(output.contains("AIQ SIMPLE MONTE CARLO"));
        assert!(output.contains("Every run was truncated"));
        assert!(output.contains("0 runs accepted, 4 truncated"));
    }

    #[test]
    fn test_strip_ansi_codes() {
        let colored = "\x1b[32mgreen\x1b[0m";
        assert_eq!(strip_ansi_codes(colored), "green");
    }
}
