use dtcl_core::{Outcome, PerformanceResult, StepResult};
use tracing::warn;

pub const TEST_LOOPBACK: &str = "LoopBack";
pub const TEST_ERASE: &str = "Erase";
pub const TEST_WRITE: &str = "Write";
pub const TEST_READ: &str = "Read";

const OUTCOME_WIDTH: usize = 14;

/// Spaces after the test name so the iteration column starts at offset 17.
pub fn name_padding(test_name: &str) -> usize {
    match test_name {
        TEST_LOOPBACK => 9,
        TEST_READ => 13,
        _ => 12,
    }
}

/// One fixed-width performance line.
///
/// An outcome other than PASS/FAIL is left out of the line entirely; the
/// rest of the line is still written.
pub fn format_performance_line(test_name: &str, iteration: u32, step: &StepResult) -> String {
    let mut line = format!("{test_name}{}{iteration}   ", " ".repeat(name_padding(test_name)));
    match Outcome::parse(step.outcome.trim()) {
        Some(outcome) => line.push_str(&format!("{:>OUTCOME_WIDTH$}", outcome.as_str())),
        None => warn!(test_name, iteration, outcome = %step.outcome, "unrecognised outcome omitted from report line"),
    }
    let (date, time) = step.timestamp.split_once(' ').unwrap_or((step.timestamp.as_str(), ""));
    line.push_str(&format!("     {}    {}", date.trim(), time.trim()));
    line
}

/// Lines for one completed iteration: loop-back only, or erase/write/read
/// followed by loop-back when a cartridge is fitted.
pub fn performance_lines(with_cart: bool, result: &PerformanceResult, iteration: u32) -> Vec<String> {
    if !with_cart {
        return vec![format_performance_line(TEST_LOOPBACK, iteration, &result.loop_back)];
    }
    vec![
        format_performance_line(TEST_ERASE, iteration, &result.erase),
        format_performance_line(TEST_WRITE, iteration, &result.write),
        format_performance_line(TEST_READ, iteration, &result.read),
        format_performance_line(TEST_LOOPBACK, iteration, &result.loop_back),
    ]
}
