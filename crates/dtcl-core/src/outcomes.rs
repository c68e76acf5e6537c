use std::fmt;

use serde::Serialize;

/// Final counters of one soak run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub detected: bool,
    pub total: u32,
    pub success_count: u32,
    pub failure_count: u32,
}

impl RunSummary {
    pub fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
    }

    /// Percentage of successful iterations; 0.0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.success_count) * 100.0 / f64::from(self.total)
    }

    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.failure_count) * 100.0 / f64::from(self.total)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {}, success: {} ({:.2}%), failure: {} ({:.2}%)",
            self.total,
            self.success_count,
            self.success_rate(),
            self.failure_count,
            self.failure_rate()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_follow_counts() {
        let mut s = RunSummary::default();
        s.record(true);
        s.record(true);
        s.record(false);
        s.record(true);
        assert_eq!(s.total, 4);
        assert_eq!(s.success_rate(), 75.0);
        assert_eq!(s.failure_rate(), 25.0);
        assert_eq!(s.to_string(), "total: 4, success: 3 (75.00%), failure: 1 (25.00%)");
    }

    #[test]
    fn empty_run_has_zero_rates() {
        let s = RunSummary::default();
        assert_eq!(s.success_rate(), 0.0);
        assert_eq!(s.failure_rate(), 0.0);
    }
}
