//! Per-phase timing: accumulate wall-clock samples in-process
//! (`Timer::time`) and reduce them to min/max/mean/median on demand.

use std::fmt;
use std::time::{Duration, Instant};

pub struct Stats {
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub median: Duration,
    pub runs: usize,
}

impl Stats {
    #[must_use]
    pub fn mean_ms(&self) -> f64 {
        self.mean.as_secs_f64() * 1000.0
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean: {:>8.3}ms  min: {:>8.3}ms  max: {:>8.3}ms  median: {:>8.3}ms  (n={})",
            self.mean_ms(),
            self.min.as_secs_f64() * 1000.0,
            self.max.as_secs_f64() * 1000.0,
            self.median.as_secs_f64() * 1000.0,
            self.runs,
        )
    }
}

#[must_use]
pub fn compute_stats(durations: &[Duration]) -> Option<Stats> {
    if durations.is_empty() {
        return None;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_unstable();
    let total: Duration = sorted.iter().sum();
    #[allow(clippy::cast_possible_truncation)]
    let n = sorted.len() as u32;
    Some(Stats {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: total / n,
        median: sorted[sorted.len() / 2],
        runs: sorted.len(),
    })
}

/// One phase's reusable stopwatch: accumulates a duration per call and
/// reduces them to summary stats on request.
#[derive(Default)]
pub struct Timer {
    durations: Vec<Duration>,
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.durations.push(start.elapsed());
        result
    }

    #[must_use]
    pub fn stats(&self) -> Option<Stats> {
        compute_stats(&self.durations)
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_stats, Timer};
    use std::time::Duration;

    #[test]
    fn empty_durations_have_no_stats() {
        assert!(compute_stats(&[]).is_none());
    }

    #[test]
    fn stats_over_three_samples() {
        let stats = compute_stats(&[Duration::from_millis(1), Duration::from_millis(3), Duration::from_millis(2)]).unwrap();
        assert_eq!(stats.runs, 3);
        assert_eq!(stats.min, Duration::from_millis(1));
        assert_eq!(stats.max, Duration::from_millis(3));
        assert_eq!(stats.median, Duration::from_millis(2));
    }

    #[test]
    fn timer_accumulates_each_call() {
        let mut timer = Timer::new();
        timer.time(|| 1 + 1);
        timer.time(|| 2 + 2);
        assert_eq!(timer.stats().unwrap().runs, 2);
    }
}
