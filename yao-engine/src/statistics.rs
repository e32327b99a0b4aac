//! Wall-clock timings of executor phases.

use serde::Serialize;
use std::{collections::BTreeMap, fmt, time::Duration};

/// The phases the executor times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatId {
    /// The preprocessing callback.
    Preprocessing,
    /// The setup sweep.
    GatesSetup,
    /// The synchronization callback.
    SynchronizationWait,
    /// The online sweep.
    GatesOnline,
    /// A combined setup and online sweep.
    Evaluate,
}

impl StatId {
    /// Every phase, in display order.
    pub const ALL: [StatId; 5] = [
        StatId::Preprocessing,
        StatId::GatesSetup,
        StatId::SynchronizationWait,
        StatId::GatesOnline,
        StatId::Evaluate,
    ];

    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            StatId::Preprocessing => "preprocessing",
            StatId::GatesSetup => "gates setup",
            StatId::SynchronizationWait => "synchronization wait",
            StatId::GatesOnline => "gates online",
            StatId::Evaluate => "evaluate",
        }
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// Timings of a single run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunTimeStats {
    durations: BTreeMap<StatId, Duration>,
}

impl RunTimeStats {
    /// No timings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed` to the time spent in `id`.
    pub fn record(&mut self, id: StatId, elapsed: Duration) {
        *self.durations.entry(id).or_default() += elapsed;
    }

    /// Time spent in `id`, if it ran.
    pub fn get(&self, id: StatId) -> Option<Duration> {
        self.durations.get(&id).copied()
    }

    /// Sum over all phases.
    pub fn total(&self) -> Duration {
        self.durations.values().sum()
    }

    /// Recorded phases and their timings.
    pub fn iter(&self) -> impl Iterator<Item = (StatId, Duration)> + '_ {
        self.durations.iter().map(|(k, v)| (*k, *v))
    }
}

/// Timings of repeated runs.
#[derive(Clone, Debug, Default)]
pub struct AccumulatedRunTimeStats {
    count: usize,
    samples: BTreeMap<StatId, Vec<Duration>>,
}

fn millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1e6
}

impl AccumulatedRunTimeStats {
    /// No runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one more run.
    pub fn add(&mut self, run: &RunTimeStats) {
        self.count += 1;
        for (id, d) in run.iter() {
            self.samples.entry(id).or_default().push(d);
        }
    }

    /// Number of runs added.
    pub fn count(&self) -> usize {
        self.count
    }

    fn samples_ms(&self, id: StatId) -> Option<Vec<f64>> {
        self.samples
            .get(&id)
            .filter(|s| !s.is_empty())
            .map(|s| s.iter().copied().map(millis).collect())
    }

    /// Mean time of `id` in milliseconds.
    pub fn mean(&self, id: StatId) -> Option<f64> {
        let s = self.samples_ms(id)?;
        Some(s.iter().sum::<f64>() / s.len() as f64)
    }

    /// Median time of `id` in milliseconds.
    pub fn median(&self, id: StatId) -> Option<f64> {
        let mut s = self.samples_ms(id)?;
        s.sort_by(|a, b| a.total_cmp(b));
        let mid = s.len() / 2;
        if s.len() % 2 == 0 {
            Some((s[mid - 1] + s[mid]) / 2.0)
        } else {
            Some(s[mid])
        }
    }

    /// Sample standard deviation of `id` in milliseconds. Zero for a single
    /// run.
    pub fn stddev(&self, id: StatId) -> Option<f64> {
        let s = self.samples_ms(id)?;
        if s.len() < 2 {
            return Some(0.0);
        }
        let mean = s.iter().sum::<f64>() / s.len() as f64;
        let var = s.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (s.len() - 1) as f64;
        Some(var.sqrt())
    }

    /// Print a table of all recorded phases to stdout.
    pub fn print_human_readable(&self) {
        print!("{}", self);
    }

    /// Summary as JSON, times in milliseconds.
    pub fn to_json(&self) -> serde_json::Value {
        let phases: serde_json::Map<String, serde_json::Value> = StatId::ALL
            .iter()
            .filter_map(|id| {
                Some((
                    id.name().replace(' ', "_"),
                    serde_json::json!({
                        "mean_ms": self.mean(*id)?,
                        "median_ms": self.median(*id)?,
                        "stddev_ms": self.stddev(*id)?,
                    }),
                ))
            })
            .collect();
        serde_json::json!({
            "repetitions": self.count,
            "phases": phases,
        })
    }
}

impl fmt::Display for AccumulatedRunTimeStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "run-time statistics over {} runs (ms)", self.count)?;
        writeln!(
            f,
            "{:<24}{:>12}{:>12}{:>12}",
            "phase", "mean", "median", "stddev"
        )?;
        for id in StatId::ALL.iter() {
            if let (Some(mean), Some(median), Some(stddev)) =
                (self.mean(*id), self.median(*id), self.stddev(*id))
            {
                writeln!(
                    f,
                    "{:<24}{:>12.3}{:>12.3}{:>12.3}",
                    id.name(),
                    mean,
                    median,
                    stddev
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(ms: &[(StatId, u64)]) -> RunTimeStats {
        let mut stats = RunTimeStats::new();
        for (id, t) in ms {
            stats.record(*id, Duration::from_millis(*t));
        }
        stats
    }

    #[test]
    fn test_record_accumulates() {
        let mut stats = run(&[(StatId::GatesSetup, 2)]);
        stats.record(StatId::GatesSetup, Duration::from_millis(3));
        assert_eq!(stats.get(StatId::GatesSetup), Some(Duration::from_millis(5)));
        assert_eq!(stats.get(StatId::GatesOnline), None);
        assert_eq!(stats.total(), Duration::from_millis(5));
    }

    #[test]
    fn test_mean_median_stddev() {
        let mut acc = AccumulatedRunTimeStats::new();
        for t in [1, 2, 3, 10] {
            acc.add(&run(&[(StatId::Evaluate, t)]));
        }
        assert_eq!(acc.count(), 4);
        assert!((acc.mean(StatId::Evaluate).unwrap() - 4.0).abs() < 1e-9);
        assert!((acc.median(StatId::Evaluate).unwrap() - 2.5).abs() < 1e-9);
        // Sample variance of 1, 2, 3, 10 is 50 / 3.
        let expected = (50.0f64 / 3.0).sqrt();
        assert!((acc.stddev(StatId::Evaluate).unwrap() - expected).abs() < 1e-9);
        assert_eq!(acc.mean(StatId::GatesOnline), None);
    }

    #[test]
    fn test_json_and_table() {
        let mut acc = AccumulatedRunTimeStats::new();
        acc.add(&run(&[(StatId::GatesSetup, 4), (StatId::GatesOnline, 6)]));
        let json = acc.to_json();
        assert_eq!(json["repetitions"], 1);
        assert_eq!(json["phases"]["gates_setup"]["mean_ms"], 4.0);
        assert_eq!(json["phases"]["gates_online"]["stddev_ms"], 0.0);
        assert!(json["phases"].get("evaluate").is_none());
        let table = acc.to_string();
        assert!(table.contains("gates setup"));
        assert!(!table.contains("evaluate"));
    }
}
