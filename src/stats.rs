//! Cross-run accumulation of profiling samples and game outcomes.

use std::{collections::HashMap, time::Duration};

use crate::profiling::ProfileSample;

/// Totals of one function name over the whole session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregateEntry {
    /// Sum of cumulative times
    pub cumulative_time_total: Duration,
    /// Sum of exclusive times
    pub exclusive_time_total: Duration,
    /// Sum of call counts
    pub call_count_total: u64,
}

impl AggregateEntry {
    fn add(&mut self, sample: &ProfileSample) {
        self.cumulative_time_total += sample.cumulative_time;
        self.exclusive_time_total += sample.exclusive_time;
        self.call_count_total += sample.call_count;
    }
}

/// Function name -> [`AggregateEntry`], remembering the order names were first seen.
///
/// Times are integer nanoseconds, so the totals do not depend on the order runs are folded in.
#[derive(Debug, Default, Clone)]
pub struct Aggregate {
    index: HashMap<String, usize>,
    entries: Vec<(String, AggregateEntry)>,
}

impl Aggregate {
    /// Empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `name`, created with zero totals if this is the first observation.
    pub fn entry_mut(&mut self, name: &str) -> &mut AggregateEntry {
        let pos = match self.index.get(name) {
            Some(&pos) => pos,
            None => {
                self.index.insert(name.to_owned(), self.entries.len());
                self.entries
                    .push((name.to_owned(), AggregateEntry::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Fold one run's samples in.
    pub fn accumulate(&mut self, samples: &[ProfileSample]) {
        for sample in samples {
            self.entry_mut(&sample.name).add(sample);
        }
    }

    /// Totals for `name`, if it was ever observed.
    pub fn get(&self, name: &str) -> Option<&AggregateEntry> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    /// Entries in first-observation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregateEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was accumulated
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Running sums of game outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionTotals {
    /// Number of games requested
    pub num_games: usize,
    /// Sum of move counts
    pub total_moves: usize,
    /// Sum of scores
    pub total_score: i64,
    /// Runs that could not start (missing layout or agents)
    pub setup_failures: usize,
}

impl SessionTotals {
    /// No game played yet out of `num_games`.
    pub fn new(num_games: usize) -> Self {
        Self {
            num_games,
            ..Self::default()
        }
    }

    /// Count one run's outcome.
    pub fn record(&mut self, move_count: usize, score: i32) {
        self.total_moves += move_count;
        self.total_score += i64::from(score);
    }

    /// Floor of moves per game, 0 without games.
    pub fn average_moves(&self) -> usize {
        if self.num_games == 0 {
            0
        } else {
            self.total_moves / self.num_games
        }
    }

    /// Score per game, 0.0 without games.
    pub fn average_score(&self) -> f64 {
        if self.num_games == 0 {
            0.0
        } else {
            self.total_score as f64 / self.num_games as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    fn sample(name: &str, cum_ms: u64, excl_ms: u64, calls: u64) -> ProfileSample {
        ProfileSample {
            name: name.to_owned(),
            location: "game.rs:1".to_owned(),
            call_count: calls,
            cumulative_time: Duration::from_millis(cum_ms),
            exclusive_time: Duration::from_millis(excl_ms),
        }
    }

    fn runs() -> Vec<Vec<ProfileSample>> {
        vec![
            vec![sample("run_game", 900, 10, 1), sample("evaluate", 400, 250, 321)],
            vec![sample("evaluate", 123, 100, 77), sample("distance", 7, 7, 1_000)],
            vec![],
            vec![
                sample("run_game", 1_100, 12, 1),
                sample("distance", 3, 3, 500),
                sample("evaluate", 0, 0, 0),
            ],
        ]
    }

    #[test]
    fn accumulates_by_name() {
        let mut aggregate = Aggregate::new();
        for run in runs() {
            aggregate.accumulate(&run);
        }

        assert_eq!(aggregate.len(), 3);
        let evaluate = aggregate.get("evaluate").unwrap();
        assert_eq!(evaluate.cumulative_time_total, Duration::from_millis(523));
        assert_eq!(evaluate.exclusive_time_total, Duration::from_millis(350));
        assert_eq!(evaluate.call_count_total, 398);
        // absent from run 1, still summed
        assert_eq!(
            aggregate.get("distance").unwrap().call_count_total,
            1_500
        );
        assert!(aggregate.get("missing").is_none());
    }

    #[test]
    fn first_observation_order_is_kept() {
        let mut aggregate = Aggregate::new();
        for run in runs() {
            aggregate.accumulate(&run);
        }
        let names: Vec<_> = aggregate.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["run_game", "evaluate", "distance"]);
    }

    #[test]
    fn entry_mut_starts_at_zero() {
        let mut aggregate = Aggregate::new();
        assert!(aggregate.is_empty());
        assert_eq!(*aggregate.entry_mut("new"), AggregateEntry::default());
        aggregate.entry_mut("new").call_count_total += 2;
        assert_eq!(aggregate.get("new").unwrap().call_count_total, 2);
        assert_eq!(aggregate.len(), 1);
    }

    #[test]
    fn run_order_does_not_matter() {
        let mut reference = Aggregate::new();
        for run in runs() {
            reference.accumulate(&run);
        }

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let mut shuffled = runs();
            shuffled.shuffle(&mut rng);
            let mut aggregate = Aggregate::new();
            for run in &shuffled {
                aggregate.accumulate(run);
            }
            for (name, entry) in reference.iter() {
                assert_eq!(aggregate.get(name), Some(entry));
            }
            assert_eq!(aggregate.len(), reference.len());
        }
    }

    #[test]
    fn duplicate_names_in_one_run_are_summed() {
        let mut aggregate = Aggregate::new();
        aggregate.accumulate(&[sample("new", 1, 1, 1), sample("new", 2, 2, 2)]);
        let entry = aggregate.get("new").unwrap();
        assert_eq!(entry.call_count_total, 3);
        assert_eq!(entry.cumulative_time_total, Duration::from_millis(3));
    }

    #[test]
    fn averages() {
        let empty = SessionTotals::new(0);
        assert_eq!(empty.average_moves(), 0);
        assert_eq!(empty.average_score(), 0.0);

        let mut totals = SessionTotals::new(4);
        totals.record(4, 3);
        totals.record(6, -1);
        assert_eq!(totals.total_moves, 10);
        assert_eq!(totals.average_moves(), 2);
        assert_eq!(totals.total_score, 2);
        assert_eq!(totals.average_score(), 0.5);
    }
}
