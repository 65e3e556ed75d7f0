//! Text rendering of the bottleneck ranking and the session summary.

use std::fmt;

use crate::stats::{Aggregate, SessionTotals};

/// Entries at or below this cumulative time (seconds) are not worth reporting.
pub const DEFAULT_THRESHOLD: f64 = 0.01;
/// Number of bottlenecks shown by default.
pub const DEFAULT_LIMIT: usize = 4;

const RULE_WIDTH: usize = 80;

/// One ranked function.
#[derive(Debug, Clone, PartialEq)]
pub struct Bottleneck {
    /// Function name
    pub name: String,
    /// Cumulative time over the session, in seconds
    pub cumulative_time: f64,
    /// Calls over the session
    pub call_count: u64,
}

/// Functions ranked by cumulative time, slowest first.
///
/// Only entries above `threshold` seconds with at least one call are kept, then the list is cut
/// to `limit`. Equal times keep the order names were first observed in.
pub fn top_bottlenecks(aggregate: &Aggregate, threshold: f64, limit: usize) -> Vec<Bottleneck> {
    let mut entries = aggregate.iter().collect::<Vec<_>>();
    entries.sort_by(|a, b| b.1.cumulative_time_total.cmp(&a.1.cumulative_time_total));
    entries
        .into_iter()
        .filter(|(_, entry)| {
            entry.cumulative_time_total.as_secs_f64() > threshold && entry.call_count_total > 0
        })
        .take(limit)
        .map(|(name, entry)| Bottleneck {
            name: name.to_owned(),
            cumulative_time: entry.cumulative_time_total.as_secs_f64(),
            call_count: entry.call_count_total,
        })
        .collect()
}

/// `name  cumtime s (calls calls, per-call ms/call)`; per-call time is 0 without calls.
pub fn format_bottleneck(name: &str, cumtime: f64, calls: u64) -> String {
    let percall = if calls > 0 {
        (cumtime / calls as f64) * 1000.0
    } else {
        0.0
    };
    format!("{name:<30} {cumtime:>8.4}s ({calls:>6} calls, {percall:>7.2}ms/call)")
}

fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))
}

/// Ranking framed by rules, as printed after the last game.
#[derive(Debug, Clone, Copy)]
pub struct BottleneckBlock<'a>(pub &'a [Bottleneck]);

impl fmt::Display for BottleneckBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        rule(f)?;
        writeln!(f, "KEY BOTTLENECKS (aggregated across all games)")?;
        rule(f)?;
        for b in self.0 {
            writeln!(
                f,
                "{}",
                format_bottleneck(&b.name, b.cumulative_time, b.call_count)
            )?;
        }
        rule(f)?;
        writeln!(f)
    }
}

/// Header, one line per bottleneck, footer and a blank line.
pub fn bottleneck_block(bottlenecks: &[Bottleneck]) -> String {
    BottleneckBlock(bottlenecks).to_string()
}

/// Totals and averages framed by rules.
#[derive(Debug, Clone, Copy)]
pub struct Summary<'a>(pub &'a SessionTotals);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = self.0;
        rule(f)?;
        writeln!(f, "SUMMARY")?;
        rule(f)?;
        writeln!(f, "Total games:     {}", totals.num_games)?;
        writeln!(f, "Total moves:     {}", totals.total_moves)?;
        writeln!(f, "Avg moves/game:  {}", totals.average_moves())?;
        writeln!(f, "Total score:     {:+}", totals.total_score)?;
        writeln!(f, "Avg score/game:  {:+.1}", totals.average_score())?;
        rule(f)?;
        writeln!(f)
    }
}

/// Totals and per-game averages of moves and score.
pub fn summarize(totals: &SessionTotals) -> String {
    Summary(totals).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn aggregate(entries: &[(&str, Duration, u64)]) -> Aggregate {
        let mut aggregate = Aggregate::new();
        for (name, cum, calls) in entries {
            let entry = aggregate.entry_mut(name);
            entry.cumulative_time_total = *cum;
            entry.call_count_total = *calls;
        }
        aggregate
    }

    fn names(bottlenecks: &[Bottleneck]) -> Vec<&str> {
        bottlenecks.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn zero_call_entries_are_dropped() {
        let aggregate = aggregate(&[("foo", Duration::from_secs(5), 0)]);
        assert!(top_bottlenecks(&aggregate, DEFAULT_THRESHOLD, DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn slowest_first() {
        let aggregate = aggregate(&[
            ("a", Duration::from_millis(500), 10),
            ("b", Duration::from_secs(2), 5),
            ("c", Duration::from_millis(20), 1),
        ]);
        let top = top_bottlenecks(&aggregate, DEFAULT_THRESHOLD, DEFAULT_LIMIT);
        assert_eq!(names(&top), vec!["b", "a", "c"]);
        assert_eq!(top[0].cumulative_time, 2.0);
        assert_eq!(top[0].call_count, 5);
    }

    #[test]
    fn threshold_is_strict() {
        let aggregate = aggregate(&[
            ("at", Duration::from_millis(10), 1),
            ("above", Duration::from_nanos(10_000_100), 1),
        ]);
        let top = top_bottlenecks(&aggregate, 0.01, DEFAULT_LIMIT);
        assert_eq!(names(&top), vec!["above"]);
    }

    #[test]
    fn limit_and_stable_ties() {
        let aggregate = aggregate(&[
            ("first", Duration::from_secs(1), 1),
            ("second", Duration::from_secs(1), 1),
            ("slowest", Duration::from_secs(3), 1),
            ("third", Duration::from_secs(1), 1),
            ("fourth", Duration::from_secs(1), 1),
        ]);
        let top = top_bottlenecks(&aggregate, DEFAULT_THRESHOLD, DEFAULT_LIMIT);
        assert_eq!(names(&top), vec!["slowest", "first", "second", "third"]);
        assert_eq!(top_bottlenecks(&aggregate, DEFAULT_THRESHOLD, DEFAULT_LIMIT), top);
        assert!(top_bottlenecks(&aggregate, DEFAULT_THRESHOLD, 0).is_empty());
    }

    #[test]
    fn formats_a_line() {
        let line = format_bottleneck("foo", 1.23456, 100);
        assert_eq!(
            line,
            format!("{:<30}   1.2346s (   100 calls,   12.35ms/call)", "foo")
        );
        assert!(line.starts_with(&format!("foo{}", " ".repeat(27))));
    }

    #[test]
    fn formats_without_calls() {
        let line = format_bottleneck("foo", 5.0, 0);
        assert!(line.ends_with("(     0 calls,    0.00ms/call)"));
    }

    #[test]
    fn block_lists_every_bottleneck() {
        let block = bottleneck_block(&[Bottleneck {
            name: "evaluate".to_owned(),
            cumulative_time: 0.5,
            call_count: 10,
        }]);
        let lines: Vec<_> = block.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[2], "KEY BOTTLENECKS (aggregated across all games)");
        assert!(lines[4].starts_with("evaluate"));
        assert_eq!(lines[5], "=".repeat(80));
    }

    #[test]
    fn summary_without_games() {
        let summary = summarize(&SessionTotals::new(0));
        assert!(summary.contains("Total games:     0\n"));
        assert!(summary.contains("Avg moves/game:  0\n"));
        assert!(summary.contains("Total score:     +0\n"));
        assert!(summary.contains("Avg score/game:  +0.0\n"));
    }

    #[test]
    fn summary_uses_floor_and_signs() {
        let totals = SessionTotals {
            num_games: 4,
            total_moves: 10,
            total_score: -7,
            setup_failures: 0,
        };
        let summary = summarize(&totals);
        assert!(summary.contains("Total moves:     10\n"));
        assert!(summary.contains("Avg moves/game:  2\n"));
        assert!(summary.contains("Total score:     -7\n"));
        assert!(summary.contains("Avg score/game:  -1.8\n"));
    }
}
