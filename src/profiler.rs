//! Profiling session driver.
//!
//! A session plays the same match `num_games` times. Each game is a *run*: the [`Profiler`]
//! starts a [`ProfileCapture`], loads the layout and both teams through the [`GameFactory`],
//! plays the game to the end, then stops the capture. The run's samples are folded into an
//! [`Aggregate`] before the next run starts, and once every run is done the slowest functions
//! and a score summary are printed.
//!
//! A run whose layout or agents cannot be loaded is not an error: it counts as a game with no
//! moves and a score of zero.

use std::{
    fmt,
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use sysinfo::System;
use tracing::{error, info, instrument, trace, warn};

use crate::{
    agent_collector::{resolve_team_path, team_name},
    configuration::Configuration,
    game_interface::{Agent, AgentOptions, Game, GameFactory, GameSettings, NullDisplay},
    logger::init_logger,
    match_runner::run_game,
    profiling::{ProfileCapture, ProfileSample},
    report::{
        top_bottlenecks, Bottleneck, BottleneckBlock, Summary, DEFAULT_LIMIT, DEFAULT_THRESHOLD,
    },
    stats::{Aggregate, SessionTotals},
};

/// Default team of both sides.
pub const DEFAULT_TEAM: &str = "baseline_team";
/// Default number of games.
pub const DEFAULT_NUM_GAMES: usize = 10;

/// Why a run could not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupFailure {
    /// The factory does not know the layout
    LayoutNotFound {
        /// Requested layout name
        layout: String,
    },
    /// A team produced no agent, or at least one agent failed to load
    AgentLoadFailed {
        /// Resolved team file
        team: PathBuf,
    },
}

impl fmt::Display for SetupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupFailure::LayoutNotFound { layout } => write!(f, "layout '{layout}' not found"),
            SetupFailure::AgentLoadFailed { team } => {
                write!(f, "could not load agents of {}", team.display())
            }
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// The game was played (possibly cut short by an engine error)
    Finished {
        /// Final score, positive favors red
        score: i32,
        /// Moves played
        move_count: usize,
    },
    /// The game never started
    SetupFailed(SetupFailure),
}

impl RunResult {
    /// Final score, 0 for a setup failure
    pub fn score(&self) -> i32 {
        match self {
            RunResult::Finished { score, .. } => *score,
            RunResult::SetupFailed(_) => 0,
        }
    }

    /// Moves played, 0 for a setup failure
    pub fn move_count(&self) -> usize {
        match self {
            RunResult::Finished { move_count, .. } => *move_count,
            RunResult::SetupFailed(_) => 0,
        }
    }
}

/// What a session plays and how much of the ranking it prints.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Red team: file path or name in the teams directory
    pub red: String,
    /// Blue team: file path or name in the teams directory
    pub blue: String,
    /// Number of runs
    pub num_games: usize,
    /// Layout name
    pub layout: String,
    /// Bottlenecks shown at most
    pub top: usize,
    /// Cumulative seconds a function must exceed to be shown
    pub threshold: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            red: DEFAULT_TEAM.to_owned(),
            blue: DEFAULT_TEAM.to_owned(),
            num_games: DEFAULT_NUM_GAMES,
            layout: crate::capture::layout::DEFAULT_LAYOUT_NAME.to_owned(),
            top: DEFAULT_LIMIT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Everything a finished session measured.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Outcome of every run, in order
    pub results: Vec<RunResult>,
    /// Per-function totals over all runs
    pub aggregate: Aggregate,
    /// Ranking that was printed
    pub bottlenecks: Vec<Bottleneck>,
    /// Move and score totals
    pub totals: SessionTotals,
}

/// Plays profiled games built by a [`GameFactory`].
///
/// # Type Parameters
/// - `G`: The game type implementing [`Game`]
/// - `F`: A factory implementing [`GameFactory<G>`]
pub struct Profiler<G: Game, F>
where
    F: GameFactory<G>,
{
    factory: F,
    config: Configuration,
    _ff: PhantomData<G>,
}

impl<G: Game, F: GameFactory<G>> Profiler<G, F> {
    /// Create a [`Profiler`]. Opens the log file when the configuration asks for one.
    #[instrument(skip_all)]
    pub fn new(factory: F, config: Configuration) -> anyhow::Result<Profiler<G, F>> {
        if config.log {
            init_logger()?;
        }
        trace!(?config);

        Ok(Profiler {
            factory,
            config,
            _ff: PhantomData,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Play `settings.num_games` runs and print progress, bottlenecks and summary to `out`.
    ///
    /// # Errors
    /// Only when writing to `out` fails; failing runs are counted, not returned.
    pub fn run_session(
        &self,
        settings: &SessionSettings,
        out: &mut impl Write,
    ) -> anyhow::Result<SessionReport> {
        log_host_info();
        let red = resolve_team_path(&settings.red, &self.config.teams_dir);
        let blue = resolve_team_path(&settings.blue, &self.config.teams_dir);
        info!(?red, ?blue, layout = %settings.layout, num_games = settings.num_games, "session");

        writeln!(out, "Profiling games")?;
        writeln!(out, "Red:  {}", team_name(&red))?;
        writeln!(out, "Blue: {}", team_name(&blue))?;
        writeln!(out, "Games: {}", settings.num_games)?;
        writeln!(out)?;

        let mut aggregate = Aggregate::new();
        let mut totals = SessionTotals::new(settings.num_games);
        let mut results = Vec::with_capacity(settings.num_games);
        for i in 1..=settings.num_games {
            write!(out, "Game {i}/{}... ", settings.num_games)?;
            out.flush()?;

            let (samples, result) = self.run_one(&red, &blue, &settings.layout);
            aggregate.accumulate(&samples);
            totals.record(result.move_count(), result.score());
            if let RunResult::SetupFailed(failure) = &result {
                totals.setup_failures += 1;
                warn!("game {i}: {failure}");
                if self.config.verbose {
                    eprintln!("setup failed: {failure}");
                }
            }
            writeln!(
                out,
                "{} moves, score={:+}",
                result.move_count(),
                result.score()
            )?;
            results.push(result);
        }

        let bottlenecks = top_bottlenecks(&aggregate, settings.threshold, settings.top);
        write!(out, "{}", BottleneckBlock(&bottlenecks))?;
        write!(out, "{}", Summary(&totals))?;
        out.flush()?;
        info!(?totals, "session over");

        Ok(SessionReport {
            results,
            aggregate,
            bottlenecks,
            totals,
        })
    }

    /// Play one profiled game of `red` against `blue` on `layout`.
    ///
    /// The capture covers the whole run, setup included, and is stopped before returning.
    pub fn run_one(
        &self,
        red: &Path,
        blue: &Path,
        layout: &str,
    ) -> (Vec<ProfileSample>, RunResult) {
        let capture = ProfileCapture::new();
        let result = {
            let _guard = capture.start();
            self.play(red, blue, layout)
        };
        (capture.samples(), result)
    }

    fn play(&self, red: &Path, blue: &Path, layout_name: &str) -> RunResult {
        let Some(layout) = self.factory.get_layout(layout_name) else {
            return RunResult::SetupFailed(SetupFailure::LayoutNotFound {
                layout: layout_name.to_owned(),
            });
        };

        let options = AgentOptions::new();
        let Some(red_agents) = all_loaded(self.factory.load_agents(true, red, &options)) else {
            return RunResult::SetupFailed(SetupFailure::AgentLoadFailed {
                team: red.to_path_buf(),
            });
        };
        let Some(blue_agents) = all_loaded(self.factory.load_agents(false, blue, &options)) else {
            return RunResult::SetupFailed(SetupFailure::AgentLoadFailed {
                team: blue.to_path_buf(),
            });
        };

        let agents: Vec<Box<dyn Agent<G>>> = interleave(red_agents, blue_agents);
        let settings = GameSettings::profiling();
        let mut game = self.factory.new_game(&layout, agents.len(), &settings);
        if let Err(e) = run_game(&mut game, agents, &mut NullDisplay, &settings) {
            error!("game stopped early: {e:#}");
        }

        RunResult::Finished {
            score: game.score(),
            move_count: game.move_count(),
        }
    }
}

/// Turn order `first[0], second[0], first[1], second[1], ...`. Extra entries of the longer list
/// are dropped.
pub fn interleave<T>(first: Vec<T>, second: Vec<T>) -> Vec<T> {
    first
        .into_iter()
        .zip(second)
        .flat_map(|(a, b)| [a, b])
        .collect()
}

fn all_loaded<T>(agents: Vec<Option<T>>) -> Option<Vec<T>> {
    if agents.is_empty() {
        return None;
    }
    agents.into_iter().collect()
}

fn log_host_info() {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    sys.refresh_memory();
    info!(
        os = %System::long_os_version().unwrap_or_default(),
        cpus = sys.cpus().len(),
        memory_mb = sys.total_memory() / 1_000_000,
        "host"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaves_like_a_zip() {
        assert_eq!(interleave(vec![0, 2, 4], vec![1, 3]), vec![0, 1, 2, 3]);
        assert_eq!(interleave(vec![0], vec![1, 3, 5]), vec![0, 1]);
        assert!(interleave(Vec::<u8>::new(), vec![1]).is_empty());
    }

    #[test]
    fn any_missing_agent_fails_the_team() {
        assert_eq!(all_loaded(vec![Some(1), Some(2)]), Some(vec![1, 2]));
        assert_eq!(all_loaded(vec![Some(1), None]), None);
        assert_eq!(all_loaded::<u8>(vec![]), None);
    }

    #[test]
    fn setup_failures_are_zero_runs() {
        let failed = RunResult::SetupFailed(SetupFailure::LayoutNotFound {
            layout: "nowhere".to_owned(),
        });
        assert_eq!(failed.score(), 0);
        assert_eq!(failed.move_count(), 0);

        let finished = RunResult::Finished {
            score: -3,
            move_count: 40,
        };
        assert_eq!(finished.score(), -3);
        assert_eq!(finished.move_count(), 40);
    }

    #[test]
    fn failures_explain_themselves() {
        let failure = SetupFailure::AgentLoadFailed {
            team: PathBuf::from("/teams/red.json"),
        };
        assert_eq!(failure.to_string(), "could not load agents of /teams/red.json");
        let failure = SetupFailure::LayoutNotFound {
            layout: "maze".to_owned(),
        };
        assert_eq!(failure.to_string(), "layout 'maze' not found");
    }

    #[test]
    fn default_session() {
        let settings = SessionSettings::default();
        assert_eq!(settings.red, "baseline_team");
        assert_eq!(settings.blue, "baseline_team");
        assert_eq!(settings.num_games, 10);
        assert_eq!(settings.layout, "defaultCapture");
        assert_eq!(settings.top, 4);
        assert_eq!(settings.threshold, 0.01);
    }
}
