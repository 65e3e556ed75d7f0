//! # CTF Profiler
//!
//! Plays the same capture-the-flag match several times with profiling turned on, sums the time
//! spent in every instrumented function over all the games, and prints the slowest ones along
//! with a score summary.
//!
//! It provides:
//! - Session driving and per-run capture (`Profiler`)
//! - A `tracing` layer measuring calls, cumulative and exclusive time per span
//! - Aggregation across runs and the text reports
//! - A built-in capture-the-flag engine behind the `Game` and `GameFactory` traits
//!
//! # Documentation Overview
//!
//! - For the session loop and run outcomes, see the [`profiler`] module.
//! - For how functions are measured, see [`profiling`].
//! - For configuring output, logs and search directories, see
//!   [`Configuration`](crate::configuration::Configuration).
//! - For plugging another engine in, check out the [`Game`](game_interface::Game) and
//!   [`GameFactory`](game_interface::GameFactory) traits.
//! - The built-in engine, its layouts and teams are described in [`capture`].
//!
//! # Usage Example
//!
//! ```no_run
//! use ctf_profiler::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::new().with_verbose(false);
//!     let factory = CaptureFactory::new(config.layouts_dir());
//!     let profiler = Profiler::new(factory, config)?;
//!
//!     let settings = SessionSettings {
//!         num_games: 3,
//!         layout: "tinyCapture".to_owned(),
//!         ..SessionSettings::default()
//!     };
//!     let report = profiler.run_session(&settings, &mut std::io::stdout())?;
//!     for bottleneck in &report.bottlenecks {
//!         println!("{}: {:.3}s", bottleneck.name, bottleneck.cumulative_time);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Any function can show up in the ranking once it carries a span:
//!
//! ```
//! #[tracing::instrument(skip_all)]
//! fn plan_route(_maze: &[u8]) {}
//! ```
#![warn(missing_docs)]

pub mod agent_collector;
pub mod capture;
pub mod configuration;
pub mod game_interface;
mod logger;
pub mod match_runner;
pub mod profiler;
pub mod profiling;
pub mod report;
pub mod stats;
pub use anyhow;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use ctf_profiler::prelude::*;
/// ```
pub mod prelude {
    pub use crate::capture::layout::DEFAULT_LAYOUT_NAME;
    pub use crate::capture::CaptureFactory;
    pub use crate::configuration::Configuration;
    pub use crate::game_interface::{Agent, Game, GameFactory, GameSettings};
    pub use crate::profiler::{
        Profiler, RunResult, SessionReport, SessionSettings, SetupFailure, DEFAULT_NUM_GAMES,
        DEFAULT_TEAM,
    };
    pub use crate::report::{DEFAULT_LIMIT, DEFAULT_THRESHOLD};
}
