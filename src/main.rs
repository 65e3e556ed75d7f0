use std::io;

use clap::Parser;
use ctf_profiler::prelude::*;

/// Play the same capture-the-flag match several times and report where CPU time goes.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Red team: team file, or name of a file in the teams directory
    #[arg(short, long, default_value = DEFAULT_TEAM)]
    red: String,
    /// Blue team: team file, or name of a file in the teams directory
    #[arg(short, long, default_value = DEFAULT_TEAM)]
    blue: String,
    /// Number of games to profile
    #[arg(short, long, default_value_t = DEFAULT_NUM_GAMES)]
    num_games: usize,
    /// Layout name
    #[arg(short, long, default_value = DEFAULT_LAYOUT_NAME)]
    layout: String,
    /// Bottlenecks shown at most
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    top: usize,
    /// Cumulative seconds a function must exceed to be shown
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Configuration::from_env();
    let factory = CaptureFactory::new(config.layouts_dir());
    let profiler = Profiler::new(factory, config)?;

    let settings = SessionSettings {
        red: cli.red,
        blue: cli.blue,
        num_games: cli.num_games,
        layout: cli.layout,
        top: cli.top,
        threshold: cli.threshold,
    };
    profiler.run_session(&settings, &mut io::stdout().lock())?;
    Ok(())
}
