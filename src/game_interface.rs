//! Traits a simulation engine implements so the profiler can drive it.
//!
//! The profiler never looks inside a game: it asks a [`GameFactory`] for a layout and for each
//! team's agents, builds a [`Game`], and lets [`run_game`](crate::match_runner::run_game) play it
//! to the end. The built-in capture-the-flag engine lives in [`capture`](crate::capture).

use std::{collections::HashMap, path::Path, time::Duration};

/// Move ceiling used for every profiled game.
pub const DEFAULT_GAME_LENGTH: usize = 1200;

/// Extra key/value options handed to agent loading. The profiler always passes an empty map.
pub type AgentOptions = HashMap<String, String>;

/// What the game should implement
pub trait Game {
    /// Type representing game state.
    type State;
    /// What should be returned by agents to make the game progress.
    type Action: std::fmt::Debug;

    /// Apply an optional action for the current agent.
    ///
    /// `None` means the agent failed to produce an action; the game decides what that costs the
    /// agent but must still hand the turn to the next agent.
    ///
    /// # Error
    /// Returned when `action` is not allowed in the current state.
    fn apply_action(&mut self, action: Option<Self::Action>) -> anyhow::Result<()>;

    /// The current state that will be given to the current agent
    ///
    /// Does not returns &State because of annoying lifetime to deal with.
    fn get_state(&self) -> Self::State;

    /// Index (in turn order) of the agent that should play now
    fn get_current_player_number(&self) -> usize;

    /// True if game is finished
    fn is_finished(&self) -> bool;

    /// Score of the game so far. Positive favors the first side, zero is a tie.
    fn score(&self) -> i32;

    /// Number of moves played so far
    fn move_count(&self) -> usize;
}

/// What the agent should implement.
pub trait Agent<G: Game> {
    /// Called once with the initial state before the first move.
    fn register_initial_state(&mut self, _state: &G::State) {}

    /// Choose the next action. An error (or a panic) is contained by the runner when
    /// [`GameSettings::catch_exceptions`] is set.
    fn select_action(&mut self, state: &G::State) -> anyhow::Result<G::Action>;
}

/// Receives every state of a running game.
pub trait Display<G: Game> {
    /// First state, before any move
    fn initialize(&mut self, _state: &G::State) {}
    /// State after each applied action
    fn update(&mut self, _state: &G::State) {}
    /// Game is over
    fn finish(&mut self) {}
}

/// Display that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl<G: Game> Display<G> for NullDisplay {}

/// Parameters of a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    /// Move ceiling
    pub length: usize,
    /// Suppress what agents produce besides their actions
    pub mute_agents: bool,
    /// Contain agent errors and panics instead of aborting the game
    pub catch_exceptions: bool,
    /// Pause between two moves
    pub delay: Duration,
}

impl GameSettings {
    /// Settings used for profiled runs: 1200 moves, muted agents, contained failures, no delay.
    pub fn profiling() -> Self {
        Self {
            length: DEFAULT_GAME_LENGTH,
            mute_agents: true,
            catch_exceptions: true,
            delay: Duration::ZERO,
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::profiling()
    }
}

/// What will be given to the profiler to allow it to create games
pub trait GameFactory<G: Game> {
    /// Parsed static map.
    type Layout;

    /// Look a layout up by name. `None` when it cannot be found or read.
    fn get_layout(&self, name: &str) -> Option<Self::Layout>;

    /// Load one team's agents from `team`. Any `None` entry means that agent failed to load.
    fn load_agents(
        &self,
        is_red: bool,
        team: &Path,
        options: &AgentOptions,
    ) -> Vec<Option<Box<dyn Agent<G>>>>;

    /// Returns an initialized game for `num_agents` agents in turn order
    fn new_game(&self, layout: &Self::Layout, num_agents: usize, settings: &GameSettings) -> G;
}

#[cfg(test)]
mod interface_tests {
    use super::*;

    struct DummyGame {
        moves: usize,
    }

    impl Game for DummyGame {
        type State = String;
        type Action = ();

        fn apply_action(&mut self, _action: Option<()>) -> anyhow::Result<()> {
            self.moves += 1;
            Ok(())
        }

        fn is_finished(&self) -> bool {
            false
        }

        fn get_state(&self) -> String {
            "".to_owned()
        }

        fn get_current_player_number(&self) -> usize {
            0
        }

        fn score(&self) -> i32 {
            0
        }

        fn move_count(&self) -> usize {
            self.moves
        }
    }

    struct DummyAgent {}

    impl Agent<DummyGame> for DummyAgent {
        fn select_action(&mut self, _state: &String) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dyn_agent() {
        let game = DummyGame { moves: 0 };
        let mut agent: Box<dyn Agent<DummyGame>> = Box::new(DummyAgent {});
        assert!(agent.select_action(&game.get_state()).is_ok());
    }

    #[test]
    fn test_null_display_accepts_states() {
        let mut game = DummyGame { moves: 0 };
        let mut display: Box<dyn Display<DummyGame>> = Box::new(NullDisplay);
        display.initialize(&game.get_state());
        game.apply_action(None).unwrap();
        display.update(&game.get_state());
        display.finish();
        assert_eq!(game.move_count(), 1);
    }

    #[test]
    fn profiling_settings() {
        let settings = GameSettings::profiling();
        assert_eq!(settings.length, 1200);
        assert!(settings.mute_agents);
        assert!(settings.catch_exceptions);
        assert!(settings.delay.is_zero());
    }
}
