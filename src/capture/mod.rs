//! Built-in capture-the-flag engine.
//!
//! Two teams share a maze split down the middle. An agent is a ghost on its own half and a
//! pacman on the other one, where it eats food and capsules. Food only scores once carried
//! back home; a pacman caught by a ghost drops what it carries. Eating a capsule scares the
//! other team's ghosts for [`SCARED_TIME`](game::SCARED_TIME) moves, during which they can be
//! eaten. Red plays the left half and even agent indices; a positive score favors red.

use std::{path::PathBuf, sync::Arc};

use tracing::instrument;

use crate::game_interface::{Agent, AgentOptions, GameFactory, GameSettings};

pub mod agents;
pub mod distancer;
pub mod game;
pub mod layout;

pub use game::{Action, CaptureGame, GameState};
pub use layout::Layout;

/// Builds capture games from layouts found under a directory.
#[derive(Debug, Clone)]
pub struct CaptureFactory {
    layouts_dir: PathBuf,
}

impl CaptureFactory {
    /// Factory looking layouts up in `layouts_dir`.
    pub fn new(layouts_dir: impl Into<PathBuf>) -> Self {
        Self {
            layouts_dir: layouts_dir.into(),
        }
    }
}

impl GameFactory<CaptureGame> for CaptureFactory {
    type Layout = Arc<Layout>;

    fn get_layout(&self, name: &str) -> Option<Arc<Layout>> {
        layout::get_layout(name, &self.layouts_dir).map(Arc::new)
    }

    fn load_agents(
        &self,
        is_red: bool,
        team: &std::path::Path,
        options: &AgentOptions,
    ) -> Vec<Option<Box<dyn Agent<CaptureGame>>>> {
        agents::load_agents(is_red, team, options)
    }

    #[instrument(skip(self, layout, settings), fields(map = layout.name()))]
    fn new_game(
        &self,
        layout: &Arc<Layout>,
        num_agents: usize,
        settings: &GameSettings,
    ) -> CaptureGame {
        CaptureGame::new(Arc::clone(layout), num_agents, settings.length)
    }
}
