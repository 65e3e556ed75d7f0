//! Built-in agents of the capture engine.
//!
//! A team file names one [`Strategy`] per agent. The reflex agents score every legal action
//! with a handful of weighted features and pick the best, breaking ties at random.

use std::{path::Path, str::FromStr};

use anyhow::anyhow;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{instrument, warn};

use super::{
    distancer::Distancer,
    game::{Action, CaptureGame, GameState, Team},
    layout::Pos,
};
use crate::{
    agent_collector::team_file::read_team_file,
    game_interface::{Agent, AgentOptions},
};

/// Food left to eat under which an offensive agent heads home.
const RETREAT_FOOD: usize = 2;

/// Behaviour of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Eats the opponents' food
    Offensive,
    /// Guards its own half and chases invaders
    Defensive,
    /// Any legal action
    Random,
    /// Never moves
    Stop,
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "offensive" => Ok(Strategy::Offensive),
            "defensive" => Ok(Strategy::Defensive),
            "random" => Ok(Strategy::Random),
            "stop" => Ok(Strategy::Stop),
            _ => Err(anyhow!("unknown agent strategy '{s}'")),
        }
    }
}

impl Strategy {
    /// Agent playing this strategy as agent `index`.
    pub fn build(self, index: usize, seed: Option<u64>) -> Box<dyn Agent<CaptureGame>> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_os_rng(),
        };
        match self {
            Strategy::Offensive | Strategy::Defensive => Box::new(ReflexAgent {
                index,
                strategy: self,
                rng,
                start: (0, 0),
                distancer: None,
            }),
            Strategy::Random => Box::new(RandomAgent { index, rng }),
            Strategy::Stop => Box::new(StopAgent),
        }
    }
}

/// Load the agents listed in the team file at `team`.
///
/// Red agents take the even indices, blue agents the odd ones. A file that cannot be read yields a
/// single `None`; an unknown strategy yields `None` at its place.
#[instrument(skip(options))]
pub fn load_agents(
    is_red: bool,
    team: &Path,
    options: &AgentOptions,
) -> Vec<Option<Box<dyn Agent<CaptureGame>>>> {
    let team_file = match read_team_file(team).and_then(|file| file.with_options(options)) {
        Ok(team_file) => team_file,
        Err(e) => {
            warn!("could not load team: {e:#}");
            return vec![None];
        }
    };

    let side = if is_red { 0 } else { 1 };
    team_file
        .agents
        .iter()
        .enumerate()
        .map(|(i, name)| match name.parse::<Strategy>() {
            Ok(strategy) => Some(strategy.build(2 * i + side, team_file.seed)),
            Err(e) => {
                warn!("{e}");
                None
            }
        })
        .collect()
}

enum Features {
    Offensive {
        successor_score: f64,
        distance_to_food: f64,
    },
    Defensive {
        num_invaders: f64,
        on_defense: f64,
        invader_distance: f64,
        stop: f64,
        reverse: f64,
    },
}

impl Features {
    fn weighted(&self) -> f64 {
        match *self {
            Features::Offensive {
                successor_score,
                distance_to_food,
            } => 100.0 * successor_score - distance_to_food,
            Features::Defensive {
                num_invaders,
                on_defense,
                invader_distance,
                stop,
                reverse,
            } => {
                -1000.0 * num_invaders + 100.0 * on_defense - 10.0 * invader_distance
                    - 100.0 * stop
                    - 2.0 * reverse
            }
        }
    }
}

/// Greedy agent evaluating one move ahead.
pub struct ReflexAgent {
    index: usize,
    strategy: Strategy,
    rng: StdRng,
    start: Pos,
    distancer: Option<Distancer>,
}

impl ReflexAgent {
    #[instrument(skip_all, fields(index = self.index))]
    fn choose_action(&mut self, state: &GameState) -> anyhow::Result<Action> {
        let actions = state.legal_actions(self.index);
        if actions.is_empty() {
            return Ok(Action::Stop);
        }
        let values = actions
            .iter()
            .map(|&action| self.evaluate(state, action))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let best_actions = actions
            .iter()
            .zip(&values)
            .filter(|&(_, &value)| value == best)
            .map(|(&action, _)| action)
            .collect::<Vec<_>>();

        let team = Team::of(self.index);
        if self.strategy == Strategy::Offensive
            && state.food_to_eat(team).len() <= RETREAT_FOOD
        {
            let distancer = self.distancer()?;
            let home = actions.iter().copied().min_by_key(|&action| {
                let successor = state.generate_successor(self.index, action);
                distancer.get_distance(successor.position(self.index), self.start)
            });
            if let Some(action) = home {
                return Ok(action);
            }
        }

        Ok(best_actions[self.rng.random_range(0..best_actions.len())])
    }

    #[instrument(level = "trace", skip_all)]
    fn evaluate(&self, state: &GameState, action: Action) -> anyhow::Result<f64> {
        Ok(self.get_features(state, action)?.weighted())
    }

    #[instrument(level = "trace", skip_all)]
    fn get_features(&self, state: &GameState, action: Action) -> anyhow::Result<Features> {
        let distancer = self.distancer()?;
        let successor = state.generate_successor(self.index, action);
        let position = successor.position(self.index);
        let team = Team::of(self.index);

        let features = match self.strategy {
            Strategy::Defensive => {
                let invaders = successor
                    .team_indices(team.opponent())
                    .into_iter()
                    .filter(|&opponent| successor.is_pacman(opponent))
                    .map(|opponent| successor.position(opponent))
                    .collect::<Vec<_>>();
                let invader_distance = invaders
                    .iter()
                    .map(|&invader| distancer.get_distance(position, invader))
                    .min()
                    .map_or(0.0, f64::from);
                Features::Defensive {
                    num_invaders: invaders.len() as f64,
                    on_defense: if successor.is_pacman(self.index) { 0.0 } else { 1.0 },
                    invader_distance,
                    stop: if action == Action::Stop { 1.0 } else { 0.0 },
                    reverse: if action == state.direction(self.index).reverse() {
                        1.0
                    } else {
                        0.0
                    },
                }
            }
            _ => {
                let food = successor.food_to_eat(team);
                let distance_to_food = food
                    .iter()
                    .map(|&pellet| distancer.get_distance(position, pellet))
                    .min()
                    .map_or(0.0, f64::from);
                Features::Offensive {
                    successor_score: -(food.len() as f64),
                    distance_to_food,
                }
            }
        };
        Ok(features)
    }

    fn distancer(&self) -> anyhow::Result<&Distancer> {
        self.distancer
            .as_ref()
            .ok_or_else(|| anyhow!("agent {} was not given the initial state", self.index))
    }
}

impl Agent<CaptureGame> for ReflexAgent {
    #[instrument(skip_all, fields(index = self.index))]
    fn register_initial_state(&mut self, state: &GameState) {
        // no seat on this layout: the agent never plays
        if self.index >= state.num_agents() {
            return;
        }
        self.start = state.position(self.index);
        self.distancer = Some(Distancer::compute_maze_distances(state.layout()));
    }

    fn select_action(&mut self, state: &GameState) -> anyhow::Result<Action> {
        self.choose_action(state)
    }
}

/// Uniformly random legal action.
pub struct RandomAgent {
    index: usize,
    rng: StdRng,
}

impl Agent<CaptureGame> for RandomAgent {
    fn select_action(&mut self, state: &GameState) -> anyhow::Result<Action> {
        let actions = state.legal_actions(self.index);
        if actions.is_empty() {
            return Ok(Action::Stop);
        }
        Ok(actions[self.rng.random_range(0..actions.len())])
    }
}

/// Always `Stop`.
pub struct StopAgent;

impl Agent<CaptureGame> for StopAgent {
    fn select_action(&mut self, _state: &GameState) -> anyhow::Result<Action> {
        Ok(Action::Stop)
    }
}
