//! Rules and state of a capture game.

use std::sync::Arc;

use anyhow::bail;
use tracing::instrument;

use super::layout::{Layout, Pos};
use crate::game_interface::Game;

/// Moves an agent's opponents stay scared after a capsule is eaten.
pub const SCARED_TIME: u32 = 40;
/// Food a team may leave uneaten and still win by returning everything else.
pub const MIN_FOOD: usize = 2;

/// What an agent can do on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// y - 1
    North,
    /// y + 1
    South,
    /// x + 1
    East,
    /// x - 1
    West,
    /// Stay
    Stop,
}

impl Action {
    /// Every action, `Stop` last.
    pub const ALL: [Action; 5] = [
        Action::North,
        Action::South,
        Action::East,
        Action::West,
        Action::Stop,
    ];

    /// Opposite direction; `Stop` stays `Stop`.
    pub fn reverse(self) -> Action {
        match self {
            Action::North => Action::South,
            Action::South => Action::North,
            Action::East => Action::West,
            Action::West => Action::East,
            Action::Stop => Action::Stop,
        }
    }

    /// Cell reached from `pos`, `None` when leaving the grid.
    pub fn step(self, (x, y): Pos) -> Option<Pos> {
        match self {
            Action::North => y.checked_sub(1).map(|y| (x, y)),
            Action::South => Some((x, y + 1)),
            Action::East => Some((x + 1, y)),
            Action::West => x.checked_sub(1).map(|x| (x, y)),
            Action::Stop => Some((x, y)),
        }
    }
}

/// Side of an agent. Even indices play red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    /// Left half, positive score
    Red,
    /// Right half, negative score
    Blue,
}

impl Team {
    /// Team of agent `index`
    pub fn of(index: usize) -> Team {
        if index % 2 == 0 {
            Team::Red
        } else {
            Team::Blue
        }
    }

    /// The other team
    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    fn slot(self) -> usize {
        match self {
            Team::Red => 0,
            Team::Blue => 1,
        }
    }

    fn sign(self) -> i32 {
        match self {
            Team::Red => 1,
            Team::Blue => -1,
        }
    }
}

/// Full state of a capture game.
#[derive(Debug, Clone)]
pub struct GameState {
    layout: Arc<Layout>,
    positions: Vec<Pos>,
    directions: Vec<Action>,
    carrying: Vec<Vec<Pos>>,
    scared_timers: Vec<u32>,
    food: Vec<bool>,
    capsules: Vec<Pos>,
    score: i32,
    returned: [usize; 2],
    food_goal: [usize; 2],
    move_count: usize,
    length: usize,
}

impl GameState {
    /// Initial state with the first `num_agents` starts of `layout` (at most all of them).
    pub fn new(layout: Arc<Layout>, num_agents: usize, length: usize) -> Self {
        let positions: Vec<Pos> = layout
            .agent_starts()
            .iter()
            .copied()
            .take(num_agents)
            .collect();
        let n = positions.len();
        let mut food = vec![false; layout.width() * layout.height()];
        for &(x, y) in layout.food() {
            food[y * layout.width() + x] = true;
        }

        let mut state = Self {
            positions,
            directions: vec![Action::Stop; n],
            carrying: vec![vec![]; n],
            scared_timers: vec![0; n],
            food,
            capsules: layout.capsules().to_vec(),
            score: 0,
            returned: [0; 2],
            food_goal: [0; 2],
            move_count: 0,
            length,
            layout,
        };
        for team in [Team::Red, Team::Blue] {
            let available = state.food_to_eat(team).len();
            state.food_goal[team.slot()] = available.saturating_sub(MIN_FOOD).max(1);
        }
        state
    }

    /// Map of the game
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of agents on the board
    pub fn num_agents(&self) -> usize {
        self.positions.len()
    }

    /// Cell of agent `index`
    pub fn position(&self, index: usize) -> Pos {
        self.positions[index]
    }

    /// Last action of agent `index`
    pub fn direction(&self, index: usize) -> Action {
        self.directions[index]
    }

    /// Positive favors red
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Moves played so far
    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Moves left before the ceiling
    pub fn time_left(&self) -> usize {
        self.length.saturating_sub(self.move_count)
    }

    /// Remaining moves of fear of agent `index`
    pub fn scared_timer(&self, index: usize) -> u32 {
        self.scared_timers[index]
    }

    /// Food agent `index` carries and has not brought home yet
    pub fn carrying(&self, index: usize) -> usize {
        self.carrying[index].len()
    }

    /// Food returned home by `team`
    pub fn returned(&self, team: Team) -> usize {
        self.returned[team.slot()]
    }

    /// Agents of `team`
    pub fn team_indices(&self, team: Team) -> Vec<usize> {
        (0..self.num_agents())
            .filter(|&i| Team::of(i) == team)
            .collect()
    }

    /// An agent on the opponents' half is a pacman, otherwise a ghost.
    pub fn is_pacman(&self, index: usize) -> bool {
        let on_red_side = self.layout.is_red_side(self.positions[index]);
        on_red_side != (Team::of(index) == Team::Red)
    }

    /// Food on the board at `pos`
    pub fn has_food(&self, (x, y): Pos) -> bool {
        x < self.layout.width() && y < self.layout.height() && self.food[y * self.layout.width() + x]
    }

    /// Food `team` can eat: what lies on the opponents' half.
    pub fn food_to_eat(&self, team: Team) -> Vec<Pos> {
        self.food_on_side(team.opponent())
    }

    /// Food `team` protects: what lies on its own half.
    pub fn food_to_defend(&self, team: Team) -> Vec<Pos> {
        self.food_on_side(team)
    }

    fn food_on_side(&self, side: Team) -> Vec<Pos> {
        let width = self.layout.width();
        self.food
            .iter()
            .enumerate()
            .filter(|&(_, &present)| present)
            .map(|(cell, _)| (cell % width, cell / width))
            .filter(|&pos| self.layout.is_red_side(pos) == (side == Team::Red))
            .collect()
    }

    /// Capsules still on the board
    pub fn capsules(&self) -> &[Pos] {
        &self.capsules
    }

    /// Ceiling reached, or a team brought back all the food it needed.
    pub fn is_over(&self) -> bool {
        self.move_count >= self.length
            || [Team::Red, Team::Blue]
                .iter()
                .any(|team| self.returned[team.slot()] >= self.food_goal[team.slot()])
    }

    /// Actions that do not walk into a wall.
    #[instrument(level = "trace", skip(self))]
    pub fn legal_actions(&self, index: usize) -> Vec<Action> {
        let pos = self.positions[index];
        Action::ALL
            .into_iter()
            .filter(|action| self.is_legal(pos, *action))
            .collect()
    }

    fn is_legal(&self, pos: Pos, action: Action) -> bool {
        action
            .step(pos)
            .is_some_and(|next| !self.layout.is_wall(next))
    }

    /// State after agent `index` plays `action`. An illegal action counts as `Stop`.
    #[instrument(level = "trace", skip(self))]
    pub fn generate_successor(&self, index: usize, action: Action) -> GameState {
        let mut successor = self.clone();
        successor.apply(index, action);
        successor
    }

    fn apply(&mut self, index: usize, action: Action) {
        let pos = self.positions[index];
        let action = if self.is_legal(pos, action) {
            action
        } else {
            Action::Stop
        };
        let next = action.step(pos).unwrap_or(pos);
        self.positions[index] = next;
        self.directions[index] = action;

        let team = Team::of(index);
        if self.is_pacman(index) {
            let cell = self.cell(next);
            if self.food[cell] {
                self.food[cell] = false;
                self.carrying[index].push(next);
            }
            if let Some(i) = self.capsules.iter().position(|&c| c == next) {
                self.capsules.swap_remove(i);
                for opponent in self.team_indices(team.opponent()) {
                    self.scared_timers[opponent] = SCARED_TIME;
                }
            }
        } else if !self.carrying[index].is_empty() {
            let returned = std::mem::take(&mut self.carrying[index]).len();
            self.returned[team.slot()] += returned;
            self.score += team.sign() * returned as i32;
        }

        self.check_collisions(index);
        self.scared_timers[index] = self.scared_timers[index].saturating_sub(1);
        self.move_count += 1;
    }

    fn check_collisions(&mut self, index: usize) {
        let pos = self.positions[index];
        for other in self.team_indices(Team::of(index).opponent()) {
            if self.positions[other] != pos {
                continue;
            }
            let (pacman, ghost) = if self.is_pacman(index) {
                (index, other)
            } else {
                (other, index)
            };
            if self.scared_timers[ghost] > 0 {
                self.respawn(ghost);
            } else {
                self.respawn(pacman);
            }
            if self.positions[index] != pos {
                break;
            }
        }
    }

    fn respawn(&mut self, index: usize) {
        for pos in std::mem::take(&mut self.carrying[index]) {
            let cell = self.cell(pos);
            self.food[cell] = true;
        }
        self.positions[index] = self.layout.agent_starts()[index];
        self.directions[index] = Action::Stop;
        self.scared_timers[index] = 0;
    }

    fn cell(&self, (x, y): Pos) -> usize {
        y * self.layout.width() + x
    }
}

/// A capture game: agents play in index order until [`GameState::is_over`].
#[derive(Debug, Clone)]
pub struct CaptureGame {
    state: GameState,
    current: usize,
}

impl CaptureGame {
    /// New game on `layout` for `num_agents` agents and at most `length` moves.
    pub fn new(layout: Arc<Layout>, num_agents: usize, length: usize) -> Self {
        Self {
            state: GameState::new(layout, num_agents, length),
            current: 0,
        }
    }

    /// Current state, without cloning
    pub fn state(&self) -> &GameState {
        &self.state
    }
}

impl Game for CaptureGame {
    type State = GameState;
    type Action = Action;

    #[instrument(skip_all, fields(agent = self.current))]
    fn apply_action(&mut self, action: Option<Action>) -> anyhow::Result<()> {
        let agent = self.current;
        self.current = (self.current + 1) % self.state.num_agents().max(1);

        let action = action.unwrap_or(Action::Stop);
        let pos = self.state.position(agent);
        let legal = self.state.is_legal(pos, action);
        self.state.apply(agent, action);
        if !legal {
            bail!("agent {agent} cannot move {action:?} from {pos:?}");
        }
        Ok(())
    }

    fn get_state(&self) -> GameState {
        self.state.clone()
    }

    fn get_current_player_number(&self) -> usize {
        self.current
    }

    fn is_finished(&self) -> bool {
        self.state.num_agents() == 0 || self.state.is_over()
    }

    fn score(&self) -> i32 {
        self.state.score()
    }

    fn move_count(&self) -> usize {
        self.state.move_count()
    }
}
