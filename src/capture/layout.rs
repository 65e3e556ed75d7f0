//! Layout files and their lookup.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing::{error, instrument, warn};

/// Cell coordinates, `(x, y)` with `y = 0` on the first line of the layout file.
pub type Pos = (usize, usize);

/// Name of the layout shipped inside the binary.
pub const DEFAULT_LAYOUT_NAME: &str = "defaultCapture";

const LAYOUT_EXTENSION: &str = ".lay";
const DEFAULT_CAPTURE: &str = include_str!("../../layouts/defaultCapture.lay");
const MAX_AGENTS: usize = 4;

/// Static map of a capture game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    name: String,
    width: usize,
    height: usize,
    walls: Vec<bool>,
    food: Vec<Pos>,
    capsules: Vec<Pos>,
    agent_starts: Vec<Pos>,
}

impl Layout {
    /// Parse a layout: `%` wall, `.` food, `o` capsule, `1`-`4` agent starts, space empty.
    pub fn parse(name: &str, text: &str) -> anyhow::Result<Layout> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect::<Vec<_>>();
        let lines = match lines.iter().rposition(|line| !line.is_empty()) {
            Some(last) => &lines[..=last],
            None => bail!("layout '{name}' is empty"),
        };

        let width = lines[0].chars().count();
        let height = lines.len();
        let mut walls = Vec::with_capacity(width * height);
        let mut food = vec![];
        let mut capsules = vec![];
        let mut starts: [Option<Pos>; MAX_AGENTS] = [None; MAX_AGENTS];

        for (y, line) in lines.iter().enumerate() {
            let line_width = line.chars().count();
            if line_width != width {
                bail!(
                    "line {} has width {line_width} instead of {width}",
                    y + 1
                );
            }
            for (x, c) in line.chars().enumerate() {
                walls.push(c == '%');
                match c {
                    '%' | ' ' => {}
                    '.' => food.push((x, y)),
                    'o' => capsules.push((x, y)),
                    '1'..='4' => {
                        let index = c as usize - '1' as usize;
                        if starts[index].replace((x, y)).is_some() {
                            bail!("agent {c} placed twice");
                        }
                    }
                    other => bail!("line {}: unexpected character '{other}'", y + 1),
                }
            }
        }

        let count = starts.iter().take_while(|start| start.is_some()).count();
        if starts[count..].iter().any(Option::is_some) {
            bail!("agent starts must be numbered from 1 without gaps");
        }
        if count < 2 {
            bail!("a capture layout needs at least 2 agents, found {count}");
        }
        let agent_starts = starts.iter().flatten().copied().collect();

        Ok(Layout {
            name: name.trim_end_matches(LAYOUT_EXTENSION).to_owned(),
            width,
            height,
            walls,
            food,
            capsules,
            agent_starts,
        })
    }

    /// Layout name, without extension
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Walls, and anything outside the map
    pub fn is_wall(&self, (x, y): Pos) -> bool {
        x >= self.width || y >= self.height || self.walls[y * self.width + x]
    }

    /// Cells that are not walls, row by row
    pub fn open_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(|&pos| !self.is_wall(pos))
    }

    /// Initial food
    pub fn food(&self) -> &[Pos] {
        &self.food
    }

    /// Initial capsules
    pub fn capsules(&self) -> &[Pos] {
        &self.capsules
    }

    /// Start cell of each agent, by agent index
    pub fn agent_starts(&self) -> &[Pos] {
        &self.agent_starts
    }

    /// Red owns the left half.
    pub fn is_red_side(&self, (x, _): Pos) -> bool {
        x < self.width / 2
    }
}

/// Find and parse the layout called `name` under `search_dir`.
///
/// Tried in order: `<dir>/<name>` (when `name` ends with `.lay`), `<dir>/<name>.lay` and
/// `<dir>/layouts/<name>.lay`. [`DEFAULT_LAYOUT_NAME`] falls back to the built-in copy. A layout
/// that exists but does not parse is reported and treated as missing.
#[instrument(skip(search_dir))]
pub fn get_layout(name: &str, search_dir: &Path) -> Option<Layout> {
    for candidate in candidates(name, search_dir) {
        if !candidate.is_file() {
            continue;
        }
        let layout = std::fs::read_to_string(&candidate)
            .with_context(|| format!("could not read {}", candidate.display()))
            .and_then(|text| Layout::parse(name, &text));
        return match layout {
            Ok(layout) => Some(layout),
            Err(e) => {
                error!("invalid layout {}: {e:#}", candidate.display());
                None
            }
        };
    }

    if name == DEFAULT_LAYOUT_NAME {
        match Layout::parse(name, DEFAULT_CAPTURE) {
            Ok(layout) => return Some(layout),
            Err(e) => error!("built-in layout is invalid: {e:#}"),
        }
    }
    warn!("layout '{name}' not found in {}", search_dir.display());
    None
}

fn candidates(name: &str, search_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![];
    let file_name = if name.ends_with(LAYOUT_EXTENSION) {
        candidates.push(search_dir.join(name));
        name.to_owned()
    } else {
        format!("{name}{LAYOUT_EXTENSION}")
    };
    candidates.push(search_dir.join(&file_name));
    candidates.push(search_dir.join("layouts").join(&file_name));
    candidates
}
