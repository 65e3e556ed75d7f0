//! All-pairs maze distances.

use std::collections::VecDeque;

use tracing::instrument;

use super::layout::{Layout, Pos};

/// Maze distances between every pair of open cells.
#[derive(Debug, Clone)]
pub struct Distancer {
    width: usize,
    num_cells: usize,
    /// Open-cell index of each grid cell
    slots: Vec<Option<usize>>,
    /// Row-major `open x open` matrix, `u32::MAX` when unreachable
    distances: Vec<u32>,
}

impl Distancer {
    /// Breadth-first search from every open cell of `layout`.
    #[instrument(skip_all, fields(layout = layout.name()))]
    pub fn compute_maze_distances(layout: &Layout) -> Distancer {
        let width = layout.width();
        let mut slots = vec![None; width * layout.height()];
        let cells: Vec<Pos> = layout.open_cells().collect();
        for (slot, &(x, y)) in cells.iter().enumerate() {
            slots[y * width + x] = Some(slot);
        }

        let n = cells.len();
        let mut distances = vec![u32::MAX; n * n];
        let mut queue = VecDeque::new();
        for source in 0..n {
            let row = &mut distances[source * n..(source + 1) * n];
            row[source] = 0;
            queue.push_back(cells[source]);
            while let Some((x, y)) = queue.pop_front() {
                let Some(here) = slots[y * width + x] else {
                    continue;
                };
                let next_distance = row[here] + 1;
                let neighbors = [
                    (x, y.wrapping_sub(1)),
                    (x, y + 1),
                    (x + 1, y),
                    (x.wrapping_sub(1), y),
                ];
                for neighbor in neighbors {
                    if layout.is_wall(neighbor) {
                        continue;
                    }
                    if let Some(slot) = slots[neighbor.1 * width + neighbor.0] {
                        if row[slot] == u32::MAX {
                            row[slot] = next_distance;
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
        }

        Distancer {
            width,
            num_cells: n,
            slots,
            distances,
        }
    }

    /// Maze distance from `a` to `b`. Falls back to the Manhattan distance when either cell is
    /// a wall, and to `u32::MAX` when they are not connected.
    pub fn get_distance(&self, a: Pos, b: Pos) -> u32 {
        match (self.slot(a), self.slot(b)) {
            (Some(a), Some(b)) => self.distances[a * self.num_cells + b],
            _ => (a.0.abs_diff(b.0) + a.1.abs_diff(b.1)) as u32,
        }
    }

    fn slot(&self, (x, y): Pos) -> Option<usize> {
        if x >= self.width {
            return None;
        }
        self.slots.get(y * self.width + x).copied().flatten()
    }
}
