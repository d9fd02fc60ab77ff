//! A* pathfinding on the tile grid
//!
//! The core only ever asks for the next step. The goal tile itself may be
//! unwalkable (a rock face, a bush being harvested); a path then ends on a
//! tile adjacent to it.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::core::types::Position;

/// Movement capability consumed by the core
pub trait Pathfinder {
    /// First tile to move to on the way from `from` to `to`
    ///
    /// Returns None when already there or when no path exists.
    fn next_step(
        &self,
        from: Position,
        to: Position,
        walkable: &dyn Fn(Position) -> bool,
    ) -> Option<Position>;
}

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    pos: Position,
    f_cost: f32, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded A* over 8-connected tiles
#[derive(Debug, Clone)]
pub struct AStarPathfinder {
    /// Expansion budget per query
    pub max_nodes: usize,
}

impl Default for AStarPathfinder {
    fn default() -> Self {
        Self { max_nodes: 2_000 }
    }
}

impl AStarPathfinder {
    /// Full path from `start` to `goal`, both ends included
    pub fn find_path(
        &self,
        start: Position,
        goal: Position,
        walkable: &dyn Fn(Position) -> bool,
    ) -> Option<Vec<Position>> {
        if start == goal {
            return Some(vec![start]);
        }

        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut g_scores: HashMap<Position, f32> = HashMap::new();
        let mut expanded = 0usize;

        g_scores.insert(start, 0.0);
        open_set.push(PathNode {
            pos: start,
            f_cost: start.distance(&goal),
        });

        while let Some(current) = open_set.pop() {
            if current.pos == goal {
                return Some(reconstruct_path(&came_from, current.pos));
            }

            expanded += 1;
            if expanded > self.max_nodes {
                break;
            }

            let current_g = *g_scores.get(&current.pos).unwrap_or(&f32::INFINITY);

            for neighbor in current.pos.neighbors() {
                // The goal is always enterable so unwalkable targets stay reachable
                if neighbor != goal && !walkable(neighbor) {
                    continue;
                }

                let step_cost = if neighbor.x != current.pos.x && neighbor.y != current.pos.y {
                    std::f32::consts::SQRT_2
                } else {
                    1.0
                };
                let tentative_g = current_g + step_cost;
                let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

                if tentative_g < neighbor_g {
                    came_from.insert(neighbor, current.pos);
                    g_scores.insert(neighbor, tentative_g);
                    open_set.push(PathNode {
                        pos: neighbor,
                        f_cost: tentative_g + neighbor.distance(&goal),
                    });
                }
            }
        }

        None // No path found
    }
}

impl Pathfinder for AStarPathfinder {
    fn next_step(
        &self,
        from: Position,
        to: Position,
        walkable: &dyn Fn(Position) -> bool,
    ) -> Option<Position> {
        let path = self.find_path(from, to, walkable)?;
        let step = *path.get(1)?;
        // Never step onto an unwalkable goal; stopping adjacent is arrival
        if step == to && !walkable(to) {
            return None;
        }
        Some(step)
    }
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &HashMap<Position, Position>, mut current: Position) -> Vec<Position> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
