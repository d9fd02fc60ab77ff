//! World collaborators
//!
//! The decision core never owns terrain. It reads and mutates tiles through
//! [`TileMap`] and moves through [`Pathfinder`]; [`GridWorld`] is the plain
//! in-memory grid used by the headless runner and the tests.

pub mod pathfinding;
pub mod stockpile;
pub mod threat;

pub use pathfinding::{AStarPathfinder, Pathfinder};
pub use stockpile::Stockpile;
pub use threat::Threat;

use serde::{Deserialize, Serialize};

use crate::core::types::Position;
use crate::entity::agent::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Ground,
    BerryBush,
    Rock,
    Water,
    Wall,
}

impl TileKind {
    /// Resource a tile of this kind can be harvested for
    pub fn yields(&self) -> Option<ResourceKind> {
        match self {
            TileKind::BerryBush => Some(ResourceKind::Food),
            TileKind::Rock => Some(ResourceKind::Stone),
            _ => None,
        }
    }

    pub fn is_walkable(&self) -> bool {
        matches!(self, TileKind::Ground | TileKind::BerryBush)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    /// Harvestable units left on the tile
    pub resource: u32,
}

impl Tile {
    pub const fn ground() -> Self {
        Self {
            kind: TileKind::Ground,
            resource: 0,
        }
    }
}

/// Tile lookup capability consumed by the core
pub trait TileMap {
    fn tile(&self, pos: Position) -> Option<Tile>;

    fn is_walkable(&self, pos: Position) -> bool {
        self.tile(pos).map(|t| t.kind.is_walkable()).unwrap_or(false)
    }

    /// Remove up to `amount` units from a tile, returns units removed
    fn take_resource(&mut self, pos: Position, amount: u32) -> u32;

    /// Replace a tile with a structure; false if the tile cannot take it
    fn place_structure(&mut self, pos: Position, kind: TileKind) -> bool;
}

/// Nearest tile yielding `kind` with resource left, within `radius` tiles
///
/// Linear scan over the square; fine at colony scale.
pub fn find_nearest_resource(
    world: &dyn TileMap,
    from: Position,
    kind: ResourceKind,
    radius: i32,
) -> Option<Position> {
    let mut best: Option<(Position, f32)> = None;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let pos = from.offset(dx, dy);
            let Some(tile) = world.tile(pos) else {
                continue;
            };
            if tile.kind.yields() != Some(kind) || tile.resource == 0 {
                continue;
            }
            let d = from.distance(&pos);
            if best.map(|(_, bd)| d < bd).unwrap_or(true) {
                best = Some((pos, d));
            }
        }
    }
    best.map(|(p, _)| p)
}

/// Dense rectangular grid
#[derive(Debug, Clone)]
pub struct GridWorld {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl GridWorld {
    /// All-ground world
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            tiles: vec![Tile::ground(); size],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }

    pub fn set(&mut self, pos: Position, tile: Tile) {
        if let Some(i) = self.index(pos) {
            self.tiles[i] = tile;
        }
    }

    /// Total units of `kind` left on the map
    pub fn total_resource(&self, kind: ResourceKind) -> u32 {
        self.tiles
            .iter()
            .filter(|t| t.kind.yields() == Some(kind))
            .map(|t| t.resource)
            .sum()
    }
}

impl TileMap for GridWorld {
    fn tile(&self, pos: Position) -> Option<Tile> {
        self.index(pos).map(|i| self.tiles[i])
    }

    fn take_resource(&mut self, pos: Position, amount: u32) -> u32 {
        let Some(i) = self.index(pos) else {
            return 0;
        };
        let tile = &mut self.tiles[i];
        let taken = amount.min(tile.resource);
        tile.resource -= taken;
        if tile.resource == 0 && tile.kind == TileKind::BerryBush {
            tile.kind = TileKind::Ground;
        }
        taken
    }

    fn place_structure(&mut self, pos: Position, kind: TileKind) -> bool {
        let Some(i) = self.index(pos) else {
            return false;
        };
        if self.tiles[i].kind != TileKind::Ground {
            return false;
        }
        self.tiles[i] = Tile { kind, resource: 0 };
        true
    }
}
