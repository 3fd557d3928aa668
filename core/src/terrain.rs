//! Read-only contract of the terrain collaborator.

use serde::{Deserialize, Serialize};

use crate::{Aabb, Vec2};

/// Kind of terrain occupying a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    /// Walkable ground.
    #[default]
    Floor,
    /// Perimeter or interior wall.
    Wall,
    /// Water pool.
    Water,
    /// Tree trunk.
    Tree,
    /// Decoration without collision.
    Deco,
    /// Anything outside the map.
    Void,
}

impl TerrainKind {
    /// Reports whether actors may never stand on the tile.
    #[must_use]
    pub const fn is_impassable(self) -> bool {
        matches!(self, Self::Wall | Self::Water | Self::Tree | Self::Void)
    }
}

/// Tile coordinate; may lie outside the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePosition {
    column: i32,
    row: i32,
}

impl TilePosition {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }
}

/// Terrain query surface used for boundary and obstacle checks.
pub trait Terrain {
    /// Number of tile columns.
    fn columns(&self) -> u32;

    /// Number of tile rows.
    fn rows(&self) -> u32;

    /// Edge length of a square tile in world units.
    fn tile_length(&self) -> f32;

    /// Kind of the tile. Coordinates outside the map report [`TerrainKind::Void`].
    fn kind_at(&self, tile: TilePosition) -> TerrainKind;

    /// World-space point where the player starts.
    fn spawn_point(&self) -> Vec2;

    /// Tile containing the world-space point.
    fn tile_at(&self, point: Vec2) -> TilePosition {
        let length = self.tile_length().max(f32::EPSILON);
        TilePosition::new(
            (point.x / length).floor() as i32,
            (point.y / length).floor() as i32,
        )
    }

    /// Playable rectangle that keeps `margin_tiles` whole tiles away from every map edge.
    ///
    /// Collapses to an empty rectangle when the margin consumes the whole map.
    fn inner_bounds(&self, margin_tiles: u32) -> Aabb {
        let length = self.tile_length();
        let margin = margin_tiles as f32 * length;
        let width = self.columns() as f32 * length - 2.0 * margin;
        let height = self.rows() as f32 * length - 2.0 * margin;
        Aabb::new(margin, margin, width.max(0.0), height.max(0.0))
    }
}
