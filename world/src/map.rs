//! Tile map backing the terrain collaborator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use swarmfall_core::{Aabb, Terrain, TerrainKind, TilePosition, Vec2};

/// Edge length of a tile in world units.
pub const DEFAULT_TILE_LENGTH: f32 = 64.0;

const OPEN_MINIMUM_SIDE: u32 = 3;
const FOREST_MINIMUM_SIDE: u32 = 12;
const POOL_COUNT: (u32, u32) = (2, 5);
const POOL_STEPS: (u32, u32) = (10, 30);
const POOL_EDGE_CLEARANCE: i32 = 5;
const TREE_ATTEMPTS: usize = 200;
const DECO_ATTEMPTS: usize = 100;
const WALK_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Failures raised while building a tile map.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MapError {
    /// The requested dimensions leave no interior to play in.
    #[error("map must be at least {minimum}x{minimum} tiles, got {columns}x{rows}")]
    TooSmall {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
        /// Smallest accepted side length.
        minimum: u32,
    },
    /// The tile length is zero, negative or not finite.
    #[error("tile length must be positive and finite, got {0}")]
    InvalidTileLength(f32),
}

/// Rectangular grid of terrain kinds surrounded by a wall ring.
#[derive(Clone, Debug)]
pub struct TileMap {
    columns: u32,
    rows: u32,
    tile_length: f32,
    tiles: Vec<TerrainKind>,
    spawn_point: Vec2,
}

impl TileMap {
    /// Builds a walled arena whose interior is entirely floor.
    ///
    /// The spawn point is the centre of the middle tile.
    pub fn open(columns: u32, rows: u32, tile_length: f32) -> Result<Self, MapError> {
        let mut map = Self::walled(columns, rows, tile_length, OPEN_MINIMUM_SIDE)?;
        map.spawn_point = map.tile_center(TilePosition::new(
            (columns / 2) as i32,
            (rows / 2) as i32,
        ));
        Ok(map)
    }

    /// Generates a forest: a wall ring, a few water pools, scattered trees
    /// and decorations, and a spawn point on a free tile in the middle half.
    pub fn forest(columns: u32, rows: u32, tile_length: f32, seed: u64) -> Result<Self, MapError> {
        let mut map = Self::walled(columns, rows, tile_length, FOREST_MINIMUM_SIDE)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let pools = rng.gen_range(POOL_COUNT.0..=POOL_COUNT.1);
        for _ in 0..pools {
            map.grow_pool(&mut rng);
        }
        map.scatter(&mut rng, TREE_ATTEMPTS, TerrainKind::Tree);
        map.scatter(&mut rng, DECO_ATTEMPTS, TerrainKind::Deco);

        let spawn = map.pick_spawn_tile(&mut rng);
        map.spawn_point = map.tile_center(spawn);
        Ok(map)
    }

    fn walled(columns: u32, rows: u32, tile_length: f32, minimum: u32) -> Result<Self, MapError> {
        if !tile_length.is_finite() || tile_length <= 0.0 {
            return Err(MapError::InvalidTileLength(tile_length));
        }
        if columns < minimum || rows < minimum {
            return Err(MapError::TooSmall {
                columns,
                rows,
                minimum,
            });
        }

        let count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut map = Self {
            columns,
            rows,
            tile_length,
            tiles: vec![TerrainKind::Floor; count],
            spawn_point: Vec2::ZERO,
        };
        let last_column = columns as i32 - 1;
        let last_row = rows as i32 - 1;
        for column in 0..=last_column {
            let _ = map.set_kind(TilePosition::new(column, 0), TerrainKind::Wall);
            let _ = map.set_kind(TilePosition::new(column, last_row), TerrainKind::Wall);
        }
        for row in 0..=last_row {
            let _ = map.set_kind(TilePosition::new(0, row), TerrainKind::Wall);
            let _ = map.set_kind(TilePosition::new(last_column, row), TerrainKind::Wall);
        }
        Ok(map)
    }

    fn grow_pool(&mut self, rng: &mut ChaCha8Rng) {
        let mut column = rng.gen_range(POOL_EDGE_CLEARANCE..=self.columns as i32 - POOL_EDGE_CLEARANCE);
        let mut row = rng.gen_range(POOL_EDGE_CLEARANCE..=self.rows as i32 - POOL_EDGE_CLEARANCE);
        let steps = rng.gen_range(POOL_STEPS.0..=POOL_STEPS.1);
        for _ in 0..steps {
            let tile = TilePosition::new(column, row);
            if self.is_interior(tile) {
                let _ = self.set_kind(tile, TerrainKind::Water);
            }
            let (dx, dy) = WALK_DIRECTIONS[rng.gen_range(0..WALK_DIRECTIONS.len())];
            column += dx;
            row += dy;
        }
    }

    fn scatter(&mut self, rng: &mut ChaCha8Rng, attempts: usize, kind: TerrainKind) {
        for _ in 0..attempts {
            let tile = TilePosition::new(
                rng.gen_range(1..=self.columns as i32 - 2),
                rng.gen_range(1..=self.rows as i32 - 2),
            );
            if self.kind_at(tile) == TerrainKind::Floor {
                let _ = self.set_kind(tile, kind);
            }
        }
    }

    fn pick_spawn_tile(&mut self, rng: &mut ChaCha8Rng) -> TilePosition {
        let columns = self.columns as i32;
        let rows = self.rows as i32;
        let column_span = columns / 4..=columns * 3 / 4;
        let row_span = rows / 4..=rows * 3 / 4;

        let attempts = self.tiles.len();
        for _ in 0..attempts {
            let tile = TilePosition::new(
                rng.gen_range(column_span.clone()),
                rng.gen_range(row_span.clone()),
            );
            if self.kind_at(tile) == TerrainKind::Floor {
                return tile;
            }
        }

        let center = TilePosition::new(columns / 2, rows / 2);
        let _ = self.set_kind(center, TerrainKind::Floor);
        center
    }

    /// Replaces the kind of a tile. Returns `false` when the tile lies outside the map.
    pub fn set_kind(&mut self, tile: TilePosition, kind: TerrainKind) -> bool {
        match self.index(tile).and_then(|index| self.tiles.get_mut(index)) {
            Some(slot) => {
                *slot = kind;
                true
            }
            None => false,
        }
    }

    /// Moves the spawn point.
    pub fn set_spawn_point(&mut self, spawn_point: Vec2) {
        self.spawn_point = spawn_point;
    }

    /// World-space rectangle covered by a tile.
    #[must_use]
    pub fn tile_rect(&self, tile: TilePosition) -> Aabb {
        Aabb::new(
            tile.column() as f32 * self.tile_length,
            tile.row() as f32 * self.tile_length,
            self.tile_length,
            self.tile_length,
        )
    }

    /// World-space centre of a tile.
    #[must_use]
    pub fn tile_center(&self, tile: TilePosition) -> Vec2 {
        self.tile_rect(tile).center()
    }

    /// Collision box of an impassable tile.
    ///
    /// Walls and trees trim their vertical extent; water trims both axes.
    #[must_use]
    pub fn obstacle_hitbox(&self, tile: TilePosition) -> Option<Aabb> {
        let rect = self.tile_rect(tile);
        match self.kind_at(tile) {
            TerrainKind::Wall | TerrainKind::Tree => Some(rect.inflate(0.0, -10.0)),
            TerrainKind::Water => Some(rect.inflate(-10.0, -10.0)),
            TerrainKind::Floor | TerrainKind::Deco | TerrainKind::Void => None,
        }
    }

    /// Collision boxes of every impassable tile in row-major order.
    #[must_use]
    pub fn obstacles(&self) -> Vec<Aabb> {
        let mut obstacles = Vec::new();
        for row in 0..self.rows as i32 {
            for column in 0..self.columns as i32 {
                if let Some(hitbox) = self.obstacle_hitbox(TilePosition::new(column, row)) {
                    obstacles.push(hitbox);
                }
            }
        }
        obstacles
    }

    /// Number of tiles of the provided kind.
    #[must_use]
    pub fn count(&self, kind: TerrainKind) -> usize {
        self.tiles.iter().filter(|tile| **tile == kind).count()
    }

    fn is_interior(&self, tile: TilePosition) -> bool {
        tile.column() > 0
            && tile.row() > 0
            && tile.column() < self.columns as i32 - 1
            && tile.row() < self.rows as i32 - 1
    }

    fn index(&self, tile: TilePosition) -> Option<usize> {
        let column = u32::try_from(tile.column()).ok()?;
        let row = u32::try_from(tile.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        usize::try_from(u64::from(row) * u64::from(self.columns) + u64::from(column)).ok()
    }
}

impl Terrain for TileMap {
    fn columns(&self) -> u32 {
        self.columns
    }

    fn rows(&self) -> u32 {
        self.rows
    }

    fn tile_length(&self) -> f32 {
        self.tile_length
    }

    fn kind_at(&self, tile: TilePosition) -> TerrainKind {
        self.index(tile)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(TerrainKind::Void)
    }

    fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }
}
