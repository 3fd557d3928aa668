//! Uniform grid that buckets entities by the cell containing their position.
//!
//! Inserting, removing and relocating an entry recomputes a single cell key
//! and maintains a reverse association, so all three are amortised O(1).
//! Neighbour queries visit either the query cell alone or every cell within
//! `ceil(radius / cell_size)` rings around it. Results are conservative: the
//! caller performs the exact geometric test on the returned candidates.

use std::{collections::HashMap, hash::Hash};

use swarmfall_core::Vec2;

/// Integer coordinate of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    x: i32,
    y: i32,
}

impl CellKey {
    /// Creates a new cell key.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal cell index.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical cell index.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Spatial hash over fixed-size square cells.
#[derive(Clone, Debug)]
pub struct SpatialIndex<K> {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<K>>,
    locations: HashMap<K, CellKey>,
}

impl<K> SpatialIndex<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty index. Non-positive cell sizes are raised to one world unit.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    /// Edge length of a cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing the world-space point.
    #[must_use]
    pub fn cell_for(&self, point: Vec2) -> CellKey {
        CellKey::new(
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    /// Cell the entry currently belongs to.
    #[must_use]
    pub fn cell_of(&self, key: K) -> Option<CellKey> {
        self.locations.get(&key).copied()
    }

    /// Entries stored in a single cell.
    #[must_use]
    pub fn cell(&self, cell: CellKey) -> &[K] {
        self.cells.get(&cell).map_or(&[][..], Vec::as_slice)
    }

    /// Number of entries stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Reports whether the index stores no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Stores the entry at the point, relocating it if it was already present.
    pub fn insert(&mut self, key: K, point: Vec2) {
        let _ = self.update(key, point);
    }

    /// Removes the entry. Returns `false` when it was not stored.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(cell) = self.locations.remove(&key) else {
            return false;
        };
        self.detach(key, cell);
        true
    }

    /// Moves the entry to the cell containing the point.
    ///
    /// Returns `true` when the entry changed cell or was newly inserted.
    pub fn update(&mut self, key: K, point: Vec2) -> bool {
        let target = self.cell_for(point);
        match self.locations.insert(key, target) {
            Some(previous) if previous == target => false,
            Some(previous) => {
                self.detach(key, previous);
                self.cells.entry(target).or_default().push(key);
                true
            }
            None => {
                self.cells.entry(target).or_default().push(key);
                true
            }
        }
    }

    /// Collects candidates near the point into `out`, which is cleared first.
    ///
    /// `None` restricts the search to the point's own cell. `Some(radius)`
    /// visits every cell within `ceil(radius / cell_size)` rings.
    pub fn query_into(&self, point: Vec2, radius: Option<f32>, out: &mut Vec<K>) {
        out.clear();
        let center = self.cell_for(point);
        let rings = radius.map_or(0, |radius| self.rings_for(radius));

        for dy in -rings..=rings {
            for dx in -rings..=rings {
                let cell = CellKey::new(center.x.saturating_add(dx), center.y.saturating_add(dy));
                if let Some(entries) = self.cells.get(&cell) {
                    out.extend_from_slice(entries);
                }
            }
        }
    }

    /// Candidates near the point. See [`SpatialIndex::query_into`].
    #[must_use]
    pub fn query(&self, point: Vec2, radius: Option<f32>) -> Vec<K> {
        let mut out = Vec::new();
        self.query_into(point, radius, &mut out);
        out
    }

    /// Drops every entry while keeping the cell size.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.locations.clear();
    }

    fn rings_for(&self, radius: f32) -> i32 {
        if !radius.is_finite() || radius <= 0.0 {
            return 0;
        }
        (radius / self.cell_size).ceil().min(i32::MAX as f32) as i32
    }

    fn detach(&mut self, key: K, cell: CellKey) {
        let emptied = match self.cells.get_mut(&cell) {
            Some(entries) => {
                if let Some(position) = entries.iter().position(|entry| *entry == key) {
                    let _ = entries.swap_remove(position);
                }
                entries.is_empty()
            }
            None => false,
        };
        if emptied {
            let _ = self.cells.remove(&cell);
        }
    }
}
