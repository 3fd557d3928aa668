#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that emits hostile batches as the player levels up,
//! plus the safety sweep that removes hostiles standing where they never should.

use std::time::Duration;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use swarmfall_core::{Aabb, Command, Event, HostileTemplate, Terrain, Vec2};
use swarmfall_world::{query, Entity, World};
use tracing::debug;

/// Growth curve of the batch size over player levels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BatchGrowth {
    /// `base + floor(factor × ln(level))`.
    Logarithmic {
        /// Batch size at level one.
        base: u32,
        /// Multiplier of the natural logarithm.
        factor: f32,
    },
    /// `floor(base × ratio^(level − 1))`.
    Geometric {
        /// Batch size at level one.
        base: u32,
        /// Growth per level.
        ratio: f32,
    },
}

impl Default for BatchGrowth {
    fn default() -> Self {
        Self::Logarithmic {
            base: 1,
            factor: 2.0,
        }
    }
}

impl BatchGrowth {
    /// Unclamped batch size for the level. Levels below one count as one.
    #[must_use]
    pub fn size(self, level: u32) -> usize {
        let level = level.max(1) as f32;
        let size = match self {
            Self::Logarithmic { base, factor } => base as f32 + (factor * level.ln()).floor(),
            Self::Geometric { base, ratio } => (base as f32 * ratio.powf(level - 1.0)).floor(),
        };
        if size.is_finite() {
            size.max(0.0) as usize
        } else {
            0
        }
    }
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Interval at level one.
    pub base_interval: Duration,
    /// Interval reduction per level above one.
    pub interval_decrease: Duration,
    /// Lower bound of the interval.
    pub min_interval: Duration,
    /// Batch size curve.
    pub growth: BatchGrowth,
    /// Upper bound of a single batch.
    pub max_per_spawn: usize,
    /// Candidates must lie strictly further than this from the player.
    pub min_player_distance: f32,
    /// Placement attempts per hostile before it is skipped.
    pub placement_attempts: u32,
    /// Whole tiles kept between candidates and the map edge.
    pub margin_tiles: u32,
    /// Seed of the placement and template generator.
    pub rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(1_200),
            interval_decrease: Duration::from_millis(50),
            min_interval: Duration::from_millis(200),
            growth: BatchGrowth::default(),
            max_per_spawn: 8,
            min_player_distance: 400.0,
            placement_attempts: 20,
            margin_tiles: 2,
            rng_seed: 0x5eed_f00d,
        }
    }
}

impl Config {
    /// Default configuration with the provided seed.
    #[must_use]
    pub fn with_seed(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            ..Self::default()
        }
    }
}

/// Pure system that deterministically emits hostile spawn commands.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    accumulator: Duration,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    /// Time between batches at the level.
    #[must_use]
    pub fn interval(&self, level: u32) -> Duration {
        let steps = level.saturating_sub(1);
        self.config
            .base_interval
            .saturating_sub(self.config.interval_decrease.saturating_mul(steps))
            .max(self.config.min_interval)
    }

    /// Hostiles requested by one batch at the level, given the live population and its cap.
    #[must_use]
    pub fn batch_size(&self, level: u32, live: usize, cap: usize) -> usize {
        self.config
            .growth
            .size(level)
            .min(self.config.max_per_spawn)
            .min(cap.saturating_sub(live))
    }

    /// Time accumulated toward the next batch.
    #[must_use]
    pub const fn accumulated(&self) -> Duration {
        self.accumulator
    }

    /// Consumes events and the current world to emit spawn commands.
    ///
    /// At most one batch is attempted per call. Units whose placement
    /// attempts run out are skipped without affecting the rest of the batch.
    pub fn handle(&mut self, events: &[Event], world: &World, out: &mut Vec<Command>) {
        let accumulated = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);
        if accumulated.is_zero() || query::is_player_dead(world) {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let level = query::player_level(world);
        if self.accumulator < self.interval(level) {
            return;
        }
        self.accumulator = Duration::ZERO;

        let count = self.batch_size(
            level,
            query::hostile_count(world),
            query::max_hostiles(world),
        );
        if count == 0 {
            debug!(level, "hostile population at cap");
            return;
        }

        let eligible: Vec<&HostileTemplate> = query::hostile_templates(world)
            .values()
            .filter(|template| template.tier <= level)
            .collect();
        if eligible.is_empty() {
            debug!(level, "no hostile tier eligible");
            return;
        }

        let Some(player) = query::player(world).map(Entity::center) else {
            return;
        };
        let bounds = query::terrain(world).inner_bounds(self.config.margin_tiles);

        for _ in 0..count {
            let Some(template) = eligible.choose(&mut self.rng).copied() else {
                break;
            };
            match self.place(world, template, player, &bounds) {
                Some(center) => out.push(Command::SpawnHostile {
                    template: template.id,
                    center,
                }),
                None => debug!(
                    template = template.id.get(),
                    attempts = self.config.placement_attempts,
                    "placement attempts exhausted"
                ),
            }
        }
    }

    fn place(
        &mut self,
        world: &World,
        template: &HostileTemplate,
        player: Vec2,
        bounds: &Aabb,
    ) -> Option<Vec2> {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return None;
        }
        let size = Vec2::splat(template.size);

        for _ in 0..self.config.placement_attempts {
            let candidate = Vec2::new(
                self.rng.gen_range(bounds.left()..bounds.right()),
                self.rng.gen_range(bounds.top()..bounds.bottom()),
            );
            if candidate.distance(player) <= self.config.min_player_distance {
                continue;
            }
            let footprint = Aabb::from_center(candidate, size);
            if !footprint.is_strictly_inside(bounds) {
                continue;
            }
            let blocked = query::obstacles_near(world, candidate, footprint.half_diagonal())
                .iter()
                .any(|obstacle| obstacle.overlaps(&footprint));
            if !blocked {
                return Some(candidate);
            }
        }
        None
    }
}

/// Default margin, in whole tiles, outside of which hostiles are culled.
pub const SWEEP_MARGIN_TILES: u32 = 1;

/// Safety sweep that culls hostiles on impassable tiles or outside the playable area.
#[derive(Debug)]
pub struct Sweep {
    margin_tiles: u32,
}

impl Default for Sweep {
    fn default() -> Self {
        Self::new(SWEEP_MARGIN_TILES)
    }
}

impl Sweep {
    /// Creates a sweep that keeps `margin_tiles` whole tiles clear of every map edge.
    #[must_use]
    pub const fn new(margin_tiles: u32) -> Self {
        Self { margin_tiles }
    }

    /// Emits a cull command for every misplaced hostile. Culling grants no reward.
    pub fn handle(&mut self, world: &World, out: &mut Vec<Command>) {
        let terrain = query::terrain(world);
        let bounds = terrain.inner_bounds(self.margin_tiles);

        for hostile in query::hostiles(world) {
            let center = hostile.center();
            let kind = terrain.kind_at(terrain.tile_at(center));
            if kind.is_impassable() || !bounds.contains_point(center) {
                debug!(actor = hostile.id().get(), ?kind, "culling misplaced hostile");
                out.push(Command::CullHostile { actor: hostile.id() });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_shrinks_per_level_and_clamps() {
        let spawning = Spawning::new(Config::default());
        assert_eq!(spawning.interval(1), Duration::from_millis(1_200));
        assert_eq!(spawning.interval(5), Duration::from_millis(1_000));
        assert_eq!(spawning.interval(21), Duration::from_millis(200));
        assert_eq!(spawning.interval(25), Duration::from_millis(200));
        assert_eq!(spawning.interval(u32::MAX), Duration::from_millis(200));
    }

    #[test]
    fn logarithmic_growth_is_monotonic_and_clamped() {
        let spawning = Spawning::new(Config::default());
        let sizes: Vec<usize> = (1..=60)
            .map(|level| spawning.batch_size(level, 0, 150))
            .collect();

        assert_eq!(&sizes[..5], &[1, 2, 3, 3, 4]);
        assert!(sizes.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(sizes.last(), Some(&8));
    }

    #[test]
    fn batch_shrinks_near_the_population_cap() {
        let spawning = Spawning::new(Config::default());
        assert_eq!(spawning.batch_size(30, 148, 150), 2);
        assert_eq!(spawning.batch_size(30, 150, 150), 0);
        assert_eq!(spawning.batch_size(30, 170, 150), 0);
    }

    #[test]
    fn geometric_growth_doubles_per_level() {
        let growth = BatchGrowth::Geometric {
            base: 1,
            ratio: 2.0,
        };
        assert_eq!(
            (1..=4).map(|level| growth.size(level)).collect::<Vec<_>>(),
            vec![1, 2, 4, 8]
        );
        assert_eq!(growth.size(0), 1);
    }
}
