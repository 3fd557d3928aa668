//! TOML configuration of the headless runner.
//!
//! Every field has a default, so an empty document (or no document at all)
//! describes the stock session.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use swarmfall_core::WeaponId;
use swarmfall_system_spawning::BatchGrowth;
use swarmfall_world::{IdRange, IdRanges, PlayerConfig, WorldConfig};

/// Root of `swarmfall.toml`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationConfig {
    pub(crate) world: WorldSection,
    pub(crate) player: PlayerSection,
    pub(crate) spawner: SpawnerSection,
    pub(crate) weapons: WeaponsSection,
    pub(crate) upgrades: UpgradesSection,
    pub(crate) content: ContentSection,
    pub(crate) assets: AssetsSection,
}

impl SimulationConfig {
    /// Reads the document at `path`, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid simulation config toml")
    }

    pub(crate) fn world_config(&self) -> WorldConfig {
        WorldConfig {
            player: self.player.to_player_config(),
            starting_weapons: self
                .world
                .starting_weapons
                .iter()
                .copied()
                .map(WeaponId::new)
                .collect(),
            cell_size: self.world.cell_size,
            max_hostiles: self.world.max_hostiles,
        }
    }

    pub(crate) fn spawning_config(&self, seed: u64) -> swarmfall_system_spawning::Config {
        let spawner = &self.spawner;
        swarmfall_system_spawning::Config {
            base_interval: Duration::from_millis(spawner.base_interval_ms),
            interval_decrease: Duration::from_millis(spawner.interval_decrease_ms),
            min_interval: Duration::from_millis(spawner.min_interval_ms),
            growth: spawner.growth.to_batch_growth(spawner.growth_base, spawner.growth_factor),
            max_per_spawn: spawner.max_per_spawn,
            min_player_distance: spawner.min_player_distance,
            placement_attempts: spawner.placement_attempts,
            margin_tiles: spawner.margin_tiles,
            rng_seed: seed,
        }
    }

    pub(crate) fn weapons_config(&self) -> swarmfall_system_weapons::Config {
        swarmfall_system_weapons::Config {
            spread_degrees: self.weapons.spread_degrees,
            orbital_size: self.weapons.orbital_size,
            ..swarmfall_system_weapons::Config::default()
        }
    }

    pub(crate) fn upgrades_config(&self, seed: u64) -> swarmfall_system_upgrades::Config {
        swarmfall_system_upgrades::Config {
            options: self.upgrades.options,
            tier_window: self.upgrades.tier_window,
            rng_seed: seed,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MapKind {
    #[default]
    Forest,
    Open,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WorldSection {
    pub(crate) map: MapKind,
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) tile_length: f32,
    pub(crate) seed: u64,
    pub(crate) cell_size: f32,
    pub(crate) max_hostiles: usize,
    pub(crate) starting_weapons: Vec<u32>,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            map: MapKind::Forest,
            columns: 80,
            rows: 60,
            tile_length: swarmfall_world::map::DEFAULT_TILE_LENGTH,
            seed: 1,
            cell_size: swarmfall_world::DEFAULT_CELL_SIZE,
            max_hostiles: swarmfall_world::MAX_ENEMIES,
            starting_weapons: vec![3001],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerSection {
    pub(crate) max_health: f32,
    pub(crate) speed: f32,
    pub(crate) pickup_range: f32,
    pub(crate) size: f32,
    pub(crate) hitbox_inset: f32,
    pub(crate) invulnerability_ms: u64,
    pub(crate) first_level_xp: u32,
    pub(crate) xp_growth: f32,
}

impl Default for PlayerSection {
    fn default() -> Self {
        let player = PlayerConfig::default();
        Self {
            max_health: player.max_health,
            speed: player.speed,
            pickup_range: player.pickup_range,
            size: player.size,
            hitbox_inset: player.hitbox_inset,
            invulnerability_ms: u64::try_from(player.invulnerability.as_millis()).unwrap_or(0),
            first_level_xp: player.first_level_xp,
            xp_growth: player.xp_growth,
        }
    }
}

impl PlayerSection {
    fn to_player_config(&self) -> PlayerConfig {
        PlayerConfig {
            max_health: self.max_health,
            speed: self.speed,
            pickup_range: self.pickup_range,
            size: self.size,
            hitbox_inset: self.hitbox_inset,
            invulnerability: Duration::from_millis(self.invulnerability_ms),
            first_level_xp: self.first_level_xp,
            xp_growth: self.xp_growth,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum GrowthKind {
    #[default]
    Logarithmic,
    Geometric,
}

impl GrowthKind {
    fn to_batch_growth(self, base: u32, factor: f32) -> BatchGrowth {
        match self {
            Self::Logarithmic => BatchGrowth::Logarithmic { base, factor },
            Self::Geometric => BatchGrowth::Geometric {
                base,
                ratio: factor,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SpawnerSection {
    pub(crate) base_interval_ms: u64,
    pub(crate) interval_decrease_ms: u64,
    pub(crate) min_interval_ms: u64,
    pub(crate) growth: GrowthKind,
    pub(crate) growth_base: u32,
    pub(crate) growth_factor: f32,
    pub(crate) max_per_spawn: usize,
    pub(crate) min_player_distance: f32,
    pub(crate) placement_attempts: u32,
    pub(crate) margin_tiles: u32,
    pub(crate) sweep_margin_tiles: u32,
}

impl Default for SpawnerSection {
    fn default() -> Self {
        Self {
            base_interval_ms: 1_200,
            interval_decrease_ms: 50,
            min_interval_ms: 200,
            growth: GrowthKind::Logarithmic,
            growth_base: 1,
            growth_factor: 2.0,
            max_per_spawn: 8,
            min_player_distance: 400.0,
            placement_attempts: 20,
            margin_tiles: 2,
            sweep_margin_tiles: swarmfall_system_spawning::SWEEP_MARGIN_TILES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WeaponsSection {
    pub(crate) spread_degrees: f32,
    pub(crate) orbital_size: f32,
}

impl Default for WeaponsSection {
    fn default() -> Self {
        Self {
            spread_degrees: swarmfall_system_weapons::DEFAULT_SPREAD_DEGREES,
            orbital_size: swarmfall_system_weapons::DEFAULT_ORBITAL_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct UpgradesSection {
    pub(crate) options: usize,
    pub(crate) tier_window: u32,
}

impl Default for UpgradesSection {
    fn default() -> Self {
        let defaults = swarmfall_system_upgrades::Config::default();
        Self {
            options: defaults.options,
            tier_window: defaults.tier_window,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ContentSection {
    pub(crate) dir: PathBuf,
    pub(crate) hostiles: String,
    pub(crate) weapons: String,
    pub(crate) upgrades: String,
    /// Inclusive `[first, last]` identifier ranges accepted by each table.
    pub(crate) hostile_ids: [u32; 2],
    pub(crate) weapon_ids: [u32; 2],
    pub(crate) upgrade_ids: [u32; 2],
}

impl Default for ContentSection {
    fn default() -> Self {
        let ranges = IdRanges::default();
        let bounds = |range: IdRange| [range.first(), range.last()];
        Self {
            dir: PathBuf::from("content"),
            hostiles: "hostiles.json".to_owned(),
            weapons: "weapons.json".to_owned(),
            upgrades: "upgrades.json".to_owned(),
            hostile_ids: bounds(ranges.hostiles),
            weapon_ids: bounds(ranges.weapons),
            upgrade_ids: bounds(ranges.upgrades),
        }
    }
}

impl ContentSection {
    pub(crate) fn id_ranges(&self) -> IdRanges {
        let range = |[first, last]: [u32; 2]| IdRange::new(first, last);
        IdRanges {
            upgrades: range(self.upgrade_ids),
            hostiles: range(self.hostile_ids),
            weapons: range(self.weapon_ids),
        }
    }
}

/// In-memory asset manifest: image keys with their pixel size and sound keys with their length.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AssetsSection {
    pub(crate) images: BTreeMap<String, ImageEntry>,
    pub(crate) sounds: BTreeMap<String, u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ImageEntry {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SimulationConfig::parse("").expect("empty config parses");
        assert_eq!(config, SimulationConfig::default());

        let world = config.world_config();
        assert_eq!(world.starting_weapons, vec![WeaponId::new(3001)]);
        assert_eq!(world.max_hostiles, 150);
        assert_eq!(
            config.spawning_config(9).base_interval,
            Duration::from_millis(1_200)
        );
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = SimulationConfig::parse(
            r#"
            [world]
            map = "open"
            columns = 30

            [spawner]
            growth = "geometric"
            growth_factor = 1.5

            [assets.images]
            bolt = { width = 16, height = 8 }
            "#,
        )
        .expect("config parses");

        assert_eq!(config.world.map, MapKind::Open);
        assert_eq!(config.world.columns, 30);
        assert_eq!(config.world.rows, 60);
        assert_eq!(
            config.spawning_config(1).growth,
            BatchGrowth::Geometric {
                base: 1,
                ratio: 1.5
            }
        );
        assert_eq!(
            config.assets.images.get("bolt"),
            Some(&ImageEntry {
                width: 16,
                height: 8
            })
        );
    }

    #[test]
    fn content_id_ranges_are_configurable() {
        let config = SimulationConfig::parse("[content]\nhostile_ids = [5000, 5999]\n")
            .expect("config parses");
        let ranges = config.content.id_ranges();

        assert_eq!(ranges.hostiles, IdRange::new(5000, 5999));
        assert_eq!(ranges.weapons, IdRanges::default().weapons);
        assert_eq!(SimulationConfig::default().content.id_ranges(), IdRanges::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(SimulationConfig::parse("[world]\ncolums = 3\n").is_err());
    }
}
