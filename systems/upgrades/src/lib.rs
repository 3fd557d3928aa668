#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level-up upgrade drafting.
//!
//! An upgrade is eligible when its tier has been reached and is no more than
//! [`Config::tier_window`] levels behind the player. When that leaves nothing,
//! every reached tier is eligible again so late levels still get offers.

use std::collections::BTreeMap;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use swarmfall_core::{Command, Event, UpgradeDefinition, UpgradeId};
use swarmfall_world::{query, World};
use tracing::{debug, info};

/// Configuration parameters required to construct the drafting system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of distinct options per draft.
    pub options: usize,
    /// Upgrades whose tier trails the level by this much or more drop out.
    pub tier_window: u32,
    /// Seed of the sampling generator.
    pub rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: 3,
            tier_window: 5,
            rng_seed: 0xd1ce,
        }
    }
}

/// Options offered for one level-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    /// Level that triggered the draft.
    pub level: u32,
    /// Distinct upgrade choices.
    pub options: Vec<UpgradeId>,
}

impl Draft {
    /// Command applying the option at `index`, if both the option and its definition exist.
    #[must_use]
    pub fn pick(&self, world: &World, index: usize) -> Option<Command> {
        let id = self.options.get(index)?;
        let definition = query::upgrades(world).get(id)?;
        info!(upgrade = id.get(), title = %definition.title, "upgrade picked");
        Some(Command::ApplyUpgrade {
            effect: definition.effect.clone(),
        })
    }
}

/// Pure system that draws upgrade options whenever the player levels up.
#[derive(Debug)]
pub struct UpgradeDraft {
    config: Config,
    rng: ChaCha8Rng,
}

impl UpgradeDraft {
    /// Creates a new drafting system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    /// Upgrades that may be offered at the level, in identifier order.
    #[must_use]
    pub fn eligible<'a>(
        &self,
        upgrades: &'a BTreeMap<UpgradeId, UpgradeDefinition>,
        level: u32,
    ) -> Vec<&'a UpgradeDefinition> {
        let reached: Vec<&UpgradeDefinition> = upgrades
            .values()
            .filter(|upgrade| upgrade.tier <= level)
            .collect();
        let recent: Vec<&UpgradeDefinition> = reached
            .iter()
            .copied()
            .filter(|upgrade| level - upgrade.tier < self.config.tier_window)
            .collect();
        if recent.is_empty() {
            reached
        } else {
            recent
        }
    }

    /// Draws up to [`Config::options`] distinct eligible upgrades for the level.
    pub fn draw(
        &mut self,
        upgrades: &BTreeMap<UpgradeId, UpgradeDefinition>,
        level: u32,
    ) -> Vec<UpgradeId> {
        let pool = self.eligible(upgrades, level);
        let mut options: Vec<UpgradeId> = pool
            .choose_multiple(&mut self.rng, self.config.options)
            .map(|upgrade| upgrade.id)
            .collect();
        options.shuffle(&mut self.rng);
        options
    }

    /// Emits one draft per level gained in the events.
    pub fn handle(&mut self, events: &[Event], world: &World, out: &mut Vec<Draft>) {
        for event in events {
            let Event::PlayerLevelledUp { level } = event else {
                continue;
            };
            let options = self.draw(query::upgrades(world), *level);
            if options.is_empty() {
                debug!(level, "no upgrade eligible");
                continue;
            }
            debug!(level, count = options.len(), "upgrade draft drawn");
            out.push(Draft {
                level: *level,
                options,
            });
        }
    }
}
