//! Frame driver that runs every system in order and applies their commands.

use std::time::Duration;

use glam::Vec2;
use swarmfall_core::{Command, Event};
use swarmfall_system_motion::Motion;
use swarmfall_system_spawning::{Spawning, Sweep};
use swarmfall_system_upgrades::UpgradeDraft;
use swarmfall_system_weapons::Weapons;
use swarmfall_world::{self as world, query, Entity, World};

use crate::{assets::AssetLibrary, config::SimulationConfig};

const SPAWNER_SEED_SALT: u64 = 0x5350_4157_4e45_5253;
const DRAFT_SEED_SALT: u64 = 0x4452_4146_5453_0000;

/// Hostiles within this distance steer the autopilot.
const AUTOPILOT_AWARENESS: f32 = 600.0;

/// Running totals collected from world events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) frames: u64,
    pub(crate) spawned: u32,
    pub(crate) killed: u32,
    pub(crate) culled: u32,
    pub(crate) shots: u32,
    pub(crate) hits_taken: u32,
    pub(crate) upgrades: u32,
    pub(crate) level: u32,
    pub(crate) player_dead: bool,
}

/// Headless session: the world plus every system, stepped one frame at a time.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    assets: AssetLibrary,
    motion: Motion,
    weapons: Weapons,
    spawning: Spawning,
    sweep: Sweep,
    drafting: UpgradeDraft,
    summary: Summary,
}

impl Simulation {
    pub(crate) fn new(
        config: &SimulationConfig,
        world: World,
        assets: AssetLibrary,
        seed: u64,
    ) -> Self {
        Self {
            motion: Motion,
            weapons: Weapons::new(config.weapons_config()),
            spawning: Spawning::new(config.spawning_config(seed ^ SPAWNER_SEED_SALT)),
            sweep: Sweep::new(config.spawner.sweep_margin_tiles),
            drafting: UpgradeDraft::new(config.upgrades_config(seed ^ DRAFT_SEED_SALT)),
            summary: Summary {
                level: query::player_level(&world),
                ..Summary::default()
            },
            world,
            assets,
        }
    }

    pub(crate) fn summary(&self) -> Summary {
        self.summary
    }

    /// Advances one frame and reports whether the player is still alive.
    ///
    /// Phases run in a fixed order and each phase's commands are applied
    /// before the next phase reads the world: motion, weapons, spawner,
    /// safety sweep, then drafting for any level gained this frame.
    pub(crate) fn step(&mut self, dt: Duration) -> bool {
        if query::is_player_dead(&self.world) {
            return false;
        }
        let (input, aim) = autopilot(&self.world);

        let mut tick = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut tick);
        let mut frame_events = tick.clone();
        let mut commands = Vec::new();

        self.motion.handle(&tick, &self.world, input, &mut commands);
        self.flush(&mut commands, &mut frame_events);

        self.weapons
            .handle(&tick, &self.world, aim, &self.assets, &mut commands);
        self.flush(&mut commands, &mut frame_events);

        self.spawning.handle(&tick, &self.world, &mut commands);
        self.flush(&mut commands, &mut frame_events);

        self.sweep.handle(&self.world, &mut commands);
        self.flush(&mut commands, &mut frame_events);

        let mut drafts = Vec::new();
        self.drafting
            .handle(&frame_events, &self.world, &mut drafts);
        commands.extend(drafts.iter().filter_map(|draft| draft.pick(&self.world, 0)));
        self.flush(&mut commands, &mut frame_events);

        self.record(&frame_events);
        !self.summary.player_dead
    }

    fn flush(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }

    fn record(&mut self, events: &[Event]) {
        let player = query::player_id(&self.world);
        let summary = &mut self.summary;
        summary.frames += 1;
        for event in events {
            match event {
                Event::HostileSpawned { .. } => summary.spawned += 1,
                Event::HostileKilled { .. } => summary.killed += 1,
                Event::HostileCulled { .. } => summary.culled += 1,
                Event::ProjectileSpawned { .. } => summary.shots += 1,
                Event::ActorDamaged { target, .. } if *target == player => {
                    summary.hits_taken += 1;
                }
                Event::UpgradeApplied { .. } => summary.upgrades += 1,
                Event::PlayerDied => summary.player_dead = true,
                _ => {}
            }
        }
        summary.level = query::player_level(&self.world);
    }
}

/// Steers away from nearby hostiles and aims at the closest one.
fn autopilot(world: &World) -> (Vec2, Vec2) {
    let Some(player) = query::player(world).map(Entity::center) else {
        return (Vec2::ZERO, Vec2::ZERO);
    };

    let mut flee = Vec2::ZERO;
    let mut nearest: Option<(f32, Vec2)> = None;
    for id in query::hostiles_near(world, player, AUTOPILOT_AWARENESS) {
        let Some(hostile) = query::entity(world, id) else {
            continue;
        };
        let offset = hostile.center() - player;
        let distance = offset.length();
        flee -= offset.normalize_or_zero() / distance.max(1.0);
        if nearest.map_or(true, |(best, _)| distance < best) {
            nearest = Some((distance, offset));
        }
    }

    let aim = nearest.map_or(Vec2::ZERO, |(_, offset)| offset);
    (flee.normalize_or_zero(), aim)
}

#[cfg(test)]
mod tests {
    use swarmfall_world::{DefinitionTables, IdRanges, TileMap};

    use super::*;

    const HOSTILES: &str = r#"[
        {"id": 2001, "name": "slime", "damage": 5, "speed": 80, "health": 20, "xp": 500}
    ]"#;
    const WEAPONS: &str = r#"[
        {"id": 3001, "name": "bolt", "damage": 10, "cooldown": 400, "speed": 600},
        {"id": 3003, "name": "nova", "damage": 100, "cooldown": 100, "type": "aura",
         "data": {"radius": 4000}}
    ]"#;
    const UPGRADES: &str = r#"[
        {"id": 1001, "title": "Swift", "type": "stat", "tier": 1,
         "data": {"attr": "speed", "value": 10, "mode": "add"}}
    ]"#;

    fn simulation(starting_weapon: u32, seed: u64) -> Simulation {
        let mut config = SimulationConfig::default();
        config.world.starting_weapons = vec![starting_weapon];
        let tables =
            DefinitionTables::from_json(HOSTILES, WEAPONS, UPGRADES, &IdRanges::default())
                .expect("tables parse");
        let map = TileMap::open(40, 40, 64.0).expect("valid map");
        let world = World::new(config.world_config(), map, tables);
        Simulation::new(&config, world, AssetLibrary::default(), seed)
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut first = simulation(3001, 42);
        let mut second = simulation(3001, 42);
        for _ in 0..600 {
            let _ = first.step(Duration::from_millis(16));
            let _ = second.step(Duration::from_millis(16));
        }

        assert_eq!(first.summary(), second.summary());
        assert_eq!(first.summary().frames, 600);
        assert!(first.summary().spawned > 0);
        assert!(first.summary().shots > 0);
    }

    #[test]
    fn population_stays_under_cap_every_frame() {
        let mut simulation = simulation(3001, 7);
        for _ in 0..1_000 {
            let _ = simulation.step(Duration::from_millis(50));
            assert!(query::hostile_count(&simulation.world) <= swarmfall_world::MAX_ENEMIES);
        }
    }

    #[test]
    fn kills_level_the_player_and_apply_a_drafted_upgrade() {
        let mut simulation = simulation(3003, 3);
        for _ in 0..100 {
            let _ = simulation.step(Duration::from_millis(50));
        }

        let summary = simulation.summary();
        assert!(summary.killed >= 1);
        assert!(summary.level >= 2);
        assert_eq!(summary.upgrades, summary.level - 1);
        assert!(query::player_stats(&simulation.world).speed() > 300.0);
    }
}
