#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Swarmfall.

use std::{collections::BTreeMap, time::Duration};

use swarmfall_core::{
    direction_from_degrees, Aabb, Body, Command, DamageOutcome, DamageSource, Damageable,
    EntityId, Event, FlagValue, HostileKindId, HostileTemplate, Movable, Terrain,
    UpgradeDefinition, UpgradeId, Vec2, WeaponDefinition, WeaponId,
};
use tracing::{debug, info, warn};

pub mod content;
pub mod entities;
pub mod map;
pub mod progression;
pub mod spatial;
mod upgrades;

pub use content::{DefinitionTables, IdRange, IdRanges, LoadError, LoadWarning, Table};
pub use entities::{Entity, EntityKind};
pub use map::{MapError, TileMap};
pub use progression::{PlayerConfig, PlayerStats, Progression};
pub use spatial::{CellKey, SpatialIndex};

/// Default edge length of a spatial index cell.
pub const DEFAULT_CELL_SIZE: f32 = 128.0;

/// Default hard cap on live hostiles.
pub const MAX_ENEMIES: usize = 150;

/// Construction parameters of the world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Starting values of the controllable unit.
    pub player: PlayerConfig,
    /// Weapons equipped when the session starts.
    pub starting_weapons: Vec<WeaponId>,
    /// Edge length of spatial index cells.
    pub cell_size: f32,
    /// Hard cap on live hostiles.
    pub max_hostiles: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            starting_weapons: Vec::new(),
            cell_size: DEFAULT_CELL_SIZE,
            max_hostiles: MAX_ENEMIES,
        }
    }
}

/// Represents the authoritative Swarmfall world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    map: TileMap,
    obstacles: Vec<Aabb>,
    obstacle_index: SpatialIndex<usize>,
    obstacle_reach: f32,
    entities: BTreeMap<EntityId, Entity>,
    hostile_index: SpatialIndex<EntityId>,
    hostile_reach: f32,
    player: EntityId,
    stats: PlayerStats,
    progression: Progression,
    flags: BTreeMap<String, FlagValue>,
    weapons: BTreeMap<WeaponId, WeaponDefinition>,
    hostile_templates: BTreeMap<HostileKindId, HostileTemplate>,
    upgrades: BTreeMap<UpgradeId, UpgradeDefinition>,
    loadout: Vec<WeaponId>,
    clock: Duration,
    last_player_hit: Option<Duration>,
    next_entity: u32,
    player_dead: bool,
}

impl World {
    /// Creates a world on the provided map, populated from the definition tables.
    ///
    /// Starting weapons that name no loaded definition are skipped with a warning.
    #[must_use]
    pub fn new(config: WorldConfig, map: TileMap, tables: DefinitionTables) -> Self {
        let (hostile_templates, weapons, upgrades) = tables.into_parts();

        let obstacles = map.obstacles();
        let mut obstacle_index = SpatialIndex::new(config.cell_size);
        let mut obstacle_reach: f32 = 0.0;
        for (index, obstacle) in obstacles.iter().enumerate() {
            obstacle_index.insert(index, obstacle.center());
            obstacle_reach = obstacle_reach.max(obstacle.half_diagonal());
        }

        let hostile_reach = hostile_templates
            .values()
            .map(|template| Vec2::splat(template.size).length() * 0.5)
            .fold(0.0_f32, f32::max);

        let loadout: Vec<WeaponId> = config
            .starting_weapons
            .iter()
            .copied()
            .filter(|weapon| {
                let known = weapons.contains_key(weapon);
                if !known {
                    warn!(weapon = weapon.get(), "starting weapon is not defined");
                }
                known
            })
            .collect();

        let player_id = EntityId::new(0);
        let player = Entity::player(
            player_id,
            Body::centered(
                map.spawn_point(),
                config.player.render_size(),
                config.player.inset(),
            ),
            config.player.speed,
            config.player.max_health,
        );
        let mut entities = BTreeMap::new();
        let _ = entities.insert(player_id, player);

        Self {
            stats: PlayerStats::from_config(&config.player),
            progression: Progression::new(config.player.first_level_xp, config.player.xp_growth),
            hostile_index: SpatialIndex::new(config.cell_size),
            hostile_reach,
            obstacles,
            obstacle_index,
            obstacle_reach,
            entities,
            player: player_id,
            flags: BTreeMap::new(),
            weapons,
            hostile_templates,
            upgrades,
            loadout,
            clock: Duration::ZERO,
            last_player_hit: None,
            next_entity: 1,
            player_dead: false,
            config,
            map,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        id
    }

    fn player_entity_mut(&mut self) -> Option<&mut Entity> {
        self.entities.get_mut(&self.player)
    }

    fn hostile_count(&self) -> usize {
        self.hostile_index.len()
    }

    fn remove_hostile(&mut self, actor: EntityId) -> Option<Entity> {
        if !self.entities.get(&actor).is_some_and(Entity::is_hostile) {
            return None;
        }
        let _ = self.hostile_index.remove(actor);
        self.entities.remove(&actor)
    }

    fn damage_player(&mut self, amount: f32, source: DamageSource, out_events: &mut Vec<Event>) {
        if self.player_dead {
            return;
        }
        if let Some(last) = self.last_player_hit {
            if self.clock.saturating_sub(last) < self.config.player.invulnerability {
                return;
            }
        }
        let target = self.player;
        let Some(player) = self.entities.get_mut(&target) else {
            return;
        };
        match player.take_damage(amount) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Survived { remaining } => {
                self.last_player_hit = Some(self.clock);
                debug!(?source, amount, remaining, "player hit");
                out_events.push(Event::ActorDamaged {
                    target,
                    amount,
                    remaining,
                });
            }
            DamageOutcome::Died => {
                self.last_player_hit = Some(self.clock);
                self.player_dead = true;
                info!(?source, level = self.progression.level(), "player died");
                out_events.push(Event::ActorDamaged {
                    target,
                    amount,
                    remaining: 0.0,
                });
                out_events.push(Event::PlayerDied);
            }
        }
    }

    fn damage_hostile(&mut self, target: EntityId, amount: f32, out_events: &mut Vec<Event>) {
        let Some(hostile) = self.entities.get_mut(&target) else {
            return;
        };
        match hostile.take_damage(amount) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Survived { remaining } => out_events.push(Event::ActorDamaged {
                target,
                amount,
                remaining,
            }),
            DamageOutcome::Died => {
                let Some(hostile) = self.remove_hostile(target) else {
                    return;
                };
                let EntityKind::Hostile { template, xp, .. } = *hostile.kind() else {
                    return;
                };
                out_events.push(Event::ActorDamaged {
                    target,
                    amount,
                    remaining: 0.0,
                });
                out_events.push(Event::HostileKilled {
                    actor: target,
                    template,
                    xp,
                });
                for level in self.progression.grant(xp) {
                    info!(level, "player levelled up");
                    out_events.push(Event::PlayerLevelledUp { level });
                }
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::MoveActor {
            actor,
            body,
            direction,
        } => {
            let Some(entity) = world.entities.get_mut(&actor) else {
                return;
            };
            if matches!(entity.kind(), EntityKind::Projectile { .. }) {
                return;
            }
            entity.set_body(body);
            entity.set_direction(direction);
            if entity.is_hostile() {
                let _ = world.hostile_index.update(actor, body.center());
            }
        }
        Command::SpawnHostile { template, center } => {
            if !world.hostile_templates.contains_key(&template) {
                warn!(template = template.get(), "hostile template is not defined");
                return;
            }
            if world.hostile_count() >= world.config.max_hostiles {
                debug!(template = template.get(), "hostile cap reached");
                return;
            }
            let actor = world.allocate_id();
            let Some(definition) = world.hostile_templates.get(&template) else {
                return;
            };
            let hostile = Entity::hostile(actor, definition, center);
            world.hostile_index.insert(actor, center);
            let _ = world.entities.insert(actor, hostile);
            out_events.push(Event::HostileSpawned {
                actor,
                template,
                center,
            });
        }
        Command::SpawnProjectile {
            weapon,
            slot,
            origin,
            angle_degrees,
            appearance,
        } => {
            let Some(definition) = world.weapons.get(&weapon) else {
                warn!(weapon = weapon.get(), "projectile weapon is not defined");
                return;
            };
            let speed = definition.speed;
            let projectile = world.allocate_id();
            let entity = Entity::projectile(
                projectile,
                weapon,
                slot,
                origin,
                direction_from_degrees(angle_degrees),
                speed,
                appearance,
            );
            let _ = world.entities.insert(projectile, entity);
            out_events.push(Event::ProjectileSpawned {
                projectile,
                weapon,
                slot,
            });
        }
        Command::AdvanceProjectile {
            projectile,
            center,
            travelled,
        } => {
            if let Some(entity) = world.entities.get_mut(&projectile) {
                entity.advance_projectile(center, travelled);
            }
        }
        Command::ExpireProjectile { projectile, reason } => {
            let is_projectile = world
                .entities
                .get(&projectile)
                .is_some_and(|entity| matches!(entity.kind(), EntityKind::Projectile { .. }));
            if is_projectile {
                let _ = world.entities.remove(&projectile);
                out_events.push(Event::ProjectileExpired { projectile, reason });
            }
        }
        Command::DamageActor {
            target,
            amount,
            source,
        } => {
            if target == world.player {
                world.damage_player(amount, source, out_events);
            } else {
                world.damage_hostile(target, amount, out_events);
            }
        }
        Command::CullHostile { actor } => {
            if world.remove_hostile(actor).is_some() {
                debug!(actor = actor.get(), "misplaced hostile removed");
                out_events.push(Event::HostileCulled { actor });
            }
        }
        Command::ApplyUpgrade { effect } => {
            match upgrades::apply_effect(world, &effect, out_events) {
                Ok(()) => out_events.push(Event::UpgradeApplied { effect }),
                Err(reason) => {
                    warn!(%reason, ?effect, "upgrade rejected");
                    out_events.push(Event::UpgradeRejected { effect, reason });
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{collections::BTreeMap, time::Duration};

    use swarmfall_core::{
        Aabb, Collidable, EntityId, FlagValue, HostileKindId, HostileTemplate, UpgradeDefinition,
        UpgradeId, Vec2, WeaponDefinition, WeaponId,
    };

    use super::{Entity, EntityKind, PlayerStats, Progression, TileMap, World};

    /// The controllable unit.
    #[must_use]
    pub fn player(world: &World) -> Option<&Entity> {
        world.entities.get(&world.player)
    }

    /// Identifier of the controllable unit.
    #[must_use]
    pub fn player_id(world: &World) -> EntityId {
        world.player
    }

    /// Player statistics as rewritten by upgrades.
    #[must_use]
    pub fn player_stats(world: &World) -> &PlayerStats {
        &world.stats
    }

    /// Player level and experience.
    #[must_use]
    pub fn progression(world: &World) -> &Progression {
        &world.progression
    }

    /// Current player level.
    #[must_use]
    pub fn player_level(world: &World) -> u32 {
        world.progression.level()
    }

    /// Reports whether the player's health has been depleted.
    #[must_use]
    pub fn is_player_dead(world: &World) -> bool {
        world.player_dead
    }

    /// Named flags set by upgrades.
    #[must_use]
    pub fn flags(world: &World) -> &BTreeMap<String, FlagValue> {
        &world.flags
    }

    /// Entity with the identifier, if it is alive.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<&Entity> {
        world.entities.get(&id)
    }

    /// Live hostiles in identifier order.
    pub fn hostiles(world: &World) -> impl Iterator<Item = &Entity> {
        world.entities.values().filter(|entity| entity.is_hostile())
    }

    /// Number of live hostiles.
    #[must_use]
    pub fn hostile_count(world: &World) -> usize {
        world.hostile_count()
    }

    /// Hard cap on live hostiles.
    #[must_use]
    pub fn max_hostiles(world: &World) -> usize {
        world.config.max_hostiles
    }

    /// In-flight projectiles in identifier order.
    pub fn projectiles(world: &World) -> impl Iterator<Item = &Entity> {
        world
            .entities
            .values()
            .filter(|entity| matches!(entity.kind(), EntityKind::Projectile { .. }))
    }

    /// Hostiles whose hitbox reaches into the circle, in identifier order.
    ///
    /// Candidates come from the hostile spatial index; the exact circle test
    /// is applied before returning.
    #[must_use]
    pub fn hostiles_near(world: &World, center: Vec2, radius: f32) -> Vec<EntityId> {
        let reach = radius.max(0.0) + world.hostile_reach;
        let mut found: Vec<EntityId> = world
            .hostile_index
            .query(center, Some(reach))
            .into_iter()
            .filter(|id| {
                world
                    .entities
                    .get(id)
                    .is_some_and(|hostile| hostile.hitbox().intersects_circle(center, radius))
            })
            .collect();
        found.sort_unstable();
        found
    }

    /// Hostiles whose hitbox overlaps the area, in identifier order.
    #[must_use]
    pub fn hostiles_overlapping(world: &World, area: &Aabb) -> Vec<EntityId> {
        let mut found: Vec<EntityId> = world
            .hostile_index
            .query(area.center(), Some(area.half_diagonal() + world.hostile_reach))
            .into_iter()
            .filter(|id| {
                world
                    .entities
                    .get(id)
                    .is_some_and(|hostile| hostile.hitbox().overlaps(area))
            })
            .collect();
        found.sort_unstable();
        found
    }

    /// Obstacle hitboxes that reach into the circle, in map order.
    #[must_use]
    pub fn obstacles_near(world: &World, center: Vec2, radius: f32) -> Vec<Aabb> {
        let reach = radius.max(0.0) + world.obstacle_reach;
        let mut indices = world.obstacle_index.query(center, Some(reach));
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|index| world.obstacles.get(index).copied())
            .filter(|obstacle| obstacle.intersects_circle(center, radius))
            .collect()
    }

    /// Every obstacle hitbox in map order.
    #[must_use]
    pub fn obstacles(world: &World) -> &[Aabb] {
        &world.obstacles
    }

    /// Terrain the world was built on.
    #[must_use]
    pub fn terrain(world: &World) -> &TileMap {
        &world.map
    }

    /// Equipped weapon sequence; duplicates stack.
    #[must_use]
    pub fn loadout(world: &World) -> &[WeaponId] {
        &world.loadout
    }

    /// Live weapon definition.
    #[must_use]
    pub fn weapon(world: &World, id: WeaponId) -> Option<&WeaponDefinition> {
        world.weapons.get(&id)
    }

    /// All live weapon definitions.
    #[must_use]
    pub fn weapons(world: &World) -> &BTreeMap<WeaponId, WeaponDefinition> {
        &world.weapons
    }

    /// Hostile templates available to the spawner.
    #[must_use]
    pub fn hostile_templates(world: &World) -> &BTreeMap<HostileKindId, HostileTemplate> {
        &world.hostile_templates
    }

    /// Upgrade definitions available to the draft.
    #[must_use]
    pub fn upgrades(world: &World) -> &BTreeMap<UpgradeId, UpgradeDefinition> {
        &world.upgrades
    }

    /// Simulated time elapsed since the session began.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }
}

#[cfg(test)]
mod tests {
    use swarmfall_core::{
        Appearance, BuffMode, Color, ExpiryReason, FallbackShape, PlayerAttribute, SlotIndex,
        StatMode, UpgradeEffect, UpgradeError, WeaponField, WeaponTarget,
    };

    use super::*;

    const HOSTILES: &str = r#"[
        {"id": 2001, "name": "slime", "damage": 5, "speed": 80, "health": 20, "xp": 60}
    ]"#;
    const WEAPONS: &str = r#"[
        {"id": 3001, "name": "bolt", "damage": 10, "cooldown": 500, "speed": 600},
        {"id": 3002, "name": "ring", "damage": 4, "cooldown": 250, "speed": 180, "type": "orbital"}
    ]"#;

    fn world() -> World {
        let tables =
            DefinitionTables::from_json(HOSTILES, WEAPONS, "[]", &IdRanges::default())
                .expect("tables parse");
        let map = TileMap::open(20, 20, 64.0).expect("valid map");
        let config = WorldConfig {
            starting_weapons: vec![WeaponId::new(3001), WeaponId::new(3999)],
            ..WorldConfig::default()
        };
        World::new(config, map, tables)
    }

    fn spawn(world: &mut World, center: Vec2) -> EntityId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnHostile {
                template: HostileKindId::new(2001),
                center,
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::HostileSpawned { actor, .. }] => *actor,
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn unknown_starting_weapons_are_skipped() {
        let world = world();
        assert_eq!(query::loadout(&world), &[WeaponId::new(3001)]);
        assert_eq!(
            query::player(&world).map(Entity::center),
            Some(Vec2::new(10.0 * 64.0 + 32.0, 10.0 * 64.0 + 32.0))
        );
    }

    #[test]
    fn killing_hostile_grants_xp_and_levels() {
        let mut world = world();
        let first = spawn(&mut world, Vec2::new(300.0, 300.0));
        let second = spawn(&mut world, Vec2::new(400.0, 300.0));
        let mut events = Vec::new();

        for target in [first, second] {
            apply(
                &mut world,
                Command::DamageActor {
                    target,
                    amount: 25.0,
                    source: DamageSource::Weapon(WeaponId::new(3001)),
                },
                &mut events,
            );
        }

        assert!(events.contains(&Event::HostileKilled {
            actor: second,
            template: HostileKindId::new(2001),
            xp: 60,
        }));
        assert!(events.contains(&Event::PlayerLevelledUp { level: 2 }));
        assert_eq!(query::hostile_count(&world), 0);
        assert_eq!(query::progression(&world).xp(), 20);
    }

    #[test]
    fn damage_to_missing_actor_is_ignored() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamageActor {
                target: EntityId::new(999),
                amount: 5.0,
                source: DamageSource::Weapon(WeaponId::new(3001)),
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn player_ignores_hits_inside_invulnerability_window() {
        let mut world = world();
        let player = query::player_id(&world);
        let contact = DamageSource::Contact(HostileKindId::new(2001));
        let mut events = Vec::new();

        let hit = |world: &mut World, events: &mut Vec<Event>| {
            apply(
                world,
                Command::DamageActor {
                    target: player,
                    amount: 5.0,
                    source: contact,
                },
                events,
            );
        };

        hit(&mut world, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(300),
            },
            &mut events,
        );
        hit(&mut world, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(200),
            },
            &mut events,
        );
        hit(&mut world, &mut events);

        let hits: Vec<f32> = events
            .iter()
            .filter_map(|event| match event {
                Event::ActorDamaged { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(hits, vec![95.0, 90.0]);
    }

    #[test]
    fn hostile_cap_blocks_further_spawns() {
        let tables = DefinitionTables::from_json(HOSTILES, "[]", "[]", &IdRanges::default())
            .expect("tables parse");
        let map = TileMap::open(20, 20, 64.0).expect("valid map");
        let config = WorldConfig {
            max_hostiles: 2,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, map, tables);
        let mut events = Vec::new();
        for _ in 0..4 {
            apply(
                &mut world,
                Command::SpawnHostile {
                    template: HostileKindId::new(2001),
                    center: Vec2::new(200.0, 200.0),
                },
                &mut events,
            );
        }
        assert_eq!(query::hostile_count(&world), 2);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn hostile_queries_follow_movement() {
        let mut world = world();
        let actor = spawn(&mut world, Vec2::new(300.0, 300.0));
        assert_eq!(query::hostiles_near(&world, Vec2::new(300.0, 300.0), 0.0), vec![actor]);

        let moved = Body::centered(Vec2::new(900.0, 900.0), Vec2::splat(48.0), Vec2::splat(10.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveActor {
                actor,
                body: moved,
                direction: Vec2::X,
            },
            &mut events,
        );

        assert!(query::hostiles_near(&world, Vec2::new(300.0, 300.0), 50.0).is_empty());
        assert_eq!(query::hostiles_near(&world, Vec2::new(930.0, 900.0), 20.0), vec![actor]);
        assert_eq!(
            query::hostiles_overlapping(&world, &Aabb::from_center(Vec2::new(900.0, 900.0), Vec2::splat(4.0))),
            vec![actor]
        );
    }

    #[test]
    fn obstacles_near_finds_perimeter_walls() {
        let world = world();
        let near_corner = query::obstacles_near(&world, Vec2::new(96.0, 96.0), 40.0);
        assert!(!near_corner.is_empty());
        assert!(query::obstacles_near(&world, Vec2::new(640.0, 640.0), 40.0).is_empty());
    }

    #[test]
    fn projectile_lifecycle_emits_events() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnProjectile {
                weapon: WeaponId::new(3001),
                slot: SlotIndex::new(0),
                origin: Vec2::new(500.0, 500.0),
                angle_degrees: 90.0,
                appearance: Appearance::Fallback(FallbackShape::Circle {
                    radius: 8.0,
                    color: Color::from_rgba(255, 200, 50, 255),
                }),
            },
            &mut events,
        );
        let Some(Event::ProjectileSpawned { projectile, .. }) = events.first().cloned() else {
            panic!("projectile not spawned: {events:?}");
        };

        apply(
            &mut world,
            Command::AdvanceProjectile {
                projectile,
                center: Vec2::new(500.0, 560.0),
                travelled: 60.0,
            },
            &mut events,
        );
        let entity = query::entity(&world, projectile).expect("projectile alive");
        assert_eq!(entity.center(), Vec2::new(500.0, 560.0));
        assert!(matches!(
            entity.kind(),
            EntityKind::Projectile { travelled, .. } if *travelled == 60.0
        ));

        apply(
            &mut world,
            Command::ExpireProjectile {
                projectile,
                reason: ExpiryReason::Range,
            },
            &mut events,
        );
        assert_eq!(query::projectiles(&world).count(), 0);
        assert_eq!(
            events.last(),
            Some(&Event::ProjectileExpired {
                projectile,
                reason: ExpiryReason::Range,
            })
        );
    }

    #[test]
    fn weapon_buff_rewrites_shared_definition() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyUpgrade {
                effect: UpgradeEffect::WeaponBuff {
                    target: WeaponTarget::All,
                    changes: vec![(WeaponField::Damage, 2.0), (WeaponField::Radius, 20.0)],
                    mode: BuffMode::Multiply,
                },
            },
            &mut events,
        );

        let bolt = query::weapon(&world, WeaponId::new(3001)).expect("bolt");
        let ring = query::weapon(&world, WeaponId::new(3002)).expect("ring");
        assert_eq!(bolt.damage, 20.0);
        assert_eq!(ring.damage, 8.0);
        assert_eq!(ring.data.radius, Some(1600.0));
        assert!(matches!(events.as_slice(), [Event::UpgradeApplied { .. }]));
    }

    #[test]
    fn rejected_upgrade_leaves_world_untouched() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyUpgrade {
                effect: UpgradeEffect::WeaponBuff {
                    target: WeaponTarget::All,
                    changes: vec![(WeaponField::Damage, 2.0), (WeaponField::Speed, f32::NAN)],
                    mode: BuffMode::Add,
                },
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ApplyUpgrade {
                effect: UpgradeEffect::AddWeapon {
                    weapon: WeaponId::new(3500),
                },
            },
            &mut events,
        );

        assert_eq!(query::weapon(&world, WeaponId::new(3001)).map(|w| w.damage), Some(10.0));
        assert_eq!(query::loadout(&world).len(), 1);
        assert!(matches!(
            events.as_slice(),
            [
                Event::UpgradeRejected {
                    reason: UpgradeError::NonFinite {
                        field: WeaponField::Speed
                    },
                    ..
                },
                Event::UpgradeRejected {
                    reason: UpgradeError::UnknownWeapon(_),
                    ..
                },
            ]
        ));
    }

    #[test]
    fn add_weapon_appends_stacking_slot() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyUpgrade {
                effect: UpgradeEffect::AddWeapon {
                    weapon: WeaponId::new(3001),
                },
            },
            &mut events,
        );
        assert_eq!(query::loadout(&world), &[WeaponId::new(3001), WeaponId::new(3001)]);
        assert_eq!(
            events.first(),
            Some(&Event::WeaponEquipped {
                slot: SlotIndex::new(1),
                weapon: WeaponId::new(3001),
            })
        );
    }

    #[test]
    fn player_upgrades_touch_stats_health_and_flags() {
        let mut world = world();
        let mut events = Vec::new();
        let effects = [
            UpgradeEffect::PlayerStat {
                attribute: PlayerAttribute::Speed,
                value: 1.5,
                mode: StatMode::Multiply,
            },
            UpgradeEffect::PlayerStat {
                attribute: PlayerAttribute::MaxHealth,
                value: 20.0,
                mode: StatMode::Add,
            },
            UpgradeEffect::Heal {
                amount: 50.0,
                clamp_to_max: true,
            },
            UpgradeEffect::SetFlag {
                key: "life_steal".to_owned(),
                value: FlagValue::Bool(true),
            },
        ];
        for effect in effects {
            apply(&mut world, Command::ApplyUpgrade { effect }, &mut events);
        }

        assert_eq!(query::player_stats(&world).speed(), 450.0);
        assert_eq!(
            query::player(&world).map(Movable::speed),
            Some(450.0)
        );
        let vitals = query::player(&world).and_then(Entity::vitals).copied();
        assert_eq!(vitals.map(|v| (v.current(), v.maximum())), Some((120.0, 120.0)));
        assert_eq!(query::flags(&world).get("life_steal"), Some(&FlagValue::Bool(true)));
    }
}
