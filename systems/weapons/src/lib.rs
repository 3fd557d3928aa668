#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that fires equipped weapons and drives persistent weapon effects.
//!
//! Every equipped slot keeps its own cooldown timestamp, even when several
//! slots reference the same definition. Definitions are looked up by id on
//! every tick so upgrades that rewrite them take effect on the next frame.

use std::{collections::BTreeMap, time::Duration};

use swarmfall_core::{
    degrees_from_direction, direction_from_degrees, Aabb, Appearance, Collidable, Color, Command,
    DamageSource, EntityId, Event, ExpiryReason, FallbackShape, Movable, ResourceProvider,
    SlotIndex, Vec2, WeaponBehavior, WeaponDefinition, WeaponId,
};
use swarmfall_world::{query, Entity, EntityKind, World};
use tracing::debug;

/// Angular spread between neighbouring shots of stacked projectile weapons.
pub const DEFAULT_SPREAD_DEGREES: f32 = 15.0;

/// Edge length of an orbital hitbox before `data.scale` is applied.
pub const DEFAULT_ORBITAL_SIZE: f32 = 24.0;

/// Tunable parameters of the weapon system.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Degrees between neighbouring shots of a stacked projectile group.
    pub spread_degrees: f32,
    /// Unscaled orbital hitbox edge length.
    pub orbital_size: f32,
    /// Shape drawn for projectiles whose image is missing.
    pub projectile_fallback: FallbackShape,
    /// Fill colour of orbitals whose image is missing.
    pub orbital_color: Color,
    /// Stroke colour of auras whose image is missing.
    pub aura_color: Color,
    /// Stroke thickness of the aura fallback ring.
    pub aura_thickness: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spread_degrees: DEFAULT_SPREAD_DEGREES,
            orbital_size: DEFAULT_ORBITAL_SIZE,
            projectile_fallback: FallbackShape::Circle {
                radius: 8.0,
                color: Color::from_rgba(255, 200, 50, 255),
            },
            orbital_color: Color::from_rgba(120, 200, 255, 255),
            aura_color: Color::from_rgba(120, 255, 160, 96),
            aura_thickness: 3.0,
        }
    }
}

/// Persistent instance circling the player.
#[derive(Clone, Debug, PartialEq)]
pub struct Orbital {
    slot: SlotIndex,
    weapon: WeaponId,
    angle: f32,
    center: Vec2,
    size: f32,
    last_tick: Duration,
    appearance: Appearance,
}

impl Orbital {
    /// Slot the instance was created for.
    #[must_use]
    pub const fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// Definition the instance reads its live values from.
    #[must_use]
    pub const fn weapon(&self) -> WeaponId {
        self.weapon
    }

    /// Current angle around the owner in degrees, in `[0, 360)`.
    #[must_use]
    pub const fn angle(&self) -> f32 {
        self.angle
    }

    /// Centre of the instance after the latest tick.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Area that damages hostiles.
    #[must_use]
    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.center, Vec2::splat(self.size))
    }

    /// Time of the latest damage tick that hit something.
    #[must_use]
    pub const fn last_tick(&self) -> Duration {
        self.last_tick
    }

    /// How the instance should be drawn.
    #[must_use]
    pub const fn appearance(&self) -> &Appearance {
        &self.appearance
    }
}

/// Persistent damage field centred on the player.
#[derive(Clone, Debug, PartialEq)]
pub struct Aura {
    slot: SlotIndex,
    weapon: WeaponId,
    center: Vec2,
    radius: f32,
    last_tick: Duration,
    appearance: Appearance,
}

impl Aura {
    /// Slot the field was created for.
    #[must_use]
    pub const fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// Definition the field reads its live values from.
    #[must_use]
    pub const fn weapon(&self) -> WeaponId {
        self.weapon
    }

    /// Centre of the field after the latest tick.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Damage radius after the latest tick.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Time of the latest damage tick.
    #[must_use]
    pub const fn last_tick(&self) -> Duration {
        self.last_tick
    }

    /// How the field should be drawn.
    #[must_use]
    pub const fn appearance(&self) -> &Appearance {
        &self.appearance
    }
}

/// Weapon system that turns the equipped loadout into projectile and damage commands.
#[derive(Debug)]
pub struct Weapons {
    config: Config,
    last_fired: Vec<Duration>,
    orbitals: Vec<Orbital>,
    auras: Vec<Aura>,
    facing: Vec2,
}

impl Default for Weapons {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Weapons {
    /// Creates a weapon system with no slot history.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            last_fired: Vec::new(),
            orbitals: Vec::new(),
            auras: Vec::new(),
            facing: Vec2::X,
        }
    }

    /// Per-slot timestamps of the latest projectile shot.
    #[must_use]
    pub fn last_fired(&self) -> &[Duration] {
        &self.last_fired
    }

    /// Live orbital instances in slot order.
    #[must_use]
    pub fn orbitals(&self) -> &[Orbital] {
        &self.orbitals
    }

    /// Live aura fields in slot order.
    #[must_use]
    pub fn auras(&self) -> &[Aura] {
        &self.auras
    }

    /// Consumes world events and emits weapon commands for the elapsed frame.
    ///
    /// Runs after motion commands have been applied, so every effect uses the
    /// player's resolved position. `aim` is the firing direction; a zero aim
    /// keeps the previous one.
    pub fn handle(
        &mut self,
        events: &[Event],
        world: &World,
        aim: Vec2,
        assets: &dyn ResourceProvider,
        out: &mut Vec<Command>,
    ) {
        let dt = elapsed(events);
        if dt.is_zero() || query::is_player_dead(world) {
            return;
        }
        let Some(owner) = query::player(world).map(Entity::center) else {
            return;
        };
        if aim != Vec2::ZERO {
            self.facing = aim;
        }
        let now = query::clock(world);
        let dt_secs = dt.as_secs_f32();

        let slots = query::loadout(world).len();
        if self.last_fired.len() < slots {
            self.last_fired.resize(slots, Duration::ZERO);
        }

        self.sync_orbitals(world, owner, assets);
        self.sync_auras(world, owner, assets);

        advance_projectiles(world, dt_secs, out);
        self.tick_orbitals(world, owner, now, dt_secs, out);
        self.tick_auras(world, owner, now, out);
        self.fire(world, owner, now, assets, out);
    }

    fn sync_orbitals(&mut self, world: &World, owner: Vec2, assets: &dyn ResourceProvider) {
        let slots = equipped(world, WeaponBehavior::Orbital);
        if slots.len() == self.orbitals.len() {
            return;
        }

        let step = 360.0 / slots.len().max(1) as f32;
        self.orbitals = slots
            .into_iter()
            .enumerate()
            .map(|(rank, (slot, definition))| {
                let angle = rank as f32 * step;
                let size = self.config.orbital_size * definition.data.scale;
                Orbital {
                    slot,
                    weapon: definition.id,
                    angle,
                    center: owner + direction_from_degrees(angle) * definition.radius(),
                    size,
                    last_tick: Duration::ZERO,
                    appearance: Appearance::resolve(
                        assets,
                        definition.effect_key(),
                        FallbackShape::Circle {
                            radius: size * 0.5,
                            color: self.config.orbital_color,
                        },
                    ),
                }
            })
            .collect();
        debug!(count = self.orbitals.len(), "orbitals respawned");
    }

    fn sync_auras(&mut self, world: &World, owner: Vec2, assets: &dyn ResourceProvider) {
        let slots = equipped(world, WeaponBehavior::Aura);
        if slots.len() == self.auras.len() {
            return;
        }

        self.auras = slots
            .into_iter()
            .map(|(slot, definition)| Aura {
                slot,
                weapon: definition.id,
                center: owner,
                radius: aura_radius(definition),
                last_tick: Duration::ZERO,
                appearance: Appearance::resolve(
                    assets,
                    definition.effect_key(),
                    FallbackShape::Ring {
                        radius: aura_radius(definition),
                        thickness: self.config.aura_thickness,
                        color: self.config.aura_color,
                    },
                ),
            })
            .collect();
        debug!(count = self.auras.len(), "auras rebuilt");
    }

    fn tick_orbitals(
        &mut self,
        world: &World,
        owner: Vec2,
        now: Duration,
        dt_secs: f32,
        out: &mut Vec<Command>,
    ) {
        for orbital in &mut self.orbitals {
            let Some(definition) = query::weapon(world, orbital.weapon) else {
                continue;
            };
            orbital.angle = (orbital.angle + definition.speed * dt_secs).rem_euclid(360.0);
            orbital.center = owner + direction_from_degrees(orbital.angle) * definition.radius();
            orbital.size = self.config.orbital_size * definition.data.scale;
            resize_fallback(&mut orbital.appearance, orbital.size * 0.5);

            if now.saturating_sub(orbital.last_tick) < definition.cooldown_period() {
                continue;
            }
            let hits = query::hostiles_overlapping(world, &orbital.hitbox());
            if hits.is_empty() {
                continue;
            }
            push_damage(&hits, definition, out);
            orbital.last_tick = now;
        }
    }

    fn tick_auras(&mut self, world: &World, owner: Vec2, now: Duration, out: &mut Vec<Command>) {
        for aura in &mut self.auras {
            let Some(definition) = query::weapon(world, aura.weapon) else {
                continue;
            };
            aura.center = owner;
            aura.radius = aura_radius(definition);
            resize_fallback(&mut aura.appearance, aura.radius);

            if now.saturating_sub(aura.last_tick) < definition.cooldown_period() {
                continue;
            }
            let hits = query::hostiles_near(world, aura.center, aura.radius);
            push_damage(&hits, definition, out);
            aura.last_tick = now;
        }
    }

    fn fire(
        &mut self,
        world: &World,
        owner: Vec2,
        now: Duration,
        assets: &dyn ResourceProvider,
        out: &mut Vec<Command>,
    ) {
        let slots = equipped(world, WeaponBehavior::Projectile);
        let mut totals: BTreeMap<WeaponId, usize> = BTreeMap::new();
        for (_, definition) in &slots {
            *totals.entry(definition.id).or_default() += 1;
        }

        let aim_degrees = degrees_from_direction(self.facing);
        let mut ranks: BTreeMap<WeaponId, usize> = BTreeMap::new();
        for (slot, definition) in slots {
            let total = totals.get(&definition.id).copied().unwrap_or(1);
            let rank = ranks.entry(definition.id).or_default();
            let offset = fan_offset(*rank, total, self.config.spread_degrees);
            *rank += 1;

            let Some(last) = self.last_fired.get_mut(slot.get()) else {
                continue;
            };
            if now.saturating_sub(*last) < definition.cooldown_period() {
                continue;
            }
            *last = now;

            out.push(Command::SpawnProjectile {
                weapon: definition.id,
                slot,
                origin: owner,
                angle_degrees: aim_degrees + offset,
                appearance: Appearance::resolve(
                    assets,
                    &definition.image,
                    self.config.projectile_fallback,
                ),
            });
        }
    }
}

/// Angle offsets for a group of `count` stacked projectile slots, by rank.
///
/// The offsets are symmetric about zero and span `spread_degrees × (count − 1)`.
/// A single slot fires straight.
#[must_use]
pub fn fan_offsets(count: usize, spread_degrees: f32) -> Vec<f32> {
    (0..count)
        .map(|rank| fan_offset(rank, count, spread_degrees))
        .collect()
}

fn fan_offset(rank: usize, count: usize, spread_degrees: f32) -> f32 {
    if count < 2 {
        return 0.0;
    }
    let gaps = (count - 1) as f32;
    let spread = spread_degrees * gaps;
    -spread / 2.0 + rank as f32 * (spread / gaps)
}

/// Keeps a procedural stand-in the same size as the live effect it draws.
fn resize_fallback(appearance: &mut Appearance, live_radius: f32) {
    if let Appearance::Fallback(
        FallbackShape::Circle { radius, .. } | FallbackShape::Ring { radius, .. },
    ) = appearance
    {
        *radius = live_radius;
    }
}

fn aura_radius(definition: &WeaponDefinition) -> f32 {
    definition.radius() * definition.data.scale
}

fn equipped(world: &World, behavior: WeaponBehavior) -> Vec<(SlotIndex, &WeaponDefinition)> {
    query::loadout(world)
        .iter()
        .enumerate()
        .filter_map(|(index, weapon)| {
            query::weapon(world, *weapon)
                .filter(|definition| definition.behavior == behavior)
                .map(|definition| (SlotIndex::new(index), definition))
        })
        .collect()
}

fn advance_projectiles(world: &World, dt_secs: f32, out: &mut Vec<Command>) {
    for projectile in query::projectiles(world) {
        let EntityKind::Projectile {
            weapon, travelled, ..
        } = projectile.kind()
        else {
            continue;
        };
        let id = projectile.id();
        let Some(definition) = query::weapon(world, *weapon) else {
            out.push(Command::ExpireProjectile {
                projectile: id,
                reason: ExpiryReason::MissingDefinition,
            });
            continue;
        };

        let distance = definition.speed * dt_secs;
        let center = projectile.center() + projectile.direction() * distance;
        let travelled = travelled + distance;
        let hitbox = Aabb::from_center(center, projectile.hitbox().size());

        let blocked = query::obstacles_near(world, center, hitbox.half_diagonal())
            .iter()
            .any(|obstacle| obstacle.overlaps(&hitbox));
        if blocked {
            out.push(Command::ExpireProjectile {
                projectile: id,
                reason: ExpiryReason::Obstacle,
            });
            continue;
        }

        if let Some(&target) = query::hostiles_overlapping(world, &hitbox).first() {
            out.push(Command::DamageActor {
                target,
                amount: definition.damage,
                source: DamageSource::Weapon(definition.id),
            });
            out.push(Command::ExpireProjectile {
                projectile: id,
                reason: ExpiryReason::Hit,
            });
            continue;
        }

        if travelled > definition.range() {
            out.push(Command::ExpireProjectile {
                projectile: id,
                reason: ExpiryReason::Range,
            });
            continue;
        }

        out.push(Command::AdvanceProjectile {
            projectile: id,
            center,
            travelled,
        });
    }
}

fn push_damage(
    targets: &[EntityId],
    definition: &WeaponDefinition,
    out: &mut Vec<Command>,
) {
    out.extend(targets.iter().map(|target| Command::DamageActor {
        target: *target,
        amount: definition.damage,
        source: DamageSource::Weapon(definition.id),
    }));
}

fn elapsed(events: &[Event]) -> Duration {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TimeAdvanced { dt } => Some(*dt),
            _ => None,
        })
        .fold(Duration::ZERO, Duration::saturating_add)
}

#[cfg(test)]
mod tests {
    use swarmfall_core::{
        BuffMode, HostileKindId, Image, Sound, UpgradeEffect, WeaponField, WeaponTarget,
    };
    use swarmfall_world::{self as world, DefinitionTables, IdRanges, TileMap, WorldConfig};

    use super::*;

    const HOSTILES: &str = r#"[
        {"id": 2001, "name": "brute", "damage": 1, "speed": 0, "health": 1000}
    ]"#;
    const WEAPONS: &str = r#"[
        {"id": 3001, "name": "bolt", "damage": 10, "cooldown": 500, "speed": 600},
        {"id": 3002, "name": "ring", "damage": 4, "cooldown": 250, "speed": 0, "type": "orbital"},
        {"id": 3003, "name": "halo", "damage": 3, "cooldown": 250, "type": "aura"}
    ]"#;

    struct NoAssets;

    impl ResourceProvider for NoAssets {
        fn image(&self, _key: &str) -> Image {
            Image::sentinel()
        }

        fn sound(&self, _key: &str) -> Option<Sound> {
            None
        }
    }

    fn world_with(loadout: &[u32]) -> World {
        let tables = DefinitionTables::from_json(HOSTILES, WEAPONS, "[]", &IdRanges::default())
            .expect("tables parse");
        let map = TileMap::open(20, 20, 64.0).expect("valid map");
        let config = WorldConfig {
            starting_weapons: loadout.iter().copied().map(WeaponId::new).collect(),
            ..WorldConfig::default()
        };
        World::new(config, map, tables)
    }

    fn frame(world: &mut World, weapons: &mut Weapons, millis: u64) -> Vec<Command> {
        let mut events = Vec::new();
        world::apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            &mut events,
        );
        let mut commands = Vec::new();
        weapons.handle(&events, world, Vec2::X, &NoAssets, &mut commands);
        for command in commands.clone() {
            world::apply(world, command, &mut events);
        }
        commands
    }

    fn upgrade(world: &mut World, effect: UpgradeEffect) {
        let mut events = Vec::new();
        world::apply(world, Command::ApplyUpgrade { effect }, &mut events);
    }

    fn spawn_hostile(world: &mut World, offset: Vec2) {
        let center = query::player(world).map(Entity::center).unwrap_or_default() + offset;
        let mut events = Vec::new();
        world::apply(
            world,
            Command::SpawnHostile {
                template: HostileKindId::new(2001),
                center,
            },
            &mut events,
        );
    }

    fn shots(commands: &[Command]) -> Vec<(SlotIndex, f32)> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnProjectile {
                    slot,
                    angle_degrees,
                    ..
                } => Some((*slot, *angle_degrees)),
                _ => None,
            })
            .collect()
    }

    fn damage_count(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|command| matches!(command, Command::DamageActor { .. }))
            .count()
    }

    #[test]
    fn fan_offsets_are_symmetric_and_span_the_spread() {
        assert_eq!(fan_offsets(1, 15.0), vec![0.0]);
        for count in 2..=6 {
            let offsets = fan_offsets(count, 15.0);
            let min = offsets.iter().copied().fold(f32::INFINITY, f32::min);
            let max = offsets.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let sum: f32 = offsets.iter().sum();

            assert!((max - min - 15.0 * (count - 1) as f32).abs() < 1e-4);
            assert!(sum.abs() < 1e-4, "offsets {offsets:?} are not centred");
        }
    }

    #[test]
    fn half_second_cooldown_fires_twice_per_second() {
        let mut world = world_with(&[3001]);
        let mut weapons = Weapons::default();

        let fired: usize = (0..10)
            .map(|_| shots(&frame(&mut world, &mut weapons, 100)).len())
            .sum();

        assert_eq!(fired, 2);
    }

    #[test]
    fn stacked_slots_keep_independent_cooldowns() {
        let mut world = world_with(&[3001]);
        let mut weapons = Weapons::default();
        for _ in 0..6 {
            let _ = frame(&mut world, &mut weapons, 100);
        }
        upgrade(
            &mut world,
            UpgradeEffect::AddWeapon {
                weapon: WeaponId::new(3001),
            },
        );

        let at_700 = shots(&frame(&mut world, &mut weapons, 100));
        assert_eq!(at_700, vec![(SlotIndex::new(1), 7.5)]);
        assert_eq!(
            weapons.last_fired(),
            &[Duration::from_millis(500), Duration::from_millis(700)]
        );

        let _ = frame(&mut world, &mut weapons, 100);
        let _ = frame(&mut world, &mut weapons, 100);
        let at_1000 = shots(&frame(&mut world, &mut weapons, 100));
        assert_eq!(at_1000, vec![(SlotIndex::new(0), -7.5)]);
        assert_eq!(weapons.last_fired()[1], Duration::from_millis(700));
    }

    #[test]
    fn orbitals_respawn_evenly_when_count_changes() {
        let mut world = world_with(&[3002, 3002]);
        let mut weapons = Weapons::default();
        let _ = frame(&mut world, &mut weapons, 100);
        let angles: Vec<f32> = weapons.orbitals().iter().map(Orbital::angle).collect();
        assert_eq!(angles, vec![0.0, 180.0]);

        upgrade(
            &mut world,
            UpgradeEffect::AddWeapon {
                weapon: WeaponId::new(3002),
            },
        );
        let _ = frame(&mut world, &mut weapons, 100);

        let angles: Vec<f32> = weapons.orbitals().iter().map(Orbital::angle).collect();
        assert_eq!(angles, vec![0.0, 120.0, 240.0]);
        let owner = query::player(&world).map(Entity::center).unwrap_or_default();
        assert!(weapons.orbitals()[0].center().distance(owner + Vec2::new(80.0, 0.0)) < 1e-3);
        assert!(weapons.orbitals()[0].appearance().is_fallback());
    }

    #[test]
    fn orbital_timer_resets_only_after_a_hit() {
        let mut world = world_with(&[3002]);
        let mut weapons = Weapons::default();
        for _ in 0..4 {
            let _ = frame(&mut world, &mut weapons, 100);
        }
        assert_eq!(weapons.orbitals()[0].last_tick(), Duration::ZERO);

        spawn_hostile(&mut world, Vec2::new(80.0, 0.0));
        let hits: Vec<usize> = (0..4)
            .map(|_| damage_count(&frame(&mut world, &mut weapons, 100)))
            .collect();

        assert_eq!(hits, vec![1, 0, 0, 1]);
        assert_eq!(weapons.orbitals()[0].last_tick(), Duration::from_millis(800));
    }

    #[test]
    fn aura_radius_follows_live_scale() {
        let mut world = world_with(&[3003]);
        let mut weapons = Weapons::default();
        spawn_hostile(&mut world, Vec2::new(150.0, 0.0));

        assert_eq!(damage_count(&frame(&mut world, &mut weapons, 300)), 0);
        assert_eq!(weapons.auras()[0].radius(), 120.0);

        upgrade(
            &mut world,
            UpgradeEffect::WeaponBuff {
                target: WeaponTarget::Only(WeaponId::new(3003)),
                changes: vec![(WeaponField::Scale, 2.0)],
                mode: BuffMode::Multiply,
            },
        );

        assert_eq!(damage_count(&frame(&mut world, &mut weapons, 300)), 1);
        assert_eq!(weapons.auras()[0].radius(), 240.0);
        assert!(matches!(
            weapons.auras()[0].appearance(),
            Appearance::Fallback(FallbackShape::Ring { radius, .. }) if *radius == 240.0
        ));
    }

    #[test]
    fn orbital_fallback_circle_tracks_scaled_hitbox() {
        let mut world = world_with(&[3002]);
        let mut weapons = Weapons::default();
        let _ = frame(&mut world, &mut weapons, 100);
        assert!(matches!(
            weapons.orbitals()[0].appearance(),
            Appearance::Fallback(FallbackShape::Circle { radius, .. }) if *radius == 12.0
        ));

        upgrade(
            &mut world,
            UpgradeEffect::WeaponBuff {
                target: WeaponTarget::Only(WeaponId::new(3002)),
                changes: vec![(WeaponField::Scale, 1.5)],
                mode: BuffMode::Set,
            },
        );
        let _ = frame(&mut world, &mut weapons, 100);

        let orbital = &weapons.orbitals()[0];
        assert_eq!(orbital.hitbox().width(), 36.0);
        assert!(matches!(
            orbital.appearance(),
            Appearance::Fallback(FallbackShape::Circle { radius, .. }) if *radius == 18.0
        ));
    }

    #[test]
    fn extreme_cooldown_buff_does_not_break_the_frame() {
        let mut world = world_with(&[3001, 3002, 3003]);
        let mut weapons = Weapons::default();
        spawn_hostile(&mut world, Vec2::new(80.0, 0.0));
        let _ = frame(&mut world, &mut weapons, 16);

        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ApplyUpgrade {
                effect: UpgradeEffect::WeaponBuff {
                    target: WeaponTarget::All,
                    changes: vec![(WeaponField::Cooldown, 1e30)],
                    mode: BuffMode::Set,
                },
            },
            &mut events,
        );
        assert!(matches!(events.as_slice(), [Event::UpgradeApplied { .. }]));

        let commands = frame(&mut world, &mut weapons, 16);
        assert!(shots(&commands).is_empty());
        assert_eq!(damage_count(&commands), 0);
    }

    #[test]
    fn damage_buffs_reach_in_flight_effects() {
        let mut world = world_with(&[3003]);
        let mut weapons = Weapons::default();
        spawn_hostile(&mut world, Vec2::new(50.0, 0.0));
        let _ = frame(&mut world, &mut weapons, 300);

        upgrade(
            &mut world,
            UpgradeEffect::WeaponBuff {
                target: WeaponTarget::All,
                changes: vec![(WeaponField::Damage, 9.0)],
                mode: BuffMode::Set,
            },
        );
        let commands = frame(&mut world, &mut weapons, 300);

        assert!(commands.iter().any(|command| matches!(
            command,
            Command::DamageActor { amount, .. } if *amount == 9.0
        )));
    }
}
