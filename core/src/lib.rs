#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Swarmfall simulation.
//!
//! This crate defines the message surface that connects the adapter, the
//! authoritative world, and pure systems. Systems read the world through its
//! query module and respond with [`Command`] values describing desired
//! mutations. The world executes those commands via its `apply` entry point
//! and broadcasts [`Event`] values describing what actually happened.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod definitions;
pub mod resources;
pub mod terrain;

pub use definitions::{
    BuffMode, FlagValue, HostileTemplate, PlayerAttribute, StatMode, UpgradeDefinition,
    UpgradeEffect, WeaponAux, WeaponBehavior, WeaponDefinition, WeaponField, WeaponTarget,
    DEFAULT_PROJECTILE_RANGE,
};
pub use glam::Vec2;
pub use resources::{Appearance, Color, FallbackShape, Image, ResourceProvider, Sound};
pub use terrain::{Terrain, TerrainKind, TilePosition};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Relocates a player or hostile actor to an already-resolved body.
    MoveActor {
        /// Actor being moved.
        actor: EntityId,
        /// Render box and hitbox after collision resolution.
        body: Body,
        /// Normalised direction of travel used this frame.
        direction: Vec2,
    },
    /// Requests that a hostile built from the template appear at the position.
    SpawnHostile {
        /// Template describing the hostile.
        template: HostileKindId,
        /// World-space centre of the new hostile.
        center: Vec2,
    },
    /// Requests that a projectile leave the owner along the provided angle.
    SpawnProjectile {
        /// Definition the projectile reads its live values from.
        weapon: WeaponId,
        /// Equipped slot that fired the projectile.
        slot: SlotIndex,
        /// World-space launch point.
        origin: Vec2,
        /// Travel angle measured in degrees from the positive x axis.
        angle_degrees: f32,
        /// Visual the projectile should be drawn with.
        appearance: Appearance,
    },
    /// Moves an in-flight projectile after it survived its collision checks.
    AdvanceProjectile {
        /// Projectile being moved.
        projectile: EntityId,
        /// New world-space centre.
        center: Vec2,
        /// Total distance travelled since launch.
        travelled: f32,
    },
    /// Removes a projectile from the world.
    ExpireProjectile {
        /// Projectile being removed.
        projectile: EntityId,
        /// Why the projectile stopped.
        reason: ExpiryReason,
    },
    /// Deals damage to a damageable actor.
    DamageActor {
        /// Actor receiving the damage.
        target: EntityId,
        /// Amount of health removed.
        amount: f32,
        /// Origin of the damage.
        source: DamageSource,
    },
    /// Removes a misplaced hostile without granting any reward.
    CullHostile {
        /// Hostile being removed.
        actor: EntityId,
    },
    /// Applies an upgrade effect to the player or shared weapon definitions.
    ApplyUpgrade {
        /// Effect to apply.
        effect: UpgradeEffect,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a hostile entered the world.
    HostileSpawned {
        /// Identifier assigned to the hostile.
        actor: EntityId,
        /// Template the hostile was built from.
        template: HostileKindId,
        /// World-space centre of the hostile.
        center: Vec2,
    },
    /// Confirms that a hostile died from damage.
    HostileKilled {
        /// Identifier of the hostile that died.
        actor: EntityId,
        /// Template the hostile was built from.
        template: HostileKindId,
        /// Experience granted to the player.
        xp: u32,
    },
    /// Reports that the safety sweep removed a misplaced hostile.
    HostileCulled {
        /// Identifier of the removed hostile.
        actor: EntityId,
    },
    /// Reports that an actor lost health.
    ActorDamaged {
        /// Actor that was hit.
        target: EntityId,
        /// Amount of health removed.
        amount: f32,
        /// Health remaining after the hit.
        remaining: f32,
    },
    /// Announces that the player's health reached zero.
    PlayerDied,
    /// Announces that the player reached a new level.
    PlayerLevelledUp {
        /// Level reached.
        level: u32,
    },
    /// Confirms that a projectile was launched.
    ProjectileSpawned {
        /// Identifier assigned to the projectile.
        projectile: EntityId,
        /// Definition the projectile belongs to.
        weapon: WeaponId,
        /// Slot that fired it.
        slot: SlotIndex,
    },
    /// Confirms that a projectile was removed.
    ProjectileExpired {
        /// Identifier of the removed projectile.
        projectile: EntityId,
        /// Why the projectile stopped.
        reason: ExpiryReason,
    },
    /// Confirms that a new weapon slot was appended to the loadout.
    WeaponEquipped {
        /// Index of the new slot.
        slot: SlotIndex,
        /// Definition referenced by the slot.
        weapon: WeaponId,
    },
    /// Confirms that an upgrade effect was applied.
    UpgradeApplied {
        /// Effect that took hold.
        effect: UpgradeEffect,
    },
    /// Reports that an upgrade effect could not be applied.
    UpgradeRejected {
        /// Effect that was refused.
        effect: UpgradeEffect,
        /// Why it was refused.
        reason: UpgradeError,
    },
}

/// Reasons a projectile leaves the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpiryReason {
    /// The projectile struck an obstacle.
    Obstacle,
    /// The projectile struck and damaged a hostile.
    Hit,
    /// The projectile travelled past its configured range.
    Range,
    /// The projectile's weapon definition no longer exists.
    MissingDefinition,
}

/// Origin of a damage instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageSource {
    /// Damage dealt by one of the player's weapons.
    Weapon(WeaponId),
    /// Damage dealt by a hostile touching the player.
    Contact(HostileKindId),
}

/// Reasons an upgrade effect may be rejected by the world.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum UpgradeError {
    /// The effect references a weapon definition that was never loaded.
    #[error("weapon {0:?} is not defined")]
    UnknownWeapon(WeaponId),
    /// The effect would produce a non-finite weapon value.
    #[error("weapon field {field} would become non-finite")]
    NonFinite {
        /// Field that would have been corrupted.
        field: WeaponField,
    },
    /// The effect would produce a non-finite player statistic.
    #[error("player statistic {attribute:?} would become non-finite")]
    NonFiniteStat {
        /// Statistic that would have been corrupted.
        attribute: PlayerAttribute,
    },
}

/// Unique identifier assigned to an entity living in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a weapon definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponId(u32);

impl WeaponId {
    /// Creates a new weapon identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a hostile template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostileKindId(u32);

impl HostileKindId {
    /// Creates a new hostile template identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an upgrade definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(u32);

impl UpgradeId {
    /// Creates a new upgrade identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position of a slot inside the equipped weapon sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(usize);

impl SlotIndex {
    /// Creates a new slot index.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based index.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Axis-aligned rectangle stored by its edges in world units.
///
/// The y axis grows downward, so `top < bottom`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    min: Vec2,
    max: Vec2,
}

impl Aabb {
    /// Creates a rectangle from its upper-left corner and size.
    #[must_use]
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(left, top),
            max: Vec2::new(left + width.max(0.0), top + height.max(0.0)),
        }
    }

    /// Creates a rectangle of the provided size centred on a point.
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.max(Vec2::ZERO) * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Left edge.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    /// Top edge.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    /// Width of the rectangle.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Size of the rectangle.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Centre point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half of the diagonal length, the radius of the enclosing circle.
    #[must_use]
    pub fn half_diagonal(&self) -> f32 {
        self.size().length() * 0.5
    }

    /// Reports whether two rectangles share interior area.
    ///
    /// Touching edges do not count as an overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Reports whether the rectangle lies strictly inside `outer`.
    #[must_use]
    pub fn is_strictly_inside(&self, outer: &Aabb) -> bool {
        self.min.x > outer.min.x
            && self.min.y > outer.min.y
            && self.max.x < outer.max.x
            && self.max.y < outer.max.y
    }

    /// Reports whether a point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Reports whether a circle touches or overlaps the rectangle.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let nearest = center.clamp(self.min, self.max);
        nearest.distance_squared(center) <= radius * radius
    }

    /// Moves the rectangle by the provided offset.
    pub fn translate(&mut self, offset: Vec2) {
        self.min += offset;
        self.max += offset;
    }

    /// Moves the rectangle so its centre lands on the point.
    pub fn set_center(&mut self, center: Vec2) {
        let offset = center - self.center();
        self.translate(offset);
    }

    /// Moves the rectangle horizontally so its left edge equals `left`.
    pub fn set_left(&mut self, left: f32) {
        let width = self.width();
        self.min.x = left;
        self.max.x = left + width;
    }

    /// Moves the rectangle horizontally so its right edge equals `right`.
    pub fn set_right(&mut self, right: f32) {
        let width = self.width();
        self.max.x = right;
        self.min.x = right - width;
    }

    /// Moves the rectangle vertically so its top edge equals `top`.
    pub fn set_top(&mut self, top: f32) {
        let height = self.height();
        self.min.y = top;
        self.max.y = top + height;
    }

    /// Moves the rectangle vertically so its bottom edge equals `bottom`.
    pub fn set_bottom(&mut self, bottom: f32) {
        let height = self.height();
        self.max.y = bottom;
        self.min.y = bottom - height;
    }

    /// Returns a copy grown by `dx` horizontally and `dy` vertically around the same centre.
    ///
    /// Negative amounts shrink the rectangle; the size never drops below zero.
    #[must_use]
    pub fn inflate(&self, dx: f32, dy: f32) -> Self {
        Self::from_center(self.center(), self.size() + Vec2::new(dx, dy))
    }
}

/// Paired render box and collision hitbox of an entity.
///
/// The hitbox is the only box used for collision and combat. It is always
/// narrower than the render box and stays centred on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    render: Aabb,
    hitbox: Aabb,
}

impl Body {
    /// Creates a body centred on `center` whose hitbox is the render box
    /// shrunk by `inset` on each axis.
    #[must_use]
    pub fn centered(center: Vec2, render_size: Vec2, inset: Vec2) -> Self {
        let render = Aabb::from_center(center, render_size);
        let hitbox = render.inflate(-inset.x, -inset.y);
        Self { render, hitbox }
    }

    /// Creates a body from an explicit render box and hitbox size.
    #[must_use]
    pub fn with_hitbox(render: Aabb, hitbox_size: Vec2) -> Self {
        let size = hitbox_size.min(render.size());
        Self {
            render,
            hitbox: Aabb::from_center(render.center(), size),
        }
    }

    /// Box used for drawing.
    #[must_use]
    pub const fn render(&self) -> Aabb {
        self.render
    }

    /// Box used for collision and combat.
    #[must_use]
    pub const fn hitbox(&self) -> Aabb {
        self.hitbox
    }

    /// Mutable access to the hitbox. Call [`Body::sync_render`] afterwards.
    pub fn hitbox_mut(&mut self) -> &mut Aabb {
        &mut self.hitbox
    }

    /// Centre of the hitbox.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.hitbox.center()
    }

    /// Re-centres the render box on the hitbox.
    pub fn sync_render(&mut self) {
        let center = self.hitbox.center();
        self.render.set_center(center);
    }

    /// Moves the whole body so both boxes are centred on the point.
    pub fn move_to(&mut self, center: Vec2) {
        self.hitbox.set_center(center);
        self.render.set_center(center);
    }
}

/// Collision groups an entity may belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionGroup {
    /// Static or semi-static blockers such as walls and trees.
    Obstacle,
    /// Hostile units.
    Hostile,
    /// The controllable unit.
    Player,
    /// Short-lived weapon projectiles.
    Projectile,
}

impl CollisionGroup {
    const fn bit(self) -> u8 {
        match self {
            Self::Obstacle => 1,
            Self::Hostile => 1 << 1,
            Self::Player => 1 << 2,
            Self::Projectile => 1 << 3,
        }
    }
}

/// Set of collision groups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GroupMask(u8);

impl GroupMask {
    /// Mask containing no group.
    pub const EMPTY: GroupMask = GroupMask(0);

    /// Mask containing a single group.
    #[must_use]
    pub const fn of(group: CollisionGroup) -> Self {
        Self(group.bit())
    }

    /// Returns a copy that also contains `group`.
    #[must_use]
    pub const fn with(self, group: CollisionGroup) -> Self {
        Self(self.0 | group.bit())
    }

    /// Reports whether the mask contains `group`.
    #[must_use]
    pub const fn contains(self, group: CollisionGroup) -> bool {
        self.0 & group.bit() != 0
    }
}

/// Current and maximum health of a damageable actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vitals {
    current: f32,
    maximum: f32,
}

impl Vitals {
    /// Creates full health with the provided maximum.
    #[must_use]
    pub fn full(maximum: f32) -> Self {
        let maximum = maximum.max(0.0);
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Remaining health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Upper bound used when healing with clamping.
    #[must_use]
    pub const fn maximum(&self) -> f32 {
        self.maximum
    }

    /// Reports whether health has been depleted.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Restores health, optionally refusing to exceed the maximum.
    pub fn heal(&mut self, amount: f32, clamp_to_max: bool) {
        let healed = self.current + amount.max(0.0);
        self.current = if clamp_to_max {
            healed.min(self.maximum)
        } else {
            healed
        };
    }

    /// Replaces the maximum, trimming current health if it now exceeds it.
    pub fn set_maximum(&mut self, maximum: f32) {
        self.maximum = maximum.max(0.0);
        self.current = self.current.min(self.maximum);
    }
}

/// Result of a single damage application.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageOutcome {
    /// The target ignored the hit.
    Ignored,
    /// The target survived with the remaining health.
    Survived {
        /// Health left after the hit.
        remaining: f32,
    },
    /// The hit depleted the target's health.
    Died,
}

/// Capability of anything that takes part in box collision.
pub trait Collidable {
    /// Box used for collision tests.
    fn hitbox(&self) -> Aabb;

    /// Groups the collider belongs to.
    fn groups(&self) -> GroupMask;

    /// Reports whether the two hitboxes overlap.
    fn collides_with<C: Collidable + ?Sized>(&self, other: &C) -> bool {
        self.hitbox().overlaps(&other.hitbox())
    }
}

/// Capability of actors that advance through the world each frame.
pub trait Movable {
    /// Body moved by the motion step.
    fn body_mut(&mut self) -> &mut Body;

    /// Desired direction of travel, not necessarily normalised.
    fn direction(&self) -> Vec2;

    /// Stores the direction actually used for travel.
    fn set_direction(&mut self, direction: Vec2);

    /// Travel speed in world units per second.
    fn speed(&self) -> f32;
}

/// Capability of actors that can lose health.
pub trait Damageable {
    /// Applies the hit and reports how the target reacted.
    fn take_damage(&mut self, amount: f32) -> DamageOutcome;
}

impl Damageable for Vitals {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if amount <= 0.0 || self.is_depleted() {
            return DamageOutcome::Ignored;
        }
        self.current -= amount;
        if self.is_depleted() {
            DamageOutcome::Died
        } else {
            DamageOutcome::Survived {
                remaining: self.current,
            }
        }
    }
}

impl Collidable for Aabb {
    fn hitbox(&self) -> Aabb {
        *self
    }

    fn groups(&self) -> GroupMask {
        GroupMask::of(CollisionGroup::Obstacle)
    }
}

/// Converts an angle in degrees into a unit direction vector.
#[must_use]
pub fn direction_from_degrees(angle_degrees: f32) -> Vec2 {
    let radians = angle_degrees.to_radians();
    Vec2::new(radians.cos(), radians.sin())
}

/// Returns the angle of a direction in degrees, or zero for the zero vector.
#[must_use]
pub fn degrees_from_direction(direction: Vec2) -> f32 {
    if direction == Vec2::ZERO {
        return 0.0;
    }
    direction.y.atan2(direction.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_overlap() {
        let left = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let right = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&Aabb::new(9.5, 5.0, 4.0, 4.0)));
    }

    #[test]
    fn edge_setters_are_exact() {
        let mut moving = Aabb::new(3.3, 7.1, 12.7, 9.9);
        moving.set_right(100.25);
        assert_eq!(moving.right(), 100.25);
        moving.set_top(-4.5);
        assert_eq!(moving.top(), -4.5);
    }

    #[test]
    fn body_hitbox_is_narrower_than_render_box() {
        let body = Body::centered(Vec2::new(50.0, 50.0), Vec2::splat(64.0), Vec2::splat(10.0));
        assert_eq!(body.hitbox().width(), 54.0);
        assert_eq!(body.render().width(), 64.0);
        assert_eq!(body.hitbox().center(), body.render().center());
    }

    #[test]
    fn vitals_report_death_once() {
        let mut vitals = Vitals::full(10.0);
        assert_eq!(vitals.take_damage(4.0), DamageOutcome::Survived { remaining: 6.0 });
        assert_eq!(vitals.take_damage(6.0), DamageOutcome::Died);
        assert_eq!(vitals.take_damage(1.0), DamageOutcome::Ignored);
    }

    #[test]
    fn heal_respects_clamp_flag() {
        let mut vitals = Vitals::full(100.0);
        let _ = vitals.take_damage(30.0);
        vitals.heal(50.0, true);
        assert_eq!(vitals.current(), 100.0);
        vitals.heal(25.0, false);
        assert_eq!(vitals.current(), 125.0);
    }

    #[test]
    fn group_mask_tracks_membership() {
        let mask = GroupMask::of(CollisionGroup::Hostile).with(CollisionGroup::Obstacle);
        assert!(mask.contains(CollisionGroup::Hostile));
        assert!(mask.contains(CollisionGroup::Obstacle));
        assert!(!mask.contains(CollisionGroup::Player));
    }

    #[test]
    fn circle_intersection_uses_nearest_point() {
        let square = Aabb::new(10.0, 10.0, 10.0, 10.0);
        assert!(square.intersects_circle(Vec2::new(5.0, 15.0), 6.0));
        assert!(!square.intersects_circle(Vec2::new(0.0, 0.0), 10.0));
    }
}
