//! Entity record composed from capabilities.
//!
//! The player, hostiles and projectiles share one record. What differs is
//! the [`EntityKind`] payload and which capabilities carry meaning: only
//! actors with [`Vitals`] react to damage, and only the player and hostiles
//! are moved by the motion system.

use swarmfall_core::{
    Aabb, Appearance, Body, Collidable, CollisionGroup, DamageOutcome, Damageable, EntityId,
    GroupMask, HostileKindId, HostileTemplate, Movable, SlotIndex, Vec2, Vitals, WeaponId,
};

/// Edge length of the square projectile hitbox.
pub const PROJECTILE_HITBOX: f32 = 10.0;

const HOSTILE_HITBOX_INSET: f32 = 10.0;

/// Role-specific payload of an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    /// The controllable unit.
    Player,
    /// A hostile unit chasing the player.
    Hostile {
        /// Template the hostile was built from.
        template: HostileKindId,
        /// Damage dealt on contact with the player.
        contact_damage: f32,
        /// Experience granted when killed.
        xp: u32,
    },
    /// A short-lived weapon projectile.
    Projectile {
        /// Definition the projectile reads its live values from.
        weapon: WeaponId,
        /// Slot that fired it.
        slot: SlotIndex,
        /// Distance travelled since launch.
        travelled: f32,
        /// How the projectile is drawn.
        appearance: Appearance,
    },
}

/// A simulated body in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    body: Body,
    direction: Vec2,
    speed: f32,
    vitals: Option<Vitals>,
    groups: GroupMask,
}

impl Entity {
    pub(crate) fn player(id: EntityId, body: Body, speed: f32, max_health: f32) -> Self {
        Self {
            id,
            kind: EntityKind::Player,
            body,
            direction: Vec2::ZERO,
            speed,
            vitals: Some(Vitals::full(max_health)),
            groups: GroupMask::of(CollisionGroup::Player),
        }
    }

    pub(crate) fn hostile(id: EntityId, template: &HostileTemplate, center: Vec2) -> Self {
        Self {
            id,
            kind: EntityKind::Hostile {
                template: template.id,
                contact_damage: template.damage,
                xp: template.xp,
            },
            body: Body::centered(
                center,
                Vec2::splat(template.size),
                Vec2::splat(HOSTILE_HITBOX_INSET),
            ),
            direction: Vec2::ZERO,
            speed: template.speed,
            vitals: Some(Vitals::full(template.health)),
            groups: GroupMask::of(CollisionGroup::Hostile),
        }
    }

    pub(crate) fn projectile(
        id: EntityId,
        weapon: WeaponId,
        slot: SlotIndex,
        origin: Vec2,
        direction: Vec2,
        speed: f32,
        appearance: Appearance,
    ) -> Self {
        let render_size = match &appearance {
            Appearance::Sprite { size, .. } => *size,
            Appearance::Fallback(_) => Vec2::splat(PROJECTILE_HITBOX * 2.0),
        };
        Self {
            id,
            kind: EntityKind::Projectile {
                weapon,
                slot,
                travelled: 0.0,
                appearance,
            },
            body: Body::with_hitbox(
                Aabb::from_center(origin, render_size),
                Vec2::splat(PROJECTILE_HITBOX),
            ),
            direction,
            speed,
            vitals: None,
            groups: GroupMask::of(CollisionGroup::Projectile),
        }
    }

    /// Identifier of the entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Role-specific payload.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Render box and hitbox.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Centre of the hitbox.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.body.center()
    }

    /// Health, for actors that can take damage.
    #[must_use]
    pub const fn vitals(&self) -> Option<&Vitals> {
        self.vitals.as_ref()
    }

    /// Reports whether the entity is a hostile unit.
    #[must_use]
    pub const fn is_hostile(&self) -> bool {
        matches!(self.kind, EntityKind::Hostile { .. })
    }

    pub(crate) fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    pub(crate) fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub(crate) fn vitals_mut(&mut self) -> Option<&mut Vitals> {
        self.vitals.as_mut()
    }

    pub(crate) fn advance_projectile(&mut self, center: Vec2, distance: f32) {
        self.body.move_to(center);
        if let EntityKind::Projectile { travelled, .. } = &mut self.kind {
            *travelled = distance;
        }
    }
}

impl Collidable for Entity {
    fn hitbox(&self) -> Aabb {
        self.body.hitbox()
    }

    fn groups(&self) -> GroupMask {
        self.groups
    }
}

impl Movable for Entity {
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn direction(&self) -> Vec2 {
        self.direction
    }

    fn set_direction(&mut self, direction: Vec2) {
        self.direction = direction;
    }

    fn speed(&self) -> f32 {
        self.speed
    }
}

impl Damageable for Entity {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        match self.vitals.as_mut() {
            Some(vitals) => vitals.take_damage(amount),
            None => DamageOutcome::Ignored,
        }
    }
}
