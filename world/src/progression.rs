//! Player statistics, experience and levelling.

use std::time::Duration;

use swarmfall_core::{PlayerAttribute, StatMode, Vec2};

/// Starting values for the controllable unit.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerConfig {
    /// Maximum health.
    pub max_health: f32,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Pickup radius.
    pub pickup_range: f32,
    /// Edge length of the square render box.
    pub size: f32,
    /// Amount trimmed from the render box on each axis to form the hitbox.
    pub hitbox_inset: f32,
    /// Window after a hit during which further damage is ignored.
    pub invulnerability: Duration,
    /// Experience needed to reach level two.
    pub first_level_xp: u32,
    /// Factor applied to the requirement after every level-up.
    pub xp_growth: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            speed: 300.0,
            pickup_range: 150.0,
            size: 64.0,
            hitbox_inset: 10.0,
            invulnerability: Duration::from_millis(500),
            first_level_xp: 100,
            xp_growth: 1.2,
        }
    }
}

impl PlayerConfig {
    pub(crate) fn render_size(&self) -> Vec2 {
        Vec2::splat(self.size)
    }

    pub(crate) fn inset(&self) -> Vec2 {
        Vec2::splat(self.hitbox_inset)
    }
}

/// Player statistics that upgrades may rewrite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerStats {
    max_health: f32,
    speed: f32,
    pickup_range: f32,
}

impl PlayerStats {
    pub(crate) fn from_config(config: &PlayerConfig) -> Self {
        Self {
            max_health: config.max_health,
            speed: config.speed,
            pickup_range: config.pickup_range,
        }
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Movement speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Pickup radius.
    #[must_use]
    pub const fn pickup_range(&self) -> f32 {
        self.pickup_range
    }

    /// Current value of a statistic.
    #[must_use]
    pub const fn get(&self, attribute: PlayerAttribute) -> f32 {
        match attribute {
            PlayerAttribute::MaxHealth => self.max_health,
            PlayerAttribute::Speed => self.speed,
            PlayerAttribute::PickupRange => self.pickup_range,
        }
    }

    /// Value the statistic would take after combining with the operand.
    #[must_use]
    pub fn combined(&self, attribute: PlayerAttribute, value: f32, mode: StatMode) -> f32 {
        mode.combine(self.get(attribute), value)
    }

    pub(crate) fn set(&mut self, attribute: PlayerAttribute, value: f32) {
        match attribute {
            PlayerAttribute::MaxHealth => self.max_health = value,
            PlayerAttribute::Speed => self.speed = value,
            PlayerAttribute::PickupRange => self.pickup_range = value,
        }
    }
}

/// Level and experience of the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progression {
    level: u32,
    xp: u32,
    required: u32,
    growth: f32,
}

impl Progression {
    /// Starts at level one with the provided requirement and growth factor.
    #[must_use]
    pub fn new(first_requirement: u32, growth: f32) -> Self {
        Self {
            level: 1,
            xp: 0,
            required: first_requirement.max(1),
            growth,
        }
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Experience collected toward the next level.
    #[must_use]
    pub const fn xp(&self) -> u32 {
        self.xp
    }

    /// Experience needed for the next level.
    #[must_use]
    pub const fn required(&self) -> u32 {
        self.required
    }

    /// Adds experience and returns every level reached as a result.
    pub fn grant(&mut self, xp: u32) -> Vec<u32> {
        self.xp = self.xp.saturating_add(xp);
        let mut reached = Vec::new();
        while self.xp >= self.required {
            self.xp -= self.required;
            self.level = self.level.saturating_add(1);
            self.required = ((self.required as f32 * self.growth) as u32).max(1);
            reached.push(self.level);
        }
        reached
    }
}
