//! Definition records loaded at start-up and the upgrade effects that mutate them.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{HostileKindId, UpgradeError, UpgradeId, WeaponId};

/// Behaviour variant of a weapon definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponBehavior {
    /// Fires short-lived entities along the aim direction.
    #[default]
    Projectile,
    /// Keeps persistent instances circling the owner.
    Orbital,
    /// Keeps one persistent damage field centred on the owner.
    Aura,
}

impl WeaponBehavior {
    /// Radius used when a definition leaves `data.radius` unset.
    #[must_use]
    pub const fn default_radius(self) -> f32 {
        match self {
            Self::Projectile => 0.0,
            Self::Orbital => 80.0,
            Self::Aura => 120.0,
        }
    }
}

/// Travel distance of a projectile whose definition omits `range`.
pub const DEFAULT_PROJECTILE_RANGE: f32 = 1_000.0;

/// Auxiliary weapon parameters that upgrades may address as `data.<field>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponAux {
    /// Visual and hit-area multiplier.
    #[serde(default = "unit_scale")]
    pub scale: f32,
    /// Orbit radius or aura base radius. Behaviour defaults apply when absent.
    #[serde(default)]
    pub radius: Option<f32>,
    /// Number of animation frames in the sprite sheet.
    #[serde(default)]
    pub frames: f32,
    /// Width of a single animation frame in pixels.
    #[serde(default)]
    pub frame_width: f32,
    /// Horizontal gap between frames in pixels.
    #[serde(default)]
    pub spacing: f32,
    /// Outer margin of the sprite sheet in pixels.
    #[serde(default)]
    pub margin: f32,
}

impl Default for WeaponAux {
    fn default() -> Self {
        Self {
            scale: unit_scale(),
            radius: None,
            frames: 0.0,
            frame_width: 0.0,
            spacing: 0.0,
            margin: 0.0,
        }
    }
}

fn unit_scale() -> f32 {
    1.0
}

/// Shared, live-mutable weapon definition.
///
/// Every equipped slot and every weapon instance refers to a definition by
/// [`WeaponId`] and reads these fields on each tick, so in-place mutations
/// become visible on the very next update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponDefinition {
    /// Identifier of the definition.
    pub id: WeaponId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Damage dealt per hit or per tick.
    pub damage: f32,
    /// Cooldown period in milliseconds.
    pub cooldown: f32,
    /// Projectile speed in units per second, or orbital angular speed in degrees per second.
    #[serde(default)]
    pub speed: f32,
    /// Maximum projectile travel distance.
    #[serde(default)]
    pub range: Option<f32>,
    /// Behaviour variant.
    #[serde(rename = "type", default)]
    pub behavior: WeaponBehavior,
    /// Icon or projectile image key.
    #[serde(default)]
    pub image: String,
    /// Image key for persistent instances; falls back to `image`.
    #[serde(default)]
    pub effect: Option<String>,
    /// Auxiliary parameters.
    #[serde(default)]
    pub data: WeaponAux,
}

impl WeaponDefinition {
    /// Cooldown period as a duration.
    ///
    /// Negative values collapse to zero; values too large for a `Duration`
    /// saturate to `Duration::MAX`.
    #[must_use]
    pub fn cooldown_period(&self) -> Duration {
        Duration::try_from_secs_f32(self.cooldown.max(0.0) / 1_000.0).unwrap_or(Duration::MAX)
    }

    /// Image key used for persistent instances.
    #[must_use]
    pub fn effect_key(&self) -> &str {
        self.effect.as_deref().unwrap_or(&self.image)
    }

    /// Maximum projectile travel distance.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.range.unwrap_or(DEFAULT_PROJECTILE_RANGE)
    }

    /// Orbit radius or aura base radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.data
            .radius
            .unwrap_or_else(|| self.behavior.default_radius())
    }

    /// Reads a field as a number. Unset optional fields read as their defaults.
    #[must_use]
    pub fn field(&self, field: WeaponField) -> f32 {
        match field {
            WeaponField::Damage => self.damage,
            WeaponField::Cooldown => self.cooldown,
            WeaponField::Speed => self.speed,
            WeaponField::Range => self.range(),
            WeaponField::Scale => self.data.scale,
            WeaponField::Radius => self.radius(),
            WeaponField::Frames => self.data.frames,
            WeaponField::FrameWidth => self.data.frame_width,
            WeaponField::Spacing => self.data.spacing,
            WeaponField::Margin => self.data.margin,
        }
    }

    /// Rewrites a single field in place.
    ///
    /// Unset optional fields combine with their defaults.
    pub fn apply_change(
        &mut self,
        field: WeaponField,
        value: f32,
        mode: BuffMode,
    ) -> Result<(), UpgradeError> {
        let updated = mode.combine(self.field(field), value);
        if !updated.is_finite() {
            return Err(UpgradeError::NonFinite { field });
        }
        match field {
            WeaponField::Damage => self.damage = updated,
            WeaponField::Cooldown => self.cooldown = updated,
            WeaponField::Speed => self.speed = updated,
            WeaponField::Range => self.range = Some(updated),
            WeaponField::Scale => self.data.scale = updated,
            WeaponField::Radius => self.data.radius = Some(updated),
            WeaponField::Frames => self.data.frames = updated,
            WeaponField::FrameWidth => self.data.frame_width = updated,
            WeaponField::Spacing => self.data.spacing = updated,
            WeaponField::Margin => self.data.margin = updated,
        }
        Ok(())
    }
}

/// Hostile template used by the spawner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostileTemplate {
    /// Identifier of the template.
    pub id: HostileKindId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Contact damage dealt to the player.
    pub damage: f32,
    /// Travel speed in units per second.
    pub speed: f32,
    /// Maximum health.
    #[serde(alias = "max_hp")]
    pub health: f32,
    /// Minimum player level required before the template may spawn.
    #[serde(default = "first_tier")]
    pub tier: u32,
    /// Experience granted when killed.
    #[serde(default = "default_xp")]
    pub xp: u32,
    /// Edge length of the square render box.
    #[serde(default = "default_hostile_size")]
    pub size: f32,
    /// Image key.
    #[serde(default)]
    pub image: String,
}

fn first_tier() -> u32 {
    1
}

fn default_xp() -> u32 {
    10
}

fn default_hostile_size() -> f32 {
    48.0
}

/// Upgrade definition offered on level-up.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeDefinition {
    /// Identifier of the upgrade.
    pub id: UpgradeId,
    /// Card title.
    pub title: String,
    /// Card description.
    pub description: String,
    /// Icon key.
    pub image: String,
    /// Minimum player level before the upgrade may be offered.
    pub tier: u32,
    /// Effect applied when chosen.
    pub effect: UpgradeEffect,
}

/// Mutation requested by the upgrade boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum UpgradeEffect {
    /// Adjusts a player statistic.
    PlayerStat {
        /// Statistic to adjust.
        attribute: PlayerAttribute,
        /// Operand.
        value: f32,
        /// How the operand combines with the current value.
        mode: StatMode,
    },
    /// Appends a new slot referencing the weapon definition.
    AddWeapon {
        /// Definition referenced by the new slot.
        weapon: WeaponId,
    },
    /// Rewrites fields of one or all shared weapon definitions.
    WeaponBuff {
        /// Definitions affected.
        target: WeaponTarget,
        /// Field paths and their operands, applied in order.
        changes: Vec<(WeaponField, f32)>,
        /// How each operand combines with the current value.
        mode: BuffMode,
    },
    /// Restores player health.
    Heal {
        /// Health restored.
        amount: f32,
        /// Whether the result is limited to maximum health.
        clamp_to_max: bool,
    },
    /// Stores a named flag on the player.
    SetFlag {
        /// Flag name.
        key: String,
        /// Flag value.
        value: FlagValue,
    },
}

/// Player statistics addressable by upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAttribute {
    /// Maximum health.
    #[serde(rename = "max_hp")]
    MaxHealth,
    /// Movement speed.
    #[serde(rename = "speed")]
    Speed,
    /// Pickup radius.
    #[serde(rename = "pickup_range")]
    PickupRange,
}

/// Combination mode for player statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatMode {
    /// Adds the operand.
    Add,
    /// Multiplies by the operand.
    #[serde(alias = "mult")]
    Multiply,
}

impl StatMode {
    /// Combines the current value with the operand.
    #[must_use]
    pub fn combine(self, current: f32, value: f32) -> f32 {
        match self {
            Self::Add => current + value,
            Self::Multiply => current * value,
        }
    }
}

/// Combination mode for weapon definition fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffMode {
    /// Adds the operand.
    #[default]
    Add,
    /// Multiplies by the operand.
    #[serde(alias = "mult")]
    Multiply,
    /// Replaces the value with the operand.
    Set,
}

impl BuffMode {
    /// Combines the current value with the operand.
    #[must_use]
    pub fn combine(self, current: f32, value: f32) -> f32 {
        match self {
            Self::Add => current + value,
            Self::Multiply => current * value,
            Self::Set => value,
        }
    }
}

/// Definitions targeted by a weapon buff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeaponTarget {
    /// Every loaded definition.
    All,
    /// One definition.
    Only(WeaponId),
}

/// Addressable field of a weapon definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeaponField {
    /// `damage`
    Damage,
    /// `cooldown`
    Cooldown,
    /// `speed`
    Speed,
    /// `range`
    Range,
    /// `data.scale`
    Scale,
    /// `data.radius`
    Radius,
    /// `data.frames`
    Frames,
    /// `data.frame_width`
    FrameWidth,
    /// `data.spacing`
    Spacing,
    /// `data.margin`
    Margin,
}

/// Error returned when a field path does not name a weapon field.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown weapon field path '{0}'")]
pub struct UnknownFieldPath(pub String);

impl FromStr for WeaponField {
    type Err = UnknownFieldPath;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let field = match path.trim() {
            "damage" => Self::Damage,
            "cooldown" => Self::Cooldown,
            "speed" => Self::Speed,
            "range" => Self::Range,
            "data.scale" => Self::Scale,
            "data.radius" => Self::Radius,
            "data.frames" => Self::Frames,
            "data.frame_width" => Self::FrameWidth,
            "data.spacing" => Self::Spacing,
            "data.margin" => Self::Margin,
            other => return Err(UnknownFieldPath(other.to_owned())),
        };
        Ok(field)
    }
}

impl fmt::Display for WeaponField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self {
            Self::Damage => "damage",
            Self::Cooldown => "cooldown",
            Self::Speed => "speed",
            Self::Range => "range",
            Self::Scale => "data.scale",
            Self::Radius => "data.radius",
            Self::Frames => "data.frames",
            Self::FrameWidth => "data.frame_width",
            Self::Spacing => "data.spacing",
            Self::Margin => "data.margin",
        };
        f.write_str(path)
    }
}

/// Value stored under a named player flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// Boolean switch.
    Bool(bool),
    /// Numeric parameter.
    Number(f64),
    /// Free-form text.
    Text(String),
}
