//! Application of upgrade effects to the player and the weapon arena.
//!
//! Every effect is validated before anything is written, so a rejected
//! effect leaves the world exactly as it was.

use std::collections::BTreeMap;

use swarmfall_core::{
    BuffMode, Event, PlayerAttribute, SlotIndex, StatMode, UpgradeEffect, UpgradeError,
    WeaponDefinition, WeaponField, WeaponId, WeaponTarget,
};
use tracing::{debug, info};

use crate::World;

pub(crate) fn apply_effect(
    world: &mut World,
    effect: &UpgradeEffect,
    out_events: &mut Vec<Event>,
) -> Result<(), UpgradeError> {
    match effect {
        UpgradeEffect::PlayerStat {
            attribute,
            value,
            mode,
        } => apply_stat(world, *attribute, *value, *mode),
        UpgradeEffect::AddWeapon { weapon } => {
            if !world.weapons.contains_key(weapon) {
                return Err(UpgradeError::UnknownWeapon(*weapon));
            }
            let slot = SlotIndex::new(world.loadout.len());
            world.loadout.push(*weapon);
            info!(weapon = weapon.get(), slot = slot.get(), "weapon equipped");
            out_events.push(Event::WeaponEquipped {
                slot,
                weapon: *weapon,
            });
            Ok(())
        }
        UpgradeEffect::WeaponBuff {
            target,
            changes,
            mode,
        } => buff_weapons(&mut world.weapons, *target, changes, *mode),
        UpgradeEffect::Heal {
            amount,
            clamp_to_max,
        } => {
            if let Some(vitals) = world.player_entity_mut().and_then(|player| player.vitals_mut()) {
                vitals.heal(*amount, *clamp_to_max);
                debug!(health = vitals.current(), "player healed");
            }
            Ok(())
        }
        UpgradeEffect::SetFlag { key, value } => {
            let _ = world.flags.insert(key.clone(), value.clone());
            Ok(())
        }
    }
}

fn apply_stat(
    world: &mut World,
    attribute: PlayerAttribute,
    value: f32,
    mode: StatMode,
) -> Result<(), UpgradeError> {
    let updated = world.stats.combined(attribute, value, mode);
    if !updated.is_finite() {
        return Err(UpgradeError::NonFiniteStat { attribute });
    }
    world.stats.set(attribute, updated);

    match attribute {
        PlayerAttribute::MaxHealth => {
            if let Some(vitals) = world.player_entity_mut().and_then(|player| player.vitals_mut()) {
                vitals.set_maximum(updated);
            }
        }
        PlayerAttribute::Speed => {
            if let Some(player) = world.player_entity_mut() {
                player.set_speed(updated);
            }
        }
        PlayerAttribute::PickupRange => {}
    }
    debug!(?attribute, value = updated, "player statistic changed");
    Ok(())
}

fn buff_weapons(
    weapons: &mut BTreeMap<WeaponId, WeaponDefinition>,
    target: WeaponTarget,
    changes: &[(WeaponField, f32)],
    mode: BuffMode,
) -> Result<(), UpgradeError> {
    let targets: Vec<WeaponId> = match target {
        WeaponTarget::All => weapons.keys().copied().collect(),
        WeaponTarget::Only(weapon) if weapons.contains_key(&weapon) => vec![weapon],
        WeaponTarget::Only(weapon) => return Err(UpgradeError::UnknownWeapon(weapon)),
    };

    let mut staged = Vec::with_capacity(targets.len());
    for id in targets {
        let Some(current) = weapons.get(&id) else {
            continue;
        };
        let mut updated = current.clone();
        for (field, value) in changes {
            updated.apply_change(*field, *value, mode)?;
        }
        staged.push(updated);
    }

    let count = staged.len();
    for definition in staged {
        let _ = weapons.insert(definition.id, definition);
    }
    debug!(count, changes = changes.len(), "weapon definitions rewritten");
    Ok(())
}
