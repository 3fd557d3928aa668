//! Definition tables loaded from JSON documents.
//!
//! Every table is a JSON array of records keyed by an integer `id`. Loading
//! is lenient: a record that lacks an id, falls outside its id range or does
//! not parse is skipped and reported as a [`LoadWarning`]. Only a document
//! that is not an array at all fails the load.

use std::{collections::BTreeMap, fmt};

use serde::Deserialize;
use serde_json::Value;
use swarmfall_core::{
    BuffMode, FlagValue, HostileKindId, HostileTemplate, PlayerAttribute, ResourceProvider,
    StatMode, UpgradeDefinition, UpgradeEffect, UpgradeId, WeaponDefinition, WeaponField,
    WeaponId, WeaponTarget,
};
use tracing::warn;

/// Names of the three definition tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    /// `hostiles.json`
    Hostiles,
    /// `weapons.json`
    Weapons,
    /// `upgrades.json`
    Upgrades,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hostiles => "hostiles",
            Self::Weapons => "weapons",
            Self::Upgrades => "upgrades",
        })
    }
}

/// Inclusive range of identifiers accepted by a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdRange {
    first: u32,
    last: u32,
}

impl IdRange {
    /// Creates a new inclusive range.
    #[must_use]
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// Lowest accepted identifier.
    #[must_use]
    pub const fn first(&self) -> u32 {
        self.first
    }

    /// Highest accepted identifier.
    #[must_use]
    pub const fn last(&self) -> u32 {
        self.last
    }

    /// Reports whether the identifier lies inside the range.
    #[must_use]
    pub const fn contains(&self, id: u32) -> bool {
        id >= self.first && id <= self.last
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.first, self.last)
    }
}

/// Accepted identifier ranges for each table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdRanges {
    /// Range for upgrade records.
    pub upgrades: IdRange,
    /// Range for hostile records.
    pub hostiles: IdRange,
    /// Range for weapon records.
    pub weapons: IdRange,
}

impl Default for IdRanges {
    fn default() -> Self {
        Self {
            upgrades: IdRange::new(1000, 1999),
            hostiles: IdRange::new(2000, 2999),
            weapons: IdRange::new(3000, 3999),
        }
    }
}

impl IdRanges {
    fn for_table(&self, table: Table) -> IdRange {
        match table {
            Table::Hostiles => self.hostiles,
            Table::Weapons => self.weapons,
            Table::Upgrades => self.upgrades,
        }
    }
}

/// Fatal failure while loading definition tables.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The document is not a JSON array.
    #[error("{table} table is not a JSON array")]
    Malformed {
        /// Table being parsed.
        table: Table,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Non-fatal problem found while loading definition tables.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LoadWarning {
    /// A record carries no usable `id`.
    #[error("{table} record #{index} has no integer id")]
    MissingId {
        /// Table containing the record.
        table: Table,
        /// Position of the record in the array.
        index: usize,
    },
    /// A record's id lies outside the accepted range.
    #[error("{table} id {id} is outside {range}")]
    OutOfRange {
        /// Table containing the record.
        table: Table,
        /// Rejected identifier.
        id: u32,
        /// Accepted range.
        range: IdRange,
    },
    /// A record failed to parse.
    #[error("{table} id {id} is invalid: {message}")]
    Invalid {
        /// Table containing the record.
        table: Table,
        /// Identifier of the record.
        id: u32,
        /// Parser diagnostic.
        message: String,
    },
    /// An upgrade declares a type the simulation does not know.
    #[error("upgrade id {id} has unknown type '{kind}'")]
    UnknownUpgradeType {
        /// Identifier of the upgrade.
        id: u32,
        /// Declared type.
        kind: String,
    },
    /// A later record replaced an earlier one with the same id.
    #[error("{table} id {id} is defined more than once; the last record wins")]
    Duplicate {
        /// Table containing the records.
        table: Table,
        /// Repeated identifier.
        id: u32,
    },
    /// A record references an image the resource provider does not know.
    #[error("{table} id {id} references missing image '{key}'")]
    MissingImage {
        /// Table containing the record.
        table: Table,
        /// Identifier of the record.
        id: u32,
        /// Image key.
        key: String,
    },
}

/// Hostile, weapon and upgrade definitions keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct DefinitionTables {
    hostiles: BTreeMap<HostileKindId, HostileTemplate>,
    weapons: BTreeMap<WeaponId, WeaponDefinition>,
    upgrades: BTreeMap<UpgradeId, UpgradeDefinition>,
    warnings: Vec<LoadWarning>,
}

impl DefinitionTables {
    /// Parses the three tables from JSON text.
    pub fn from_json(
        hostiles: &str,
        weapons: &str,
        upgrades: &str,
        ranges: &IdRanges,
    ) -> Result<Self, LoadError> {
        let mut tables = Self::default();

        for (id, record) in tables.records(Table::Hostiles, hostiles, ranges)? {
            match serde_json::from_value::<HostileTemplate>(record) {
                Ok(template) => {
                    if tables.hostiles.insert(template.id, template).is_some() {
                        tables.warn(LoadWarning::Duplicate {
                            table: Table::Hostiles,
                            id,
                        });
                    }
                }
                Err(error) => tables.warn(invalid(Table::Hostiles, id, error)),
            }
        }

        for (id, record) in tables.records(Table::Weapons, weapons, ranges)? {
            match serde_json::from_value::<WeaponDefinition>(record) {
                Ok(weapon) => {
                    if tables.weapons.insert(weapon.id, weapon).is_some() {
                        tables.warn(LoadWarning::Duplicate {
                            table: Table::Weapons,
                            id,
                        });
                    }
                }
                Err(error) => tables.warn(invalid(Table::Weapons, id, error)),
            }
        }

        for (id, record) in tables.records(Table::Upgrades, upgrades, ranges)? {
            match parse_upgrade(id, record) {
                Ok(upgrade) => {
                    if tables.upgrades.insert(upgrade.id, upgrade).is_some() {
                        tables.warn(LoadWarning::Duplicate {
                            table: Table::Upgrades,
                            id,
                        });
                    }
                }
                Err(warning) => tables.warn(warning),
            }
        }

        Ok(tables)
    }

    /// Creates tables from already-built records.
    #[must_use]
    pub fn from_records(
        hostiles: Vec<HostileTemplate>,
        weapons: Vec<WeaponDefinition>,
        upgrades: Vec<UpgradeDefinition>,
    ) -> Self {
        Self {
            hostiles: hostiles.into_iter().map(|hostile| (hostile.id, hostile)).collect(),
            weapons: weapons.into_iter().map(|weapon| (weapon.id, weapon)).collect(),
            upgrades: upgrades.into_iter().map(|upgrade| (upgrade.id, upgrade)).collect(),
            warnings: Vec::new(),
        }
    }

    fn records(
        &mut self,
        table: Table,
        text: &str,
        ranges: &IdRanges,
    ) -> Result<Vec<(u32, Value)>, LoadError> {
        let array: Vec<Value> =
            serde_json::from_str(text).map_err(|source| LoadError::Malformed { table, source })?;
        let range = ranges.for_table(table);

        let mut accepted = Vec::with_capacity(array.len());
        for (index, mut record) in array.into_iter().enumerate() {
            let Some(id) = record.get("id").and_then(record_id) else {
                self.warn(LoadWarning::MissingId { table, index });
                continue;
            };
            if !range.contains(id) {
                self.warn(LoadWarning::OutOfRange { table, id, range });
                continue;
            }
            if let Some(object) = record.as_object_mut() {
                let _ = object.insert("id".to_owned(), Value::from(id));
            }
            accepted.push((id, record));
        }
        Ok(accepted)
    }

    fn warn(&mut self, warning: LoadWarning) {
        warn!(%warning, "definition skipped");
        self.warnings.push(warning);
    }

    /// Checks every image key against the provider and records the missing ones.
    ///
    /// Returns the warnings added by this call.
    pub fn check_images<P>(&mut self, provider: &P) -> Vec<LoadWarning>
    where
        P: ResourceProvider + ?Sized,
    {
        let mut referenced: Vec<(Table, u32, &str)> = Vec::new();
        referenced.extend(
            self.hostiles
                .values()
                .map(|hostile| (Table::Hostiles, hostile.id.get(), hostile.image.as_str())),
        );
        for weapon in self.weapons.values() {
            referenced.push((Table::Weapons, weapon.id.get(), weapon.image.as_str()));
            if let Some(effect) = weapon.effect.as_deref() {
                referenced.push((Table::Weapons, weapon.id.get(), effect));
            }
        }
        referenced.extend(
            self.upgrades
                .values()
                .map(|upgrade| (Table::Upgrades, upgrade.id.get(), upgrade.image.as_str())),
        );

        let missing: Vec<LoadWarning> = referenced
            .into_iter()
            .filter(|(_, _, key)| !key.is_empty() && provider.image(key).is_sentinel())
            .map(|(table, id, key)| LoadWarning::MissingImage {
                table,
                id,
                key: key.to_owned(),
            })
            .collect();

        for warning in &missing {
            warn!(%warning, "image lookup will fall back");
        }
        self.warnings.extend(missing.iter().cloned());
        missing
    }

    /// Hostile templates in identifier order.
    #[must_use]
    pub fn hostiles(&self) -> &BTreeMap<HostileKindId, HostileTemplate> {
        &self.hostiles
    }

    /// Weapon definitions in identifier order.
    #[must_use]
    pub fn weapons(&self) -> &BTreeMap<WeaponId, WeaponDefinition> {
        &self.weapons
    }

    /// Upgrade definitions in identifier order.
    #[must_use]
    pub fn upgrades(&self) -> &BTreeMap<UpgradeId, UpgradeDefinition> {
        &self.upgrades
    }

    /// Problems found while loading.
    #[must_use]
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        BTreeMap<HostileKindId, HostileTemplate>,
        BTreeMap<WeaponId, WeaponDefinition>,
        BTreeMap<UpgradeId, UpgradeDefinition>,
    ) {
        (self.hostiles, self.weapons, self.upgrades)
    }
}

fn record_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|id| u32::try_from(id).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn invalid(table: Table, id: u32, error: impl fmt::Display) -> LoadWarning {
    LoadWarning::Invalid {
        table,
        id,
        message: error.to_string(),
    }
}

#[derive(Deserialize)]
struct UpgradeRecord {
    id: UpgradeId,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "desc")]
    description: String,
    #[serde(default)]
    image: String,
    #[serde(default = "first_tier")]
    tier: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

fn first_tier() -> u32 {
    1
}

#[derive(Deserialize)]
struct StatData {
    attr: PlayerAttribute,
    value: f32,
    #[serde(default = "stat_add")]
    mode: StatMode,
}

fn stat_add() -> StatMode {
    StatMode::Add
}

#[derive(Deserialize)]
struct WeaponAddData {
    #[serde(alias = "weapon")]
    weapon_id: WeaponId,
}

#[derive(Deserialize)]
struct WeaponBuffData {
    #[serde(default)]
    effects: Option<BTreeMap<String, f32>>,
    #[serde(default)]
    attr: Option<String>,
    #[serde(default)]
    value: Option<f32>,
    #[serde(default)]
    mode: BuffMode,
    #[serde(default)]
    target: Option<TargetRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetRecord {
    Id(u32),
    Name(String),
}

#[derive(Deserialize)]
struct HealData {
    #[serde(default)]
    amount: f32,
    #[serde(default = "clamp_heal")]
    clamp: bool,
}

fn clamp_heal() -> bool {
    true
}

#[derive(Deserialize)]
struct SpecialData {
    key: String,
    value: FlagValue,
}

fn parse_upgrade(id: u32, record: Value) -> Result<UpgradeDefinition, LoadWarning> {
    let record: UpgradeRecord =
        serde_json::from_value(record).map_err(|error| invalid(Table::Upgrades, id, error))?;
    let data = record.data;
    let effect = match record.kind.as_str() {
        "stat" => {
            let stat: StatData = decode(id, data)?;
            UpgradeEffect::PlayerStat {
                attribute: stat.attr,
                value: stat.value,
                mode: stat.mode,
            }
        }
        "weapon_add" | "weapon" => {
            let add: WeaponAddData = decode(id, data)?;
            UpgradeEffect::AddWeapon {
                weapon: add.weapon_id,
            }
        }
        "weapon_buff" => buff_effect(id, decode(id, data)?)?,
        "heal" => {
            let heal: HealData = decode(id, data)?;
            UpgradeEffect::Heal {
                amount: heal.amount,
                clamp_to_max: heal.clamp,
            }
        }
        "special" => {
            let special: SpecialData = decode(id, data)?;
            UpgradeEffect::SetFlag {
                key: special.key,
                value: special.value,
            }
        }
        other => {
            return Err(LoadWarning::UnknownUpgradeType {
                id,
                kind: other.to_owned(),
            })
        }
    };

    Ok(UpgradeDefinition {
        id: record.id,
        title: record.title,
        description: record.description,
        image: record.image,
        tier: record.tier,
        effect,
    })
}

fn decode<T: for<'de> Deserialize<'de>>(id: u32, data: Value) -> Result<T, LoadWarning> {
    serde_json::from_value(data).map_err(|error| invalid(Table::Upgrades, id, error))
}

fn buff_effect(id: u32, buff: WeaponBuffData) -> Result<UpgradeEffect, LoadWarning> {
    let raw: Vec<(String, f32)> = match (buff.effects, buff.attr, buff.value) {
        (Some(effects), _, _) => effects.into_iter().collect(),
        (None, Some(attr), Some(value)) => vec![(attr, value)],
        _ => {
            return Err(LoadWarning::Invalid {
                table: Table::Upgrades,
                id,
                message: "weapon_buff needs `effects` or `attr` with `value`".to_owned(),
            })
        }
    };

    let mut changes = Vec::with_capacity(raw.len());
    for (path, value) in raw {
        let field = path
            .parse::<WeaponField>()
            .map_err(|error| invalid(Table::Upgrades, id, error))?;
        changes.push((field, value));
    }

    let target = match buff.target {
        None => WeaponTarget::All,
        Some(TargetRecord::Id(weapon)) => WeaponTarget::Only(WeaponId::new(weapon)),
        Some(TargetRecord::Name(name)) if name.eq_ignore_ascii_case("all") => WeaponTarget::All,
        Some(TargetRecord::Name(name)) => match name.trim().parse::<u32>() {
            Ok(weapon) => WeaponTarget::Only(WeaponId::new(weapon)),
            Err(_) => {
                return Err(LoadWarning::Invalid {
                    table: Table::Upgrades,
                    id,
                    message: format!("unknown buff target '{name}'"),
                })
            }
        },
    };

    Ok(UpgradeEffect::WeaponBuff {
        target,
        changes,
        mode: buff.mode,
    })
}

#[cfg(test)]
mod tests {
    use swarmfall_core::{Image, Sound, WeaponBehavior};

    use super::*;

    const HOSTILES: &str = r#"[
        {"id": 2001, "name": "slime", "damage": 5, "speed": 80, "max_hp": 20, "tier": 1, "image": "slime"},
        {"id": 42, "name": "stray", "damage": 1, "speed": 1, "health": 1},
        {"name": "anonymous", "damage": 1, "speed": 1, "health": 1}
    ]"#;

    const WEAPONS: &str = r#"[
        {"id": 3001, "name": "bolt", "damage": 10, "cooldown": 500, "speed": 600, "range": 700, "image": "bolt"},
        {"id": "3002", "name": "ring", "damage": 4, "cooldown": 250, "speed": 180, "type": "orbital", "data": {"radius": 90}},
        {"id": 3003, "name": "broken", "cooldown": 100}
    ]"#;

    const UPGRADES: &str = r#"[
        {"id": 1001, "title": "Swift", "desc": "Move faster", "image": "boots", "type": "stat",
         "data": {"attr": "speed", "value": 1.1, "mode": "mult"}},
        {"id": 1002, "title": "Ring", "type": "weapon", "tier": 2, "data": {"weapon_id": 3002}},
        {"id": 1003, "title": "Bigger", "type": "weapon_buff",
         "data": {"effects": {"damage": 5, "data.scale": 0.2}, "mode": "add", "target": "all"}},
        {"id": 1004, "title": "Faster bolts", "type": "weapon_buff",
         "data": {"attr": "cooldown", "value": 0.9, "mode": "mult", "target": "3001"}},
        {"id": 1005, "title": "Potion", "type": "heal", "data": {"amount": 30}},
        {"id": 1006, "title": "Vampire", "type": "special", "data": {"key": "life_steal", "value": true}},
        {"id": 1007, "title": "Mystery", "type": "curse", "data": {}}
    ]"#;

    fn load() -> DefinitionTables {
        DefinitionTables::from_json(HOSTILES, WEAPONS, UPGRADES, &IdRanges::default())
            .expect("tables are arrays")
    }

    #[test]
    fn valid_records_load_and_bad_ones_warn() {
        let tables = load();

        assert_eq!(tables.hostiles().len(), 1);
        assert_eq!(tables.weapons().len(), 2);
        assert_eq!(tables.upgrades().len(), 6);

        let warnings = tables.warnings();
        assert!(warnings.contains(&LoadWarning::OutOfRange {
            table: Table::Hostiles,
            id: 42,
            range: IdRange::new(2000, 2999),
        }));
        assert!(warnings.contains(&LoadWarning::MissingId {
            table: Table::Hostiles,
            index: 2,
        }));
        assert!(warnings.contains(&LoadWarning::UnknownUpgradeType {
            id: 1007,
            kind: "curse".to_owned(),
        }));
        assert!(warnings
            .iter()
            .any(|warning| matches!(warning, LoadWarning::Invalid { id: 3003, .. })));
    }

    #[test]
    fn string_ids_and_type_tags_are_accepted() {
        let tables = load();
        let ring = &tables.weapons()[&WeaponId::new(3002)];

        assert_eq!(ring.behavior, WeaponBehavior::Orbital);
        assert_eq!(ring.data.radius, Some(90.0));
        assert_eq!(tables.weapons()[&WeaponId::new(3001)].behavior, WeaponBehavior::Projectile);
        assert_eq!(tables.hostiles()[&HostileKindId::new(2001)].health, 20.0);
    }

    #[test]
    fn upgrade_kinds_map_to_effects() {
        let tables = load();
        let effect = |id: u32| tables.upgrades()[&UpgradeId::new(id)].effect.clone();

        assert_eq!(
            effect(1001),
            UpgradeEffect::PlayerStat {
                attribute: PlayerAttribute::Speed,
                value: 1.1,
                mode: StatMode::Multiply,
            }
        );
        assert_eq!(
            effect(1002),
            UpgradeEffect::AddWeapon {
                weapon: WeaponId::new(3002)
            }
        );
        assert_eq!(
            effect(1003),
            UpgradeEffect::WeaponBuff {
                target: WeaponTarget::All,
                changes: vec![(WeaponField::Damage, 5.0), (WeaponField::Scale, 0.2)],
                mode: BuffMode::Add,
            }
        );
        assert_eq!(
            effect(1004),
            UpgradeEffect::WeaponBuff {
                target: WeaponTarget::Only(WeaponId::new(3001)),
                changes: vec![(WeaponField::Cooldown, 0.9)],
                mode: BuffMode::Multiply,
            }
        );
        assert_eq!(
            effect(1005),
            UpgradeEffect::Heal {
                amount: 30.0,
                clamp_to_max: true,
            }
        );
        assert_eq!(
            effect(1006),
            UpgradeEffect::SetFlag {
                key: "life_steal".to_owned(),
                value: FlagValue::Bool(true),
            }
        );
        assert_eq!(tables.upgrades()[&UpgradeId::new(1002)].tier, 2);
        assert_eq!(tables.upgrades()[&UpgradeId::new(1001)].description, "Move faster");
    }

    #[test]
    fn non_array_document_is_fatal() {
        let result = DefinitionTables::from_json("{}", "[]", "[]", &IdRanges::default());
        assert!(matches!(
            result,
            Err(LoadError::Malformed {
                table: Table::Hostiles,
                ..
            })
        ));
    }

    struct OnlyBolt;

    impl ResourceProvider for OnlyBolt {
        fn image(&self, key: &str) -> Image {
            if key == "bolt" {
                Image::solid(8, 8, swarmfall_core::Color::from_rgba(1, 2, 3, 255))
            } else {
                Image::sentinel()
            }
        }

        fn sound(&self, _key: &str) -> Option<Sound> {
            None
        }
    }

    #[test]
    fn missing_images_are_reported_not_fatal() {
        let mut tables = load();
        let missing = tables.check_images(&OnlyBolt);

        assert!(missing.contains(&LoadWarning::MissingImage {
            table: Table::Hostiles,
            id: 2001,
            key: "slime".to_owned(),
        }));
        assert!(!missing
            .iter()
            .any(|warning| matches!(warning, LoadWarning::MissingImage { key, .. } if key == "bolt")));
    }
}
