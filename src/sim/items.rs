//! Item catalogue
//!
//! Item definitions are immutable data shared by drops, inventory slots and
//! the shop. They are loaded from JSON (or the built-in table) once per run.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::tuning::TuningError;

/// Item type tag
///
/// Tags the game does not know are kept as [`ItemKind::Unknown`] so one bad
/// row never stops the catalogue from loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    Coin,
    Heal,
    Score,
    ScoreBoost,
    TripleShot,
    BulletSpeedUp,
    MoveSpeedUp,
    EnemyHpDown,
    TimeFreeze,
    TimeSlow,
    Dash,
    Shield,
    PetGun,
    Unknown(String),
}

impl ItemKind {
    pub fn tag(&self) -> &str {
        match self {
            ItemKind::Coin => "COIN",
            ItemKind::Heal => "HEAL",
            ItemKind::Score => "SCORE",
            ItemKind::ScoreBoost => "SCOREBOOST",
            ItemKind::TripleShot => "TRIPLESHOT",
            ItemKind::BulletSpeedUp => "BULLET_SPEED_UP",
            ItemKind::MoveSpeedUp => "MOVE_SPEED_UP",
            ItemKind::EnemyHpDown => "ENEMY_HP_DOWN",
            ItemKind::TimeFreeze => "TIME_FREEZE",
            ItemKind::TimeSlow => "TIME_SLOW",
            ItemKind::Dash => "DASH",
            ItemKind::Shield => "SHIELD",
            ItemKind::PetGun => "PET_GUN",
            ItemKind::Unknown(tag) => tag,
        }
    }

    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "COIN" => ItemKind::Coin,
            "HEAL" => ItemKind::Heal,
            "SCORE" => ItemKind::Score,
            "SCOREBOOST" => ItemKind::ScoreBoost,
            "TRIPLESHOT" => ItemKind::TripleShot,
            "BULLET_SPEED_UP" => ItemKind::BulletSpeedUp,
            "MOVE_SPEED_UP" => ItemKind::MoveSpeedUp,
            "ENEMY_HP_DOWN" => ItemKind::EnemyHpDown,
            "TIME_FREEZE" => ItemKind::TimeFreeze,
            "TIME_SLOW" => ItemKind::TimeSlow,
            "DASH" => ItemKind::Dash,
            "SHIELD" => ItemKind::Shield,
            "PET_GUN" => ItemKind::PetGun,
            _ => ItemKind::Unknown(tag.to_string()),
        }
    }
}

impl From<String> for ItemKind {
    fn from(tag: String) -> Self {
        ItemKind::parse(&tag)
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        kind.tag().to_string()
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// When an item's effect is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationType {
    #[default]
    InstantOnPickup,
    ActiveOnKey,
    Passive,
    TemporaryBuff,
}

/// Drop rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropTier {
    #[default]
    Common,
    Uncommon,
    Rare,
}

impl DropTier {
    pub const ALL: [DropTier; 3] = [DropTier::Common, DropTier::Uncommon, DropTier::Rare];

    /// Relative weight when rolling a drop
    pub fn weight(self) -> u32 {
        match self {
            DropTier::Common => 70,
            DropTier::Uncommon => 25,
            DropTier::Rare => 5,
        }
    }
}

/// Immutable item definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDef {
    pub id: String,
    pub kind: ItemKind,
    /// Host sprite key
    pub sprite: Option<String>,
    pub tier: DropTier,
    pub effect_value: i32,
    /// Seconds
    pub effect_duration: f32,
    pub activation: ActivationType,
    pub auto_use: bool,
    /// `<= 0` means unlimited uses
    pub max_charges: i32,
    pub cooldown_secs: f32,
    /// Carried for the catalogue; the effect ledger never stacks
    pub stackable: bool,
    pub cost: u32,
    pub display_name: String,
    pub description: String,
}

impl Default for ItemDef {
    fn default() -> Self {
        Self {
            id: String::new(),
            kind: ItemKind::Unknown(String::new()),
            sprite: None,
            tier: DropTier::Common,
            effect_value: 0,
            effect_duration: 0.0,
            activation: ActivationType::InstantOnPickup,
            auto_use: true,
            max_charges: 0,
            cooldown_secs: 0.0,
            stackable: false,
            cost: 0,
            display_name: String::new(),
            description: "No description.".to_string(),
        }
    }
}

impl ItemDef {
    fn new(kind: ItemKind, tier: DropTier, value: i32, duration: f32) -> Self {
        let tag = kind.tag().to_string();
        Self {
            id: tag.clone(),
            sprite: Some(format!("item_{}", tag.to_ascii_lowercase())),
            kind,
            tier,
            effect_value: value,
            effect_duration: duration,
            display_name: tag,
            ..Self::default()
        }
    }

    fn on_key(mut self, max_charges: i32, cooldown_secs: f32) -> Self {
        self.activation = ActivationType::ActiveOnKey;
        self.auto_use = false;
        self.max_charges = max_charges;
        self.cooldown_secs = cooldown_secs;
        self
    }

    fn buff(mut self) -> Self {
        self.activation = ActivationType::TemporaryBuff;
        self
    }

    fn priced(mut self, cost: u32, description: &str) -> Self {
        self.cost = cost;
        self.description = description.to_string();
        self
    }
}

/// Largest magnitude an item may carry
pub const MAX_EFFECT_VALUE: i32 = 10_000;
/// Longest effect or cooldown an item may carry (seconds)
pub const MAX_ITEM_SECS: f32 = 3_600.0;

fn clamp_secs(secs: f32) -> f32 {
    if secs.is_finite() {
        secs.clamp(0.0, MAX_ITEM_SECS)
    } else {
        0.0
    }
}

impl ItemDef {
    /// Pull numbers back into the range the effect handlers work in
    fn sanitize(&mut self) {
        let value = self.effect_value.clamp(-MAX_EFFECT_VALUE, MAX_EFFECT_VALUE);
        if value != self.effect_value {
            log::warn!(
                "[ItemDb] item '{}' effect_value {} clamped to {}",
                self.id,
                self.effect_value,
                value
            );
            self.effect_value = value;
        }
        let duration = clamp_secs(self.effect_duration);
        if duration != self.effect_duration {
            log::warn!(
                "[ItemDb] item '{}' effect_duration {} clamped to {}",
                self.id,
                self.effect_duration,
                duration
            );
            self.effect_duration = duration;
        }
        self.cooldown_secs = clamp_secs(self.cooldown_secs);
    }
}

/// Catalogue of item definitions keyed by id
#[derive(Debug, Clone, Default)]
pub struct ItemDb {
    items: BTreeMap<String, Rc<ItemDef>>,
}

impl ItemDb {
    /// Built-in catalogue used when no data file is supplied
    pub fn builtin() -> Self {
        use DropTier::*;
        use ItemKind as K;

        let defs = vec![
            ItemDef::new(K::Coin, Common, 5, 0.0).priced(0, "A handful of coins."),
            ItemDef::new(K::Score, Common, 50, 0.0).priced(0, "Bonus points."),
            ItemDef::new(K::Heal, Rare, 1, 0.0).priced(300, "Restores one life."),
            ItemDef::new(K::ScoreBoost, Uncommon, 2, 10.0)
                .buff()
                .priced(150, "Doubles score gains for a while."),
            ItemDef::new(K::TripleShot, Uncommon, 0, 8.0)
                .buff()
                .priced(150, "Fires three bullets at once."),
            ItemDef::new(K::BulletSpeedUp, Common, 50, 8.0)
                .buff()
                .priced(80, "Faster bullets."),
            ItemDef::new(K::MoveSpeedUp, Common, 30, 8.0)
                .on_key(3, 10.0)
                .priced(100, "Move faster for a few seconds."),
            ItemDef::new(K::EnemyHpDown, Uncommon, 1, 10.0)
                .buff()
                .priced(120, "Hits deal extra damage."),
            ItemDef::new(K::TimeFreeze, Rare, 0, 3.0)
                .on_key(1, 0.0)
                .priced(400, "Freezes every enemy."),
            ItemDef::new(K::TimeSlow, Uncommon, 50, 5.0)
                .on_key(2, 8.0)
                .priced(200, "Slows enemies down."),
            ItemDef::new(K::Dash, Common, 3, 1.0)
                .on_key(0, 3.0)
                .priced(150, "Quick burst of movement."),
            ItemDef::new(K::Shield, Uncommon, 0, 6.0)
                .buff()
                .priced(200, "Blocks enemy hits."),
            ItemDef::new(K::PetGun, Rare, 0, 6.0)
                .on_key(1, 0.0)
                .priced(350, "A companion that soaks one hit."),
        ];
        Self::from_defs(defs)
    }

    pub fn from_defs(defs: impl IntoIterator<Item = ItemDef>) -> Self {
        let mut items = BTreeMap::new();
        for mut def in defs {
            def.sanitize();
            if let ItemKind::Unknown(tag) = &def.kind {
                log::warn!("[ItemDb] item '{}' has unknown type '{}'", def.id, tag);
            }
            if def.sprite.is_none() {
                log::warn!("[ItemDb] item '{}' has no sprite", def.id);
            }
            if def.id.is_empty() {
                log::warn!("[ItemDb] skipping item without id");
                continue;
            }
            items.insert(def.id.clone(), Rc::new(def));
        }
        Self { items }
    }

    /// Parse a JSON array of item definitions
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let defs: Vec<ItemDef> = serde_json::from_str(json)?;
        let db = Self::from_defs(defs);
        log::info!("[ItemDb] loaded {} items", db.len());
        Ok(db)
    }

    pub fn get(&self, id: &str) -> Option<Rc<ItemDef>> {
        self.items.get(id).cloned()
    }

    /// Items of one tier in id order
    pub fn by_tier(&self, tier: DropTier) -> impl Iterator<Item = &Rc<ItemDef>> {
        self.items.values().filter(move |def| def.tier == tier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<ItemDef>> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
