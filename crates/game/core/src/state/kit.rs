//! Skills, statuses, jobs and items carried by units.
use super::unit::StatBonuses;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SkillType {
    Attack,
    Heal,
    Buff,
    Debuff,
    Movement,
    Special,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Element {
    #[default]
    None,
    Fire,
    Water,
    Earth,
    Air,
    Lightning,
    Ice,
    Light,
    Dark,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SkillEffectKind {
    Damage,
    Heal,
    Status,
    Move,
    Teleport,
}

/// Who a skill effect lands on among the units in its area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum EffectTarget {
    #[cfg_attr(feature = "serde", serde(rename = "self"))]
    #[strum(serialize = "self")]
    Caster,
    Ally,
    #[default]
    Enemy,
    All,
}

impl EffectTarget {
    /// Whether a unit in the area is affected, given whether it is the caster
    /// and whether it shares the caster's team.
    pub fn accepts(self, caster_is_target: bool, same_team: bool) -> bool {
        match self {
            Self::Caster => caster_is_target,
            Self::Ally => same_team,
            Self::Enemy => !same_team,
            Self::All => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SkillEffect {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: SkillEffectKind,
    pub value: Option<i32>,
    pub status_type: Option<StatusKind>,
    pub duration: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: EffectTarget,
}

impl SkillEffect {
    pub fn damage(target: EffectTarget) -> Self {
        Self {
            kind: SkillEffectKind::Damage,
            value: None,
            status_type: None,
            duration: None,
            target,
        }
    }

    pub fn heal(value: Option<i32>, target: EffectTarget) -> Self {
        Self {
            kind: SkillEffectKind::Heal,
            value,
            status_type: None,
            duration: None,
            target,
        }
    }

    pub fn status(kind: StatusKind, duration: u32, target: EffectTarget) -> Self {
        Self {
            kind: SkillEffectKind::Status,
            value: None,
            status_type: Some(kind),
            duration: Some(duration),
            target,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: SkillType,
    /// MP cost.
    pub cost: i32,
    pub range: u32,
    /// Planar radius around the target cell; 0 hits a single cell.
    pub aoe_size: u32,
    pub power: i32,
    pub accuracy: u32,
    pub element: Element,
    pub effects: Vec<SkillEffect>,
    pub cast_time: u32,
    /// Turns the caster must wait before using this skill again.
    pub cooldown: u32,
}

impl Skill {
    pub fn new(id: impl Into<String>, kind: SkillType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            kind,
            cost: 0,
            range: 1,
            aoe_size: 0,
            power: 0,
            accuracy: 100,
            element: Element::None,
            effects: Vec::new(),
            cast_time: 0,
            cooldown: 0,
        }
    }

    pub fn with_cost(mut self, cost: i32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }

    pub fn with_aoe(mut self, aoe_size: u32) -> Self {
        self.aoe_size = aoe_size;
        self
    }

    pub fn with_power(mut self, power: i32) -> Self {
        self.power = power;
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self
    }

    pub fn with_effect(mut self, effect: SkillEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Declared effects, or the implicit one for skills that declare none.
    pub fn resolved_effects(&self) -> Vec<SkillEffect> {
        if !self.effects.is_empty() {
            return self.effects.clone();
        }
        match self.kind {
            SkillType::Attack => vec![SkillEffect::damage(EffectTarget::Enemy)],
            SkillType::Heal => vec![SkillEffect::heal(None, EffectTarget::Ally)],
            SkillType::Movement => vec![SkillEffect {
                kind: SkillEffectKind::Teleport,
                value: None,
                status_type: None,
                duration: None,
                target: EffectTarget::Caster,
            }],
            SkillType::Buff | SkillType::Debuff | SkillType::Special => Vec::new(),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatusKind {
    Poison,
    Regen,
    Haste,
    Slow,
    Protect,
    Shell,
    Berserk,
    Charm,
    Sleep,
    Stun,
    Silence,
    Blind,
}

impl StatusKind {
    /// Stat adjustments while the status is active.
    pub fn modifiers(self, intensity: i32) -> StatBonuses {
        let step = intensity.max(1);
        match self {
            Self::Haste => StatBonuses {
                speed: 2 * step,
                ..StatBonuses::default()
            },
            Self::Slow => StatBonuses {
                speed: -2 * step,
                ..StatBonuses::default()
            },
            Self::Protect => StatBonuses {
                defense: 5 * step,
                ..StatBonuses::default()
            },
            Self::Shell => StatBonuses {
                faith: 10 * step,
                ..StatBonuses::default()
            },
            Self::Berserk => StatBonuses {
                attack: 5 * step,
                defense: -5 * step,
                ..StatBonuses::default()
            },
            _ => StatBonuses::default(),
        }
    }

    /// Whether the status changes hp at the start of the owner's turn.
    pub const fn ticks(self) -> bool {
        matches!(self, Self::Poison | Self::Regen)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Status {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: StatusKind,
    /// Remaining owner turns.
    pub duration: u32,
    pub intensity: i32,
    /// Unit or skill that applied the status.
    pub source: String,
    pub tick_damage: Option<i32>,
}

impl Status {
    pub fn new(kind: StatusKind, duration: u32, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            id: format!("{kind}_{source}"),
            kind,
            duration,
            intensity: 1,
            source,
            tick_damage: None,
        }
    }

    pub fn with_intensity(mut self, intensity: i32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_tick_damage(mut self, tick_damage: i32) -> Self {
        self.tick_damage = Some(tick_damage);
        self
    }

    /// Hp change applied at turn start; poison defaults to 5 per intensity, regen to 8.
    pub fn tick_amount(&self) -> i32 {
        let base = match self.kind {
            StatusKind::Poison => 5,
            StatusKind::Regen => 8,
            _ => return 0,
        };
        self.tick_damage.unwrap_or(base * self.intensity.max(1))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Job {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub experience: u32,
    pub required_exp: u32,
    pub skills: Vec<String>,
    pub stat_bonuses: StatBonuses,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            id: "squire".to_owned(),
            name: "Squire".to_owned(),
            level: 1,
            experience: 0,
            required_exp: 100,
            skills: Vec::new(),
            stat_bonuses: StatBonuses::default(),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemType {
    Weapon,
    Armor,
    Accessory,
    Consumable,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Item {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: ItemType,
    pub rarity: Rarity,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stat_bonuses: StatBonuses,
    #[cfg_attr(feature = "serde", serde(default))]
    pub skill_ids: Vec<String>,
    /// Effects when used; only meaningful for consumables.
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<SkillEffect>,
    pub value: u32,
}

impl Item {
    pub fn equipment(
        id: impl Into<String>,
        kind: ItemType,
        rarity: Rarity,
        stat_bonuses: StatBonuses,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            rarity,
            stat_bonuses,
            skill_ids: Vec::new(),
            effects: Vec::new(),
            value: 0,
        }
    }

    pub fn consumable(id: impl Into<String>, effects: Vec<SkillEffect>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: ItemType::Consumable,
            rarity: Rarity::Common,
            stat_bonuses: StatBonuses::default(),
            skill_ids: Vec::new(),
            effects,
            value: 0,
        }
    }

    /// Standard healing potion.
    pub fn potion(id: impl Into<String>, amount: i32) -> Self {
        Self::consumable(id, vec![SkillEffect::heal(Some(amount), EffectTarget::Ally)])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Equipment {
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub accessory: Option<Item>,
}

impl Equipment {
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        [&self.weapon, &self.armor, &self.accessory]
            .into_iter()
            .flatten()
    }
}
