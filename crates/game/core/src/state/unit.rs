use std::collections::BTreeMap;
use std::fmt;

use crate::coords::{Direction, Position3D};

use super::kit::{Equipment, Item, ItemType, Job, Skill, Status, StatusKind};

/// Stable identifier of a battle participant.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for UnitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Side a unit fights for.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TeamId(pub String);

impl TeamId {
    pub const PLAYER: &'static str = "player";
    pub const NEUTRAL: &'static str = "neutral";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn player() -> Self {
        Self::new(Self::PLAYER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_player(&self) -> bool {
        self.0 == Self::PLAYER
    }
}

impl Default for TeamId {
    fn default() -> Self {
        Self::new(Self::NEUTRAL)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Combat attributes of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UnitStats {
    pub hp: i32,
    pub hp_max: i32,
    pub mp: i32,
    pub mp_max: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub range: u32,
    pub movement: u32,
    pub agility: i32,
    pub intelligence: i32,
    pub faith: i32,
    pub brave: i32,
}

impl UnitStats {
    pub const fn new() -> Self {
        Self {
            hp: 100,
            hp_max: 100,
            mp: 50,
            mp_max: 50,
            attack: 20,
            defense: 15,
            speed: 10,
            range: 1,
            movement: 3,
            agility: 12,
            intelligence: 10,
            faith: 50,
            brave: 50,
        }
    }

    pub const fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self.hp_max = hp;
        self
    }

    pub const fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    pub const fn with_attack(mut self, attack: i32) -> Self {
        self.attack = attack;
        self
    }

    pub const fn with_defense(mut self, defense: i32) -> Self {
        self.defense = defense;
        self
    }

    pub const fn with_range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }

    pub const fn with_movement(mut self, movement: u32) -> Self {
        self.movement = movement;
        self
    }

    /// Applies flat bonuses. Current hp/mp are not raised, only their caps.
    pub fn apply(&mut self, bonus: &StatBonuses) {
        self.hp_max += bonus.hp_max;
        self.mp_max += bonus.mp_max;
        self.attack += bonus.attack;
        self.defense += bonus.defense;
        self.speed += bonus.speed;
        self.range = self.range.saturating_add_signed(bonus.range);
        self.movement = self.movement.saturating_add_signed(bonus.movement);
        self.agility += bonus.agility;
        self.intelligence += bonus.intelligence;
        self.faith += bonus.faith;
        self.brave += bonus.brave;
    }
}

impl Default for UnitStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat stat adjustments granted by jobs, equipment and statuses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct StatBonuses {
    pub hp_max: i32,
    pub mp_max: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub range: i32,
    pub movement: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub faith: i32,
    pub brave: i32,
}

/// A battle participant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub team_id: TeamId,
    pub position: Position3D,
    pub stats: UnitStats,
    pub skills: Vec<Skill>,
    pub statuses: Vec<Status>,
    pub job: Job,
    pub equipment: Equipment,
    /// Consumables the unit carries into battle.
    #[cfg_attr(feature = "serde", serde(default))]
    pub items: Vec<Item>,
    /// Remaining turns before a skill can be used again, by skill id.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldowns: BTreeMap<String, u32>,
    pub sprite_id: String,
    pub facing: Direction,
    pub is_alive: bool,
}

impl Unit {
    pub fn new(id: impl Into<UnitId>, team_id: impl Into<TeamId>, position: Position3D) -> Self {
        let id = id.into();
        Self {
            name: id.0.clone(),
            id,
            team_id: team_id.into(),
            position,
            stats: UnitStats::default(),
            skills: Vec::new(),
            statuses: Vec::new(),
            job: Job::default(),
            equipment: Equipment::default(),
            items: Vec::new(),
            cooldowns: BTreeMap::new(),
            sprite_id: "default".to_owned(),
            facing: Direction::default(),
            is_alive: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stats(mut self, stats: UnitStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_sprite(mut self, sprite_id: impl Into<String>) -> Self {
        self.sprite_id = sprite_id.into();
        self
    }

    pub fn with_job(mut self, job: Job) -> Self {
        self.job = job;
        self
    }

    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = equipment;
        self
    }

    /// Alive flag set and hp above zero.
    pub fn is_active(&self) -> bool {
        self.is_alive && self.stats.hp > 0
    }

    /// Active and not disabled by sleep or stun.
    pub fn can_act(&self) -> bool {
        self.is_active() && !self.has_status(StatusKind::Sleep) && !self.has_status(StatusKind::Stun)
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.iter().any(|status| status.kind == kind)
    }

    pub fn is_enemy_of(&self, other: &Unit) -> bool {
        self.team_id != other.team_id
    }

    pub fn skill(&self, skill_id: &str) -> Option<&Skill> {
        self.skills.iter().find(|skill| skill.id == skill_id)
    }

    pub fn consumable(&self, item_id: &str) -> Option<&Item> {
        self.items
            .iter()
            .find(|item| item.id == item_id && item.kind == ItemType::Consumable)
    }

    pub fn cooldown(&self, skill_id: &str) -> u32 {
        self.cooldowns.get(skill_id).copied().unwrap_or(0)
    }

    /// Stats after job, equipment and status modifiers.
    pub fn effective_stats(&self) -> UnitStats {
        let mut stats = self.stats;
        stats.apply(&self.job.stat_bonuses);
        for item in self.equipment.iter() {
            stats.apply(&item.stat_bonuses);
        }
        for status in &self.statuses {
            stats.apply(&status.kind.modifiers(status.intensity));
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::kit::{Rarity, StatusKind};

    #[test]
    fn test_default_stats() {
        let unit = Unit::new("u1", "player", Position3D::ORIGIN);
        assert_eq!(unit.stats.hp, 100);
        assert_eq!(unit.stats.movement, 3);
        assert_eq!(unit.team_id, TeamId::player());
        assert!(unit.can_act());
    }

    #[test]
    fn test_effective_stats_include_equipment() {
        let sword = Item::equipment(
            "sword",
            ItemType::Weapon,
            Rarity::Common,
            StatBonuses {
                attack: 7,
                range: 1,
                ..StatBonuses::default()
            },
        );
        let unit = Unit::new("u1", "player", Position3D::ORIGIN).with_equipment(Equipment {
            weapon: Some(sword),
            ..Equipment::default()
        });
        let stats = unit.effective_stats();
        assert_eq!(stats.attack, 27);
        assert_eq!(stats.range, 2);
    }

    #[test]
    fn test_sleep_prevents_action() {
        let mut unit = Unit::new("u1", "enemy", Position3D::ORIGIN);
        unit.statuses.push(Status::new(StatusKind::Sleep, 2, "spell"));
        assert!(unit.is_active());
        assert!(!unit.can_act());
    }

    #[test]
    fn test_zero_hp_is_not_active() {
        let mut unit = Unit::new("u1", "enemy", Position3D::ORIGIN);
        unit.stats.hp = 0;
        assert!(unit.is_alive);
        assert!(!unit.is_active());
    }
}
