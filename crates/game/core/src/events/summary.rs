use std::collections::BTreeMap;

use crate::state::{TeamId, UnitId};

/// Rewards granted to the winning side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct BattleRewards {
    pub experience: u32,
    pub gold: u32,
    pub items: Vec<String>,
    /// Job id to job points.
    pub job_points: BTreeMap<String, u32>,
}

/// Running totals kept while the battle plays out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct BattleStatistics {
    pub total_turns: u32,
    /// Milliseconds from start to end.
    pub duration: u64,
    pub damage_dealt: BTreeMap<UnitId, u32>,
    pub healing_done: BTreeMap<UnitId, u32>,
    /// Skill id to use count.
    pub skills_used: BTreeMap<String, u32>,
    /// Team to number of its units defeated.
    pub units_defeated: BTreeMap<TeamId, u32>,
}

impl BattleStatistics {
    pub fn record_damage(&mut self, source: &UnitId, amount: i32) {
        let total = self.damage_dealt.entry(source.clone()).or_default();
        *total = total.saturating_add(amount.max(0) as u32);
    }

    pub fn record_healing(&mut self, source: &UnitId, amount: i32) {
        let total = self.healing_done.entry(source.clone()).or_default();
        *total = total.saturating_add(amount.max(0) as u32);
    }

    pub fn record_skill(&mut self, skill_id: &str) {
        let count = self.skills_used.entry(skill_id.to_owned()).or_default();
        *count = count.saturating_add(1);
    }

    pub fn record_defeat(&mut self, team: &TeamId) {
        *self.units_defeated.entry(team.clone()).or_default() += 1;
    }

    pub fn total_damage(&self) -> u32 {
        self.damage_dealt
            .values()
            .fold(0u32, |total, amount| total.saturating_add(*amount))
    }
}
