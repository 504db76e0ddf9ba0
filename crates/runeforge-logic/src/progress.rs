//! Read-only snapshot of the wider game state.
//!
//! The rune and talisman engines never own game progress. Callers fill a
//! [`GameProgress`] from their own state and hand it to
//! [`GameStateBonuses`](crate::bonuses::GameStateBonuses), which turns the
//! counters into unlocks and multipliers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;

/// Sparse 1-indexed counter table (achievements, researches, upgrades...).
/// Missing entries read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counters(BTreeMap<u32, f64>);

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: u32) -> f64 {
        self.0.get(&index).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, index: u32, value: f64) {
        if value == 0.0 {
            self.0.remove(&index);
        } else {
            self.0.insert(index, value);
        }
    }

    /// 1.0 when the entry is positive, otherwise 0.0.
    pub fn owned(&self, index: u32) -> f64 {
        if self.get(index) > 0.0 {
            1.0
        } else {
            0.0
        }
    }

    pub fn is_owned(&self, index: u32) -> bool {
        self.get(index) > 0.0
    }
}

impl FromIterator<(u32, f64)> for Counters {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        let mut counters = Counters::new();
        for (index, value) in iter {
            counters.set(index, value);
        }
        counters
    }
}

/// Everything the canonical bonus formulas read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameProgress {
    pub achievements: Counters,
    pub researches: Counters,
    pub upgrades: Counters,
    pub cube_upgrades: Counters,
    pub challenge_completions: Counters,
    pub highest_challenge_completions: Counters,
    pub constant_upgrades: Counters,
    pub ant_upgrades: Counters,
    pub platonic_upgrades: Counters,

    pub coins: Decimal,
    /// Sum of the five owned coin producer counts.
    pub owned_coins: f64,
    pub talisman_shards: f64,
    pub bonus_ant_levels: f64,
    pub ascension_counter: f64,
    pub ascension_count: f64,
    pub highest_singularity_count: f64,

    /// Multiplier from the drought corruption; 1.0 when inactive.
    pub drought_penalty: f64,
    pub recycle_chance: f64,
    pub campaign_rune_bonus: f64,
    pub challenge15_rune_bonus: f64,
    pub challenge15_rune_exp: f64,
    pub cube_rune_exp_bonus: f64,
    pub cube_rune_level_bonus: f64,

    /// Active reincarnation challenge, 0 when none.
    pub current_reincarnation_challenge: u32,
    pub instant_unlock_1: bool,
    pub instant_unlock_2: bool,
    pub infinite_ascent_purchased: bool,

    pub offering_buy_amount: u32,
    pub auto_offering_levels: u32,
}

impl Default for GameProgress {
    fn default() -> Self {
        Self {
            achievements: Counters::new(),
            researches: Counters::new(),
            upgrades: Counters::new(),
            cube_upgrades: Counters::new(),
            challenge_completions: Counters::new(),
            highest_challenge_completions: Counters::new(),
            constant_upgrades: Counters::new(),
            ant_upgrades: Counters::new(),
            platonic_upgrades: Counters::new(),
            coins: Decimal::ZERO,
            owned_coins: 0.0,
            talisman_shards: 0.0,
            bonus_ant_levels: 0.0,
            ascension_counter: 0.0,
            ascension_count: 0.0,
            highest_singularity_count: 0.0,
            drought_penalty: 1.0,
            recycle_chance: 0.0,
            campaign_rune_bonus: 0.0,
            challenge15_rune_bonus: 1.0,
            challenge15_rune_exp: 1.0,
            cube_rune_exp_bonus: 1.0,
            cube_rune_level_bonus: 1.0,
            current_reincarnation_challenge: 0,
            instant_unlock_1: false,
            instant_unlock_2: false,
            infinite_ascent_purchased: false,
            offering_buy_amount: 1,
            auto_offering_levels: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_counters_read_zero() {
        let c = Counters::new();
        assert_eq!(c.get(38), 0.0);
        assert!(!c.is_owned(38));
    }

    #[test]
    fn setting_zero_removes_entry() {
        let mut c: Counters = [(38, 1.0), (44, 2.0)].into_iter().collect();
        assert_eq!(c.owned(44), 1.0);
        c.set(44, 0.0);
        assert_eq!(c, [(38, 1.0)].into_iter().collect());
    }

    #[test]
    fn default_multipliers_are_neutral() {
        let p = GameProgress::default();
        assert_eq!(p.drought_penalty, 1.0);
        assert_eq!(p.challenge15_rune_exp, 1.0);
        assert_eq!(p.cube_rune_level_bonus, 1.0);
        assert_eq!(p.offering_buy_amount, 1);
    }

    #[test]
    fn progress_loads_from_partial_json() {
        let json = r#"{
            "achievements": {"38": 1, "44": 1},
            "coins": "1e60",
            "current_reincarnation_challenge": 9
        }"#;
        let p: GameProgress = serde_json::from_str(json).unwrap();
        assert!(p.achievements.is_owned(38));
        assert_eq!(p.coins.exponent(), 60);
        assert_eq!(p.current_reincarnation_challenge, 9);
        assert_eq!(p.drought_penalty, 1.0);
    }
}
