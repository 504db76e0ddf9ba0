//! Unlock predicates and bonus multipliers consumed by the engines.
//!
//! The engines only ever see a `&dyn BonusSource`. [`GameStateBonuses`] is
//! the canonical implementation over a [`GameProgress`] snapshot.
//! [`FlatBonuses`] is a constant-valued source for tests and tools.
//!
//! # Experience per offering
//!
//! ```text
//! exp = universal_mult × universal_additive × per_rune × recycle
//! ```
//!
//! where the recycle multiplier is `1 / (1 - chance)` with the chance
//! clamped to `[0, 0.99]`.

use crate::decimal::Decimal;
use crate::keys::{RuneKey, TalismanKey};
use crate::progress::GameProgress;

/// Reincarnation challenge that debuffs every rune below the singularity
/// reset tier.
pub const DEBUFF_CHALLENGE: u32 = 9;

/// Maximum recycle chance honoured by the recycle multiplier.
pub const MAX_RECYCLE_CHANCE: f64 = 0.99;

/// Pure formula catalog read by the rune and talisman engines.
///
/// Implementations must be side-effect free: every engine operation reads
/// the source as one consistent snapshot.
pub trait BonusSource {
    /// Added to a rune's base levels-per-order-of-magnitude.
    fn levels_per_oom_increase(&self, rune: RuneKey) -> f64;

    /// Bonus levels added on top of the purchased level.
    fn free_rune_levels(&self, rune: RuneKey) -> f64;

    /// Multiplier applied to `level + free_levels`.
    fn effective_level_multiplier(&self, rune: RuneKey) -> f64;

    /// Experience gained per offering at the given purchased level.
    fn experience_per_offering(&self, rune: RuneKey, purchased_levels: u64) -> Decimal;

    fn rune_unlocked(&self, rune: RuneKey) -> bool;

    fn reincarnation_challenge_active(&self, challenge: u32) -> bool;

    fn talisman_unlocked(&self, talisman: TalismanKey) -> bool;

    /// Levels added to a talisman's base cap.
    fn talisman_level_cap_increase(&self, talisman: TalismanKey) -> u32;

    /// Multiplier on every talisman's rune bonus, before the metaphysics
    /// talisman's own effect is folded in.
    fn talisman_special_multiplier(&self) -> f64;

    /// Levels requested by one sacrifice (manual or automatic).
    fn sacrifice_levels(&self, auto: bool) -> u32;

    /// Levels the talisman auto-buyer attempts per talisman per tick.
    fn talisman_auto_buy_batch(&self) -> u32;
}

// ── Shared formulas ─────────────────────────────────────────────────────

/// Challenge families with different completion scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeFamily {
    Transcend,
    Reincarnation,
    Ascension,
}

/// Effective challenge completions: raw completions with diminishing
/// returns past each family's soft caps.
pub fn effective_challenge_completions(family: ChallengeFamily, completions: f64) -> f64 {
    let c = completions.max(0.0);
    match family {
        ChallengeFamily::Transcend => {
            c.min(100.0) + (c.clamp(100.0, 1000.0) - 100.0) / 20.0 + (c.max(1000.0) - 1000.0) / 100.0
        }
        ChallengeFamily::Reincarnation => {
            c.min(25.0) + (c.clamp(25.0, 75.0) - 25.0) / 2.0 + (c.max(75.0) - 75.0) / 10.0
        }
        ChallengeFamily::Ascension => c.min(10.0) + (c.max(10.0) - 10.0) / 2.0,
    }
}

/// Saturating growth from 1 toward `limit`.
pub fn sigmoid_exponential(limit: f64, coefficient: f64) -> f64 {
    1.0 + (limit - 1.0) * (1.0 - (-coefficient).exp())
}

/// `1 / (1 - chance)` with the chance clamped to `[0, MAX_RECYCLE_CHANCE]`.
pub fn recycle_multiplier(chance: f64) -> f64 {
    let chance = if chance.is_nan() { 0.0 } else { chance };
    1.0 / (1.0 - chance.clamp(0.0, MAX_RECYCLE_CHANCE))
}

// ── Canonical implementation ────────────────────────────────────────────

/// Canonical bonus catalog over a borrowed progress snapshot.
#[derive(Debug, Clone, Copy)]
pub struct GameStateBonuses<'a> {
    progress: &'a GameProgress,
}

impl<'a> GameStateBonuses<'a> {
    pub fn new(progress: &'a GameProgress) -> Self {
        Self { progress }
    }

    pub fn progress(&self) -> &'a GameProgress {
        self.progress
    }

    fn ecc(&self, family: ChallengeFamily, challenge: u32) -> f64 {
        effective_challenge_completions(family, self.progress.challenge_completions.get(challenge))
    }

    fn ant_levels(&self, upgrade: u32) -> f64 {
        self.progress.ant_upgrades.get(upgrade) + self.progress.bonus_ant_levels
    }

    /// `floor(log_base(coins + 1))`, computed in log10 space.
    fn coin_log(&self, base_log10: f64) -> f64 {
        ((self.progress.coins + Decimal::ONE).log10() / base_log10).floor()
    }

    fn first_five_free_levels(&self) -> f64 {
        let p = self.progress;
        self.ant_levels(9).min(1000.0) + 7.0 * p.constant_upgrades.get(7).min(1000.0)
    }

    fn universal_additive(&self, purchased_levels: u64) -> f64 {
        let p = self.progress;
        let hcc1 = p.highest_challenge_completions.get(1);
        1.0 + hcc1.min(1.0)
            + 0.04 * hcc1
            + 0.6 * p.researches.get(22)
            + 0.3 * p.researches.get(23)
            + 2.0 * p.upgrades.get(61)
            + p.upgrades.get(71) * purchased_levels as f64 / 25.0
    }

    fn universal_multiplier(&self) -> Decimal {
        let p = self.progress;
        let factors = [
            1.0 + p.researches.get(91) / 20.0,
            1.0 + p.researches.get(92) / 20.0,
            sigmoid_exponential(999.0, self.ant_levels(8).max(0.0).powf(1.1) / 10000.0),
            p.cube_rune_exp_bonus,
            1.0 + p.ascension_counter / 1000.0 * p.cube_upgrades.get(32),
            1.0 + p.constant_upgrades.get(8) / 10.0,
            p.challenge15_rune_exp,
        ];
        factors
            .into_iter()
            .fold(Decimal::ONE, |acc, f| acc * Decimal::from(f))
    }

    fn per_rune_multiplier(&self, rune: RuneKey) -> f64 {
        use ChallengeFamily::Reincarnation;
        let challenge = match rune {
            RuneKey::Speed | RuneKey::Duplication => 1.0 + self.ecc(Reincarnation, 7) / 10.0,
            RuneKey::Prism => 1.0 + self.ecc(Reincarnation, 8) / 5.0,
            RuneKey::Thrift => 1.0 + self.ecc(Reincarnation, 6) / 10.0,
            RuneKey::SuperiorIntellect => 1.0 + self.ecc(Reincarnation, 9) / 5.0,
            RuneKey::InfiniteAscent | RuneKey::Antiquities => return 1.0,
        };
        challenge * self.progress.drought_penalty
    }
}

impl BonusSource for GameStateBonuses<'_> {
    fn levels_per_oom_increase(&self, rune: RuneKey) -> f64 {
        use ChallengeFamily::{Ascension, Transcend};
        if !rune.is_first_five() {
            return 0.0;
        }
        let p = self.progress;
        let r = |i| p.researches.get(i);
        let cube = |i| p.cube_upgrades.get(i);
        let shared = self.ecc(Ascension, 11) + 1.5 * self.ecc(Ascension, 14);
        let specific = match rune {
            RuneKey::Speed => r(77) + r(111) + cube(16),
            RuneKey::Duplication => 0.75 * self.ecc(Transcend, 1) + r(78) + r(112),
            RuneKey::Prism => r(79) + r(113) + cube(16),
            RuneKey::Thrift => r(80) + r(114) + cube(37),
            RuneKey::SuperiorIntellect => r(115) + cube(37),
            RuneKey::InfiniteAscent | RuneKey::Antiquities => 0.0,
        };
        shared + specific
    }

    fn free_rune_levels(&self, rune: RuneKey) -> f64 {
        let p = self.progress;
        let coin_bank = (p.owned_coins / 400.0).min(100.0).floor();
        match rune {
            RuneKey::Speed => {
                self.first_five_free_levels()
                    + p.upgrades.get(27)
                        * (self.coin_log(10.0).min(50.0)
                            + (self.coin_log(50.0).min(50.0) - 10.0).max(0.0))
                    + p.upgrades.get(29) * coin_bank
            }
            RuneKey::Duplication => {
                self.first_five_free_levels()
                    + p.upgrades.get(28) * coin_bank
                    + p.upgrades.get(30)
                        * (self.coin_log(30.0).min(50.0) + self.coin_log(300.0).min(50.0))
            }
            RuneKey::Prism | RuneKey::Thrift | RuneKey::SuperiorIntellect => {
                self.first_five_free_levels()
            }
            RuneKey::InfiniteAscent => {
                (if p.instant_unlock_2 { 6.0 } else { 0.0 })
                    + p.cube_upgrades.get(73)
                    + p.campaign_rune_bonus
            }
            RuneKey::Antiquities => 0.0,
        }
    }

    fn effective_level_multiplier(&self, rune: RuneKey) -> f64 {
        if !rune.is_first_five() {
            return 1.0;
        }
        let p = self.progress;
        let r = |i| p.researches.get(i);
        let shard_term = 0.01 * (p.talisman_shards.max(0.0) + 1.0).ln() / 4f64.ln()
            * p.constant_upgrades.get(9).min(1.0);
        [
            1.0 + r(4) / 10.0 * self.ecc(ChallengeFamily::Ascension, 14),
            1.0 + r(21) / 100.0,
            1.0 + r(90) / 100.0,
            1.0 + r(131) / 200.0,
            1.0 + r(161) / 200.0 * 3.0 / 5.0,
            1.0 + r(176) / 200.0 * 2.0 / 5.0,
            1.0 + r(191) / 200.0 / 5.0,
            1.0 + r(146) / 200.0 * 4.0 / 5.0,
            1.0 + shard_term,
            p.challenge15_rune_bonus,
            p.cube_rune_level_bonus,
        ]
        .into_iter()
        .product()
    }

    fn experience_per_offering(&self, rune: RuneKey, purchased_levels: u64) -> Decimal {
        self.universal_multiplier()
            * self.universal_additive(purchased_levels)
            * recycle_multiplier(self.progress.recycle_chance)
            * self.per_rune_multiplier(rune)
    }

    fn rune_unlocked(&self, rune: RuneKey) -> bool {
        let p = self.progress;
        match rune {
            RuneKey::Speed => true,
            RuneKey::Duplication => p.achievements.is_owned(38),
            RuneKey::Prism => p.achievements.is_owned(44),
            RuneKey::Thrift => p.achievements.is_owned(102),
            RuneKey::SuperiorIntellect => p.researches.is_owned(82),
            RuneKey::InfiniteAscent => p.infinite_ascent_purchased || p.instant_unlock_2,
            RuneKey::Antiquities => p.platonic_upgrades.is_owned(20),
        }
    }

    fn reincarnation_challenge_active(&self, challenge: u32) -> bool {
        self.progress.current_reincarnation_challenge == challenge
    }

    fn talisman_unlocked(&self, talisman: TalismanKey) -> bool {
        let ach = |i| self.progress.achievements.is_owned(i);
        match talisman {
            TalismanKey::Exemption => ach(46),
            TalismanKey::Chronos => ach(47),
            TalismanKey::Midas => ach(48),
            TalismanKey::Metaphysics => ach(53),
            TalismanKey::Polymath => self.rune_unlocked(RuneKey::SuperiorIntellect),
            TalismanKey::Mortuus => ach(134),
            TalismanKey::Plastic => self.rune_unlocked(RuneKey::InfiniteAscent),
        }
    }

    fn talisman_level_cap_increase(&self, talisman: TalismanKey) -> u32 {
        let p = self.progress;
        let mut increase = 6.0 * self.ecc(ChallengeFamily::Ascension, 13)
            + (p.researches.get(200) / 400.0).floor();
        if talisman == TalismanKey::Plastic && p.instant_unlock_1 {
            increase += 10.0;
        }
        if talisman == TalismanKey::Midas && p.cube_upgrades.is_owned(67) {
            increase += 1337.0;
        }
        increase.max(0.0) as u32
    }

    fn talisman_special_multiplier(&self) -> f64 {
        let p = self.progress;
        1.0 + 0.02 * (p.achievements.owned(135) + p.achievements.owned(136) + p.achievements.owned(137))
            + 0.01 * (p.researches.get(106) + p.researches.get(107) + p.researches.get(116))
            + 0.03 * (p.cube_upgrades.get(9) + p.cube_upgrades.get(21))
    }

    fn sacrifice_levels(&self, auto: bool) -> u32 {
        let p = self.progress;
        if !auto {
            return p.offering_buy_amount;
        }
        if p.cube_upgrades.is_owned(20) {
            p.auto_offering_levels.saturating_mul(2)
        } else {
            p.auto_offering_levels
        }
    }

    fn talisman_auto_buy_batch(&self) -> u32 {
        let p = self.progress;
        if p.highest_singularity_count > 0.0 {
            180
        } else if p.ascension_count > 0.0 {
            30
        } else {
            1
        }
    }
}

// ── Flat implementation ─────────────────────────────────────────────────

/// Same answer for every rune and talisman.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatBonuses {
    pub experience_per_offering: f64,
    pub oom_increase: f64,
    pub free_levels: f64,
    pub level_multiplier: f64,
    pub runes_unlocked: bool,
    pub talismans_unlocked: bool,
    pub active_challenge: u32,
    pub cap_increase: u32,
    pub special_multiplier: f64,
    pub sacrifice_levels: u32,
    pub auto_buy_batch: u32,
}

impl Default for FlatBonuses {
    fn default() -> Self {
        Self {
            experience_per_offering: 1.0,
            oom_increase: 0.0,
            free_levels: 0.0,
            level_multiplier: 1.0,
            runes_unlocked: true,
            talismans_unlocked: true,
            active_challenge: 0,
            cap_increase: 0,
            special_multiplier: 1.0,
            sacrifice_levels: 1,
            auto_buy_batch: 1,
        }
    }
}

impl BonusSource for FlatBonuses {
    fn levels_per_oom_increase(&self, _rune: RuneKey) -> f64 {
        self.oom_increase
    }

    fn free_rune_levels(&self, _rune: RuneKey) -> f64 {
        self.free_levels
    }

    fn effective_level_multiplier(&self, _rune: RuneKey) -> f64 {
        self.level_multiplier
    }

    fn experience_per_offering(&self, _rune: RuneKey, _purchased_levels: u64) -> Decimal {
        Decimal::from(self.experience_per_offering)
    }

    fn rune_unlocked(&self, _rune: RuneKey) -> bool {
        self.runes_unlocked
    }

    fn reincarnation_challenge_active(&self, challenge: u32) -> bool {
        self.active_challenge != 0 && self.active_challenge == challenge
    }

    fn talisman_unlocked(&self, _talisman: TalismanKey) -> bool {
        self.talismans_unlocked
    }

    fn talisman_level_cap_increase(&self, _talisman: TalismanKey) -> u32 {
        self.cap_increase
    }

    fn talisman_special_multiplier(&self) -> f64 {
        self.special_multiplier
    }

    fn sacrifice_levels(&self, _auto: bool) -> u32 {
        self.sacrifice_levels
    }

    fn talisman_auto_buy_batch(&self) -> u32 {
        self.auto_buy_batch
    }
}
