//! Rune engine: experience-backed levels, offering purchases, rewards.
//!
//! A rune stores only its accumulated experience. Everything else (level,
//! free levels, effective level, reward) is derived on every access from
//! the ruleset and the current [`BonusSource`].
//!
//! # Cost curve
//!
//! Reaching level `L` costs `coefficient × (10^(L / eLPO) − 1)` experience,
//! where `eLPO` is the effective levels per order of magnitude. The level is
//! the largest `L` with `cost_to_reach(L) <= experience`: a logarithmic
//! estimate followed by an exact correction against the cost curve, so
//!
//! ```text
//! cost_to_reach(level) <= experience < cost_to_reach(level + 1)
//! ```
//!
//! holds at every magnitude the decimal type can represent.
//!
//! ```
//! use runeforge_logic::runes::{cost_to_reach, level_for_experience};
//! use runeforge_logic::decimal::Decimal;
//!
//! let exp = Decimal::from(10.0);
//! let level = level_for_experience(500.0, 150.0, exp);
//! assert_eq!(level, 1);
//! assert!(cost_to_reach(500.0, 150.0, level) <= exp);
//! assert!(cost_to_reach(500.0, 150.0, level + 1) > exp);
//! ```

use std::fmt;

use serde::Serialize;

use crate::bonuses::{BonusSource, DEBUFF_CHALLENGE};
use crate::decimal::Decimal;
use crate::keys::{ResetTier, RuneKey, RuneMap};
use crate::ruleset::{ChallengeDebuff, RuneDefinition, RunePurchasePolicy, Ruleset};
use crate::wallet::Wallet;

/// Upper bound on iterations of any bulk operation in one call.
pub const MAX_LEVELS_PER_CALL: u32 = 10_000;

/// Steps the boundary correction may take in each direction. The
/// logarithmic estimate is never off by more than one in practice.
const MAX_CORRECTION_STEPS: u32 = 8;

/// Highest level the cost curve can address; `level as f64` is exact up to here.
pub const MAX_EXACT_LEVEL: u64 = 1 << 53;

// ── Cost curve ──────────────────────────────────────────────────────────

/// Total experience needed to reach `level` from zero.
pub fn cost_to_reach(coefficient: f64, effective_levels_per_oom: f64, level: u64) -> Decimal {
    if level == 0 {
        return Decimal::ZERO;
    }
    if effective_levels_per_oom <= 0.0 {
        return Decimal::MAX;
    }
    let growth = Decimal::pow10(level as f64 / effective_levels_per_oom) - Decimal::ONE;
    growth * coefficient
}

/// Largest level whose cost is covered by `experience`.
pub fn level_for_experience(
    coefficient: f64,
    effective_levels_per_oom: f64,
    experience: Decimal,
) -> u64 {
    if effective_levels_per_oom <= 0.0 || coefficient <= 0.0 || experience <= Decimal::ZERO {
        return 0;
    }
    let estimate = effective_levels_per_oom * (experience / coefficient + Decimal::ONE).log10();
    let mut level = if estimate.is_finite() && estimate > 0.0 {
        estimate.floor().min(MAX_EXACT_LEVEL as f64) as u64
    } else {
        0
    };

    let cost = |l| cost_to_reach(coefficient, effective_levels_per_oom, l);
    let mut steps = 0;
    while level > 0 && cost(level) > experience && steps < MAX_CORRECTION_STEPS {
        level -= 1;
        steps += 1;
    }
    steps = 0;
    while level < MAX_EXACT_LEVEL
        && cost(level + 1) <= experience
        && steps < MAX_CORRECTION_STEPS
    {
        level += 1;
        steps += 1;
    }
    level
}

// ── Rewards ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedReward {
    pub accelerator_power: f64,
    pub multiplicative_accelerators: f64,
    pub global_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DuplicationReward {
    pub multiplier_boosts: f64,
    pub multiplicative_multipliers: f64,
    pub tax_reduction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrismReward {
    pub production_log10: f64,
    pub cost_divisor_log10: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThriftReward {
    pub cost_delay: f64,
    pub recycle_chance: f64,
    pub tax_reduction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuperiorIntellectReward {
    pub offering_mult: f64,
    pub obtainium_mult: f64,
    pub ant_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InfiniteAscentReward {
    pub quark_mult: f64,
    pub cube_mult: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AntiquitiesReward {
    pub add_code_cooldown_reduction: f64,
}

/// What a rune grants at a given effective level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rune", rename_all = "camelCase")]
pub enum RuneReward {
    Speed(SpeedReward),
    Duplication(DuplicationReward),
    Prism(PrismReward),
    Thrift(ThriftReward),
    SuperiorIntellect(SuperiorIntellectReward),
    InfiniteAscent(InfiniteAscentReward),
    Antiquities(AntiquitiesReward),
}

impl RuneReward {
    pub fn at_level(rune: RuneKey, level: f64) -> Self {
        let l = level.max(0.0);
        match rune {
            RuneKey::Speed => RuneReward::Speed(SpeedReward {
                accelerator_power: 0.0002 * l,
                multiplicative_accelerators: 1.0 + l / 400.0,
                global_speed: 2.0 - (-l.cbrt() / 100.0).exp(),
            }),
            RuneKey::Duplication => RuneReward::Duplication(DuplicationReward {
                multiplier_boosts: l / 5.0,
                multiplicative_multipliers: 1.0 + l / 400.0,
                tax_reduction: 0.001 + 0.999 * (-l.cbrt() / 10.0).exp(),
            }),
            RuneKey::Prism => RuneReward::Prism(PrismReward {
                production_log10: (2.0 * (1.0 + l / 2.0).log10() + (l / 2.0) * 2f64.log10()
                    - 256f64.log10())
                .max(0.0),
                cost_divisor_log10: (l / 10.0).floor(),
            }),
            RuneKey::Thrift => RuneReward::Thrift(ThriftReward {
                cost_delay: (l / 125.0).min(1e15),
                recycle_chance: 0.25 * (1.0 - (-l.sqrt() / 100.0).exp()),
                tax_reduction: 0.01 + 0.99 * (-l.cbrt() / 20.0).exp(),
            }),
            RuneKey::SuperiorIntellect => RuneReward::SuperiorIntellect(SuperiorIntellectReward {
                offering_mult: 1.0 + l / 2000.0,
                obtainium_mult: 1.0 + l / 200.0,
                ant_speed: 1.0 + l * l / 2500.0,
            }),
            RuneKey::InfiniteAscent => RuneReward::InfiniteAscent(InfiniteAscentReward {
                quark_mult: 1.1 + l / 500.0,
                cube_mult: 1.0 + l / 100.0,
            }),
            RuneKey::Antiquities => RuneReward::Antiquities(AntiquitiesReward {
                add_code_cooldown_reduction: if l > 0.0 {
                    0.8 - 0.3 * (l - 1.0) / (l + 10.0)
                } else {
                    1.0
                },
            }),
        }
    }
}

/// Percentage increase of a multiplier, e.g. 1.25 → 25.
fn pct(mult: f64) -> f64 {
    100.0 * (mult - 1.0)
}

impl fmt::Display for RuneReward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuneReward::Speed(r) => write!(
                f,
                "+{:.2}% accelerator power, +{:.2}% multiplicative accelerators, +{:.2}% global speed",
                100.0 * r.accelerator_power,
                pct(r.multiplicative_accelerators),
                pct(r.global_speed)
            ),
            RuneReward::Duplication(r) => write!(
                f,
                "+{:.2} multiplier boosts, +{:.2}% multiplicative multipliers, -{:.3}% tax",
                r.multiplier_boosts,
                pct(r.multiplicative_multipliers),
                100.0 * (1.0 - r.tax_reduction)
            ),
            RuneReward::Prism(r) => write!(
                f,
                "x{} crystal production, /{} crystal upgrade costs",
                Decimal::pow10(r.production_log10),
                Decimal::pow10(r.cost_divisor_log10)
            ),
            RuneReward::Thrift(r) => write!(
                f,
                "{:.2} cost delay, {:.3}% recycle chance, -{:.2}% tax",
                r.cost_delay,
                100.0 * r.recycle_chance,
                100.0 * (1.0 - r.tax_reduction)
            ),
            RuneReward::SuperiorIntellect(r) => write!(
                f,
                "x{:.3} offerings, x{:.3} obtainium, x{:.3} ant speed",
                r.offering_mult, r.obtainium_mult, r.ant_speed
            ),
            RuneReward::InfiniteAscent(r) => write!(
                f,
                "+{:.2}% quarks, +{:.2}% cubes",
                pct(r.quark_mult),
                pct(r.cube_mult)
            ),
            RuneReward::Antiquities(r) => write!(
                f,
                "add code cooldown at {:.2}%",
                100.0 * r.add_code_cooldown_reduction
            ),
        }
    }
}

// ── Rune ────────────────────────────────────────────────────────────────

/// Ruleset switches a rune reads on every operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuneRules {
    pub challenge_debuff: ChallengeDebuff,
    pub purchase_policy: RunePurchasePolicy,
    pub tnl_lookahead: u32,
    pub offering_ceiling: f64,
}

impl RuneRules {
    pub fn from_ruleset(ruleset: &Ruleset) -> Self {
        Self {
            challenge_debuff: ruleset.challenge_debuff,
            purchase_policy: ruleset.rune_purchase_policy,
            tnl_lookahead: ruleset.tnl_lookahead.max(1),
            offering_ceiling: ruleset.offering_ceiling,
        }
    }
}

/// Outcome of one `level_rune` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunePurchase {
    pub rune: RuneKey,
    pub offerings_spent: f64,
    pub level_before: u64,
    pub level_after: u64,
}

impl RunePurchase {
    pub fn levels_gained(&self) -> u64 {
        self.level_after.saturating_sub(self.level_before)
    }
}

/// Read-only view of a rune for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuneSnapshot {
    pub key: RuneKey,
    pub level: u64,
    pub free_levels: f64,
    pub effective_level: f64,
    pub effective_levels_per_oom: f64,
    pub experience: Decimal,
    pub experience_to_next_level: Decimal,
    pub offerings_to_next_level: Decimal,
    pub experience_per_offering: Decimal,
    pub unlocked: bool,
    pub reward: RuneReward,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rune {
    key: RuneKey,
    definition: RuneDefinition,
    rules: RuneRules,
    experience: Decimal,
}

impl Rune {
    pub fn new(
        key: RuneKey,
        definition: RuneDefinition,
        rules: RuneRules,
        experience: Decimal,
    ) -> Self {
        let mut rune = Self {
            key,
            definition,
            rules,
            experience: Decimal::ZERO,
        };
        rune.set_experience(experience);
        rune
    }

    pub fn key(&self) -> RuneKey {
        self.key
    }

    pub fn definition(&self) -> &RuneDefinition {
        &self.definition
    }

    pub fn experience(&self) -> Decimal {
        self.experience
    }

    /// Replace the stored experience. Negative values clamp to zero.
    pub fn set_experience(&mut self, experience: Decimal) {
        if experience.is_negative() {
            log::debug!("{}: negative experience {experience} clamped to zero", self.key);
            self.experience = Decimal::ZERO;
        } else {
            self.experience = experience;
        }
    }

    pub fn effective_levels_per_oom(&self, env: &dyn BonusSource) -> f64 {
        self.definition.levels_per_oom + env.levels_per_oom_increase(self.key)
    }

    pub fn cost_to_reach(&self, level: u64, env: &dyn BonusSource) -> Decimal {
        cost_to_reach(
            self.definition.cost_coefficient,
            self.effective_levels_per_oom(env),
            level,
        )
    }

    pub fn level(&self, env: &dyn BonusSource) -> u64 {
        level_for_experience(
            self.definition.cost_coefficient,
            self.effective_levels_per_oom(env),
            self.experience,
        )
    }

    fn debuffed(&self, env: &dyn BonusSource) -> bool {
        self.definition.minimal_reset_tier < ResetTier::Singularity
            && env.reincarnation_challenge_active(DEBUFF_CHALLENGE)
    }

    pub fn free_levels(&self, env: &dyn BonusSource) -> f64 {
        if self.debuffed(env) && self.rules.challenge_debuff == ChallengeDebuff::ZeroLevels {
            return 0.0;
        }
        env.free_rune_levels(self.key)
    }

    pub fn effective_level(&self, env: &dyn BonusSource) -> f64 {
        if self.debuffed(env) {
            return match self.rules.challenge_debuff {
                ChallengeDebuff::EffectiveLevelOne => 1.0,
                ChallengeDebuff::ZeroLevels => 0.0,
            };
        }
        let raw = (self.level(env) as f64 + self.free_levels(env))
            * env.effective_level_multiplier(self.key);
        raw.max(0.0)
    }

    pub fn unlocked(&self, env: &dyn BonusSource) -> bool {
        env.rune_unlocked(self.key)
    }

    /// Reward at the effective level, or the level-0 reward while locked.
    pub fn reward(&self, env: &dyn BonusSource) -> RuneReward {
        let level = if self.unlocked(env) {
            self.effective_level(env)
        } else {
            0.0
        };
        RuneReward::at_level(self.key, level)
    }

    pub fn experience_per_offering(&self, env: &dyn BonusSource) -> Decimal {
        env.experience_per_offering(self.key, self.level(env))
    }

    /// Experience still missing to reach `target`, never negative.
    pub fn experience_to_level(&self, target: u64, env: &dyn BonusSource) -> Decimal {
        (self.cost_to_reach(target, env) - self.experience).max_zero()
    }

    pub fn experience_to_next_level(&self, env: &dyn BonusSource) -> Decimal {
        let target = self.level(env).saturating_add(self.rules.tnl_lookahead as u64);
        self.experience_to_level(target, env)
    }

    pub fn offerings_to_next_level(&self, env: &dyn BonusSource) -> Decimal {
        (self.experience_to_next_level(env) / self.experience_per_offering(env)).ceil()
    }

    /// Offerings needed to reach `target`, at least 1.
    pub fn offerings_to_level(&self, target: u64, env: &dyn BonusSource) -> Decimal {
        let exp_left = self.experience_to_level(target, env);
        (exp_left / self.experience_per_offering(env)).ceil().max(Decimal::ONE)
    }

    /// Convert offerings to experience at the current rate.
    pub fn add_experience(&mut self, offerings: Decimal, env: &dyn BonusSource) {
        if offerings <= Decimal::ZERO {
            return;
        }
        let rate = self.experience_per_offering(env);
        self.experience += offerings * rate;
    }

    /// Spend up to `budget` offerings toward `levels` more levels and debit
    /// the wallet for what was spent.
    ///
    /// The budget is clamped to the wallet. When the requested levels cost
    /// more than the budget (or more than the offering ceiling), the whole
    /// budget is converted as partial progress.
    pub fn level_rune(
        &mut self,
        levels: u32,
        budget: f64,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> RunePurchase {
        let budget = if budget.is_nan() {
            0.0
        } else {
            budget.min(wallet.offerings).max(0.0)
        };
        let level_before = self.level(env);
        let mut spent = 0.0;

        if budget > 0.0 && levels > 0 {
            match self.rules.purchase_policy {
                RunePurchasePolicy::Lump => {
                    let target = level_before.saturating_add(levels as u64);
                    spent = self.purchase_step(target, budget, env);
                }
                RunePurchasePolicy::PerLevel => {
                    for _ in 0..levels.min(MAX_LEVELS_PER_CALL) {
                        let remaining = budget - spent;
                        if remaining <= 0.0 {
                            break;
                        }
                        let target = self.level(env) + 1;
                        spent += self.purchase_step(target, remaining, env);
                        if self.level(env) < target {
                            break;
                        }
                    }
                }
            }
            wallet.debit_offerings(spent);
        }

        let level_after = self.level(env);
        log::debug!(
            "{}: spent {spent} of {budget} offerings, level {level_before} -> {level_after}",
            self.key
        );
        RunePurchase {
            rune: self.key,
            offerings_spent: spent,
            level_before,
            level_after,
        }
    }

    /// One closed-form purchase toward `target`. Returns offerings spent.
    fn purchase_step(&mut self, target: u64, budget: f64, env: &dyn BonusSource) -> f64 {
        let rate = self.experience_per_offering(env);
        let required_exp = self.experience_to_level(target, env);
        let mut required = (required_exp / rate).ceil().max(Decimal::ONE);
        // Rounding in the subtraction can leave the ceiling one offering short.
        if self.experience + rate * required < self.cost_to_reach(target, env) {
            required += Decimal::ONE;
        }
        log::debug!(
            "{}: {required} offerings ({required_exp} experience) required for level {target}",
            self.key
        );
        let (spend, offerings) = if required > Decimal::from(budget)
            || required > Decimal::from(self.rules.offering_ceiling)
        {
            (budget, Decimal::from(budget))
        } else {
            (required.to_f64(), required)
        };
        self.experience += rate * offerings;
        spend
    }

    pub fn reset(&mut self) {
        self.experience = Decimal::ZERO;
    }

    pub fn snapshot(&self, env: &dyn BonusSource) -> RuneSnapshot {
        let reward = self.reward(env);
        RuneSnapshot {
            key: self.key,
            level: self.level(env),
            free_levels: self.free_levels(env),
            effective_level: self.effective_level(env),
            effective_levels_per_oom: self.effective_levels_per_oom(env),
            experience: self.experience,
            experience_to_next_level: self.experience_to_next_level(env),
            offerings_to_next_level: self.offerings_to_next_level(env),
            experience_per_offering: self.experience_per_offering(env),
            unlocked: self.unlocked(env),
            description: reward.to_string(),
            reward,
        }
    }
}

// ── Registry ────────────────────────────────────────────────────────────

/// All seven runes, built once per session from the persisted ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct RuneRegistry {
    runes: RuneMap<Rune>,
}

impl RuneRegistry {
    pub fn new(ruleset: &Ruleset, ledger: &RuneMap<Decimal>) -> Self {
        let rules = RuneRules::from_ruleset(ruleset);
        Self {
            runes: RuneMap::from_fn(|key| Rune::new(key, *ruleset.rune(key), rules, ledger[key])),
        }
    }

    pub fn get(&self, key: RuneKey) -> &Rune {
        &self.runes[key]
    }

    pub fn get_mut(&mut self, key: RuneKey) -> &mut Rune {
        &mut self.runes[key]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rune> {
        RuneKey::ALL.into_iter().map(move |k| &self.runes[k])
    }

    /// Sacrifice offerings into `key`. Does nothing while the rune is locked.
    pub fn sacrifice_offerings(
        &mut self,
        key: RuneKey,
        budget: f64,
        auto: bool,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> Option<RunePurchase> {
        let rune = &mut self.runes[key];
        if !rune.unlocked(env) {
            return None;
        }
        let levels = env.sacrifice_levels(auto).min(MAX_LEVELS_PER_CALL);
        if !auto {
            log::debug!("sacrificing {budget} offerings into {key} for {levels} levels");
        }
        Some(rune.level_rune(levels, budget, wallet, env))
    }

    /// Zero the experience of every rune whose reset tier is at or below
    /// `tier`. Returns how many runes were reset.
    pub fn reset_all(&mut self, tier: ResetTier) -> usize {
        let mut count = 0;
        for key in RuneKey::ALL {
            let rune = &mut self.runes[key];
            if rune.definition.minimal_reset_tier <= tier {
                rune.reset();
                count += 1;
            }
        }
        log::info!("{tier:?} reset cleared {count} rune(s)");
        count
    }

    /// Σ (level + free levels) over every rune.
    pub fn sum_of_levels(&self, env: &dyn BonusSource) -> f64 {
        self.iter()
            .map(|r| r.level(env) as f64 + r.free_levels(env))
            .sum()
    }

    pub fn unlocked_count(&self, env: &dyn BonusSource) -> usize {
        self.iter().filter(|r| r.unlocked(env)).count()
    }

    pub fn snapshots(&self, env: &dyn BonusSource) -> Vec<RuneSnapshot> {
        self.iter().map(|r| r.snapshot(env)).collect()
    }

    /// Persisted form: experience per rune.
    pub fn ledger(&self) -> RuneMap<Decimal> {
        self.runes.map(|_, r| r.experience)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonuses::FlatBonuses;

    fn speed_rune(experience: f64) -> Rune {
        let ruleset = Ruleset::default();
        Rune::new(
            RuneKey::Speed,
            *ruleset.rune(RuneKey::Speed),
            RuneRules::from_ruleset(&ruleset),
            Decimal::from(experience),
        )
    }

    // ── Cost curve ──

    #[test]
    fn zero_experience_is_level_zero() {
        assert_eq!(level_for_experience(500.0, 150.0, Decimal::ZERO), 0);
    }

    #[test]
    fn non_positive_elpo_is_level_zero() {
        assert_eq!(level_for_experience(500.0, 0.0, Decimal::from(1e9)), 0);
        assert_eq!(level_for_experience(500.0, -3.0, Decimal::from(1e9)), 0);
    }

    #[test]
    fn exact_boundary_reaches_level() {
        for level in [1, 7, 150, 1_000, 40_000] {
            let cost = cost_to_reach(500.0, 150.0, level);
            assert_eq!(level_for_experience(500.0, 150.0, cost), level, "level {level}");
        }
    }

    #[test]
    fn level_invariant_beyond_f64_range() {
        let exp: Decimal = "3.7e1200".parse().unwrap();
        let level = level_for_experience(2.5e7, 150.0, exp);
        assert!(level > 150 * 1000);
        assert!(cost_to_reach(2.5e7, 150.0, level) <= exp);
        assert!(cost_to_reach(2.5e7, 150.0, level + 1) > exp);
    }

    #[test]
    fn level_is_exact_at_exponent_cap() {
        use crate::decimal::MAX_EXPONENT;
        let exp = Decimal::from_parts(1.0, MAX_EXPONENT - 1);
        let level = level_for_experience(1.0, 1.0, exp);
        assert_eq!(level, (MAX_EXPONENT - 1) as u64);
        assert!(cost_to_reach(1.0, 1.0, level) <= exp);
        assert!(cost_to_reach(1.0, 1.0, level + 1) > exp);
    }

    #[test]
    fn saturated_experience_stops_at_exact_level_limit() {
        assert_eq!(level_for_experience(1.0, 1.0, Decimal::MAX), MAX_EXACT_LEVEL);
        assert!(level_for_experience(1.0, 150.0, Decimal::MAX) <= MAX_EXACT_LEVEL);
    }

    #[test]
    fn antiquities_curve_is_steep() {
        // 0.02 levels per OOM: level 1 needs 50 orders of magnitude over the coefficient.
        let exp: Decimal = "1e255".parse().unwrap();
        assert_eq!(level_for_experience(1e206, 0.02, exp), 0);
        let exp: Decimal = "1e257".parse().unwrap();
        assert_eq!(level_for_experience(1e206, 0.02, exp), 1);
    }

    // ── Derived values ──

    #[test]
    fn experience_to_next_level_matches_curve() {
        let env = FlatBonuses::default();
        let rune = speed_rune(0.0);
        let tnl = rune.experience_to_next_level(&env);
        assert_eq!(tnl, cost_to_reach(500.0, 150.0, 1));
        assert_eq!(rune.offerings_to_next_level(&env), tnl.ceil());
    }

    #[test]
    fn offerings_to_level_is_at_least_one() {
        let env = FlatBonuses::default();
        let rune = speed_rune(1e6);
        assert_eq!(rune.offerings_to_level(0, &env), Decimal::ONE);
    }

    #[test]
    fn oom_increase_flattens_curve() {
        let rune = speed_rune(1e6);
        let base = rune.level(&FlatBonuses::default());
        let boosted = rune.level(&FlatBonuses {
            oom_increase: 50.0,
            ..FlatBonuses::default()
        });
        assert!(boosted > base);
    }

    #[test]
    fn effective_level_combines_free_levels_and_multiplier() {
        let rune = speed_rune(1e6);
        let env = FlatBonuses {
            free_levels: 10.0,
            level_multiplier: 2.0,
            ..FlatBonuses::default()
        };
        let level = rune.level(&env) as f64;
        assert_eq!(rune.effective_level(&env), (level + 10.0) * 2.0);
    }

    #[test]
    fn negative_free_levels_floor_effective_level_at_zero() {
        let rune = speed_rune(0.0);
        let env = FlatBonuses {
            free_levels: -25.0,
            ..FlatBonuses::default()
        };
        assert_eq!(rune.effective_level(&env), 0.0);
    }

    #[test]
    fn challenge_debuff_forces_effective_level_one() {
        let rune = speed_rune(1e9);
        let env = FlatBonuses {
            active_challenge: DEBUFF_CHALLENGE,
            free_levels: 40.0,
            ..FlatBonuses::default()
        };
        assert_eq!(rune.effective_level(&env), 1.0);
        assert_eq!(rune.free_levels(&env), 40.0);
        // raw level untouched
        assert_eq!(rune.level(&env), rune.level(&FlatBonuses::default()));
    }

    #[test]
    fn zero_levels_debuff_variant() {
        let mut ruleset = Ruleset::default();
        ruleset.challenge_debuff = ChallengeDebuff::ZeroLevels;
        let rune = Rune::new(
            RuneKey::Prism,
            *ruleset.rune(RuneKey::Prism),
            RuneRules::from_ruleset(&ruleset),
            Decimal::from(1e9),
        );
        let env = FlatBonuses {
            active_challenge: DEBUFF_CHALLENGE,
            free_levels: 40.0,
            ..FlatBonuses::default()
        };
        assert_eq!(rune.free_levels(&env), 0.0);
        assert_eq!(rune.effective_level(&env), 0.0);
        assert!(rune.level(&env) > 0);
    }

    #[test]
    fn debuff_spares_singularity_runes() {
        let ruleset = Ruleset::default();
        let rune = Rune::new(
            RuneKey::InfiniteAscent,
            *ruleset.rune(RuneKey::InfiniteAscent),
            RuneRules::from_ruleset(&ruleset),
            "1e80".parse().unwrap(),
        );
        let env = FlatBonuses {
            active_challenge: DEBUFF_CHALLENGE,
            ..FlatBonuses::default()
        };
        assert_eq!(rune.effective_level(&env), rune.level(&env) as f64);
    }

    #[test]
    fn locked_rune_reports_level_zero_reward() {
        let mut rune = speed_rune(0.0);
        let env = FlatBonuses::default();
        rune.set_experience(rune.cost_to_reach(50, &env));
        assert_eq!(rune.level(&env), 50);
        let locked = FlatBonuses {
            runes_unlocked: false,
            ..FlatBonuses::default()
        };
        assert_eq!(rune.reward(&locked), RuneReward::at_level(RuneKey::Speed, 0.0));
        assert_ne!(rune.reward(&env), RuneReward::at_level(RuneKey::Speed, 0.0));
    }

    #[test]
    fn negative_experience_is_clamped() {
        let rune = speed_rune(-5.0);
        assert_eq!(rune.experience(), Decimal::ZERO);
    }

    // ── Purchases ──

    #[test]
    fn budget_cap_spends_whole_budget_as_partial_progress() {
        // Not `level_rune(1, 10.0)`: level 1 costs about 7.73 here, so that
        // call completes the target instead of hitting the budget. Asking
        // for 10 levels makes the budget the binding limit.
        let mut rune = speed_rune(0.0);
        let env = FlatBonuses::default();
        let mut wallet = Wallet::new(10.0, 0.0);
        let purchase = rune.level_rune(10, 10.0, &mut wallet, &env);
        assert_eq!(purchase.offerings_spent, 10.0);
        assert_eq!(wallet.offerings, 0.0);
        assert_eq!(rune.experience().to_f64(), 10.0);
        assert_eq!(rune.level(&env), 1);
        assert_eq!(purchase.level_after, 1);
    }

    #[test]
    fn affordable_purchase_spends_exactly_required() {
        let mut rune = speed_rune(0.0);
        let env = FlatBonuses::default();
        let mut wallet = Wallet::new(1_000.0, 0.0);
        let required = rune.offerings_to_level(10, &env).to_f64();
        let purchase = rune.level_rune(10, 1_000.0, &mut wallet, &env);
        assert_eq!(purchase.offerings_spent, required);
        assert_eq!(wallet.offerings, 1_000.0 - required);
        assert!(purchase.level_after >= 10);
    }

    #[test]
    fn budget_is_clamped_to_wallet() {
        let mut rune = speed_rune(0.0);
        let env = FlatBonuses::default();
        let mut wallet = Wallet::new(3.0, 0.0);
        let purchase = rune.level_rune(100, 1e9, &mut wallet, &env);
        assert_eq!(purchase.offerings_spent, 3.0);
        assert_eq!(wallet.offerings, 0.0);
    }

    #[test]
    fn zero_budget_is_a_no_op() {
        let mut rune = speed_rune(0.0);
        let env = FlatBonuses::default();
        let mut wallet = Wallet::new(0.0, 0.0);
        let purchase = rune.level_rune(5, 100.0, &mut wallet, &env);
        assert_eq!(purchase.offerings_spent, 0.0);
        assert_eq!(rune.experience(), Decimal::ZERO);
    }

    #[test]
    fn per_level_policy_reaches_same_level() {
        let mut ruleset = Ruleset::default();
        ruleset.rune_purchase_policy = RunePurchasePolicy::PerLevel;
        let mut rune = Rune::new(
            RuneKey::Speed,
            *ruleset.rune(RuneKey::Speed),
            RuneRules::from_ruleset(&ruleset),
            Decimal::ZERO,
        );
        let env = FlatBonuses::default();
        let mut wallet = Wallet::new(1e6, 0.0);
        let purchase = rune.level_rune(20, 1e6, &mut wallet, &env);
        assert_eq!(purchase.level_after, 20);
        assert_eq!(wallet.offerings, 1e6 - purchase.offerings_spent);
    }

    #[test]
    fn offering_ceiling_forces_partial_progress() {
        let ruleset = Ruleset::default();
        let mut rune = Rune::new(
            RuneKey::Antiquities,
            *ruleset.rune(RuneKey::Antiquities),
            RuneRules::from_ruleset(&ruleset),
            Decimal::ZERO,
        );
        let env = FlatBonuses::default();
        let mut wallet = Wallet::new(1e308, 0.0);
        let purchase = rune.level_rune(1, 1e308, &mut wallet, &env);
        // Level 1 needs ~1e256 offerings: affordable and under the ceiling.
        assert_eq!(purchase.level_after, 1);
        let purchase = rune.level_rune(10, wallet.offerings, &mut wallet, &env);
        // Level 11 needs ~1e756, far above the ceiling: the whole budget goes in.
        assert_eq!(wallet.offerings, 0.0);
        assert!(purchase.offerings_spent > 0.0);
    }

    #[test]
    fn add_experience_uses_current_rate() {
        let mut rune = speed_rune(0.0);
        let env = FlatBonuses {
            experience_per_offering: 3.0,
            ..FlatBonuses::default()
        };
        rune.add_experience(Decimal::from(4.0), &env);
        assert_eq!(rune.experience().to_f64(), 12.0);
        rune.add_experience(Decimal::from(-4.0), &env);
        assert_eq!(rune.experience().to_f64(), 12.0);
    }

    // ── Rewards ──

    #[test]
    fn reward_formulas_at_level_zero() {
        match RuneReward::at_level(RuneKey::Speed, 0.0) {
            RuneReward::Speed(r) => {
                assert_eq!(r.accelerator_power, 0.0);
                assert_eq!(r.global_speed, 1.0);
            }
            other => panic!("unexpected reward {other:?}"),
        }
        match RuneReward::at_level(RuneKey::Prism, 0.0) {
            RuneReward::Prism(r) => assert_eq!(r.production_log10, 0.0),
            other => panic!("unexpected reward {other:?}"),
        }
        match RuneReward::at_level(RuneKey::Antiquities, 0.0) {
            RuneReward::Antiquities(r) => assert_eq!(r.add_code_cooldown_reduction, 1.0),
            other => panic!("unexpected reward {other:?}"),
        }
    }

    #[test]
    fn reward_formulas_at_level_1000() {
        match RuneReward::at_level(RuneKey::SuperiorIntellect, 1000.0) {
            RuneReward::SuperiorIntellect(r) => {
                assert_eq!(r.offering_mult, 1.5);
                assert_eq!(r.obtainium_mult, 6.0);
                assert_eq!(r.ant_speed, 401.0);
            }
            other => panic!("unexpected reward {other:?}"),
        }
        match RuneReward::at_level(RuneKey::Antiquities, 1.0) {
            RuneReward::Antiquities(r) => assert_eq!(r.add_code_cooldown_reduction, 0.8),
            other => panic!("unexpected reward {other:?}"),
        }
    }

    #[test]
    fn reward_descriptions_are_readable() {
        let text = RuneReward::at_level(RuneKey::InfiniteAscent, 50.0).to_string();
        assert_eq!(text, "+20.00% quarks, +50.00% cubes");
    }

    // ── Registry ──

    #[test]
    fn registry_reset_respects_tiers() {
        let ruleset = Ruleset::default();
        let ledger = RuneMap::from_fn(|_| Decimal::from(1e90));
        let mut registry = RuneRegistry::new(&ruleset, &ledger);
        assert_eq!(registry.reset_all(ResetTier::Reincarnation), 0);
        assert_eq!(registry.reset_all(ResetTier::Ascension), 5);
        assert_eq!(registry.get(RuneKey::Speed).experience(), Decimal::ZERO);
        assert_eq!(registry.get(RuneKey::InfiniteAscent).experience(), Decimal::from(1e90));
        assert_eq!(registry.reset_all(ResetTier::Singularity), 7);
        assert!(registry.ledger().iter().all(|(_, e)| e.is_zero()));
    }

    #[test]
    fn registry_aggregates() {
        let ruleset = Ruleset::default();
        let mut ledger = RuneMap::default();
        ledger.speed = cost_to_reach(500.0, 150.0, 10);
        ledger.duplication = cost_to_reach(5e3, 150.0, 4);
        let registry = RuneRegistry::new(&ruleset, &ledger);
        let env = FlatBonuses {
            free_levels: 1.0,
            ..FlatBonuses::default()
        };
        assert_eq!(registry.sum_of_levels(&env), 14.0 + 7.0);
        assert_eq!(registry.unlocked_count(&env), 7);
        let locked = FlatBonuses {
            runes_unlocked: false,
            ..FlatBonuses::default()
        };
        assert_eq!(registry.unlocked_count(&locked), 0);
    }

    #[test]
    fn sacrifice_skips_locked_runes() {
        let mut registry = RuneRegistry::new(&Ruleset::default(), &RuneMap::default());
        let mut wallet = Wallet::new(100.0, 0.0);
        let locked = FlatBonuses {
            runes_unlocked: false,
            ..FlatBonuses::default()
        };
        assert!(registry
            .sacrifice_offerings(RuneKey::Thrift, 100.0, false, &mut wallet, &locked)
            .is_none());
        assert_eq!(wallet.offerings, 100.0);
    }

    #[test]
    fn sacrifice_uses_requested_levels() {
        let mut registry = RuneRegistry::new(&Ruleset::default(), &RuneMap::default());
        let mut wallet = Wallet::new(1e6, 0.0);
        let env = FlatBonuses {
            sacrifice_levels: 5,
            ..FlatBonuses::default()
        };
        let purchase = registry
            .sacrifice_offerings(RuneKey::Speed, 1e6, true, &mut wallet, &env)
            .unwrap();
        assert!(purchase.levels_gained() >= 5);
    }
}
