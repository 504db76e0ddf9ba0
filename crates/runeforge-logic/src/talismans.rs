//! Talisman engine: fragment-ledger levels, rarity tiers, rune bonuses.
//!
//! A talisman persists only the fragments invested in it. Its level is
//! rebuilt by greedy replay: starting from level 0, subtract each level's
//! 7-currency cost from a working copy of the ledger while it is covered
//! and the level is below the effective cap.
//!
//! # Rarity
//!
//! Rarity runs 1–7 and depends only on the base `max_level`, never on cap
//! increases:
//!
//! ```
//! use runeforge_logic::talismans::rarity_for_level;
//!
//! assert_eq!(rarity_for_level(0, 180), 1);
//! assert_eq!(rarity_for_level(30, 180), 2);
//! assert_eq!(rarity_for_level(180, 180), 7);
//! assert_eq!(rarity_for_level(1500, 180), 7);
//! ```

use std::fmt;

use serde::Serialize;

use crate::bonuses::BonusSource;
use crate::keys::{
    FragmentBasket, FragmentKind, ResetTier, RuneKey, RuneMap, TalismanKey, TalismanMap,
};
use crate::ruleset::{
    CostCurve, RuneModifiers, Ruleset, TalismanDefinition, RESPEC_ALL_COST, RESPEC_COST,
};
use crate::runes::MAX_LEVELS_PER_CALL;
use crate::wallet::Wallet;

/// Rune bonus multiplier per rarity (index 0 = locked).
pub const RARITY_MULTIPLIERS: [f64; 8] = [0.0, 1.0, 1.2, 1.5, 1.8, 2.1, 2.5, 3.0];

/// Relative slack when replaying a ledger. Summing non-integral prices and
/// subtracting them again can leave the last level short by rounding.
const REPLAY_TOLERANCE: f64 = 1e-9;

// ── Cost curves ─────────────────────────────────────────────────────────

/// Level at which a currency starts being charged, its cubic coefficient
/// on the regular curve, and its scale on the exponential curve.
struct CurrencyTier {
    threshold: u32,
    cubic: f64,
    scale: f64,
}

const CURRENCY_TIERS: [CurrencyTier; 7] = [
    CurrencyTier { threshold: 0, cubic: 1.0 / 8.0, scale: 100.0 },
    CurrencyTier { threshold: 30, cubic: 1.0 / 32.0, scale: 50.0 },
    CurrencyTier { threshold: 60, cubic: 1.0 / 384.0, scale: 25.0 },
    CurrencyTier { threshold: 90, cubic: 1.0 / 500.0, scale: 20.0 },
    CurrencyTier { threshold: 120, cubic: 1.0 / 375.0, scale: 15.0 },
    CurrencyTier { threshold: 150, cubic: 1.0 / 192.0, scale: 10.0 },
    CurrencyTier { threshold: 150, cubic: 1.0 / 1280.0, scale: 5.0 },
];

fn tier(kind: FragmentKind) -> &'static CurrencyTier {
    &CURRENCY_TIERS[kind as usize]
}

/// Cost of buying the level after `level` on the cubic curve.
pub fn regular_cost(base_mult: f64, level: u32) -> FragmentBasket {
    let l = level as f64;
    let mut price = base_mult;
    if level >= 120 {
        price *= (l - 90.0) / 30.0;
    }
    if level >= 150 {
        price *= (l - 120.0) / 30.0;
    }
    if level >= 180 {
        price *= (l - 170.0) / 10.0;
    }
    FragmentBasket::from_fn(|kind| {
        let t = tier(kind);
        if level < t.threshold {
            return 0.0;
        }
        let over = (level - t.threshold) as f64;
        price * (1.0 + t.cubic * over.powi(3)).floor().max(0.0)
    })
}

/// Cost of buying the level after `level` on the `1.12^level` curve.
pub fn exponential_cost(base_mult: f64, level: u32) -> FragmentBasket {
    FragmentBasket::from_fn(|kind| {
        let t = tier(kind);
        if level < t.threshold {
            return 0.0;
        }
        (base_mult * 1.12f64.powi((level - t.threshold) as i32) * t.scale).floor()
    })
}

pub fn cost_at(definition: &TalismanDefinition, level: u32) -> FragmentBasket {
    match definition.cost_curve {
        CostCurve::Regular => regular_cost(definition.base_mult, level),
        CostCurve::Exponential => exponential_cost(definition.base_mult, level),
    }
}

/// Rarity 1–7 from level against the base max level.
pub fn rarity_for_level(level: u32, max_level: u32) -> u8 {
    if max_level == 0 {
        return 7;
    }
    let steps = (6 * level as u64) / max_level as u64;
    1 + steps.min(6) as u8
}

/// Levels left before the next rarity tier; 0 at or above `max_level`.
pub fn levels_until_rarity_increase(level: u32, max_level: u32) -> u32 {
    if level >= max_level {
        return 0;
    }
    let rarity = rarity_for_level(level, max_level) as u64;
    let required = (max_level as u64 * rarity).div_ceil(6);
    (required as u32).saturating_sub(level)
}

pub fn rarity_multiplier(rarity: u8) -> f64 {
    RARITY_MULTIPLIERS[(rarity as usize).min(7)]
}

/// Fragments a talisman at `level` would have spent, capped at `cap`.
/// Used to convert legacy level-only saves into ledgers.
pub fn ledger_for_level(definition: &TalismanDefinition, level: u32, cap: u32) -> FragmentBasket {
    let mut ledger = FragmentBasket::default();
    for l in 0..level.min(cap) {
        ledger.credit(&cost_at(definition, l));
    }
    ledger
}

fn replay_covers(budget: &FragmentBasket, cost: &FragmentBasket) -> bool {
    FragmentKind::ALL.iter().all(|&k| {
        let need = cost[k];
        need <= budget[k] || need - budget[k] <= REPLAY_TOLERANCE * need
    })
}

/// Pay for levels from `level` upward out of `budget` until one is not
/// covered or `cap` is reached. Returns the level reached.
fn absorb_levels(
    definition: &TalismanDefinition,
    budget: &mut FragmentBasket,
    mut level: u32,
    cap: u32,
) -> u32 {
    while level < cap {
        let cost = cost_at(definition, level);
        if !replay_covers(budget, &cost) {
            break;
        }
        for kind in FragmentKind::ALL {
            budget[kind] = (budget[kind] - cost[kind]).max(0.0);
        }
        level += 1;
    }
    level
}

/// Greedy replay of a ledger. Returns the highest level the ledger pays for
/// and what is left over.
fn replay_level(
    definition: &TalismanDefinition,
    ledger: &FragmentBasket,
    cap: u32,
) -> (u32, FragmentBasket) {
    let mut surplus = *ledger;
    let level = absorb_levels(definition, &mut surplus, 0, cap);
    (level, surplus)
}

// ── Rewards ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExemptionReward {
    pub tax_reduction: f64,
    pub duplication_oom_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChronosReward {
    pub global_speed: f64,
    pub speed_oom_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MidasReward {
    pub blessing_bonus: f64,
    pub thrift_oom_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetaphysicsReward {
    pub talisman_effect: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolymathReward {
    pub spirit_bonus: f64,
    pub superior_intellect_oom_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MortuusReward {
    pub ant_bonus: f64,
    pub prism_oom_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlasticReward {
    pub quark_bonus: f64,
}

/// What a talisman grants at a given level and rarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "talisman", rename_all = "camelCase")]
pub enum TalismanReward {
    Exemption(ExemptionReward),
    Chronos(ChronosReward),
    Midas(MidasReward),
    Metaphysics(MetaphysicsReward),
    Polymath(PolymathReward),
    Mortuus(MortuusReward),
    Plastic(PlasticReward),
}

impl TalismanReward {
    pub fn at(talisman: TalismanKey, level: u32, rarity: u8) -> Self {
        let r = rarity.saturating_sub(1) as f64;
        let oom = level as f64 / 60.0;
        match talisman {
            TalismanKey::Exemption => TalismanReward::Exemption(ExemptionReward {
                tax_reduction: 0.1 * r,
                duplication_oom_bonus: oom,
            }),
            TalismanKey::Chronos => TalismanReward::Chronos(ChronosReward {
                global_speed: 1.0 + 0.1 * r,
                speed_oom_bonus: oom,
            }),
            TalismanKey::Midas => TalismanReward::Midas(MidasReward {
                blessing_bonus: 0.1 * r,
                thrift_oom_bonus: oom,
            }),
            TalismanKey::Metaphysics => TalismanReward::Metaphysics(MetaphysicsReward {
                talisman_effect: 0.02 * r,
            }),
            TalismanKey::Polymath => TalismanReward::Polymath(PolymathReward {
                spirit_bonus: 0.01 * r,
                superior_intellect_oom_bonus: oom,
            }),
            TalismanKey::Mortuus => TalismanReward::Mortuus(MortuusReward {
                ant_bonus: 2.0 * r,
                prism_oom_bonus: oom,
            }),
            TalismanKey::Plastic => TalismanReward::Plastic(PlasticReward {
                quark_bonus: 0.005 * level as f64,
            }),
        }
    }

    /// The rune whose levels-per-OOM this reward raises, and by how much.
    pub fn oom_bonus(&self) -> Option<(RuneKey, f64)> {
        match self {
            TalismanReward::Exemption(r) => Some((RuneKey::Duplication, r.duplication_oom_bonus)),
            TalismanReward::Chronos(r) => Some((RuneKey::Speed, r.speed_oom_bonus)),
            TalismanReward::Midas(r) => Some((RuneKey::Thrift, r.thrift_oom_bonus)),
            TalismanReward::Polymath(r) => {
                Some((RuneKey::SuperiorIntellect, r.superior_intellect_oom_bonus))
            }
            TalismanReward::Mortuus(r) => Some((RuneKey::Prism, r.prism_oom_bonus)),
            TalismanReward::Metaphysics(_) | TalismanReward::Plastic(_) => None,
        }
    }
}

impl fmt::Display for TalismanReward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TalismanReward::Exemption(r) => write!(
                f,
                "-{:.0}% taxes, +{:.2} duplication levels per OOM",
                100.0 * r.tax_reduction,
                r.duplication_oom_bonus
            ),
            TalismanReward::Chronos(r) => write!(
                f,
                "x{:.2} global speed, +{:.2} speed levels per OOM",
                r.global_speed, r.speed_oom_bonus
            ),
            TalismanReward::Midas(r) => write!(
                f,
                "+{:.0}% blessings, +{:.2} thrift levels per OOM",
                100.0 * r.blessing_bonus,
                r.thrift_oom_bonus
            ),
            TalismanReward::Metaphysics(r) => {
                write!(f, "+{:.2} talisman effect", r.talisman_effect)
            }
            TalismanReward::Polymath(r) => write!(
                f,
                "+{:.0}% spirits, +{:.2} superior intellect levels per OOM",
                100.0 * r.spirit_bonus,
                r.superior_intellect_oom_bonus
            ),
            TalismanReward::Mortuus(r) => write!(
                f,
                "+{:.0} ant levels, +{:.2} prism levels per OOM",
                r.ant_bonus, r.prism_oom_bonus
            ),
            TalismanReward::Plastic(r) => {
                write!(f, "+{:.1}% quarks", 100.0 * r.quark_bonus)
            }
        }
    }
}

// ── Talisman ────────────────────────────────────────────────────────────

/// Read-only view of a talisman for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TalismanSnapshot {
    pub key: TalismanKey,
    pub level: u32,
    pub effective_level_cap: u32,
    pub rarity: u8,
    pub levels_until_rarity_increase: u32,
    pub next_level_cost: FragmentBasket,
    pub fragments_invested: FragmentBasket,
    pub unlocked: bool,
    pub reward: TalismanReward,
    pub rune_bonuses: RuneMap<f64>,
    pub modifiers: RuneModifiers,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Talisman {
    key: TalismanKey,
    definition: TalismanDefinition,
    fragments_invested: FragmentBasket,
    modifiers: RuneModifiers,
    /// Level replayed against `cap`.
    level: u32,
    cap: u32,
    /// Ledger left over once `level` is paid for.
    surplus: FragmentBasket,
}

impl Talisman {
    pub fn new(
        key: TalismanKey,
        definition: TalismanDefinition,
        fragments_invested: FragmentBasket,
        modifiers: RuneModifiers,
        env: &dyn BonusSource,
    ) -> Self {
        let modifiers = if modifiers.is_valid() {
            modifiers
        } else {
            log::warn!("{key}: invalid rune modifiers {modifiers:?}; using defaults");
            definition.default_modifiers
        };
        let mut talisman = Self {
            key,
            definition,
            fragments_invested: FragmentBasket::from_fn(|k| {
                let v = fragments_invested[k];
                if v.is_finite() && v > 0.0 {
                    v
                } else {
                    0.0
                }
            }),
            modifiers,
            level: 0,
            cap: 0,
            surplus: FragmentBasket::default(),
        };
        talisman.update_level_from_invested(talisman.effective_level_cap(env));
        talisman
    }

    pub fn key(&self) -> TalismanKey {
        self.key
    }

    pub fn definition(&self) -> &TalismanDefinition {
        &self.definition
    }

    pub fn fragments_invested(&self) -> &FragmentBasket {
        &self.fragments_invested
    }

    pub fn modifiers(&self) -> RuneModifiers {
        self.modifiers
    }

    /// Level as of the last refresh.
    pub fn cached_level(&self) -> u32 {
        self.level
    }

    pub fn effective_level_cap(&self, env: &dyn BonusSource) -> u32 {
        self.definition
            .max_level
            .saturating_add(env.talisman_level_cap_increase(self.key))
    }

    /// Rebuild the cached level from the ledger against `cap`.
    pub fn update_level_from_invested(&mut self, cap: u32) {
        let (level, surplus) = replay_level(&self.definition, &self.fragments_invested, cap);
        self.level = level;
        self.surplus = surplus;
        self.cap = cap;
    }

    /// Re-derive the cached level if the effective cap moved.
    pub fn refresh(&mut self, env: &dyn BonusSource) {
        let cap = self.effective_level_cap(env);
        if cap != self.cap || self.level > cap {
            self.update_level_from_invested(cap);
        }
    }

    /// Level under the current cap, without touching the cache.
    pub fn level(&self, env: &dyn BonusSource) -> u32 {
        let cap = self.effective_level_cap(env);
        if cap == self.cap {
            self.level
        } else {
            replay_level(&self.definition, &self.fragments_invested, cap).0
        }
    }

    pub fn unlocked(&self, env: &dyn BonusSource) -> bool {
        env.talisman_unlocked(self.key)
    }

    /// 1–7 when unlocked, 0 when locked.
    pub fn rarity(&self, env: &dyn BonusSource) -> u8 {
        if self.unlocked(env) {
            rarity_for_level(self.level(env), self.definition.max_level)
        } else {
            0
        }
    }

    pub fn levels_until_rarity_increase(&self, env: &dyn BonusSource) -> u32 {
        levels_until_rarity_increase(self.level(env), self.definition.max_level)
    }

    pub fn next_level_cost(&self, env: &dyn BonusSource) -> FragmentBasket {
        cost_at(&self.definition, self.level(env))
    }

    /// Reward at the current level, or at `(0, 0)` while locked.
    pub fn reward(&self, env: &dyn BonusSource) -> TalismanReward {
        if self.unlocked(env) {
            TalismanReward::at(self.key, self.level(env), self.rarity(env))
        } else {
            TalismanReward::at(self.key, 0, 0)
        }
    }

    /// Bonus free levels this talisman gives each rune. `special` is the
    /// combined special multiplier, metaphysics effect included.
    pub fn rune_bonuses(&self, env: &dyn BonusSource, special: f64) -> RuneMap<f64> {
        if !self.unlocked(env) {
            return RuneMap::default();
        }
        let level = self.level(env) as f64;
        let scale = rarity_multiplier(self.rarity(env)) * level * special;
        RuneMap::from_fn(|rune| match rune {
            RuneKey::Antiquities => 0.0,
            _ => self.definition.rune_coefficients[rune] * self.modifiers.sign(rune) * scale,
        })
    }

    fn try_buy(&mut self, cap: u32, wallet: &mut Wallet) -> bool {
        if self.level >= cap {
            return false;
        }
        let cost = cost_at(&self.definition, self.level);
        if !wallet.fragments.covers(&cost) {
            return false;
        }
        wallet.debit_fragments(&cost);
        self.fragments_invested.credit(&cost);
        // Only the new purchase and any leftover need paying for; no full replay.
        self.surplus.credit(&cost);
        self.level = absorb_levels(&self.definition, &mut self.surplus, self.level, cap);
        true
    }

    /// Buy one level, all-or-nothing against the wallet's fragments.
    pub fn buy_level(&mut self, wallet: &mut Wallet, env: &dyn BonusSource) -> bool {
        self.refresh(env);
        let cap = self.cap;
        let bought = self.try_buy(cap, wallet);
        if bought {
            log::debug!("{}: bought level {}", self.key, self.level);
        }
        bought
    }

    /// Buy up to `max` levels, stopping at the first one not affordable.
    pub fn buy_levels(&mut self, max: u32, wallet: &mut Wallet, env: &dyn BonusSource) -> u32 {
        self.refresh(env);
        let cap = self.cap;
        let mut bought = 0;
        while bought < max.min(MAX_LEVELS_PER_CALL) && self.try_buy(cap, wallet) {
            bought += 1;
        }
        if bought > 0 {
            log::debug!("{}: bought {bought} level(s), now {}", self.key, self.level);
        }
        bought
    }

    pub fn buy_to_next_rarity(&mut self, wallet: &mut Wallet, env: &dyn BonusSource) -> u32 {
        let wanted = self.levels_until_rarity_increase(env);
        self.buy_levels(wanted, wallet, env)
    }

    pub fn buy_to_cap(&mut self, wallet: &mut Wallet, env: &dyn BonusSource) -> u32 {
        let wanted = self.effective_level_cap(env).saturating_sub(self.level(env));
        self.buy_levels(wanted, wallet, env)
    }

    /// Ledger this talisman would hold after buying `level` levels.
    pub fn ledger_for_level(&self, level: u32, cap: u32) -> FragmentBasket {
        ledger_for_level(&self.definition, level, cap)
    }

    pub fn set_modifiers(&mut self, modifiers: RuneModifiers) -> bool {
        if !modifiers.is_valid() {
            return false;
        }
        self.modifiers = modifiers;
        true
    }

    /// Clear the ledger and level.
    pub fn reset(&mut self) {
        self.fragments_invested = FragmentBasket::default();
        self.surplus = FragmentBasket::default();
        self.level = 0;
    }

    pub fn snapshot(&self, env: &dyn BonusSource, special: f64) -> TalismanSnapshot {
        let reward = self.reward(env);
        TalismanSnapshot {
            key: self.key,
            level: self.level(env),
            effective_level_cap: self.effective_level_cap(env),
            rarity: self.rarity(env),
            levels_until_rarity_increase: self.levels_until_rarity_increase(env),
            next_level_cost: self.next_level_cost(env),
            fragments_invested: self.fragments_invested,
            unlocked: self.unlocked(env),
            reward,
            rune_bonuses: self.rune_bonuses(env, special),
            modifiers: self.modifiers,
            description: reward.to_string(),
        }
    }
}

// ── Registry ────────────────────────────────────────────────────────────

/// All seven talismans, built once per session from persisted ledgers.
#[derive(Debug, Clone, PartialEq)]
pub struct TalismanRegistry {
    talismans: TalismanMap<Talisman>,
}

impl TalismanRegistry {
    pub fn new(
        ruleset: &Ruleset,
        ledger: &TalismanMap<FragmentBasket>,
        modifiers: Option<&TalismanMap<RuneModifiers>>,
        env: &dyn BonusSource,
    ) -> Self {
        Self {
            talismans: TalismanMap::from_fn(|key| {
                let definition = *ruleset.talisman(key);
                let signs = modifiers.map_or(definition.default_modifiers, |m| m[key]);
                Talisman::new(key, definition, ledger[key], signs, env)
            }),
        }
    }

    pub fn get(&self, key: TalismanKey) -> &Talisman {
        &self.talismans[key]
    }

    pub fn get_mut(&mut self, key: TalismanKey) -> &mut Talisman {
        &mut self.talismans[key]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Talisman> {
        TalismanKey::ALL.into_iter().map(move |k| &self.talismans[k])
    }

    pub fn refresh(&mut self, env: &dyn BonusSource) {
        for talisman in self.talismans.iter_mut() {
            talisman.refresh(env);
        }
    }

    /// External special multiplier plus the metaphysics talisman effect.
    /// Evaluated once; every talisman, metaphysics included, uses the result.
    pub fn special_multiplier(&self, env: &dyn BonusSource) -> f64 {
        let metaphysics = match self.talismans.metaphysics.reward(env) {
            TalismanReward::Metaphysics(r) => r.talisman_effect,
            _ => 0.0,
        };
        env.talisman_special_multiplier() + metaphysics
    }

    /// Total bonus free levels per rune across every talisman.
    pub fn rune_bonus_totals(&self, env: &dyn BonusSource) -> RuneMap<f64> {
        let special = self.special_multiplier(env);
        let mut totals = RuneMap::<f64>::default();
        for talisman in self.iter() {
            let bonuses = talisman.rune_bonuses(env, special);
            for rune in RuneKey::ALL {
                totals[rune] += bonuses[rune];
            }
        }
        totals
    }

    /// Levels-per-OOM increases granted to runes by talisman rewards.
    pub fn oom_bonuses(&self, env: &dyn BonusSource) -> RuneMap<f64> {
        let mut totals = RuneMap::<f64>::default();
        for talisman in self.iter() {
            if let Some((rune, bonus)) = talisman.reward(env).oom_bonus() {
                totals[rune] += bonus;
            }
        }
        totals
    }

    /// Run the auto-buyer once over every talisman. Returns levels bought.
    pub fn auto_buy(&mut self, wallet: &mut Wallet, env: &dyn BonusSource) -> u32 {
        let batch = env.talisman_auto_buy_batch();
        let mut total = 0;
        for talisman in self.talismans.iter_mut() {
            total += talisman.buy_levels(batch, wallet, env);
        }
        total
    }

    /// Swap one talisman's rune modifiers for `RESPEC_COST` offerings.
    pub fn respec(&mut self, key: TalismanKey, modifiers: RuneModifiers, wallet: &mut Wallet) -> bool {
        if !modifiers.is_valid() || wallet.offerings < RESPEC_COST {
            return false;
        }
        wallet.debit_offerings(RESPEC_COST);
        self.talismans[key].set_modifiers(modifiers)
    }

    /// Apply one modifier set to every talisman for `RESPEC_ALL_COST`.
    pub fn respec_all(&mut self, modifiers: RuneModifiers, wallet: &mut Wallet) -> bool {
        if !modifiers.is_valid() || wallet.offerings < RESPEC_ALL_COST {
            return false;
        }
        wallet.debit_offerings(RESPEC_ALL_COST);
        for talisman in self.talismans.iter_mut() {
            talisman.set_modifiers(modifiers);
        }
        true
    }

    /// Clear every ledger on a singularity; smaller resets keep talismans.
    pub fn reset_all(&mut self, tier: ResetTier) -> bool {
        if tier < ResetTier::Singularity {
            return false;
        }
        for talisman in self.talismans.iter_mut() {
            talisman.reset();
        }
        log::info!("{tier:?} reset cleared every talisman");
        true
    }

    pub fn snapshots(&self, env: &dyn BonusSource) -> Vec<TalismanSnapshot> {
        let special = self.special_multiplier(env);
        self.iter().map(|t| t.snapshot(env, special)).collect()
    }

    pub fn ledger(&self) -> TalismanMap<FragmentBasket> {
        self.talismans.map(|_, t| t.fragments_invested)
    }

    pub fn modifiers(&self) -> TalismanMap<RuneModifiers> {
        self.talismans.map(|_, t| t.modifiers)
    }
}
