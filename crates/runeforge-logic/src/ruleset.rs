//! Versioned formula and constant table.
//!
//! A [`Ruleset`] collects every tunable the engines read: rune cost curves,
//! talisman price multipliers and rune coefficients, fragment shop rates,
//! and the behavioural switches that changed between game versions
//! (challenge debuff, rune purchase iteration, TNL lookahead).
//!
//! [`Ruleset::default`] is the canonical `v4` table. Alternate tables load
//! from JSON and are checked by [`validate_ruleset`], which reports every
//! problem at once rather than stopping at the first.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::{
    FragmentKind, FragmentMap, ResetTier, RuneKey, RuneMap, TalismanKey, TalismanMap,
};

pub const CANONICAL_VERSION: &str = "v4";

/// Offerings charged to respec one talisman's rune modifiers.
pub const RESPEC_COST: f64 = 100_000.0;

/// Offerings charged to respec every talisman at once.
pub const RESPEC_ALL_COST: f64 = 400_000.0;

// ── Definitions ─────────────────────────────────────────────────────────

/// Static parameters of one rune.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuneDefinition {
    pub cost_coefficient: f64,
    pub levels_per_oom: f64,
    pub minimal_reset_tier: ResetTier,
}

/// Which cost progression a talisman uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CostCurve {
    /// Cubic per-currency growth with price tiers at 120/150/180.
    #[default]
    Regular,
    /// `1.12^level` growth.
    Exponential,
}

/// Signs applied to a talisman's bonus for each of the first five runes.
///
/// A valid set has three `+1` and two `-1`, in rune display order
/// (speed, duplication, prism, thrift, superiorIntellect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuneModifiers(pub [i8; 5]);

impl RuneModifiers {
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|&s| s == 1 || s == -1)
            && self.0.iter().map(|&s| s as i32).sum::<i32>() == 1
    }

    /// Sign for `rune`; runes outside the first five are unsigned.
    pub fn sign(&self, rune: RuneKey) -> f64 {
        match rune {
            RuneKey::Speed => self.0[0] as f64,
            RuneKey::Duplication => self.0[1] as f64,
            RuneKey::Prism => self.0[2] as f64,
            RuneKey::Thrift => self.0[3] as f64,
            RuneKey::SuperiorIntellect => self.0[4] as f64,
            RuneKey::InfiniteAscent | RuneKey::Antiquities => 1.0,
        }
    }
}

impl Default for RuneModifiers {
    fn default() -> Self {
        RuneModifiers([1, 1, 1, -1, -1])
    }
}

/// Static parameters of one talisman.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TalismanDefinition {
    pub base_mult: f64,
    pub max_level: u32,
    #[serde(default)]
    pub cost_curve: CostCurve,
    pub rune_coefficients: RuneMap<f64>,
    #[serde(default)]
    pub default_modifiers: RuneModifiers,
}

/// Price of one fragment in each shop currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FragmentRate {
    pub obtainium: f64,
    pub offerings: f64,
}

/// Effect of the designated reincarnation challenge on pre-singularity runes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChallengeDebuff {
    /// Effective level forced to 1.
    #[default]
    EffectiveLevelOne,
    /// Free levels and effective level forced to 0.
    ZeroLevels,
}

/// How `level_rune` walks toward the requested level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunePurchasePolicy {
    /// One closed-form step for all requested levels.
    #[default]
    Lump,
    /// One level at a time, re-reading the level-dependent rate each step.
    PerLevel,
}

// ── Ruleset ─────────────────────────────────────────────────────────────

/// Complete formula table for one game version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ruleset {
    pub version: String,
    pub runes: RuneMap<RuneDefinition>,
    pub talismans: TalismanMap<TalismanDefinition>,
    pub fragment_rates: FragmentMap<FragmentRate>,
    pub challenge_debuff: ChallengeDebuff,
    pub rune_purchase_policy: RunePurchasePolicy,
    /// Levels ahead of the current one used for "experience to next level".
    pub tnl_lookahead: u32,
    /// Offering requirements above this are treated as unaffordable.
    pub offering_ceiling: f64,
}

fn rune(cost_coefficient: f64, levels_per_oom: f64, minimal_reset_tier: ResetTier) -> RuneDefinition {
    RuneDefinition {
        cost_coefficient,
        levels_per_oom,
        minimal_reset_tier,
    }
}

fn talisman(
    base_mult: f64,
    cost_curve: CostCurve,
    first_five: f64,
    infinite_ascent: f64,
    signs: [i8; 5],
) -> TalismanDefinition {
    TalismanDefinition {
        base_mult,
        max_level: 180,
        cost_curve,
        rune_coefficients: RuneMap::from_fn(|k| match k {
            RuneKey::InfiniteAscent => infinite_ascent,
            RuneKey::Antiquities => 0.0,
            _ => first_five,
        }),
        default_modifiers: RuneModifiers(signs),
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        use CostCurve::{Exponential, Regular};
        use ResetTier::{Ascension, Singularity};

        let rate = |obtainium, offerings| FragmentRate {
            obtainium,
            offerings,
        };

        Self {
            version: CANONICAL_VERSION.to_string(),
            runes: RuneMap {
                speed: rune(500.0, 150.0, Ascension),
                duplication: rune(5e3, 150.0, Ascension),
                prism: rune(2.5e4, 150.0, Ascension),
                thrift: rune(2.5e5, 150.0, Ascension),
                superior_intellect: rune(2.5e7, 150.0, Ascension),
                infinite_ascent: rune(1e75, 0.5, Singularity),
                antiquities: rune(1e206, 1.0 / 50.0, Singularity),
            },
            talismans: TalismanMap {
                exemption: talisman(1.0, Regular, 0.75, 0.0, [1, 1, -1, 1, -1]),
                chronos: talisman(4.0, Regular, 0.75, 0.0, [1, -1, 1, 1, -1]),
                midas: talisman(1e4, Regular, 0.75, 0.0, [-1, 1, 1, 1, -1]),
                metaphysics: talisman(1e8, Regular, 0.6, 0.0, [1, 1, 1, -1, -1]),
                polymath: talisman(1e13, Regular, 0.75, 0.0, [-1, 1, 1, -1, 1]),
                mortuus: talisman(10.0, Regular, 0.75, 0.0, [1, -1, 1, -1, 1]),
                plastic: talisman(1.0, Exponential, 0.75, 0.01, [1, 1, -1, -1, 1]),
            },
            fragment_rates: FragmentMap {
                shard: rate(1e13, 1e2),
                common_fragment: rate(1e14, 1e4),
                uncommon_fragment: rate(1e16, 1e5),
                rare_fragment: rate(1e18, 1e6),
                epic_fragment: rate(1e20, 1e7),
                legendary_fragment: rate(1e22, 1e8),
                mythical_fragment: rate(1e24, 1e9),
            },
            challenge_debuff: ChallengeDebuff::EffectiveLevelOne,
            rune_purchase_policy: RunePurchasePolicy::Lump,
            tnl_lookahead: 1,
            offering_ceiling: 1e300,
        }
    }
}

// ── Validation ──────────────────────────────────────────────────────────

/// A single problem found by [`validate_ruleset`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RulesetIssue {
    #[error("rune {0}: cost coefficient must be positive, got {1}")]
    NonPositiveCostCoefficient(RuneKey, f64),
    #[error("rune {0}: levels per OOM must be positive, got {1}")]
    NonPositiveLevelsPerOom(RuneKey, f64),
    #[error("talisman {0}: base multiplier must be positive, got {1}")]
    NonPositiveBaseMult(TalismanKey, f64),
    #[error("talisman {0}: max level must be at least 1")]
    ZeroMaxLevel(TalismanKey),
    #[error("talisman {0}: rune coefficient for {1} is negative")]
    NegativeRuneCoefficient(TalismanKey, RuneKey),
    #[error("talisman {0}: default modifiers need three +1 and two -1")]
    InvalidDefaultModifiers(TalismanKey),
    #[error("fragment {0}: exchange rates must be positive")]
    NonPositiveFragmentRate(FragmentKind),
    #[error("TNL lookahead must be at least 1")]
    ZeroLookahead,
    #[error("offering ceiling must be positive and finite, got {0}")]
    InvalidOfferingCeiling(f64),
}

/// Check a ruleset and return every issue found. Empty means valid.
pub fn validate_ruleset(ruleset: &Ruleset) -> Vec<RulesetIssue> {
    let mut issues = Vec::new();

    for (key, def) in ruleset.runes.iter() {
        if !(def.cost_coefficient > 0.0 && def.cost_coefficient.is_finite()) {
            issues.push(RulesetIssue::NonPositiveCostCoefficient(key, def.cost_coefficient));
        }
        if !(def.levels_per_oom > 0.0 && def.levels_per_oom.is_finite()) {
            issues.push(RulesetIssue::NonPositiveLevelsPerOom(key, def.levels_per_oom));
        }
    }

    for (key, def) in ruleset.talismans.iter() {
        if !(def.base_mult > 0.0 && def.base_mult.is_finite()) {
            issues.push(RulesetIssue::NonPositiveBaseMult(key, def.base_mult));
        }
        if def.max_level == 0 {
            issues.push(RulesetIssue::ZeroMaxLevel(key));
        }
        for (rune, &coefficient) in def.rune_coefficients.iter() {
            if coefficient < 0.0 {
                issues.push(RulesetIssue::NegativeRuneCoefficient(key, rune));
            }
        }
        if !def.default_modifiers.is_valid() {
            issues.push(RulesetIssue::InvalidDefaultModifiers(key));
        }
    }

    for (kind, rate) in ruleset.fragment_rates.iter() {
        if !(rate.obtainium > 0.0 && rate.offerings > 0.0) {
            issues.push(RulesetIssue::NonPositiveFragmentRate(kind));
        }
    }

    if ruleset.tnl_lookahead == 0 {
        issues.push(RulesetIssue::ZeroLookahead);
    }
    if !(ruleset.offering_ceiling > 0.0 && ruleset.offering_ceiling.is_finite()) {
        issues.push(RulesetIssue::InvalidOfferingCeiling(ruleset.offering_ceiling));
    }

    issues
}

/// Failure to load a ruleset.
#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("failed to read ruleset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse ruleset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("ruleset has {} issue(s): {}", .0.len(), join_issues(.0))]
    Invalid(Vec<RulesetIssue>),
}

fn join_issues(issues: &[RulesetIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Ruleset {
    /// Parse, coerce, and validate a JSON ruleset. Fields not present in the
    /// JSON keep their canonical values.
    pub fn from_json(json: &str) -> Result<Self, RulesetError> {
        let mut ruleset: Ruleset = serde_json::from_str(json)?;
        ruleset.coerce();
        let issues = validate_ruleset(&ruleset);
        if !issues.is_empty() {
            return Err(RulesetError::Invalid(issues));
        }
        log::info!("loaded ruleset {}", ruleset.version);
        Ok(ruleset)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RulesetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, RulesetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Force values the engines cannot honour back to what they support.
    fn coerce(&mut self) {
        for key in TalismanKey::ALL {
            let coefficient = &mut self.talismans[key].rune_coefficients.antiquities;
            if *coefficient != 0.0 {
                log::warn!(
                    "talisman {key}: antiquities coefficient {coefficient} ignored; talismans never boost antiquities"
                );
                *coefficient = 0.0;
            }
        }
    }

    pub fn rune(&self, key: RuneKey) -> &RuneDefinition {
        &self.runes[key]
    }

    pub fn talisman(&self, key: TalismanKey) -> &TalismanDefinition {
        &self.talismans[key]
    }

    pub fn fragment_rate(&self, kind: FragmentKind) -> &FragmentRate {
        &self.fragment_rates[kind]
    }
}
