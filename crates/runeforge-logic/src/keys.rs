//! Closed catalogs: rune keys, talisman keys, fragment kinds, reset tiers.
//!
//! Every catalog is fixed at compile time, so lookups are infallible once a
//! key is typed. The only place an unknown key can appear is when parsing a
//! name (save files, CLI input), which returns a [`KeyError`].
//!
//! The `*Map<T>` types hold exactly one value per key. They serialize as
//! objects keyed by the camelCase key name, which is the canonical
//! persisted ledger shape:
//!
//! ```
//! use runeforge_logic::keys::{RuneKey, RuneMap};
//!
//! let mut exp: RuneMap<f64> = RuneMap::default();
//! exp[RuneKey::SuperiorIntellect] = 12.5;
//! let json = serde_json::to_string(&exp).unwrap();
//! assert!(json.contains("\"superiorIntellect\":12.5"));
//! ```

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A key name outside the closed catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("unknown rune `{0}`")]
    UnknownRune(String),
    #[error("unknown talisman `{0}`")]
    UnknownTalisman(String),
    #[error("unknown fragment kind `{0}`")]
    UnknownFragment(String),
}

// ── Reset tiers ─────────────────────────────────────────────────────────

/// Game reset events, ordered from smallest to largest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ResetTier {
    Prestige = 1,
    Transcension = 2,
    Reincarnation = 3,
    #[default]
    Ascension = 4,
    Singularity = 5,
}

impl ResetTier {
    pub const ALL: [ResetTier; 5] = [
        ResetTier::Prestige,
        ResetTier::Transcension,
        ResetTier::Reincarnation,
        ResetTier::Ascension,
        ResetTier::Singularity,
    ];

    /// Ordinal used by the reset gates (prestige = 1 … singularity = 5).
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

// ── Runes ───────────────────────────────────────────────────────────────

/// The seven runes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuneKey {
    Speed,
    Duplication,
    Prism,
    Thrift,
    SuperiorIntellect,
    InfiniteAscent,
    Antiquities,
}

impl RuneKey {
    /// All runes in display order.
    pub const ALL: [RuneKey; 7] = [
        RuneKey::Speed,
        RuneKey::Duplication,
        RuneKey::Prism,
        RuneKey::Thrift,
        RuneKey::SuperiorIntellect,
        RuneKey::InfiniteAscent,
        RuneKey::Antiquities,
    ];

    /// The first five runes that share free-level and multiplier sources.
    pub fn is_first_five(self) -> bool {
        !matches!(self, RuneKey::InfiniteAscent | RuneKey::Antiquities)
    }

    pub fn name(self) -> &'static str {
        match self {
            RuneKey::Speed => "speed",
            RuneKey::Duplication => "duplication",
            RuneKey::Prism => "prism",
            RuneKey::Thrift => "thrift",
            RuneKey::SuperiorIntellect => "superiorIntellect",
            RuneKey::InfiniteAscent => "infiniteAscent",
            RuneKey::Antiquities => "antiquities",
        }
    }
}

impl fmt::Display for RuneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuneKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuneKey::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| KeyError::UnknownRune(s.to_string()))
    }
}

/// One value per rune.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    deny_unknown_fields,
    default,
    bound(deserialize = "T: Deserialize<'de> + Default")
)]
pub struct RuneMap<T> {
    pub speed: T,
    pub duplication: T,
    pub prism: T,
    pub thrift: T,
    pub superior_intellect: T,
    pub infinite_ascent: T,
    pub antiquities: T,
}

impl<T> RuneMap<T> {
    pub fn from_fn(mut f: impl FnMut(RuneKey) -> T) -> Self {
        Self {
            speed: f(RuneKey::Speed),
            duplication: f(RuneKey::Duplication),
            prism: f(RuneKey::Prism),
            thrift: f(RuneKey::Thrift),
            superior_intellect: f(RuneKey::SuperiorIntellect),
            infinite_ascent: f(RuneKey::InfiniteAscent),
            antiquities: f(RuneKey::Antiquities),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuneKey, &T)> {
        RuneKey::ALL.into_iter().map(move |k| (k, &self[k]))
    }

    pub fn map<U>(&self, mut f: impl FnMut(RuneKey, &T) -> U) -> RuneMap<U> {
        RuneMap::from_fn(|k| f(k, &self[k]))
    }
}

impl<T> Index<RuneKey> for RuneMap<T> {
    type Output = T;

    fn index(&self, key: RuneKey) -> &T {
        match key {
            RuneKey::Speed => &self.speed,
            RuneKey::Duplication => &self.duplication,
            RuneKey::Prism => &self.prism,
            RuneKey::Thrift => &self.thrift,
            RuneKey::SuperiorIntellect => &self.superior_intellect,
            RuneKey::InfiniteAscent => &self.infinite_ascent,
            RuneKey::Antiquities => &self.antiquities,
        }
    }
}

impl<T> IndexMut<RuneKey> for RuneMap<T> {
    fn index_mut(&mut self, key: RuneKey) -> &mut T {
        match key {
            RuneKey::Speed => &mut self.speed,
            RuneKey::Duplication => &mut self.duplication,
            RuneKey::Prism => &mut self.prism,
            RuneKey::Thrift => &mut self.thrift,
            RuneKey::SuperiorIntellect => &mut self.superior_intellect,
            RuneKey::InfiniteAscent => &mut self.infinite_ascent,
            RuneKey::Antiquities => &mut self.antiquities,
        }
    }
}

// ── Talismans ───────────────────────────────────────────────────────────

/// The seven talismans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TalismanKey {
    Exemption,
    Chronos,
    Midas,
    Metaphysics,
    Polymath,
    Mortuus,
    Plastic,
}

impl TalismanKey {
    pub const ALL: [TalismanKey; 7] = [
        TalismanKey::Exemption,
        TalismanKey::Chronos,
        TalismanKey::Midas,
        TalismanKey::Metaphysics,
        TalismanKey::Polymath,
        TalismanKey::Mortuus,
        TalismanKey::Plastic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TalismanKey::Exemption => "exemption",
            TalismanKey::Chronos => "chronos",
            TalismanKey::Midas => "midas",
            TalismanKey::Metaphysics => "metaphysics",
            TalismanKey::Polymath => "polymath",
            TalismanKey::Mortuus => "mortuus",
            TalismanKey::Plastic => "plastic",
        }
    }
}

impl fmt::Display for TalismanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TalismanKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TalismanKey::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| KeyError::UnknownTalisman(s.to_string()))
    }
}

/// One value per talisman.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    deny_unknown_fields,
    default,
    bound(deserialize = "T: Deserialize<'de> + Default")
)]
pub struct TalismanMap<T> {
    pub exemption: T,
    pub chronos: T,
    pub midas: T,
    pub metaphysics: T,
    pub polymath: T,
    pub mortuus: T,
    pub plastic: T,
}

impl<T> TalismanMap<T> {
    pub fn from_fn(mut f: impl FnMut(TalismanKey) -> T) -> Self {
        Self {
            exemption: f(TalismanKey::Exemption),
            chronos: f(TalismanKey::Chronos),
            midas: f(TalismanKey::Midas),
            metaphysics: f(TalismanKey::Metaphysics),
            polymath: f(TalismanKey::Polymath),
            mortuus: f(TalismanKey::Mortuus),
            plastic: f(TalismanKey::Plastic),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TalismanKey, &T)> {
        TalismanKey::ALL.into_iter().map(move |k| (k, &self[k]))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        [
            &mut self.exemption,
            &mut self.chronos,
            &mut self.midas,
            &mut self.metaphysics,
            &mut self.polymath,
            &mut self.mortuus,
            &mut self.plastic,
        ]
        .into_iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(TalismanKey, &T) -> U) -> TalismanMap<U> {
        TalismanMap::from_fn(|k| f(k, &self[k]))
    }
}

impl<T> Index<TalismanKey> for TalismanMap<T> {
    type Output = T;

    fn index(&self, key: TalismanKey) -> &T {
        match key {
            TalismanKey::Exemption => &self.exemption,
            TalismanKey::Chronos => &self.chronos,
            TalismanKey::Midas => &self.midas,
            TalismanKey::Metaphysics => &self.metaphysics,
            TalismanKey::Polymath => &self.polymath,
            TalismanKey::Mortuus => &self.mortuus,
            TalismanKey::Plastic => &self.plastic,
        }
    }
}

impl<T> IndexMut<TalismanKey> for TalismanMap<T> {
    fn index_mut(&mut self, key: TalismanKey) -> &mut T {
        match key {
            TalismanKey::Exemption => &mut self.exemption,
            TalismanKey::Chronos => &mut self.chronos,
            TalismanKey::Midas => &mut self.midas,
            TalismanKey::Metaphysics => &mut self.metaphysics,
            TalismanKey::Polymath => &mut self.polymath,
            TalismanKey::Mortuus => &mut self.mortuus,
            TalismanKey::Plastic => &mut self.plastic,
        }
    }
}

// ── Fragments ───────────────────────────────────────────────────────────

/// The seven talisman currencies, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentKind {
    Shard,
    CommonFragment,
    UncommonFragment,
    RareFragment,
    EpicFragment,
    LegendaryFragment,
    MythicalFragment,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 7] = [
        FragmentKind::Shard,
        FragmentKind::CommonFragment,
        FragmentKind::UncommonFragment,
        FragmentKind::RareFragment,
        FragmentKind::EpicFragment,
        FragmentKind::LegendaryFragment,
        FragmentKind::MythicalFragment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FragmentKind::Shard => "shard",
            FragmentKind::CommonFragment => "commonFragment",
            FragmentKind::UncommonFragment => "uncommonFragment",
            FragmentKind::RareFragment => "rareFragment",
            FragmentKind::EpicFragment => "epicFragment",
            FragmentKind::LegendaryFragment => "legendaryFragment",
            FragmentKind::MythicalFragment => "mythicalFragment",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FragmentKind {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FragmentKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| KeyError::UnknownFragment(s.to_string()))
    }
}

/// One value per fragment kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    deny_unknown_fields,
    default,
    bound(deserialize = "T: Deserialize<'de> + Default")
)]
pub struct FragmentMap<T> {
    pub shard: T,
    pub common_fragment: T,
    pub uncommon_fragment: T,
    pub rare_fragment: T,
    pub epic_fragment: T,
    pub legendary_fragment: T,
    pub mythical_fragment: T,
}

/// A 7-currency amount: a wallet's fragment pools, a cost vector, or a
/// talisman's investment ledger.
pub type FragmentBasket = FragmentMap<f64>;

impl<T> FragmentMap<T> {
    pub fn from_fn(mut f: impl FnMut(FragmentKind) -> T) -> Self {
        Self {
            shard: f(FragmentKind::Shard),
            common_fragment: f(FragmentKind::CommonFragment),
            uncommon_fragment: f(FragmentKind::UncommonFragment),
            rare_fragment: f(FragmentKind::RareFragment),
            epic_fragment: f(FragmentKind::EpicFragment),
            legendary_fragment: f(FragmentKind::LegendaryFragment),
            mythical_fragment: f(FragmentKind::MythicalFragment),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FragmentKind, &T)> {
        FragmentKind::ALL.into_iter().map(move |k| (k, &self[k]))
    }
}

impl FragmentMap<f64> {
    /// Whether every amount in `cost` is covered by `self`.
    pub fn covers(&self, cost: &FragmentBasket) -> bool {
        FragmentKind::ALL.iter().all(|&k| cost[k] <= self[k])
    }

    /// Add every amount of `other` into `self`.
    pub fn credit(&mut self, other: &FragmentBasket) {
        for k in FragmentKind::ALL {
            self[k] += other[k];
        }
    }

    pub fn is_empty(&self) -> bool {
        FragmentKind::ALL.iter().all(|&k| self[k] == 0.0)
    }
}

impl<T> Index<FragmentKind> for FragmentMap<T> {
    type Output = T;

    fn index(&self, key: FragmentKind) -> &T {
        match key {
            FragmentKind::Shard => &self.shard,
            FragmentKind::CommonFragment => &self.common_fragment,
            FragmentKind::UncommonFragment => &self.uncommon_fragment,
            FragmentKind::RareFragment => &self.rare_fragment,
            FragmentKind::EpicFragment => &self.epic_fragment,
            FragmentKind::LegendaryFragment => &self.legendary_fragment,
            FragmentKind::MythicalFragment => &self.mythical_fragment,
        }
    }
}

impl<T> IndexMut<FragmentKind> for FragmentMap<T> {
    fn index_mut(&mut self, key: FragmentKind) -> &mut T {
        match key {
            FragmentKind::Shard => &mut self.shard,
            FragmentKind::CommonFragment => &mut self.common_fragment,
            FragmentKind::UncommonFragment => &mut self.uncommon_fragment,
            FragmentKind::RareFragment => &mut self.rare_fragment,
            FragmentKind::EpicFragment => &mut self.epic_fragment,
            FragmentKind::LegendaryFragment => &mut self.legendary_fragment,
            FragmentKind::MythicalFragment => &mut self.mythical_fragment,
        }
    }
}
