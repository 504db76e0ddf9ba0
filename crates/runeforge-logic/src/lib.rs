//! Pure progression logic for Runeforge.
//!
//! This crate contains the rune and talisman economy independent of any UI,
//! timer, or storage backend. Engines take plain data (a wallet, a bonus
//! source, persisted ledgers) and return results, so every rule is
//! unit-testable and the same code drives both the game and the headless
//! harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`bonuses`] | `BonusSource` trait, canonical formulas over game progress |
//! | [`decimal`] | Mantissa/exponent numbers for values beyond `f64` range |
//! | [`fragments`] | Fragment shop: obtainium and offerings for talisman currencies |
//! | [`keys`] | Closed catalogs (runes, talismans, fragments, reset tiers) |
//! | [`persistence`] | Save ledger, JSON and bincode save/load |
//! | [`progress`] | Read-only snapshot of external game counters |
//! | [`ruleset`] | Versioned formula tables, JSON loading and validation |
//! | [`runes`] | Rune engine: experience, derived levels, purchases, rewards |
//! | [`session`] | Session lifecycle and talisman → rune bonus wiring |
//! | [`talismans`] | Talisman engine: fragment ledgers, rarity, rune bonuses |
//! | [`wallet`] | Currency pools with clamp-at-zero debits |

pub mod bonuses;
pub mod decimal;
pub mod fragments;
pub mod keys;
pub mod persistence;
pub mod progress;
pub mod ruleset;
pub mod runes;
pub mod session;
pub mod talismans;
pub mod wallet;
