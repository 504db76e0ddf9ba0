//! Save/load of the rune and talisman ledgers.
//!
//! Only the ledgers are persisted: rune experience and the fragments
//! invested in each talisman, plus each talisman's respec modifiers. Levels
//! are always re-derived on load. JSON is the human-readable form; bincode
//! is the compact binary form with the same structure.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decimal::Decimal;
use crate::keys::{FragmentBasket, RuneMap, TalismanMap};
use crate::ruleset::RuneModifiers;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Persisted state of both engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveLedger {
    pub version: u32,
    #[serde(default)]
    pub runes: RuneMap<Decimal>,
    #[serde(default)]
    pub talismans: TalismanMap<FragmentBasket>,
    /// Missing means the ruleset's default modifiers.
    #[serde(default)]
    pub modifiers: Option<TalismanMap<RuneModifiers>>,
}

impl Default for SaveLedger {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            runes: RuneMap::default(),
            talismans: TalismanMap::default(),
            modifiers: None,
        }
    }
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

fn check_version(ledger: SaveLedger) -> Result<SaveLedger, PersistenceError> {
    if ledger.version != SAVE_VERSION {
        return Err(PersistenceError::VersionMismatch {
            expected: SAVE_VERSION,
            found: ledger.version,
        });
    }
    Ok(ledger)
}

pub fn to_json(ledger: &SaveLedger) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(ledger)?)
}

pub fn from_json(json: &str) -> Result<SaveLedger, PersistenceError> {
    check_version(serde_json::from_str(json)?)
}

/// Write a binary save.
pub fn save<W: Write>(writer: W, ledger: &SaveLedger) -> Result<(), PersistenceError> {
    bincode::serialize_into(writer, ledger)?;
    Ok(())
}

/// Read a binary save.
pub fn load<R: Read>(reader: R) -> Result<SaveLedger, PersistenceError> {
    let ledger = check_version(bincode::deserialize_from(reader)?)?;
    log::info!("loaded save ledger v{}", ledger.version);
    Ok(ledger)
}
