//! Session lifecycle and the talisman → rune bonus wiring.
//!
//! A [`Session`] is the explicit context handle for one game session. It
//! owns the active [`Ruleset`] and one registry per engine, built once from
//! the persisted ledgers and mutated in place afterwards.
//!
//! Rune operations read talisman contributions (bonus free levels and
//! levels-per-OOM increases), so they need both registries. Each operation
//! computes those contributions once and hands the rune engine a
//! [`TalismanAugmented`] view of the caller's bonus source.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::bonuses::BonusSource;
use crate::decimal::Decimal;
use crate::fragments::{self, FragmentQuote};
use crate::keys::{
    FragmentBasket, FragmentKind, ResetTier, RuneKey, RuneMap, TalismanKey, TalismanMap,
};
use crate::persistence::{SaveLedger, SAVE_VERSION};
use crate::ruleset::{RuneModifiers, Ruleset};
use crate::runes::{RunePurchase, RuneRegistry, RuneSnapshot};
use crate::talismans::{TalismanRegistry, TalismanSnapshot};
use crate::wallet::Wallet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Runes,
    Talismans,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Runes => f.write_str("rune"),
            Engine::Talismans => f.write_str("talisman"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0} registry used before initialization")]
    NotInitialized(Engine),
}

// ── Talisman-augmented bonus source ─────────────────────────────────────

/// A bonus source with talisman rune bonuses added to free levels and
/// talisman OOM bonuses added to levels-per-OOM. Everything else passes
/// through unchanged.
pub struct TalismanAugmented<'e> {
    base: &'e dyn BonusSource,
    free_levels: RuneMap<f64>,
    oom_bonus: RuneMap<f64>,
}

impl<'e> TalismanAugmented<'e> {
    pub fn new(talismans: &TalismanRegistry, base: &'e dyn BonusSource) -> Self {
        Self {
            base,
            free_levels: talismans.rune_bonus_totals(base),
            oom_bonus: talismans.oom_bonuses(base),
        }
    }

    /// Talisman bonus free levels per rune.
    pub fn talisman_free_levels(&self) -> &RuneMap<f64> {
        &self.free_levels
    }

    pub fn talisman_oom_bonus(&self) -> &RuneMap<f64> {
        &self.oom_bonus
    }
}

impl BonusSource for TalismanAugmented<'_> {
    fn levels_per_oom_increase(&self, rune: RuneKey) -> f64 {
        self.base.levels_per_oom_increase(rune) + self.oom_bonus[rune]
    }

    fn free_rune_levels(&self, rune: RuneKey) -> f64 {
        self.base.free_rune_levels(rune) + self.free_levels[rune]
    }

    fn effective_level_multiplier(&self, rune: RuneKey) -> f64 {
        self.base.effective_level_multiplier(rune)
    }

    fn experience_per_offering(&self, rune: RuneKey, purchased_levels: u64) -> Decimal {
        self.base.experience_per_offering(rune, purchased_levels)
    }

    fn rune_unlocked(&self, rune: RuneKey) -> bool {
        self.base.rune_unlocked(rune)
    }

    fn reincarnation_challenge_active(&self, challenge: u32) -> bool {
        self.base.reincarnation_challenge_active(challenge)
    }

    fn talisman_unlocked(&self, talisman: TalismanKey) -> bool {
        self.base.talisman_unlocked(talisman)
    }

    fn talisman_level_cap_increase(&self, talisman: TalismanKey) -> u32 {
        self.base.talisman_level_cap_increase(talisman)
    }

    fn talisman_special_multiplier(&self) -> f64 {
        self.base.talisman_special_multiplier()
    }

    fn sacrifice_levels(&self, auto: bool) -> u32 {
        self.base.sacrifice_levels(auto)
    }

    fn talisman_auto_buy_batch(&self) -> u32 {
        self.base.talisman_auto_buy_batch()
    }
}

// ── Session ─────────────────────────────────────────────────────────────

/// What a reset cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub tier: ResetTier,
    pub runes_reset: usize,
    pub talismans_reset: bool,
}

pub struct Session {
    ruleset: Ruleset,
    runes: Option<RuneRegistry>,
    talismans: Option<TalismanRegistry>,
}

impl Session {
    /// A session with neither engine initialized.
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset,
            runes: None,
            talismans: None,
        }
    }

    /// Build both engines from a loaded save.
    pub fn from_save(ruleset: Ruleset, save: &SaveLedger, env: &dyn BonusSource) -> Self {
        let mut session = Self::new(ruleset);
        session.init_runes(&save.runes);
        session.init_talismans(&save.talismans, save.modifiers.as_ref(), env);
        session
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn init_runes(&mut self, ledger: &RuneMap<Decimal>) {
        self.runes = Some(RuneRegistry::new(&self.ruleset, ledger));
        log::info!("rune registry initialized (ruleset {})", self.ruleset.version);
    }

    pub fn init_talismans(
        &mut self,
        ledger: &TalismanMap<FragmentBasket>,
        modifiers: Option<&TalismanMap<RuneModifiers>>,
        env: &dyn BonusSource,
    ) {
        self.talismans = Some(TalismanRegistry::new(&self.ruleset, ledger, modifiers, env));
        log::info!("talisman registry initialized (ruleset {})", self.ruleset.version);
    }

    pub fn is_initialized(&self) -> bool {
        self.runes.is_some() && self.talismans.is_some()
    }

    pub fn runes(&self) -> Result<&RuneRegistry, SessionError> {
        self.runes
            .as_ref()
            .ok_or(SessionError::NotInitialized(Engine::Runes))
    }

    pub fn talismans(&self) -> Result<&TalismanRegistry, SessionError> {
        self.talismans
            .as_ref()
            .ok_or(SessionError::NotInitialized(Engine::Talismans))
    }

    fn talismans_mut(&mut self) -> Result<&mut TalismanRegistry, SessionError> {
        self.talismans
            .as_mut()
            .ok_or(SessionError::NotInitialized(Engine::Talismans))
    }

    /// Both registries, runes mutable, for rune operations.
    fn rune_parts(
        &mut self,
    ) -> Result<(&mut RuneRegistry, &mut TalismanRegistry), SessionError> {
        let runes = self
            .runes
            .as_mut()
            .ok_or(SessionError::NotInitialized(Engine::Runes))?;
        let talismans = self
            .talismans
            .as_mut()
            .ok_or(SessionError::NotInitialized(Engine::Talismans))?;
        Ok((runes, talismans))
    }

    /// The caller's bonus source with talisman contributions folded in.
    pub fn rune_env<'e>(
        &mut self,
        env: &'e dyn BonusSource,
    ) -> Result<TalismanAugmented<'e>, SessionError> {
        let talismans = self.talismans_mut()?;
        talismans.refresh(env);
        Ok(TalismanAugmented::new(talismans, env))
    }

    // ── Rune operations ──

    pub fn level_rune(
        &mut self,
        key: RuneKey,
        levels: u32,
        budget: f64,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> Result<RunePurchase, SessionError> {
        let (runes, talismans) = self.rune_parts()?;
        talismans.refresh(env);
        let augmented = TalismanAugmented::new(talismans, env);
        Ok(runes.get_mut(key).level_rune(levels, budget, wallet, &augmented))
    }

    pub fn sacrifice_offerings(
        &mut self,
        key: RuneKey,
        budget: f64,
        auto: bool,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> Result<Option<RunePurchase>, SessionError> {
        let (runes, talismans) = self.rune_parts()?;
        talismans.refresh(env);
        let augmented = TalismanAugmented::new(talismans, env);
        Ok(runes.sacrifice_offerings(key, budget, auto, wallet, &augmented))
    }

    /// Convert offerings to experience without touching any wallet
    /// (offerings granted by other systems).
    pub fn add_rune_experience(
        &mut self,
        key: RuneKey,
        offerings: Decimal,
        env: &dyn BonusSource,
    ) -> Result<(), SessionError> {
        let (runes, talismans) = self.rune_parts()?;
        talismans.refresh(env);
        let augmented = TalismanAugmented::new(talismans, env);
        runes.get_mut(key).add_experience(offerings, &augmented);
        Ok(())
    }

    pub fn rune_level(&mut self, key: RuneKey, env: &dyn BonusSource) -> Result<u64, SessionError> {
        let augmented = self.rune_env(env)?;
        Ok(self.runes()?.get(key).level(&augmented))
    }

    pub fn offerings_to_level(
        &mut self,
        key: RuneKey,
        target: u64,
        env: &dyn BonusSource,
    ) -> Result<Decimal, SessionError> {
        let augmented = self.rune_env(env)?;
        Ok(self.runes()?.get(key).offerings_to_level(target, &augmented))
    }

    pub fn sum_of_rune_levels(&mut self, env: &dyn BonusSource) -> Result<f64, SessionError> {
        let augmented = self.rune_env(env)?;
        Ok(self.runes()?.sum_of_levels(&augmented))
    }

    pub fn unlocked_rune_count(&mut self, env: &dyn BonusSource) -> Result<usize, SessionError> {
        let augmented = self.rune_env(env)?;
        Ok(self.runes()?.unlocked_count(&augmented))
    }

    pub fn rune_snapshot(
        &mut self,
        key: RuneKey,
        env: &dyn BonusSource,
    ) -> Result<RuneSnapshot, SessionError> {
        let augmented = self.rune_env(env)?;
        Ok(self.runes()?.get(key).snapshot(&augmented))
    }

    pub fn rune_snapshots(&mut self, env: &dyn BonusSource) -> Result<Vec<RuneSnapshot>, SessionError> {
        let augmented = self.rune_env(env)?;
        Ok(self.runes()?.snapshots(&augmented))
    }

    // ── Talisman operations ──

    pub fn buy_talisman_level(
        &mut self,
        key: TalismanKey,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> Result<bool, SessionError> {
        Ok(self.talismans_mut()?.get_mut(key).buy_level(wallet, env))
    }

    pub fn buy_talisman_levels(
        &mut self,
        key: TalismanKey,
        max: u32,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> Result<u32, SessionError> {
        Ok(self.talismans_mut()?.get_mut(key).buy_levels(max, wallet, env))
    }

    pub fn buy_talisman_to_next_rarity(
        &mut self,
        key: TalismanKey,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> Result<u32, SessionError> {
        Ok(self.talismans_mut()?.get_mut(key).buy_to_next_rarity(wallet, env))
    }

    pub fn buy_talisman_to_cap(
        &mut self,
        key: TalismanKey,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> Result<u32, SessionError> {
        Ok(self.talismans_mut()?.get_mut(key).buy_to_cap(wallet, env))
    }

    pub fn auto_buy_talismans(
        &mut self,
        wallet: &mut Wallet,
        env: &dyn BonusSource,
    ) -> Result<u32, SessionError> {
        Ok(self.talismans_mut()?.auto_buy(wallet, env))
    }

    pub fn respec_talisman(
        &mut self,
        key: TalismanKey,
        modifiers: RuneModifiers,
        wallet: &mut Wallet,
    ) -> Result<bool, SessionError> {
        Ok(self.talismans_mut()?.respec(key, modifiers, wallet))
    }

    pub fn respec_all_talismans(
        &mut self,
        modifiers: RuneModifiers,
        wallet: &mut Wallet,
    ) -> Result<bool, SessionError> {
        Ok(self.talismans_mut()?.respec_all(modifiers, wallet))
    }

    pub fn talisman_snapshot(
        &mut self,
        key: TalismanKey,
        env: &dyn BonusSource,
    ) -> Result<TalismanSnapshot, SessionError> {
        let talismans = self.talismans_mut()?;
        talismans.refresh(env);
        let special = talismans.special_multiplier(env);
        Ok(talismans.get(key).snapshot(env, special))
    }

    pub fn talisman_snapshots(
        &mut self,
        env: &dyn BonusSource,
    ) -> Result<Vec<TalismanSnapshot>, SessionError> {
        let talismans = self.talismans_mut()?;
        talismans.refresh(env);
        Ok(talismans.snapshots(env))
    }

    // ── Fragment shop ──

    pub fn quote_fragments(&self, kind: FragmentKind, percentage: f64, wallet: &Wallet) -> FragmentQuote {
        fragments::quote(&self.ruleset, kind, percentage, wallet)
    }

    pub fn buy_fragments(&self, kind: FragmentKind, percentage: f64, wallet: &mut Wallet) -> f64 {
        fragments::buy(&self.ruleset, kind, percentage, wallet)
    }

    pub fn buy_all_fragments(&self, percentage: f64, wallet: &mut Wallet) -> FragmentBasket {
        fragments::buy_all(&self.ruleset, percentage, wallet)
    }

    // ── Lifecycle ──

    /// Apply a game reset to both engines.
    pub fn reset(&mut self, tier: ResetTier) -> Result<ResetSummary, SessionError> {
        let (runes, talismans) = self.rune_parts()?;
        let runes_reset = runes.reset_all(tier);
        let talismans_reset = talismans.reset_all(tier);
        Ok(ResetSummary {
            tier,
            runes_reset,
            talismans_reset,
        })
    }

    /// Persisted form of both engines.
    pub fn to_save(&self) -> Result<SaveLedger, SessionError> {
        let talismans = self.talismans()?;
        Ok(SaveLedger {
            version: SAVE_VERSION,
            runes: self.runes()?.ledger(),
            talismans: talismans.ledger(),
            modifiers: Some(talismans.modifiers()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonuses::FlatBonuses;
    use crate::talismans::ledger_for_level;

    fn fresh_session(env: &dyn BonusSource) -> Session {
        Session::from_save(Ruleset::default(), &SaveLedger::default(), env)
    }

    #[test]
    fn uninitialized_registries_fail_fast() {
        let env = FlatBonuses::default();
        let mut session = Session::new(Ruleset::default());
        let mut wallet = Wallet::new(100.0, 0.0);
        assert_eq!(
            session.runes().unwrap_err(),
            SessionError::NotInitialized(Engine::Runes)
        );
        assert_eq!(
            session
                .buy_talisman_level(TalismanKey::Chronos, &mut wallet, &env)
                .unwrap_err(),
            SessionError::NotInitialized(Engine::Talismans)
        );

        session.init_runes(&RuneMap::default());
        // runes alone are not enough: they read talisman bonuses
        assert_eq!(
            session
                .level_rune(RuneKey::Speed, 1, 10.0, &mut wallet, &env)
                .unwrap_err(),
            SessionError::NotInitialized(Engine::Talismans)
        );
        assert_eq!(wallet.offerings, 100.0);
        assert!(!session.is_initialized());
    }

    #[test]
    fn error_messages_name_the_engine() {
        let err = SessionError::NotInitialized(Engine::Talismans);
        assert_eq!(err.to_string(), "talisman registry used before initialization");
    }

    #[test]
    fn talisman_bonuses_reach_rune_free_levels() {
        let env = FlatBonuses::default();
        let mut session = fresh_session(&env);
        let mut wallet = Wallet::default();
        wallet.fragments = FragmentBasket::from_fn(|_| 1e30);
        assert_eq!(
            session
                .buy_talisman_levels(TalismanKey::Exemption, 180, &mut wallet, &env)
                .unwrap(),
            180
        );
        let speed = session.rune_snapshot(RuneKey::Speed, &env).unwrap();
        // 0.75 coefficient × 3.0 rarity × 180 levels, sign +
        assert!((speed.free_levels - 405.0).abs() < 1e-9);
        let prism = session.rune_snapshot(RuneKey::Prism, &env).unwrap();
        assert!((prism.free_levels + 405.0).abs() < 1e-9);
        // exemption OOM bonus reaches duplication only
        let dup = session.rune_snapshot(RuneKey::Duplication, &env).unwrap();
        assert!((dup.effective_levels_per_oom - 153.0).abs() < 1e-9);
        assert_eq!(speed.effective_levels_per_oom, 150.0);
    }

    #[test]
    fn negative_talisman_bonus_floors_effective_level() {
        let env = FlatBonuses::default();
        let mut session = fresh_session(&env);
        let mut wallet = Wallet::default();
        wallet.fragments = FragmentBasket::from_fn(|_| 1e30);
        session
            .buy_talisman_levels(TalismanKey::Exemption, 180, &mut wallet, &env)
            .unwrap();
        let prism = session.rune_snapshot(RuneKey::Prism, &env).unwrap();
        assert_eq!(prism.effective_level, 0.0);
    }

    #[test]
    fn level_rune_through_session() {
        let env = FlatBonuses::default();
        let mut session = fresh_session(&env);
        let mut wallet = Wallet::new(10.0, 0.0);
        let purchase = session
            .level_rune(RuneKey::Speed, 100, 10.0, &mut wallet, &env)
            .unwrap();
        assert_eq!(purchase.offerings_spent, 10.0);
        assert_eq!(purchase.level_after, 1);
        assert_eq!(wallet.offerings, 0.0);
        assert_eq!(session.rune_level(RuneKey::Speed, &env).unwrap(), 1);
    }

    #[test]
    fn sacrifice_skips_locked_runes() {
        let env = FlatBonuses {
            runes_unlocked: false,
            ..FlatBonuses::default()
        };
        let mut session = fresh_session(&env);
        let mut wallet = Wallet::new(50.0, 0.0);
        let result = session
            .sacrifice_offerings(RuneKey::Thrift, 50.0, false, &mut wallet, &env)
            .unwrap();
        assert!(result.is_none());
        assert_eq!(wallet.offerings, 50.0);
    }

    #[test]
    fn reset_clears_by_tier() {
        let env = FlatBonuses::default();
        let mut save = SaveLedger::default();
        save.runes = RuneMap::from_fn(|_| Decimal::from(1e300));
        let ruleset = Ruleset::default();
        save.talismans.midas = ledger_for_level(ruleset.talisman(TalismanKey::Midas), 20, 180);
        let mut session = Session::from_save(ruleset, &save, &env);

        let summary = session.reset(ResetTier::Ascension).unwrap();
        assert_eq!(summary.runes_reset, 5);
        assert!(!summary.talismans_reset);
        let ledger = session.to_save().unwrap();
        assert!(ledger.runes.speed.is_zero());
        assert!(!ledger.runes.antiquities.is_zero());
        assert!(!ledger.talismans.midas.is_empty());

        let summary = session.reset(ResetTier::Singularity).unwrap();
        assert_eq!(summary.runes_reset, 7);
        assert!(summary.talismans_reset);
        let ledger = session.to_save().unwrap();
        assert!(ledger.runes.antiquities.is_zero());
        assert!(ledger.talismans.midas.is_empty());
    }

    #[test]
    fn save_round_trips_through_session() {
        let env = FlatBonuses::default();
        let mut session = fresh_session(&env);
        let mut wallet = Wallet::new(1e6, 0.0);
        wallet.fragments = FragmentBasket::from_fn(|_| 1e12);
        session
            .level_rune(RuneKey::Duplication, 5, 1e6, &mut wallet, &env)
            .unwrap();
        session
            .buy_talisman_levels(TalismanKey::Chronos, 40, &mut wallet, &env)
            .unwrap();
        let flipped = RuneModifiers([-1, 1, 1, 1, -1]);
        assert!(session
            .respec_talisman(TalismanKey::Chronos, flipped, &mut wallet)
            .unwrap());

        let save = session.to_save().unwrap();
        let mut restored = Session::from_save(Ruleset::default(), &save, &env);
        assert_eq!(restored.to_save().unwrap(), save);
        let snap = restored.talisman_snapshot(TalismanKey::Chronos, &env).unwrap();
        assert_eq!(snap.level, 40);
        assert_eq!(snap.modifiers, flipped);
    }

    #[test]
    fn fragment_shop_needs_no_registry() {
        let session = Session::new(Ruleset::default());
        let mut wallet = Wallet::new(1e4, 1e14);
        assert_eq!(session.buy_fragments(FragmentKind::CommonFragment, 100.0, &mut wallet), 1.0);
        assert_eq!(wallet.fragments.common_fragment, 1.0);
    }
}
