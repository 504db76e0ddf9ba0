//! Integration tests for a full session lifecycle.
//!
//! Exercises: save ledger → Session init → purchases over canonical game
//! progress → reset → save → reload.

use runeforge_logic::bonuses::{BonusSource, FlatBonuses, GameStateBonuses};
use runeforge_logic::decimal::Decimal;
use runeforge_logic::keys::{FragmentBasket, FragmentKind, ResetTier, RuneKey, TalismanKey};
use runeforge_logic::persistence::{self, SaveLedger};
use runeforge_logic::progress::GameProgress;
use runeforge_logic::ruleset::{RunePurchasePolicy, RuneModifiers, Ruleset};
use runeforge_logic::session::{Engine, Session, SessionError};
use runeforge_logic::talismans::ledger_for_level;
use runeforge_logic::wallet::Wallet;

// ── Helpers ────────────────────────────────────────────────────────────

fn mid_game_progress() -> GameProgress {
    let mut p = GameProgress::default();
    for ach in [38, 44, 46, 47, 48, 53, 102] {
        p.achievements.set(ach, 1.0);
    }
    p.researches.set(82, 1.0);
    p.ascension_count = 1.0;
    p.offering_buy_amount = 5;
    p.auto_offering_levels = 3;
    p
}

fn rich_wallet() -> Wallet {
    let mut wallet = Wallet::new(1e15, 1e30);
    wallet.fragments = FragmentBasket::from_fn(|_| 1e40);
    wallet
}

// ── Lifecycle ──────────────────────────────────────────────────────────

#[test]
fn fresh_session_starts_at_zero() {
    let progress = mid_game_progress();
    let env = GameStateBonuses::new(&progress);
    let mut session = Session::from_save(Ruleset::default(), &SaveLedger::default(), &env);
    let runes = session.rune_snapshots(&env).unwrap();
    assert_eq!(runes.len(), 7);
    assert!(runes.iter().all(|r| r.level == 0 && r.experience.is_zero()));
    let talismans = session.talisman_snapshots(&env).unwrap();
    assert!(talismans.iter().all(|t| t.level == 0));
    // locked talismans report rarity 0
    let mortuus = talismans.iter().find(|t| t.key == TalismanKey::Mortuus).unwrap();
    assert!(!mortuus.unlocked);
    assert_eq!(mortuus.rarity, 0);
    let chronos = talismans.iter().find(|t| t.key == TalismanKey::Chronos).unwrap();
    assert_eq!(chronos.rarity, 1);
}

#[test]
fn locked_runes_still_gain_experience_but_report_level_zero_reward() {
    let progress = mid_game_progress();
    let env = GameStateBonuses::new(&progress);
    let mut session = Session::from_save(Ruleset::default(), &SaveLedger::default(), &env);
    assert!(!env.rune_unlocked(RuneKey::Antiquities));

    session
        .add_rune_experience(RuneKey::Antiquities, Decimal::from_parts(1.0, 260), &env)
        .unwrap();
    let snap = session.rune_snapshot(RuneKey::Antiquities, &env).unwrap();
    assert!(snap.level > 0);
    assert!(!snap.unlocked);
    assert_eq!(snap.reward, runeforge_logic::runes::RuneReward::at_level(RuneKey::Antiquities, 0.0));
}

#[test]
fn manual_and_auto_sacrifice_request_configured_levels() {
    let progress = mid_game_progress();
    let env = GameStateBonuses::new(&progress);
    let mut session = Session::from_save(Ruleset::default(), &SaveLedger::default(), &env);
    let mut wallet = rich_wallet();

    let manual = session
        .sacrifice_offerings(RuneKey::Speed, 1e15, false, &mut wallet, &env)
        .unwrap()
        .unwrap();
    assert_eq!(manual.levels_gained(), 5);

    let auto = session
        .sacrifice_offerings(RuneKey::Speed, 1e15, true, &mut wallet, &env)
        .unwrap()
        .unwrap();
    assert_eq!(auto.levels_gained(), 3);
    assert_eq!(session.rune_level(RuneKey::Speed, &env).unwrap(), 8);
}

#[test]
fn auto_buy_batch_follows_progress() {
    let progress = mid_game_progress();
    let env = GameStateBonuses::new(&progress);
    let mut session = Session::from_save(Ruleset::default(), &SaveLedger::default(), &env);
    let mut wallet = rich_wallet();
    // one ascension: 30 levels per talisman
    let bought = session.auto_buy_talismans(&mut wallet, &env).unwrap();
    assert_eq!(bought, 7 * 30);
    assert_eq!(
        session.talisman_snapshot(TalismanKey::Exemption, &env).unwrap().rarity,
        2
    );
}

#[test]
fn respec_all_changes_every_talisman() {
    let env = FlatBonuses::default();
    let mut session = Session::from_save(Ruleset::default(), &SaveLedger::default(), &env);
    let mut wallet = Wallet::new(399_999.0, 0.0);
    let signs = RuneModifiers([1, -1, 1, -1, 1]);
    assert!(!session.respec_all_talismans(signs, &mut wallet).unwrap());
    wallet.offerings = 400_000.0;
    assert!(session.respec_all_talismans(signs, &mut wallet).unwrap());
    assert_eq!(wallet.offerings, 0.0);
    let save = session.to_save().unwrap();
    let modifiers = save.modifiers.unwrap();
    assert!(modifiers.iter().all(|(_, &m)| m == signs));
}

#[test]
fn per_level_policy_matches_lump_for_flat_rates() {
    let env = FlatBonuses::default();
    let mut lump = Session::from_save(Ruleset::default(), &SaveLedger::default(), &env);
    let per_level_rules = Ruleset {
        rune_purchase_policy: RunePurchasePolicy::PerLevel,
        ..Ruleset::default()
    };
    let mut per_level = Session::from_save(per_level_rules, &SaveLedger::default(), &env);

    let mut wallet_a = Wallet::new(1e6, 0.0);
    let mut wallet_b = Wallet::new(1e6, 0.0);
    let a = lump
        .level_rune(RuneKey::Thrift, 20, 1e6, &mut wallet_a, &env)
        .unwrap();
    let b = per_level
        .level_rune(RuneKey::Thrift, 20, 1e6, &mut wallet_b, &env)
        .unwrap();
    assert_eq!(a.level_after, 20);
    assert_eq!(b.level_after, 20);
    assert!(b.offerings_spent >= a.offerings_spent);
}

#[test]
fn full_cycle_save_reset_reload() {
    let progress = mid_game_progress();
    let env = GameStateBonuses::new(&progress);
    let mut session = Session::from_save(Ruleset::default(), &SaveLedger::default(), &env);
    let mut wallet = rich_wallet();

    session
        .level_rune(RuneKey::Prism, 40, 1e15, &mut wallet, &env)
        .unwrap();
    session
        .buy_talisman_to_next_rarity(TalismanKey::Metaphysics, &mut wallet, &env)
        .unwrap();
    let bought = session.buy_all_fragments(25.0, &mut wallet);
    assert!(bought[FragmentKind::MythicalFragment] > 0.0);

    // JSON and binary saves agree
    let save = session.to_save().unwrap();
    let json = persistence::to_json(&save).unwrap();
    let mut binary = Vec::new();
    persistence::save(&mut binary, &save).unwrap();
    assert_eq!(persistence::from_json(&json).unwrap(), save);
    assert_eq!(persistence::load(&binary[..]).unwrap(), save);

    // A reincarnation leaves ascension-tier runes alone
    let summary = session.reset(ResetTier::Reincarnation).unwrap();
    assert_eq!(summary.runes_reset, 0);
    assert_eq!(session.rune_level(RuneKey::Prism, &env).unwrap(), 40);

    session.reset(ResetTier::Ascension).unwrap();
    assert_eq!(session.rune_level(RuneKey::Prism, &env).unwrap(), 0);
    assert_eq!(
        session.talisman_snapshot(TalismanKey::Metaphysics, &env).unwrap().level,
        30
    );

    // Reloading the earlier save restores the prism rune
    let mut reloaded = Session::from_save(Ruleset::default(), &save, &env);
    assert_eq!(reloaded.rune_level(RuneKey::Prism, &env).unwrap(), 40);
}

#[test]
fn legacy_levels_convert_through_ledger_helper() {
    let env = FlatBonuses::default();
    let ruleset = Ruleset::default();
    let legacy_levels = [12, 0, 45, 180, 7, 90, 3];
    let mut save = SaveLedger::default();
    for (key, &level) in TalismanKey::ALL.iter().zip(legacy_levels.iter()) {
        let def = ruleset.talisman(*key);
        save.talismans[*key] = ledger_for_level(def, level, def.max_level);
    }
    let mut session = Session::from_save(ruleset, &save, &env);
    for (key, &level) in TalismanKey::ALL.iter().zip(legacy_levels.iter()) {
        assert_eq!(session.talisman_snapshot(*key, &env).unwrap().level, level);
    }
}

#[test]
fn operations_before_init_fail_fast() {
    let env = FlatBonuses::default();
    let mut session = Session::new(Ruleset::default());
    assert_eq!(
        session.rune_snapshots(&env).unwrap_err(),
        SessionError::NotInitialized(Engine::Talismans)
    );
    assert_eq!(
        session.to_save().unwrap_err(),
        SessionError::NotInitialized(Engine::Talismans)
    );
    session.init_talismans(&Default::default(), None, &env);
    assert_eq!(
        session.reset(ResetTier::Prestige).unwrap_err(),
        SessionError::NotInitialized(Engine::Runes)
    );
}
