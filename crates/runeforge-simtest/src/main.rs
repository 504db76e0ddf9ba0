//! Runeforge Headless Simulation Harness
//!
//! Drives the rune and talisman engines end to end against synthetic game
//! progress. Runs entirely in-process: no UI, no timers, no storage.
//!
//! Usage:
//!   cargo run -p runeforge-simtest
//!   cargo run -p runeforge-simtest -- --verbose
//!   cargo run -p runeforge-simtest -- --ruleset rules.json --seed 7

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use runeforge_logic::bonuses::{BonusSource, FlatBonuses, GameStateBonuses};
use runeforge_logic::decimal::Decimal;
use runeforge_logic::fragments;
use runeforge_logic::keys::{
    FragmentBasket, FragmentKind, ResetTier, RuneKey, RuneMap, TalismanKey, TalismanMap,
};
use runeforge_logic::persistence::{self, SaveLedger};
use runeforge_logic::progress::GameProgress;
use runeforge_logic::ruleset::{validate_ruleset, RuneModifiers, Ruleset};
use runeforge_logic::runes::{cost_to_reach, level_for_experience, Rune, RuneRules};
use runeforge_logic::session::Session;
use runeforge_logic::talismans::{ledger_for_level, rarity_for_level, Talisman};
use runeforge_logic::wallet::Wallet;
use serde::Deserialize;

// ── Command line ────────────────────────────────────────────────────────

/// Headless validation harness for the rune and talisman engines.
#[derive(Debug, Parser)]
#[command(name = "runeforge-simtest", version, about)]
struct Options {
    /// Print every check, and log at debug level unless RUST_LOG says otherwise.
    #[arg(long)]
    verbose: bool,
    /// Validate against a ruleset JSON file instead of the canonical one.
    #[arg(long = "ruleset", value_name = "PATH")]
    ruleset_path: Option<String>,
    /// Seed for the randomized checks.
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let options = Options::parse();
    init_logging(options.verbose);
    println!("=== Runeforge Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Ruleset loading and validation
    let ruleset = match load_ruleset(options.ruleset_path.as_deref(), &mut results) {
        Some(r) => r,
        None => {
            report(&results, options.verbose);
            std::process::exit(1);
        }
    };

    let mut rng = StdRng::seed_from_u64(options.seed);

    // 2. Rune cost curve and level invariant
    results.extend(validate_rune_levels(&ruleset, &mut rng));

    // 3. Rune purchases
    results.extend(validate_rune_purchases(&ruleset));

    // 4. Talisman ledgers and purchases
    results.extend(validate_talismans(&ruleset));

    // 5. Talisman → rune wiring over canonical game progress
    results.extend(validate_session_wiring(&ruleset));

    // 6. Fragment shop
    results.extend(validate_fragment_shop(&ruleset));

    // 7. Adversarial wallet sequences
    results.extend(validate_wallet_fuzz(&ruleset, &mut rng));

    // 8. Persistence
    results.extend(validate_persistence(&ruleset));

    if !report(&results, options.verbose) {
        std::process::exit(1);
    }
}

/// Print the summary. Returns whether everything passed.
fn report(results: &[TestResult], verbose: bool) -> bool {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );
    failed == 0
}

// ── 1. Ruleset ──────────────────────────────────────────────────────────

fn load_ruleset(path: Option<&str>, results: &mut Vec<TestResult>) -> Option<Ruleset> {
    println!("--- Ruleset ---");
    let ruleset = match path {
        Some(path) => match Ruleset::from_path(path) {
            Ok(r) => r,
            Err(e) => {
                results.push(check("ruleset_load", false, format!("{path}: {e}")));
                return None;
            }
        },
        None => Ruleset::default(),
    };

    let issues = validate_ruleset(&ruleset);
    results.push(check(
        "ruleset_valid",
        issues.is_empty(),
        if issues.is_empty() {
            format!("ruleset {} has no issues", ruleset.version)
        } else {
            issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        },
    ));

    let json_ok = ruleset
        .to_json()
        .ok()
        .and_then(|json| Ruleset::from_json(&json).ok())
        .is_some_and(|reloaded| reloaded == ruleset);
    results.push(check(
        "ruleset_json_reload",
        json_ok,
        "ruleset survives a JSON write and reload",
    ));

    let antiquities_clean = TalismanKey::ALL
        .iter()
        .all(|&k| ruleset.talisman(k).rune_coefficients.antiquities == 0.0);
    results.push(check(
        "ruleset_antiquities_unboosted",
        antiquities_clean,
        "no talisman boosts antiquities",
    ));

    Some(ruleset)
}

// ── 2. Rune levels ──────────────────────────────────────────────────────

fn validate_rune_levels(ruleset: &Ruleset, rng: &mut StdRng) -> Vec<TestResult> {
    println!("--- Rune Levels ---");
    let mut results = Vec::new();

    // Random experience across the whole representable range, per rune
    let mut violations = Vec::new();
    let samples = 2_000;
    for _ in 0..samples {
        let key = RuneKey::ALL[rng.gen_range(0..RuneKey::ALL.len())];
        let def = ruleset.rune(key);
        let elpo = def.levels_per_oom + rng.gen_range(0.0..20.0);
        let experience = Decimal::from_parts(rng.gen_range(1.0..10.0), rng.gen_range(-2..1200));
        let level = level_for_experience(def.cost_coefficient, elpo, experience);
        let below = cost_to_reach(def.cost_coefficient, elpo, level) <= experience;
        let above = cost_to_reach(def.cost_coefficient, elpo, level + 1) > experience;
        if !(below && above) && violations.len() < 5 {
            violations.push(format!("{key} exp {experience} -> level {level}"));
        }
    }
    results.push(check(
        "rune_level_invariant",
        violations.is_empty(),
        if violations.is_empty() {
            format!("{samples} random experiences bracketed by the cost curve")
        } else {
            violations.join(", ")
        },
    ));

    // Monotonic in experience
    let def = ruleset.rune(RuneKey::Prism);
    let mut previous = 0;
    let mut monotonic = true;
    let mut exp = Decimal::ONE;
    for _ in 0..400 {
        let level = level_for_experience(def.cost_coefficient, def.levels_per_oom, exp);
        monotonic &= level >= previous;
        previous = level;
        exp = exp * 1.7;
    }
    results.push(check(
        "rune_level_monotonic",
        monotonic,
        format!("prism level {previous} after 400 growth steps"),
    ));

    // Experience beyond f64 range still levels antiquities
    let antiquities = ruleset.rune(RuneKey::Antiquities);
    let level = level_for_experience(
        antiquities.cost_coefficient,
        antiquities.levels_per_oom,
        Decimal::from_parts(1.0, 400),
    );
    results.push(check(
        "rune_level_beyond_f64",
        level >= 3,
        format!("antiquities at 1e400 experience is level {level}"),
    ));

    results
}

// ── 3. Rune purchases ───────────────────────────────────────────────────

fn validate_rune_purchases(ruleset: &Ruleset) -> Vec<TestResult> {
    println!("--- Rune Purchases ---");
    let mut results = Vec::new();
    let env = FlatBonuses::default();
    let rules = RuneRules::from_ruleset(ruleset);
    let speed = |exp: Decimal| Rune::new(RuneKey::Speed, *ruleset.rune(RuneKey::Speed), rules, exp);

    // Budget cap: more levels than the budget buys
    let mut rune = speed(Decimal::ZERO);
    let mut wallet = Wallet::new(10.0, 0.0);
    let purchase = rune.level_rune(1_000, 10.0, &mut wallet, &env);
    results.push(check(
        "rune_budget_cap",
        purchase.offerings_spent == 10.0 && wallet.offerings == 0.0,
        format!(
            "spent {}, experience {}, level {}",
            purchase.offerings_spent,
            rune.experience(),
            purchase.level_after
        ),
    ));

    // Exact purchase of one level
    let mut rune = speed(Decimal::ZERO);
    let mut wallet = Wallet::new(1e9, 0.0);
    let needed = rune.offerings_to_level(1, &env).to_f64();
    let purchase = rune.level_rune(1, 1e9, &mut wallet, &env);
    results.push(check(
        "rune_exact_purchase",
        purchase.level_after == 1 && purchase.offerings_spent == needed,
        format!("{} offerings for level 1", purchase.offerings_spent),
    ));

    // Budget larger than the wallet is clamped
    let mut rune = speed(Decimal::ZERO);
    let mut wallet = Wallet::new(3.0, 0.0);
    let purchase = rune.level_rune(1_000, 1e12, &mut wallet, &env);
    results.push(check(
        "rune_budget_clamped_to_wallet",
        purchase.offerings_spent == 3.0 && wallet.offerings == 0.0,
        format!("spent {} of a 3-offering wallet", purchase.offerings_spent),
    ));

    // Locked rune reports the level-0 reward
    let locked = FlatBonuses {
        runes_unlocked: false,
        ..FlatBonuses::default()
    };
    let def = ruleset.rune(RuneKey::Speed);
    let rune = speed(cost_to_reach(def.cost_coefficient, def.levels_per_oom, 50));
    let reward = rune.reward(&locked);
    let baseline = rune.reward(&env);
    results.push(check(
        "rune_locked_reward",
        rune.level(&locked) == 50 && reward != baseline,
        format!("locked: {reward}"),
    ));

    results
}

// ── 4. Talismans ────────────────────────────────────────────────────────

fn validate_talismans(ruleset: &Ruleset) -> Vec<TestResult> {
    println!("--- Talismans ---");
    let mut results = Vec::new();
    let env = FlatBonuses::default();

    // Ledger replay reproduces the level for every talisman
    let mut mismatches = Vec::new();
    for key in TalismanKey::ALL {
        let def = *ruleset.talisman(key);
        for level in [0, 1, 30, 90, 150, def.max_level] {
            let ledger = ledger_for_level(&def, level, def.max_level);
            let talisman = Talisman::new(key, def, ledger, def.default_modifiers, &env);
            if talisman.level(&env) != level {
                mismatches.push(format!("{key}@{level}->{}", talisman.level(&env)));
            }
        }
    }
    results.push(check(
        "talisman_replay",
        mismatches.is_empty(),
        if mismatches.is_empty() {
            "every ledger replays to its level".to_string()
        } else {
            mismatches.join(", ")
        },
    ));

    // Idempotent replay
    let def = *ruleset.talisman(TalismanKey::Midas);
    let mut talisman = Talisman::new(
        TalismanKey::Midas,
        def,
        ledger_for_level(&def, 123, def.max_level),
        def.default_modifiers,
        &env,
    );
    let first = talisman.cached_level();
    talisman.update_level_from_invested(def.max_level);
    results.push(check(
        "talisman_replay_idempotent",
        talisman.cached_level() == first,
        format!("midas level {first} stable across replays"),
    ));

    // All-or-nothing
    let def = *ruleset.talisman(TalismanKey::Exemption);
    let mut talisman = Talisman::new(
        TalismanKey::Exemption,
        def,
        ledger_for_level(&def, 160, def.max_level),
        def.default_modifiers,
        &env,
    );
    let cost = talisman.next_level_cost(&env);
    let mut wallet = Wallet::default();
    wallet.fragments = cost;
    wallet.fragments.epic_fragment = cost.epic_fragment - 1.0;
    let before = wallet.clone();
    let bought = talisman.buy_level(&mut wallet, &env);
    results.push(check(
        "talisman_all_or_nothing",
        !bought && wallet == before && talisman.level(&env) == 160,
        "6 of 7 currencies affordable leaves everything untouched",
    ));

    // Rarity endpoints
    results.push(check(
        "talisman_rarity_endpoints",
        rarity_for_level(0, 180) == 1 && rarity_for_level(180, 180) == 7,
        "level 0 is rarity 1, level 180 is rarity 7",
    ));

    // Buying to cap with plenty of fragments
    let mut talisman = Talisman::new(
        TalismanKey::Plastic,
        *ruleset.talisman(TalismanKey::Plastic),
        FragmentBasket::default(),
        ruleset.talisman(TalismanKey::Plastic).default_modifiers,
        &env,
    );
    let mut wallet = Wallet::default();
    wallet.fragments = FragmentBasket::from_fn(|_| 1e300);
    let bought = talisman.buy_to_cap(&mut wallet, &env);
    results.push(check(
        "talisman_buy_to_cap",
        bought == talisman.effective_level_cap(&env) && talisman.rarity(&env) == 7,
        format!("plastic bought {bought} levels"),
    ));

    results
}

// ── 5. Session wiring ───────────────────────────────────────────────────

/// A late-game progress snapshot with every rune and talisman unlocked.
fn late_game_progress() -> GameProgress {
    let mut p = GameProgress::default();
    for ach in [38, 44, 46, 47, 48, 53, 102, 134, 135, 136] {
        p.achievements.set(ach, 1.0);
    }
    p.researches.set(82, 1.0);
    p.researches.set(200, 4000.0);
    p.platonic_upgrades.set(20, 1.0);
    p.cube_upgrades.set(67, 1.0);
    p.infinite_ascent_purchased = true;
    p.ascension_count = 3.0;
    p.offering_buy_amount = 10;
    p
}

fn validate_session_wiring(ruleset: &Ruleset) -> Vec<TestResult> {
    println!("--- Session Wiring ---");
    let mut results = Vec::new();
    let progress = late_game_progress();
    let env = GameStateBonuses::new(&progress);

    let unlocked = RuneKey::ALL.iter().filter(|&&k| env.rune_unlocked(k)).count()
        + TalismanKey::ALL
            .iter()
            .filter(|&&k| env.talisman_unlocked(k))
            .count();
    results.push(check(
        "session_everything_unlocked",
        unlocked == 14,
        format!("{unlocked}/14 runes and talismans unlocked"),
    ));

    let mut session = Session::from_save(ruleset.clone(), &SaveLedger::default(), &env);
    let mut wallet = Wallet::new(1e12, 0.0);
    wallet.fragments = FragmentBasket::from_fn(|_| 1e300);

    let bought = session
        .buy_talisman_to_cap(TalismanKey::Midas, &mut wallet, &env)
        .unwrap_or(0);
    results.push(check(
        "session_midas_cap_increase",
        bought == 180 + 10 + 1337,
        format!("midas bought {bought} levels"),
    ));

    let snaps = session.talisman_snapshots(&env).unwrap_or_default();
    let midas = snaps.iter().find(|s| s.key == TalismanKey::Midas);
    results.push(check(
        "session_midas_rarity",
        midas.is_some_and(|s| s.rarity == 7 && s.levels_until_rarity_increase == 0),
        midas.map_or("missing".into(), |s| s.description.clone()),
    ));

    let thrift = session.rune_snapshot(RuneKey::Thrift, &env);
    let thrift_oom = thrift
        .as_ref()
        .map(|s| s.effective_levels_per_oom)
        .unwrap_or_default();
    results.push(check(
        "session_midas_thrift_oom",
        (thrift_oom - (150.0 + 1527.0 / 60.0)).abs() < 1e-9,
        format!("thrift levels per OOM {thrift_oom:.3}"),
    ));

    let speed_free = session
        .rune_snapshot(RuneKey::Speed, &env)
        .map(|s| s.free_levels)
        .unwrap_or_default();
    results.push(check(
        "session_talisman_free_levels",
        speed_free < 0.0,
        format!("midas penalises speed by {speed_free:.1} free levels"),
    ));

    let sacrifice = session.sacrifice_offerings(RuneKey::Speed, 1e12, false, &mut wallet, &env);
    let gained = sacrifice
        .ok()
        .flatten()
        .map(|p| p.levels_gained())
        .unwrap_or(0);
    results.push(check(
        "session_sacrifice",
        gained == 10 && wallet.offerings < 1e12,
        format!("sacrifice gained {gained} speed levels"),
    ));

    let flipped = RuneModifiers([1, 1, 1, -1, -1]);
    let respecced = session
        .respec_talisman(TalismanKey::Midas, flipped, &mut wallet)
        .unwrap_or(false);
    let speed_after = session
        .rune_snapshot(RuneKey::Speed, &env)
        .map(|s| s.free_levels)
        .unwrap_or_default();
    results.push(check(
        "session_respec_flips_bonus",
        respecced && speed_after > 0.0,
        format!("speed free levels after respec {speed_after:.1}"),
    ));

    let summary = session.reset(ResetTier::Singularity);
    results.push(check(
        "session_singularity_reset",
        summary.is_ok_and(|s| s.runes_reset == 7 && s.talismans_reset),
        "singularity clears every rune and talisman",
    ));

    results
}

// ── 6. Fragment shop ────────────────────────────────────────────────────

fn validate_fragment_shop(ruleset: &Ruleset) -> Vec<TestResult> {
    println!("--- Fragment Shop ---");
    let mut results = Vec::new();

    let mut wallet = Wallet::new(1e10, 1e26);
    let bought = fragments::buy_all(ruleset, 50.0, &mut wallet);
    let kinds = FragmentKind::ALL.iter().filter(|&&k| bought[k] > 0.0).count();
    results.push(check(
        "fragment_buy_all",
        bought.mythical_fragment >= 1.0 && wallet.offerings >= 0.0 && wallet.obtainium >= 0.0,
        format!("bought {kinds} kinds, {} mythical", bought.mythical_fragment),
    ));

    let broke = Wallet::new(0.0, 0.0);
    let quote = fragments::quote(ruleset, FragmentKind::Shard, 100.0, &broke);
    results.push(check(
        "fragment_quote_broke",
        !quote.can_buy && quote.amount == 1.0,
        "an empty wallet cannot buy",
    ));

    results
}

// ── 7. Wallet fuzz ──────────────────────────────────────────────────────

fn validate_wallet_fuzz(ruleset: &Ruleset, rng: &mut StdRng) -> Vec<TestResult> {
    println!("--- Wallet Fuzz ---");
    let mut results = Vec::new();
    let env = FlatBonuses {
        experience_per_offering: 3.0,
        auto_buy_batch: 30,
        ..FlatBonuses::default()
    };
    let mut session = Session::from_save(ruleset.clone(), &SaveLedger::default(), &env);
    let mut wallet = Wallet::new(1e8, 1e30);
    wallet.fragments = FragmentBasket::from_fn(|_| 1e9);

    let mut negative_seen = None;
    let steps = 5_000;
    for step in 0..steps {
        match rng.gen_range(0..6) {
            0 => {
                let key = RuneKey::ALL[rng.gen_range(0..7)];
                let budget = rng.gen_range(-10.0..1e7);
                let _ = session.level_rune(key, rng.gen_range(0..500), budget, &mut wallet, &env);
            }
            1 => {
                let key = TalismanKey::ALL[rng.gen_range(0..7)];
                let _ = session.buy_talisman_levels(key, rng.gen_range(0..50), &mut wallet, &env);
            }
            2 => {
                let _ = session.auto_buy_talismans(&mut wallet, &env);
            }
            3 => {
                let kind = FragmentKind::ALL[rng.gen_range(0..7)];
                session.buy_fragments(kind, rng.gen_range(1.0..=100.0), &mut wallet);
            }
            4 => {
                wallet.debit_offerings(rng.gen_range(0.0..2e8));
                wallet.debit_obtainium(rng.gen_range(0.0..1e29));
            }
            _ => {
                wallet.offerings += rng.gen_range(0.0..1e6);
                wallet.obtainium += rng.gen_range(0.0..1e24);
            }
        }
        let any_negative = wallet.offerings < 0.0
            || wallet.obtainium < 0.0
            || wallet.fragments.iter().any(|(_, &v)| v < 0.0);
        if any_negative && negative_seen.is_none() {
            negative_seen = Some(step);
        }
    }
    results.push(check(
        "wallet_never_negative",
        negative_seen.is_none(),
        match negative_seen {
            None => format!("{steps} random operations kept every pool >= 0"),
            Some(step) => format!("negative balance after step {step}"),
        },
    ));

    let ledger_clean = session.to_save().is_ok_and(|save| {
        save.talismans
            .iter()
            .all(|(_, l)| l.iter().all(|(_, &v)| v >= 0.0 && v.is_finite()))
    });
    results.push(check(
        "ledger_never_negative",
        ledger_clean,
        "talisman ledgers stay finite and non-negative",
    ));

    results
}

// ── 8. Persistence ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VersionProbe {
    version: u32,
}

fn validate_persistence(ruleset: &Ruleset) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();
    let env = FlatBonuses::default();

    let mut save = SaveLedger::default();
    save.runes = RuneMap::from_fn(|k| Decimal::from_parts(1.5, 10 + 40 * k as i64));
    save.talismans = TalismanMap::from_fn(|k| {
        let def = ruleset.talisman(k);
        ledger_for_level(def, 42, def.max_level)
    });
    let session = Session::from_save(ruleset.clone(), &save, &env);
    let restored = session.to_save().ok();

    let json = restored.as_ref().and_then(|s| persistence::to_json(s).ok());
    let probe = json
        .as_deref()
        .and_then(|j| serde_json::from_str::<VersionProbe>(j).ok());
    results.push(check(
        "persistence_json_version",
        probe.is_some_and(|p| p.version == persistence::SAVE_VERSION),
        "JSON save carries the format version",
    ));

    let json_round_trip = json
        .as_deref()
        .and_then(|j| persistence::from_json(j).ok())
        .is_some_and(|loaded| Some(&loaded) == restored.as_ref());
    results.push(check(
        "persistence_json_round_trip",
        json_round_trip,
        "ledger survives JSON save and load",
    ));

    let mut buffer = Vec::new();
    let binary_round_trip = restored
        .as_ref()
        .is_some_and(|s| persistence::save(&mut buffer, s).is_ok())
        && persistence::load(&buffer[..])
            .ok()
            .is_some_and(|loaded| Some(&loaded) == restored.as_ref());
    results.push(check(
        "persistence_binary_round_trip",
        binary_round_trip,
        format!("{} byte binary save", buffer.len()),
    ));

    let reloaded = restored.map(|s| Session::from_save(ruleset.clone(), &s, &env));
    let levels_match = reloaded.is_some_and(|mut s| {
        TalismanKey::ALL.iter().all(|&k| {
            s.talisman_snapshot(k, &env)
                .is_ok_and(|snap| snap.level == 42)
        })
    });
    results.push(check(
        "persistence_levels_rederived",
        levels_match,
        "talisman levels re-derived from ledgers after load",
    ));

    results
}
