use proptest::prelude::*;
use runeforge_logic::bonuses::FlatBonuses;
use runeforge_logic::decimal::Decimal;
use runeforge_logic::keys::{FragmentBasket, FragmentKind, TalismanKey};
use runeforge_logic::ruleset::{RuneModifiers, Ruleset};
use runeforge_logic::runes::{cost_to_reach, level_for_experience};
use runeforge_logic::talismans::{ledger_for_level, Talisman};
use runeforge_logic::wallet::Wallet;

fn talisman_key(index: usize) -> TalismanKey {
    TalismanKey::ALL[index % TalismanKey::ALL.len()]
}

fn fragment_kind(index: usize) -> FragmentKind {
    FragmentKind::ALL[index % FragmentKind::ALL.len()]
}

proptest! {
    #[test]
    fn level_brackets_experience(
        coefficient in 1.0_f64..1e6,
        levels_per_oom in 1.0_f64..50.0,
        mantissa in 1.0_f64..10.0,
        exponent in 0_i64..1000,
    ) {
        let experience = Decimal::from_parts(mantissa, exponent);
        let level = level_for_experience(coefficient, levels_per_oom, experience);
        prop_assert!(cost_to_reach(coefficient, levels_per_oom, level) <= experience);
        prop_assert!(cost_to_reach(coefficient, levels_per_oom, level + 1) > experience);
    }

    #[test]
    fn level_is_monotonic_in_experience(
        coefficient in 1.0_f64..1e6,
        levels_per_oom in 1.0_f64..50.0,
        mantissa in 1.0_f64..10.0,
        exponent in 0_i64..400,
        extra in 0.0_f64..1e3,
    ) {
        let low = Decimal::from_parts(mantissa, exponent);
        let high = low * (1.0 + extra);
        prop_assert!(
            level_for_experience(coefficient, levels_per_oom, low)
                <= level_for_experience(coefficient, levels_per_oom, high)
        );
    }

    #[test]
    fn talisman_replay_recovers_level(index in 0_usize..7, fraction in 0.0_f64..=1.0) {
        let env = FlatBonuses::default();
        let ruleset = Ruleset::default();
        let key = talisman_key(index);
        let def = *ruleset.talisman(key);
        let level = (def.max_level as f64 * fraction).floor() as u32;
        let ledger = ledger_for_level(&def, level, def.max_level);
        let talisman = Talisman::new(key, def, ledger, RuneModifiers::default(), &env);
        prop_assert_eq!(talisman.level(&env), level);

        // replaying the ledger a second time changes nothing
        let again = Talisman::new(key, def, *talisman.fragments_invested(), talisman.modifiers(), &env);
        prop_assert_eq!(again.level(&env), level);
    }

    #[test]
    fn talisman_level_grows_with_ledger(
        index in 0_usize..7,
        fraction in 0.0_f64..=1.0,
        extra in prop::collection::vec(0.0_f64..1e12, 7),
    ) {
        let env = FlatBonuses::default();
        let ruleset = Ruleset::default();
        let key = talisman_key(index);
        let def = *ruleset.talisman(key);
        let level = (def.max_level as f64 * fraction).floor() as u32;
        let base = ledger_for_level(&def, level, def.max_level);
        let richer = FragmentBasket::from_fn(|kind| {
            let i = FragmentKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
            base[kind] + extra[i]
        });
        let talisman = Talisman::new(key, def, richer, RuneModifiers::default(), &env);
        prop_assert!(talisman.level(&env) >= level);
        prop_assert!(talisman.level(&env) <= def.max_level);
    }

    #[test]
    fn wallet_never_goes_negative(
        ops in prop::collection::vec((0_u8..4, 0_usize..7, -1e6_f64..1e9), 1..200),
    ) {
        let mut wallet = Wallet::new(1e8, 1e8);
        wallet.fragments = FragmentBasket::from_fn(|_| 1e6);
        for (op, kind, amount) in ops {
            match op {
                0 => wallet.debit_offerings(amount),
                1 => wallet.debit_obtainium(amount),
                2 => wallet.debit_fragment(fragment_kind(kind), amount),
                _ => wallet.credit_fragment(fragment_kind(kind), amount),
            }
            prop_assert!(wallet.offerings >= 0.0);
            prop_assert!(wallet.obtainium >= 0.0);
            for kind in FragmentKind::ALL {
                prop_assert!(wallet.fragments[kind] >= 0.0);
            }
        }
    }
}
