//! Fragment shop: trade obtainium and offerings for talisman currencies.
//!
//! Every kind has a fixed price in both currencies. A purchase takes a
//! percentage of what the scarcer currency can afford, and always buys at
//! least one fragment when the player can pay for one.

use serde::Serialize;

use crate::keys::{FragmentBasket, FragmentKind};
use crate::ruleset::{FragmentRate, Ruleset};
use crate::wallet::Wallet;

/// Price check for one fragment kind at a percentage of affordability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FragmentQuote {
    pub kind: FragmentKind,
    pub amount: f64,
    pub obtainium_cost: f64,
    pub offerings_cost: f64,
    pub can_buy: bool,
}

fn affordable(balance: f64, rate: f64) -> f64 {
    (balance / rate).floor().max(1.0)
}

/// Quote `kind` at `percentage` (0, 100] of the affordable amount.
/// Percentages outside that range quote a purchase that cannot happen.
pub fn quote(ruleset: &Ruleset, kind: FragmentKind, percentage: f64, wallet: &Wallet) -> FragmentQuote {
    let FragmentRate {
        obtainium: rate_a,
        offerings: rate_b,
    } = *ruleset.fragment_rate(kind);
    let max_a = affordable(wallet.obtainium, rate_a);
    let max_b = affordable(wallet.offerings, rate_b);
    let fraction = percentage.clamp(0.0, 100.0) / 100.0;
    let amount = (fraction * max_a.min(max_b)).floor().max(1.0);
    let valid_percentage = percentage > 0.0 && percentage <= 100.0;
    FragmentQuote {
        kind,
        amount,
        obtainium_cost: amount * rate_a,
        offerings_cost: amount * rate_b,
        can_buy: valid_percentage && rate_a <= wallet.obtainium && rate_b <= wallet.offerings,
    }
}

/// Buy `kind` if affordable. Returns the fragments credited (0 when refused).
pub fn buy(ruleset: &Ruleset, kind: FragmentKind, percentage: f64, wallet: &mut Wallet) -> f64 {
    let q = quote(ruleset, kind, percentage, wallet);
    if !q.can_buy {
        return 0.0;
    }
    wallet.credit_fragment(kind, q.amount);
    wallet.debit_obtainium(q.obtainium_cost);
    wallet.debit_offerings(q.offerings_cost);
    log::debug!(
        "bought {} {kind} for {} obtainium and {} offerings",
        q.amount,
        q.obtainium_cost,
        q.offerings_cost
    );
    q.amount
}

/// Buy every kind, most expensive first, each at `percentage` of what is
/// left. Returns the fragments credited per kind.
pub fn buy_all(ruleset: &Ruleset, percentage: f64, wallet: &mut Wallet) -> FragmentBasket {
    let mut bought = FragmentBasket::default();
    for kind in FragmentKind::ALL.into_iter().rev() {
        bought[kind] = buy(ruleset, kind, percentage, wallet);
    }
    bought
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_uses_scarcer_currency() {
        let ruleset = Ruleset::default();
        // 5 shards by obtainium, 3 by offerings
        let wallet = Wallet::new(300.0, 5e13);
        let q = quote(&ruleset, FragmentKind::Shard, 100.0, &wallet);
        assert_eq!(q.amount, 3.0);
        assert_eq!(q.obtainium_cost, 3e13);
        assert_eq!(q.offerings_cost, 300.0);
        assert!(q.can_buy);
    }

    #[test]
    fn percentage_floors_to_at_least_one() {
        let ruleset = Ruleset::default();
        let wallet = Wallet::new(300.0, 5e13);
        let q = quote(&ruleset, FragmentKind::Shard, 10.0, &wallet);
        assert_eq!(q.amount, 1.0);
        let q = quote(&ruleset, FragmentKind::Shard, 50.0, &wallet);
        assert_eq!(q.amount, 1.0);
    }

    #[test]
    fn cannot_buy_without_one_unit_of_each() {
        let ruleset = Ruleset::default();
        let mut wallet = Wallet::new(1e9, 1e23);
        let q = quote(&ruleset, FragmentKind::MythicalFragment, 100.0, &wallet);
        assert!(!q.can_buy);
        assert_eq!(buy(&ruleset, FragmentKind::MythicalFragment, 100.0, &mut wallet), 0.0);
        assert_eq!(wallet.obtainium, 1e23);
        assert_eq!(wallet.offerings, 1e9);
    }

    #[test]
    fn invalid_percentage_is_refused() {
        let ruleset = Ruleset::default();
        let wallet = Wallet::new(1e6, 1e20);
        assert!(!quote(&ruleset, FragmentKind::Shard, 0.0, &wallet).can_buy);
        assert!(!quote(&ruleset, FragmentKind::Shard, 150.0, &wallet).can_buy);
        assert!(!quote(&ruleset, FragmentKind::Shard, f64::NAN, &wallet).can_buy);
    }

    #[test]
    fn buy_moves_currencies() {
        let ruleset = Ruleset::default();
        let mut wallet = Wallet::new(1e5, 1e15);
        // rare costs 1e6 offerings
        assert_eq!(buy(&ruleset, FragmentKind::RareFragment, 100.0, &mut wallet), 0.0);
        // common: 10 by offerings, 10 by obtainium
        assert_eq!(buy(&ruleset, FragmentKind::CommonFragment, 100.0, &mut wallet), 10.0);
        assert_eq!(wallet.fragments.common_fragment, 10.0);
        assert_eq!(wallet.offerings, 0.0);
        assert_eq!(wallet.obtainium, 0.0);
    }

    #[test]
    fn buy_all_starts_with_mythical() {
        let ruleset = Ruleset::default();
        // exactly one mythical; nothing left for anything else
        let mut wallet = Wallet::new(1e9, 1e24);
        let bought = buy_all(&ruleset, 100.0, &mut wallet);
        assert_eq!(bought.mythical_fragment, 1.0);
        assert_eq!(bought.shard, 0.0);
        assert_eq!(wallet.fragments.mythical_fragment, 1.0);
        assert!(wallet.offerings >= 0.0 && wallet.obtainium >= 0.0);
    }
}
