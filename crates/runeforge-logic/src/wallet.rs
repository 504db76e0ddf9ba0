//! Player currency pools.
//!
//! Debits never leave a pool negative. Floating-point drift on large
//! amounts can make a debit overshoot by a unit or two; the overshoot is
//! clamped to zero and reported at `debug` level only.

use serde::{Deserialize, Serialize};

use crate::keys::{FragmentBasket, FragmentKind};

/// Offerings, obtainium, and the seven fragment pools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallet {
    pub offerings: f64,
    pub obtainium: f64,
    pub fragments: FragmentBasket,
}

impl Wallet {
    pub fn new(offerings: f64, obtainium: f64) -> Self {
        Self {
            offerings,
            obtainium,
            fragments: FragmentBasket::default(),
        }
    }

    pub fn debit_offerings(&mut self, amount: f64) {
        self.offerings = clamped_sub(self.offerings, amount, "offerings");
    }

    pub fn debit_obtainium(&mut self, amount: f64) {
        self.obtainium = clamped_sub(self.obtainium, amount, "obtainium");
    }

    pub fn debit_fragment(&mut self, kind: FragmentKind, amount: f64) {
        self.fragments[kind] = clamped_sub(self.fragments[kind], amount, kind.name());
    }

    /// Debit every kind in `cost`. Callers check [`FragmentBasket::covers`]
    /// first when the purchase must be all-or-nothing.
    pub fn debit_fragments(&mut self, cost: &FragmentBasket) {
        for kind in FragmentKind::ALL {
            if cost[kind] != 0.0 {
                self.debit_fragment(kind, cost[kind]);
            }
        }
    }

    pub fn credit_fragment(&mut self, kind: FragmentKind, amount: f64) {
        self.fragments[kind] += amount.max(0.0);
    }
}

fn clamped_sub(balance: f64, amount: f64, pool: &str) -> f64 {
    let amount = if amount.is_nan() { 0.0 } else { amount };
    let balance = if balance.is_nan() { 0.0 } else { balance };
    let next = balance - amount;
    if next < 0.0 || next.is_nan() {
        log::debug!(
            "{pool} debit of {amount} exceeds balance {balance}; clamping to zero"
        );
        0.0
    } else {
        next
    }
}
