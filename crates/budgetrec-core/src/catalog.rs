//! Artikelpreise und Ausgabenlimits pro Nutzer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{RecError, Result};
use crate::id::{ItemId, UserId};

/// Ausgabenlimit eines Nutzers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Budget {
    Limited(f64),
    Unbounded,
}

/// Relative Toleranz für Rundungsrauschen in aufsummierten Preisen.
const BUDGET_TOLERANCE: f64 = 1e-9;

impl Budget {
    /// Ob eine Ausgabe von `total` innerhalb des Limits bleibt.
    #[must_use]
    pub fn admits(self, total: f64) -> bool {
        match self {
            Budget::Limited(limit) => total <= limit + BUDGET_TOLERANCE * limit.max(1.0),
            Budget::Unbounded => true,
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Limited(limit) => write!(f, "{limit:.2}"),
            Budget::Unbounded => f.write_str("unbounded"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingCatalog {
    prices: BTreeMap<ItemId, f64>,
    budgets: BTreeMap<UserId, f64>,
}

impl PricingCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Setzt oder überschreibt den Preis von `item`.
    pub fn set_price(&mut self, item: ItemId, price: f64) -> Result<()> {
        let price = validate_amount("price", price)?;
        self.prices.insert(item, price);
        Ok(())
    }

    /// Setzt oder überschreibt das Ausgabenlimit von `user`.
    pub fn set_budget(&mut self, user: UserId, limit: f64) -> Result<()> {
        let limit = validate_amount("budget", limit)?;
        self.budgets.insert(user, limit);
        Ok(())
    }

    #[must_use]
    pub fn price_of(&self, item: ItemId) -> Option<f64> {
        self.prices.get(&item).copied()
    }

    #[must_use]
    pub fn budget_of(&self, user: UserId) -> Budget {
        self.budgets
            .get(&user)
            .map_or(Budget::Unbounded, |limit| Budget::Limited(*limit))
    }

    pub fn priced_items(&self) -> impl Iterator<Item = (ItemId, f64)> + '_ {
        self.prices.iter().map(|(item, price)| (*item, *price))
    }
}

/// Akzeptiert endliche, nicht-negative Beträge.
pub(crate) fn validate_amount(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RecError::InvalidValue { field, value })
    }
}
