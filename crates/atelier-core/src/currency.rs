//! # Currency Conversion
//!
//! Static exchange-rate lookup table, refreshed at runtime from an external
//! rates API. All catalog prices are stored in the base currency (LKR) and
//! converted for display and for gateways that settle in another currency.

use crate::error::{StoreError, StoreResult};
use crate::product::{Currency, Price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Exchange rates relative to a base currency.
///
/// `rates[c]` is how many units of `c` one unit of the base buys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    pub base: Currency,
    pub rates: BTreeMap<Currency, f64>,
    pub updated_at: DateTime<Utc>,
    /// Where the rates came from ("static" or the API host)
    pub source: String,
}

/// Response shape of the rates API (`GET {RATES_API_URL}`)
#[derive(Debug, Clone, Deserialize)]
pub struct RatesPayload {
    #[serde(alias = "base")]
    pub base_code: String,
    pub rates: std::collections::HashMap<String, f64>,
}

impl RateTable {
    /// Empty table containing only the base
    pub fn new(base: Currency) -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(base, 1.0);
        Self {
            base,
            rates,
            updated_at: Utc::now(),
            source: "static".to_string(),
        }
    }

    /// Builder: set a rate
    pub fn with_rate(mut self, currency: Currency, rate: f64) -> Self {
        self.rates.insert(currency, rate);
        self
    }

    /// Rate for a currency (1.0 for the base)
    pub fn rate(&self, currency: Currency) -> Option<f64> {
        if currency == self.base {
            return Some(1.0);
        }
        self.rates.get(&currency).copied()
    }

    /// Convert a price into another currency through the base.
    pub fn convert(&self, price: &Price, to: Currency) -> StoreResult<Price> {
        if price.currency == to {
            return Ok(price.clone());
        }
        let from_rate = self.rate(price.currency).ok_or(StoreError::UnsupportedCurrency {
            currency: price.currency.to_string(),
        })?;
        let to_rate = self.rate(to).ok_or(StoreError::UnsupportedCurrency {
            currency: to.to_string(),
        })?;

        let in_base = price.as_decimal() / from_rate;
        Ok(Price::new(in_base * to_rate, to))
    }

    /// Replace rates with the ones from a rates API payload.
    ///
    /// Codes the store does not sell in and non-positive values are ignored.
    /// Returns how many rates were taken.
    pub fn merge_remote(&mut self, payload: &RatesPayload, source: impl Into<String>) -> StoreResult<usize> {
        let base: Currency = payload.base_code.parse()?;
        if base != self.base {
            return Err(StoreError::InvalidRequest(format!(
                "rates are based on {}, expected {}",
                base, self.base
            )));
        }

        let mut taken = 0;
        for (code, rate) in &payload.rates {
            let Ok(currency) = code.parse::<Currency>() else {
                continue;
            };
            if currency == self.base || !rate.is_finite() || *rate <= 0.0 {
                continue;
            }
            self.rates.insert(currency, *rate);
            taken += 1;
        }

        self.updated_at = Utc::now();
        self.source = source.into();
        Ok(taken)
    }
}

impl Default for RateTable {
    /// Built-in rates used until the first successful refresh
    fn default() -> Self {
        RateTable::new(Currency::LKR)
            .with_rate(Currency::USD, 0.0033)
            .with_rate(Currency::EUR, 0.0031)
            .with_rate(Currency::GBP, 0.0026)
            .with_rate(Currency::AUD, 0.0051)
            .with_rate(Currency::CAD, 0.0046)
            .with_rate(Currency::INR, 0.28)
            .with_rate(Currency::SGD, 0.0044)
            .with_rate(Currency::AED, 0.0121)
            .with_rate(Currency::JPY, 0.50)
    }
}
