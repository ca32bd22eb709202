//! Merge engine: joins countries with exchange rates on currency code.
//!
//! Rules:
//! - Currency code is the first listed currency, or "" when none is listed
//! - Rates match on exact, case-sensitive code
//! - GDP is derived only when a rate matched; unmatched is silent, not an error
//! - Every produced record carries the same refresh timestamp

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use orbis_domain::{ExchangeRates, MergedCountry, RawCountry};

use crate::multiplier::{clamp_to_range, GdpMultiplier, RandomMultiplier};

/// Estimated GDP for a population at a given rate.
pub fn estimate_gdp(population: u64, multiplier: f64, rate: f64) -> f64 {
    population as f64 * multiplier / rate
}

/// Counters from one merge pass, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Records produced
    pub merged: usize,
    /// Records that matched a rate
    pub with_rate: usize,
    /// Records with no usable currency code or rate
    pub without_rate: usize,
    /// Raw records dropped for having a blank name
    pub skipped: usize,
}

/// Merge engine with an injected multiplier source.
#[derive(Clone)]
pub struct MergeEngine {
    multiplier: Arc<dyn GdpMultiplier>,
}

impl MergeEngine {
    /// Create an engine drawing multipliers from `multiplier`.
    pub fn new(multiplier: Arc<dyn GdpMultiplier>) -> Self {
        Self { multiplier }
    }

    /// Engine using the thread-local RNG.
    pub fn random() -> Self {
        Self::new(Arc::new(RandomMultiplier))
    }

    /// Merge a batch. Output order follows input order.
    pub fn merge(
        &self,
        countries: &[RawCountry],
        rates: &ExchangeRates,
        now: DateTime<Utc>,
    ) -> Vec<MergedCountry> {
        self.merge_with_stats(countries, rates, now).0
    }

    /// Merge a batch and report counters.
    pub fn merge_with_stats(
        &self,
        countries: &[RawCountry],
        rates: &ExchangeRates,
        now: DateTime<Utc>,
    ) -> (Vec<MergedCountry>, MergeStats) {
        let mut stats = MergeStats::default();
        let mut merged = Vec::with_capacity(countries.len());

        for raw in countries {
            if raw.key().is_err() {
                warn!(population = raw.population, "Skipping country with blank name");
                stats.skipped += 1;
                continue;
            }

            let record = self.merge_one(raw, rates, now);
            if record.has_rate() {
                stats.with_rate += 1;
            } else {
                stats.without_rate += 1;
            }
            merged.push(record);
        }

        stats.merged = merged.len();
        debug!(
            merged = stats.merged,
            with_rate = stats.with_rate,
            without_rate = stats.without_rate,
            skipped = stats.skipped,
            "Merge complete"
        );

        (merged, stats)
    }

    /// Merge a single raw country.
    pub fn merge_one(
        &self,
        raw: &RawCountry,
        rates: &ExchangeRates,
        now: DateTime<Utc>,
    ) -> MergedCountry {
        let currency_code = raw.first_currency_code().to_string();

        let (exchange_rate, estimated_gdp) = match rates.rate_for(&currency_code) {
            Some(rate) => {
                let multiplier = clamp_to_range(self.multiplier.sample());
                (Some(rate), Some(estimate_gdp(raw.population, multiplier, rate)))
            },
            None => (None, None),
        };

        MergedCountry {
            name: raw.name.clone(),
            capital: raw.capital.clone(),
            region: raw.region.clone(),
            population: raw.population,
            currency_code,
            exchange_rate,
            estimated_gdp,
            flag_url: raw.flag.clone(),
            last_refreshed_at: now,
        }
    }
}

impl std::fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeEngine").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplier::{FixedMultiplier, GDP_MULTIPLIER_MAX, GDP_MULTIPLIER_MIN};
    use orbis_domain::CurrencyEntry;

    fn raw(name: &str, population: u64, codes: &[&str]) -> RawCountry {
        RawCountry {
            name: name.to_string(),
            capital: format!("{} City", name),
            region: "Testregion".to_string(),
            population,
            flag: format!("https://flags.example/{}.svg", name.to_lowercase()),
            currencies: codes.iter().map(|c| CurrencyEntry::new(*c)).collect(),
        }
    }

    fn fixed(value: f64) -> MergeEngine {
        MergeEngine::new(Arc::new(FixedMultiplier(value)))
    }

    #[test]
    fn test_testland_scenario() {
        let engine = MergeEngine::random();
        let rates = ExchangeRates::from_pairs([("TST", 2.0)]);
        let now = Utc::now();

        let merged = engine.merge(&[raw("Testland", 1000, &["TST"])], &rates, now);

        assert_eq!(merged.len(), 1);
        let record = &merged[0];
        assert_eq!(record.currency_code, "TST");
        assert_eq!(record.exchange_rate, Some(2.0));
        let gdp = record.estimated_gdp.unwrap();
        assert!((500_000.0..1_000_000.0).contains(&gdp), "gdp out of range: {}", gdp);
        assert_eq!(record.last_refreshed_at, now);
    }

    #[test]
    fn test_fixed_multiplier_gives_exact_gdp() {
        let engine = fixed(1500.0);
        let rates = ExchangeRates::from_pairs([("EUR", 0.5)]);

        let merged = engine.merge(&[raw("France", 2000, &["EUR"])], &rates, Utc::now());

        assert_eq!(merged[0].estimated_gdp, Some(2000.0 * 1500.0 / 0.5));
    }

    #[test]
    fn test_empty_currency_list_leaves_optionals_unset() {
        let engine = fixed(1500.0);
        let rates = ExchangeRates::from_pairs([("", 1.0), ("EUR", 1.0)]);

        let merged = engine.merge(&[raw("Antarctica", 1000, &[])], &rates, Utc::now());

        assert_eq!(merged[0].currency_code, "");
        assert_eq!(merged[0].exchange_rate, None);
        assert_eq!(merged[0].estimated_gdp, None);
    }

    #[test]
    fn test_unknown_currency_is_silent() {
        let engine = fixed(1500.0);
        let rates = ExchangeRates::from_pairs([("USD", 1.0)]);

        let merged = engine.merge(&[raw("Atlantis", 10, &["ATL"])], &rates, Utc::now());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].currency_code, "ATL");
        assert!(merged[0].exchange_rate.is_none());
        assert!(merged[0].estimated_gdp.is_none());
    }

    #[test]
    fn test_code_match_is_case_sensitive() {
        let engine = fixed(1500.0);
        let rates = ExchangeRates::from_pairs([("EUR", 1.0)]);

        let merged = engine.merge(&[raw("Lowercase", 10, &["eur"])], &rates, Utc::now());

        assert!(merged[0].exchange_rate.is_none());
    }

    #[test]
    fn test_zero_population_gives_zero_gdp() {
        let engine = fixed(1500.0);
        let rates = ExchangeRates::from_pairs([("EUR", 1.0)]);

        let merged = engine.merge(&[raw("Empty", 0, &["EUR"])], &rates, Utc::now());

        assert_eq!(merged[0].estimated_gdp, Some(0.0));
    }

    #[test]
    fn test_only_first_currency_is_used() {
        let engine = fixed(1000.0);
        let rates = ExchangeRates::from_pairs([("USD", 1.0)]);

        let merged = engine.merge(&[raw("Panama", 100, &["PAB", "USD"])], &rates, Utc::now());

        assert_eq!(merged[0].currency_code, "PAB");
        assert!(merged[0].estimated_gdp.is_none());
    }

    #[test]
    fn test_out_of_range_multiplier_is_clamped() {
        let engine = fixed(5.0);
        let rates = ExchangeRates::from_pairs([("EUR", 1.0)]);

        let merged = engine.merge(&[raw("Low", 1, &["EUR"])], &rates, Utc::now());

        assert_eq!(merged[0].estimated_gdp, Some(GDP_MULTIPLIER_MIN));
    }

    #[test]
    fn test_gdp_defined_iff_rate_defined() {
        let engine = MergeEngine::random();
        let rates = ExchangeRates::from_pairs([("EUR", 0.9), ("JPY", 150.0)]);
        let countries = vec![
            raw("France", 68_000_000, &["EUR"]),
            raw("Japan", 125_000_000, &["JPY"]),
            raw("Nowhere", 5, &["XXX"]),
            raw("Bare", 5, &[]),
        ];

        for record in engine.merge(&countries, &rates, Utc::now()) {
            assert_eq!(record.exchange_rate.is_some(), record.estimated_gdp.is_some());
            if let (Some(rate), Some(gdp)) = (record.exchange_rate, record.estimated_gdp) {
                let multiplier = gdp * rate / record.population as f64;
                assert!(multiplier >= GDP_MULTIPLIER_MIN - 1e-6);
                assert!(multiplier < GDP_MULTIPLIER_MAX + 1e-6);
            }
        }
    }

    #[test]
    fn test_blank_names_are_skipped_and_counted() {
        let engine = fixed(1500.0);
        let rates = ExchangeRates::default();

        let (merged, stats) = engine.merge_with_stats(
            &[raw("  ", 1, &[]), raw("Real", 1, &[])],
            &rates,
            Utc::now(),
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.without_rate, 1);
    }

    #[test]
    fn test_all_records_share_timestamp() {
        let engine = fixed(1500.0);
        let rates = ExchangeRates::from_pairs([("EUR", 1.0)]);
        let now = Utc::now();

        let merged = engine.merge(
            &[raw("A", 1, &["EUR"]), raw("B", 1, &[]), raw("C", 1, &["ZZZ"])],
            &rates,
            now,
        );

        assert!(merged.iter().all(|m| m.last_refreshed_at == now));
    }
}
