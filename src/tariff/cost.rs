//! Cost of an energy series under a tariff.
//!
//! Raw samples are priced at their own timestamp. Hourly and coarser points
//! cover a range, so their energy is spread evenly over 15-minute samples of
//! that range and every sample is priced on its own. A daily point that is one
//! third night zone therefore pays the night price on one third of its energy.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    PriceQuote, PriceSource, PricingMode, SpotPriceFeed, SpotPriceSource, TouPriceSource,
    TouTariffConfig,
};
use crate::domain::{AggregationLevel, ConfigurationError, EnergyPoint, EnergySeries};

/// Resolution at which aggregated points are priced.
pub const PRICE_SAMPLE_MINUTES: i64 = 15;

/// Consumption and cost attributed to one price zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBreakdown {
    pub label: String,
    /// kWh
    pub consumption: f64,
    pub cost: f64,
}

/// Priced series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostResult {
    pub total_cost: f64,
    /// Energy cost
    pub working_cost: f64,
    /// Prorated monthly fee
    pub base_cost: f64,
    /// kWh
    pub total_consumption: f64,
    /// ct/kWh
    pub average_price: f64,
    /// Per-zone split, largest consumption first. TOU mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<ZoneBreakdown>>,
}

impl CostResult {
    /// Total cost minus feed-in revenue.
    pub fn net_cost(&self, feed_in_revenue: f64) -> f64 {
        self.total_cost - feed_in_revenue
    }
}

/// Revenue for the exported energy of `series` at `price_ct` ct/kWh.
pub fn feed_in_revenue(series: &EnergySeries, price_ct: f64) -> f64 {
    series.total_export() * price_ct / 100.0
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .and_then(|first| {
            let next = first.checked_add_months(Months::new(1))?;
            u32::try_from((next - first).num_days()).ok()
        })
        .unwrap_or(30)
}

#[derive(Debug, Default)]
struct ZoneTotals {
    consumption: f64,
    cost_ct: f64,
}

/// Prices series against one tariff.
pub struct CostCalculator<'a> {
    tariff: &'a TouTariffConfig,
    source: Box<dyn PriceSource + 'a>,
}

impl<'a> CostCalculator<'a> {
    /// Pick the price source for the tariff's mode.
    ///
    /// Spot mode needs a feed; TOU mode ignores it.
    pub fn for_tariff(
        tariff: &'a TouTariffConfig,
        spot_feed: Option<&'a dyn SpotPriceFeed>,
    ) -> Result<Self, ConfigurationError> {
        let source: Box<dyn PriceSource + 'a> = match (tariff.mode, spot_feed) {
            (PricingMode::Tou, _) => Box::new(TouPriceSource::new(tariff)),
            (PricingMode::Spot, Some(feed)) => Box::new(SpotPriceSource::new(feed, tariff)),
            (PricingMode::Spot, None) => return Err(ConfigurationError::MissingSpotFeed),
        };
        Ok(Self { tariff, source })
    }

    /// Price samples of one point with the energy each one carries.
    fn price_samples(
        &self,
        point: &EnergyPoint,
        aggregation: AggregationLevel,
    ) -> impl Iterator<Item = (PriceQuote, f64)> + '_ {
        let start = point.timestamp;
        let covered = aggregation.covered_until(start) - start;
        let samples = (covered.num_minutes() / PRICE_SAMPLE_MINUTES).max(1);
        let energy = point.consumption / samples as f64;
        (0..samples).map(move |i| {
            let at = start + Duration::minutes(i * PRICE_SAMPLE_MINUTES);
            (self.source.quote(at), energy)
        })
    }

    pub fn calculate(&self, series: &EnergySeries) -> CostResult {
        let mut zones: HashMap<String, ZoneTotals> = HashMap::new();
        for point in series.points() {
            for (quote, energy) in self.price_samples(point, series.aggregation) {
                let totals = zones.entry(quote.label).or_default();
                totals.consumption += energy;
                totals.cost_ct += energy * quote.price;
            }
        }

        let total_consumption = series.total_consumption();
        let working_ct: f64 = zones.values().map(|z| z.cost_ct).sum();
        let working_cost = working_ct / 100.0;
        let base_cost: f64 = series
            .covered_days()
            .into_iter()
            .map(|day| self.tariff.base_price / f64::from(days_in_month(day)))
            .sum();
        let average_price = if total_consumption > 0.0 {
            working_ct / total_consumption
        } else {
            self.tariff.standard_price
        };

        let zones = match self.tariff.mode {
            PricingMode::Tou => {
                let mut breakdown: Vec<ZoneBreakdown> = zones
                    .into_iter()
                    .map(|(label, totals)| ZoneBreakdown {
                        label,
                        consumption: totals.consumption,
                        cost: totals.cost_ct / 100.0,
                    })
                    .collect();
                breakdown.sort_by(|a, b| {
                    b.consumption
                        .total_cmp(&a.consumption)
                        .then_with(|| a.label.cmp(&b.label))
                });
                Some(breakdown)
            }
            PricingMode::Spot => None,
        };

        debug!(
            mode = %self.tariff.mode,
            points = series.len(),
            working_cost,
            base_cost,
            "series priced"
        );

        CostResult {
            total_cost: working_cost + base_cost,
            working_cost,
            base_cost,
            total_consumption,
            average_price,
            zones,
        }
    }

    /// Revenue at the tariff's feed-in price, zero when none is configured.
    pub fn feed_in_revenue(&self, series: &EnergySeries) -> f64 {
        self.tariff
            .feed_in_price
            .map_or(0.0, |price| feed_in_revenue(series, price))
    }
}

/// Baseline vs. scenario cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComparison {
    pub baseline_cost: f64,
    pub scenario_cost: f64,
    /// Positive when the scenario is cheaper
    pub savings: f64,
    /// Savings relative to the baseline (%), zero for a free baseline
    pub savings_percent: f64,
    /// Scenario minus baseline grid import (kWh)
    pub consumption_delta: f64,
}

impl CostComparison {
    pub fn between(baseline: &CostResult, scenario: &CostResult) -> Self {
        let savings = baseline.total_cost - scenario.total_cost;
        let savings_percent = if baseline.total_cost.abs() > f64::EPSILON {
            savings / baseline.total_cost * 100.0
        } else {
            0.0
        };
        Self {
            baseline_cost: baseline.total_cost,
            scenario_cost: scenario.total_cost,
            savings,
            savings_percent,
            consumption_delta: scenario.total_consumption - baseline.total_consumption,
        }
    }
}
