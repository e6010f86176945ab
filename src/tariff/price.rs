//! Per-timestamp price lookup.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::TouTariffConfig;

/// Label of the fallback price outside every zone.
pub const STANDARD_ZONE_LABEL: &str = "Standard";
/// Label of prices taken from the spot feed.
pub const SPOT_LABEL: &str = "Spot";

/// Working price in force at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub label: String,
    /// ct/kWh
    pub price: f64,
}

impl PriceQuote {
    pub fn new(label: impl Into<String>, price: f64) -> Self {
        Self {
            label: label.into(),
            price,
        }
    }
}

/// Anything that can price a timestamp.
pub trait PriceSource {
    fn quote(&self, timestamp: NaiveDateTime) -> PriceQuote;
}

/// Weekday zones, then default zones, then the standard price.
#[derive(Debug, Clone)]
pub struct TouPriceSource<'a> {
    tariff: &'a TouTariffConfig,
}

impl<'a> TouPriceSource<'a> {
    pub fn new(tariff: &'a TouTariffConfig) -> Self {
        Self { tariff }
    }
}

impl PriceSource for TouPriceSource<'_> {
    fn quote(&self, timestamp: NaiveDateTime) -> PriceQuote {
        match self.tariff.zones.resolve(timestamp) {
            Some(zone) => PriceQuote::new(zone.display_label(), zone.price),
            None => PriceQuote::new(STANDARD_ZONE_LABEL, self.tariff.standard_price),
        }
    }
}

/// External market price source (ct/kWh, without markup).
#[cfg_attr(test, mockall::automock)]
pub trait SpotPriceFeed {
    fn spot_price(&self, timestamp: NaiveDateTime) -> Option<f64>;
}

/// Spot price plus markup; hours the feed does not know cost the standard price.
pub struct SpotPriceSource<'a> {
    feed: &'a dyn SpotPriceFeed,
    markup: f64,
    fallback_price: f64,
}

impl<'a> SpotPriceSource<'a> {
    pub fn new(feed: &'a dyn SpotPriceFeed, tariff: &TouTariffConfig) -> Self {
        Self {
            feed,
            markup: tariff.spot_markup,
            fallback_price: tariff.standard_price,
        }
    }
}

impl PriceSource for SpotPriceSource<'_> {
    fn quote(&self, timestamp: NaiveDateTime) -> PriceQuote {
        match self.feed.spot_price(timestamp) {
            Some(price) => PriceQuote::new(SPOT_LABEL, price + self.markup),
            None => PriceQuote::new(STANDARD_ZONE_LABEL, self.fallback_price),
        }
    }
}

/// One hourly market price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotPricePoint {
    /// Start of the hour the price applies to
    pub timestamp: NaiveDateTime,
    /// ct/kWh
    pub price: f64,
}

/// In-memory hourly spot prices.
#[derive(Debug, Clone, Default)]
pub struct StaticSpotPrices {
    prices: BTreeMap<NaiveDateTime, f64>,
}

impl StaticSpotPrices {
    pub fn from_points(points: impl IntoIterator<Item = SpotPricePoint>) -> Self {
        let prices = points
            .into_iter()
            .filter_map(|p| Some((start_of_hour(p.timestamp)?, p.price)))
            .collect();
        Self { prices }
    }

    /// Parse a JSON array of `{ "timestamp": ..., "price": ... }` objects.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let points: Vec<SpotPricePoint> = serde_json::from_str(raw)?;
        Ok(Self::from_points(points))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl SpotPriceFeed for StaticSpotPrices {
    fn spot_price(&self, timestamp: NaiveDateTime) -> Option<f64> {
        self.prices.get(&start_of_hour(timestamp)?).copied()
    }
}

fn start_of_hour(t: NaiveDateTime) -> Option<NaiveDateTime> {
    t.with_minute(0)?.with_second(0)?.with_nanosecond(0)
}
