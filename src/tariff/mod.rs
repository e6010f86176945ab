//! # Tariff Costing
//!
//! Prices an energy series under a time-of-use or spot-market tariff.
//!
//! ## Components
//!
//! - **TouTariffConfig**: base fee, standard price, weekly price zones and mode
//! - **PriceSource**: per-timestamp price lookup (TOU zones or spot feed)
//! - **CostCalculator**: working cost, prorated base cost and zone breakdown
//! - **CostComparison**: baseline vs. scenario deltas
//!
//! Energy prices are in ct/kWh, the base price in currency units per month,
//! and every cost figure in currency units.

pub mod cost;
pub mod price;

pub use cost::{feed_in_revenue, CostCalculator, CostComparison, CostResult, ZoneBreakdown};
pub use price::{
    PriceQuote, PriceSource, SpotPriceFeed, SpotPriceSource, StaticSpotPrices, TouPriceSource,
    SPOT_LABEL, STANDARD_ZONE_LABEL,
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use crate::domain::{TimeOfDay, TimeSlot, WeeklySchedule};

/// How the per-kWh price is determined.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PricingMode {
    /// Fixed prices per time-of-day zone
    #[default]
    Tou,
    /// Hourly market price plus a flat markup
    Spot,
}

/// A time-of-day window with its own working price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceZone {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    /// Working price (ct/kWh)
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PriceZone {
    /// Configured label, or the window itself ("22:00-06:00") when unnamed.
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| TimeSlot::label(self))
    }
}

impl TimeSlot for PriceZone {
    fn start(&self) -> TimeOfDay {
        self.start
    }
    fn end(&self) -> TimeOfDay {
        self.end
    }
}

/// Tariff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TouTariffConfig {
    /// Monthly base fee
    #[validate(range(min = 0.0))]
    pub base_price: f64,
    /// Working price outside every zone (ct/kWh)
    #[validate(range(min = 0.0))]
    pub standard_price: f64,
    #[serde(default)]
    pub zones: WeeklySchedule<PriceZone>,
    #[serde(default)]
    pub mode: PricingMode,
    /// Added to the spot price (ct/kWh)
    #[serde(default)]
    pub spot_markup: f64,
    /// Feed-in compensation (ct/kWh)
    #[validate(range(min = 0.0))]
    pub feed_in_price: Option<f64>,
}
