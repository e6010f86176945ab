//! # Solar Production Simulation
//!
//! Models a rooftop PV array from a fixed daily yield and a bell-shaped hourly
//! production curve.
//!
//! Production first covers the household's own import (self-consumption);
//! whatever is left is exported. Period levels apply the daily yield scaled by
//! the period length without an hourly shape.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;
use validator::Validate;

use super::{CumulativeAdjustment, EnergyTransform, SimulationStage};
use crate::domain::{AggregationLevel, EnergyPoint, EnergySeries};

/// Equivalent full-load sun hours per day when none are configured.
pub const DEFAULT_SUN_HOURS_PER_DAY: f64 = 4.5;

/// Share of a day's production per hour of day. Zero outside 05:00-19:59.
pub const HOURLY_PRODUCTION_CURVE: [f64; 24] = [
    0.0, 0.0, 0.0, 0.0, 0.0, // 00-04
    0.01, 0.03, 0.05, 0.08, 0.10, // 05-09
    0.11, 0.12, 0.12, 0.11, 0.09, // 10-14
    0.07, 0.05, 0.03, 0.02, 0.01, // 15-19
    0.0, 0.0, 0.0, 0.0, // 20-23
];

/// Normalised production share of `hour` (0-23).
pub fn hourly_fraction(hour: u32) -> f64 {
    let total: f64 = HOURLY_PRODUCTION_CURVE.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    HOURLY_PRODUCTION_CURVE
        .get(hour as usize)
        .map_or(0.0, |share| share / total)
}

/// Array orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Orientation {
    South,
    East,
    West,
    EastWest,
}

impl Orientation {
    /// Yield relative to a south-facing array.
    pub fn efficiency(&self) -> f64 {
        match self {
            Orientation::South => 1.0,
            Orientation::East | Orientation::West => 0.8,
            Orientation::EastWest => 0.85,
        }
    }
}

/// Solar simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SolarSimulationConfig {
    /// Installed peak power (kWp)
    #[validate(range(min = 0.0))]
    pub peak_power: f64,
    pub orientation: Orientation,
    /// Inverter AC rating (kW)
    #[validate(range(min = 0.0))]
    pub inverter_power: Option<f64>,
    #[validate(range(min = 0.0, max = 24.0))]
    pub sun_hours_per_day: Option<f64>,
}

impl SolarSimulationConfig {
    pub fn sun_hours(&self) -> f64 {
        self.sun_hours_per_day.unwrap_or(DEFAULT_SUN_HOURS_PER_DAY)
    }

    /// Expected production per day (kWh), clipped by the inverter.
    pub fn daily_production_kwh(&self) -> f64 {
        let sun_hours = self.sun_hours();
        let array = self.peak_power * sun_hours * self.orientation.efficiency();
        match self.inverter_power {
            Some(inverter) => array.min(inverter * sun_hours),
            None => array,
        }
    }
}

/// How one point's production splits between the house and the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarSplit {
    pub production_kwh: f64,
    pub self_consumption_kwh: f64,
    pub excess_kwh: f64,
}

impl SolarSplit {
    pub fn new(production_kwh: f64, consumption_kwh: f64) -> Self {
        let self_consumption_kwh = production_kwh.min(consumption_kwh.max(0.0));
        Self {
            production_kwh,
            self_consumption_kwh,
            excess_kwh: production_kwh - self_consumption_kwh,
        }
    }
}

/// Removes self-consumed PV production from import and exports the excess.
#[derive(Debug, Clone)]
pub struct SolarSimulator {
    config: SolarSimulationConfig,
}

impl SolarSimulator {
    pub fn new(config: SolarSimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolarSimulationConfig {
        &self.config
    }

    /// Production attributed to each point of `series` (kWh).
    pub fn production_profile(&self, series: &EnergySeries) -> Vec<f64> {
        let daily = self.config.daily_production_kwh();
        match series.aggregation {
            AggregationLevel::Raw | AggregationLevel::Hour => series
                .points()
                .iter()
                .zip(series.interval_hours())
                .map(|(point, hours)| daily * hourly_fraction(point.timestamp.hour()) * hours)
                .collect(),
            AggregationLevel::Day
            | AggregationLevel::Weekday
            | AggregationLevel::Week
            | AggregationLevel::CalendarWeek
            | AggregationLevel::Month
            | AggregationLevel::Year => {
                let days = series.aggregation.period_days().unwrap_or(1.0);
                vec![daily * days; series.len()]
            }
        }
    }

    /// Production split for every point of `series`.
    pub fn splits(&self, series: &EnergySeries) -> Vec<SolarSplit> {
        series
            .points()
            .iter()
            .zip(self.production_profile(series))
            .map(|(point, production)| SolarSplit::new(production, point.consumption))
            .collect()
    }
}

impl EnergyTransform for SolarSimulator {
    fn stage(&self) -> SimulationStage {
        SimulationStage::Solar
    }

    fn apply(&self, series: &EnergySeries) -> EnergySeries {
        if series.is_empty() {
            return series.clone();
        }

        let points: Vec<EnergyPoint> = series
            .points()
            .iter()
            .zip(self.splits(series))
            .scan(CumulativeAdjustment::default(), |adjustment, (point, split)| {
                Some(adjustment.apply(point, -split.self_consumption_kwh, split.excess_kwh))
            })
            .collect();

        let result = series.with_points(points);
        debug!(
            aggregation = %series.aggregation,
            daily_production_kwh = self.config.daily_production_kwh(),
            self_consumed_kwh = series.total_consumption() - result.total_consumption(),
            exported_kwh = result.total_export() - series.total_export(),
            "solar production simulated"
        );
        result
    }
}
