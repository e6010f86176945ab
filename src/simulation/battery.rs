//! # Battery Storage Simulation
//!
//! Shifts exported energy into later import through a home battery.
//!
//! Each interval first charges from export, then uses the remaining power
//! budget to discharge into import. The battery only sees export that already
//! exists in the series, so it has to run after the solar stage.

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use super::{CumulativeAdjustment, EnergyTransform, SimulationStage};
use crate::domain::{AggregationLevel, EnergyPoint, EnergySeries};

/// Battery simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BatterySimulationConfig {
    /// Usable capacity (kWh)
    #[validate(range(min = 0.0))]
    pub capacity_kwh: f64,
    /// Charge/discharge power limit (kW)
    #[validate(range(min = 0.0))]
    pub max_power_kw: f64,
    /// State of charge at the start of the series (0-100%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub initial_soc_percent: Option<f64>,
    /// Fraction of charged energy that can be discharged again (0-1)
    #[validate(range(min = 0.0, max = 1.0))]
    pub round_trip_efficiency: Option<f64>,
}

impl BatterySimulationConfig {
    pub fn initial_charge_kwh(&self) -> f64 {
        let soc = self.initial_soc_percent.unwrap_or(0.0).clamp(0.0, 100.0);
        self.capacity_kwh * soc / 100.0
    }

    pub fn efficiency(&self) -> f64 {
        self.round_trip_efficiency.unwrap_or(1.0).clamp(0.0, 1.0)
    }
}

/// Energy moved through the battery in one interval.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatteryStep {
    /// Taken from export (kWh)
    pub charged_kwh: f64,
    /// Delivered to import (kWh)
    pub discharged_kwh: f64,
    /// Stored energy after the step (kWh)
    pub charge_after_kwh: f64,
}

/// Time-shifts excess production through a home battery.
#[derive(Debug, Clone)]
pub struct BatterySimulator {
    config: BatterySimulationConfig,
}

impl BatterySimulator {
    pub fn new(config: BatterySimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatterySimulationConfig {
        &self.config
    }

    /// One interval of charge-then-discharge starting from `charge_kwh`.
    pub fn step(&self, charge_kwh: f64, export_kwh: f64, import_kwh: f64, hours: f64) -> BatteryStep {
        let capacity = self.config.capacity_kwh;
        let efficiency = self.config.efficiency();
        let mut budget = (self.config.max_power_kw * hours).max(0.0);
        let mut charge = charge_kwh.clamp(0.0, capacity);

        let headroom = capacity - charge;
        let max_intake = if efficiency > 0.0 { headroom / efficiency } else { 0.0 };
        let charged = export_kwh.max(0.0).min(budget).min(max_intake);
        budget -= charged;
        charge = (charge + charged * efficiency).min(capacity);

        let discharged = import_kwh.max(0.0).min(budget).min(charge);
        charge = (charge - discharged).max(0.0);

        BatteryStep {
            charged_kwh: charged,
            discharged_kwh: discharged,
            charge_after_kwh: charge,
        }
    }

    /// Per-interval steps for raw and hourly series.
    ///
    /// Period levels carry no charge between points and yield an empty vector.
    pub fn steps(&self, series: &EnergySeries) -> Vec<BatteryStep> {
        match series.aggregation {
            AggregationLevel::Raw | AggregationLevel::Hour => series
                .points()
                .iter()
                .zip(series.interval_hours())
                .scan(self.config.initial_charge_kwh(), |charge, (point, hours)| {
                    let step = self.step(*charge, point.export_kwh(), point.consumption, hours);
                    *charge = step.charge_after_kwh;
                    Some(step)
                })
                .collect(),
            AggregationLevel::Day
            | AggregationLevel::Weekday
            | AggregationLevel::Week
            | AggregationLevel::CalendarWeek
            | AggregationLevel::Month
            | AggregationLevel::Year => Vec::new(),
        }
    }

    /// Period heuristic: one full cycle per day, no rate limit.
    fn period_step(&self, point: &EnergyPoint, days: f64) -> BatteryStep {
        let cycle_capacity = self.config.capacity_kwh * days;
        let charged = cycle_capacity.min(point.export_kwh().max(0.0));
        let discharged = (charged * self.config.efficiency()).min(point.consumption.max(0.0));
        BatteryStep {
            charged_kwh: charged,
            discharged_kwh: discharged,
            charge_after_kwh: 0.0,
        }
    }

    fn period_steps(&self, series: &EnergySeries) -> Vec<BatteryStep> {
        let days = series.aggregation.period_days().unwrap_or(1.0);
        series
            .points()
            .iter()
            .map(|point| self.period_step(point, days))
            .collect()
    }
}

impl EnergyTransform for BatterySimulator {
    fn stage(&self) -> SimulationStage {
        SimulationStage::Battery
    }

    fn apply(&self, series: &EnergySeries) -> EnergySeries {
        if series.is_empty() {
            return series.clone();
        }

        let steps = match series.aggregation {
            AggregationLevel::Raw | AggregationLevel::Hour => self.steps(series),
            AggregationLevel::Day
            | AggregationLevel::Weekday
            | AggregationLevel::Week
            | AggregationLevel::CalendarWeek
            | AggregationLevel::Month
            | AggregationLevel::Year => self.period_steps(series),
        };

        let mut adjustment = CumulativeAdjustment::default();
        let points = series
            .points()
            .iter()
            .zip(&steps)
            .map(|(point, step)| adjustment.apply(point, -step.discharged_kwh, -step.charged_kwh))
            .collect();

        let result = series.with_points(points);
        debug!(
            aggregation = %series.aggregation,
            charged_kwh = steps.iter().map(|s| s.charged_kwh).sum::<f64>(),
            discharged_kwh = steps.iter().map(|s| s.discharged_kwh).sum::<f64>(),
            "battery storage simulated"
        );
        result
    }
}
