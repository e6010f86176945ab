//! # Heat Pump Simulation
//!
//! Adds the electrical load of heating the house with a heat pump.
//!
//! Heat demand follows a steady-state loss model: the nameplate power is
//! sized to cover 80% of the peak load at a 21 K design difference, which
//! fixes the building's loss coefficient. Outdoor temperature comes from a
//! fixed monthly table so results are deterministic and need no weather data.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;
use validator::Validate;

use super::{CumulativeAdjustment, EnergyTransform, SimulationStage};
use crate::domain::{AggregationLevel, EnergyPoint, EnergySeries, TimeOfDay, TimeSlot, WeeklySchedule};

/// Mean outdoor temperature per month (°C), January first.
pub const MONTHLY_OUTDOOR_TEMP_C: [f64; 12] =
    [0.5, 1.5, 5.0, 9.0, 13.5, 16.5, 18.5, 18.0, 14.5, 10.0, 5.0, 1.5];

/// Share of peak heat load the nameplate power is sized for.
pub const DESIGN_LOAD_FRACTION: f64 = 0.8;
/// Indoor/outdoor difference at the design point (K).
pub const DESIGN_TEMPERATURE_DELTA_C: f64 = 21.0;
/// Target used for period averages when no heating slot exists.
pub const DEFAULT_TARGET_TEMPERATURE_C: f64 = 20.0;

/// Outdoor temperature for a calendar month (1-12).
pub fn outdoor_temperature(month: u32) -> f64 {
    let index = month.clamp(1, 12) as usize - 1;
    MONTHLY_OUTDOOR_TEMP_C[index]
}

pub fn annual_mean_outdoor_temperature() -> f64 {
    MONTHLY_OUTDOOR_TEMP_C.iter().sum::<f64>() / MONTHLY_OUTDOOR_TEMP_C.len() as f64
}

/// Heat source of the pump, which sets its coefficient of performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HeatSource {
    /// Ground probe (vertical borehole)
    Probe,
    /// Horizontal ground collector
    Collector,
}

impl HeatSource {
    pub fn cop(&self) -> f64 {
        match self {
            HeatSource::Probe => 4.5,
            HeatSource::Collector => 4.0,
        }
    }
}

/// Heating window with its indoor target temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatingSlot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    /// Indoor target (°C)
    pub target_temperature: f64,
}

impl TimeSlot for HeatingSlot {
    fn start(&self) -> TimeOfDay {
        self.start
    }
    fn end(&self) -> TimeOfDay {
        self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct HeatPumpSimulationConfig {
    pub source: HeatSource,
    /// Nameplate heating power (kW)
    #[validate(range(min = 0.0))]
    pub power_kw: f64,
    /// Buffer tank volume (l). Accepted for completeness, not part of the load model.
    #[validate(range(min = 0.0))]
    pub buffer_liter: Option<f64>,
    #[serde(default)]
    pub heating_schedule: WeeklySchedule<HeatingSlot>,
}

impl HeatPumpSimulationConfig {
    /// Building heat loss per kelvin (kW/K).
    pub fn heat_loss_coefficient(&self) -> f64 {
        self.power_kw * DESIGN_LOAD_FRACTION / DESIGN_TEMPERATURE_DELTA_C
    }

    /// Electricity needed to hold `target_c` against `outdoor_c` for `hours`.
    pub fn electrical_draw_kwh(&self, target_c: f64, outdoor_c: f64, hours: f64) -> f64 {
        let heat_demand = (target_c - outdoor_c).max(0.0) * self.heat_loss_coefficient() * hours;
        heat_demand.min(self.power_kw * hours) / self.source.cop()
    }
}

/// Duration-weighted mean target over `slots`, `None` when they cover no time.
fn weighted_target_temperature<'a>(slots: impl Iterator<Item = &'a HeatingSlot>) -> Option<f64> {
    let (weighted, minutes) = slots.fold((0.0, 0u32), |(weighted, minutes), slot| {
        let duration = slot.duration_minutes();
        (
            weighted + slot.target_temperature * duration as f64,
            minutes + duration,
        )
    });
    (minutes > 0).then(|| weighted / minutes as f64)
}

/// Adds heat pump load to a series.
#[derive(Debug, Clone)]
pub struct HeatPumpSimulator {
    config: HeatPumpSimulationConfig,
}

impl HeatPumpSimulator {
    pub fn new(config: HeatPumpSimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeatPumpSimulationConfig {
        &self.config
    }

    fn simulate_intervals(&self, series: &EnergySeries) -> Vec<EnergyPoint> {
        let schedule = &self.config.heating_schedule;

        series
            .points()
            .iter()
            .zip(series.interval_hours())
            .scan(CumulativeAdjustment::default(), |adjustment, (point, hours)| {
                let draw = schedule
                    .resolve(point.timestamp)
                    .map(|slot| {
                        let outdoor = outdoor_temperature(point.timestamp.month());
                        self.config
                            .electrical_draw_kwh(slot.target_temperature, outdoor, hours)
                    })
                    .unwrap_or(0.0);
                Some(adjustment.apply(point, draw, 0.0))
            })
            .collect()
    }

    fn simulate_periods(&self, series: &EnergySeries) -> Vec<EnergyPoint> {
        let days = series.aggregation.period_days().unwrap_or(1.0);
        let mut adjustment = CumulativeAdjustment::default();

        series
            .points()
            .iter()
            .map(|point| {
                let draw = self.daily_draw_kwh(series.aggregation, point.timestamp) * days;
                adjustment.apply(point, draw, 0.0)
            })
            .collect()
    }

    /// Average electricity per day for a period point starting at `timestamp`.
    fn daily_draw_kwh(&self, level: AggregationLevel, timestamp: NaiveDateTime) -> f64 {
        let schedule = &self.config.heating_schedule;
        let (target, hours, outdoor) = match level {
            AggregationLevel::Day | AggregationLevel::Weekday => {
                let slots = schedule.slots_for(timestamp.weekday());
                (
                    weighted_target_temperature(slots.iter()),
                    schedule.daily_hours(timestamp.weekday()),
                    outdoor_temperature(timestamp.month()),
                )
            }
            AggregationLevel::Week
            | AggregationLevel::CalendarWeek
            | AggregationLevel::Month
            | AggregationLevel::Raw
            | AggregationLevel::Hour => (
                weighted_target_temperature(schedule.week_slots()),
                schedule.average_daily_hours(),
                outdoor_temperature(timestamp.month()),
            ),
            AggregationLevel::Year => (
                weighted_target_temperature(schedule.week_slots()),
                schedule.average_daily_hours(),
                annual_mean_outdoor_temperature(),
            ),
        };

        self.config.electrical_draw_kwh(
            target.unwrap_or(DEFAULT_TARGET_TEMPERATURE_C),
            outdoor,
            hours,
        )
    }
}

impl EnergyTransform for HeatPumpSimulator {
    fn stage(&self) -> SimulationStage {
        SimulationStage::HeatPump
    }

    fn apply(&self, series: &EnergySeries) -> EnergySeries {
        if series.is_empty() {
            return series.clone();
        }

        let points = match series.aggregation {
            AggregationLevel::Raw | AggregationLevel::Hour => self.simulate_intervals(series),
            AggregationLevel::Day
            | AggregationLevel::Weekday
            | AggregationLevel::Week
            | AggregationLevel::CalendarWeek
            | AggregationLevel::Month
            | AggregationLevel::Year => self.simulate_periods(series),
        };

        let result = series.with_points(points);
        debug!(
            aggregation = %series.aggregation,
            source = %self.config.source,
            added_kwh = result.total_consumption() - series.total_consumption(),
            "heat pump load simulated"
        );
        result
    }
}
