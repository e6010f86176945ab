//! # EV Charging Simulation
//!
//! Adds the load of charging an electric vehicle at home.
//!
//! ## Model
//!
//! - **Interval levels** (raw, hour): a charge state machine. Inside a
//!   charging window the car draws `charger power × interval` until it reaches
//!   80% of capacity. Leaving a window means the car drove off, which costs one
//!   day of driving energy.
//! - **Period levels** (day and coarser): a capacity-bounded average. Per day
//!   the car takes the smallest of what the windows can deliver, the charge
//!   target and the daily driving need. The driving cap keeps period totals in
//!   line with the interval model, where a car that never drives never needs
//!   recharging; with zero driving the period models add no load.
//!
//! A single-day series starts from the charge left after that day's driving,
//! assuming the previous night topped the car up. Rendering a full charge at
//! the start of every day view would otherwise overstate the load.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;
use validator::Validate;

use super::{CumulativeAdjustment, EnergyTransform, SimulationStage};
use crate::domain::{AggregationLevel, EnergyPoint, EnergySeries, ScheduleSlot, WeeklySchedule};

/// Fraction of battery capacity the car is charged to.
pub const TARGET_CHARGE_FRACTION: f64 = 0.8;
/// Daily distance assumed when the user has not entered one.
pub const DEFAULT_DAILY_DRIVING_KM: f64 = 40.0;
/// Vehicle consumption assumed when the user has not entered one.
pub const DEFAULT_CONSUMPTION_KWH_PER_100KM: f64 = 18.0;

/// Wallbox rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum ChargingSpeed {
    #[serde(rename = "7kw")]
    #[strum(serialize = "7kw")]
    Kw7,
    #[serde(rename = "11kw")]
    #[strum(serialize = "11kw")]
    Kw11,
}

impl ChargingSpeed {
    pub fn power_kw(&self) -> f64 {
        match self {
            ChargingSpeed::Kw7 => 7.0,
            ChargingSpeed::Kw11 => 11.0,
        }
    }
}

/// EV simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EvSimulationConfig {
    pub charging_speed: ChargingSpeed,
    /// Usable battery capacity (kWh)
    #[validate(range(min = 0.0))]
    pub ev_capacity_kwh: f64,
    /// Distance driven per day (km)
    #[validate(range(min = 0.0))]
    pub daily_driving_distance_km: Option<f64>,
    /// Vehicle consumption (kWh/100km)
    #[validate(range(min = 0.0))]
    pub avg_consumption_per_100km: Option<f64>,
    #[serde(default)]
    pub charging_schedule: WeeklySchedule<ScheduleSlot>,
}

impl EvSimulationConfig {
    pub fn target_charge_kwh(&self) -> f64 {
        self.ev_capacity_kwh * TARGET_CHARGE_FRACTION
    }

    pub fn charger_power_kw(&self) -> f64 {
        self.charging_speed.power_kw()
    }

    /// Energy one day of driving takes out of the battery.
    pub fn daily_driving_kwh(&self) -> f64 {
        let km = self.daily_driving_distance_km.unwrap_or(DEFAULT_DAILY_DRIVING_KM);
        let per_100 = self
            .avg_consumption_per_100km
            .unwrap_or(DEFAULT_CONSUMPTION_KWH_PER_100KM);
        km / 100.0 * per_100
    }
}

/// Charge state threaded through the interval fold.
#[derive(Debug, Clone, Copy)]
struct ChargeState {
    charge_kwh: f64,
    in_window: bool,
    adjustment: CumulativeAdjustment,
}

/// Adds EV charging load to a series.
#[derive(Debug, Clone)]
pub struct EvSimulator {
    config: EvSimulationConfig,
}

impl EvSimulator {
    pub fn new(config: EvSimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvSimulationConfig {
        &self.config
    }

    /// Battery charge after each point, for interval-level series.
    ///
    /// Period levels do not track charge, so they yield an empty profile.
    pub fn charge_profile(&self, series: &EnergySeries) -> Vec<f64> {
        match series.aggregation {
            AggregationLevel::Raw | AggregationLevel::Hour => self
                .simulate_intervals(series)
                .into_iter()
                .map(|(_, charge)| charge)
                .collect(),
            AggregationLevel::Day
            | AggregationLevel::Weekday
            | AggregationLevel::Week
            | AggregationLevel::CalendarWeek
            | AggregationLevel::Month
            | AggregationLevel::Year => Vec::new(),
        }
    }

    /// Charge the car holds at the first point of the series.
    fn initial_charge_kwh(&self, series: &EnergySeries) -> f64 {
        let target = self.config.target_charge_kwh();
        if series.is_single_day() {
            (target - self.config.daily_driving_kwh()).max(0.0)
        } else {
            target
        }
    }

    fn simulate_intervals(&self, series: &EnergySeries) -> Vec<(EnergyPoint, f64)> {
        let target = self.config.target_charge_kwh();
        let power = self.config.charger_power_kw();
        let driving = self.config.daily_driving_kwh();
        // The back-computed start already accounts for the day's driving.
        let discharges = !series.is_single_day() && driving > 0.0;

        let start = ChargeState {
            charge_kwh: self.initial_charge_kwh(series),
            // A series starting outside every window begins with a departure.
            in_window: true,
            adjustment: CumulativeAdjustment::default(),
        };

        series
            .points()
            .iter()
            .zip(series.interval_hours())
            .scan(start, |state, (point, hours)| {
                let in_window = self.config.charging_schedule.resolve(point.timestamp).is_some();
                if state.in_window && !in_window && discharges {
                    state.charge_kwh = (state.charge_kwh - driving).max(0.0);
                }
                state.in_window = in_window;

                let added = if in_window && state.charge_kwh < target {
                    (power * hours).min(target - state.charge_kwh)
                } else {
                    0.0
                };
                state.charge_kwh += added;

                Some((state.adjustment.apply(point, added, 0.0), state.charge_kwh))
            })
            .collect()
    }

    fn simulate_periods(&self, series: &EnergySeries) -> Vec<EnergyPoint> {
        let days = series.aggregation.period_days().unwrap_or(1.0);
        let schedule = &self.config.charging_schedule;
        let mut adjustment = CumulativeAdjustment::default();

        series
            .points()
            .iter()
            .map(|point| {
                let window_hours = match series.aggregation {
                    AggregationLevel::Day | AggregationLevel::Weekday => {
                        schedule.daily_hours(point.timestamp.weekday())
                    }
                    AggregationLevel::Raw
                    | AggregationLevel::Hour
                    | AggregationLevel::Week
                    | AggregationLevel::CalendarWeek
                    | AggregationLevel::Month
                    | AggregationLevel::Year => schedule.average_daily_hours(),
                };
                let added = self.daily_charge_kwh(window_hours) * days;
                adjustment.apply(point, added, 0.0)
            })
            .collect()
    }

    /// Energy charged on an average day with `window_hours` of charging time.
    fn daily_charge_kwh(&self, window_hours: f64) -> f64 {
        (window_hours * self.config.charger_power_kw())
            .min(self.config.target_charge_kwh())
            .min(self.config.daily_driving_kwh())
    }
}

impl EnergyTransform for EvSimulator {
    fn stage(&self) -> SimulationStage {
        SimulationStage::Ev
    }

    fn apply(&self, series: &EnergySeries) -> EnergySeries {
        if series.is_empty() {
            return series.clone();
        }

        let points = match series.aggregation {
            AggregationLevel::Raw | AggregationLevel::Hour => self
                .simulate_intervals(series)
                .into_iter()
                .map(|(point, _)| point)
                .collect(),
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
            points = result.len(),
            added_kwh = result.total_consumption() - series.total_consumption(),
            "EV charging simulated"
        );
        result
    }
}
