#![allow(dead_code)]
//! Shared fixtures for the simulation integration tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use home_energy_sim::domain::{
    AggregationLevel, EnergyPoint, EnergySeries, ScheduleSlot, TimeOfDay, WeeklySchedule,
};
use home_energy_sim::simulation::{
    BatterySimulationConfig, ChargingSpeed, EvSimulationConfig, HeatPumpSimulationConfig,
    HeatSource, HeatingSlot, Orientation, SolarSimulationConfig,
};
use home_energy_sim::tariff::{PriceZone, PricingMode, TouTariffConfig};

pub const SENSOR_ID: i64 = 42;

/// Monday 2024-06-03 00:00
pub fn monday() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Hourly series with one `(consumption, export)` pair per hour from `start`.
pub fn hourly(start: NaiveDateTime, values: &[(f64, f64)]) -> EnergySeries {
    let mut meter_in = 1000.0;
    let mut meter_out = 200.0;
    let points = values
        .iter()
        .enumerate()
        .map(|(i, (consumption, export))| {
            meter_in += consumption;
            meter_out += export;
            EnergyPoint::new(
                i as i64,
                SENSOR_ID,
                start + Duration::hours(i as i64),
                meter_in,
                *consumption,
            )
            .with_export(*export, meter_out)
        })
        .collect();
    EnergySeries::new(SENSOR_ID, AggregationLevel::Hour, points).unwrap()
}

/// Hourly series of constant import and no export.
pub fn flat_hourly(start: NaiveDateTime, hours: usize, consumption: f64) -> EnergySeries {
    hourly(start, &vec![(consumption, 0.0); hours])
}

/// One point per day at `aggregation` level.
pub fn daily(start: NaiveDateTime, days: usize, consumption: f64) -> EnergySeries {
    let points = (0..days)
        .map(|i| {
            EnergyPoint::new(
                i as i64,
                SENSOR_ID,
                start + Duration::days(i as i64),
                consumption * (i + 1) as f64,
                consumption,
            )
        })
        .collect();
    EnergySeries::new(SENSOR_ID, AggregationLevel::Day, points).unwrap()
}

pub fn time(s: &str) -> TimeOfDay {
    TimeOfDay::parse(s).unwrap()
}

pub fn ev() -> EvSimulationConfig {
    EvSimulationConfig {
        charging_speed: ChargingSpeed::Kw11,
        ev_capacity_kwh: 60.0,
        daily_driving_distance_km: None,
        avg_consumption_per_100km: None,
        charging_schedule: WeeklySchedule::new(vec![ScheduleSlot::new("22:00", "06:00").unwrap()]),
    }
}

pub fn heat_pump() -> HeatPumpSimulationConfig {
    HeatPumpSimulationConfig {
        source: HeatSource::Probe,
        power_kw: 9.0,
        buffer_liter: None,
        heating_schedule: WeeklySchedule::new(vec![HeatingSlot {
            start: time("06:00"),
            end: time("22:00"),
            target_temperature: 21.0,
        }]),
    }
}

pub fn solar() -> SolarSimulationConfig {
    SolarSimulationConfig {
        peak_power: 10.0,
        orientation: Orientation::South,
        inverter_power: None,
        sun_hours_per_day: None,
    }
}

pub fn battery() -> BatterySimulationConfig {
    BatterySimulationConfig {
        capacity_kwh: 10.0,
        max_power_kw: 5.0,
        initial_soc_percent: None,
        round_trip_efficiency: None,
    }
}

/// 20 ct night zone, 30 ct otherwise, 30 per month base fee.
pub fn night_tariff() -> TouTariffConfig {
    TouTariffConfig {
        base_price: 30.0,
        standard_price: 30.0,
        zones: WeeklySchedule::new(vec![PriceZone {
            start: time("22:00"),
            end: time("06:00"),
            price: 20.0,
            label: Some("Night".to_string()),
        }]),
        mode: PricingMode::Tou,
        spot_markup: 0.0,
        feed_in_price: Some(8.0),
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
