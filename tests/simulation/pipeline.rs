//! Pipeline composition tests

use chrono::{Duration, Weekday};

use home_energy_sim::domain::{AggregationLevel, EnergySeries, ScheduleSlot, WeeklySchedule};
use home_energy_sim::simulation::{
    BatterySimulator, EnergyTransform, EvSimulator, FileSettingsProvider, HeatPumpSimulator,
    SettingsProvider, SimulationPipeline, SimulationSettings, SimulationStage, SolarSimulator,
};

use super::common::*;

fn all_modules() -> SimulationSettings {
    SimulationSettings {
        ev: Some(ev()),
        heat_pump: Some(heat_pump()),
        solar: Some(solar()),
        battery: Some(battery()),
    }
}

#[test]
fn test_stages_run_in_fixed_order() {
    let pipeline = SimulationPipeline::from_settings(&all_modules());
    assert_eq!(
        pipeline.stages(),
        vec![
            SimulationStage::Ev,
            SimulationStage::HeatPump,
            SimulationStage::Solar,
            SimulationStage::Battery,
        ]
    );
}

#[test]
fn test_battery_before_solar_differs_from_canonical_order() {
    let series = flat_hourly(monday(), 48, 1.0);
    let canonical = SimulationPipeline::from_stages(vec![
        Box::new(SolarSimulator::new(solar())),
        Box::new(BatterySimulator::new(battery())),
    ])
    .run(&series);
    let reversed = SimulationPipeline::from_stages(vec![
        Box::new(BatterySimulator::new(battery())),
        Box::new(SolarSimulator::new(solar())),
    ])
    .run(&series);

    assert_ne!(canonical, reversed);
    // Run first, the battery sees no export and stores nothing.
    assert!(canonical.total_export() < reversed.total_export());
    assert!(canonical.total_consumption() < reversed.total_consumption());
}

#[test]
fn test_empty_input_round_trip() {
    let transforms: Vec<Box<dyn EnergyTransform>> = vec![
        Box::new(EvSimulator::new(ev())),
        Box::new(HeatPumpSimulator::new(heat_pump())),
        Box::new(SolarSimulator::new(solar())),
        Box::new(BatterySimulator::new(battery())),
    ];
    for level in [
        AggregationLevel::Raw,
        AggregationLevel::Hour,
        AggregationLevel::Day,
        AggregationLevel::Weekday,
        AggregationLevel::Week,
        AggregationLevel::CalendarWeek,
        AggregationLevel::Month,
        AggregationLevel::Year,
    ] {
        let empty = EnergySeries::empty(SENSOR_ID, level);
        for transform in &transforms {
            assert_eq!(transform.apply(&empty), empty, "{} at {level}", transform.stage());
        }
        let pipeline = SimulationPipeline::from_settings(&all_modules());
        assert!(pipeline.run(&empty).is_empty());
    }
}

#[test]
fn test_ev_hourly_and_daily_agree_over_a_week() {
    let simulator = EvSimulator::new(ev());
    let driving = ev().daily_driving_kwh();

    let hourly = flat_hourly(monday(), 7 * 24, 0.5);
    let hourly_added = simulator.apply(&hourly).total_consumption() - hourly.total_consumption();

    let days = daily(monday(), 7, 12.0);
    let daily_added = simulator.apply(&days).total_consumption() - days.total_consumption();

    assert!(
        (hourly_added - daily_added).abs() <= driving,
        "hourly {hourly_added} vs daily {daily_added}"
    );
    assert_close(daily_added, 7.0 * driving);
}

#[test]
fn test_ev_without_driving_is_idempotent() {
    let mut config = ev();
    config.daily_driving_distance_km = Some(0.0);
    let simulator = EvSimulator::new(config);
    let series = flat_hourly(monday(), 72, 0.5);

    let once = simulator.apply(&series);
    let twice = simulator.apply(&once);
    assert_eq!(once, twice);
    // Starts at target and never drives, so nothing is ever charged.
    assert_eq!(once, series);
}

#[test]
fn test_ev_weekday_fallback() {
    let mut config = ev();
    config.charging_schedule = WeeklySchedule::new(vec![ScheduleSlot::new("22:00", "06:00").unwrap()])
        .with_weekday(Weekday::Mon, Vec::new())
        .with_weekday(Weekday::Sat, vec![ScheduleSlot::new("10:00", "16:00").unwrap()]);
    let schedule = &config.charging_schedule;

    // Empty Monday override falls back to the default windows.
    assert!(schedule.resolve(monday() + Duration::hours(23)).is_some());
    assert!(schedule.resolve(monday() + Duration::hours(12)).is_none());
    // Saturday uses its override exclusively.
    let saturday = monday() + Duration::days(5);
    assert!(schedule.resolve(saturday + Duration::hours(12)).is_some());
    assert!(schedule.resolve(saturday + Duration::hours(23)).is_none());
}

#[test]
fn test_added_load_raises_self_consumption() {
    let series = flat_hourly(monday(), 24, 0.2);
    let solar_only = SimulationPipeline::from_stages(vec![Box::new(SolarSimulator::new(solar()))]);

    let mut settings = SimulationSettings {
        heat_pump: Some(heat_pump()),
        solar: Some(solar()),
        ..Default::default()
    };
    let with_load = SimulationPipeline::from_settings(&settings).run(&series);
    let without_load = solar_only.run(&series);
    assert!(with_load.total_export() < without_load.total_export());

    settings.solar = None;
    let heat_only = SimulationPipeline::from_settings(&settings).run(&series);
    assert!(heat_only.total_consumption() > series.total_consumption());
}

#[tokio::test]
async fn test_example_settings_file_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/settings.example.toml");
    let provider = FileSettingsProvider::new(path);

    let settings = provider.load_simulation_settings().await.unwrap();
    assert_eq!(settings.enabled_stages().len(), 4);
    let ev = settings.ev.unwrap();
    assert_eq!(ev.charging_schedule.slots_for(Weekday::Sat).len(), 1);

    let tariff = provider.load_tariff().await.unwrap();
    assert_eq!(tariff.feed_in_price, Some(8.1));
}
