//! Costing of measured and simulated series

use chrono::{Duration, NaiveDate};

use home_energy_sim::domain::{AggregationLevel, EnergyPoint, EnergySeries};
use home_energy_sim::report::ScenarioReport;
use home_energy_sim::simulation::{EnergyTransform, EvSimulator, SimulationPipeline, SimulationSettings};
use home_energy_sim::tariff::{
    CostCalculator, PricingMode, SpotPriceFeed, StaticSpotPrices, TouTariffConfig,
};

use super::common::*;

#[test]
fn test_night_zone_scenario() {
    let tariff: TouTariffConfig = toml::from_str(
        r#"
        base_price = 30.0
        standard_price = 30.0

        [[zones.default_schedule]]
        start = "22:00"
        end = "06:00"
        price = 20.0
        "#,
    )
    .unwrap();
    let calculator = CostCalculator::for_tariff(&tariff, None).unwrap();

    // 10 kWh, all of it in the night hours of a single June day
    let start = NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let points = [0, 1, 2, 3, 4, 5, 22, 23]
        .into_iter()
        .enumerate()
        .map(|(i, hour)| {
            EnergyPoint::new(i as i64, SENSOR_ID, start + Duration::hours(hour), 0.0, 1.25)
        })
        .collect();
    let series = EnergySeries::new(SENSOR_ID, AggregationLevel::Hour, points).unwrap();
    let result = calculator.calculate(&series);

    assert_close(result.working_cost, 2.0);
    assert_close(result.base_cost, 1.0);
    assert_close(result.total_cost, 3.0);
    assert_close(result.average_price, 20.0);
    assert_eq!(result.zones.unwrap()[0].label, "22:00-06:00");
}

#[test]
fn test_night_charging_is_priced_at_night_rate() {
    let tariff = night_tariff();
    let calculator = CostCalculator::for_tariff(&tariff, None).unwrap();
    let measured = flat_hourly(monday(), 7 * 24, 0.5);
    let simulated = EvSimulator::new(ev()).apply(&measured);

    let baseline = calculator.calculate(&measured);
    let scenario = calculator.calculate(&simulated);
    let added_kwh = simulated.total_consumption() - measured.total_consumption();

    assert!(added_kwh > 0.0);
    assert_close(scenario.working_cost - baseline.working_cost, added_kwh * 0.20);
    assert_close(scenario.base_cost, baseline.base_cost);
    assert_close(baseline.base_cost, 7.0);
}

#[test]
fn test_weekly_point_costs_seven_days_of_base() {
    let tariff = night_tariff();
    let calculator = CostCalculator::for_tariff(&tariff, None).unwrap();
    let point = EnergyPoint::new(1, SENSOR_ID, monday(), 0.0, 70.0);
    let series = EnergySeries::new(SENSOR_ID, AggregationLevel::Week, vec![point]).unwrap();
    let result = calculator.calculate(&series);

    assert_close(result.base_cost, 7.0);
    // A third of every day is night
    assert_close(result.working_cost, (70.0 / 3.0 * 20.0 + 140.0 / 3.0 * 30.0) / 100.0);
}

#[test]
fn test_spot_tariff_with_static_prices() {
    let mut tariff = night_tariff();
    tariff.mode = PricingMode::Spot;
    tariff.spot_markup = 1.5;
    let prices = StaticSpotPrices::from_json(
        r#"[
            {"timestamp": "2024-06-03T00:00:00", "price": 10.0},
            {"timestamp": "2024-06-03T01:00:00", "price": 4.0}
        ]"#,
    )
    .unwrap();

    let calculator =
        CostCalculator::for_tariff(&tariff, Some(&prices as &dyn SpotPriceFeed)).unwrap();
    let result = calculator.calculate(&flat_hourly(monday(), 3, 2.0));

    // 2 kWh at 11.5, 2 at 5.5, 2 at the 30 ct fallback
    assert_close(result.working_cost, (23.0 + 11.0 + 60.0) / 100.0);
    assert!(result.zones.is_none());
}

#[test]
fn test_report_for_full_scenario() {
    let tariff = night_tariff();
    let calculator = CostCalculator::for_tariff(&tariff, None).unwrap();
    let settings = SimulationSettings {
        solar: Some(solar()),
        battery: Some(battery()),
        ..Default::default()
    };
    let pipeline = SimulationPipeline::from_settings(&settings);
    let measured = flat_hourly(monday(), 48, 1.0);

    let report = ScenarioReport::evaluate(&pipeline, &calculator, &measured, true);

    assert!(report.comparison.savings > 0.0);
    assert!(report.comparison.consumption_delta < 0.0);
    assert_close(
        report.comparison.savings,
        report.baseline.total_cost - report.scenario.total_cost,
    );
    assert_eq!(report.series.as_ref().map(|s| s.len()), Some(48));
}
