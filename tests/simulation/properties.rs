//! Property tests for the physical invariants of the transforms

use proptest::prelude::*;

use home_energy_sim::domain::{is_time_in_slot, ScheduleSlot, TimeOfDay, MINUTES_PER_DAY};
use home_energy_sim::simulation::solar::SolarSplit;
use home_energy_sim::simulation::{
    BatterySimulationConfig, BatterySimulator, EnergyTransform, EvSimulator, SolarSimulator,
};

use super::common::*;

fn hourly_values() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((0.0..5.0f64, 0.0..5.0f64), 1..72)
}

fn slot_from_minutes(start: u32, end: u32) -> ScheduleSlot {
    let fmt = |m: u32| TimeOfDay::from_hm(m / 60, m % 60).unwrap();
    ScheduleSlot {
        start: fmt(start),
        end: fmt(end),
    }
}

proptest! {
    #[test]
    fn solar_split_conserves_production(production in 0.0..50.0f64, consumption in 0.0..50.0f64) {
        let split = SolarSplit::new(production, consumption);
        prop_assert!((split.self_consumption_kwh + split.excess_kwh - production).abs() < 1e-9);
        prop_assert!(split.self_consumption_kwh <= consumption + 1e-12);
        prop_assert!(split.excess_kwh >= 0.0);
    }

    #[test]
    fn solar_never_adds_import(values in hourly_values()) {
        let series = hourly(monday(), &values);
        let output = SolarSimulator::new(solar()).apply(&series);
        for (before, after) in series.points().iter().zip(output.points()) {
            prop_assert!(after.consumption >= -1e-12);
            prop_assert!(after.consumption <= before.consumption + 1e-12);
            prop_assert!(after.export_kwh() >= before.export_kwh() - 1e-12);
        }
    }

    #[test]
    fn battery_charge_stays_within_capacity(
        values in hourly_values(),
        capacity in 0.0..20.0f64,
        power in 0.0..10.0f64,
        soc in 0.0..=100.0f64,
        efficiency in 0.5..=1.0f64,
    ) {
        let simulator = BatterySimulator::new(BatterySimulationConfig {
            capacity_kwh: capacity,
            max_power_kw: power,
            initial_soc_percent: Some(soc),
            round_trip_efficiency: Some(efficiency),
        });
        let series = hourly(monday(), &values);
        for step in simulator.steps(&series) {
            prop_assert!(step.charge_after_kwh >= 0.0);
            prop_assert!(step.charge_after_kwh <= capacity + 1e-9);
            prop_assert!(step.charged_kwh + step.discharged_kwh <= power + 1e-9);
        }

        let output = simulator.apply(&series);
        prop_assert!(output.total_export() <= series.total_export() + 1e-9);
        prop_assert!(output.total_consumption() <= series.total_consumption() + 1e-9);
    }

    #[test]
    fn ev_charge_bounded_by_charger_power(values in hourly_values()) {
        let series = hourly(monday(), &values);
        let simulator = EvSimulator::new(ev());
        let output = simulator.apply(&series);
        let power = ev().charger_power_kw();
        for (before, after) in series.points().iter().zip(output.points()) {
            let added = after.consumption - before.consumption;
            prop_assert!(added >= -1e-12);
            prop_assert!(added <= power + 1e-9);
        }
        for charge in simulator.charge_profile(&series) {
            prop_assert!(charge <= ev().target_charge_kwh() + 1e-9);
        }
    }

    #[test]
    fn wrapping_slot_matches_outside_the_gap(
        start in 1u32..MINUTES_PER_DAY,
        end_offset in 1u32..MINUTES_PER_DAY,
        minute in 0u32..MINUTES_PER_DAY,
    ) {
        let end = end_offset % start;
        let slot = slot_from_minutes(start, end);
        prop_assert_eq!(is_time_in_slot(minute, &slot), minute >= start || minute < end);
    }
}

#[test]
fn test_wraparound_example() {
    let slot = ScheduleSlot::new("22:00", "06:00").unwrap();
    assert!(is_time_in_slot(23 * 60 + 30, &slot));
    assert!(is_time_in_slot(2 * 60, &slot));
    assert!(!is_time_in_slot(12 * 60, &slot));
}
