//! # What-if Simulation
//!
//! Composable transforms that rewrite a measured energy series as if extra
//! hardware had been installed.
//!
//! ## Components
//!
//! - **EV**: charging load inside scheduled windows, net of daily driving
//! - **HeatPump**: space-heating load from a monthly outdoor temperature model
//! - **Solar**: self-consumed production removed from import, excess exported
//! - **Battery**: excess production shifted into later consumption
//! - **Pipeline**: folds a series through the enabled stages in fixed order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use home_energy_sim::simulation::{SimulationPipeline, SimulationSettings};
//!
//! let pipeline = SimulationPipeline::from_settings(&settings);
//! let simulated = pipeline.run(&measured);
//! ```
//!
//! Every transform is a pure function of its input series; running totals
//! live in per-call fold state, never in the transform itself.

pub mod battery;
pub mod ev;
pub mod heat_pump;
pub mod pipeline;
pub mod solar;

pub use battery::{BatterySimulationConfig, BatterySimulator};
pub use ev::{ChargingSpeed, EvSimulationConfig, EvSimulator};
pub use heat_pump::{HeatPumpSimulationConfig, HeatPumpSimulator, HeatSource, HeatingSlot};
pub use pipeline::{FileSettingsProvider, SettingsProvider, SimulationPipeline, SimulationSettings};
pub use solar::{Orientation, SolarSimulationConfig, SolarSimulator};

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::domain::{EnergyPoint, EnergySeries};

/// Position of a transform in the pipeline. Declaration order is execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SimulationStage {
    Ev,
    HeatPump,
    Solar,
    Battery,
}

/// A stateless series-to-series rewrite.
pub trait EnergyTransform: Send + Sync {
    fn stage(&self) -> SimulationStage;

    /// Produce the adjusted series. Empty input yields empty output.
    fn apply(&self, series: &EnergySeries) -> EnergySeries;
}

/// Running totals of the energy a transform has moved so far.
///
/// Per-interval fields take the delta of the current point; the running
/// `value`/`value_out` readings take the accumulated deltas so they stay
/// consistent with every earlier adjustment.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CumulativeAdjustment {
    pub import_kwh: f64,
    pub export_kwh: f64,
}

impl CumulativeAdjustment {
    /// Apply this point's import/export deltas and return the rewritten point.
    ///
    /// Export fields stay `None` when no export energy has been moved yet.
    pub fn apply(&mut self, point: &EnergyPoint, import_delta: f64, export_delta: f64) -> EnergyPoint {
        self.import_kwh += import_delta;
        self.export_kwh += export_delta;

        let mut next = point.clone();
        next.consumption = point.consumption + import_delta;
        next.value = point.value + self.import_kwh;
        if export_delta != 0.0 || point.inserted.is_some() {
            next.inserted = Some(point.export_kwh() + export_delta);
        }
        if self.export_kwh != 0.0 || point.value_out.is_some() {
            next.value_out = Some(point.value_out.unwrap_or(0.0) + self.export_kwh);
        }
        next
    }
}
