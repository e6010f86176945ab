//! # Simulation Pipeline
//!
//! Chains the enabled transforms in a fixed order and loads the settings
//! that decide which ones are enabled.
//!
//! ## Components
//!
//! - **SimulationSettings**: one optional config per stage, validated on load
//! - **SimulationPipeline**: ordered stages folded over a series
//! - **SettingsProvider**: async source of simulation settings and tariff
//! - **FileSettingsProvider**: TOML file with `[ev]`, `[heat_pump]`, `[solar]`,
//!   `[battery]` and `[tariff]` sections

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use validator::Validate;

use super::{
    BatterySimulationConfig, BatterySimulator, EnergyTransform, EvSimulationConfig, EvSimulator,
    HeatPumpSimulationConfig, HeatPumpSimulator, SimulationStage, SolarSimulationConfig,
    SolarSimulator,
};
use crate::domain::{ConfigurationError, EnergySeries};
use crate::tariff::TouTariffConfig;

/// Which what-if modules are enabled and how they are configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulationSettings {
    #[validate(nested)]
    pub ev: Option<EvSimulationConfig>,
    #[validate(nested)]
    pub heat_pump: Option<HeatPumpSimulationConfig>,
    #[validate(nested)]
    pub solar: Option<SolarSimulationConfig>,
    #[validate(nested)]
    pub battery: Option<BatterySimulationConfig>,
}

impl SimulationSettings {
    /// Stages that will run, in execution order.
    pub fn enabled_stages(&self) -> Vec<SimulationStage> {
        [
            (SimulationStage::Ev, self.ev.is_some()),
            (SimulationStage::HeatPump, self.heat_pump.is_some()),
            (SimulationStage::Solar, self.solar.is_some()),
            (SimulationStage::Battery, self.battery.is_some()),
        ]
        .into_iter()
        .filter_map(|(stage, enabled)| enabled.then_some(stage))
        .collect()
    }
}

/// Ordered chain of transforms.
pub struct SimulationPipeline {
    stages: Vec<Box<dyn EnergyTransform>>,
}

impl SimulationPipeline {
    /// One stage per enabled module, always EV → heat pump → solar → battery.
    pub fn from_settings(settings: &SimulationSettings) -> Self {
        let mut stages: Vec<Box<dyn EnergyTransform>> = Vec::new();
        if let Some(ev) = &settings.ev {
            stages.push(Box::new(EvSimulator::new(ev.clone())));
        }
        if let Some(heat_pump) = &settings.heat_pump {
            stages.push(Box::new(HeatPumpSimulator::new(heat_pump.clone())));
        }
        if let Some(solar) = &settings.solar {
            stages.push(Box::new(SolarSimulator::new(solar.clone())));
        }
        if let Some(battery) = &settings.battery {
            stages.push(Box::new(BatterySimulator::new(battery.clone())));
        }
        Self { stages }
    }

    /// Runs `stages` exactly in the given order.
    pub fn from_stages(stages: Vec<Box<dyn EnergyTransform>>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> Vec<SimulationStage> {
        self.stages.iter().map(|stage| stage.stage()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Feed `series` through every stage. An empty pipeline returns a copy.
    pub fn run(&self, series: &EnergySeries) -> EnergySeries {
        let result = self.stages.iter().fold(series.clone(), |current, stage| {
            let next = stage.apply(&current);
            debug!(
                stage = %stage.stage(),
                consumption_kwh = next.total_consumption(),
                export_kwh = next.total_export(),
                "stage applied"
            );
            next
        });

        info!(
            sensor_id = series.sensor_id,
            aggregation = %series.aggregation,
            points = series.len(),
            stages = ?self.stages(),
            consumption_before_kwh = series.total_consumption(),
            consumption_after_kwh = result.total_consumption(),
            "simulation pipeline finished"
        );
        result
    }
}

/// Source of the configuration for one simulation run.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn load_simulation_settings(&self) -> Result<SimulationSettings>;
    async fn load_tariff(&self) -> Result<TouTariffConfig>;
}

#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    #[serde(flatten)]
    simulation: SimulationSettings,
    tariff: TouTariffConfig,
}

impl SettingsFile {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.simulation.validate()?;
        self.tariff.validate()?;
        Ok(())
    }
}

/// Settings from a TOML file, read and validated on first use.
///
/// Later calls reuse that snapshot, so settings and tariff of one run always
/// come from the same file contents.
#[derive(Debug)]
pub struct FileSettingsProvider {
    path: PathBuf,
    loaded: OnceCell<SettingsFile>,
}

impl FileSettingsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: OnceCell::new(),
        }
    }

    async fn settings(&self) -> Result<&SettingsFile> {
        self.loaded.get_or_try_init(|| self.read()).await
    }

    async fn read(&self) -> Result<SettingsFile> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read settings file {}", self.path.display()))?;
        let settings: SettingsFile = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {}", self.path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        Ok(settings)
    }
}

#[async_trait]
impl SettingsProvider for FileSettingsProvider {
    async fn load_simulation_settings(&self) -> Result<SimulationSettings> {
        let settings = self.settings().await?.simulation.clone();
        info!(
            path = %self.path.display(),
            stages = ?settings.enabled_stages(),
            "simulation settings loaded"
        );
        Ok(settings)
    }

    async fn load_tariff(&self) -> Result<TouTariffConfig> {
        let tariff = self.settings().await?.tariff.clone();
        info!(path = %self.path.display(), mode = %tariff.mode, "tariff loaded");
        Ok(tariff)
    }
}
