use anyhow::{Context, Result};
use home_energy_sim::{config, domain::EnergySeries, report::ScenarioReport, simulation, tariff, telemetry};
use config::Config;
use simulation::{FileSettingsProvider, SettingsProvider, SimulationPipeline};
use tariff::{CostCalculator, SpotPriceFeed, StaticSpotPrices};
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load()?;
    init_tracing(&cfg.logging);

    let provider = FileSettingsProvider::new(&cfg.input.settings_path);
    let settings = provider.load_simulation_settings().await?;
    let tariff = provider.load_tariff().await?;

    let raw = tokio::fs::read_to_string(&cfg.input.series_path)
        .await
        .with_context(|| format!("Failed to read series {}", cfg.input.series_path.display()))?;
    let measured: EnergySeries = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse series {}", cfg.input.series_path.display()))?;
    info!(
        sensor_id = measured.sensor_id,
        aggregation = %measured.aggregation,
        points = measured.len(),
        "series loaded"
    );

    let spot_prices = match &cfg.input.spot_prices_path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read spot prices {}", path.display()))?;
            let prices = StaticSpotPrices::from_json(&raw)
                .with_context(|| format!("Failed to parse spot prices {}", path.display()))?;
            if prices.is_empty() {
                warn!(path = %path.display(), "spot price file is empty, standard price applies");
            }
            Some(prices)
        }
        None => None,
    };

    let pipeline = SimulationPipeline::from_settings(&settings);
    if pipeline.is_empty() {
        warn!("no simulation module enabled, scenario equals baseline");
    }
    let feed = spot_prices.as_ref().map(|p| p as &dyn SpotPriceFeed);
    let calculator = CostCalculator::for_tariff(&tariff, feed)?;

    let report = ScenarioReport::evaluate(&pipeline, &calculator, &measured, cfg.report.include_series);
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = &cfg.report.output_path {
        tokio::fs::write(path, &json)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    println!("{json}");
    Ok(())
}
