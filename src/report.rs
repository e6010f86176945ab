//! Baseline vs. what-if summary for one run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::{AggregationLevel, EnergySeries};
use crate::simulation::{SimulationPipeline, SimulationStage};
use crate::tariff::{CostCalculator, CostComparison, CostResult};

/// Priced result of one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub sensor_id: i64,
    pub aggregation: AggregationLevel,
    pub stages: Vec<SimulationStage>,
    pub baseline: CostResult,
    pub scenario: CostResult,
    pub comparison: CostComparison,
    /// Feed-in revenue of the measured series
    pub baseline_feed_in_revenue: f64,
    /// Feed-in revenue of the simulated series
    pub feed_in_revenue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<EnergySeries>,
}

impl ScenarioReport {
    /// Simulate `measured`, price both series and compare them.
    pub fn evaluate(
        pipeline: &SimulationPipeline,
        calculator: &CostCalculator<'_>,
        measured: &EnergySeries,
        include_series: bool,
    ) -> Self {
        let simulated = pipeline.run(measured);
        let baseline = calculator.calculate(measured);
        let scenario = calculator.calculate(&simulated);
        let comparison = CostComparison::between(&baseline, &scenario);

        let report = Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            sensor_id: measured.sensor_id,
            aggregation: measured.aggregation,
            stages: pipeline.stages(),
            baseline_feed_in_revenue: calculator.feed_in_revenue(measured),
            feed_in_revenue: calculator.feed_in_revenue(&simulated),
            baseline,
            scenario,
            comparison,
            series: include_series.then_some(simulated),
        };
        info!(
            run_id = %report.run_id,
            baseline_cost = report.comparison.baseline_cost,
            scenario_cost = report.comparison.scenario_cost,
            savings = report.comparison.savings,
            "scenario evaluated"
        );
        report
    }

    /// Scenario cost after feed-in revenue minus the same for the baseline.
    pub fn net_savings(&self) -> f64 {
        self.baseline.net_cost(self.baseline_feed_in_revenue)
            - self.scenario.net_cost(self.feed_in_revenue)
    }
}
