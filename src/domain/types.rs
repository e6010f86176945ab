use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::error::SeriesError;

/// Nominal spacing of raw meter samples, used when a raw series has a single point.
pub const NOMINAL_RAW_INTERVAL_SECONDS: i64 = 15;

// ============================================================================
// Aggregation
// ============================================================================

/// Granularity of an [`EnergySeries`].
///
/// The level decides which physical model a simulator uses: raw and hourly
/// points are simulated interval by interval, everything coarser goes through
/// the period-average models.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AggregationLevel {
    Raw,
    Hour,
    Day,
    Weekday,
    Week,
    CalendarWeek,
    Month,
    Year,
}

impl AggregationLevel {
    /// Nominal number of days one point represents, `None` for interval levels.
    pub fn period_days(&self) -> Option<f64> {
        match self {
            AggregationLevel::Raw | AggregationLevel::Hour => None,
            AggregationLevel::Day | AggregationLevel::Weekday => Some(1.0),
            AggregationLevel::Week | AggregationLevel::CalendarWeek => Some(7.0),
            AggregationLevel::Month => Some(30.0),
            AggregationLevel::Year => Some(365.0),
        }
    }

    /// End (exclusive) of the calendar range a point starting at `start` covers.
    ///
    /// Raw samples are instants, so their range is empty.
    pub fn covered_until(&self, start: NaiveDateTime) -> NaiveDateTime {
        match self {
            AggregationLevel::Raw => start,
            AggregationLevel::Hour => start + Duration::hours(1),
            AggregationLevel::Day | AggregationLevel::Weekday => start + Duration::days(1),
            AggregationLevel::Week | AggregationLevel::CalendarWeek => start + Duration::days(7),
            AggregationLevel::Month => start
                .checked_add_months(Months::new(1))
                .unwrap_or(start + Duration::days(30)),
            AggregationLevel::Year => start
                .checked_add_months(Months::new(12))
                .unwrap_or(start + Duration::days(365)),
        }
    }
}

// ============================================================================
// Points
// ============================================================================

/// A single metered sample.
///
/// `value` and `value_out` are running readings for grid import and export;
/// `consumption` and `inserted` are the energies attributed to this interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPoint {
    pub id: i64,
    pub sensor_id: i64,
    /// Sample moment, or interval start for aggregated points.
    pub timestamp: NaiveDateTime,
    pub value: f64,
    /// Grid import for this interval in kWh.
    pub consumption: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_out: Option<f64>,
    /// Grid export for this interval in kWh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted: Option<f64>,
    /// Instantaneous power in W, when the meter reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_current: Option<f64>,
}

impl EnergyPoint {
    pub fn new(
        id: i64,
        sensor_id: i64,
        timestamp: NaiveDateTime,
        value: f64,
        consumption: f64,
    ) -> Self {
        Self {
            id,
            sensor_id,
            timestamp,
            value,
            consumption,
            value_out: None,
            inserted: None,
            value_current: None,
        }
    }

    /// Attach export readings to the point.
    pub fn with_export(mut self, inserted: f64, value_out: f64) -> Self {
        self.inserted = Some(inserted);
        self.value_out = Some(value_out);
        self
    }

    /// Export energy for this interval, zero when the meter has no export register.
    pub fn export_kwh(&self) -> f64 {
        self.inserted.unwrap_or(0.0)
    }
}

// ============================================================================
// Series
// ============================================================================

/// Ordered samples of one sensor at one aggregation level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRecord")]
pub struct EnergySeries {
    pub sensor_id: i64,
    pub aggregation: AggregationLevel,
    points: Vec<EnergyPoint>,
}

#[derive(Deserialize)]
struct SeriesRecord {
    sensor_id: i64,
    aggregation: AggregationLevel,
    #[serde(default)]
    points: Vec<EnergyPoint>,
}

impl TryFrom<SeriesRecord> for EnergySeries {
    type Error = SeriesError;

    fn try_from(record: SeriesRecord) -> Result<Self, Self::Error> {
        Self::new(record.sensor_id, record.aggregation, record.points)
    }
}

impl EnergySeries {
    /// Build a series, rejecting points out of timestamp order or from another sensor.
    pub fn new(
        sensor_id: i64,
        aggregation: AggregationLevel,
        points: Vec<EnergyPoint>,
    ) -> Result<Self, SeriesError> {
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| p.sensor_id != sensor_id) {
            return Err(SeriesError::ForeignSensor {
                index,
                expected: sensor_id,
                found: p.sensor_id,
            });
        }
        if let Some((index, _)) = points
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| b.timestamp < a.timestamp)
        {
            return Err(SeriesError::OutOfOrder { index: index + 1 });
        }

        Ok(Self {
            sensor_id,
            aggregation,
            points,
        })
    }

    /// An empty series for `sensor_id`.
    pub fn empty(sensor_id: i64, aggregation: AggregationLevel) -> Self {
        Self {
            sensor_id,
            aggregation,
            points: Vec::new(),
        }
    }

    /// Same sensor and level, new points. Callers keep the original timestamps.
    pub(crate) fn with_points(&self, points: Vec<EnergyPoint>) -> Self {
        Self {
            sensor_id: self.sensor_id,
            aggregation: self.aggregation,
            points,
        }
    }

    pub fn points(&self) -> &[EnergyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when every point falls on the same calendar date.
    pub fn is_single_day(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => first.timestamp.date() == last.timestamp.date(),
            _ => false,
        }
    }

    pub fn total_consumption(&self) -> f64 {
        self.points.iter().map(|p| p.consumption).sum()
    }

    pub fn total_export(&self) -> f64 {
        self.points.iter().map(EnergyPoint::export_kwh).sum()
    }

    /// Length in hours of the interval each point represents.
    ///
    /// Raw samples take the gap to their predecessor; the first sample borrows
    /// the gap to its successor.
    pub fn interval_hours(&self) -> Vec<f64> {
        match self.aggregation {
            AggregationLevel::Raw => {
                let gaps: Vec<f64> = self
                    .points
                    .iter()
                    .tuple_windows()
                    .map(|(a, b)| hours_between(a.timestamp, b.timestamp))
                    .collect();
                let first = gaps
                    .first()
                    .copied()
                    .unwrap_or(NOMINAL_RAW_INTERVAL_SECONDS as f64 / 3600.0);
                if self.points.is_empty() {
                    Vec::new()
                } else {
                    std::iter::once(first).chain(gaps).collect()
                }
            }
            AggregationLevel::Hour => vec![1.0; self.points.len()],
            AggregationLevel::Day
            | AggregationLevel::Weekday
            | AggregationLevel::Week
            | AggregationLevel::CalendarWeek
            | AggregationLevel::Month
            | AggregationLevel::Year => {
                let days = self.aggregation.period_days().unwrap_or(1.0);
                vec![days * 24.0; self.points.len()]
            }
        }
    }

    /// Calendar days touched by the series, from the first point's date up to
    /// the end of the last point's period.
    pub fn covered_days(&self) -> Vec<NaiveDate> {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Vec::new();
        };
        let start = first.timestamp.date();
        let end = self.aggregation.covered_until(last.timestamp);
        // An interval ending exactly at midnight does not touch the next day.
        let end_date = if end > last.timestamp && end.time() == chrono::NaiveTime::MIN {
            end.date()
        } else {
            end.date() + Duration::days(1)
        };
        start.iter_days().take_while(|d| *d < end_date).collect()
    }
}

fn hours_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    (b - a).num_milliseconds() as f64 / 3_600_000.0
}
