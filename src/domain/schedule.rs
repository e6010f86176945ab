use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::ConfigurationError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Wall-clock time of day with minute resolution, written as `HH:MM`.
///
/// `24:00` is accepted so that a slot can end at midnight without wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidTimeOfDay(format!("{:02}:{:02}", hour, minute));
        if hour > 24 || minute >= 60 {
            return Err(invalid());
        }
        let minutes = hour * 60 + minute;
        if minutes > MINUTES_PER_DAY {
            return Err(invalid());
        }
        Ok(Self(minutes))
    }

    /// Parse `HH:MM`.
    pub fn parse(s: &str) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidTimeOfDay(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).map_err(|_| invalid())
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u32 {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Minutes since midnight for a timestamp.
pub fn minutes_of_day(t: NaiveDateTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// A time-of-day window, possibly wrapping past midnight when `start > end`.
pub trait TimeSlot {
    fn start(&self) -> TimeOfDay;
    fn end(&self) -> TimeOfDay;

    /// Length of the window in minutes. `start == end` is an empty window.
    fn duration_minutes(&self) -> u32 {
        let (start, end) = (self.start().minutes(), self.end().minutes());
        if start <= end {
            end - start
        } else {
            MINUTES_PER_DAY - start + end
        }
    }

    fn duration_hours(&self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }

    fn label(&self) -> String {
        format!("{}-{}", self.start(), self.end())
    }
}

/// Whether `minutes_of_day` falls inside `slot`.
pub fn is_time_in_slot<S: TimeSlot + ?Sized>(minutes_of_day: u32, slot: &S) -> bool {
    let (start, end) = (slot.start().minutes(), slot.end().minutes());
    if start <= end {
        minutes_of_day >= start && minutes_of_day < end
    } else {
        minutes_of_day >= start || minutes_of_day < end
    }
}

/// First slot covering `timestamp`.
///
/// A non-empty override for the timestamp's weekday replaces the default
/// schedule for that day entirely.
pub fn resolve_active_slot<'a, S: TimeSlot>(
    timestamp: NaiveDateTime,
    default_schedule: &'a [S],
    weekday_overrides: &'a HashMap<Weekday, Vec<S>>,
) -> Option<&'a S> {
    let minutes = minutes_of_day(timestamp);
    slots_for_weekday(timestamp.weekday(), default_schedule, weekday_overrides)
        .iter()
        .find(|slot| is_time_in_slot(minutes, *slot))
}

fn slots_for_weekday<'a, S>(
    weekday: Weekday,
    default_schedule: &'a [S],
    weekday_overrides: &'a HashMap<Weekday, Vec<S>>,
) -> &'a [S] {
    match weekday_overrides.get(&weekday) {
        Some(slots) if !slots.is_empty() => slots,
        _ => default_schedule,
    }
}

/// Plain window without payload, e.g. an EV charging window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl ScheduleSlot {
    pub fn new(start: &str, end: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            start: TimeOfDay::parse(start)?,
            end: TimeOfDay::parse(end)?,
        })
    }
}

impl TimeSlot for ScheduleSlot {
    fn start(&self) -> TimeOfDay {
        self.start
    }
    fn end(&self) -> TimeOfDay {
        self.end
    }
}

/// Default slots plus optional per-weekday replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>"))]
pub struct WeeklySchedule<S> {
    #[serde(default)]
    pub default_schedule: Vec<S>,
    #[serde(default)]
    pub weekday_schedules: HashMap<Weekday, Vec<S>>,
}

impl<S> Default for WeeklySchedule<S> {
    fn default() -> Self {
        Self {
            default_schedule: Vec::new(),
            weekday_schedules: HashMap::new(),
        }
    }
}

impl<S: TimeSlot> WeeklySchedule<S> {
    pub fn new(default_schedule: Vec<S>) -> Self {
        Self {
            default_schedule,
            weekday_schedules: HashMap::new(),
        }
    }

    pub fn with_weekday(mut self, weekday: Weekday, slots: Vec<S>) -> Self {
        self.weekday_schedules.insert(weekday, slots);
        self
    }

    /// Slots in force on `weekday`.
    pub fn slots_for(&self, weekday: Weekday) -> &[S] {
        slots_for_weekday(weekday, &self.default_schedule, &self.weekday_schedules)
    }

    pub fn resolve(&self, timestamp: NaiveDateTime) -> Option<&S> {
        resolve_active_slot(timestamp, &self.default_schedule, &self.weekday_schedules)
    }

    /// Scheduled hours on `weekday`.
    pub fn daily_hours(&self, weekday: Weekday) -> f64 {
        self.slots_for(weekday).iter().map(|s| s.duration_hours()).sum()
    }

    /// Scheduled hours per day averaged over a week.
    pub fn average_daily_hours(&self) -> f64 {
        ALL_WEEKDAYS.iter().map(|d| self.daily_hours(*d)).sum::<f64>() / 7.0
    }

    /// Every slot in force over one week, with repeats for days sharing the default.
    pub fn week_slots(&self) -> impl Iterator<Item = &S> + '_ {
        ALL_WEEKDAYS.iter().flat_map(move |d| self.slots_for(*d).iter())
    }

    pub fn is_empty(&self) -> bool {
        self.week_slots().next().is_none()
    }
}
