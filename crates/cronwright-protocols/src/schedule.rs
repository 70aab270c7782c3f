//! Schedule expressions: parsing, normalisation and fire-time arithmetic.
//!
//! Cron expressions are evaluated in UTC with the 6-field grammar of the
//! `cron` crate (`sec min hour day-of-month month day-of-week`). Classic
//! 5-field expressions get a leading `0` seconds field and the common
//! `@descriptor` shorthands are expanded before validation, so every stored
//! [`ScheduleSpec::Cron`] holds a canonical 6-field string.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Unit of a fixed-rate schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedRateUnit {
    Minute,
    Hour,
    Day,
}

impl FixedRateUnit {
    fn duration(self, value: u32) -> Duration {
        let value = i64::from(value);
        match self {
            FixedRateUnit::Minute => Duration::minutes(value),
            FixedRateUnit::Hour => Duration::hours(value),
            FixedRateUnit::Day => Duration::days(value),
        }
    }
}

impl fmt::Display for FixedRateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixedRateUnit::Minute => write!(f, "minute"),
            FixedRateUnit::Hour => write!(f, "hour"),
            FixedRateUnit::Day => write!(f, "day"),
        }
    }
}

impl FromStr for FixedRateUnit {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "min" | "minute" | "minutes" => Ok(FixedRateUnit::Minute),
            "h" | "hour" | "hours" => Ok(FixedRateUnit::Hour),
            "d" | "day" | "days" => Ok(FixedRateUnit::Day),
            other => Err(ScheduleError::InvalidScheduleExpression(format!(
                "unknown fixed rate unit '{}'",
                other
            ))),
        }
    }
}

/// Canonical schedule expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleSpec {
    /// Cron-style recurring schedule.
    Cron { expression: String },
    /// Fire every `value` `unit`s.
    FixedRate { value: u32, unit: FixedRateUnit },
}

impl ScheduleSpec {
    /// Build a cron spec without validating it. Use [`parse`] for user input.
    pub fn cron(expression: impl Into<String>) -> Self {
        ScheduleSpec::Cron {
            expression: expression.into(),
        }
    }

    /// Build a fixed-rate spec without validating it.
    pub fn fixed_rate(value: u32, unit: FixedRateUnit) -> Self {
        ScheduleSpec::FixedRate { value, unit }
    }

    /// Compile into an evaluable schedule.
    pub fn compile(&self) -> Result<CompiledSchedule, ScheduleError> {
        match self {
            ScheduleSpec::Cron { expression } => {
                let normalized = normalize_cron(expression)?;
                let schedule = cron::Schedule::from_str(&normalized)?;
                Ok(CompiledSchedule::Cron(Box::new(schedule)))
            }
            ScheduleSpec::FixedRate { value, unit } => {
                if *value == 0 {
                    return Err(ScheduleError::EmptyFixedRate);
                }
                Ok(CompiledSchedule::FixedRate(unit.duration(*value)))
            }
        }
    }

    /// Check that the spec compiles.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.compile().map(|_| ())
    }
}

impl fmt::Display for ScheduleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleSpec::Cron { expression } => write!(f, "cron({})", expression),
            ScheduleSpec::FixedRate { value, unit } => {
                let plural = if *value == 1 { "" } else { "s" };
                write!(f, "every {} {}{}", value, unit, plural)
            }
        }
    }
}

/// Structured cron fields, as submitted by clients that do not send a
/// single expression string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronFields {
    #[serde(default = "default_zero")]
    pub seconds: String,
    pub minutes: String,
    pub hours: String,
    pub day_of_month: String,
    pub month: String,
    #[serde(default)]
    pub day_of_week: Option<String>,
}

fn default_zero() -> String {
    "0".to_string()
}

impl CronFields {
    fn to_expression(&self) -> String {
        let dow = self.day_of_week.as_deref().unwrap_or("*");
        format!(
            "{} {} {} {} {} {}",
            self.seconds.trim(),
            self.minutes.trim(),
            self.hours.trim(),
            self.day_of_month.trim(),
            self.month.trim(),
            dow.trim()
        )
    }
}

/// A user-supplied schedule before normalisation. Exactly one of the cron
/// expression, the cron fields, or the rate must be populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSchedule {
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default)]
    pub cron_fields: Option<CronFields>,
    #[serde(default)]
    pub rate: Option<u32>,
    #[serde(default)]
    pub unit: Option<FixedRateUnit>,
}

impl RawSchedule {
    pub fn cron(expression: impl Into<String>) -> Self {
        Self {
            cron_expression: Some(expression.into()),
            ..Default::default()
        }
    }

    pub fn rate(value: u32, unit: FixedRateUnit) -> Self {
        Self {
            rate: Some(value),
            unit: Some(unit),
            ..Default::default()
        }
    }
}

/// Normalise a raw schedule into a validated [`ScheduleSpec`].
pub fn parse(raw: &RawSchedule) -> Result<ScheduleSpec, ScheduleError> {
    let expression = raw
        .cron_expression
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let populated = [
        expression.is_some(),
        raw.cron_fields.is_some(),
        raw.rate.is_some() || raw.unit.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();

    match populated {
        0 => {
            return Err(ScheduleError::InvalidScheduleExpression(
                "no schedule variant populated".to_string(),
            ))
        }
        1 => {}
        _ => {
            return Err(ScheduleError::InvalidScheduleExpression(
                "more than one schedule variant populated".to_string(),
            ))
        }
    }

    let spec = if let Some(expression) = expression {
        ScheduleSpec::cron(normalize_cron(expression)?)
    } else if let Some(fields) = &raw.cron_fields {
        ScheduleSpec::cron(normalize_cron(&fields.to_expression())?)
    } else {
        match (raw.rate, raw.unit) {
            (Some(value), Some(unit)) => ScheduleSpec::fixed_rate(value, unit),
            (Some(_), None) => {
                return Err(ScheduleError::InvalidScheduleExpression(
                    "fixed rate is missing its unit".to_string(),
                ))
            }
            _ => {
                return Err(ScheduleError::InvalidScheduleExpression(
                    "fixed rate unit given without a value".to_string(),
                ))
            }
        }
    };

    spec.validate()?;
    Ok(spec)
}

/// Expand descriptors and 5-field expressions into the 6-field form.
pub(crate) fn normalize_cron(expression: &str) -> Result<String, ScheduleError> {
    let trimmed = expression.trim();
    if let Some(descriptor) = trimmed.strip_prefix('@') {
        let expanded = match descriptor.to_ascii_lowercase().as_str() {
            "yearly" | "annually" => "0 0 0 1 1 *",
            "monthly" => "0 0 0 1 * *",
            "weekly" => "0 0 0 * * SUN",
            "daily" | "midnight" => "0 0 0 * * *",
            "hourly" => "0 0 * * * *",
            other => {
                return Err(ScheduleError::InvalidScheduleExpression(format!(
                    "unknown cron descriptor '@{}'",
                    other
                )))
            }
        };
        return Ok(expanded.to_string());
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        n => Err(ScheduleError::InvalidScheduleExpression(format!(
            "expected 5 to 7 cron fields, got {} in '{}'",
            n, trimmed
        ))),
    }
}

/// A schedule ready for evaluation.
#[derive(Debug, Clone)]
pub enum CompiledSchedule {
    Cron(Box<cron::Schedule>),
    FixedRate(Duration),
}

impl CompiledSchedule {
    /// The first fire time strictly after `from`, if any.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            CompiledSchedule::Cron(schedule) => schedule.after(&from).next(),
            CompiledSchedule::FixedRate(period) => from.checked_add_signed(*period),
        }
    }

    /// The interval of a fixed-rate schedule.
    pub fn period(&self) -> Option<std::time::Duration> {
        match self {
            CompiledSchedule::Cron(_) => None,
            CompiledSchedule::FixedRate(period) => period.to_std().ok(),
        }
    }
}

/// The next scheduled instant strictly after `from`.
pub fn next_fire_time(
    spec: &ScheduleSpec,
    from: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    spec.compile()?
        .next_after(from)
        .ok_or(ScheduleError::NoUpcomingFire(from))
}

/// Every scheduled instant in `(from, to]`, ascending.
///
/// A schedule that stops producing instants ends the enumeration early. A
/// schedule that produces an instant not strictly after its input is an
/// error rather than an infinite loop.
pub fn enumerate_fire_times(
    spec: &ScheduleSpec,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
    let compiled = spec.compile()?;
    let mut fire_times = Vec::new();
    let mut cursor = from;

    while let Some(next) = compiled.next_after(cursor) {
        if next <= cursor {
            return Err(ScheduleError::NonAdvancingSchedule { from: cursor, next });
        }
        if next > to {
            break;
        }
        fire_times.push(next);
        cursor = next;
    }

    Ok(fire_times)
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
