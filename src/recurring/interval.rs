//! How often a recurring payment repeats, and how to step a due date forward.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

use crate::Error;

/// The unit of a custom interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    #[allow(missing_docs)]
    Days,
    #[allow(missing_docs)]
    Weeks,
    #[allow(missing_docs)]
    Months,
    #[allow(missing_docs)]
    Years,
}

impl IntervalUnit {
    fn as_str(self) -> &'static str {
        match self {
            IntervalUnit::Days => "days",
            IntervalUnit::Weeks => "weeks",
            IntervalUnit::Months => "months",
            IntervalUnit::Years => "years",
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(IntervalUnit::Days),
            "weeks" => Ok(IntervalUnit::Weeks),
            "months" => Ok(IntervalUnit::Months),
            "years" => Ok(IntervalUnit::Years),
            other => Err(Error::Validation(format!("unknown interval unit \"{other}\""))),
        }
    }
}

impl ToSql for IntervalUnit {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IntervalUnit {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// How often a recurring payment repeats.
///
/// Serialized with an `interval` tag, e.g. `{"interval": "bi-weekly"}` or
/// `{"interval": "custom", "every": 3, "unit": "months"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "interval", rename_all = "kebab-case")]
pub enum PaymentInterval {
    /// Every day.
    Daily,
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    BiWeekly,
    /// On the same day of every month.
    Monthly,
    /// On the same day of every year.
    Yearly,
    /// Repeats every `every` `unit`s, e.g. every 3 months.
    #[allow(missing_docs)]
    Custom { every: u32, unit: IntervalUnit },
}

impl PaymentInterval {
    /// The name stored in the `interval` column.
    pub fn tag(&self) -> &'static str {
        match self {
            PaymentInterval::Daily => "daily",
            PaymentInterval::Weekly => "weekly",
            PaymentInterval::BiWeekly => "bi-weekly",
            PaymentInterval::Monthly => "monthly",
            PaymentInterval::Yearly => "yearly",
            PaymentInterval::Custom { .. } => "custom",
        }
    }

    /// Rebuild an interval from its database columns.
    ///
    /// # Errors
    /// Returns [Error::Validation] if `tag` is unknown or a custom interval is
    /// missing its count or unit.
    pub fn from_parts(
        tag: &str,
        every: Option<u32>,
        unit: Option<IntervalUnit>,
    ) -> Result<Self, Error> {
        let interval = match tag {
            "daily" => PaymentInterval::Daily,
            "weekly" => PaymentInterval::Weekly,
            "bi-weekly" => PaymentInterval::BiWeekly,
            "monthly" => PaymentInterval::Monthly,
            "yearly" => PaymentInterval::Yearly,
            "custom" => match (every, unit) {
                (Some(every), Some(unit)) => PaymentInterval::Custom { every, unit },
                _ => {
                    return Err(Error::Validation(
                        "a custom interval needs both a count and a unit".to_owned(),
                    ));
                }
            },
            other => return Err(Error::Validation(format!("unknown interval \"{other}\""))),
        };

        interval.validate()?;

        Ok(interval)
    }

    /// The count and unit stored for custom intervals, `None` otherwise.
    pub fn custom_parts(&self) -> (Option<u32>, Option<IntervalUnit>) {
        match *self {
            PaymentInterval::Custom { every, unit } => (Some(every), Some(unit)),
            _ => (None, None),
        }
    }

    /// Check that a custom interval repeats at least once per unit.
    ///
    /// # Errors
    /// Returns [Error::Validation] if a custom interval has a count of zero.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            PaymentInterval::Custom { every: 0, .. } => Err(Error::Validation(
                "a custom interval must repeat every 1 or more units".to_owned(),
            )),
            _ => Ok(()),
        }
    }

    /// The date one interval after `date`.
    ///
    /// Month and year steps keep the day of the month where possible and
    /// otherwise clamp to the last day of the target month, so January 31st
    /// plus one month is the last day of February.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the result falls outside the supported
    /// date range.
    pub fn advance(&self, date: Date) -> Result<Date, Error> {
        let next = match *self {
            PaymentInterval::Daily => add_days(date, 1),
            PaymentInterval::Weekly => add_days(date, 7),
            PaymentInterval::BiWeekly => add_days(date, 14),
            PaymentInterval::Monthly => add_months(date, 1),
            PaymentInterval::Yearly => add_months(date, 12),
            PaymentInterval::Custom { every, unit } => match unit {
                IntervalUnit::Days => add_days(date, i64::from(every)),
                IntervalUnit::Weeks => add_days(date, i64::from(every) * 7),
                IntervalUnit::Months => add_months(date, i64::from(every)),
                IntervalUnit::Years => add_months(date, i64::from(every) * 12),
            },
        };

        next.ok_or_else(|| {
            Error::Validation(format!("the payment after {date} is out of range"))
        })
    }

    /// The first date in the series starting at `start` that falls after `today`.
    ///
    /// Returns `start` if it is already in the future.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the interval is invalid or the series
    /// runs out of range.
    pub fn next_occurrence_after(&self, start: Date, today: Date) -> Result<Date, Error> {
        self.validate()?;

        let mut next = start;
        while next <= today {
            next = self.advance(next)?;
        }

        Ok(next)
    }
}

impl Display for PaymentInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentInterval::Custom { every, unit } => {
                write!(f, "every {every} {}", unit.as_str())
            }
            interval => f.write_str(interval.tag()),
        }
    }
}

fn add_days(date: Date, days: i64) -> Option<Date> {
    date.checked_add(Duration::days(days))
}

fn add_months(date: Date, months: i64) -> Option<Date> {
    let month_index = i64::from(date.year()) * 12 + i64::from(u8::from(date.month())) - 1 + months;
    let year = i32::try_from(month_index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(month_index.rem_euclid(12) + 1).ok()?).ok()?;

    // Every month has at least 28 days, so this stops after a few steps.
    let mut day = date.day();
    loop {
        match Date::from_calendar_date(year, month, day) {
            Ok(next) => return Some(next),
            Err(_) if day > 28 => day -= 1,
            Err(_) => return None,
        }
    }
}
