use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date, naming the offending field on failure.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| InputError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Closed date interval; both `start` and `end` are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn validate(&self, field: &str) -> Result<(), InputError> {
        if self.start > self.end {
            return Err(InputError::EmptyWindow {
                field: field.to_string(),
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// First day after the window, for backends that filter on half-open ranges.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.succ_opt().unwrap_or(self.end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Pre-fire and post-fire composite windows of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireWindows {
    pub pre_fire: TimeWindow,
    pub post_fire: TimeWindow,
}

impl FireWindows {
    pub const DEFAULT_DAYS_BEFORE_AFTER: u32 = 30;

    /// Derives both windows from the fire's start and end dates.
    ///
    /// The pre-fire window covers `days` days up to and including the fire
    /// start; the post-fire window starts on the fire end date and covers the
    /// following `days` days.
    pub fn from_fire_dates(
        fire_start: NaiveDate,
        fire_end: NaiveDate,
        days: u32,
    ) -> Result<Self, InputError> {
        if days == 0 {
            return Err(InputError::InvalidBuffer(days));
        }
        if fire_start > fire_end {
            return Err(InputError::FireDatesReversed {
                start: fire_start,
                end: fire_end,
            });
        }

        let offset = Days::new(u64::from(days));
        let pre_start =
            fire_start
                .checked_sub_days(offset)
                .ok_or_else(|| InputError::DateOutOfRange {
                    field: "pre_fire.start".to_string(),
                })?;
        let post_end = fire_end
            .checked_add_days(offset)
            .ok_or_else(|| InputError::DateOutOfRange {
                field: "post_fire.end".to_string(),
            })?;

        Self::explicit(
            TimeWindow::new(pre_start, fire_start),
            TimeWindow::new(fire_end, post_end),
        )
    }

    /// Uses caller-supplied windows as-is after validating them.
    pub fn explicit(pre_fire: TimeWindow, post_fire: TimeWindow) -> Result<Self, InputError> {
        let windows = Self {
            pre_fire,
            post_fire,
        };
        windows.validate()?;
        Ok(windows)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        self.pre_fire.validate("pre_fire")?;
        self.post_fire.validate("post_fire")?;
        if self.post_fire.start <= self.pre_fire.end {
            return Err(InputError::WindowOrder {
                pre_end: self.pre_fire.end,
                post_start: self.post_fire.start,
            });
        }
        Ok(())
    }
}
