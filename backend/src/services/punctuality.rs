//! Shift-window evaluation for clock events.
//!
//! Every late/early decision in the crate goes through this module: clock-in
//! and clock-out annotate records with it and reports re-derive minutes with
//! it, so both always agree for the same department policy.
//!
//! Only the time-of-day of a timestamp is compared, at whole-second
//! precision. A boundary pushed past midnight by its tolerance does not wrap.
//! Being exactly on a boundary counts as on time.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Parses `HH:MM:SS` or `HH:MM`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockInCheck {
    pub is_late: bool,
    pub late_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockOutCheck {
    pub is_early: bool,
    pub early_minutes: i64,
}

fn seconds_of_day<T: Timelike>(at: &T) -> i64 {
    i64::from(at.num_seconds_from_midnight())
}

fn tolerance_seconds(minutes: i32) -> i64 {
    i64::from(minutes.max(0)) * 60
}

/// Late iff the time-of-day of `at` is strictly after `max_clock_in + tolerance`.
/// A boundary that does not parse yields "not late".
pub fn evaluate_clock_in<T: Timelike>(
    at: &T,
    max_clock_in: &str,
    tolerance_minutes: i32,
) -> ClockInCheck {
    let Some(boundary) = parse_time_of_day(max_clock_in) else {
        return ClockInCheck::default();
    };
    let limit = seconds_of_day(&boundary) + tolerance_seconds(tolerance_minutes);
    if limit >= SECONDS_PER_DAY {
        return ClockInCheck::default();
    }

    let actual = seconds_of_day(at);
    if actual > limit {
        ClockInCheck {
            is_late: true,
            late_minutes: (actual - limit) / 60,
        }
    } else {
        ClockInCheck::default()
    }
}

/// Early iff the time-of-day of `at` is strictly before `max_clock_out - penalty`.
/// A boundary that does not parse yields "not early".
pub fn evaluate_clock_out<T: Timelike>(
    at: &T,
    max_clock_out: &str,
    penalty_minutes: i32,
) -> ClockOutCheck {
    let Some(boundary) = parse_time_of_day(max_clock_out) else {
        return ClockOutCheck::default();
    };
    let limit = seconds_of_day(&boundary) - tolerance_seconds(penalty_minutes);
    if limit <= 0 {
        return ClockOutCheck::default();
    }

    let actual = seconds_of_day(at);
    if actual < limit {
        ClockOutCheck {
            is_early: true,
            early_minutes: (limit - actual) / 60,
        }
    } else {
        ClockOutCheck::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Punctuality {
    #[default]
    OnTime,
    Late,
    EarlyLeave,
}

impl Punctuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Punctuality::OnTime => "on_time",
            Punctuality::Late => "late",
            Punctuality::EarlyLeave => "early_leave",
        }
    }
}

/// A department's shift window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftPolicy {
    pub max_clock_in: String,
    pub max_clock_out: String,
    pub late_tolerance: i32,
    pub early_leave_penalty: i32,
}

/// Combined verdict for one attendance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PunctualityVerdict {
    pub is_late: bool,
    pub late_minutes: i64,
    pub is_early_leave: bool,
    pub early_minutes: i64,
    pub punctuality: Punctuality,
}

impl ShiftPolicy {
    pub fn clock_in<T: Timelike>(&self, at: &T) -> ClockInCheck {
        evaluate_clock_in(at, &self.max_clock_in, self.late_tolerance)
    }

    pub fn clock_out<T: Timelike>(&self, at: &T) -> ClockOutCheck {
        evaluate_clock_out(at, &self.max_clock_out, self.early_leave_penalty)
    }

    /// Lateness wins over early leave when both apply.
    pub fn verdict<T: Timelike>(&self, clock_in: &T, clock_out: Option<&T>) -> PunctualityVerdict {
        let late = self.clock_in(clock_in);
        let early = clock_out.map(|at| self.clock_out(at)).unwrap_or_default();
        let punctuality = if late.is_late {
            Punctuality::Late
        } else if early.is_early {
            Punctuality::EarlyLeave
        } else {
            Punctuality::OnTime
        };

        PunctualityVerdict {
            is_late: late.is_late,
            late_minutes: late.late_minutes,
            is_early_leave: early.is_early,
            early_minutes: early.early_minutes,
            punctuality,
        }
    }
}

/// Hours between two instants, truncated to two decimals.
pub fn work_hours(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>) -> f64 {
    let seconds = (clock_out - clock_in).num_seconds().max(0) as f64;
    (seconds / 3600.0 * 100.0).trunc() / 100.0
}
