//! Gregorian to Jalali (Solar Hijri) conversion.
//!
//! The conversion is closed-form day counting: days since the Jalali epoch
//! are computed from cumulative Gregorian month offsets, then split by the
//! 33-year (12053 day) and 4-year (1461 day) leap cycles of the arithmetic
//! Jalali calendar. The first six Jalali months have 31 days, the next five
//! have 30 and Esfand has 29 or 30.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Days before the first of each Gregorian month in a common year.
const GREGORIAN_MONTH_OFFSETS: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

const DAYS_PER_33_YEARS: i64 = 12053;
const DAYS_PER_4_YEARS: i64 = 1461;
/// Days in the first six (31 day) months.
const FIRST_HALF_DAYS: i64 = 186;

/// Persian month names, Farvardin first.
pub const MONTH_NAMES: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

/// A date in the Jalali calendar. Months and days are 1-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl JalaliDate {
    pub fn from_gregorian(date: NaiveDate) -> Self {
        to_jalali(date.year(), date.month(), date.day())
    }

    /// Persian name of this date's month.
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month.clamp(1, 12) - 1) as usize]
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for JalaliDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_gregorian(date)
    }
}

/// Converts a Gregorian date to Jalali.
///
/// `gm` is 1..=12 and `gd` a valid day of that month; callers validate the
/// date first (for example by building a [`NaiveDate`]). Out of range months
/// are clamped rather than panicking.
pub fn to_jalali(gy: i32, gm: u32, gd: u32) -> JalaliDate {
    let gm = gm.clamp(1, 12);
    let (mut jy, gy) = if gy <= 1600 {
        (0_i64, i64::from(gy) - 621)
    } else {
        (979_i64, i64::from(gy) - 1600)
    };

    // Leap days are counted up to the end of February of the current year
    // only once March has been reached.
    let gy2 = if gm > 2 { gy + 1 } else { gy };
    let mut days = 365 * gy + (gy2 + 3).div_euclid(4) - (gy2 + 99).div_euclid(100)
        + (gy2 + 399).div_euclid(400)
        - 80
        + i64::from(gd)
        + GREGORIAN_MONTH_OFFSETS[(gm - 1) as usize];

    jy += 33 * days.div_euclid(DAYS_PER_33_YEARS);
    days = days.rem_euclid(DAYS_PER_33_YEARS);

    jy += 4 * days.div_euclid(DAYS_PER_4_YEARS);
    days = days.rem_euclid(DAYS_PER_4_YEARS);

    // The first year of each 4-year block is the leap year; its 366th day
    // must stay in that year.
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (month, day) = if days < FIRST_HALF_DAYS {
        (1 + days / 31, 1 + days % 31)
    } else {
        let rest = days - FIRST_HALF_DAYS;
        (7 + rest / 30, 1 + rest % 30)
    };

    JalaliDate {
        year: jy as i32,
        month: month as u32,
        day: day as u32,
    }
}
