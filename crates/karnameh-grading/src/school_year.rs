//! The school year window.
//!
//! A school year starts on 1 Mehr (Jalali month 7) and ends on the last day
//! of Shahrivar (month 6) of the following Jalali year. School year `Y`
//! therefore owns months 7..=12 of `Y` and months 1..=6 of `Y + 1`. Months
//! keep their Jalali number as their slot.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::calendar::JalaliDate;

/// Jalali month in which a school year starts.
pub const FIRST_ACADEMIC_MONTH: u32 = 7;

/// A month slot (1..=12) within a school year, numbered like the Jalali month.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(try_from = "u32", into = "u32")]
#[schema(value_type = u32)]
pub struct AcademicMonth(u32);

impl AcademicMonth {
    /// All slots in teaching order: Mehr through Esfand, then Farvardin
    /// through Shahrivar.
    pub const ACADEMIC_ORDER: [AcademicMonth; 12] = [
        AcademicMonth(7),
        AcademicMonth(8),
        AcademicMonth(9),
        AcademicMonth(10),
        AcademicMonth(11),
        AcademicMonth(12),
        AcademicMonth(1),
        AcademicMonth(2),
        AcademicMonth(3),
        AcademicMonth(4),
        AcademicMonth(5),
        AcademicMonth(6),
    ];

    pub fn new(month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(month))
    }

    pub const fn number(self) -> u32 {
        self.0
    }

    /// Zero-based position in the school year (Mehr is 0, Shahrivar 11).
    pub const fn position(self) -> usize {
        ((self.0 + 12 - FIRST_ACADEMIC_MONTH) % 12) as usize
    }

    /// The slot before this one in the same school year.
    ///
    /// Farvardin follows Esfand, so month 1 looks back to month 12. Mehr opens
    /// the year and has nothing before it.
    pub fn previous(self) -> Option<Self> {
        match self.0 {
            FIRST_ACADEMIC_MONTH => None,
            1 => Some(Self(12)),
            m => Some(Self(m - 1)),
        }
    }

    pub fn name(self) -> &'static str {
        crate::calendar::MONTH_NAMES[(self.0 - 1) as usize]
    }
}

impl fmt::Display for AcademicMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for AcademicMonth {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("academic month must be 1..=12, got {value}"))
    }
}

impl From<AcademicMonth> for u32 {
    fn from(month: AcademicMonth) -> u32 {
        month.0
    }
}

/// A school year, named by the Jalali year it starts in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = i32, example = 1403)]
pub struct SchoolYear(pub i32);

impl SchoolYear {
    /// The school year `date` falls in.
    pub fn containing(date: JalaliDate) -> Self {
        if date.month >= FIRST_ACADEMIC_MONTH {
            Self(date.year)
        } else {
            Self(date.year - 1)
        }
    }

    pub const fn start_year(self) -> i32 {
        self.0
    }

    pub fn contains(self, date: JalaliDate) -> bool {
        self.slot(date).is_some()
    }

    /// The month slot of `date` when it falls inside this school year.
    pub fn slot(self, date: JalaliDate) -> Option<AcademicMonth> {
        let month = AcademicMonth::new(date.month)?;
        let expected_year = if date.month >= FIRST_ACADEMIC_MONTH {
            self.0
        } else {
            self.0 + 1
        };
        (date.year == expected_year).then_some(month)
    }
}

impl fmt::Display for SchoolYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.0 + 1)
    }
}
