use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::TustError;

/// A billing period (competência): always the first day of a month.
///
/// Debit notes and invoices are matched on `(company code, billing period)`,
/// so the day component is normalized away at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "NaiveDate", into = "NaiveDate")]
pub struct BillingPeriod(NaiveDate);

impl BillingPeriod {
    /// Period for the given year and month. Returns `None` for month outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// The period before the one containing `today`; the default period for
    /// retrieving a transmitter's invoices.
    pub fn previous(today: NaiveDate) -> Self {
        let first = Self::containing(today).0;
        Self(first.checked_sub_months(Months::new(1)).unwrap_or(first))
    }

    /// Parse the `YYYY.MM` format used by the retrieval collaborator.
    pub fn parse_competence(text: &str) -> Result<Self, TustError> {
        let invalid =
            || TustError::malformed(format!("invalid billing period '{text}', expected YYYY.MM"));
        let (year, month) = text.trim().split_once('.').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }

    /// Format as `YYYY.MM`.
    pub fn to_competence(&self) -> String {
        format!("{:04}.{:02}", self.0.year(), self.0.month())
    }

    /// The first day of the period.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<BillingPeriod> for NaiveDate {
    fn from(period: BillingPeriod) -> Self {
        period.0
    }
}

impl TryFrom<NaiveDate> for BillingPeriod {
    type Error = String;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        if date.day() != 1 {
            return Err(format!("billing period must be the first of a month, got {date}"));
        }
        Ok(Self(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn containing_normalizes_day() {
        let period = BillingPeriod::containing(date(2025, 10, 17));
        assert_eq!(period.first_day(), date(2025, 10, 1));
        assert_eq!(period.to_string(), "2025-10-01");
    }

    #[test]
    fn rejects_invalid_month() {
        assert!(BillingPeriod::new(2025, 13).is_none());
        assert!(BillingPeriod::new(2025, 0).is_none());
    }

    #[test]
    fn previous_crosses_year() {
        assert_eq!(
            BillingPeriod::previous(date(2025, 1, 20)),
            BillingPeriod::new(2024, 12).unwrap()
        );
        assert_eq!(
            BillingPeriod::previous(date(2025, 3, 31)),
            BillingPeriod::new(2025, 2).unwrap()
        );
    }

    #[test]
    fn competence_format() {
        let period = BillingPeriod::parse_competence("2025.10").unwrap();
        assert_eq!(period.first_day(), date(2025, 10, 1));
        assert_eq!(period.to_competence(), "2025.10");

        assert!(BillingPeriod::parse_competence("2025-10").is_err());
        assert!(BillingPeriod::parse_competence("2025.1").is_err());
        assert!(BillingPeriod::parse_competence("2025.13").is_err());
        assert!(BillingPeriod::parse_competence("abcd.10").is_err());
    }

    #[test]
    fn try_from_requires_first_of_month() {
        assert!(BillingPeriod::try_from(date(2025, 10, 1)).is_ok());
        assert!(BillingPeriod::try_from(date(2025, 10, 2)).is_err());
    }
}
