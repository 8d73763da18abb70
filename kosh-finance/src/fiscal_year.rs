//! Indian financial year (April 1 to March 31)

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{FinanceError, Result};

/// A financial year identified by its starting calendar year.
/// `FinancialYear(2023)` is "2023-24".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FinancialYear(pub i32);

impl FinancialYear {
    pub fn start_year(&self) -> i32 {
        self.0
    }

    /// April 1 of the start year
    pub fn start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 4, 1).unwrap_or(NaiveDate::MIN)
    }

    /// March 31 of the following year
    pub fn end(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 + 1, 3, 31).unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }

    /// The financial year a date falls in
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 4 {
            FinancialYear(date.year())
        } else {
            FinancialYear(date.year() - 1)
        }
    }

    pub fn label(&self) -> String {
        format!("{}-{:02}", self.0, (self.0 + 1).rem_euclid(100))
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for FinancialYear {
    type Err = FinanceError;

    /// Accepts "2023-24" and "2023-2024". The end must be the next year.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || FinanceError::InvalidFinancialYear(s.to_string());
        let (start, end) = s.trim().split_once('-').ok_or_else(bad)?;
        if start.len() != 4 {
            return Err(bad());
        }
        let start: i32 = start.parse().map_err(|_| bad())?;
        let end_num: i32 = end.parse().map_err(|_| bad())?;
        let next = start + 1;
        let ok = match end.len() {
            2 => end_num == next.rem_euclid(100),
            4 => end_num == next,
            _ => false,
        };
        if !ok {
            return Err(bad());
        }
        Ok(FinancialYear(start))
    }
}

impl Serialize for FinancialYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for FinancialYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("2023-24".parse::<FinancialYear>().unwrap(), FinancialYear(2023));
        assert_eq!("2023-2024".parse::<FinancialYear>().unwrap(), FinancialYear(2023));
        assert_eq!("1999-00".parse::<FinancialYear>().unwrap(), FinancialYear(1999));
        assert!("2023-25".parse::<FinancialYear>().is_err());
        assert!("2023".parse::<FinancialYear>().is_err());
        assert!("FY23-24".parse::<FinancialYear>().is_err());
    }

    #[test]
    fn test_window() {
        let fy = FinancialYear(2023);
        assert!(fy.contains(d(2023, 4, 1)));
        assert!(fy.contains(d(2024, 3, 31)));
        assert!(!fy.contains(d(2023, 3, 31)));
        assert!(!fy.contains(d(2024, 4, 1)));
        assert_eq!(FinancialYear::containing(d(2024, 2, 10)), fy);
        assert_eq!(FinancialYear::containing(d(2023, 4, 10)), fy);
        assert_eq!(fy.to_string(), "2023-24");
    }

    #[test]
    fn test_serde_as_label() {
        let fy = FinancialYear(2023);
        assert_eq!(serde_json::to_string(&fy).unwrap(), "\"2023-24\"");
        let back: FinancialYear = serde_json::from_str("\"2024-25\"").unwrap();
        assert_eq!(back, FinancialYear(2024));
    }
}
