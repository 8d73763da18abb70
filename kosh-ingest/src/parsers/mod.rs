pub mod csv_statement;
pub mod statement_text;

use chrono::{NaiveDate, NaiveDateTime};

/// Date layouts seen in Indian bank exports, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// chrono's `%Y` happily reads "23" as year 23, so two-digit years get their own list
const SHORT_YEAR_FORMATS: &[&str] = &["%d-%m-%y", "%d/%m/%y", "%m/%d/%y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%d-%m-%Y %H:%M:%S"];

/// Parse a statement date. Day-first wins over month-first when both are valid.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let parts: Vec<&str> = s.split(['-', '/']).collect();
    let short_year = parts.len() == 3 && parts[0].len() != 4 && parts[2].len() == 2;
    let formats = if short_year { SHORT_YEAR_FORMATS } else { DATE_FORMATS };
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Parse an amount cell: strips `,`, `₹`, `Rs.`; `(123)` reads as -123.
/// Unparseable input yields `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw
        .trim()
        .replace(',', "")
        .replace('₹', "")
        .replace("Rs.", "")
        .replace('(', "-")
        .replace(')', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2023-04-15"), Some(d(2023, 4, 15)));
        assert_eq!(parse_date("15-04-2023"), Some(d(2023, 4, 15)));
        assert_eq!(parse_date("05/04/2023"), Some(d(2023, 4, 5)));
        // Not a valid day-first date, so month-first applies
        assert_eq!(parse_date("04/25/2023"), Some(d(2023, 4, 25)));
        assert_eq!(parse_date("15-04-23"), Some(d(2023, 4, 15)));
        assert_eq!(parse_date("2023-04-15 10:30:00"), Some(d(2023, 4, 15)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_amount_cleanup() {
        assert_eq!(parse_amount("1,25,000.50"), Some(125_000.5));
        assert_eq!(parse_amount("₹ 499"), Some(499.0));
        assert_eq!(parse_amount("Rs.1,200"), Some(1_200.0));
        assert_eq!(parse_amount("(350.00)"), Some(-350.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }
}
