//! Transaction record types shared by the tax and credit engines

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized, categorized bank or card transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Date of the transaction (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Free-text narration as printed on the statement
    pub description: String,
    /// Always positive; the sign lives in `direction`
    pub amount: f64,
    pub direction: Direction,
    pub category: Category,
    pub subcategory: String,
    pub is_recurring: bool,
    pub recurring_frequency: Option<Frequency>,
    pub tax_relevant: bool,
    pub tax_section: Option<TaxSection>,
}

/// Money in (credit) or money out (debit)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

/// Transaction categories, in the order the rule table evaluates them
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Salary,
    #[serde(rename = "EMI")]
    Emi,
    #[serde(rename = "SIP")]
    Sip,
    Insurance,
    Rent,
    Utilities,
    Food,
    Transportation,
    Medical,
    Education,
    Investment,
    Shopping,
    Entertainment,
    #[serde(rename = "ATM")]
    Atm,
    Transfer,
    Interest,
    Dividend,
    Others,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Salary => "Salary",
            Category::Emi => "EMI",
            Category::Sip => "SIP",
            Category::Insurance => "Insurance",
            Category::Rent => "Rent",
            Category::Utilities => "Utilities",
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Medical => "Medical",
            Category::Education => "Education",
            Category::Investment => "Investment",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Atm => "ATM",
            Category::Transfer => "Transfer",
            Category::Interest => "Interest",
            Category::Dividend => "Dividend",
            Category::Others => "Others",
        }
    }

    /// Categories whose credits count as "other income" for tax purposes
    pub fn is_other_income(&self) -> bool {
        matches!(
            self,
            Category::Investment | Category::Interest | Category::Dividend
        )
    }

    /// Food, Entertainment and Shopping
    pub fn is_discretionary(&self) -> bool {
        matches!(
            self,
            Category::Food | Category::Entertainment | Category::Shopping
        )
    }

    /// Case-insensitive lookup by display name
    pub fn parse(name: &str) -> Option<Category> {
        const ALL: [Category; 18] = [
            Category::Salary,
            Category::Emi,
            Category::Sip,
            Category::Insurance,
            Category::Rent,
            Category::Utilities,
            Category::Food,
            Category::Transportation,
            Category::Medical,
            Category::Education,
            Category::Investment,
            Category::Shopping,
            Category::Entertainment,
            Category::Atm,
            Category::Transfer,
            Category::Interest,
            Category::Dividend,
            Category::Others,
        ];
        let name = name.trim();
        ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Income-tax sections a transaction can count toward
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaxSection {
    #[serde(rename = "80C")]
    Sec80C,
    #[serde(rename = "80D")]
    Sec80D,
    #[serde(rename = "80G")]
    Sec80G,
    #[serde(rename = "24b")]
    Sec24b,
    #[serde(rename = "HRA")]
    Hra,
    #[serde(rename = "income")]
    Income,
}

impl TaxSection {
    /// Sections that reduce taxable income (everything except `income`)
    pub const DEDUCTIBLE: [TaxSection; 5] = [
        TaxSection::Sec80C,
        TaxSection::Sec80D,
        TaxSection::Sec80G,
        TaxSection::Sec24b,
        TaxSection::Hra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxSection::Sec80C => "80C",
            TaxSection::Sec80D => "80D",
            TaxSection::Sec80G => "80G",
            TaxSection::Sec24b => "24b",
            TaxSection::Hra => "HRA",
            TaxSection::Income => "income",
        }
    }

    pub fn parse(label: &str) -> Option<TaxSection> {
        match label.trim().to_ascii_lowercase().as_str() {
            "80c" => Some(TaxSection::Sec80C),
            "80d" => Some(TaxSection::Sec80D),
            "80g" => Some(TaxSection::Sec80G),
            "24b" | "24(b)" => Some(TaxSection::Sec24b),
            "hra" => Some(TaxSection::Hra),
            "income" => Some(TaxSection::Income),
            _ => None,
        }
    }

    pub fn is_deductible(&self) -> bool {
        !matches!(self, TaxSection::Income)
    }
}

impl fmt::Display for TaxSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statutory deduction cap for a section. `None` means uncapped (HRA) or not
/// a deduction at all (`income`).
pub fn deduction_limit(section: TaxSection) -> Option<f64> {
    match section {
        TaxSection::Sec80C => Some(150_000.0),
        TaxSection::Sec80D => Some(25_000.0),
        TaxSection::Sec80G => Some(100_000.0),
        TaxSection::Sec24b => Some(200_000.0),
        TaxSection::Hra | TaxSection::Income => None,
    }
}

/// How often a recurring transaction repeats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

/// A manual correction of the category and tax fields of a transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryCorrection {
    pub category: Option<Category>,
    pub subcategory: Option<String>,
    pub tax_relevant: Option<bool>,
    /// `Some(None)` clears the section
    pub tax_section: Option<Option<TaxSection>>,
}

impl Transaction {
    /// Build an uncategorized transaction. Negative or NaN amounts are stored
    /// as their absolute value (NaN becomes 0).
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        direction: Direction,
    ) -> Self {
        let amount = if amount.is_nan() { 0.0 } else { amount.abs() };
        Self {
            date,
            description: description.into(),
            amount,
            direction,
            category: Category::Others,
            subcategory: "Miscellaneous".to_string(),
            is_recurring: false,
            recurring_frequency: None,
            tax_relevant: false,
            tax_section: None,
        }
    }

    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }

    pub fn is_credit(&self) -> bool {
        self.direction == Direction::Credit
    }

    /// Amount with the sign applied: credits positive, debits negative
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }

    /// Apply an explicit user correction. Only the provided fields change.
    pub fn apply_correction(&mut self, correction: &CategoryCorrection) {
        if let Some(category) = correction.category {
            self.category = category;
        }
        if let Some(sub) = &correction.subcategory {
            self.subcategory = sub.clone();
        }
        if let Some(relevant) = correction.tax_relevant {
            self.tax_relevant = relevant;
        }
        if let Some(section) = correction.tax_section {
            self.tax_section = section;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_transaction_normalizes_amount() {
        let t = Transaction::new(day(2023, 5, 1), "refund", -250.0, Direction::Credit);
        assert_eq!(t.amount, 250.0);
        assert_eq!(t.category, Category::Others);

        let nan = Transaction::new(day(2023, 5, 1), "bad row", f64::NAN, Direction::Debit);
        assert_eq!(nan.amount, 0.0);
    }

    #[test]
    fn test_signed_amount() {
        let t = Transaction::new(day(2023, 5, 1), "swiggy", 420.0, Direction::Debit);
        assert!(t.is_debit());
        assert_eq!(t.signed_amount(), -420.0);
    }

    #[test]
    fn test_apply_correction_only_touches_given_fields() {
        let mut t = Transaction::new(day(2023, 6, 1), "ppf deposit", 10_000.0, Direction::Debit);
        t.apply_correction(&CategoryCorrection {
            category: Some(Category::Investment),
            tax_relevant: Some(true),
            tax_section: Some(Some(TaxSection::Sec80C)),
            ..Default::default()
        });
        assert_eq!(t.category, Category::Investment);
        assert_eq!(t.subcategory, "Miscellaneous");
        assert!(t.tax_relevant);
        assert_eq!(t.tax_section, Some(TaxSection::Sec80C));

        t.apply_correction(&CategoryCorrection {
            tax_section: Some(None),
            ..Default::default()
        });
        assert_eq!(t.tax_section, None);
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(serde_json::to_string(&Category::Emi).unwrap(), "\"EMI\"");
        assert_eq!(serde_json::to_string(&TaxSection::Sec24b).unwrap(), "\"24b\"");
        assert_eq!(serde_json::to_string(&Direction::Debit).unwrap(), "\"debit\"");
        assert_eq!(serde_json::to_string(&Frequency::Yearly).unwrap(), "\"yearly\"");
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(Category::parse("atm"), Some(Category::Atm));
        assert_eq!(Category::parse("Dividend"), Some(Category::Dividend));
        assert_eq!(Category::parse("crypto"), None);
        assert_eq!(TaxSection::parse("80c"), Some(TaxSection::Sec80C));
        assert_eq!(TaxSection::parse("24(b)"), Some(TaxSection::Sec24b));
        assert_eq!(deduction_limit(TaxSection::Sec80D), Some(25_000.0));
        assert_eq!(deduction_limit(TaxSection::Hra), None);
    }
}
