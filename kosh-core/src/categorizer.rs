//! Deterministic rule table mapping transaction narrations to categories
//! and tax metadata.
//!
//! Rules are evaluated strictly in declaration order and the first rule with
//! a matching keyword or pattern wins, even if a later rule would match more
//! specifically. Descriptions are lower-cased before matching.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::transaction::{Category, Frequency, TaxSection, Transaction};

/// Above this amount an unmatched narration is treated as an investment
const LARGE_AMOUNT: f64 = 50_000.0;
/// Below this amount a "monthly"/"subscription" narration is a subscription
const SMALL_AMOUNT: f64 = 1_000.0;

/// Categorization result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: Category,
    pub subcategory: String,
    pub tax_relevant: bool,
    pub tax_section: Option<TaxSection>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<Frequency>,
}

/// A single test inside a rule
#[derive(Debug)]
pub enum Matcher {
    /// Plain substring of the lower-cased description
    Keyword(&'static str),
    /// Regex searched anywhere in the lower-cased description
    Pattern(Regex),
}

impl Matcher {
    fn is_match(&self, desc: &str) -> bool {
        match self {
            Matcher::Keyword(k) => desc.contains(k),
            Matcher::Pattern(re) => re.is_match(desc),
        }
    }
}

/// One entry of the ordered category table
#[derive(Debug)]
pub struct CategoryRule {
    pub category: Category,
    /// Keywords first, then patterns
    pub matchers: Vec<Matcher>,
    pub tax_relevant: bool,
    pub tax_section: Option<TaxSection>,
    /// `Some` marks the category as recurring by default
    pub frequency: Option<Frequency>,
}

impl CategoryRule {
    fn new(
        category: Category,
        keywords: &[&'static str],
        patterns: &[&str],
        tax_section: Option<TaxSection>,
        frequency: Option<Frequency>,
    ) -> Self {
        let mut matchers: Vec<Matcher> = keywords.iter().copied().map(Matcher::Keyword).collect();
        matchers.extend(
            patterns
                .iter()
                .map(|p| Matcher::Pattern(Regex::new(p).expect("invalid category pattern"))),
        );
        Self {
            category,
            matchers,
            tax_relevant: tax_section.is_some(),
            tax_section,
            frequency,
        }
    }

    pub fn matches(&self, desc_lower: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(desc_lower))
    }
}

static RULES: LazyLock<Vec<CategoryRule>> = LazyLock::new(|| {
    use Category::*;
    use Frequency::*;
    use TaxSection::*;

    vec![
        CategoryRule::new(
            Salary,
            &["salary", "sal", "payroll", "wages", "income", "stipend"],
            &[r"sal\s*\d+", r"salary\s*credit", r"payroll"],
            Some(Income),
            Some(Monthly),
        ),
        CategoryRule::new(
            Emi,
            &["emi", "loan", "mortgage", "installment", "equated"],
            &[r"emi\s*\d+", r"loan\s*repayment", r"home\s*loan", r"car\s*loan"],
            Some(Sec24b),
            Some(Monthly),
        ),
        CategoryRule::new(
            Sip,
            &["sip", "mutual fund", "systematic", "investment"],
            &[r"sip\s*\d+", r"mf\s*investment", r"systematic\s*investment"],
            Some(Sec80C),
            Some(Monthly),
        ),
        CategoryRule::new(
            Insurance,
            &["insurance", "premium", "policy", "lic", "health insurance"],
            &[r"insurance\s*premium", r"policy\s*\d+", r"lic\s*premium"],
            Some(Sec80C),
            Some(Yearly),
        ),
        CategoryRule::new(
            Rent,
            &["rent", "house rent", "apartment", "flat rent"],
            &[r"house\s*rent", r"flat\s*rent", r"rent\s*\d+"],
            Some(Hra),
            Some(Monthly),
        ),
        CategoryRule::new(
            Utilities,
            &["electricity", "water", "gas", "internet", "mobile", "phone"],
            &[r"electric\s*bill", r"water\s*bill", r"gas\s*bill", r"mobile\s*recharge"],
            None,
            Some(Monthly),
        ),
        CategoryRule::new(
            Food,
            &["food", "restaurant", "swiggy", "zomato", "grocery", "supermarket"],
            &[r"swiggy", r"zomato", r"restaurant", r"food\s*court"],
            None,
            None,
        ),
        CategoryRule::new(
            Transportation,
            &["uber", "ola", "taxi", "metro", "bus", "fuel", "petrol", "diesel"],
            &[r"uber", r"ola", r"fuel\s*station", r"petrol\s*pump"],
            None,
            None,
        ),
        CategoryRule::new(
            Medical,
            &["hospital", "medical", "doctor", "pharmacy", "medicine", "health"],
            &[r"hospital", r"medical\s*store", r"pharmacy", r"dr\s*\w+"],
            Some(Sec80D),
            None,
        ),
        CategoryRule::new(
            Education,
            &["school", "college", "university", "tuition", "education", "course"],
            &[r"school\s*fee", r"college\s*fee", r"tuition", r"education"],
            Some(Sec80C),
            Some(Yearly),
        ),
        CategoryRule::new(
            Investment,
            &["investment", "mutual fund", "stocks", "equity", "bond", "fd", "fixed deposit"],
            &[r"mutual\s*fund", r"equity\s*investment", r"fixed\s*deposit"],
            Some(Sec80C),
            None,
        ),
        CategoryRule::new(
            Shopping,
            &["amazon", "flipkart", "shopping", "mall", "store", "market"],
            &[r"amazon", r"flipkart", r"shopping\s*mall"],
            None,
            None,
        ),
        CategoryRule::new(
            Entertainment,
            &["movie", "cinema", "netflix", "prime", "spotify", "entertainment"],
            &[r"movie\s*ticket", r"netflix", r"amazon\s*prime", r"spotify"],
            None,
            None,
        ),
        CategoryRule::new(
            Atm,
            &["atm", "cash withdrawal", "withdrawal"],
            &[r"atm\s*withdrawal", r"cash\s*withdrawal"],
            None,
            None,
        ),
        CategoryRule::new(
            Transfer,
            &["transfer", "neft", "imps", "rtgs", "upi"],
            &[r"neft", r"imps", r"rtgs", r"upi", r"transfer"],
            None,
            None,
        ),
    ]
});

/// The ordered rule table. Loaded once, read-only afterwards.
pub fn rules() -> &'static [CategoryRule] {
    &RULES
}

/// Secondary keyword tables used to refine a category into a subcategory
fn subcategory_table(category: Category) -> &'static [(&'static str, &'static [&'static str])] {
    match category {
        Category::Food => &[
            ("Restaurant", &["restaurant", "hotel", "cafe", "food court"]),
            ("Delivery", &["swiggy", "zomato", "delivery"]),
            ("Grocery", &["grocery", "supermarket", "mall", "store"]),
        ],
        Category::Transportation => &[
            ("Cab", &["uber", "ola", "taxi"]),
            ("Fuel", &["petrol", "diesel", "fuel"]),
            ("Public", &["metro", "bus", "auto"]),
        ],
        Category::Utilities => &[
            ("Electricity", &["electric", "power", "mseb"]),
            ("Water", &["water", "municipal"]),
            ("Internet", &["internet", "broadband", "wifi"]),
            ("Mobile", &["mobile", "phone", "airtel", "jio", "vi"]),
        ],
        Category::Shopping => &[
            ("Online", &["amazon", "flipkart", "myntra"]),
            ("Offline", &["mall", "store", "market"]),
        ],
        _ => &[],
    }
}

fn subcategory(category: Category, desc_lower: &str) -> String {
    subcategory_table(category)
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| desc_lower.contains(k)))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| category.as_str().to_string())
}

fn from_rule(rule: &CategoryRule, desc_lower: &str) -> CategoryResult {
    let mut result = CategoryResult {
        category: rule.category,
        subcategory: subcategory(rule.category, desc_lower),
        tax_relevant: rule.tax_relevant,
        tax_section: rule.tax_section,
        is_recurring: rule.frequency.is_some(),
        recurring_frequency: rule.frequency,
    };

    // Insurance splits into health (80D) and life (80C)
    if rule.category == Category::Insurance {
        if ["health", "medical", "mediclaim"].iter().any(|t| desc_lower.contains(t)) {
            result.tax_section = Some(TaxSection::Sec80D);
            result.subcategory = "Health Insurance".to_string();
        } else {
            result.tax_section = Some(TaxSection::Sec80C);
            result.subcategory = "Life Insurance".to_string();
        }
    }

    result
}

fn untaxed(category: Category, subcategory: &str, frequency: Option<Frequency>) -> CategoryResult {
    CategoryResult {
        category,
        subcategory: subcategory.to_string(),
        tax_relevant: false,
        tax_section: None,
        is_recurring: frequency.is_some(),
        recurring_frequency: frequency,
    }
}

/// Amount-based fallback for narrations no rule recognizes
fn by_amount(desc_lower: &str, amount: f64) -> CategoryResult {
    if amount > LARGE_AMOUNT {
        let transfer = ["transfer", "neft", "imps"].iter().any(|t| desc_lower.contains(t));
        let sub = if transfer { "Large Transfer" } else { "Major Purchase" };
        return untaxed(Category::Investment, sub, None);
    }

    if amount < SMALL_AMOUNT && ["monthly", "subscription"].iter().any(|t| desc_lower.contains(t)) {
        return untaxed(Category::Entertainment, "Subscription", Some(Frequency::Monthly));
    }

    untaxed(Category::Others, "Miscellaneous", None)
}

/// Categorize a narration. Never fails: unknown input lands in Others.
pub fn categorize(description: &str, amount: f64) -> CategoryResult {
    let desc = description.trim().to_lowercase();

    match rules().iter().find(|r| r.matches(&desc)) {
        Some(rule) => from_rule(rule, &desc),
        None => by_amount(&desc, amount),
    }
}

/// Run the categorizer over a transaction and store the result on it
pub fn categorize_transaction(txn: &mut Transaction) {
    let result = categorize(&txn.description, txn.amount);
    txn.category = result.category;
    txn.subcategory = result.subcategory;
    txn.tax_relevant = result.tax_relevant;
    txn.tax_section = result.tax_section;
    txn.is_recurring = result.is_recurring;
    txn.recurring_frequency = result.recurring_frequency;
}

/// Categorize a whole batch in place
pub fn categorize_all(txns: &mut [Transaction]) {
    for t in txns.iter_mut() {
        categorize_transaction(t);
    }
    tracing::debug!(count = txns.len(), "categorized transactions");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Direction;
    use chrono::NaiveDate;

    #[test]
    fn test_rule_order_is_priority_order() {
        let order: Vec<Category> = rules().iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
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
            ]
        );
    }

    #[test]
    fn test_categorize_salary() {
        let r = categorize("SALARY CREDIT ACME TECH", 85_000.0);
        assert_eq!(r.category, Category::Salary);
        assert_eq!(r.tax_section, Some(TaxSection::Income));
        assert!(r.tax_relevant);
        assert_eq!(r.recurring_frequency, Some(Frequency::Monthly));
    }

    #[test]
    fn test_first_match_not_best_match() {
        // "investment" is a SIP keyword, and SIP is declared before Investment
        let r = categorize("Equity investment via broker", 5_000.0);
        assert_eq!(r.category, Category::Sip);

        // "home loan" hits EMI before anything housing related
        let r = categorize("HDFC home loan EMI", 32_000.0);
        assert_eq!(r.category, Category::Emi);
        assert_eq!(r.tax_section, Some(TaxSection::Sec24b));
    }

    #[test]
    fn test_insurance_splits_health_and_life() {
        let health = categorize("Star Health insurance renewal", 18_000.0);
        assert_eq!(health.category, Category::Insurance);
        assert_eq!(health.tax_section, Some(TaxSection::Sec80D));
        assert_eq!(health.subcategory, "Health Insurance");

        let mediclaim = categorize("Mediclaim policy renewal", 9_000.0);
        assert_eq!(mediclaim.tax_section, Some(TaxSection::Sec80D));

        let life = categorize("LIC policy 8812", 24_000.0);
        assert_eq!(life.tax_section, Some(TaxSection::Sec80C));
        assert_eq!(life.subcategory, "Life Insurance");
        assert_eq!(life.recurring_frequency, Some(Frequency::Yearly));
    }

    #[test]
    fn test_keyword_substrings_are_greedy() {
        // "premium" contains "emi", so EMI claims it before Insurance is tried
        assert_eq!(categorize("LIC premium", 24_000.0).category, Category::Emi);
    }

    #[test]
    fn test_subcategories() {
        assert_eq!(categorize("Swiggy order 1234", 450.0).subcategory, "Delivery");
        assert_eq!(categorize("Uber trip", 320.0).subcategory, "Cab");
        assert_eq!(categorize("MSEB electricity bill", 2_100.0).subcategory, "Electricity");
        assert_eq!(categorize("Flipkart order", 1_999.0).subcategory, "Online");
        // Categories without a subcategory table keep their own name
        assert_eq!(categorize("Apollo pharmacy", 640.0).subcategory, "Medical");
    }

    #[test]
    fn test_pattern_only_match() {
        // "dr <name>" is a Medical pattern without any Medical keyword
        let r = categorize("payment to dr sharma clinic", 1_500.0);
        assert_eq!(r.category, Category::Medical);
        assert_eq!(r.tax_section, Some(TaxSection::Sec80D));
    }

    #[test]
    fn test_amount_fallbacks() {
        let big = categorize("XYZ bullion traders", 75_000.0);
        assert_eq!(big.category, Category::Investment);
        assert_eq!(big.subcategory, "Major Purchase");
        assert!(!big.tax_relevant);

        let sub = categorize("cloud notes monthly plan", 299.0);
        assert_eq!(sub.category, Category::Entertainment);
        assert_eq!(sub.subcategory, "Subscription");
        assert!(sub.is_recurring);
        assert_eq!(sub.recurring_frequency, Some(Frequency::Monthly));

        let other = categorize("misc vendor 42", 1_200.0);
        assert_eq!(other.category, Category::Others);
        assert_eq!(other.subcategory, "Miscellaneous");
        assert_eq!(other.tax_section, None);
    }

    #[test]
    fn test_categorize_transaction_in_place() {
        let mut t = Transaction::new(
            NaiveDate::from_ymd_opt(2023, 7, 5).unwrap(),
            "House rent July",
            25_000.0,
            Direction::Debit,
        );
        categorize_transaction(&mut t);
        assert_eq!(t.category, Category::Rent);
        assert_eq!(t.tax_section, Some(TaxSection::Hra));
        assert!(t.is_recurring);
    }
}
