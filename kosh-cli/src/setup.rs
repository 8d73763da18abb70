use anyhow::Result;
use kosh_core::{TaxSection, deduction_limit};
use kosh_finance::format_inr;
use std::io::{self, Write};

use crate::state::{Profile, profile_path, read_profile, write_profile};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

fn parse_rupees(input: &str) -> Option<f64> {
    let cleaned: String = input.chars().filter(|c| !matches!(c, ',' | '₹' | ' ')).collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Ask until the answer is blank (keep `current`) or a valid amount
fn prompt_amount(label: &str, current: f64) -> Result<f64> {
    loop {
        let answer = prompt(&format!("{} [{}]", label, format_inr(current)))?;
        if answer.is_empty() {
            return Ok(current);
        }
        match parse_rupees(&answer) {
            Some(v) => return Ok(v),
            None => println!("  not an amount: {:?}", answer),
        }
    }
}

pub fn run_setup() -> Result<()> {
    println!("Kosh setup\n");
    println!("Declared deductions for the year (blank keeps the current value).");

    let mut profile = read_profile()?;
    for section in TaxSection::DEDUCTIBLE {
        let label = match deduction_limit(section) {
            Some(limit) => format!("Section {} (limit {})", section, format_inr(limit)),
            None => format!("Section {}", section),
        };
        let current = profile.deductions.get(&section).copied().unwrap_or(0.0);
        let amount = prompt_amount(&label, current)?;
        if amount > 0.0 {
            profile.deductions.insert(section, amount);
        } else {
            profile.deductions.remove(&section);
        }
    }

    loop {
        let answer = prompt("Current CIBIL score, if known (300-900, blank to skip)")?;
        if answer.is_empty() {
            break;
        }
        match answer.parse::<u32>() {
            Ok(score) if (300..=900).contains(&score) => {
                profile.cibil_score = Some(score);
                break;
            }
            _ => println!("  expected a number between 300 and 900"),
        }
    }

    let profile = Profile {
        created_at_utc: profile
            .created_at_utc
            .or_else(|| Some(chrono::Utc::now().to_rfc3339())),
        ..profile
    };
    write_profile(&profile)?;

    println!("\nWrote {}", profile_path()?.display());
    println!("\nNext:");
    println!("- kosh ingest <statement.csv>");
    println!("- kosh tax compute --file <statement.csv>");
    println!("- kosh cibil analyze --file <statement.csv>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rupees() {
        assert_eq!(parse_rupees("1,50,000"), Some(150_000.0));
        assert_eq!(parse_rupees("₹ 25000"), Some(25_000.0));
        assert_eq!(parse_rupees("-5"), None);
        assert_eq!(parse_rupees("lots"), None);
    }
}
