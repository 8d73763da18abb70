use anyhow::{Context, Result, bail};
use chrono::{Duration, Local, Months, NaiveDate};
use clap::{Parser, Subcommand};
use kosh_core::{TaxSection, Transaction, categorize, tax_deduction_suggestions};
use kosh_finance::cibil::{NamedSimulation, ScenarioFlag, analyze_cibil, best_scenario, simulate};
use kosh_finance::summary::{FinancialSummary, insights};
use kosh_finance::tax::{TaxCalculator, TaxScenario, suggest};
use kosh_finance::{FinancialYear, format_inr};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod dashboard;
mod history;
mod report;
mod setup;
mod state;

#[derive(Parser, Debug)]
#[command(name = "kosh", version, about = "Personal finance for Indian taxpayers: tax regimes, deductions and CIBIL estimates")]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive setup: declared deductions and current CIBIL score
    Setup,

    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Categorize a single narration
    Categorize {
        description: String,

        #[arg(long, default_value_t = 0.0)]
        amount: f64,
    },

    /// Parse a statement (.csv or extracted .txt) and list categorized transactions
    Ingest {
        file: PathBuf,

        /// Also write the categorized transactions as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Income tax under the old and new regimes
    Tax {
        #[command(subcommand)]
        command: TaxCommand,
    },

    /// Transaction-based CIBIL score estimate
    Cibil {
        #[command(subcommand)]
        command: CibilCommand,
    },

    /// Income, spending and savings over a period
    Summary {
        #[arg(long)]
        file: PathBuf,

        /// First day (YYYY-MM-DD); default: start of the configured period
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD); default: the latest transaction
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Terminal dashboard: tax comparison, CIBIL gauge, spending
    Dashboard {
        #[arg(long)]
        file: PathBuf,

        /// Financial year, e.g. 2023-24
        #[arg(long)]
        year: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default ~/.kosh/config.toml
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand, Debug)]
enum TaxCommand {
    /// Compute the year's tax from a statement
    Compute {
        #[arg(long)]
        file: PathBuf,

        /// Financial year, e.g. 2023-24
        #[arg(long)]
        year: Option<String>,

        /// Extra declared deduction, e.g. 80C=50000 (repeatable)
        #[arg(long = "deduction", value_parser = parse_claim)]
        deductions: Vec<(TaxSection, f64)>,
    },

    /// Suggest how to use the remaining deduction headroom
    Optimize {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        year: Option<String>,

        #[arg(long = "deduction", value_parser = parse_claim)]
        deductions: Vec<(TaxSection, f64)>,
    },

    /// Compare regimes for a gross income under named deduction scenarios
    Simulate {
        #[arg(long)]
        income: f64,

        #[arg(long)]
        year: Option<String>,

        /// name:80C=150000,80D=25000 (repeatable)
        #[arg(long = "scenario", value_parser = parse_scenario)]
        scenarios: Vec<TaxScenario>,
    },
}

#[derive(Subcommand, Debug)]
enum CibilCommand {
    /// Analyze a statement and record the result in the history
    Analyze {
        #[arg(long)]
        file: PathBuf,

        /// Current bureau score, overriding the profile
        #[arg(long)]
        score: Option<u32>,

        /// Do not append to ~/.kosh/cibil_history.jsonl
        #[arg(long)]
        no_save: bool,
    },

    /// Project the effect of behavior changes on a score
    Simulate {
        /// Starting score; default: profile score, else latest history entry
        #[arg(long)]
        score: Option<u32>,

        /// pay_off_credit_cards, never_miss_payments, add_credit_type, no_new_applications
        #[arg(long = "change")]
        changes: Vec<ScenarioFlag>,

        /// Run every change alone and together, and report the best
        #[arg(long)]
        compare: bool,
    },

    /// List recorded analyses
    History,
}

fn parse_claim(s: &str) -> std::result::Result<(TaxSection, f64), String> {
    let (section, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SECTION=AMOUNT, got {:?}", s))?;
    let section = TaxSection::parse(section).ok_or_else(|| format!("unknown section {:?}", section))?;
    let amount: f64 = amount
        .replace(',', "")
        .trim()
        .parse()
        .map_err(|_| format!("bad amount {:?}", amount))?;
    Ok((section, amount))
}

/// Splits `80C=1,50,000,80D=25000` into claims. A comma starts a new claim
/// only when the next piece carries its own `SECTION=`.
fn split_claims(claims: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for group in claims.split(';') {
        let mut current: Option<String> = None;
        for piece in group.split(',') {
            match current.as_mut() {
                Some(claim) if !piece.contains('=') => {
                    claim.push(',');
                    claim.push_str(piece);
                }
                _ => {
                    out.extend(current.take());
                    current = Some(piece.to_string());
                }
            }
        }
        out.extend(current);
    }
    out.retain(|c| !c.trim().is_empty());
    out
}

fn parse_scenario(s: &str) -> std::result::Result<TaxScenario, String> {
    let (name, claims) = s.split_once(':').unwrap_or((s, ""));
    let mut deductions = BTreeMap::new();
    for claim in split_claims(claims) {
        let (section, amount) = parse_claim(&claim)?;
        *deductions.entry(section).or_insert(0.0) += amount;
    }
    Ok(TaxScenario {
        name: name.trim().to_string(),
        deductions,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .init();

    let json = cli.json;
    match cli.command {
        Command::Setup => setup::run_setup()?,

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}\n", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Categorize { description, amount } => {
            let result = categorize(&description, amount);
            if json {
                print_json(&result)?;
            } else {
                report::print_category(&description, amount, &result);
            }
        }

        Command::Ingest { file, out } => {
            let txns = load(&file)?;
            if let Some(out) = out {
                let body = serde_json::to_string_pretty(&txns)?;
                std::fs::write(&out, body).with_context(|| format!("write {}", out.display()))?;
                tracing::info!(path = %out.display(), count = txns.len(), "wrote transactions");
            }
            if json {
                print_json(&txns)?;
            } else {
                report::print_transactions(&txns);
                let sections = tax_deduction_suggestions(&txns);
                if !sections.is_empty() {
                    println!("\nTax-relevant spending");
                    for s in sections {
                        println!(
                            "  {:<6} {} in {} transactions, deductible {}",
                            s.section,
                            format_inr(s.total_amount),
                            s.transaction_count,
                            format_inr(s.potential_deduction)
                        );
                    }
                }
            }
        }

        Command::Tax { command } => run_tax(command, json)?,
        Command::Cibil { command } => run_cibil(command, json)?,

        Command::Summary { file, from, to } => {
            let cfg = config::load_config()?;
            let txns = load(&file)?;
            let (start, end) = period(&txns, from, to, cfg.dashboard.period_months);
            let summary = FinancialSummary::build(&txns, start, end);
            let profile = state::read_profile()?;
            let tax_savings = match year_tax(&cfg, &txns, None, &profile.deductions) {
                Ok((_, r)) => r.potential_savings,
                Err(e) => {
                    tracing::warn!(error = %format!("{:#}", e), "no tax comparison for this period");
                    0.0
                }
            };
            let found = insights(&summary, tax_savings, profile.cibil_score);
            if json {
                print_json(&serde_json::json!({ "summary": summary, "insights": found }))?;
            } else {
                report::print_summary(&summary, &found);
            }
        }

        Command::Dashboard { file, year } => {
            let cfg = config::load_config()?;
            let profile = state::read_profile()?;
            let txns = load(&file)?;
            let (_, tax) = year_tax(&cfg, &txns, year.as_deref(), &profile.deductions)?;
            let window = cibil_window(&txns, cfg.cibil.history_window_days);
            let cibil = analyze_cibil(&window, profile.cibil_score);
            let (start, end) = period(&txns, None, None, cfg.dashboard.period_months);
            let summary = FinancialSummary::build(&txns, start, end);
            let found = insights(&summary, tax.potential_savings, profile.cibil_score);
            dashboard::run_dashboard(&dashboard::DashboardData {
                tax,
                cibil,
                summary,
                insights: found,
            })?;
        }
    }

    Ok(())
}

fn run_tax(command: TaxCommand, json: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let profile = state::read_profile()?;

    match command {
        TaxCommand::Compute { file, year, deductions } => {
            let txns = load(&file)?;
            let declared = merge_claims(&profile.deductions, &deductions);
            let (calc, result) = year_tax(&cfg, &txns, year.as_deref(), &declared)?;
            let utilization = calc.deduction_utilization(&result.breakdown.deductions);
            if json {
                print_json(&serde_json::json!({ "result": result, "utilization": utilization }))?;
            } else {
                report::print_tax_result(&result);
                report::print_utilization(&utilization);
            }
        }

        TaxCommand::Optimize { file, year, deductions } => {
            let txns = load(&file)?;
            let declared = merge_claims(&profile.deductions, &deductions);
            let (_, result) = year_tax(&cfg, &txns, year.as_deref(), &declared)?;
            let suggestions = suggest(
                result.gross_income,
                &result.breakdown.deductions,
                &result.breakdown.expenses,
            );
            if json {
                print_json(&suggestions)?;
            } else {
                report::print_optimization(&suggestions);
            }
        }

        TaxCommand::Simulate { income, year, scenarios } => {
            let fy = config::financial_year(&cfg, year.as_deref(), None)?;
            let calc = TaxCalculator::for_year(&config::tax_tables(&cfg)?, fy)?;
            let outcomes = calc.simulate_scenarios(income, &scenarios);
            if json {
                print_json(&outcomes)?;
            } else {
                println!("# FY {} at gross income {}\n", fy, format_inr(income));
                report::print_scenarios(&outcomes);
            }
        }
    }
    Ok(())
}

fn run_cibil(command: CibilCommand, json: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let profile = state::read_profile()?;
    let history_path = state::history_path()?;

    match command {
        CibilCommand::Analyze { file, score, no_save } => {
            let txns = load(&file)?;
            let window = cibil_window(&txns, cfg.cibil.history_window_days);
            let record = analyze_cibil(&window, score.or(profile.cibil_score));
            if !no_save {
                history::append_record(&history_path, &record)?;
                tracing::debug!(path = %history_path.display(), "recorded cibil analysis");
            }
            if json {
                print_json(&record)?;
            } else {
                report::print_cibil(&record);
            }
        }

        CibilCommand::Simulate { score, changes, compare } => {
            let start = match score.or(profile.cibil_score) {
                Some(s) => s,
                None => match history::read_history(&history_path)?.last() {
                    Some(r) => r.current_score.unwrap_or(r.predicted_score),
                    None => bail!("no score to start from (pass --score, run `kosh setup`, or `kosh cibil analyze`)"),
                },
            };

            if compare {
                let singles = if changes.is_empty() { ScenarioFlag::ALL.to_vec() } else { changes.clone() };
                let mut runs: Vec<NamedSimulation> = singles
                    .iter()
                    .map(|flag| NamedSimulation {
                        scenario: flag.to_string(),
                        flags: vec![*flag],
                        outcome: simulate(start, &[*flag]),
                    })
                    .collect();
                runs.push(NamedSimulation {
                    scenario: "all_changes".to_string(),
                    flags: singles.clone(),
                    outcome: simulate(start, &singles),
                });
                let best = best_scenario(&runs);
                if json {
                    print_json(&serde_json::json!({ "scenarios": runs, "best": best }))?;
                } else {
                    for r in &runs {
                        report::print_simulation(&r.scenario, &r.outcome);
                    }
                    if let Some(best) = &best {
                        report::print_best(best);
                    }
                }
            } else {
                let outcome = simulate(start, &changes);
                if json {
                    print_json(&outcome)?;
                } else {
                    report::print_simulation("projection", &outcome);
                }
            }
        }

        CibilCommand::History => {
            let records = history::read_history(&history_path)?;
            if json {
                print_json(&records)?;
            } else {
                report::print_history(&records);
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

fn load(file: &Path) -> Result<Vec<Transaction>> {
    if !file.exists() {
        bail!("statement not found: {}", file.display());
    }
    let txns = kosh_ingest::load_transactions(file)
        .with_context(|| format!("loading {}", file.display()))?;
    tracing::info!(count = txns.len(), file = %file.display(), "loaded transactions");
    Ok(txns)
}

/// Profile deductions with command-line claims added on top
fn merge_claims(
    profile: &BTreeMap<TaxSection, f64>,
    extra: &[(TaxSection, f64)],
) -> BTreeMap<TaxSection, f64> {
    let mut out = profile.clone();
    for (section, amount) in extra {
        *out.entry(*section).or_insert(0.0) += amount;
    }
    out
}

fn year_tax(
    cfg: &config::Config,
    txns: &[Transaction],
    year: Option<&str>,
    declared: &BTreeMap<TaxSection, f64>,
) -> Result<(TaxCalculator, kosh_finance::TaxResult)> {
    let latest = txns.iter().map(|t| t.date).max();
    let fy: FinancialYear = config::financial_year(cfg, year, latest)?;
    let calc = TaxCalculator::for_year(&config::tax_tables(cfg)?, fy)?;
    let result = calc.compute(txns, declared);
    Ok((calc, result))
}

/// Transactions within `days` of the latest one
fn cibil_window(txns: &[Transaction], days: i64) -> Vec<Transaction> {
    let Some(latest) = txns.iter().map(|t| t.date).max() else {
        return Vec::new();
    };
    let cutoff = latest - Duration::days(days.max(0));
    txns.iter().filter(|t| t.date > cutoff).cloned().collect()
}

/// Explicit bounds, else the last `months` months ending at the latest transaction
fn period(
    txns: &[Transaction],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    months: u32,
) -> (NaiveDate, NaiveDate) {
    let end = to
        .or_else(|| txns.iter().map(|t| t.date).max())
        .unwrap_or_else(|| Local::now().date_naive());
    let start = from.unwrap_or_else(|| {
        end.checked_sub_months(Months::new(months.max(1)))
            .and_then(|d| d.succ_opt())
            .unwrap_or(end)
    });
    (start, end)
}
