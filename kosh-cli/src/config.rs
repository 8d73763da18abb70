use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use kosh_finance::{FinancialYear, TaxTables};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_kosh_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tax: TaxSettings,
    #[serde(default)]
    pub cibil: CibilSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaxSettings {
    /// e.g. "2023-24"; when unset, the year of the latest transaction
    pub default_financial_year: Option<String>,
    /// TOML file with extra `[[year]]` tables
    pub tables: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CibilSettings {
    pub history_window_days: i64,
}

impl Default for CibilSettings {
    fn default() -> Self {
        Self {
            history_window_days: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    pub period_months: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self { period_months: 12 }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_kosh_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// Built-in tables plus any configured extra years
pub fn tax_tables(cfg: &Config) -> Result<TaxTables> {
    let mut tables = TaxTables::builtin();
    if let Some(path) = &cfg.tax.tables {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let added = tables
            .extend_from_toml(&text)
            .with_context(|| format!("load tax tables from {}", path.display()))?;
        tracing::debug!(added, path = %path.display(), "loaded extra tax tables");
    }
    Ok(tables)
}

/// Explicit flag, then config, then the year of the latest transaction, then today
pub fn financial_year(
    cfg: &Config,
    flag: Option<&str>,
    latest: Option<NaiveDate>,
) -> Result<FinancialYear> {
    if let Some(label) = flag.or(cfg.tax.default_financial_year.as_deref()) {
        return label
            .parse()
            .with_context(|| format!("financial year {:?}", label));
    }
    let date = latest.unwrap_or_else(|| Local::now().date_naive());
    Ok(FinancialYear::containing(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: Config = toml::from_str("[tax]\ndefault_financial_year = \"2023-24\"\n").unwrap();
        assert_eq!(cfg.cibil.history_window_days, 365);
        assert_eq!(cfg.dashboard.period_months, 12);
        assert!(cfg.tax.tables.is_none());
    }

    #[test]
    fn test_financial_year_precedence() {
        let cfg = Config::default();
        let latest = NaiveDate::from_ymd_opt(2024, 2, 10);
        assert_eq!(financial_year(&cfg, None, latest).unwrap(), FinancialYear(2023));
        assert_eq!(financial_year(&cfg, Some("2022-23"), latest).unwrap(), FinancialYear(2022));
        assert!(financial_year(&cfg, Some("2023"), latest).is_err());
    }
}
