use anyhow::{Context, Result};
use kosh_core::TaxSection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// `$KOSH_HOME`, else `~/.kosh`
pub fn kosh_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("KOSH_HOME")
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".kosh"))
}

pub fn ensure_kosh_home() -> Result<PathBuf> {
    let dir = kosh_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Declared facts the statements cannot show
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    pub created_at_utc: Option<String>,
    /// Declared deductions per section, before capping
    #[serde(default)]
    pub deductions: BTreeMap<TaxSection, f64>,
    /// Self-reported bureau score
    #[serde(default)]
    pub cibil_score: Option<u32>,
}

pub fn profile_path() -> Result<PathBuf> {
    Ok(ensure_kosh_home()?.join("profile.json"))
}

pub fn history_path() -> Result<PathBuf> {
    Ok(ensure_kosh_home()?.join("cibil_history.jsonl"))
}

pub fn write_profile(profile: &Profile) -> Result<()> {
    let p = profile_path()?;
    let json = serde_json::to_string_pretty(profile)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn read_profile() -> Result<Profile> {
    let p = profile_path()?;
    if !p.exists() {
        return Ok(Profile::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}
