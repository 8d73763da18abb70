//! Append-only CIBIL analysis history, one JSON record per line

use anyhow::{Context, Result};
use kosh_finance::CibilAnalysisRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub fn append_record(path: &Path, record: &CibilAnalysisRecord) -> Result<()> {
    let line = serde_json::to_string(record).context("serialize cibil record")?;
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    writeln!(f, "{}", line).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Oldest first. Unreadable lines are reported and skipped.
pub fn read_history(path: &Path) -> Result<Vec<CibilAnalysisRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CibilAnalysisRecord>(line) {
            Ok(r) => out.push(r),
            Err(e) => tracing::warn!(line = i + 1, error = %e, "skipping unreadable history entry"),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kosh_finance::analyze_cibil;

    #[test]
    fn test_append_then_read() {
        let dir = std::env::temp_dir().join(format!("kosh-history-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cibil_history.jsonl");
        let _ = fs::remove_file(&path);

        append_record(&path, &analyze_cibil(&[], None)).unwrap();
        append_record(&path, &analyze_cibil(&[], Some(720))).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{not json}\n")
            .unwrap();

        let records = read_history(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].current_score, Some(720));
        assert_eq!(records[0].predicted_score, 600);

        fs::remove_dir_all(&dir).unwrap();
    }
}
