use crate::catalog::BugKind;
use crate::diff::DiffRange;
use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// One sabotage, as written to the log and the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: String,
    pub file_path: String,
    pub file_uri: String,
    pub bugs: Vec<BugKind>,
    pub start_line: usize,
    pub end_line: usize,
    pub before_snippet: String,
    pub after_snippet: String,
}

impl HistoryEntry {
    pub fn new(path: &Path, bugs: Vec<BugKind>, range: &DiffRange, at: DateTime<Utc>) -> Self {
        let file_path = path.to_string_lossy().into_owned();
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        HistoryEntry {
            id: entry_id(&file_path, &timestamp, &range.after_snippet),
            file_uri: file_uri(path),
            timestamp,
            file_path,
            bugs,
            start_line: range.start_line,
            end_line: range.end_line,
            before_snippet: range.before_snippet.clone(),
            after_snippet: range.after_snippet.clone(),
        }
    }

    pub fn bug_names(&self) -> String {
        self.bugs
            .iter()
            .map(|bug| bug.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// First 16 hex characters of the SHA-256 over path, timestamp and snippet.
pub fn entry_id(file_path: &str, timestamp: &str, after_snippet: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(after_snippet.as_bytes());
    let hash_hex = format!("{:x}", hasher.finalize());
    hash_hex[..16].to_string()
}

pub fn file_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| PathBuf::from(path))
    });
    let display = absolute.to_string_lossy().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{}", display)
    } else {
        format!("file:///{}", display)
    }
}

/// Append one JSON line, creating the log and its directory on first use.
pub async fn append_log(log_path: &Path, entry: &HistoryEntry) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut line = serde_json::to_string(entry)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;

    log::debug!("Appended entry {} to {}", entry.id, log_path.display());
    Ok(())
}

/// Every entry in the log, oldest first. A missing log reads as empty.
pub async fn read_log(log_path: &Path) -> Result<Vec<HistoryEntry>> {
    if !fs::try_exists(log_path).await? {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(log_path).await?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample_range() -> DiffRange {
        DiffRange {
            start_line: 2,
            end_line: 2,
            after_end_line: 3,
            before_snippet: "  return x;".to_string(),
            after_snippet: "  let x = null;\n  return x;".to_string(),
        }
    }

    fn sample_entry(path: &Path) -> HistoryEntry {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        HistoryEntry::new(path, vec![BugKind::ScopeGaslighting], &sample_range(), at)
    }

    #[test]
    fn test_entry_fields() {
        let entry = sample_entry(Path::new("src/app.js"));
        assert_eq!(entry.timestamp, "2024-03-01T12:00:00.000Z");
        assert_eq!(entry.file_path, "src/app.js");
        assert!(entry.file_uri.starts_with("file://"));
        assert!(entry.file_uri.ends_with("src/app.js"));
        assert_eq!((entry.start_line, entry.end_line), (2, 2));
        assert_eq!(entry.id.len(), 16);
        assert!(entry.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_entry_id_is_stable() {
        let a = entry_id("a.js", "2024-01-01T00:00:00.000Z", "x");
        let b = entry_id("a.js", "2024-01-01T00:00:00.000Z", "x");
        let c = entry_id("a.js", "2024-01-01T00:00:00.001Z", "x");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_camel_case_json() {
        let entry = sample_entry(Path::new("a.js"));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["filePath"], "a.js");
        assert_eq!(json["startLine"], 2);
        assert_eq!(json["bugs"][0], "scopeGaslighting");
        assert!(json.get("beforeSnippet").is_some());
    }

    #[tokio::test]
    async fn test_append_and_read_log() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nested").join("history.jsonl");

        let first = sample_entry(Path::new("a.js"));
        let second = sample_entry(Path::new("b.js"));
        append_log(&log_path, &first).await.unwrap();
        append_log(&log_path, &second).await.unwrap();

        let entries = read_log(&log_path).await.unwrap();
        assert_eq!(entries, vec![first, second]);
    }

    #[tokio::test]
    async fn test_read_missing_log() {
        let dir = tempdir().unwrap();
        let entries = read_log(&dir.path().join("none.jsonl")).await.unwrap();
        assert!(entries.is_empty());
    }
}
