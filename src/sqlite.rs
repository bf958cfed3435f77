use rusqlite::{params, Connection, Result};
use std::fs;
use std::path::Path;

use crate::catalog::BugKind;
use crate::history::HistoryEntry;

const DEFAULT_DB_DIR: &str = "db";

fn _check_schema(connection: &Connection) -> Result<()> {
    log::info!("SQLite option: Checking schema integrity...");

    let exists: bool = connection.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='sabotages';",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            Some("Missing table: sabotages".to_string()),
        ));
    }

    let columns = [
        "id",
        "timestamp",
        "file_path",
        "file_uri",
        "bugs",
        "start_line",
        "end_line",
        "before_snippet",
        "after_snippet",
    ];

    let mut stmt = connection.prepare("PRAGMA table_xinfo(sabotages);")?;
    let column_names: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(Result::ok)
        .collect();

    for col in columns {
        if !column_names.iter().any(|name| name == col) {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(format!("Missing column '{}' in table 'sabotages'", col)),
            ));
        }
    }

    log::info!("SQLite option: Schema verified successfully.");
    Ok(())
}

fn _createdb(connection: &Connection) -> Result<()> {
    log::info!("SQLite option: New db detected, creating schema...");

    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sabotages (
            id              TEXT PRIMARY KEY,
            timestamp       TEXT NOT NULL,
            file_path       TEXT NOT NULL,
            file_uri        TEXT NOT NULL,
            bugs            TEXT NOT NULL,
            start_line      INTEGER NOT NULL,
            end_line        INTEGER NOT NULL,
            before_snippet  TEXT NOT NULL,
            after_snippet   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sabotages_file ON sabotages(file_path);
        CREATE INDEX IF NOT EXISTS idx_sabotages_timestamp ON sabotages(timestamp);
    ",
    )?;

    Ok(())
}

/// Create the database and schema on first use, otherwise verify the schema.
pub fn check_db(db_path: &Path) -> Result<()> {
    log::info!("SQLite option: Checking if db exist...");
    let is_new_db = !db_path.exists();

    let parent = db_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new(DEFAULT_DB_DIR));
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(format!("FAIL creating folder {}: {}", parent.display(), e)),
            )
        })?;
    }

    let connection = Connection::open(db_path)?;

    if is_new_db {
        _createdb(&connection)?;
    } else {
        log::info!("SQLite option: Current db exists!");
        _check_schema(&connection)?;
    }

    Ok(())
}

pub fn store_entry(db_path: &Path, entry: &HistoryEntry) -> Result<()> {
    log::info!("SQLite option: Storing entry {} on {}", entry.id, db_path.display());
    let connection = Connection::open(db_path)?;

    let bugs = serde_json::to_string(&entry.bugs)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    connection.execute(
        "
        INSERT OR REPLACE INTO sabotages
            (id, timestamp, file_path, file_uri, bugs, start_line, end_line, before_snippet, after_snippet)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);
    ",
        params![
            entry.id,
            entry.timestamp,
            entry.file_path,
            entry.file_uri,
            bugs,
            entry.start_line as i64,
            entry.end_line as i64,
            entry.before_snippet,
            entry.after_snippet
        ],
    )?;

    Ok(())
}

/// Stored entries, oldest first, optionally limited to one file.
pub fn load_entries(db_path: &Path, file_path: Option<&str>) -> Result<Vec<HistoryEntry>> {
    let connection = Connection::open(db_path)?;
    let mut stmt = connection.prepare(
        "
        SELECT id, timestamp, file_path, file_uri, bugs, start_line, end_line, before_snippet, after_snippet
        FROM sabotages
        WHERE ?1 IS NULL OR file_path = ?1
        ORDER BY timestamp ASC;
    ",
    )?;

    let rows = stmt.query_map(params![file_path], |row| {
        let bugs_json: String = row.get(4)?;
        let bugs: Vec<BugKind> = serde_json::from_str(&bugs_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(HistoryEntry {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            file_path: row.get(2)?,
            file_uri: row.get(3)?,
            bugs,
            start_line: row.get::<_, i64>(5)? as usize,
            end_line: row.get::<_, i64>(6)? as usize,
            before_snippet: row.get(7)?,
            after_snippet: row.get(8)?,
        })
    })?;

    rows.collect()
}
