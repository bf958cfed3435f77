use crate::catalog::BugKind;
use crate::config::Config;
use crate::error::{Result, SabotageError};
use crate::guard::EditGuard;
use crate::history::{self, HistoryEntry};
use crate::mutation::mutate_source;
use crate::sqlite;
use crate::syntax::SourceLanguage;
use anyhow::Context;
use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// What happened to one file.
#[derive(Debug, Clone)]
pub struct SabotageReport {
    pub path: PathBuf,
    /// Empty when nothing in the file could be broken.
    pub bugs: Vec<BugKind>,
    /// `None` for untouched files and dry runs.
    pub entry: Option<HistoryEntry>,
}

impl SabotageReport {
    pub fn is_empty(&self) -> bool {
        self.bugs.is_empty()
    }
}

/// Stand-in for an editor integration: owns the configuration, the RNG and
/// the guard that keeps our own writes from re-triggering the save path.
pub struct Session<R: Rng> {
    config: Config,
    rng: R,
    guard: EditGuard,
    dry_run: bool,
}

impl<R: Rng> Session<R> {
    pub fn new(config: Config, rng: R) -> Result<Self> {
        if let Some(ref db_path) = config.sqlite {
            sqlite::check_db(db_path)?;
        }
        Ok(Session {
            config,
            rng,
            guard: EditGuard::new(),
            dry_run: false,
        })
    }

    /// Mutate in memory only: nothing is written back or recorded.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn guard(&self) -> &EditGuard {
        &self.guard
    }

    /// Manual invocation, using the configured bugs per run.
    pub async fn break_file(&mut self, path: &Path) -> Result<SabotageReport> {
        let count = self.config.bugs_per_run();
        self.sabotage(path, count).await
    }

    /// Save hook. Returns `None` when the save was caused by our own edit.
    pub async fn on_save(&mut self, path: &Path) -> Result<Option<SabotageReport>> {
        if !self.guard.should_handle_save() {
            log::debug!("Ignoring save of {} during own edit", path.display());
            return Ok(None);
        }
        let count = self.config.sample_bugs_per_save(&mut self.rng);
        self.sabotage(path, count).await.map(Some)
    }

    async fn sabotage(&mut self, path: &Path, count: usize) -> Result<SabotageReport> {
        let language = SourceLanguage::from_path(path).ok_or_else(|| {
            SabotageError::InvalidInput(format!("Unsupported file type: {}", path.display()))
        })?;

        let original = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let outcome = mutate_source(&original, language, count, &mut self.rng)?;
        let range = match outcome.range {
            Some(ref range) if !outcome.bugs.is_empty() => range.clone(),
            _ => {
                log::info!("Nothing to break in {}", path.display());
                return Ok(SabotageReport {
                    path: path.to_path_buf(),
                    bugs: outcome.bugs,
                    entry: None,
                });
            }
        };

        if self.dry_run {
            return Ok(SabotageReport {
                path: path.to_path_buf(),
                bugs: outcome.bugs,
                entry: None,
            });
        }

        {
            let _own_edit = self.guard.begin_own_edit()?;
            tokio::fs::write(path, &outcome.text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        let entry = HistoryEntry::new(path, outcome.bugs.clone(), &range, Utc::now());
        if let Some(ref log_path) = self.config.history_log {
            history::append_log(log_path, &entry).await?;
        }
        if let Some(ref db_path) = self.config.sqlite {
            sqlite::store_entry(db_path, &entry)?;
        }

        log::info!(
            "Planted {} in {} (lines {}-{})",
            entry.bug_names(),
            path.display(),
            entry.start_line,
            entry.end_line
        );

        Ok(SabotageReport {
            path: path.to_path_buf(),
            bugs: outcome.bugs,
            entry: Some(entry),
        })
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "node_modules" || name.starts_with('.')
}

/// Expand directories into the supported source files beneath them.
///
/// Explicit file arguments are kept as given so an unsupported extension
/// surfaces as an error later instead of being skipped silently.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    for path in paths {
        if !path.is_dir() {
            sources.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped_dir(entry));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && SourceLanguage::from_path(entry.path()).is_some() {
                sources.push(entry.into_path());
            }
        }
    }

    Ok(sources)
}
