use crate::error::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MIN_BUGS: usize = 1;
pub const MAX_BUGS: usize = 10;
pub const DEFAULT_BUGS_PER_RUN: usize = 3;
pub const DEFAULT_HISTORY_LOG: &str = ".saboteur/history.jsonl";

/// Candidate counts for the save path.
const SAVE_COUNTS: [usize; 3] = [1, 2, 3];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Requested bugs for a manual run. Clamped on read.
    pub bugs_per_run: usize,
    /// Fixed count for the save path; sampled per event when unset.
    pub bugs_per_save: Option<usize>,
    /// JSON Lines history. `None` disables the log.
    pub history_log: Option<PathBuf>,
    pub sqlite: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bugs_per_run: DEFAULT_BUGS_PER_RUN,
            bugs_per_save: None,
            history_log: Some(PathBuf::from(DEFAULT_HISTORY_LOG)),
            sqlite: None,
        }
    }
}

impl Config {
    /// Read a JSON config file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_json::from_str(&content)?;
                log::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    pub fn bugs_per_run(&self) -> usize {
        clamp_count(self.bugs_per_run)
    }

    pub fn sample_bugs_per_save<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self.bugs_per_save {
            Some(count) => clamp_count(count),
            None => SAVE_COUNTS[rng.gen_range(0..SAVE_COUNTS.len())],
        }
    }
}

pub fn clamp_count(count: usize) -> usize {
    count.clamp(MIN_BUGS, MAX_BUGS)
}
