use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use saboteur::config::{clamp_count, Config};
use saboteur::history::{self, HistoryEntry};
use saboteur::session::{collect_sources, SabotageReport, Session};
use saboteur::sqlite;
use saboteur::{Result, SabotageError};

#[derive(Parser)]
#[command(name = "saboteur")]
#[command(about = "Plants small, plausible bugs in JavaScript and TypeScript files")]
struct Cli {
    /// Print debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Break the given files, or every source file under the given folders
    Break {
        /// Files or folders to sabotage
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Bugs per file (1-10, default from config)
        #[arg(short, long)]
        count: Option<usize>,

        /// Seed for reproducible runs
        #[arg(short, long)]
        seed: Option<u64>,

        /// Report what would be planted without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Path to a JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Optional path to SQLite database file (default: db/saboteur.db)
        #[arg(long, value_name = "PATH")]
        sqlite: Option<Option<PathBuf>>,

        /// Do not append to the history log
        #[arg(long)]
        no_log: bool,
    },
    /// Handle a save event for one file
    OnSave {
        file: PathBuf,

        #[arg(short, long)]
        seed: Option<u64>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Optional path to SQLite database file (default: db/saboteur.db)
        #[arg(long, value_name = "PATH")]
        sqlite: Option<Option<PathBuf>>,
    },
    /// Show previous sabotages
    History {
        /// Only entries for this file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Read from SQLite instead of the log (default: db/saboteur.db)
        #[arg(long, value_name = "PATH")]
        sqlite: Option<Option<PathBuf>>,

        /// Path to a JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print raw JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn db_path(sqlite: Option<Option<PathBuf>>) -> Option<PathBuf> {
    match sqlite {
        Some(Some(path)) => {
            let mut full_path = PathBuf::from("db");
            full_path.push(path);
            Some(full_path)
        }
        Some(None) => Some(PathBuf::from("db/saboteur.db")),
        None => None,
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_report(report: &SabotageReport, dry_run: bool) {
    if report.is_empty() {
        println!("{}: nothing to break", report.path.display());
        return;
    }

    let names: Vec<&str> = report.bugs.iter().map(|bug| bug.as_str()).collect();
    let verb = if dry_run { "would plant" } else { "planted" };
    println!("{}: {} {}", report.path.display(), verb, names.join(", "));

    if let Some(ref entry) = report.entry {
        println!("  lines {}-{} [{}]", entry.start_line, entry.end_line, entry.id);
    }
}

fn print_entry(entry: &HistoryEntry) {
    println!(
        "{} {} lines {}-{}: {}",
        entry.timestamp,
        entry.file_path,
        entry.start_line,
        entry.end_line,
        entry.bug_names()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::Level::Debug
    } else {
        log::Level::Warn
    };
    simple_logger::init_with_level(level)
        .map_err(|e| SabotageError::InvalidInput(format!("Failed to init logger: {}", e)))?;

    match cli.command {
        Commands::Break {
            paths,
            count,
            seed,
            dry_run,
            config,
            sqlite,
            no_log,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(count) = count {
                if count != clamp_count(count) {
                    return Err(SabotageError::InvalidInput(
                        "--count must be between 1 and 10".to_string(),
                    ));
                }
                config.bugs_per_run = count;
            }
            if let Some(path) = db_path(sqlite) {
                config.sqlite = Some(path);
            }
            if no_log {
                config.history_log = None;
            }

            let files = collect_sources(&paths)?;
            if files.is_empty() {
                println!("No JavaScript or TypeScript files found");
                return Ok(());
            }

            let mut session = Session::new(config, make_rng(seed))?.with_dry_run(dry_run);
            for file in files {
                let report = session.break_file(&file).await?;
                print_report(&report, dry_run);
            }
        }
        Commands::OnSave {
            file,
            seed,
            config,
            sqlite,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(path) = db_path(sqlite) {
                config.sqlite = Some(path);
            }

            let mut session = Session::new(config, make_rng(seed))?;
            if let Some(report) = session.on_save(&file).await? {
                print_report(&report, false);
            }
        }
        Commands::History {
            file,
            sqlite,
            config,
            json,
        } => {
            let config = Config::load(config.as_deref())?;
            let file_filter = file.map(|path| path.to_string_lossy().into_owned());

            let entries = match db_path(sqlite) {
                Some(path) => {
                    sqlite::check_db(&path)?;
                    sqlite::load_entries(&path, file_filter.as_deref())?
                }
                None => match config.history_log {
                    Some(ref log_path) => history::read_log(log_path)
                        .await?
                        .into_iter()
                        .filter(|entry| {
                            file_filter
                                .as_deref()
                                .map_or(true, |wanted| entry.file_path == wanted)
                        })
                        .collect(),
                    None => {
                        return Err(SabotageError::InvalidInput(
                            "History log is disabled; use --sqlite".to_string(),
                        ))
                    }
                },
            };

            if entries.is_empty() {
                println!("No sabotage recorded yet");
            }
            for entry in &entries {
                if json {
                    println!("{}", serde_json::to_string(entry)?);
                } else {
                    print_entry(entry);
                }
            }
        }
    }

    Ok(())
}
