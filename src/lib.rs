//! # Saboteur
//!
//! Plants small, plausible bugs in JavaScript and TypeScript sources.
//!
//! This library provides functionality to:
//! - Parse a source file into a formatting-preserving syntax tree
//! - Apply a weighted, non-repeating selection from a catalog of bug kinds
//! - Normalize the regenerated text to the original line endings
//! - Compute the changed line range and keep a history of every sabotage
//!
//! ## Example
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use saboteur::mutation::mutate_source;
//! use saboteur::syntax::SourceLanguage;
//!
//! fn main() -> saboteur::Result<()> {
//!     let mut rng = StdRng::seed_from_u64(7);
//!     let outcome = mutate_source(
//!         "for (let i = 0; i < n; i++) { total += i; }\n",
//!         SourceLanguage::JavaScript,
//!         2,
//!         &mut rng,
//!     )?;
//!
//!     for bug in &outcome.bugs {
//!         println!("planted {}", bug);
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod diff;
pub mod error;
pub mod guard;
pub mod history;
pub mod homoglyph;
pub mod mutation;
pub mod operators;
pub mod printer;
pub mod rules;
pub mod scope;
pub mod session;
pub mod sqlite;
pub mod syntax;

pub use error::{Result, SabotageError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{BugKind, CATALOG};
    pub use crate::config::Config;
    pub use crate::diff::{diff, DiffRange};
    pub use crate::error::{Result, SabotageError};
    pub use crate::history::HistoryEntry;
    pub use crate::mutation::{mutate_source, run, MutationOutcome};
    pub use crate::session::{collect_sources, SabotageReport, Session};
    pub use crate::syntax::{SourceLanguage, SyntaxTree};
}
