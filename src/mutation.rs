use crate::catalog::{self, BugKind, CatalogEntry, CATALOG};
use crate::diff::{diff, DiffRange};
use crate::error::Result;
use crate::printer;
use crate::syntax::{SourceLanguage, SyntaxTree};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Result of one pass over a source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Kinds in the order they were applied. Empty means nothing to break.
    pub bugs: Vec<BugKind>,
    pub text: String,
    pub range: Option<DiffRange>,
}

impl MutationOutcome {
    pub fn is_empty(&self) -> bool {
        self.bugs.is_empty()
    }
}

/// Plant up to `max_count` bugs of distinct kinds in `tree`.
///
/// Every round draws a weighted order over the kinds not yet used and
/// applies the first one that finds a target. The run stops when the count
/// is reached, every kind is used, or no remaining kind finds anything.
pub fn run<R: Rng + ?Sized>(
    tree: &mut SyntaxTree,
    max_count: usize,
    rng: &mut R,
) -> Result<Vec<BugKind>> {
    let mut applied: Vec<BugKind> = Vec::new();

    while applied.len() < max_count {
        let pool: Vec<CatalogEntry> = CATALOG
            .iter()
            .filter(|entry| !applied.contains(&entry.kind))
            .copied()
            .collect();
        if pool.is_empty() {
            log::debug!("Catalog exhausted after {} bugs", applied.len());
            break;
        }

        let mut hit = None;
        for kind in weighted_order(&pool, rng)? {
            if catalog::apply(kind, tree)? {
                hit = Some(kind);
                break;
            }
        }

        match hit {
            Some(kind) => applied.push(kind),
            None => {
                log::debug!("No remaining kind finds a target");
                break;
            }
        }
    }

    Ok(applied)
}

/// Order `pool` by weighted sampling without replacement.
pub fn weighted_order<R: Rng + ?Sized>(pool: &[CatalogEntry], rng: &mut R) -> Result<Vec<BugKind>> {
    let mut remaining = pool.to_vec();
    let mut order = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let weights = WeightedIndex::new(remaining.iter().map(|entry| entry.weight))?;
        let picked = remaining.swap_remove(weights.sample(rng));
        order.push(picked.kind);
    }

    Ok(order)
}

/// Parse, mutate, print and diff one buffer.
pub fn mutate_source<R: Rng + ?Sized>(
    source: &str,
    language: SourceLanguage,
    max_count: usize,
    rng: &mut R,
) -> Result<MutationOutcome> {
    let mut tree = SyntaxTree::parse(source, language)?;
    let bugs = run(&mut tree, max_count, rng)?;

    if bugs.is_empty() {
        return Ok(MutationOutcome {
            bugs,
            text: source.to_string(),
            range: None,
        });
    }

    let text = printer::print(&tree, source)?;
    let range = diff(source, &text);
    Ok(MutationOutcome { bugs, text, range })
}
