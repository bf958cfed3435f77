use crate::error::Result;
use crate::rules;
use crate::syntax::{Edit, SyntaxTree};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of bugs the catalog knows how to plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BugKind {
    BooleanNegation,
    OffByOne,
    LogicalAndOrSwap,
    ComparisonDirectionFlip,
    EqualityInequalityFlip,
    InvertTernaryBranches,
    WrongArithmeticOperator,
    BitwiseLogicalSwap,
    IndexOffByOne,
    GeneralBoundaryOffByOne,
    HomoglyphSabotage,
    ScopeGaslighting,
}

impl BugKind {
    pub const ALL: [BugKind; 12] = [
        BugKind::BooleanNegation,
        BugKind::OffByOne,
        BugKind::LogicalAndOrSwap,
        BugKind::ComparisonDirectionFlip,
        BugKind::EqualityInequalityFlip,
        BugKind::InvertTernaryBranches,
        BugKind::WrongArithmeticOperator,
        BugKind::BitwiseLogicalSwap,
        BugKind::IndexOffByOne,
        BugKind::GeneralBoundaryOffByOne,
        BugKind::HomoglyphSabotage,
        BugKind::ScopeGaslighting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BugKind::BooleanNegation => "booleanNegation",
            BugKind::OffByOne => "offByOne",
            BugKind::LogicalAndOrSwap => "logicalAndOrSwap",
            BugKind::ComparisonDirectionFlip => "comparisonDirectionFlip",
            BugKind::EqualityInequalityFlip => "equalityInequalityFlip",
            BugKind::InvertTernaryBranches => "invertTernaryBranches",
            BugKind::WrongArithmeticOperator => "wrongArithmeticOperator",
            BugKind::BitwiseLogicalSwap => "bitwiseLogicalSwap",
            BugKind::IndexOffByOne => "indexOffByOne",
            BugKind::GeneralBoundaryOffByOne => "generalBoundaryOffByOne",
            BugKind::HomoglyphSabotage => "homoglyphSabotage",
            BugKind::ScopeGaslighting => "scopeGaslighting",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BugKind::BooleanNegation => "negated a boolean or a condition",
            BugKind::OffByOne => "moved a loop boundary by one",
            BugKind::LogicalAndOrSwap => "swapped && and ||",
            BugKind::ComparisonDirectionFlip => "flipped a comparison direction",
            BugKind::EqualityInequalityFlip => "turned an equality check around",
            BugKind::InvertTernaryBranches => "swapped the branches of a ternary",
            BugKind::WrongArithmeticOperator => "picked the wrong arithmetic operator",
            BugKind::BitwiseLogicalSwap => "mixed up bitwise and logical operators",
            BugKind::IndexOffByOne => "nudged an index by one",
            BugKind::GeneralBoundaryOffByOne => "moved a comparison boundary by one",
            BugKind::HomoglyphSabotage => "renamed a declaration with a look-alike character",
            BugKind::ScopeGaslighting => "shadowed an outer variable with null",
        }
    }
}

impl fmt::Display for BugKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind and how likely it is to be tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: BugKind,
    pub weight: u32,
}

const fn entry(kind: BugKind, weight: u32) -> CatalogEntry {
    CatalogEntry { kind, weight }
}

/// Weight of the two subtlest kinds.
pub const NASTY_WEIGHT: u32 = 5;

pub const CATALOG: [CatalogEntry; 12] = [
    entry(BugKind::BooleanNegation, 1),
    entry(BugKind::OffByOne, 1),
    entry(BugKind::LogicalAndOrSwap, 1),
    entry(BugKind::ComparisonDirectionFlip, 1),
    entry(BugKind::EqualityInequalityFlip, 1),
    entry(BugKind::InvertTernaryBranches, 1),
    entry(BugKind::WrongArithmeticOperator, 1),
    entry(BugKind::BitwiseLogicalSwap, 1),
    entry(BugKind::IndexOffByOne, 1),
    entry(BugKind::GeneralBoundaryOffByOne, 1),
    entry(BugKind::HomoglyphSabotage, NASTY_WEIGHT),
    entry(BugKind::ScopeGaslighting, NASTY_WEIGHT),
];

/// The edit `kind` would make, without making it.
pub fn find_target(kind: BugKind, tree: &SyntaxTree) -> Option<Edit> {
    rules::candidates(kind, tree)
        .into_iter()
        .find(|edit| !tree.is_touched(&edit.range))
}

/// Plant one bug of `kind`. Returns `false`, with the tree untouched, when
/// nothing in the tree matches.
pub fn apply(kind: BugKind, tree: &mut SyntaxTree) -> Result<bool> {
    for edit in rules::candidates(kind, tree) {
        let range = edit.range.clone();
        if tree.commit(edit)? {
            log::debug!("Applied {} at bytes {}..{}", kind, range.start, range.end);
            return Ok(true);
        }
    }
    Ok(false)
}
