//! Detection half of every rule in the catalog.
//!
//! Each rule walks the tree in pre-order and returns its candidate edits in
//! that order; the catalog commits the first one that still parses. Nothing
//! here mutates the tree.

use crate::catalog::BugKind;
use crate::homoglyph::sabotage_name;
use crate::operators::{
    flip_boundary, flip_direction, flip_equality, needs_parens, swap_and_or, swap_arithmetic,
    swap_bitwise_logical, BinaryOp,
};
use crate::scope::Bindings;
use crate::syntax::{BinaryExpr, Edit, Syntax, SyntaxTree};
use tree_sitter::Node;

/// Methods whose numeric argument is an index or a bound.
const INDEX_METHODS: &[&str] = &["at", "charAt", "slice", "substring", "substr"];

pub fn candidates(kind: BugKind, tree: &SyntaxTree) -> Vec<Edit> {
    match kind {
        BugKind::BooleanNegation => boolean_negations(tree),
        BugKind::OffByOne => loop_boundaries(tree),
        BugKind::LogicalAndOrSwap => rewrite_binaries(tree, swap_and_or),
        BugKind::ComparisonDirectionFlip => rewrite_binaries(tree, flip_direction),
        BugKind::EqualityInequalityFlip => rewrite_binaries(tree, flip_equality),
        BugKind::InvertTernaryBranches => ternary_swaps(tree),
        BugKind::WrongArithmeticOperator => rewrite_binaries(tree, swap_arithmetic),
        BugKind::BitwiseLogicalSwap => rewrite_binaries(tree, swap_bitwise_logical),
        BugKind::IndexOffByOne => index_increments(tree),
        BugKind::GeneralBoundaryOffByOne => rewrite_binaries(tree, flip_boundary),
        BugKind::HomoglyphSabotage => homoglyph_renames(tree),
        BugKind::ScopeGaslighting => shadowing_insertions(tree),
    }
}

fn binaries(tree: &SyntaxTree) -> impl Iterator<Item = BinaryExpr<'_>> {
    tree.preorder().filter_map(move |node| match tree.view(node) {
        Syntax::Binary(binary) => Some(binary),
        _ => None,
    })
}

fn rewrite_binaries(tree: &SyntaxTree, table: fn(BinaryOp) -> Option<BinaryOp>) -> Vec<Edit> {
    binaries(tree)
        .filter_map(|binary| table(binary.op).map(|op| rewrite_operator(tree, &binary, op)))
        .collect()
}

fn loop_boundaries(tree: &SyntaxTree) -> Vec<Edit> {
    tree.preorder()
        .filter_map(|node| match tree.view(node) {
            Syntax::Loop {
                test: Some(test), ..
            } => match tree.view(unwrap_parens(test)) {
                Syntax::Binary(binary) => {
                    flip_boundary(binary.op).map(|op| rewrite_operator(tree, &binary, op))
                }
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn boolean_negations(tree: &SyntaxTree) -> Vec<Edit> {
    tree.preorder()
        .filter(|node| node.is_named())
        .filter_map(|node| {
            let target = match tree.view(node) {
                Syntax::Boolean { node, .. } => {
                    // `true` as a TypeScript literal type is not a value
                    if node.parent().is_some_and(|p| p.kind() == "literal_type") {
                        return None;
                    }
                    node
                }
                Syntax::Binary(binary) if binary.op.is_comparison() || binary.op.is_logical() => {
                    binary.node
                }
                _ => return None,
            };
            (!is_negated(tree, target)).then(|| negate(tree, target))
        })
        .collect()
}

fn ternary_swaps(tree: &SyntaxTree) -> Vec<Edit> {
    tree.preorder()
        .filter_map(|node| match tree.view(node) {
            Syntax::Ternary {
                consequence,
                alternative,
                ..
            } => {
                let between = &tree.source()[consequence.end_byte()..alternative.start_byte()];
                Some(Edit {
                    range: consequence.start_byte()..alternative.end_byte(),
                    replacement: format!(
                        "{}{}{}",
                        tree.text(alternative),
                        between,
                        tree.text(consequence)
                    ),
                })
            }
            _ => None,
        })
        .collect()
}

fn index_increments(tree: &SyntaxTree) -> Vec<Edit> {
    tree.preorder()
        .filter_map(|node| {
            let literal = match tree.view(node) {
                Syntax::Subscript { index, .. } => Some(index).filter(|i| i.kind() == "number"),
                Syntax::Call {
                    method: Some(method),
                    arguments,
                    ..
                } if INDEX_METHODS.contains(&method) => {
                    let mut cursor = arguments.walk();
                    let first = arguments
                        .named_children(&mut cursor)
                        .find(|argument| argument.kind() == "number");
                    first
                }
                _ => None,
            }?;
            increment_literal(tree.text(literal)).map(|value| Edit::replace(literal, value))
        })
        .collect()
}

fn homoglyph_renames(tree: &SyntaxTree) -> Vec<Edit> {
    tree.preorder()
        .filter_map(|node| {
            let name = match tree.view(node) {
                Syntax::Declarator { name, .. } => name,
                Syntax::Function(function) if function.is_declaration => function.name?,
                _ => return None,
            };
            if name.kind() != "identifier" {
                return None;
            }
            // references elsewhere keep the old spelling on purpose
            sabotage_name(tree.text(name)).map(|renamed| Edit::replace(name, renamed))
        })
        .collect()
}

fn shadowing_insertions(tree: &SyntaxTree) -> Vec<Edit> {
    let bindings = Bindings::collect(tree);
    tree.preorder()
        .filter_map(|node| match tree.view(node) {
            Syntax::Function(function) => {
                let name = bindings.shadow_candidate(tree, &function)?;
                let body = function.block_body()?;
                shadowing_statement(tree, body, name)
            }
            _ => None,
        })
        .collect()
}

fn shadowing_statement(tree: &SyntaxTree, body: Node<'_>, name: &str) -> Option<Edit> {
    // stay behind the directive prologue or `'use strict'` stops applying
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|statement| !is_directive(*statement))?;
    let statement = format!("let {} = null;", name);

    if first.start_position().row == body.start_position().row {
        return Some(Edit::insert(first.start_byte(), format!("{} ", statement)));
    }

    let source = tree.source();
    let line_start = source[..first.start_byte()]
        .rfind('\n')
        .map_or(0, |pos| pos + 1);
    let indent = &source[line_start..first.start_byte()];
    let indent = if indent.chars().all(char::is_whitespace) {
        indent
    } else {
        ""
    };
    Some(Edit::insert(
        first.start_byte(),
        format!("{}\n{}", statement, indent),
    ))
}

fn is_directive(statement: Node<'_>) -> bool {
    statement.kind() == "expression_statement"
        && statement.named_child_count() == 1
        && statement
            .named_child(0)
            .is_some_and(|expression| expression.kind() == "string")
}

/// Replace the operator of `binary`, adding parentheses where the new
/// operator would otherwise regroup the expression.
fn rewrite_operator(tree: &SyntaxTree, binary: &BinaryExpr<'_>, op: BinaryOp) -> Edit {
    let operand_needs = |operand: Node<'_>, is_right: bool| match tree.view(operand) {
        Syntax::Binary(inner) => needs_parens(inner.op, op, is_right),
        _ => false,
    };
    let wrap_left = operand_needs(binary.left, false);
    let wrap_right = operand_needs(binary.right, true);
    let wrap_outer = binary.node.parent().is_some_and(|parent| match tree.view(parent) {
        Syntax::Binary(outer) => needs_parens(op, outer.op, outer.right == binary.node),
        _ => false,
    });

    if !(wrap_left || wrap_right || wrap_outer) {
        return Edit::replace(binary.operator, op.as_str());
    }

    let source = tree.source();
    let mut text = parenthesize(tree.text(binary.left), wrap_left);
    text.push_str(&source[binary.left.end_byte()..binary.operator.start_byte()]);
    text.push_str(op.as_str());
    text.push_str(&source[binary.operator.end_byte()..binary.right.start_byte()]);
    text.push_str(&parenthesize(tree.text(binary.right), wrap_right));
    Edit::replace(binary.node, parenthesize(&text, wrap_outer))
}

fn negate(tree: &SyntaxTree, node: Node<'_>) -> Edit {
    let wrap_inner = matches!(
        node.kind(),
        "binary_expression"
            | "ternary_expression"
            | "sequence_expression"
            | "assignment_expression"
            | "augmented_assignment_expression"
    );
    let negated = format!("!{}", parenthesize(tree.text(node), wrap_inner));
    let wrap_outer = node
        .parent()
        .is_some_and(|parent| binds_tighter_than_unary(tree, parent, node));
    Edit::replace(node, parenthesize(&negated, wrap_outer))
}

/// Whether `child` sits in a slot of `parent` that a `!x` cannot fill bare.
fn binds_tighter_than_unary(tree: &SyntaxTree, parent: Node<'_>, child: Node<'_>) -> bool {
    let slot = |name: &str| parent.child_by_field_name(name) == Some(child);
    match parent.kind() {
        "member_expression" | "subscript_expression" => slot("object"),
        "call_expression" => slot("function"),
        "new_expression" => slot("constructor"),
        _ => match tree.view(parent) {
            Syntax::Binary(binary) => binary.op == BinaryOp::Exp && binary.left == child,
            _ => false,
        },
    }
}

/// Whether `node` is already the operand of a `!`, looking through parens.
fn is_negated(tree: &SyntaxTree, node: Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        match tree.view(parent) {
            Syntax::Parenthesized { .. } => current = parent,
            Syntax::Unary { operator, .. } => return operator == "!",
            _ => return false,
        }
    }
    false
}

fn unwrap_parens(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while matches!(current.kind(), "parenthesized_expression" | "expression_statement") {
        match current.named_child(0) {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

fn parenthesize(text: &str, wrap: bool) -> String {
    if wrap {
        format!("({})", text)
    } else {
        text.to_string()
    }
}

/// Add one to a numeric literal, printing the result in decimal.
pub fn increment_literal(raw: &str) -> Option<String> {
    let digits = raw.replace('_', "").to_ascii_lowercase();
    // BigInt literals are a different type
    if digits.ends_with('n') {
        return None;
    }

    let prefixed = |prefix: &str, base: u32| {
        digits
            .strip_prefix(prefix)
            .map(|body| u64::from_str_radix(body, base).ok().map(|v| v as f64))
    };
    // sloppy-mode `010` is octal; `019` falls back to decimal
    let legacy_octal = digits.len() > 1
        && digits.starts_with('0')
        && digits.chars().all(|c| ('0'..='7').contains(&c));
    let value = match prefixed("0x", 16)
        .or_else(|| prefixed("0o", 8))
        .or_else(|| prefixed("0b", 2))
        .or_else(|| legacy_octal.then(|| prefixed("0", 8)).flatten())
    {
        Some(parsed) => parsed?,
        None => digits.parse::<f64>().ok()?,
    };

    let next = value + 1.0;
    if !next.is_finite() {
        return None;
    }
    if next.fract() == 0.0 && next.abs() < 1e21 {
        Some(format!("{:.0}", next))
    } else {
        Some(next.to_string())
    }
}
