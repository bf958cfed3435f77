use crate::error::{Result, SabotageError};
use crate::operators::BinaryOp;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use tree_sitter::{InputEdit, Language, Node, Parser, Point, Tree, TreeCursor};

/// Grammars the parser can be driven with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    /// Plain JavaScript, including JSX and module syntax.
    #[default]
    JavaScript,
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    /// Detect the grammar from a file extension.
    ///
    /// Returns `None` for extensions that are not JavaScript or TypeScript.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    fn grammar(self) -> Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// A text replacement over byte offsets of the tree's current source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn replace(node: Node<'_>, replacement: impl Into<String>) -> Self {
        Self {
            range: node.byte_range(),
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            replacement: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryExpr<'t> {
    pub node: Node<'t>,
    pub left: Node<'t>,
    pub operator: Node<'t>,
    pub op: BinaryOp,
    pub right: Node<'t>,
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionLike<'t> {
    pub node: Node<'t>,
    pub name: Option<Node<'t>>,
    pub parameters: Option<Node<'t>>,
    pub body: Node<'t>,
    pub is_declaration: bool,
}

impl<'t> FunctionLike<'t> {
    /// The `{ ... }` body, absent for expression-bodied arrows.
    pub fn block_body(&self) -> Option<Node<'t>> {
        (self.body.kind() == "statement_block").then_some(self.body)
    }
}

/// Closed view over the node shapes the rule catalog understands.
#[derive(Debug, Clone, Copy)]
pub enum Syntax<'t> {
    Binary(BinaryExpr<'t>),
    Unary {
        node: Node<'t>,
        operator: &'t str,
        argument: Node<'t>,
    },
    Ternary {
        node: Node<'t>,
        condition: Node<'t>,
        consequence: Node<'t>,
        alternative: Node<'t>,
    },
    Boolean {
        node: Node<'t>,
        value: bool,
    },
    Number {
        node: Node<'t>,
        raw: &'t str,
    },
    Loop {
        node: Node<'t>,
        test: Option<Node<'t>>,
    },
    Subscript {
        node: Node<'t>,
        object: Node<'t>,
        index: Node<'t>,
    },
    Call {
        node: Node<'t>,
        callee: Node<'t>,
        method: Option<&'t str>,
        arguments: Node<'t>,
    },
    Parenthesized {
        node: Node<'t>,
        inner: Option<Node<'t>>,
    },
    Declarator {
        node: Node<'t>,
        name: Node<'t>,
        value: Option<Node<'t>>,
    },
    Function(FunctionLike<'t>),
    Identifier {
        node: Node<'t>,
        name: &'t str,
    },
    Other(Node<'t>),
}

impl<'t> Syntax<'t> {
    pub fn node(&self) -> Node<'t> {
        match self {
            Syntax::Binary(binary) => binary.node,
            Syntax::Function(function) => function.node,
            Syntax::Unary { node, .. }
            | Syntax::Ternary { node, .. }
            | Syntax::Boolean { node, .. }
            | Syntax::Number { node, .. }
            | Syntax::Loop { node, .. }
            | Syntax::Subscript { node, .. }
            | Syntax::Call { node, .. }
            | Syntax::Parenthesized { node, .. }
            | Syntax::Declarator { node, .. }
            | Syntax::Identifier { node, .. }
            | Syntax::Other(node) => *node,
        }
    }
}

pub fn is_function_kind(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "arrow_function"
            | "method_definition"
    )
}

/// Pre-order walk over every node (named and anonymous) below a start node.
pub struct Preorder<'t> {
    cursor: TreeCursor<'t>,
    done: bool,
}

impl<'t> Preorder<'t> {
    pub fn new(start: Node<'t>) -> Self {
        Self {
            cursor: start.walk(),
            done: false,
        }
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        if self.done {
            return None;
        }
        let node = self.cursor.node();
        if self.cursor.goto_first_child() {
            return Some(node);
        }
        loop {
            if self.cursor.goto_next_sibling() {
                return Some(node);
            }
            if !self.cursor.goto_parent() {
                self.done = true;
                return Some(node);
            }
        }
    }
}

/// A parsed source buffer, owned by exactly one mutation run.
pub struct SyntaxTree {
    language: SourceLanguage,
    parser: Parser,
    tree: Tree,
    source: String,
    touched: Vec<Range<usize>>,
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language)
            .field("source_len", &self.source.len())
            .field("touched", &self.touched)
            .finish()
    }
}

impl SyntaxTree {
    /// Parse `source`. Any error or missing node fails the whole parse.
    pub fn parse(source: &str, language: SourceLanguage) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&language.grammar())?;

        let tree = parser.parse(source, None).ok_or_else(|| SabotageError::Parse {
            line: 1,
            column: 1,
            message: "parser produced no tree".to_string(),
        })?;

        if let Some(error) = first_syntax_error(&tree, source) {
            return Err(error);
        }

        Ok(Self {
            language,
            parser,
            tree,
            source: source.to_string(),
            touched: Vec::new(),
        })
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text<'t>(&'t self, node: Node<'_>) -> &'t str {
        &self.source[node.byte_range()]
    }

    pub fn preorder(&self) -> Preorder<'_> {
        Preorder::new(self.root())
    }

    /// Classify a node into the closed [`Syntax`] view.
    pub fn view<'t>(&'t self, node: Node<'t>) -> Syntax<'t> {
        let field = |name: &str| node.child_by_field_name(name);

        match node.kind() {
            "binary_expression" => {
                if let (Some(left), Some(operator), Some(right)) =
                    (field("left"), field("operator"), field("right"))
                {
                    if let Some(op) = BinaryOp::from_symbol(operator.kind()) {
                        return Syntax::Binary(BinaryExpr {
                            node,
                            left,
                            operator,
                            op,
                            right,
                        });
                    }
                }
                Syntax::Other(node)
            }
            "unary_expression" => match (field("operator"), field("argument")) {
                (Some(operator), Some(argument)) => Syntax::Unary {
                    node,
                    operator: operator.kind(),
                    argument,
                },
                _ => Syntax::Other(node),
            },
            "ternary_expression" => {
                match (field("condition"), field("consequence"), field("alternative")) {
                    (Some(condition), Some(consequence), Some(alternative)) => Syntax::Ternary {
                        node,
                        condition,
                        consequence,
                        alternative,
                    },
                    _ => Syntax::Other(node),
                }
            }
            "true" => Syntax::Boolean { node, value: true },
            "false" => Syntax::Boolean { node, value: false },
            "number" => Syntax::Number {
                node,
                raw: self.text(node),
            },
            "for_statement" | "while_statement" | "do_statement" => Syntax::Loop {
                node,
                test: field("condition"),
            },
            "subscript_expression" => match (field("object"), field("index")) {
                (Some(object), Some(index)) => Syntax::Subscript {
                    node,
                    object,
                    index,
                },
                _ => Syntax::Other(node),
            },
            "call_expression" => match (field("function"), field("arguments")) {
                (Some(callee), Some(arguments)) if arguments.kind() == "arguments" => {
                    let method = (callee.kind() == "member_expression")
                        .then(|| callee.child_by_field_name("property"))
                        .flatten()
                        .map(|property| self.text(property));
                    Syntax::Call {
                        node,
                        callee,
                        method,
                        arguments,
                    }
                }
                _ => Syntax::Other(node),
            },
            "parenthesized_expression" => Syntax::Parenthesized {
                node,
                inner: node.named_child(0),
            },
            "variable_declarator" => match field("name") {
                Some(name) => Syntax::Declarator {
                    node,
                    name,
                    value: field("value"),
                },
                None => Syntax::Other(node),
            },
            kind if is_function_kind(kind) => match field("body") {
                Some(body) => Syntax::Function(FunctionLike {
                    node,
                    name: field("name"),
                    parameters: field("parameters").or_else(|| field("parameter")),
                    body,
                    is_declaration: matches!(
                        kind,
                        "function_declaration" | "generator_function_declaration"
                    ),
                }),
                None => Syntax::Other(node),
            },
            "identifier" => Syntax::Identifier {
                node,
                name: self.text(node),
            },
            _ => Syntax::Other(node),
        }
    }

    /// Whether `range` overlaps text already rewritten during this run.
    pub fn is_touched(&self, range: &Range<usize>) -> bool {
        self.touched.iter().any(|done| overlaps(done, range))
    }

    /// Splice `edit` into the source and reparse incrementally.
    ///
    /// Returns `false`, leaving the tree untouched, when the edit overlaps an
    /// earlier edit of this run or when the result no longer parses cleanly.
    pub fn commit(&mut self, edit: Edit) -> Result<bool> {
        let Edit { range, replacement } = edit;
        if range.end > self.source.len() || self.is_touched(&range) {
            return Ok(false);
        }

        let mut source = self.source.clone();
        let start_position = point_at(&source, range.start);
        let old_end_position = point_at(&source, range.end);
        source.replace_range(range.clone(), &replacement);
        let new_end_byte = range.start + replacement.len();
        let new_end_position = point_at(&source, new_end_byte);

        let mut edited = self.tree.clone();
        edited.edit(&InputEdit {
            start_byte: range.start,
            old_end_byte: range.end,
            new_end_byte,
            start_position,
            old_end_position,
            new_end_position,
        });

        let reparsed = self
            .parser
            .parse(&source, Some(&edited))
            .ok_or_else(|| SabotageError::Print("incremental reparse produced no tree".to_string()))?;

        if reparsed.root_node().has_error() {
            log::debug!(
                "Rejected edit at bytes {}..{}: result does not parse",
                range.start,
                range.end
            );
            return Ok(false);
        }

        let old_len = range.end - range.start;
        for done in &mut self.touched {
            if done.start >= range.end {
                done.start = done.start + replacement.len() - old_len;
                done.end = done.end + replacement.len() - old_len;
            }
        }
        self.touched.push(range.start..new_end_byte);
        self.source = source;
        self.tree = reparsed;
        Ok(true)
    }
}

fn overlaps(done: &Range<usize>, range: &Range<usize>) -> bool {
    if range.is_empty() {
        return done.start < range.start && range.start < done.end;
    }
    done.start < range.end && range.start < done.end
}

fn point_at(source: &str, byte: usize) -> Point {
    let before = &source.as_bytes()[..byte];
    let row = before.iter().filter(|&&b| b == b'\n').count();
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|pos| pos + 1)
        .unwrap_or(0);
    Point::new(row, byte - line_start)
}

fn first_syntax_error(tree: &Tree, source: &str) -> Option<SabotageError> {
    if !tree.root_node().has_error() {
        return None;
    }

    let node = Preorder::new(tree.root_node())
        .find(|node| node.is_error() || node.is_missing())
        .unwrap_or_else(|| tree.root_node());
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet: String = source[node.byte_range()].chars().take(40).collect();
        format!("unexpected `{}`", snippet.trim())
    };

    Some(SabotageError::Parse {
        line: position.row + 1,
        column: position.column + 1,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SyntaxTree {
        SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap()
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("app/main.mjs")),
            Some(SourceLanguage::JavaScript)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("lib.ts")),
            Some(SourceLanguage::TypeScript)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("View.tsx")),
            Some(SourceLanguage::Tsx)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("README.md")), None);
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let err = SyntaxTree::parse("let x = ;\n", SourceLanguage::JavaScript).unwrap_err();
        match err {
            SabotageError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_typescript_and_jsx_parse() {
        assert!(SyntaxTree::parse("let n: number = 1;", SourceLanguage::TypeScript).is_ok());
        assert!(SyntaxTree::parse("const el = <div>{a}</div>;", SourceLanguage::JavaScript).is_ok());
        assert!(SyntaxTree::parse("const el = <b>{n as number}</b>;", SourceLanguage::Tsx).is_ok());
    }

    #[test]
    fn test_view_classifies_binary_and_loops() {
        let tree = parse("while (i < n) { i = i + 1; }");
        let binaries: Vec<BinaryOp> = tree
            .preorder()
            .filter_map(|node| match tree.view(node) {
                Syntax::Binary(binary) => Some(binary.op),
                _ => None,
            })
            .collect();
        assert_eq!(binaries, vec![BinaryOp::Lt, BinaryOp::Add]);

        let loops = tree
            .preorder()
            .filter(|node| matches!(tree.view(*node), Syntax::Loop { test: Some(_), .. }))
            .count();
        assert_eq!(loops, 1);
    }

    #[test]
    fn test_view_call_method() {
        let tree = parse("name.charAt(0);");
        let method = tree.preorder().find_map(|node| match tree.view(node) {
            Syntax::Call { method, .. } => method,
            _ => None,
        });
        assert_eq!(method, Some("charAt"));
    }

    #[test]
    fn test_commit_applies_edit_and_reparses() {
        let mut tree = parse("let a = b < c;");
        let operator = tree
            .preorder()
            .find_map(|node| match tree.view(node) {
                Syntax::Binary(binary) => Some(binary.operator),
                _ => None,
            })
            .unwrap();
        let edit = Edit::replace(operator, "<=");

        assert!(tree.commit(edit).unwrap());
        assert_eq!(tree.source(), "let a = b <= c;");
        assert!(!tree.root().has_error());
    }

    #[test]
    fn test_commit_rejects_broken_result() {
        let mut tree = parse("let a = 1;");
        assert!(!tree.commit(Edit::insert(8, "(")).unwrap());
        assert_eq!(tree.source(), "let a = 1;");
    }

    #[test]
    fn test_commit_rejects_overlapping_edits() {
        let mut tree = parse("let a = b < c;");
        assert!(tree.commit(Edit { range: 10..11, replacement: "<=".into() }).unwrap());
        assert!(tree.is_touched(&(8..14)));
        assert!(!tree.commit(Edit { range: 10..12, replacement: "<".into() }).unwrap());
        assert_eq!(tree.source(), "let a = b <= c;");

        // edits before a touched range shift it
        assert!(tree.commit(Edit { range: 4..5, replacement: "alpha".into() }).unwrap());
        assert_eq!(tree.source(), "let alpha = b <= c;");
        assert!(tree.is_touched(&(15..16)));
        assert!(!tree.is_touched(&(12..13)));
    }
}
