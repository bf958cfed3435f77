use crate::syntax::{is_function_kind, FunctionLike, Preorder, SyntaxTree};
use std::collections::HashSet;
use tree_sitter::Node;

/// Node kinds that own `let`/`const`/class/function declarations.
const BLOCK_SCOPES: &[&str] = &[
    "statement_block",
    "program",
    "for_statement",
    "for_in_statement",
    "switch_body",
];

/// A name introduced by the source, together with the node whose extent it
/// is visible in.
#[derive(Debug, Clone, Copy)]
pub struct Declaration<'t> {
    pub name: &'t str,
    pub site: Node<'t>,
    pub scope: Node<'t>,
}

/// Every binding in a tree. Implicit globals never show up here.
#[derive(Debug)]
pub struct Bindings<'t> {
    declarations: Vec<Declaration<'t>>,
    sites: HashSet<usize>,
}

impl<'t> Bindings<'t> {
    pub fn collect(tree: &'t SyntaxTree) -> Self {
        let mut bindings = Self {
            declarations: Vec::new(),
            sites: HashSet::new(),
        };

        for node in tree.preorder().filter(|node| node.is_named()) {
            let field = |name: &str| node.child_by_field_name(name);
            let kind = node.kind();

            if is_function_kind(kind) {
                if let Some(parameters) = field("parameters").or_else(|| field("parameter")) {
                    bindings.add_pattern(tree, parameters, node);
                }
                // a named function expression sees its own name
                if matches!(kind, "function_expression" | "function" | "generator_function") {
                    if let Some(name) = field("name") {
                        bindings.add(tree, name, node);
                    }
                }
            }

            match kind {
                "variable_declarator" => {
                    let is_var = node
                        .parent()
                        .is_some_and(|parent| parent.kind() == "variable_declaration");
                    let scope = if is_var {
                        function_scope(node)
                    } else {
                        block_scope(node)
                    };
                    if let Some(name) = field("name") {
                        bindings.add_pattern(tree, name, scope);
                    }
                }
                "function_declaration" | "generator_function_declaration" | "class_declaration" => {
                    if let Some(name) = field("name") {
                        bindings.add(tree, name, block_scope(node));
                    }
                }
                // `for (const x of xs)` and `for (var k in o)` declare through `left`
                "for_in_statement" => {
                    if let (Some(declared), Some(left)) = (field("kind"), field("left")) {
                        let scope = if tree.text(declared) == "var" {
                            function_scope(node)
                        } else {
                            node
                        };
                        bindings.add_pattern(tree, left, scope);
                    }
                }
                // a named class expression sees its own name
                "class" => {
                    if let Some(name) = field("name") {
                        bindings.add(tree, name, node);
                    }
                }
                "catch_clause" => {
                    if let Some(parameter) = field("parameter") {
                        bindings.add_pattern(tree, parameter, node);
                    }
                }
                "import_statement" => bindings.add_imports(tree, node),
                _ => {}
            }
        }

        bindings
    }

    pub fn declarations(&self) -> &[Declaration<'t>] {
        &self.declarations
    }

    pub fn is_binding_site(&self, node: Node<'_>) -> bool {
        self.sites.contains(&node.id())
    }

    /// First name referenced in `function`'s body that resolves to a binding
    /// outside the function and is not rebound on the way there.
    pub fn shadow_candidate(
        &self,
        tree: &'t SyntaxTree,
        function: &FunctionLike<'t>,
    ) -> Option<&'t str> {
        let body = function.block_body()?;

        Preorder::new(body)
            .filter(|node| self.is_reference(tree, *node))
            .find_map(|reference| {
                let name = tree.text(reference);
                self.resolves_outside(name, reference, function.node)
                    .then_some(name)
            })
    }

    fn is_reference(&self, tree: &SyntaxTree, node: Node<'_>) -> bool {
        if !matches!(node.kind(), "identifier" | "shorthand_property_identifier") {
            return false;
        }
        if self.is_binding_site(node) {
            return false;
        }
        let name = tree.text(node);
        if matches!(name, "arguments" | "undefined") {
            return false;
        }
        // `<div>` names an intrinsic element, `<Card>` references a binding
        let in_jsx_tag = node.parent().is_some_and(|parent| {
            matches!(
                parent.kind(),
                "jsx_opening_element" | "jsx_closing_element" | "jsx_self_closing_element"
            )
        });
        !(in_jsx_tag && name.starts_with(|c: char| c.is_ascii_lowercase()))
    }

    /// Resolve `reference` to its innermost declaration and report whether
    /// that declaration lives outside `function`.
    fn resolves_outside(&self, name: &str, reference: Node<'_>, function: Node<'_>) -> bool {
        let nearest = self
            .declarations
            .iter()
            .filter(|d| d.name == name && within(reference, d.scope))
            .min_by_key(|d| d.scope.end_byte() - d.scope.start_byte());

        match nearest {
            // a class expression's own name stays bound to the class
            Some(declaration) => {
                !within(declaration.scope, function) && declaration.scope.kind() != "class"
            }
            None => false,
        }
    }

    fn add(&mut self, tree: &'t SyntaxTree, site: Node<'t>, scope: Node<'t>) {
        self.sites.insert(site.id());
        self.declarations.push(Declaration {
            name: tree.text(site),
            site,
            scope,
        });
    }

    fn add_pattern(&mut self, tree: &'t SyntaxTree, pattern: Node<'t>, scope: Node<'t>) {
        let field = |name: &str| pattern.child_by_field_name(name);
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => self.add(tree, pattern, scope),
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = field("left") {
                    self.add_pattern(tree, left, scope);
                }
            }
            "pair_pattern" => {
                if let Some(value) = field("value") {
                    self.add_pattern(tree, value, scope);
                }
            }
            "required_parameter" | "optional_parameter" => {
                if let Some(inner) = field("pattern") {
                    self.add_pattern(tree, inner, scope);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" | "formal_parameters" => {
                let mut cursor = pattern.walk();
                let children: Vec<Node<'t>> = pattern.named_children(&mut cursor).collect();
                for child in children {
                    self.add_pattern(tree, child, scope);
                }
            }
            _ => {}
        }
    }

    fn add_imports(&mut self, tree: &'t SyntaxTree, statement: Node<'t>) {
        let program = tree.root();
        let names: Vec<Node<'t>> = Preorder::new(statement)
            .filter_map(|node| match node.kind() {
                "import_specifier" => node
                    .child_by_field_name("alias")
                    .or_else(|| node.child_by_field_name("name")),
                "identifier" => node
                    .parent()
                    .filter(|parent| matches!(parent.kind(), "import_clause" | "namespace_import"))
                    .map(|_| node),
                _ => None,
            })
            .collect();
        for name in names {
            self.add(tree, name, program);
        }
    }
}

/// Whether `inner` lies inside `outer` (inclusive).
fn within(inner: Node<'_>, outer: Node<'_>) -> bool {
    outer.start_byte() <= inner.start_byte() && inner.end_byte() <= outer.end_byte()
}

fn function_scope(node: Node<'_>) -> Node<'_> {
    enclosing(node, |kind| is_function_kind(kind) || kind == "program")
}

fn block_scope(node: Node<'_>) -> Node<'_> {
    enclosing(node, |kind| BLOCK_SCOPES.contains(&kind))
}

fn enclosing<'t>(node: Node<'t>, is_scope: impl Fn(&str) -> bool) -> Node<'t> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if is_scope(parent.kind()) {
            return parent;
        }
        current = parent;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{SourceLanguage, Syntax};

    fn first_function<'t>(tree: &'t SyntaxTree, name: &str) -> FunctionLike<'t> {
        tree.preorder()
            .find_map(|node| match tree.view(node) {
                Syntax::Function(function)
                    if function.name.map(|n| tree.text(n)) == Some(name) =>
                {
                    Some(function)
                }
                _ => None,
            })
            .unwrap()
    }

    fn candidate(source: &str, function: &str) -> Option<String> {
        let tree = SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap();
        let bindings = Bindings::collect(&tree);
        let function = first_function(&tree, function);
        bindings
            .shadow_candidate(&tree, &function)
            .map(str::to_string)
    }

    #[test]
    fn test_collects_declarations() {
        let source = "import def, { a as b } from 'm';\nvar v = 1;\nconst { p, q: [r] } = o;\nfunction f(x, y = 2, ...rest) {}\ntry {} catch (e) {}";
        let tree = SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap();
        let bindings = Bindings::collect(&tree);
        let mut names: Vec<&str> = bindings.declarations().iter().map(|d| d.name).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec!["b", "def", "e", "f", "p", "r", "rest", "v", "x", "y"]
        );
    }

    #[test]
    fn test_outer_binding_is_candidate() {
        let source = "let total = 0;\nfunction add(n) {\n  total = total + n;\n}\n";
        assert_eq!(candidate(source, "add").as_deref(), Some("total"));
    }

    #[test]
    fn test_parameters_and_locals_are_not_candidates() {
        let source = "let a = 1;\nlet b = 2;\nfunction f(a) {\n  const b = 3;\n  return a + b;\n}\n";
        assert_eq!(candidate(source, "f"), None);
    }

    #[test]
    fn test_globals_are_not_candidates() {
        let source = "function log(msg) {\n  console.log(msg);\n}\n";
        assert_eq!(candidate(source, "log"), None);
    }

    #[test]
    fn test_closure_over_outer_parameter() {
        let source = "function outer(limit) {\n  function inner(x) {\n    return x < limit;\n  }\n  return inner;\n}\n";
        assert_eq!(candidate(source, "inner").as_deref(), Some("limit"));
    }

    #[test]
    fn test_for_of_header_is_a_local_binding() {
        let source = "let x = 0;\nfunction f(xs) {\n  for (const x of xs) {\n    use(x);\n  }\n}\n";
        assert_eq!(candidate(source, "f"), None);
    }

    #[test]
    fn test_for_in_var_header_is_function_scoped() {
        let source = "let k = 1;\nfunction g(o) {\n  use(k);\n  for (var k in o) {\n    use(k);\n  }\n}\n";
        assert_eq!(candidate(source, "g"), None);
    }

    #[test]
    fn test_bare_for_in_header_declares_nothing() {
        let source = "let k = 1;\nfunction g(o) {\n  for (k in o) {}\n}\n";
        assert_eq!(candidate(source, "g").as_deref(), Some("k"));
    }

    #[test]
    fn test_class_expression_sees_its_own_name() {
        let source = "let C = 1;\nconst K = class C {\n  m() {\n    return C;\n  }\n};\nfunction h() {\n  return C;\n}\n";
        let tree = SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap();
        let bindings = Bindings::collect(&tree);
        let method = tree
            .preorder()
            .find_map(|node| match tree.view(node) {
                Syntax::Function(function) if node.kind() == "method_definition" => Some(function),
                _ => None,
            })
            .unwrap();
        assert_eq!(bindings.shadow_candidate(&tree, &method), None);
        assert_eq!(candidate(source, "h").as_deref(), Some("C"));
    }

    #[test]
    fn test_nested_rebinding_is_respected() {
        let source = "let n = 1;\nfunction f() {\n  return function g(n) { return n; };\n}\n";
        assert_eq!(candidate(source, "f"), None);
    }
}
