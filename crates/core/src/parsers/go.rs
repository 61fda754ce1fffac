use tree_sitter::{Node, Parser, Tree};

use super::{ImportParser, ParserError};

/// Extracts import paths from Go source files.
///
/// Only the file header is validated: the package clause and the import
/// declarations in front of the first other top-level declaration. Syntax
/// errors further down do not affect extraction.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ParserError::InitError(e.to_string()))?;

        Ok(Self { parser })
    }

    fn extract_imports(&self, source: &str, tree: &Tree) -> Result<Vec<String>, ParserError> {
        let root = tree.root_node();
        if root.is_error() {
            return Err(syntax_error(&root, "expected 'package' clause"));
        }

        let mut imports = Vec::new();
        let mut seen_package = false;

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.is_missing() {
                return Err(syntax_error(&child, "unexpected end of declaration"));
            }

            match child.kind() {
                "comment" => {}
                "package_clause" => {
                    if let Some(bad) = first_error(child) {
                        return Err(syntax_error(&bad, "malformed package clause"));
                    }
                    seen_package = true;
                }
                "import_declaration" => {
                    if !seen_package {
                        return Err(syntax_error(&child, "expected 'package' clause"));
                    }
                    if let Some(bad) = first_error(child) {
                        return Err(syntax_error(&bad, "malformed import declaration"));
                    }
                    self.parse_import_declaration(&child, source, &mut imports)?;
                }
                "ERROR" => {
                    let text = self.get_node_text(&child, source).trim_start();
                    if !seen_package || text.starts_with("import") || text.starts_with("package") {
                        return Err(syntax_error(&child, "malformed package or import declaration"));
                    }
                    break;
                }
                _ if !child.is_named() => {}
                _ => {
                    if !seen_package {
                        return Err(syntax_error(&child, "expected 'package' clause"));
                    }
                    // The import section ends at the first other declaration
                    break;
                }
            }
        }

        if !seen_package {
            return Err(ParserError::Syntax {
                line: 1,
                column: 0,
                message: "expected 'package' clause".to_string(),
            });
        }

        Ok(imports)
    }

    /// `import "x"` or `import ( ... )`
    fn parse_import_declaration(
        &self,
        node: &Node,
        source: &str,
        imports: &mut Vec<String>,
    ) -> Result<(), ParserError> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "import_spec" => self.parse_import_spec(&child, source, imports)?,
                "import_spec_list" => {
                    let mut spec_cursor = child.walk();
                    for spec in child.children(&mut spec_cursor) {
                        if spec.kind() == "import_spec" {
                            self.parse_import_spec(&spec, source, imports)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// A single spec; the optional name (`f`, `.`, `_`) is ignored
    fn parse_import_spec(
        &self,
        node: &Node,
        source: &str,
        imports: &mut Vec<String>,
    ) -> Result<(), ParserError> {
        let Some(path_node) = node.child_by_field_name("path") else {
            return Err(syntax_error(node, "missing import path"));
        };

        let path = unquote(self.get_node_text(&path_node, source));
        if path.is_empty() {
            return Err(syntax_error(&path_node, "invalid import path \"\""));
        }

        imports.push(path.to_string());
        Ok(())
    }

    fn get_node_text<'s>(&self, node: &Node, source: &'s str) -> &'s str {
        &source[node.byte_range()]
    }
}

impl ImportParser for GoParser {
    fn parse(&mut self, source: &str) -> Result<Vec<String>, ParserError> {
        match self.parser.parse(source, None) {
            Some(tree) => self.extract_imports(source, &tree),
            None => Err(ParserError::Syntax {
                line: 1,
                column: 0,
                message: "parser produced no syntax tree".to_string(),
            }),
        }
    }

    fn extension(&self) -> &'static str {
        "go"
    }

    fn is_test_file(&self, file_name: &str) -> bool {
        file_name.ends_with("_test.go")
    }
}

/// Strip the quotes of an interpreted or raw string literal
fn unquote(literal: &str) -> &str {
    literal.trim_matches('"').trim_matches('`')
}

/// Depth-first search for the first ERROR or MISSING node under `node`
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    Some(node)
}

fn syntax_error(node: &Node, message: &str) -> ParserError {
    let pos = node.start_position();
    ParserError::Syntax {
        line: pos.row + 1,
        column: pos.column,
        message: message.to_string(),
    }
}
