//! Import extraction from Go source files.
//!
//! Only the file header matters here: the package clause and the import
//! declarations. Build constraints are not evaluated.

use tracing::trace;

/// Node kinds from the tree-sitter-go grammar.
mod node_kinds {
    pub const PACKAGE_CLAUSE: &str = "package_clause";
    pub const PACKAGE_IDENTIFIER: &str = "package_identifier";
    pub const IMPORT_DECLARATION: &str = "import_declaration";
    pub const IMPORT_SPEC: &str = "import_spec";
    pub const IMPORT_SPEC_LIST: &str = "import_spec_list";
}

/// Header of one Go source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoFileHeader {
    /// Name from the `package` clause
    pub package: String,
    /// Import paths in declaration order
    pub imports: Vec<String>,
}

/// Parses Go file headers with tree-sitter.
pub struct GoParser {
    parser: tree_sitter::Parser,
}

impl GoParser {
    /// Create a parser loaded with the Go grammar.
    ///
    /// # Errors
    ///
    /// Returns the tree-sitter message if the grammar version is incompatible.
    pub fn new() -> Result<Self, String> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| e.to_string())?;
        Ok(Self { parser })
    }

    /// Extract the package clause and imports of one file.
    ///
    /// Returns `None` if the source has no package clause.
    pub fn parse_header(&mut self, content: &str) -> Option<GoFileHeader> {
        let tree = self.parser.parse(content, None)?;
        let root = tree.root_node();
        let bytes = content.as_bytes();

        let mut header = GoFileHeader::default();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                node_kinds::PACKAGE_CLAUSE => {
                    header.package = package_name(&child, bytes)?;
                }
                node_kinds::IMPORT_DECLARATION => {
                    collect_imports(&child, bytes, &mut header.imports);
                }
                _ => {}
            }
        }

        if header.package.is_empty() {
            return None;
        }
        Some(header)
    }
}

fn package_name(node: &tree_sitter::Node, content: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|c| c.kind() == node_kinds::PACKAGE_IDENTIFIER)
        .and_then(|c| node_text(&c, content))
}

fn collect_imports(node: &tree_sitter::Node, content: &[u8], imports: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            node_kinds::IMPORT_SPEC => {
                if let Some(path) = import_path(&child, content) {
                    imports.push(path);
                }
            }
            node_kinds::IMPORT_SPEC_LIST => collect_imports(&child, content, imports),
            _ => {}
        }
    }
}

fn import_path(spec: &tree_sitter::Node, content: &[u8]) -> Option<String> {
    let literal = spec.child_by_field_name("path")?;
    let text = node_text(&literal, content)?;
    let path = text.trim_matches(|c| c == '"' || c == '`');
    if path.is_empty() {
        trace!(spec = %text, "Skipping empty import path");
        return None;
    }
    Some(path.to_string())
}

fn node_text(node: &tree_sitter::Node, content: &[u8]) -> Option<String> {
    match std::str::from_utf8(&content[node.byte_range()]) {
        Ok(s) => Some(s.to_string()),
        Err(e) => {
            trace!(
                byte_range = ?node.byte_range(),
                error = %e,
                node_kind = %node.kind(),
                "Failed to decode node text as UTF-8"
            );
            None
        }
    }
}
