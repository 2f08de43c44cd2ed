//! Named symbol capture
//!
//! Functions and classes are found by name in a tree-sitter parse and
//! captured over their full line span. Rust, Python, TypeScript and Go
//! sources are supported.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tree_sitter::{Node, Parser, Tree};

use super::source::{capture_many, detect_language, read_source, slice, CodeBlock, LineRange, SourceError};

/// What a named symbol is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Class => write!(f, "class"),
        }
    }
}

/// A function or class and the lines it spans
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: u32,
    pub end_line: u32,
}

impl Symbol {
    pub fn range(&self) -> LineRange {
        LineRange::new(self.start_line, Some(self.end_line))
    }
}

/// Grammar for a language tag, when one is bundled
fn grammar(language: &str) -> Option<tree_sitter::Language> {
    match language {
        "rust" => Some(tree_sitter_rust::LANGUAGE.into()),
        "python" => Some(tree_sitter_python::LANGUAGE.into()),
        "typescript" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "go" => Some(tree_sitter_go::LANGUAGE.into()),
        _ => None,
    }
}

/// Parses `source`, or `None` when the language has no bundled grammar
pub(super) fn parse(language: &str, source: &str) -> Option<Tree> {
    let grammar = grammar(language)?;
    let mut parser = Parser::new();
    parser.set_language(&grammar).ok()?;
    parser.parse(source, None)
}

fn symbol_kind(language: &str, node: &Node) -> Option<SymbolKind> {
    use SymbolKind::*;

    match (language, node.kind()) {
        ("python", "function_definition") => Some(Function),
        ("python", "class_definition") => Some(Class),
        ("rust", "function_item" | "function_signature_item") => Some(Function),
        ("rust", "struct_item" | "enum_item" | "union_item" | "trait_item") => Some(Class),
        ("typescript", "function_declaration" | "generator_function_declaration" | "method_definition") => {
            Some(Function)
        }
        ("typescript", "class_declaration" | "abstract_class_declaration" | "interface_declaration") => {
            Some(Class)
        }
        ("go", "function_declaration" | "method_declaration") => Some(Function),
        ("go", "type_spec") => Some(Class),
        _ => None,
    }
}

/// Node whose span is reported: a lone Go `type_spec` includes its `type` keyword
fn span_node<'t>(node: Node<'t>) -> Node<'t> {
    match node.parent() {
        Some(parent)
            if node.kind() == "type_spec"
                && parent.kind() == "type_declaration"
                && parent.named_child_count() == 1 =>
        {
            parent
        }
        _ => node,
    }
}

/// 1-indexed inclusive line span; a node ending at column 0 ends on the line before
fn line_span(node: &Node) -> (u32, u32) {
    let start = node.start_position().row;
    let end = node.end_position();
    let last = if end.column == 0 && end.row > start {
        end.row - 1
    } else {
        end.row
    };
    (start as u32 + 1, last as u32 + 1)
}

fn collect(language: &str, node: Node, source: &[u8], out: &mut Vec<Symbol>) {
    if let Some(kind) = symbol_kind(language, &node) {
        let name = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok());
        if let Some(name) = name {
            let (start_line, end_line) = line_span(&span_node(node));
            out.push(Symbol {
                name: name.to_string(),
                kind,
                start_line,
                end_line,
            });
        }
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect(language, child, source, out);
        }
    }
}

fn symbols_in(path: &Path, content: &str) -> Result<Vec<Symbol>, SourceError> {
    let language = detect_language(path);
    if grammar(language).is_none() {
        return Err(SourceError::UnsupportedLanguage {
            path: path.to_path_buf(),
            language,
        });
    }
    let tree = parse(language, content).ok_or_else(|| SourceError::Parse(path.to_path_buf()))?;

    let mut symbols = Vec::new();
    collect(language, tree.root_node(), content.as_bytes(), &mut symbols);
    Ok(symbols)
}

/// Every function and class in a file, in source order
pub fn list_symbols(path: &Path) -> Result<Vec<Symbol>, SourceError> {
    let content = read_source(path)?;
    symbols_in(path, &content)
}

/// Captures the named symbols of a file, in the order given.
///
/// The first symbol with a matching name wins, whatever its kind. A name
/// that matches nothing fails the whole capture.
pub fn capture_symbols(path: &Path, names: &[String]) -> Result<Vec<CodeBlock>, SourceError> {
    if names.is_empty() {
        return Err(SourceError::NoRanges);
    }

    let content = read_source(path)?;
    let symbols = symbols_in(path, &content)?;
    let lines: Vec<&str> = content.lines().collect();

    names
        .iter()
        .map(|name| {
            let symbol = symbols.iter().find(|s| s.name == *name).ok_or_else(|| {
                SourceError::SymbolNotFound {
                    name: name.clone(),
                    path: path.to_path_buf(),
                }
            })?;
            slice(path, &lines, symbol.range())
        })
        .collect()
}

/// Line ranges first, then named symbols; at least one of the two is required
pub fn capture_selection(
    path: &Path,
    ranges: &[LineRange],
    names: &[String],
) -> Result<Vec<CodeBlock>, SourceError> {
    if ranges.is_empty() && names.is_empty() {
        return Err(SourceError::NoRanges);
    }

    let mut blocks = if ranges.is_empty() {
        Vec::new()
    } else {
        capture_many(path, ranges)?
    };
    if !names.is_empty() {
        blocks.extend(capture_symbols(path, names)?);
    }
    Ok(blocks)
}
