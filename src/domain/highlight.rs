//! Token classes for syntax colouring
//!
//! A listed line takes the class of its first significant token. Lines are
//! classified from one parse of the whole block, so continuation lines of a
//! multi-line string or comment come out as string or comment.

use serde::Serialize;
use tree_sitter::{Node, Point};

use super::symbols::parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Keyword,
    Declaration,
    /// Names being defined, decorators and attributes
    Definition,
    Type,
    String,
    Comment,
    Number,
    Operator,
    Plain,
}

const DECLARATIONS: &[&str] = &[
    "fn", "let", "const", "static", "struct", "enum", "trait", "impl", "type", "mod", "func", "var",
    "interface", "function",
];

const PYTHON_BUILTINS: &[&str] = &[
    "print", "len", "range", "str", "int", "float", "list", "dict", "set", "tuple", "open",
    "isinstance", "super", "enumerate", "zip", "map", "filter", "sorted", "type",
];

/// One class per line. Unsupported languages come back all [`TokenClass::Plain`].
pub fn classify_lines(language: &str, lines: &[String]) -> Vec<TokenClass> {
    let source = lines.join("\n");
    let Some(tree) = parse(language, &source) else {
        return vec![TokenClass::Plain; lines.len()];
    };
    let root = tree.root_node();

    lines
        .iter()
        .enumerate()
        .map(|(row, line)| {
            let Some(column) = line.find(|c: char| !c.is_whitespace()) else {
                return TokenClass::Plain;
            };
            let point = Point::new(row, column);
            root.descendant_for_point_range(point, point)
                .map(|node| classify(language, node, source.as_bytes()))
                .unwrap_or(TokenClass::Plain)
        })
        .collect()
}

fn is_string(kind: &str) -> bool {
    kind.contains("string") || kind == "char_literal"
}

fn classify(language: &str, node: Node, source: &[u8]) -> TokenClass {
    let mut ancestor = Some(node);
    while let Some(n) = ancestor {
        let kind = n.kind();
        if kind.contains("comment") {
            return TokenClass::Comment;
        }
        if is_string(kind) && n.is_named() {
            let mut outer = n;
            while let Some(parent) = outer.parent().filter(|p| is_string(p.kind())) {
                outer = parent;
            }
            // Docstrings read as comments
            let docstring = language == "python"
                && outer.parent().map(|p| p.kind()) == Some("expression_statement");
            return if docstring {
                TokenClass::Comment
            } else {
                TokenClass::String
            };
        }
        if matches!(kind, "decorator" | "attribute_item" | "inner_attribute_item") {
            return TokenClass::Definition;
        }
        ancestor = n.parent();
    }

    let kind = node.kind();
    if !node.is_named() {
        if kind.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
            return if DECLARATIONS.contains(&kind) {
                TokenClass::Declaration
            } else {
                TokenClass::Keyword
            };
        }
        if kind.chars().all(|c| "()[]{},;:.".contains(c)) {
            return TokenClass::Plain;
        }
        return TokenClass::Operator;
    }

    if kind.contains("integer") || kind.contains("float") || kind == "number" || kind.ends_with("int_literal") {
        return TokenClass::Number;
    }
    if matches!(kind, "true" | "false" | "none" | "null" | "undefined" | "nil") {
        return TokenClass::Declaration;
    }
    if matches!(kind, "primitive_type" | "type_identifier" | "predefined_type") {
        return TokenClass::Type;
    }

    let defines = node
        .parent()
        .and_then(|p| p.child_by_field_name("name"))
        .is_some_and(|name| name.id() == node.id());
    if defines {
        return TokenClass::Definition;
    }

    if language == "python" && kind == "identifier" {
        if let Ok(text) = node.utf8_text(source) {
            if PYTHON_BUILTINS.contains(&text) {
                return TokenClass::Type;
            }
        }
    }
    TokenClass::Plain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn python_lines_take_their_first_token() {
        let classes = classify_lines(
            "python",
            &lines(
                "@cached\ndef load(path):\n    \"\"\"Reads a file.\n    Whole.\"\"\"\n    # cache\n    return 42\n    print(path)\n    x = 1\n\n    42",
            ),
        );
        assert_eq!(
            classes,
            vec![
                TokenClass::Definition,
                TokenClass::Keyword,
                TokenClass::Comment,
                TokenClass::Comment,
                TokenClass::Comment,
                TokenClass::Keyword,
                TokenClass::Type,
                TokenClass::Plain,
                TokenClass::Plain,
                TokenClass::Number,
            ]
        );
    }

    #[test]
    fn rust_declarations_and_strings() {
        let classes = classify_lines(
            "rust",
            &lines("#[derive(Debug)]\nfn main() {\n    let s = \"a\n    b\";\n    // done\n}"),
        );
        assert_eq!(
            classes,
            vec![
                TokenClass::Definition,
                TokenClass::Declaration,
                TokenClass::Declaration,
                TokenClass::String,
                TokenClass::Comment,
                TokenClass::Plain,
            ]
        );
    }

    #[test]
    fn unknown_language_is_plain() {
        let classes = classify_lines("sql", &lines("select 1;\n-- note"));
        assert_eq!(classes, vec![TokenClass::Plain, TokenClass::Plain]);
    }
}
