//! Source line-range capture
//!
//! Slices 1-indexed, inclusive line ranges out of a text file and keeps the
//! line numbers attached so they can be listed next to the code.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line range {range} is invalid for {path} ({total} lines): {reason}")]
    OutOfBounds {
        path: PathBuf,
        range: LineRange,
        total: usize,
        reason: &'static str,
    },

    #[error("Invalid line range '{0}': expected 'start' or 'start-end'")]
    Syntax(String),

    #[error("No line ranges or symbol names given")]
    NoRanges,

    #[error("Symbol lookup is not supported for {path} (language '{language}')")]
    UnsupportedLanguage {
        path: PathBuf,
        language: &'static str,
    },

    #[error("'{name}' not found in {path}")]
    SymbolNotFound { name: String, path: PathBuf },

    #[error("Failed to parse {0}")]
    Parse(PathBuf),
}

/// A 1-indexed inclusive line range; a missing end means a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RangeRepr")]
pub struct LineRange {
    pub start: u32,
    pub end: Option<u32>,
}

/// Accepted wire shapes: `[5, 10]`, `[5, null]`, `[5]` or `{"start": 5, "end": 10}`
#[derive(Deserialize)]
#[serde(untagged)]
enum RangeRepr {
    Pair(u32, Option<u32>),
    Single([u32; 1]),
    Object { start: u32, end: Option<u32> },
}

impl From<RangeRepr> for LineRange {
    fn from(repr: RangeRepr) -> Self {
        match repr {
            RangeRepr::Pair(start, end) => LineRange { start, end },
            RangeRepr::Single([start]) => LineRange { start, end: None },
            RangeRepr::Object { start, end } => LineRange { start, end },
        }
    }
}

impl LineRange {
    pub fn new(start: u32, end: Option<u32>) -> Self {
        Self { start, end }
    }

    /// Last line covered by the range
    pub fn last(&self) -> u32 {
        self.end.unwrap_or(self.start)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

impl FromStr for LineRange {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || SourceError::Syntax(s.to_string());
        let s = s.trim();

        match s.split_once('-') {
            Some((start, end)) => Ok(LineRange::new(
                start.trim().parse().map_err(|_| syntax())?,
                Some(end.trim().parse().map_err(|_| syntax())?),
            )),
            None => Ok(LineRange::new(s.parse().map_err(|_| syntax())?, None)),
        }
    }
}

/// A captured block of source lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub file_path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
    pub lines: Vec<String>,
    pub language: &'static str,
}

impl CodeBlock {
    /// Header used above the block in listings
    pub fn title(&self) -> String {
        format!(
            "{} (Lines {}-{})",
            self.file_path.display(),
            self.start_line,
            self.end_line
        )
    }

    /// Lines prefixed with right-aligned line numbers
    pub fn numbered_lines(&self) -> Vec<String> {
        let width = self.end_line.to_string().len();
        self.lines
            .iter()
            .zip(self.start_line..)
            .map(|(line, n)| format!("{:>width$} | {}", n, line, width = width))
            .collect()
    }
}

/// Captures one range from already-loaded lines
pub(super) fn slice(path: &Path, lines: &[&str], range: LineRange) -> Result<CodeBlock, SourceError> {
    let total = lines.len();
    let out_of_bounds = |reason| SourceError::OutOfBounds {
        path: path.to_path_buf(),
        range,
        total,
        reason,
    };

    let end = range.last();
    if range.start < 1 {
        return Err(out_of_bounds("lines are numbered from 1"));
    }
    if end < range.start {
        return Err(out_of_bounds("end is before start"));
    }
    if range.start as usize > total {
        return Err(out_of_bounds("start is past the end of the file"));
    }
    if end as usize > total {
        return Err(out_of_bounds("end is past the end of the file"));
    }

    Ok(CodeBlock {
        file_path: path.to_path_buf(),
        start_line: range.start,
        end_line: end,
        lines: lines[range.start as usize - 1..end as usize]
            .iter()
            .map(|l| l.to_string())
            .collect(),
        language: detect_language(path),
    })
}

/// Captures several ranges from one file, in the order given.
///
/// The file is read once; any invalid range fails the whole capture.
pub fn capture_many(path: &Path, ranges: &[LineRange]) -> Result<Vec<CodeBlock>, SourceError> {
    if ranges.is_empty() {
        return Err(SourceError::NoRanges);
    }

    let content = read_source(path)?;
    let lines: Vec<&str> = content.lines().collect();

    ranges.iter().map(|r| slice(path, &lines, *r)).collect()
}

pub(super) fn read_source(path: &Path) -> Result<String, SourceError> {
    if !path.is_file() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Language tag for a file, from its extension
pub fn detect_language(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "py" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "php" => "php",
        "sql" => "sql",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "md" => "markdown",
        "sh" => "bash",
        "bat" => "batch",
        "ps1" => "powershell",
        _ => "",
    }
}

/// Renders blocks as a markdown document with numbered lines
pub fn format_markdown(blocks: &[CodeBlock], title: &str) -> String {
    let mut doc = format!("# {}\n\n", title);

    for (i, block) in blocks.iter().enumerate() {
        doc.push_str(&format!("## Block {}\n", i + 1));
        doc.push_str(&format!("File: {}\n", block.file_path.display()));
        doc.push_str(&format!("Lines {}-{}\n\n", block.start_line, block.end_line));
        doc.push_str(&format!("```{}\n", block.language));
        for line in block.numbered_lines() {
            doc.push_str(&line);
            doc.push('\n');
        }
        doc.push_str("```\n\n");
    }

    doc
}
