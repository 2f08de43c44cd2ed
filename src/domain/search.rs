//! Text search across a folder of source files
//!
//! Walks the folder recursively, skipping tool and build directories, and
//! reports matching lines with a few lines of context on each side.

use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Extensions searched when the query names none
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "c", "cpp", "h", "hpp", "cs", "go", "rs", "rb", "php",
    "swift", "kt", "scala", "html", "css", "scss", "less", "vue", "svelte", "json", "yaml", "yml",
    "xml", "toml", "ini", "cfg", "md", "txt", "rst", "sql", "sh", "bash", "ps1", "bat",
];

/// Directory names never descended into
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "__pycache__",
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "venv",
    ".venv",
    "env",
    ".env",
    "dist",
    "build",
    "target",
    "out",
    "bin",
    "obj",
    ".idea",
    ".vscode",
    ".vs",
    "coverage",
    ".pytest_cache",
    ".mypy_cache",
];

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search folder not found: {0}")]
    NotAFolder(PathBuf),

    #[error("Search query must not be empty")]
    EmptyQuery,

    #[error("Invalid search pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

fn default_context() -> usize {
    2
}

fn default_max_results() -> usize {
    1000
}

/// What to look for and how much to report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,

    /// Treat `query` as a regular expression instead of literal text
    #[serde(default)]
    pub regex: bool,

    #[serde(default)]
    pub case_sensitive: bool,

    /// Extensions to search, with or without the dot; empty means the defaults
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default = "default_context")]
    pub context_lines: usize,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            regex: false,
            case_sensitive: false,
            extensions: Vec::new(),
            context_lines: default_context(),
            max_results: default_max_results(),
        }
    }

    fn pattern(&self) -> Result<Regex, SearchError> {
        if self.query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let source = if self.regex {
            self.query.clone()
        } else {
            regex::escape(&self.query)
        };
        RegexBuilder::new(&source)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| SearchError::Pattern {
                pattern: self.query.clone(),
                message: e.to_string(),
            })
    }

    fn wants(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.contains(&ext.as_str())
        } else {
            self.extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        }
    }
}

/// One matching line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub line_number: u32,
    pub line: String,
    /// Character offsets of the first match in `line`
    pub match_start: usize,
    pub match_end: usize,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatches {
    pub file_path: PathBuf,
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub query: String,
    pub regex: bool,
    pub folder: PathBuf,
    pub results: Vec<FileMatches>,
    /// Whether the search stopped at `max_results`
    pub truncated: bool,
}

impl SearchSummary {
    pub fn total_matches(&self) -> usize {
        self.results.iter().map(|r| r.matches.len()).sum()
    }

    pub fn files_with_matches(&self) -> usize {
        self.results.len()
    }
}

/// Files under `dir` in name order, skipping excluded directories.
/// Unreadable directories are skipped.
fn walk(dir: &Path, query: &SearchQuery, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        debug!(dir = %dir.display(), "skipping unreadable directory");
        return;
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            let excluded = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| DEFAULT_EXCLUDES.contains(&n));
            if !excluded {
                walk(&path, query, files);
            }
        } else if path.is_file() && query.wants(&path) {
            files.push(path);
        }
    }
}

fn search_file(path: &Path, pattern: &Regex, context: usize, budget: usize) -> Option<FileMatches> {
    let bytes = fs::read(path).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();

    let mut matches = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if matches.len() >= budget {
            break;
        }
        let Some(m) = pattern.find(line) else {
            continue;
        };
        let first = i.saturating_sub(context);
        let last = (i + context + 1).min(lines.len());
        matches.push(SearchMatch {
            line_number: i as u32 + 1,
            line: line.to_string(),
            match_start: line[..m.start()].chars().count(),
            match_end: line[..m.end()].chars().count(),
            context_before: lines[first..i].iter().map(|l| l.to_string()).collect(),
            context_after: lines[i + 1..last].iter().map(|l| l.to_string()).collect(),
        });
    }

    (!matches.is_empty()).then(|| FileMatches {
        file_path: path.to_path_buf(),
        matches,
    })
}

/// Searches every matching file under `folder`, stopping at `max_results`
pub fn search_folder(folder: &Path, query: &SearchQuery) -> Result<SearchSummary, SearchError> {
    if !folder.is_dir() {
        return Err(SearchError::NotAFolder(folder.to_path_buf()));
    }
    let pattern = query.pattern()?;

    let mut files = Vec::new();
    walk(folder, query, &mut files);
    debug!(folder = %folder.display(), files = files.len(), "searching");

    let mut results = Vec::new();
    let mut found = 0;
    for path in files {
        if found >= query.max_results {
            break;
        }
        if let Some(file) = search_file(&path, &pattern, query.context_lines, query.max_results - found) {
            found += file.matches.len();
            results.push(file);
        }
    }

    Ok(SearchSummary {
        query: query.query.clone(),
        regex: query.regex,
        folder: folder.to_path_buf(),
        results,
        truncated: found >= query.max_results,
    })
}

/// Plain-text report of a search
pub fn format_matches(summary: &SearchSummary, show_context: bool) -> String {
    let mut out = format!(
        "Search results for '{}'\n  Folder: {}\n  Matches: {} in {} files\n\n",
        summary.query,
        summary.folder.display(),
        summary.total_matches(),
        summary.files_with_matches()
    );

    for file in &summary.results {
        out.push_str(&format!(
            "{} ({} matches)\n",
            file.file_path.display(),
            file.matches.len()
        ));
        for m in &file.matches {
            if !show_context {
                out.push_str(&format!("  Line {}: {}\n", m.line_number, m.line.trim()));
                continue;
            }
            out.push_str(&format!("  Line {}:\n", m.line_number));
            for line in &m.context_before {
                out.push_str(&format!("     | {}\n", line));
            }
            out.push_str(&format!("  >> | {}\n", m.line));
            for line in &m.context_after {
                out.push_str(&format!("     | {}\n", line));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    if summary.truncated {
        out.push_str("Result limit reached; narrow the query to see more.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {\n    // TODO wire up\n    run();\n}\n").unwrap();
        fs::write(root.join("src/notes.md"), "todo: docs\n").unwrap();
        fs::write(root.join("src/logo.png"), "todo in a binary").unwrap();
        fs::write(root.join("node_modules/dep/index.js"), "// TODO vendored\n").unwrap();
        dir
    }

    #[test]
    fn literal_search_ignores_case_and_excluded_dirs() {
        let dir = tree();
        let summary = search_folder(dir.path(), &SearchQuery::new("todo")).unwrap();

        let files: Vec<_> = summary
            .results
            .iter()
            .map(|f| f.file_path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(files, vec![PathBuf::from("src/main.rs"), PathBuf::from("src/notes.md")]);
        assert_eq!(summary.total_matches(), 2);

        let m = &summary.results[0].matches[0];
        assert_eq!(m.line_number, 2);
        assert_eq!((m.match_start, m.match_end), (7, 11));
        assert_eq!(m.context_before, vec!["fn main() {"]);
        assert_eq!(m.context_after, vec!["    run();", "}"]);
    }

    #[test]
    fn regex_and_case_sensitivity() {
        let dir = tree();
        let mut query = SearchQuery::new(r"TODO\s+\w+");
        query.regex = true;
        query.case_sensitive = true;

        let summary = search_folder(dir.path(), &query).unwrap();
        assert_eq!(summary.total_matches(), 1);

        let literal = SearchQuery::new("run(");
        assert_eq!(search_folder(dir.path(), &literal).unwrap().total_matches(), 1);
    }

    #[test]
    fn extension_filter_and_result_limit() {
        let dir = tree();
        let mut query = SearchQuery::new("todo");
        query.extensions = vec![".md".to_string()];
        assert_eq!(search_folder(dir.path(), &query).unwrap().files_with_matches(), 1);

        let mut query = SearchQuery::new("o");
        query.max_results = 2;
        let summary = search_folder(dir.path(), &query).unwrap();
        assert_eq!(summary.total_matches(), 2);
        assert!(summary.truncated);
    }

    #[test]
    fn bad_inputs() {
        let dir = tree();
        let mut query = SearchQuery::new("(unclosed");
        query.regex = true;
        assert!(matches!(
            search_folder(dir.path(), &query),
            Err(SearchError::Pattern { .. })
        ));
        assert!(matches!(
            search_folder(dir.path(), &SearchQuery::new("")),
            Err(SearchError::EmptyQuery)
        ));
        assert!(matches!(
            search_folder(&dir.path().join("missing"), &SearchQuery::new("x")),
            Err(SearchError::NotAFolder(_))
        ));
    }

    #[test]
    fn text_report_marks_the_match() {
        let dir = tree();
        let summary = search_folder(dir.path(), &SearchQuery::new("wire")).unwrap();
        let text = format_matches(&summary, true);
        assert!(text.contains("Matches: 1 in 1 files"));
        assert!(text.contains("  >> |     // TODO wire up\n"));
        assert!(format_matches(&summary, false).contains("  Line 2: // TODO wire up\n"));
    }
}
