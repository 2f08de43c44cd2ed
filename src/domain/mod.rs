//! Domain models for marksheet
//!
//! Marker grammar, payloads, cell references, row insertion planning,
//! source capture, line diffs and folder search. Nothing in here touches a
//! workbook or the network.

mod cell;
mod diff;
mod highlight;
mod marker;
mod payload;
mod plan;
mod search;
mod source;
mod symbols;

pub use cell::{CellRef, CellRefError, MAX_CELL_CHARS, MAX_COLS, MAX_ROWS};
pub use diff::{diff_lines, format_unified, Change, DiffError, DiffLine, DiffStats, MAX_DIFF_CELLS};
pub use highlight::{classify_lines, TokenClass};
pub use marker::{MarkerKind, MarkerLocation};
pub use payload::{
    ImageFormat, ImagePayload, ImageSize, ItemFormat, PayloadError, RenderedRow, TextBlock,
};
pub use plan::{InsertionPlan, PlanError, RowInsertion};
pub use search::{
    format_matches, search_folder, FileMatches, SearchError, SearchMatch, SearchQuery,
    SearchSummary, DEFAULT_EXCLUDES, DEFAULT_EXTENSIONS,
};
pub use source::{capture_many, detect_language, format_markdown, CodeBlock, LineRange, SourceError};
pub use symbols::{capture_selection, capture_symbols, list_symbols, Symbol, SymbolKind};

#[cfg(test)]
pub(crate) use payload::tests::TINY_PNG;
