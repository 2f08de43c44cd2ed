//! # Template Engine
//!
//! Workbook-facing half of marksheet: finds marker cells, makes room for
//! variable-length payloads and writes them in the template's own style.
//!
//! ## Pipeline
//!
//! ```text
//! TemplateRequest ── render rows ── locate markers ── plan insertions
//!                                                         │
//!   save (temp + rename) ◄── write/anchor ◄── insert rows ◄── snapshot styles
//! ```
//!
//! ## Key Types
//!
//! - [`MarkerLocator`] - Finds marker cells
//! - [`StyleSnapshot`] - Copies a row's formatting onto new rows
//! - [`ImageAnchor`] - Places an image on a cell
//! - [`TemplateCommit`] - One template, one output file
//! - [`DiffOptions`] - Labels and layout of a diff workbook
//! - [`EngineError`] - Everything that can go wrong, with a stable [`EngineError::kind`]

mod commit;
mod error;
mod expander;
mod image;
mod listing;
mod locator;
mod references;
mod reports;
mod style;

pub use commit::{
    ensure_distinct, expand_at, expand_workbook, open_workbook, place_image, save_atomically,
    write_atomically, CommitReport, ImageRequest, ImageSource, TemplateCommit, TemplateRequest,
};
pub use error::EngineError;
pub use expander::{clear_marker, write_block};
pub use image::ImageAnchor;
pub use listing::{add_diagram_sheet, code_workbook, ListingOptions};
pub use locator::MarkerLocator;
pub use references::{shift_foreign_references, shift_formula};
pub use reports::{diff_workbook, search_workbook, DiffOptions, DIFF_SHEET};
pub use style::StyleSnapshot;
