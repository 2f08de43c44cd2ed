//! marksheet - marker-driven Excel template filling
//!
//! A template workbook carries marker cells such as `marker[main_task]`.
//! marksheet finds them, inserts rows so every item gets its own row, copies
//! the marker cell's formatting onto the new rows, and anchors rendered
//! PlantUML diagrams at image markers. Code listings and diagram sheets are
//! generated on the same machinery.

pub mod cli;
pub mod domain;
pub mod engine;
pub mod render;
pub mod storage;
pub mod tools;

pub use domain::{CellRef, ImageSize, LineRange, MarkerKind, MarkerLocation, TextBlock};
pub use engine::{EngineError, TemplateCommit, TemplateRequest};
pub use render::{DiagramFormat, DiagramRenderer, PlantUmlServer};
