//! Marker grammar
//!
//! A marker is a sentinel literal placed in a template cell to name an
//! insertion point: `marker[<kind>]`, e.g. `marker[main_task]`.
//! Only the kinds listed in [`MarkerKind`] are recognized; anything else
//! that happens to look like a marker is left alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::cell::CellRef;

const PREFIX: &str = "marker[";
const SUFFIX: &str = "]";

/// The payload kind a marker stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Numbered list of main tasks
    MainTask,

    /// Numbered list of support tasks
    SupportTask,

    /// PlantUML source text, one line per row
    Plantuml,

    /// Rendered PlantUML image
    PlantumlImage,

    /// Line-numbered source listing
    CodeBlock,

    /// Rendered diagram image on a generated sheet
    DiagramImage,
}

impl MarkerKind {
    /// Returns all recognized kinds
    pub fn all() -> &'static [MarkerKind] {
        &[
            MarkerKind::MainTask,
            MarkerKind::SupportTask,
            MarkerKind::Plantuml,
            MarkerKind::PlantumlImage,
            MarkerKind::CodeBlock,
            MarkerKind::DiagramImage,
        ]
    }

    /// Returns the kind name used inside the brackets
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::MainTask => "main_task",
            MarkerKind::SupportTask => "support_task",
            MarkerKind::Plantuml => "plantuml",
            MarkerKind::PlantumlImage => "plantuml_image",
            MarkerKind::CodeBlock => "code_block",
            MarkerKind::DiagramImage => "diagram_image",
        }
    }

    /// Returns the full sentinel text, e.g. `marker[main_task]`
    pub fn sentinel(&self) -> String {
        format!("{}{}{}", PREFIX, self.as_str(), SUFFIX)
    }

    /// Returns true if this marker receives an image rather than text
    pub fn is_image(&self) -> bool {
        matches!(self, MarkerKind::PlantumlImage | MarkerKind::DiagramImage)
    }

    /// Parses a cell's literal value as a marker.
    ///
    /// Surrounding whitespace is ignored. Returns `None` for anything that
    /// is not exactly a recognized sentinel.
    pub fn from_cell_text(text: &str) -> Option<MarkerKind> {
        let inner = text
            .trim()
            .strip_prefix(PREFIX)?
            .strip_suffix(SUFFIX)?;
        inner.parse().ok()
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown marker kind: {}", s))
    }
}

/// Where a marker was found: sheet name plus 1-based row and column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerLocation {
    pub sheet: String,
    pub row: u32,
    pub col: u32,
}

impl MarkerLocation {
    pub fn new(sheet: impl Into<String>, col: u32, row: u32) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
        }
    }

    /// Returns the cell reference within the sheet
    pub fn cell(&self) -> CellRef {
        CellRef::new(self.col, self.row)
    }

    /// Returns the same location moved to another row
    pub fn with_row(&self, row: u32) -> Self {
        Self {
            sheet: self.sheet.clone(),
            row,
            col: self.col,
        }
    }
}

impl fmt::Display for MarkerLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'!{}", self.sheet, self.cell())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_format() {
        assert_eq!(MarkerKind::MainTask.sentinel(), "marker[main_task]");
        assert_eq!(MarkerKind::PlantumlImage.sentinel(), "marker[plantuml_image]");
    }

    #[test]
    fn parse_every_kind_from_its_sentinel() {
        for kind in MarkerKind::all() {
            assert_eq!(MarkerKind::from_cell_text(&kind.sentinel()), Some(*kind));
        }
    }

    #[test]
    fn parse_ignores_surrounding_whitespace() {
        assert_eq!(
            MarkerKind::from_cell_text("  marker[support_task]\n"),
            Some(MarkerKind::SupportTask)
        );
    }

    #[test]
    fn unknown_or_partial_markers_are_not_recognized() {
        assert_eq!(MarkerKind::from_cell_text("marker[whatever]"), None);
        assert_eq!(MarkerKind::from_cell_text("marker[main_task"), None);
        assert_eq!(MarkerKind::from_cell_text("see marker[main_task]"), None);
        assert_eq!(MarkerKind::from_cell_text("marker[ main_task ]"), None);
        assert_eq!(MarkerKind::from_cell_text(""), None);
    }

    #[test]
    fn image_kinds() {
        assert!(MarkerKind::PlantumlImage.is_image());
        assert!(MarkerKind::DiagramImage.is_image());
        assert!(!MarkerKind::MainTask.is_image());
        assert!(!MarkerKind::CodeBlock.is_image());
    }

    #[test]
    fn kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&MarkerKind::SupportTask).unwrap();
        assert_eq!(json, "\"support_task\"");

        let kind: MarkerKind = serde_json::from_str("\"diagram_image\"").unwrap();
        assert_eq!(kind, MarkerKind::DiagramImage);
    }

    #[test]
    fn location_display() {
        let loc = MarkerLocation::new("Tasks", 2, 5);
        assert_eq!(loc.to_string(), "'Tasks'!B5");
        assert_eq!(loc.with_row(9).to_string(), "'Tasks'!B9");
    }
}
