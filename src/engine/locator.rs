//! Marker location
//!
//! Scans populated cells in row-major order, sheets in workbook order.
//! Formula cells never match, only literal text does.

use std::collections::BTreeMap;

use tracing::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::EngineError;
use crate::domain::{MarkerKind, MarkerLocation};

/// Finds marker cells in an open workbook without modifying it
pub struct MarkerLocator<'a> {
    book: &'a Spreadsheet,
    scope: Option<&'a str>,
}

impl<'a> MarkerLocator<'a> {
    /// Searches every sheet
    pub fn new(book: &'a Spreadsheet) -> Self {
        Self { book, scope: None }
    }

    /// Restricts the search to one sheet
    pub fn within_sheet(book: &'a Spreadsheet, sheet: &'a str) -> Result<Self, EngineError> {
        if book.get_sheet_by_name(sheet).is_none() {
            return Err(EngineError::malformed(format!(
                "Sheet '{}' does not exist (sheets: {})",
                sheet,
                sheet_names(book).join(", ")
            )));
        }
        Ok(Self {
            book,
            scope: Some(sheet),
        })
    }

    fn sheets(&self) -> impl Iterator<Item = &'a Worksheet> + '_ {
        self.book
            .get_sheet_collection_no_check()
            .iter()
            .filter(move |ws| self.scope.map_or(true, |name| ws.get_name() == name))
    }

    /// Human-readable description of what is searched
    pub fn scope(&self) -> String {
        match self.scope {
            Some(name) => format!("sheet '{}'", name),
            None => format!("all sheets ({})", sheet_names(self.book).join(", ")),
        }
    }

    /// Returns every recognized marker in scope, in scan order
    pub fn scan(&self) -> Vec<(MarkerKind, MarkerLocation)> {
        let mut found = Vec::new();

        for sheet in self.sheets() {
            let mut in_sheet: Vec<(u32, u32, MarkerKind)> = sheet
                .get_cell_collection()
                .into_iter()
                .filter(|cell| !cell.is_formula())
                .filter_map(|cell| {
                    let kind = MarkerKind::from_cell_text(&cell.get_value())?;
                    let coord = cell.get_coordinate();
                    Some((*coord.get_row_num(), *coord.get_col_num(), kind))
                })
                .collect();
            in_sheet.sort();

            found.extend(
                in_sheet
                    .into_iter()
                    .map(|(row, col, kind)| (kind, MarkerLocation::new(sheet.get_name(), col, row))),
            );
        }

        found
    }

    /// Resolves every requested kind in a single pass.
    ///
    /// The first match in sheet order wins. Fails on the first missing kind
    /// (in the order requested), or when a requested kind occurs twice on
    /// the sheet where it was first found.
    pub fn locate_all(
        &self,
        kinds: &[MarkerKind],
    ) -> Result<BTreeMap<MarkerKind, MarkerLocation>, EngineError> {
        let mut located: BTreeMap<MarkerKind, MarkerLocation> = BTreeMap::new();

        for (kind, loc) in self.scan() {
            if !kinds.contains(&kind) {
                continue;
            }
            if let Some(first) = located.get(&kind) {
                if first.sheet != loc.sheet {
                    continue;
                }
                return Err(EngineError::DuplicateMarker {
                    kind,
                    first: first.clone(),
                    second: loc,
                });
            }
            debug!(marker = %kind, location = %loc, "marker located");
            located.insert(kind, loc);
        }

        for kind in kinds {
            if !located.contains_key(kind) {
                return Err(EngineError::MarkerNotFound {
                    kind: *kind,
                    scope: self.scope(),
                });
            }
        }

        Ok(located)
    }
}

pub(crate) fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection_no_check()
        .iter()
        .map(|ws| ws.get_name().to_string())
        .collect()
}
