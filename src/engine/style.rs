//! Style snapshots
//!
//! A snapshot copies the formatting of one reference row (every styled
//! cell and the row height) so it can be stamped onto rows synthesized
//! later. It never reads the sheet again after capture. Column widths
//! belong to the column and are shared by every inserted row.

use std::collections::BTreeMap;

use umya_spreadsheet::{Style, Worksheet};

use crate::domain::MarkerLocation;

#[derive(Debug, Clone)]
pub struct StyleSnapshot {
    cells: BTreeMap<u32, Style>,
    row_height: Option<f64>,
}

impl StyleSnapshot {
    /// Captures the formatting of `row`, with `col` as the reference cell
    pub fn capture(sheet: &Worksheet, col: u32, row: u32) -> Self {
        let mut cells: BTreeMap<u32, Style> = sheet
            .get_cell_collection()
            .into_iter()
            .filter(|cell| *cell.get_coordinate().get_row_num() == row)
            .map(|cell| (*cell.get_coordinate().get_col_num(), cell.get_style().clone()))
            .collect();
        // The reference cell is always stamped, styled or not
        cells.entry(col).or_default();

        let row_height = sheet
            .get_row_dimension(&row)
            .filter(|dim| *dim.get_custom_height())
            .map(|dim| *dim.get_height());

        Self {
            cells,
            row_height,
        }
    }

    /// Captures the row a marker sits on
    pub fn at_marker(sheet: &Worksheet, loc: &MarkerLocation) -> Self {
        Self::capture(sheet, loc.col, loc.row)
    }

    /// Restyles every captured column of `row` and copies the row height
    pub fn apply_to_row(&self, sheet: &mut Worksheet, row: u32) {
        for (col, style) in &self.cells {
            sheet.get_cell_mut((*col, row)).set_style(style.clone());
        }
        if let Some(height) = self.row_height {
            sheet
                .get_row_dimension_mut(&row)
                .set_height(height)
                .set_custom_height(true);
        }
    }
}
