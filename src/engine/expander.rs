//! Row expansion
//!
//! Writes a rendered block at a marker whose rows have already been
//! inserted by the plan. Row 1 of the block replaces the marker text in
//! place; every later row is restyled from the snapshot before it is
//! written.

use umya_spreadsheet::Worksheet;

use super::style::StyleSnapshot;
use crate::domain::{MarkerLocation, RenderedRow};

/// Writes `rows` downward from `at`, which must already be the marker's
/// final position.
///
/// An empty block clears the marker text and keeps the cell's formatting.
/// Labels go into the column left of the marker; callers make sure that
/// column exists.
pub fn write_block(
    sheet: &mut Worksheet,
    at: &MarkerLocation,
    rows: &[RenderedRow],
    snapshot: &StyleSnapshot,
) {
    if rows.is_empty() {
        clear_marker(sheet, at);
        return;
    }

    for (offset, content) in rows.iter().enumerate() {
        let row = at.row + offset as u32;
        if offset > 0 {
            snapshot.apply_to_row(sheet, row);
        }

        sheet
            .get_cell_mut((at.col, row))
            .set_value_string(content.text.as_str());

        if let Some(label) = content.label {
            sheet.get_cell_mut((at.col - 1, row)).set_value_number(label);
        }
    }
}

/// Removes the marker text, leaving the cell's style untouched
pub fn clear_marker(sheet: &mut Worksheet, at: &MarkerLocation) {
    sheet
        .get_cell_mut((at.col, at.row))
        .get_cell_value_mut()
        .set_blank();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarkerKind, TextBlock};

    fn marker_sheet() -> umya_spreadsheet::Spreadsheet {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut("B2").set_value_string("marker[main_task]");
        sheet.get_style_mut("B2").get_font_mut().set_italic(true);
        book
    }

    fn value(sheet: &Worksheet, coord: &str) -> String {
        sheet
            .get_cell(coord)
            .map(|c| c.get_value().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn block_replaces_marker_and_fills_rows_below() {
        let mut book = marker_sheet();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        let at = MarkerLocation::new("Sheet1", 2, 2);
        let snapshot = StyleSnapshot::at_marker(sheet, &at);

        let rows = TextBlock::numbered(
            MarkerKind::MainTask,
            vec!["one".into(), "two".into(), "three".into()],
        )
        .render()
        .unwrap();
        write_block(sheet, &at, &rows, &snapshot);

        assert_eq!(value(sheet, "B2"), "1. one");
        assert_eq!(value(sheet, "B3"), "2. two");
        assert_eq!(value(sheet, "B4"), "3. three");
        assert_eq!(
            format!("{:?}", sheet.get_cell("B4").map(|c| c.get_style())),
            format!("{:?}", sheet.get_cell("B2").map(|c| c.get_style()))
        );
    }

    #[test]
    fn empty_block_clears_marker_text() {
        let mut book = marker_sheet();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        let at = MarkerLocation::new("Sheet1", 2, 2);
        let snapshot = StyleSnapshot::at_marker(sheet, &at);
        let style_before = format!("{:?}", sheet.get_cell("B2").map(|c| c.get_style()));

        write_block(sheet, &at, &[], &snapshot);

        assert_eq!(value(sheet, "B2"), "");
        assert_eq!(
            format!("{:?}", sheet.get_cell("B2").map(|c| c.get_style())),
            style_before
        );
    }

    #[test]
    fn labels_land_left_of_the_text() {
        let mut book = marker_sheet();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        let at = MarkerLocation::new("Sheet1", 2, 2);
        let snapshot = StyleSnapshot::at_marker(sheet, &at);

        let rows = vec![
            RenderedRow {
                label: Some(10),
                text: "let a = 1;".into(),
            },
            RenderedRow {
                label: Some(11),
                text: "let b = 2;".into(),
            },
        ];
        write_block(sheet, &at, &rows, &snapshot);

        assert_eq!(value(sheet, "A2"), "10");
        assert_eq!(value(sheet, "A3"), "11");
        assert_eq!(value(sheet, "B3"), "let b = 2;");
    }
}
