//! Diff and search workbooks
//!
//! Built from scratch like the code listings. The old and new sides of a
//! diff go through the listing writer; the diff view and search sheets are
//! painted row by row because every row carries its own colours.

use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::listing::{
    column_headers, font, grid, header_bar, write_listing, Listing, CODE_BG, CODE_FG, HEADER_BG,
    LINE_NUMBER_FG, MONOSPACE, WHITE,
};
use super::EngineError;
use crate::domain::{
    diff_lines, Change, DiffLine, DiffStats, ItemFormat, MarkerKind, SearchSummary, TextBlock,
};

const ADDED_BG: &str = "FF1E3A1E";
const REMOVED_BG: &str = "FF3A1E1E";
const ADDED_FG: &str = "FFA6E22E";
const REMOVED_FG: &str = "FFF92672";
const MATCH_BG: &str = "FF3A3A1E";
const MATCH_FG: &str = "FFE6DB74";
const SUMMARY_BG: &str = "FF366092";

/// Name of the sheet holding the combined diff
pub const DIFF_SHEET: &str = "Diff View";

/// Labels and layout of a diff workbook
#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub old_label: String,
    pub new_label: String,
    /// Shown in the sheet headers and used to pick the colouring language
    pub file_label: Option<String>,
    /// Add one sheet per side ahead of the diff view
    pub side_by_side: bool,
    pub highlight: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            old_label: "Old Code".to_string(),
            new_label: "New Code".to_string(),
            file_label: None,
            side_by_side: true,
            highlight: true,
        }
    }
}

impl DiffOptions {
    fn header(&self, label: &str) -> String {
        match &self.file_label {
            Some(file) => format!("{} - {}", label, file),
            None => label.to_string(),
        }
    }

    fn language(&self) -> Option<&'static str> {
        let file = self.file_label.as_deref().filter(|_| self.highlight)?;
        Some(crate::domain::detect_language(std::path::Path::new(file)))
    }

    fn check(&self) -> Result<(), EngineError> {
        if !self.side_by_side {
            return Ok(());
        }
        for label in [&self.old_label, &self.new_label] {
            check_sheet_name(label)?;
            if label.eq_ignore_ascii_case(DIFF_SHEET) {
                return Err(EngineError::malformed(format!(
                    "Sheet label '{}' is reserved for the diff view",
                    label
                )));
            }
        }
        if self.old_label.eq_ignore_ascii_case(&self.new_label) {
            return Err(EngineError::malformed("Old and new labels must differ"));
        }
        Ok(())
    }
}

fn check_sheet_name(name: &str) -> Result<(), EngineError> {
    let bad = name.trim().is_empty()
        || name.chars().count() > 31
        || name.contains(['[', ']', ':', '*', '?', '/', '\\']);
    if bad {
        return Err(EngineError::malformed(format!(
            "'{}' cannot be a sheet name: use 1-31 characters without []:*?/\\",
            name
        )));
    }
    Ok(())
}

/// Sanitized, length-checked cell text for each entry
fn cell_texts(entries: Vec<String>) -> Result<Vec<String>, EngineError> {
    let rows = TextBlock::new(MarkerKind::CodeBlock, entries, ItemFormat::Plain).render()?;
    Ok(rows.into_iter().map(|r| r.text).collect())
}

/// Monospace font, fill and grid for one cell
fn paint(sheet: &mut Worksheet, at: (u32, u32), bg: &str, fg: &str, size: f64, bold: bool) {
    let style = sheet.get_style_mut(at);
    font(style, Some(MONOSPACE), size, bold, fg);
    style.set_background_color(bg);
    grid(style);
}

fn add_sheet<'b>(book: &'b mut Spreadsheet, name: &str) -> Result<&'b mut Worksheet, EngineError> {
    book.new_sheet(name)
        .map_err(|e| EngineError::malformed(format!("Cannot add sheet '{}': {}", name, e)))
}

fn lines_of(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Lists one side of the diff on an existing sheet
fn side_sheet(book: &mut Spreadsheet, name: &str, text: &str, opts: &DiffOptions) -> Result<(), EngineError> {
    let sheet = book
        .get_sheet_by_name_mut(name)
        .ok_or_else(|| EngineError::malformed(format!("Sheet '{}' does not exist", name)))?;
    sheet.get_column_dimension_by_number_mut(&1).set_width(8.0);
    sheet.get_column_dimension_by_number_mut(&2).set_width(120.0);

    let header = opts.header(name);
    let lines = lines_of(text);
    let listing = Listing {
        header: &header,
        lines: &lines,
        first_line: 1,
        language: opts.language(),
    };
    write_listing(book, name, 1, &listing)?;
    Ok(())
}

fn diff_sheet(sheet: &mut Worksheet, lines: &[DiffLine], opts: &DiffOptions) -> Result<(), EngineError> {
    for (col, width) in [(1, 8.0), (2, 8.0), (3, 5.0), (4, 120.0)] {
        sheet.get_column_dimension_by_number_mut(&col).set_width(width);
    }
    header_bar(sheet, 1, "D", &opts.header(DIFF_SHEET));

    sheet.get_cell_mut("A2").set_value_string("Legend:");
    let style = sheet.get_style_mut("A2");
    font(style, None, 9.0, true, WHITE);
    style.set_background_color(HEADER_BG);
    for (col, text, bg, fg) in [
        (2, "- Removed", REMOVED_BG, REMOVED_FG),
        (3, "+ Added", ADDED_BG, ADDED_FG),
        (4, "  Unchanged", CODE_BG, CODE_FG),
    ] {
        sheet.get_cell_mut((col, 2)).set_value_string(text);
        let style = sheet.get_style_mut((col, 2));
        font(style, None, 9.0, false, fg);
        style.set_background_color(bg);
    }
    column_headers(sheet, 3, &["Old", "New", "", "Code"]);

    let texts = cell_texts(lines.iter().map(|l| l.content.clone()).collect())?;
    for ((line, text), row) in lines.iter().zip(texts).zip(4u32..) {
        let (bg, fg) = match line.change {
            Change::Added => (ADDED_BG, ADDED_FG),
            Change::Removed => (REMOVED_BG, REMOVED_FG),
            Change::Unchanged => (CODE_BG, CODE_FG),
        };
        for (col, number) in [(1, line.old_line), (2, line.new_line)] {
            if let Some(n) = number {
                sheet.get_cell_mut((col, row)).set_value_number(n);
            }
            paint(sheet, (col, row), bg, LINE_NUMBER_FG, 10.0, false);
        }
        sheet.get_cell_mut((3, row)).set_value_string(line.change.symbol());
        paint(sheet, (3, row), bg, fg, 10.0, true);
        sheet.get_cell_mut((4, row)).set_value_string(text);
        paint(sheet, (4, row), bg, fg, 10.0, false);
    }
    Ok(())
}

/// Builds a workbook comparing two versions of a text.
///
/// With `side_by_side` the old and new texts get a sheet each ahead of the
/// diff view; otherwise the diff view is the only sheet.
pub fn diff_workbook(old: &str, new: &str, opts: &DiffOptions) -> Result<(Spreadsheet, DiffStats), EngineError> {
    opts.check()?;
    let lines = diff_lines(old, new)?;

    let mut book = umya_spreadsheet::new_file();
    if opts.side_by_side {
        book.get_active_sheet_mut().set_name(opts.old_label.as_str());
        side_sheet(&mut book, &opts.old_label, old, opts)?;
        add_sheet(&mut book, &opts.new_label)?;
        side_sheet(&mut book, &opts.new_label, new, opts)?;
        diff_sheet(add_sheet(&mut book, DIFF_SHEET)?, &lines, opts)?;
    } else {
        let sheet = book.get_active_sheet_mut();
        sheet.set_name(DIFF_SHEET);
        diff_sheet(sheet, &lines, opts)?;
    }

    Ok((book, DiffStats::of(&lines)))
}

fn summary_sheet(sheet: &mut Worksheet, summary: &SearchSummary) {
    sheet.set_name("Summary");
    sheet.get_column_dimension_by_number_mut(&1).set_width(20.0);
    sheet.get_column_dimension_by_number_mut(&2).set_width(80.0);

    sheet.get_cell_mut("A1").set_value_string("Search Results");
    let style = sheet.get_style_mut("A1");
    font(style, None, 14.0, true, WHITE);
    style.set_background_color(SUMMARY_BG);
    sheet.add_merge_cells("A1:B1");

    let yes_no = |flag: bool| if flag { "Yes" } else { "No" }.to_string();
    let info = [
        ("Query:", summary.query.clone()),
        ("Regex:", yes_no(summary.regex)),
        ("Folder:", summary.folder.display().to_string()),
        ("Total Matches:", summary.total_matches().to_string()),
        ("Files with Matches:", summary.files_with_matches().to_string()),
        ("Limit Reached:", yes_no(summary.truncated)),
    ];
    for ((label, value), row) in info.iter().zip(3u32..) {
        sheet.get_cell_mut((1, row)).set_value_string(*label);
        sheet.get_style_mut((1, row)).get_font_mut().set_bold(true);
        sheet.get_cell_mut((2, row)).set_value_string(value.as_str());
    }

    let mut row = 3 + info.len() as u32 + 1;
    sheet.get_cell_mut((1, row)).set_value_string("Files:");
    let style = sheet.get_style_mut((1, row));
    style.get_font_mut().set_bold(true);
    style.get_font_mut().set_size(12.0);
    row += 1;

    column_headers(sheet, row, &["File", "Matches"]);
    for file in &summary.results {
        row += 1;
        sheet
            .get_cell_mut((1, row))
            .set_value_string(file.file_path.display().to_string());
        sheet
            .get_cell_mut((2, row))
            .set_value_number(file.matches.len() as u32);
    }
}

fn context_row(sheet: &mut Worksheet, row: u32, number: u32, text: String) {
    paint(sheet, (1, row), CODE_BG, LINE_NUMBER_FG, 9.0, false);
    sheet.get_cell_mut((2, row)).set_value_number(number);
    paint(sheet, (2, row), CODE_BG, LINE_NUMBER_FG, 9.0, false);
    sheet.get_cell_mut((3, row)).set_value_string(text);
    paint(sheet, (3, row), CODE_BG, LINE_NUMBER_FG, 9.0, false);
}

fn matches_sheet(sheet: &mut Worksheet, summary: &SearchSummary, include_context: bool) -> Result<(), EngineError> {
    for (col, width) in [(1, 50.0), (2, 8.0), (3, 100.0)] {
        sheet.get_column_dimension_by_number_mut(&col).set_width(width);
    }
    header_bar(sheet, 1, "C", &format!("Matches for: {}", summary.query));
    column_headers(sheet, 2, &["File", "Line", "Content"]);

    let mut row = 3;
    for file in &summary.results {
        let path = file.file_path.display().to_string();
        for m in &file.matches {
            let before = if include_context { m.context_before.clone() } else { Vec::new() };
            let after = if include_context { m.context_after.clone() } else { Vec::new() };
            let first_before = m.line_number - before.len() as u32;

            for (text, number) in cell_texts(before)?.into_iter().zip(first_before..) {
                context_row(sheet, row, number, text);
                row += 1;
            }

            let line = cell_texts(vec![m.line.clone()])?
                .into_iter()
                .next()
                .unwrap_or_default();
            sheet.get_cell_mut((1, row)).set_value_string(path.as_str());
            paint(sheet, (1, row), MATCH_BG, CODE_FG, 9.0, false);
            sheet.get_cell_mut((2, row)).set_value_number(m.line_number);
            paint(sheet, (2, row), MATCH_BG, MATCH_FG, 10.0, true);
            sheet.get_cell_mut((3, row)).set_value_string(line);
            paint(sheet, (3, row), MATCH_BG, MATCH_FG, 10.0, false);
            row += 1;

            for (text, number) in cell_texts(after)?.into_iter().zip(m.line_number + 1..) {
                context_row(sheet, row, number, text);
                row += 1;
            }
            if include_context {
                row += 1;
            }
        }
    }
    Ok(())
}

/// Builds a workbook with a summary sheet and one row per match
pub fn search_workbook(summary: &SearchSummary, include_context: bool) -> Result<Spreadsheet, EngineError> {
    let mut book = umya_spreadsheet::new_file();
    summary_sheet(book.get_active_sheet_mut(), summary);
    matches_sheet(add_sheet(&mut book, "All Matches")?, summary, include_context)?;
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileMatches, SearchMatch};
    use std::path::PathBuf;

    fn value(sheet: &Worksheet, coord: &str) -> String {
        sheet
            .get_cell(coord)
            .map(|c| c.get_value().to_string())
            .unwrap_or_default()
    }

    fn fill(sheet: &Worksheet, coord: &str) -> String {
        sheet
            .get_style(coord)
            .get_background_color()
            .map(|c| c.get_argb().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn side_by_side_diff_has_three_sheets() {
        let opts = DiffOptions {
            file_label: Some("app.py".to_string()),
            ..DiffOptions::default()
        };
        let (book, stats) = diff_workbook("a = 1\nb = 2\n", "a = 1\nb = 3\nc = 4\n", &opts).unwrap();

        let names: Vec<_> = book
            .get_sheet_collection_no_check()
            .iter()
            .map(|s| s.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["Old Code", "New Code", "Diff View"]);
        assert_eq!(stats, DiffStats { added: 2, removed: 1, unchanged: 1 });

        let old = book.get_sheet_by_name("Old Code").unwrap();
        assert_eq!(value(old, "A1"), "Old Code - app.py");
        assert_eq!(value(old, "A3"), "1");
        assert_eq!(value(old, "B4"), "b = 2");

        let diff = book.get_sheet_by_name("Diff View").unwrap();
        assert_eq!(value(diff, "A1"), "Diff View - app.py");
        assert_eq!(value(diff, "B2"), "- Removed");
        assert_eq!(value(diff, "D3"), "Code");
        assert_eq!(value(diff, "D4"), "a = 1");
        assert_eq!(value(diff, "C5"), "-");
        assert_eq!(value(diff, "A5"), "2");
        assert_eq!(value(diff, "B5"), "");
        assert_eq!(fill(diff, "D5"), REMOVED_BG);
        assert_eq!(value(diff, "C6"), "+");
        assert_eq!(value(diff, "B6"), "2");
        assert_eq!(fill(diff, "D6"), ADDED_BG);
        assert_eq!(value(diff, "D7"), "c = 4");
    }

    #[test]
    fn unified_only_diff_has_one_sheet() {
        let opts = DiffOptions {
            side_by_side: false,
            ..DiffOptions::default()
        };
        let (book, _) = diff_workbook("x", "y", &opts).unwrap();
        assert_eq!(book.get_sheet_collection_no_check().len(), 1);
        assert!(book.get_sheet_by_name(DIFF_SHEET).is_some());
    }

    #[test]
    fn clashing_labels_are_rejected() {
        let same = DiffOptions {
            new_label: "old code".to_string(),
            ..DiffOptions::default()
        };
        assert!(diff_workbook("a", "b", &same).is_err());

        let reserved = DiffOptions {
            old_label: "Diff View".to_string(),
            ..DiffOptions::default()
        };
        assert!(diff_workbook("a", "b", &reserved).is_err());

        let invalid = DiffOptions {
            old_label: "a/b".to_string(),
            ..DiffOptions::default()
        };
        assert!(diff_workbook("a", "b", &invalid).is_err());
    }

    fn summary() -> SearchSummary {
        SearchSummary {
            query: "todo".to_string(),
            regex: false,
            folder: PathBuf::from("src"),
            results: vec![FileMatches {
                file_path: PathBuf::from("src/main.rs"),
                matches: vec![SearchMatch {
                    line_number: 5,
                    line: "// TODO wire up".to_string(),
                    match_start: 3,
                    match_end: 7,
                    context_before: vec!["fn main() {".to_string()],
                    context_after: vec!["}".to_string()],
                }],
            }],
            truncated: false,
        }
    }

    #[test]
    fn search_summary_sheet() {
        let book = search_workbook(&summary(), true).unwrap();
        let sheet = book.get_sheet_by_name("Summary").unwrap();

        assert_eq!(value(sheet, "A1"), "Search Results");
        assert_eq!(value(sheet, "B3"), "todo");
        assert_eq!(value(sheet, "B4"), "No");
        assert_eq!(value(sheet, "B6"), "1");
        assert_eq!(value(sheet, "A10"), "Files:");
        assert_eq!(value(sheet, "A11"), "File");
        assert_eq!(value(sheet, "A12"), "src/main.rs");
        assert_eq!(value(sheet, "B12"), "1");
    }

    #[test]
    fn search_matches_with_and_without_context() {
        let book = search_workbook(&summary(), true).unwrap();
        let sheet = book.get_sheet_by_name("All Matches").unwrap();
        assert_eq!(value(sheet, "A1"), "Matches for: todo");
        assert_eq!(value(sheet, "B3"), "4");
        assert_eq!(value(sheet, "C3"), "fn main() {");
        assert_eq!(fill(sheet, "C3"), CODE_BG);
        assert_eq!(value(sheet, "A4"), "src/main.rs");
        assert_eq!(value(sheet, "B4"), "5");
        assert_eq!(fill(sheet, "C4"), MATCH_BG);
        assert_eq!(value(sheet, "C5"), "}");

        let book = search_workbook(&summary(), false).unwrap();
        let sheet = book.get_sheet_by_name("All Matches").unwrap();
        assert_eq!(value(sheet, "C3"), "// TODO wire up");
        assert_eq!(value(sheet, "C4"), "");
    }
}
