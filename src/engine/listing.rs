//! Built-in listing workbooks
//!
//! Code listings and diagram sheets need no template: the scaffold is laid
//! out here with a seed marker row, and the content is written through the
//! same expander and image anchor used for templates.

use umya_spreadsheet::{
    Border, HorizontalAlignmentValues, Spreadsheet, Style, VerticalAlignmentValues, Worksheet,
};

use super::commit::{expand_at, expand_workbook, CommitReport, ImageSource, TemplateRequest};
use super::EngineError;
use crate::domain::{
    classify_lines, CodeBlock, ImageSize, ItemFormat, MarkerKind, MarkerLocation, TextBlock,
    TokenClass,
};

// Monokai-style palette
pub(super) const CODE_BG: &str = "FF272822";
pub(super) const CODE_FG: &str = "FFF8F8F2";
pub(super) const LINE_NUMBER_FG: &str = "FF75715E";
pub(super) const HEADER_BG: &str = "FF1E1F1C";
pub(super) const COLUMN_HEADER_BG: &str = "FF444444";
const GRID: &str = "FF444444";
pub(super) const WHITE: &str = "FFFFFFFF";
pub(super) const MONOSPACE: &str = "Consolas";

/// Sheet names, title and colouring for generated listings
#[derive(Debug, Clone)]
pub struct ListingOptions {
    pub code_sheet: String,
    pub diagram_sheet: String,
    pub title: String,
    /// Colour each code line by its first token
    pub highlight: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            code_sheet: "Code Blocks".to_string(),
            diagram_sheet: "Sequence Diagram".to_string(),
            title: "Code Documentation".to_string(),
            highlight: true,
        }
    }
}

/// Font colour for a line starting with `class`
pub(super) fn token_color(class: TokenClass) -> &'static str {
    match class {
        TokenClass::Keyword | TokenClass::Operator => "FFF92672",
        TokenClass::Declaration | TokenClass::Type => "FF66D9EF",
        TokenClass::Definition => "FFA6E22E",
        TokenClass::String => "FFE6DB74",
        TokenClass::Comment => LINE_NUMBER_FG,
        TokenClass::Number => "FFAE81FF",
        TokenClass::Plain => CODE_FG,
    }
}

pub(super) fn font(style: &mut Style, name: Option<&str>, size: f64, bold: bool, color: &str) {
    let font = style.get_font_mut();
    if let Some(name) = name {
        font.set_name(name);
    }
    font.set_size(size);
    font.set_bold(bold);
    font.get_color_mut().set_argb(color);
}

fn thin(side: &mut Border) {
    side.set_border_style(Border::BORDER_THIN);
    side.get_color_mut().set_argb(GRID);
}

pub(super) fn grid(style: &mut Style) {
    let borders = style.get_borders_mut();
    thin(borders.get_left_mut());
    thin(borders.get_right_mut());
    thin(borders.get_top_mut());
    thin(borders.get_bottom_mut());
}

pub(super) fn title(sheet: &mut Worksheet, text: &str) {
    sheet.get_cell_mut("A1").set_value_string(text);
    font(sheet.get_style_mut("A1"), None, 14.0, true, "FF000000");
    sheet.add_merge_cells("A1:B1");
}

pub(super) fn label(sheet: &mut Worksheet, coord: &str, text: &str) {
    sheet.get_cell_mut(coord).set_value_string(text);
    sheet.get_style_mut(coord).get_font_mut().set_bold(true);
}

/// Dark header bar across `A{row}` to `{last_col}{row}`
pub(super) fn header_bar(sheet: &mut Worksheet, row: u32, last_col: &str, text: &str) {
    let header = format!("A{}", row);
    sheet.get_cell_mut(header.as_str()).set_value_string(text);
    let style = sheet.get_style_mut(header.as_str());
    font(style, None, 11.0, true, WHITE);
    style.set_background_color(HEADER_BG);
    sheet.add_merge_cells(format!("A{}:{}{}", row, last_col, row));
}

/// Bold white labels on grey, one per column from A
pub(super) fn column_headers(sheet: &mut Worksheet, row: u32, labels: &[&str]) {
    for (col, text) in (1u32..).zip(labels) {
        let cell = sheet.get_cell_mut((col, row));
        cell.set_value_string(*text);
        let style = sheet.get_style_mut((col, row));
        font(style, None, 10.0, true, WHITE);
        style.set_background_color(COLUMN_HEADER_BG);
    }
}

/// Lays out one block's header, column header and seed row starting at
/// `row`; returns the seed row
fn code_scaffold(sheet: &mut Worksheet, row: u32, header_text: &str) -> u32 {
    header_bar(sheet, row, "B", header_text);
    column_headers(sheet, row + 1, &["Line", "Code"]);
    sheet
        .get_style_mut((1, row + 1))
        .get_alignment_mut()
        .set_horizontal(HorizontalAlignmentValues::Center);

    let seed = row + 2;
    let number = format!("A{}", seed);
    let style = sheet.get_style_mut(number.as_str());
    font(style, Some(MONOSPACE), 10.0, false, LINE_NUMBER_FG);
    style.set_background_color(CODE_BG);
    style.get_alignment_mut().set_horizontal(HorizontalAlignmentValues::Right);
    grid(style);

    let code = format!("B{}", seed);
    sheet
        .get_cell_mut(code.as_str())
        .set_value_string(MarkerKind::CodeBlock.sentinel());
    let style = sheet.get_style_mut(code.as_str());
    font(style, Some(MONOSPACE), 10.0, false, CODE_FG);
    style.set_background_color(CODE_BG);
    style.get_alignment_mut().set_horizontal(HorizontalAlignmentValues::Left);
    grid(style);

    seed
}

/// One titled run of numbered lines in columns A and B of a sheet
pub(super) struct Listing<'a> {
    pub header: &'a str,
    pub lines: &'a [String],
    pub first_line: u32,
    /// Language to colour the lines as, if any
    pub language: Option<&'a str>,
}

/// Writes a listing from `row` down; returns the row just past it
pub(super) fn write_listing(
    book: &mut Spreadsheet,
    sheet_name: &str,
    row: u32,
    listing: &Listing<'_>,
) -> Result<u32, EngineError> {
    let sheet = book
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| EngineError::malformed(format!("Sheet '{}' does not exist", sheet_name)))?;
    let seed = code_scaffold(sheet, row, listing.header);

    let at = MarkerLocation::new(sheet_name, 2, seed);
    let block = TextBlock::new(
        MarkerKind::CodeBlock,
        listing.lines.to_vec(),
        ItemFormat::LineNumbered {
            first_line: listing.first_line,
        },
    );
    let next = expand_at(book, &at, &block)?;

    if let Some(language) = listing.language {
        let classes = classify_lines(language, listing.lines);
        if let Some(sheet) = book.get_sheet_by_name_mut(sheet_name) {
            for (line_row, class) in (seed..).zip(classes) {
                if class != TokenClass::Plain {
                    sheet
                        .get_style_mut((2, line_row))
                        .get_font_mut()
                        .get_color_mut()
                        .set_argb(token_color(class));
                }
            }
        }
    }
    Ok(next)
}

/// Builds a workbook whose first sheet lists `blocks` with line numbers
pub fn code_workbook(blocks: &[CodeBlock], opts: &ListingOptions) -> Result<Spreadsheet, EngineError> {
    if blocks.is_empty() {
        return Err(EngineError::malformed("No code blocks to write"));
    }

    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_active_sheet_mut();
    sheet.set_name(opts.code_sheet.as_str());
    sheet.get_column_dimension_by_number_mut(&1).set_width(8.0);
    sheet.get_column_dimension_by_number_mut(&2).set_width(120.0);
    title(sheet, &opts.title);

    let mut row = 3;
    for block in blocks {
        let header = block.title();
        let listing = Listing {
            header: &header,
            lines: &block.lines,
            first_line: block.start_line,
            language: opts.highlight.then_some(block.language),
        };
        row = write_listing(&mut book, &opts.code_sheet, row, &listing)? + 1;
    }

    Ok(book)
}

/// Appends a sheet holding the diagram source and its rendered image
pub fn add_diagram_sheet(
    book: &mut Spreadsheet,
    source: &str,
    image: ImageSource<'_>,
    size: ImageSize,
    opts: &ListingOptions,
) -> Result<CommitReport, EngineError> {
    let sheet = book.new_sheet(opts.diagram_sheet.as_str()).map_err(|e| {
        EngineError::malformed(format!(
            "Cannot add sheet '{}': {}",
            opts.diagram_sheet, e
        ))
    })?;

    sheet.get_column_dimension_by_number_mut(&1).set_width(15.0);
    sheet.get_column_dimension_by_number_mut(&2).set_width(100.0);
    title(sheet, &opts.diagram_sheet);
    label(sheet, "A3", "PlantUML Code:");

    sheet
        .get_cell_mut("A4")
        .set_value_string(MarkerKind::Plantuml.sentinel());
    let style = sheet.get_style_mut("A4");
    font(style, Some(MONOSPACE), 10.0, false, "FF000000");
    style
        .get_alignment_mut()
        .set_vertical(VerticalAlignmentValues::Top);

    label(sheet, "A6", "Generated Diagram:");
    sheet
        .get_cell_mut("A7")
        .set_value_string(MarkerKind::DiagramImage.sentinel());

    let request = TemplateRequest::new()
        .in_sheet(opts.diagram_sheet.as_str())
        .text(TextBlock::plain_lines(MarkerKind::Plantuml, source))
        .image(MarkerKind::DiagramImage, image, size);

    expand_workbook(book, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TINY_PNG;
    use std::path::PathBuf;

    fn block(start: u32, lines: &[&str]) -> CodeBlock {
        CodeBlock {
            file_path: PathBuf::from("src/main.rs"),
            start_line: start,
            end_line: start + lines.len() as u32 - 1,
            lines: lines.iter().map(|s| s.to_string()).collect(),
            language: "rust",
        }
    }

    fn value(sheet: &Worksheet, coord: &str) -> String {
        sheet
            .get_cell(coord)
            .map(|c| c.get_value().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn code_sheet_layout() {
        let book = code_workbook(
            &[block(10, &["fn a() {", "}"]), block(40, &["// marker[code_block]"])],
            &ListingOptions::default(),
        )
        .unwrap();
        let sheet = book.get_sheet_by_name("Code Blocks").unwrap();

        assert_eq!(value(sheet, "A1"), "Code Documentation");
        assert_eq!(value(sheet, "A3"), "src/main.rs (Lines 10-11)");
        assert_eq!(value(sheet, "A4"), "Line");
        assert_eq!(value(sheet, "A5"), "10");
        assert_eq!(value(sheet, "B5"), "fn a() {");
        assert_eq!(value(sheet, "A6"), "11");
        assert_eq!(value(sheet, "B6"), "}");
        assert_eq!(value(sheet, "A7"), "");
        assert_eq!(value(sheet, "A8"), "src/main.rs (Lines 40-40)");
        assert_eq!(value(sheet, "A10"), "40");
        assert_eq!(value(sheet, "B10"), "// marker[code_block]");
        assert_eq!(*sheet.get_column_dimension_by_number(&2).unwrap().get_width(), 120.0);
    }

    #[test]
    fn diagram_sheet_layout() {
        let mut book = code_workbook(&[block(1, &["x"])], &ListingOptions::default()).unwrap();
        add_diagram_sheet(
            &mut book,
            "@startuml\nA -> B\n@enduml",
            ImageSource::Bytes(TINY_PNG.to_vec()),
            ImageSize::new(800, 600),
            &ListingOptions::default(),
        )
        .unwrap();

        let sheet = book.get_sheet_by_name("Sequence Diagram").unwrap();
        assert_eq!(value(sheet, "A3"), "PlantUML Code:");
        assert_eq!(value(sheet, "A4"), "@startuml");
        assert_eq!(value(sheet, "A6"), "@enduml");
        assert_eq!(value(sheet, "A8"), "Generated Diagram:");
        assert_eq!(sheet.get_image_collection()[0].get_coordinate(), "A9");
        assert_eq!(book.get_sheet_collection_no_check().len(), 2);
    }

    fn font_color(sheet: &Worksheet, coord: &str) -> String {
        sheet
            .get_style(coord)
            .get_font()
            .map(|f| f.get_color().get_argb().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn code_lines_are_coloured_by_first_token() {
        let lines = ["// entry", "fn main() {", "    let n = 42;", "    run(n);", "}"];
        let book = code_workbook(&[block(1, &lines)], &ListingOptions::default()).unwrap();
        let sheet = book.get_sheet_by_name("Code Blocks").unwrap();

        assert_eq!(font_color(sheet, "B5"), token_color(TokenClass::Comment));
        assert_eq!(font_color(sheet, "B6"), token_color(TokenClass::Declaration));
        assert_eq!(font_color(sheet, "B7"), token_color(TokenClass::Declaration));
        assert_eq!(font_color(sheet, "B8"), CODE_FG);
        assert_eq!(font_color(sheet, "B9"), CODE_FG);
        assert_eq!(font_color(sheet, "A6"), LINE_NUMBER_FG);
    }

    #[test]
    fn colouring_can_be_switched_off() {
        let opts = ListingOptions {
            highlight: false,
            ..ListingOptions::default()
        };
        let book = code_workbook(&[block(1, &["// entry"])], &opts).unwrap();
        let sheet = book.get_sheet_by_name("Code Blocks").unwrap();
        assert_eq!(font_color(sheet, "B5"), CODE_FG);
    }

    #[test]
    fn empty_listing_is_rejected() {
        assert!(code_workbook(&[], &ListingOptions::default()).is_err());
    }
}
