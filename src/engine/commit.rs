//! Template commit
//!
//! One commit takes one template to one output file:
//!
//! 1. render and validate every text payload
//! 2. locate every marker the request needs
//! 3. plan the row insertions and check sheet capacity
//! 4. render diagrams and sniff image bytes
//! 5. snapshot styles at the original marker rows
//! 6. insert rows (descending), write text, anchor images
//! 7. write the output through a temp file and rename it into place
//!
//! Steps 1-5 never touch the workbook, so any failure there leaves no
//! trace on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::expander::{clear_marker, write_block};
use super::image::ImageAnchor;
use super::locator::{sheet_names, MarkerLocator};
use super::references::shift_foreign_references;
use super::style::StyleSnapshot;
use super::EngineError;
use crate::domain::{
    CellRef, ImagePayload, ImageSize, InsertionPlan, ItemFormat, MarkerKind, MarkerLocation,
    PayloadError, RenderedRow, RowInsertion, TextBlock,
};
use crate::render::{DiagramFormat, DiagramRenderer};

/// Where image bytes come from
pub enum ImageSource<'r> {
    /// Bytes already in hand
    Bytes(Vec<u8>),

    /// Diagram source rendered as PNG during the commit
    Diagram {
        renderer: &'r dyn DiagramRenderer,
        source: String,
    },
}

impl ImageSource<'_> {
    fn resolve(self, size: ImageSize) -> Result<ImagePayload, EngineError> {
        match self {
            ImageSource::Bytes(bytes) => Ok(ImagePayload::new(bytes, size)?),
            ImageSource::Diagram { renderer, source } => {
                let bytes = renderer.render(&source, DiagramFormat::Png)?;
                ImagePayload::new(bytes, size).map_err(|e| match e {
                    PayloadError::NotAnImage => EngineError::NotAnImage {
                        endpoint: renderer.endpoint().to_string(),
                    },
                    other => other.into(),
                })
            }
        }
    }
}

/// An image bound to an image marker
pub struct ImageRequest<'r> {
    pub kind: MarkerKind,
    pub source: ImageSource<'r>,
    pub size: ImageSize,
}

/// Everything one commit writes into a template
#[derive(Default)]
pub struct TemplateRequest<'r> {
    pub texts: Vec<TextBlock>,
    pub images: Vec<ImageRequest<'r>>,

    /// Restrict marker lookup to one sheet
    pub sheet: Option<String>,
}

impl<'r> TemplateRequest<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, block: TextBlock) -> Self {
        self.texts.push(block);
        self
    }

    pub fn image(mut self, kind: MarkerKind, source: ImageSource<'r>, size: ImageSize) -> Self {
        self.images.push(ImageRequest { kind, source, size });
        self
    }

    pub fn in_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Marker kinds this request needs, in request order
    pub fn kinds(&self) -> Vec<MarkerKind> {
        self.texts
            .iter()
            .map(|b| b.kind)
            .chain(self.images.iter().map(|i| i.kind))
            .collect()
    }
}

/// Where each marker's content ended up
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommitReport {
    pub markers: BTreeMap<MarkerKind, MarkerLocation>,
    pub rows_inserted: u64,
    pub images: usize,
}

/// Expands a request into an open workbook.
///
/// Fails before the first mutation if any marker is missing, any payload
/// is malformed, the plan overflows a sheet, or a diagram cannot be
/// rendered.
pub fn expand_workbook(
    book: &mut Spreadsheet,
    request: TemplateRequest<'_>,
) -> Result<CommitReport, EngineError> {
    for block in &request.texts {
        if block.kind.is_image() {
            return Err(EngineError::malformed(format!(
                "Marker '{}' takes an image, not text",
                block.kind.sentinel()
            )));
        }
    }
    for image in &request.images {
        if !image.kind.is_image() {
            return Err(EngineError::malformed(format!(
                "Marker '{}' takes text, not an image",
                image.kind.sentinel()
            )));
        }
    }

    let kinds = request.kinds();
    for (i, kind) in kinds.iter().enumerate() {
        if kinds[..i].contains(kind) {
            return Err(EngineError::malformed(format!(
                "Marker '{}' is requested twice",
                kind.sentinel()
            )));
        }
    }

    let rendered: Vec<(MarkerKind, Vec<RenderedRow>)> = request
        .texts
        .iter()
        .map(|block| Ok((block.kind, block.render()?)))
        .collect::<Result<_, EngineError>>()?;

    let located = {
        let locator = match request.sheet.as_deref() {
            Some(name) => MarkerLocator::within_sheet(book, name)?,
            None => MarkerLocator::new(book),
        };
        locator.locate_all(&kinds)?
    };
    let at = |kind: MarkerKind| -> Result<&MarkerLocation, EngineError> {
        located.get(&kind).ok_or_else(|| EngineError::MarkerNotFound {
            kind,
            scope: "workbook".to_string(),
        })
    };

    for block in &request.texts {
        if matches!(block.format, ItemFormat::LineNumbered { .. }) && at(block.kind)?.col < 2 {
            return Err(EngineError::malformed(format!(
                "Marker '{}' needs a free column on its left for line numbers",
                block.kind.sentinel()
            )));
        }
    }

    let mut blocks: Vec<(&MarkerLocation, usize)> = Vec::new();
    for (kind, rows) in &rendered {
        blocks.push((at(*kind)?, rows.len()));
    }
    let plan = InsertionPlan::build(blocks.iter().copied());
    for name in plan.sheets() {
        let highest = sheet(book, name)?.get_highest_row();
        plan.check_capacity(name, highest)?;
    }
    debug!(insertions = plan.insertions().len(), "insertion plan built");

    let mut images: Vec<(MarkerKind, ImagePayload)> = Vec::new();
    for req in request.images {
        images.push((req.kind, req.source.resolve(req.size)?));
    }

    let mut snapshots: BTreeMap<MarkerKind, StyleSnapshot> = BTreeMap::new();
    for (kind, _) in &rendered {
        let loc = at(*kind)?;
        snapshots.insert(*kind, StyleSnapshot::at_marker(sheet(book, &loc.sheet)?, loc));
    }

    // Nothing below can fail on input; from here on the workbook is mutated.
    for ins in plan.insertions() {
        insert_rows(book, ins)?;
    }

    let mut report = CommitReport {
        rows_inserted: plan.insertions().iter().map(|i| i.count as u64).sum(),
        ..Default::default()
    };

    for (kind, rows) in &rendered {
        let target = plan.relocate(at(*kind)?);
        if let Some(snapshot) = snapshots.get(kind) {
            write_block(sheet_mut(book, &target.sheet)?, &target, rows, snapshot);
        }
        report.markers.insert(*kind, target);
    }

    for (kind, payload) in &images {
        let target = plan.relocate(at(*kind)?);
        let ws = sheet_mut(book, &target.sheet)?;
        clear_marker(ws, &target);
        ImageAnchor::new(&target.sheet, target.cell(), payload.size()).attach(ws, payload);
        report.markers.insert(*kind, target);
        report.images += 1;
    }

    Ok(report)
}

/// Expands one block at a known location, without scanning for markers.
///
/// Returns the row just past the written block.
pub fn expand_at(
    book: &mut Spreadsheet,
    at: &MarkerLocation,
    block: &TextBlock,
) -> Result<u32, EngineError> {
    let rows = block.render()?;
    if matches!(block.format, ItemFormat::LineNumbered { .. }) && at.col < 2 {
        return Err(EngineError::malformed(
            "Line-numbered blocks need a free column on the left",
        ));
    }

    let plan = InsertionPlan::build([(at, rows.len())]);
    plan.check_capacity(&at.sheet, sheet(book, &at.sheet)?.get_highest_row())?;
    let snapshot = StyleSnapshot::at_marker(sheet(book, &at.sheet)?, at);

    for ins in plan.insertions() {
        insert_rows(book, ins)?;
    }
    write_block(sheet_mut(book, &at.sheet)?, at, &rows, &snapshot);

    Ok(at.row + rows.len().max(1) as u32)
}

/// Places an image at an explicit cell, with no marker lookup.
///
/// `sheet` defaults to the active sheet.
pub fn place_image(
    book: &mut Spreadsheet,
    sheet_name: Option<&str>,
    cell: CellRef,
    source: ImageSource<'_>,
    size: ImageSize,
) -> Result<ImageAnchor, EngineError> {
    size.validate()?;
    let name = match sheet_name {
        Some(name) => {
            if book.get_sheet_by_name(name).is_none() {
                return Err(EngineError::malformed(format!(
                    "Sheet '{}' does not exist (sheets: {})",
                    name,
                    sheet_names(book).join(", ")
                )));
            }
            name.to_string()
        }
        None => book.get_active_sheet().get_name().to_string(),
    };

    let payload = source.resolve(size)?;
    let anchor = ImageAnchor::new(name, cell, size);
    anchor.attach(sheet_mut(book, &anchor.sheet)?, &payload);
    Ok(anchor)
}

/// Inserts one run of rows and shifts references to them from other sheets
fn insert_rows(book: &mut Spreadsheet, ins: &RowInsertion) -> Result<(), EngineError> {
    sheet_mut(book, &ins.sheet)?.insert_new_row(&ins.position, &ins.count);
    shift_foreign_references(book, &ins.sheet, ins.position, ins.count);
    Ok(())
}

fn sheet<'b>(book: &'b Spreadsheet, name: &str) -> Result<&'b Worksheet, EngineError> {
    book.get_sheet_by_name(name)
        .ok_or_else(|| EngineError::malformed(format!("Sheet '{}' does not exist", name)))
}

fn sheet_mut<'b>(book: &'b mut Spreadsheet, name: &str) -> Result<&'b mut Worksheet, EngineError> {
    book.get_sheet_by_name_mut(name)
        .ok_or_else(|| EngineError::malformed(format!("Sheet '{}' does not exist", name)))
}

/// Reads a workbook fully into memory
pub fn open_workbook(path: &Path) -> Result<Spreadsheet, EngineError> {
    if !path.is_file() {
        return Err(EngineError::Workbook {
            path: path.to_path_buf(),
            message: "file not found".to_string(),
        });
    }
    umya_spreadsheet::reader::xlsx::read(path).map_err(|e| EngineError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Temp sibling used while writing `path`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<(), EngineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EngineError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn rename_into_place(temp: &Path, path: &Path) -> Result<(), EngineError> {
    fs::rename(temp, path).map_err(|source| {
        let _ = fs::remove_file(temp);
        EngineError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Serializes a workbook to `path` via a temp file and rename
pub fn save_atomically(book: &Spreadsheet, path: &Path) -> Result<(), EngineError> {
    ensure_parent(path)?;
    let temp = temp_path(path);

    if let Err(e) = umya_spreadsheet::writer::xlsx::write(book, &temp) {
        let _ = fs::remove_file(&temp);
        return Err(EngineError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        });
    }

    rename_into_place(&temp, path)
}

/// Writes raw bytes to `path` via a temp file and rename
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), EngineError> {
    ensure_parent(path)?;
    let temp = temp_path(path);

    if let Err(source) = fs::write(&temp, bytes) {
        let _ = fs::remove_file(&temp);
        return Err(EngineError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    rename_into_place(&temp, path)
}

/// Best-effort check that two paths name the same file
fn same_file(a: &Path, b: &Path) -> bool {
    fn normalize(p: &Path) -> PathBuf {
        if let Ok(canonical) = p.canonicalize() {
            return canonical;
        }
        match (p.parent(), p.file_name()) {
            (Some(parent), Some(name)) => parent
                .canonicalize()
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| p.to_path_buf()),
            _ => p.to_path_buf(),
        }
    }
    normalize(a) == normalize(b)
}

/// Fails when `output` names the same file as `input`, which is described
/// as `what` in the error
pub fn ensure_distinct(input: &Path, output: &Path, what: &str) -> Result<(), EngineError> {
    if same_file(input, output) {
        return Err(EngineError::malformed(format!(
            "Output path {} is the {} itself; choose a different output",
            output.display(),
            what
        )));
    }
    Ok(())
}

/// A template-to-output commit
pub struct TemplateCommit {
    template: PathBuf,
    output: PathBuf,
}

impl TemplateCommit {
    /// Fails if the output would overwrite the template
    pub fn new(template: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let template = template.into();
        let output = output.into();

        ensure_distinct(&template, &output, "template")?;
        Ok(Self { template, output })
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Expands the request into a copy of the template and saves it
    pub fn run(&self, request: TemplateRequest<'_>) -> Result<CommitReport, EngineError> {
        let mut book = open_workbook(&self.template)?;
        let report = expand_workbook(&mut book, request)?;
        save_atomically(&book, &self.output)?;

        info!(
            template = %self.template.display(),
            output = %self.output.display(),
            rows_inserted = report.rows_inserted,
            "template committed"
        );
        Ok(report)
    }

    /// Places an image at a cell of a copy of the template and saves it
    pub fn place(
        &self,
        sheet: Option<&str>,
        cell: CellRef,
        source: ImageSource<'_>,
        size: ImageSize,
    ) -> Result<ImageAnchor, EngineError> {
        let mut book = open_workbook(&self.template)?;
        let anchor = place_image(&mut book, sheet, cell, source, size)?;
        save_atomically(&book, &self.output)?;

        info!(output = %self.output.display(), cell = %anchor.cell, "image committed");
        Ok(anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TINY_PNG;
    use crate::render::RenderError;
    use tempfile::TempDir;

    struct StubRenderer;

    impl DiagramRenderer for StubRenderer {
        fn render(&self, _source: &str, _format: DiagramFormat) -> Result<Vec<u8>, RenderError> {
            Ok(TINY_PNG.to_vec())
        }

        fn endpoint(&self) -> &str {
            "stub"
        }
    }

    struct HtmlRenderer;

    impl DiagramRenderer for HtmlRenderer {
        fn render(&self, _source: &str, _format: DiagramFormat) -> Result<Vec<u8>, RenderError> {
            Ok(b"<html>error page</html>".to_vec())
        }

        fn endpoint(&self) -> &str {
            "html"
        }
    }

    fn value(book: &Spreadsheet, sheet: &str, coord: &str) -> String {
        book.get_sheet_by_name(sheet)
            .and_then(|s| s.get_cell(coord))
            .map(|c| c.get_value().to_string())
            .unwrap_or_default()
    }

    fn task_book() -> Spreadsheet {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut("A1").set_value_string("Main tasks");
        sheet.get_cell_mut("A2").set_value_string("marker[main_task]");
        sheet.get_cell_mut("A4").set_value_string("Support tasks");
        sheet.get_cell_mut("A5").set_value_string("marker[support_task]");
        sheet.get_cell_mut("A7").set_value_string("Footer");
        book
    }

    fn tasks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn expands_two_lists_without_overlap() {
        let mut book = task_book();
        let request = TemplateRequest::new()
            .text(TextBlock::numbered(MarkerKind::MainTask, tasks(&["a", "b", "c"])))
            .text(TextBlock::numbered(MarkerKind::SupportTask, tasks(&["x", "y"])));

        let report = expand_workbook(&mut book, request).unwrap();

        assert_eq!(value(&book, "Sheet1", "A2"), "1. a");
        assert_eq!(value(&book, "Sheet1", "A4"), "3. c");
        assert_eq!(value(&book, "Sheet1", "A6"), "Support tasks");
        assert_eq!(value(&book, "Sheet1", "A7"), "1. x");
        assert_eq!(value(&book, "Sheet1", "A8"), "2. y");
        assert_eq!(value(&book, "Sheet1", "A10"), "Footer");
        assert_eq!(report.rows_inserted, 3);
        assert_eq!(report.markers[&MarkerKind::SupportTask].row, 7);
    }

    #[test]
    fn request_order_does_not_change_layout() {
        let mut forward = task_book();
        let mut backward = task_book();

        expand_workbook(
            &mut forward,
            TemplateRequest::new()
                .text(TextBlock::numbered(MarkerKind::MainTask, tasks(&["a", "b"])))
                .text(TextBlock::numbered(MarkerKind::SupportTask, tasks(&["x", "y", "z"]))),
        )
        .unwrap();
        expand_workbook(
            &mut backward,
            TemplateRequest::new()
                .text(TextBlock::numbered(MarkerKind::SupportTask, tasks(&["x", "y", "z"])))
                .text(TextBlock::numbered(MarkerKind::MainTask, tasks(&["a", "b"]))),
        )
        .unwrap();

        for row in 1..=12 {
            let coord = format!("A{}", row);
            assert_eq!(
                value(&forward, "Sheet1", &coord),
                value(&backward, "Sheet1", &coord)
            );
        }
    }

    #[test]
    fn missing_marker_leaves_workbook_untouched() {
        let mut book = umya_spreadsheet::new_file();
        book.get_sheet_by_name_mut("Sheet1")
            .unwrap()
            .get_cell_mut("A2")
            .set_value_string("marker[main_task]");

        let err = expand_workbook(
            &mut book,
            TemplateRequest::new()
                .text(TextBlock::numbered(MarkerKind::MainTask, tasks(&["a", "b"])))
                .text(TextBlock::numbered(MarkerKind::SupportTask, tasks(&["x"]))),
        )
        .unwrap_err();

        assert_eq!(err.kind(), "marker_not_found");
        assert_eq!(value(&book, "Sheet1", "A2"), "marker[main_task]");
    }

    #[test]
    fn image_marker_is_cleared_and_anchored() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut("A2").set_value_string("marker[plantuml]");
        sheet.get_cell_mut("C3").set_value_string("marker[plantuml_image]");

        let renderer = StubRenderer;
        let request = TemplateRequest::new()
            .text(TextBlock::plain_lines(MarkerKind::Plantuml, "@startuml\nA -> B\n@enduml"))
            .image(
                MarkerKind::PlantumlImage,
                ImageSource::Diagram {
                    renderer: &renderer,
                    source: "A -> B".to_string(),
                },
                ImageSize::new(400, 300),
            );
        expand_workbook(&mut book, request).unwrap();

        let sheet = book.get_sheet_by_name("Sheet1").unwrap();
        assert_eq!(value(&book, "Sheet1", "A4"), "@enduml");
        assert_eq!(value(&book, "Sheet1", "C5"), "");
        assert_eq!(sheet.get_image_collection().len(), 1);
        assert_eq!(sheet.get_image_collection()[0].get_coordinate(), "C5");
    }

    #[test]
    fn non_image_response_is_a_render_failure() {
        let mut book = umya_spreadsheet::new_file();
        book.get_sheet_by_name_mut("Sheet1")
            .unwrap()
            .get_cell_mut("B2")
            .set_value_string("marker[plantuml_image]");

        let renderer = HtmlRenderer;
        let err = expand_workbook(
            &mut book,
            TemplateRequest::new().image(
                MarkerKind::PlantumlImage,
                ImageSource::Diagram {
                    renderer: &renderer,
                    source: "A -> B".to_string(),
                },
                ImageSize::new(10, 10),
            ),
        )
        .unwrap_err();

        assert_eq!(err.kind(), "render_failure");
        assert_eq!(value(&book, "Sheet1", "B2"), "marker[plantuml_image]");
    }

    #[test]
    fn references_from_other_sheets_follow_inserted_rows() {
        let mut book = umya_spreadsheet::new_file();
        {
            let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
            sheet.get_cell_mut("A2").set_value_string("marker[main_task]");
            sheet.get_cell_mut("A5").set_value_number(42);
            sheet.get_cell_mut("B1").set_formula("A5");
        }
        book.new_sheet("Summary").unwrap();
        {
            let summary = book.get_sheet_by_name_mut("Summary").unwrap();
            summary.get_cell_mut("A1").set_formula("Sheet1!A5");
            summary.get_cell_mut("A5").set_value_string("unrelated");
        }

        expand_workbook(
            &mut book,
            TemplateRequest::new().text(TextBlock::numbered(MarkerKind::MainTask, tasks(&["a", "b", "c"]))),
        )
        .unwrap();

        let sheet1 = book.get_sheet_by_name("Sheet1").unwrap();
        assert_eq!(value(&book, "Sheet1", "A7"), "42");
        assert_eq!(sheet1.get_cell("B1").unwrap().get_formula(), "A7");

        let summary = book.get_sheet_by_name("Summary").unwrap();
        assert_eq!(summary.get_cell("A1").unwrap().get_formula(), "Sheet1!A7");
        assert_eq!(value(&book, "Summary", "A5"), "unrelated");
    }

    #[test]
    fn line_numbers_need_a_column_on_the_left() {
        let mut book = umya_spreadsheet::new_file();
        book.get_sheet_by_name_mut("Sheet1")
            .unwrap()
            .get_cell_mut("A1")
            .set_value_string("marker[code_block]");

        let err = expand_workbook(
            &mut book,
            TemplateRequest::new().text(TextBlock::new(
                MarkerKind::CodeBlock,
                tasks(&["fn main() {}"]),
                ItemFormat::LineNumbered { first_line: 1 },
            )),
        )
        .unwrap_err();

        assert_eq!(err.kind(), "malformed_request");
    }

    #[test]
    fn payload_must_match_the_marker_kind() {
        let mut book = task_book();
        let err = expand_workbook(
            &mut book,
            TemplateRequest::new().image(
                MarkerKind::MainTask,
                ImageSource::Bytes(TINY_PNG.to_vec()),
                ImageSize::new(10, 10),
            ),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "malformed_request");
        assert!(err.to_string().contains("takes text"));

        let err = expand_workbook(
            &mut book,
            TemplateRequest::new().text(TextBlock::numbered(MarkerKind::DiagramImage, tasks(&["a"]))),
        )
        .unwrap_err();
        assert!(err.to_string().contains("takes an image"));
        assert_eq!(value(&book, "Sheet1", "A2"), "marker[main_task]");
    }

    #[test]
    fn requesting_a_kind_twice_is_malformed() {
        let mut book = task_book();
        let err = expand_workbook(
            &mut book,
            TemplateRequest::new()
                .text(TextBlock::numbered(MarkerKind::MainTask, tasks(&["a"])))
                .text(TextBlock::numbered(MarkerKind::MainTask, tasks(&["b"]))),
        )
        .unwrap_err();

        assert_eq!(err.kind(), "malformed_request");
    }

    #[test]
    fn place_image_defaults_to_active_sheet() {
        let mut book = umya_spreadsheet::new_file();
        let anchor = place_image(
            &mut book,
            None,
            "B2".parse().unwrap(),
            ImageSource::Bytes(TINY_PNG.to_vec()),
            ImageSize::new(50, 50),
        )
        .unwrap();

        assert_eq!(anchor.sheet, "Sheet1");
        assert_eq!(book.get_sheet_by_name("Sheet1").unwrap().get_image_collection().len(), 1);

        let err = place_image(
            &mut book,
            Some("Nope"),
            "B2".parse().unwrap(),
            ImageSource::Bytes(TINY_PNG.to_vec()),
            ImageSize::new(50, 50),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "malformed_request");
    }

    #[test]
    fn commit_refuses_to_overwrite_template() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("t.xlsx");
        save_atomically(&task_book(), &template).unwrap();

        let err = TemplateCommit::new(&template, dir.path().join(".").join("t.xlsx")).err();
        assert!(matches!(err, Some(EngineError::Malformed(_))));
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("out.xlsx");
        save_atomically(&task_book(), &out).unwrap();

        assert!(out.is_file());
        assert!(!dir.path().join("nested").join("out.xlsx.tmp").exists());
    }

    #[test]
    fn write_atomically_writes_bytes() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("diagram.png");
        write_atomically(&out, TINY_PNG).unwrap();

        assert_eq!(fs::read(&out).unwrap(), TINY_PNG);
    }
}
