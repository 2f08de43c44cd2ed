//! Operation implementations
//!
//! Each operation resolves defaults from the [`Config`], validates its
//! parameters, and hands off to the engine. The CLI subcommands and the
//! `serve` loop both end up here.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::manifest::render_prompt;
use super::params::{
    CaptureCode, FormatDiff, GeneratePlantumlPng, GetPrompt, ListSymbols, SearchInFolder,
    WriteCodeAndDiagramToExcel, WriteCodeToExcel, WriteDiffToExcel, WritePlantumlImage,
    WritePlantumlToExcel, WriteSearchToExcel, WriteTaskList,
};
use super::protocol::{PromptMessage, ToolRequest, ToolResponse};
use super::ToolError;
use crate::domain::{
    capture_selection, diff_lines, format_markdown, format_unified, list_symbols, search_folder,
    CellRef, DiffStats, ImageFormat, ImageSize, MarkerKind, SearchSummary, Symbol, TextBlock,
};
use crate::engine::{
    add_diagram_sheet, code_workbook, diff_workbook, ensure_distinct, save_atomically,
    search_workbook, write_atomically, CommitReport, DiffOptions, EngineError, ImageSource,
    TemplateCommit, TemplateRequest,
};
use crate::render::{DiagramFormat, DiagramRenderer, PlantUmlServer};
use crate::storage::Config;

/// Operation names, in manifest order
pub const OPERATIONS: &[&str] = &[
    "write_task_list",
    "write_plantuml_to_excel",
    "write_plantuml_image",
    "generate_plantuml_png",
    "write_code_to_excel",
    "write_code_and_diagram_to_excel",
    "capture_code",
    "list_symbols",
    "write_diff_to_excel",
    "format_diff",
    "search_in_folder",
    "write_search_to_excel",
];

/// Result of an operation that writes a file
#[derive(Debug, Clone, Serialize)]
pub struct FileWritten {
    pub path: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CommitReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffStats>,

    /// Matching lines written by a search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<usize>,
}

impl FileWritten {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            report: None,
            bytes: None,
            diff: None,
            matches: None,
        }
    }
}

/// Result of `capture_code`
#[derive(Debug, Clone, Serialize)]
pub struct CapturedCode {
    pub markdown: String,
    pub blocks: usize,
}

/// Result of `format_diff`
#[derive(Debug, Clone, Serialize)]
pub struct DiffText {
    pub diff: String,
    pub stats: DiffStats,
}

/// Shared state for running operations
pub struct ToolContext<'a> {
    config: Config,
    renderer: Option<&'a dyn DiagramRenderer>,
}

impl<'a> ToolContext<'a> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            renderer: None,
        }
    }

    /// Uses `renderer` for every diagram instead of contacting a server
    #[cfg(test)]
    pub(crate) fn with_renderer(mut self, renderer: &'a dyn DiagramRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn renderer(&self, server_url: Option<&str>) -> Result<Box<dyn DiagramRenderer + 'a>, ToolError> {
        if let Some(renderer) = self.renderer {
            return Ok(Box::new(renderer));
        }
        let url = server_url.unwrap_or(self.config.server_url());
        Ok(Box::new(PlantUmlServer::new(url, self.config.timeout())?))
    }

    fn image_size(&self, width: Option<u32>, height: Option<u32>) -> ImageSize {
        ImageSize::resolve(width, height, self.config.image_size())
    }
}

fn require_code(puml_code: &str) -> Result<(), ToolError> {
    if puml_code.trim().is_empty() {
        return Err(EngineError::malformed("puml_code must not be empty").into());
    }
    Ok(())
}

/// Fills the main and support task markers of a template
pub fn write_task_list(ctx: &ToolContext, params: WriteTaskList) -> Result<FileWritten, ToolError> {
    let template = ctx.config.template(params.template_path.as_deref());
    let output = ctx.config.output(params.output_path.as_deref(), "tasks.xlsx");

    let request = TemplateRequest::new()
        .text(TextBlock::numbered(MarkerKind::MainTask, params.main_tasks))
        .text(TextBlock::numbered(MarkerKind::SupportTask, params.support_tasks));

    let report = TemplateCommit::new(template, &output)?.run(request)?;
    info!(output = %output.display(), "task list written");

    Ok(FileWritten {
        report: Some(report),
        ..FileWritten::new(output)
    })
}

/// Writes diagram source and its rendered image into template markers
pub fn write_plantuml_to_excel(
    ctx: &ToolContext,
    params: WritePlantumlToExcel,
) -> Result<FileWritten, ToolError> {
    require_code(&params.puml_code)?;
    let template = ctx.config.template(params.template_path.as_deref());
    let output = ctx.config.output(params.output_path.as_deref(), "plantuml.xlsx");
    let commit = TemplateCommit::new(template, &output)?;

    let renderer = ctx.renderer(params.server_url.as_deref())?;
    let size = ctx.image_size(params.image_width, params.image_height);
    let request = TemplateRequest::new()
        .text(TextBlock::plain_lines(MarkerKind::Plantuml, &params.puml_code))
        .image(
            MarkerKind::PlantumlImage,
            ImageSource::Diagram {
                renderer: renderer.as_ref(),
                source: params.puml_code.clone(),
            },
            size,
        );

    let report = commit.run(request)?;
    info!(output = %output.display(), "diagram written to template");

    Ok(FileWritten {
        report: Some(report),
        ..FileWritten::new(output)
    })
}

/// Default output for `write_plantuml_image`: `<output_dir>/<stem>_diagram.xlsx`
fn diagram_copy_name(excel_path: &Path) -> String {
    let stem = excel_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    format!("{}_diagram.xlsx", stem)
}

/// Places a rendered diagram at a cell of an existing workbook
pub fn write_plantuml_image(
    ctx: &ToolContext,
    params: WritePlantumlImage,
) -> Result<FileWritten, ToolError> {
    require_code(&params.puml_code)?;
    let output = ctx.config.output(
        params.output_path.as_deref(),
        &diagram_copy_name(&params.excel_path),
    );
    let cell: CellRef = params
        .cell_anchor
        .as_deref()
        .unwrap_or("A1")
        .parse()
        .map_err(EngineError::from)?;
    let commit = TemplateCommit::new(&params.excel_path, &output)?;

    let renderer = ctx.renderer(params.server_url.as_deref())?;
    let size = ctx.image_size(params.image_width, params.image_height);
    let anchor = commit.place(
        params.sheet_name.as_deref(),
        cell,
        ImageSource::Diagram {
            renderer: renderer.as_ref(),
            source: params.puml_code.clone(),
        },
        size,
    )?;
    info!(output = %output.display(), sheet = %anchor.sheet, cell = %anchor.cell, "diagram placed");

    Ok(FileWritten::new(output))
}

/// Renders a diagram straight to a file
pub fn generate_plantuml_png(
    ctx: &ToolContext,
    params: GeneratePlantumlPng,
) -> Result<FileWritten, ToolError> {
    require_code(&params.puml_code)?;
    let output = ctx.config.output(
        params.output_path.as_deref(),
        &format!("diagram.{}", params.format),
    );

    let renderer = ctx.renderer(params.server_url.as_deref())?;
    let bytes = renderer
        .render(&params.puml_code, params.format)
        .map_err(EngineError::from)?;

    if params.format == DiagramFormat::Png && ImageFormat::detect(&bytes) != Some(ImageFormat::Png) {
        return Err(EngineError::NotAnImage {
            endpoint: renderer.endpoint().to_string(),
        }
        .into());
    }

    write_atomically(&output, &bytes)?;
    info!(output = %output.display(), bytes = bytes.len(), "diagram rendered");

    Ok(FileWritten {
        bytes: Some(bytes.len()),
        ..FileWritten::new(output)
    })
}

/// Lists captured line ranges in a new workbook
pub fn write_code_to_excel(
    ctx: &ToolContext,
    params: WriteCodeToExcel,
) -> Result<FileWritten, ToolError> {
    let output = ctx.config.output(params.output_path.as_deref(), "code.xlsx");
    ensure_distinct(&params.file_path, &output, "source file")?;
    let blocks = capture_selection(&params.file_path, &params.ranges, &params.names)
        .map_err(EngineError::from)?;

    let opts = ctx.config.settings.listing.options(params.title.as_deref());
    let book = code_workbook(&blocks, &opts)?;
    save_atomically(&book, &output)?;
    info!(output = %output.display(), blocks = blocks.len(), "code listing written");

    Ok(FileWritten::new(output))
}

/// Lists captured line ranges on one sheet and a rendered diagram on another
pub fn write_code_and_diagram_to_excel(
    ctx: &ToolContext,
    params: WriteCodeAndDiagramToExcel,
) -> Result<FileWritten, ToolError> {
    require_code(&params.puml_code)?;
    let output = ctx
        .config
        .output(params.output_path.as_deref(), "code_and_diagram.xlsx");
    ensure_distinct(&params.file_path, &output, "source file")?;
    let blocks = capture_selection(&params.file_path, &params.ranges, &params.names)
        .map_err(EngineError::from)?;

    let opts = ctx.config.settings.listing.options(params.title.as_deref());
    let mut book = code_workbook(&blocks, &opts)?;

    let renderer = ctx.renderer(params.server_url.as_deref())?;
    let report = add_diagram_sheet(
        &mut book,
        &params.puml_code,
        ImageSource::Diagram {
            renderer: renderer.as_ref(),
            source: params.puml_code.clone(),
        },
        ctx.image_size(None, None),
        &opts,
    )?;

    save_atomically(&book, &output)?;
    info!(output = %output.display(), blocks = blocks.len(), "code and diagram written");

    Ok(FileWritten {
        report: Some(report),
        ..FileWritten::new(output)
    })
}

/// Captures line ranges as markdown with numbered lines
pub fn capture_code(ctx: &ToolContext, params: CaptureCode) -> Result<CapturedCode, ToolError> {
    let blocks = capture_selection(&params.file_path, &params.ranges, &params.names)
        .map_err(EngineError::from)?;
    let title = params
        .title
        .as_deref()
        .unwrap_or(&ctx.config.settings.listing.title);

    Ok(CapturedCode {
        markdown: format_markdown(&blocks, title),
        blocks: blocks.len(),
    })
}

/// Functions and classes of a source file, in source order
pub fn list_file_symbols(_ctx: &ToolContext, params: ListSymbols) -> Result<Vec<Symbol>, ToolError> {
    list_symbols(&params.file_path).map_err(|e| EngineError::from(e).into())
}

/// Writes old and new code and their line diff to a new workbook
pub fn write_diff_to_excel(
    ctx: &ToolContext,
    params: WriteDiffToExcel,
) -> Result<FileWritten, ToolError> {
    let output = ctx.config.output(params.output_path.as_deref(), "diff.xlsx");
    let defaults = DiffOptions::default();
    let opts = DiffOptions {
        old_label: params.old_label.unwrap_or(defaults.old_label),
        new_label: params.new_label.unwrap_or(defaults.new_label),
        file_label: params.file_path,
        side_by_side: params.side_by_side,
        highlight: ctx.config.settings.listing.syntax_colors,
    };

    let (book, stats) = diff_workbook(&params.old_code, &params.new_code, &opts)?;
    save_atomically(&book, &output)?;
    info!(output = %output.display(), added = stats.added, removed = stats.removed, "diff written");

    Ok(FileWritten {
        diff: Some(stats),
        ..FileWritten::new(output)
    })
}

/// Renders a line diff as unified text
pub fn format_diff(_ctx: &ToolContext, params: FormatDiff) -> Result<DiffText, ToolError> {
    let lines = diff_lines(&params.old_code, &params.new_code).map_err(EngineError::from)?;
    Ok(DiffText {
        diff: format_unified(&lines, "old", "new", params.context_lines),
        stats: DiffStats::of(&lines),
    })
}

/// Finds matching lines in the source files under a folder
pub fn search_in_folder(_ctx: &ToolContext, params: SearchInFolder) -> Result<SearchSummary, ToolError> {
    let summary =
        search_folder(&params.folder_path, &params.search_query()).map_err(EngineError::from)?;
    info!(
        folder = %params.folder_path.display(),
        matches = summary.total_matches(),
        files = summary.files_with_matches(),
        "search finished"
    );
    Ok(summary)
}

/// Searches a folder and writes the matches to a new workbook
pub fn write_search_to_excel(
    ctx: &ToolContext,
    params: WriteSearchToExcel,
) -> Result<FileWritten, ToolError> {
    let output = ctx
        .config
        .output(params.output_path.as_deref(), "search_results.xlsx");
    let summary = search_in_folder(ctx, params.search())?;

    let book = search_workbook(&summary, params.include_context)?;
    save_atomically(&book, &output)?;
    info!(output = %output.display(), "search results written");

    Ok(FileWritten {
        matches: Some(summary.total_matches()),
        ..FileWritten::new(output)
    })
}

/// Renders a prompt template by name
pub fn get_prompt(ctx: &ToolContext, params: GetPrompt) -> Result<Vec<PromptMessage>, ToolError> {
    render_prompt(ctx.config(), &params.name, params.arguments)
}

fn parse<P: serde::de::DeserializeOwned>(request: &ToolRequest) -> Result<P, ToolError> {
    serde_json::from_value(request.params.clone()).map_err(|e| ToolError::InvalidParams {
        operation: request.operation.clone(),
        message: e.to_string(),
    })
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Serialize(e.to_string()))
}

/// Runs one request, returning its data or the error
pub fn execute(ctx: &ToolContext, request: &ToolRequest) -> Result<serde_json::Value, ToolError> {
    match request.operation.as_str() {
        "write_task_list" => to_value(write_task_list(ctx, parse(request)?)?),
        "write_plantuml_to_excel" => to_value(write_plantuml_to_excel(ctx, parse(request)?)?),
        "write_plantuml_image" => to_value(write_plantuml_image(ctx, parse(request)?)?),
        "generate_plantuml_png" => to_value(generate_plantuml_png(ctx, parse(request)?)?),
        "write_code_to_excel" => to_value(write_code_to_excel(ctx, parse(request)?)?),
        "write_code_and_diagram_to_excel" => {
            to_value(write_code_and_diagram_to_excel(ctx, parse(request)?)?)
        }
        "capture_code" => to_value(capture_code(ctx, parse(request)?)?),
        "list_symbols" => to_value(list_file_symbols(ctx, parse(request)?)?),
        "write_diff_to_excel" => to_value(write_diff_to_excel(ctx, parse(request)?)?),
        "format_diff" => to_value(format_diff(ctx, parse(request)?)?),
        "search_in_folder" => to_value(search_in_folder(ctx, parse(request)?)?),
        "write_search_to_excel" => to_value(write_search_to_excel(ctx, parse(request)?)?),
        "prompt" => to_value(get_prompt(ctx, parse(request)?)?),
        "tools" => to_value(super::manifest::manifest()),
        other => Err(ToolError::UnknownOperation(other.to_string())),
    }
}

/// Runs one request and wraps the outcome in a response
pub fn dispatch(ctx: &ToolContext, request: &ToolRequest) -> ToolResponse {
    match execute(ctx, request) {
        Ok(data) => ToolResponse::success(data),
        Err(e) => {
            tracing::warn!(operation = %request.operation, kind = e.kind(), error = %e, "operation failed");
            ToolResponse::error(e.to_string(), e.kind())
        }
    }
}
