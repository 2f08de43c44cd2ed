//! # Tool Surface
//!
//! The operations callers can invoke, each a typed parameter struct plus a
//! function. The CLI runs one operation per invocation; `marksheet serve`
//! reads [`ToolRequest`]s from stdin and answers with [`ToolResponse`]s.
//!
//! | Operation | Writes |
//! |-----------|--------|
//! | `write_task_list` | copy of the template |
//! | `write_plantuml_to_excel` | copy of the template |
//! | `write_plantuml_image` | copy of an existing workbook |
//! | `generate_plantuml_png` | image file |
//! | `write_code_to_excel` | new workbook |
//! | `write_code_and_diagram_to_excel` | new workbook |
//! | `capture_code` | nothing, returns markdown |
//! | `list_symbols` | nothing, returns functions and classes |
//! | `write_diff_to_excel` | new workbook |
//! | `format_diff` | nothing, returns unified text |
//! | `search_in_folder` | nothing, returns matches |
//! | `write_search_to_excel` | new workbook |
//!
//! Failures carry a `kind` so callers can branch without parsing messages.

mod manifest;
mod operations;
mod params;
mod protocol;

pub use manifest::{manifest, random_task_list, render_prompt};
pub use operations::{
    capture_code, dispatch, execute, format_diff, generate_plantuml_png, get_prompt,
    list_file_symbols, search_in_folder, write_code_and_diagram_to_excel, write_code_to_excel,
    write_diff_to_excel, write_plantuml_image, write_plantuml_to_excel, write_search_to_excel,
    write_task_list, CapturedCode, DiffText, FileWritten, ToolContext, OPERATIONS,
};
pub use params::{
    CaptureCode, FormatDiff, GeneratePlantumlPng, GetPrompt, ListSymbols, RandomTaskList,
    SearchInFolder, WriteCodeAndDiagramToExcel, WriteCodeToExcel, WriteDiffToExcel,
    WritePlantumlImage, WritePlantumlToExcel, WriteSearchToExcel, WriteTaskList,
};
pub use protocol::{
    ParamSpec, PromptMessage, PromptSpec, ToolManifest, ToolRequest, ToolResponse, ToolSpec,
};

use thiserror::Error;

use crate::engine::EngineError;
use crate::render::RenderError;
use crate::storage::ConfigError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown operation: {0}; expected one of {ops}", ops = OPERATIONS.join(", "))]
    UnknownOperation(String),

    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    #[error("Invalid parameters for {operation}: {message}")]
    InvalidParams { operation: String, message: String },

    #[error("Failed to serialize result: {0}")]
    Serialize(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Diagram rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl ToolError {
    /// Stable error category reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownOperation(_)
            | ToolError::UnknownPrompt(_)
            | ToolError::InvalidParams { .. } => "malformed_request",
            ToolError::Serialize(_) => "internal",
            ToolError::Engine(e) => e.kind(),
            ToolError::Config(_) => "config",
            ToolError::Render(_) => "render_failure",
        }
    }
}
