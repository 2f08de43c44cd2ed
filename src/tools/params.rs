//! Typed operation parameters
//!
//! Unknown fields are rejected so a misspelled optional parameter is
//! reported instead of silently ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{LineRange, SearchQuery};
use crate::render::DiagramFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteTaskList {
    pub main_tasks: Vec<String>,
    pub support_tasks: Vec<String>,
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WritePlantumlToExcel {
    pub puml_code: String,
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub image_width: Option<u32>,
    #[serde(default)]
    pub image_height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WritePlantumlImage {
    pub puml_code: String,
    pub excel_path: PathBuf,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// A1-style cell, defaults to `A1`
    #[serde(default)]
    pub cell_anchor: Option<String>,
    /// Defaults to the active sheet
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub image_width: Option<u32>,
    #[serde(default)]
    pub image_height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratePlantumlPng {
    pub puml_code: String,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub format: DiagramFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteCodeToExcel {
    pub file_path: PathBuf,
    #[serde(default)]
    pub ranges: Vec<LineRange>,
    /// Functions or classes to capture whole
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteCodeAndDiagramToExcel {
    pub file_path: PathBuf,
    #[serde(default)]
    pub ranges: Vec<LineRange>,
    /// Functions or classes to capture whole
    #[serde(default)]
    pub names: Vec<String>,
    pub puml_code: String,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureCode {
    pub file_path: PathBuf,
    #[serde(default)]
    pub ranges: Vec<LineRange>,
    /// Functions or classes to capture whole
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSymbols {
    pub file_path: PathBuf,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteDiffToExcel {
    pub old_code: String,
    pub new_code: String,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub old_label: Option<String>,
    #[serde(default)]
    pub new_label: Option<String>,
    /// Shown in the headers; its extension picks the colouring language
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default = "default_true")]
    pub side_by_side: bool,
}

fn default_diff_context() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatDiff {
    pub old_code: String,
    pub new_code: String,
    #[serde(default = "default_diff_context")]
    pub context_lines: usize,
}

fn default_search_context() -> usize {
    SearchQuery::new("").context_lines
}

fn default_max_results() -> usize {
    SearchQuery::new("").max_results
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchInFolder {
    pub folder_path: PathBuf,
    pub query: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    /// Empty searches the usual source and text extensions
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default = "default_search_context")]
    pub context_lines: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl SearchInFolder {
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            query: self.query.clone(),
            regex: self.regex,
            case_sensitive: self.case_sensitive,
            extensions: self.extensions.clone(),
            context_lines: self.context_lines,
            max_results: self.max_results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteSearchToExcel {
    pub folder_path: PathBuf,
    pub query: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default = "default_search_context")]
    pub context_lines: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub include_context: bool,
}

impl WriteSearchToExcel {
    /// The search half of the parameters
    pub fn search(&self) -> SearchInFolder {
        SearchInFolder {
            folder_path: self.folder_path.clone(),
            query: self.query.clone(),
            regex: self.regex,
            case_sensitive: self.case_sensitive,
            extensions: self.extensions.clone(),
            context_lines: self.context_lines,
            max_results: self.max_results,
        }
    }
}

/// Arguments of the `random_task_list` prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomTaskList {
    #[serde(default = "default_count")]
    pub main_count: u32,
    #[serde(default = "default_count")]
    pub support_count: u32,
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

fn default_count() -> u32 {
    3
}

impl Default for RandomTaskList {
    fn default() -> Self {
        Self {
            main_count: default_count(),
            support_count: default_count(),
            template_path: None,
            output_path: None,
        }
    }
}

/// Parameters of the `prompt` operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetPrompt {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}
