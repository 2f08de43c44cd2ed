//! Tool manifest and prompt templates

use serde_json::Value;

use super::params::RandomTaskList;
use super::protocol::{ParamSpec, PromptMessage, PromptSpec, ToolManifest, ToolSpec};
use super::ToolError;
use crate::storage::Config;

fn tool(name: &str, description: &str, required: &[(&str, &str)], optional: &[(&str, &str)]) -> ToolSpec {
    let params = |list: &[(&str, &str)]| list.iter().map(|(n, d)| ParamSpec::new(n, d)).collect();
    ToolSpec {
        name: name.to_string(),
        description: description.to_string(),
        required: params(required),
        optional: params(optional),
    }
}

const OUTPUT: (&str, &str) = ("output_path", "Where to write the result");
const TEMPLATE: (&str, &str) = ("template_path", "Template workbook with marker cells");
const SERVER: (&str, &str) = ("server_url", "PlantUML server base URL");
const WIDTH: (&str, &str) = ("image_width", "Image width in pixels");
const HEIGHT: (&str, &str) = ("image_height", "Image height in pixels");
const PUML: (&str, &str) = ("puml_code", "PlantUML diagram source");
const FILE: (&str, &str) = ("file_path", "Source file to capture lines from");
const RANGES: (&str, &str) = ("ranges", "Line ranges, e.g. [[1, 20], [40, null]]");
const NAMES: (&str, &str) = ("names", "Function or class names to capture after the ranges");
const OLD: (&str, &str) = ("old_code", "Original text");
const NEW: (&str, &str) = ("new_code", "Changed text");
const FOLDER: (&str, &str) = ("folder_path", "Folder searched recursively");
const QUERY: (&str, &str) = ("query", "Text or pattern to find");
const SEARCH_OPTIONS: [(&str, &str); 5] = [
    ("regex", "Treat the query as a regular expression"),
    ("case_sensitive", "Match case, default false"),
    ("extensions", "File extensions to search, default common source types"),
    ("context_lines", "Lines shown around each match, default 2"),
    ("max_results", "Stop after this many matches, default 1000"),
];
const TITLE: (&str, &str) = ("title", "Document title");

/// Every operation the tool server accepts
pub fn manifest() -> ToolManifest {
    ToolManifest {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Fill spreadsheet templates with task lists, code listings and diagrams"
            .to_string(),
        tools: vec![
            tool(
                "write_task_list",
                "Write numbered main and support tasks at their template markers",
                &[
                    ("main_tasks", "Main task descriptions"),
                    ("support_tasks", "Support task descriptions"),
                ],
                &[TEMPLATE, OUTPUT],
            ),
            tool(
                "write_plantuml_to_excel",
                "Write diagram source and its rendered image at their template markers",
                &[PUML],
                &[TEMPLATE, OUTPUT, SERVER, WIDTH, HEIGHT],
            ),
            tool(
                "write_plantuml_image",
                "Place a rendered diagram at a cell of an existing workbook",
                &[PUML, ("excel_path", "Workbook to copy")],
                &[
                    OUTPUT,
                    ("cell_anchor", "Top-left cell of the image, default A1"),
                    ("sheet_name", "Target sheet, default the active sheet"),
                    SERVER,
                    WIDTH,
                    HEIGHT,
                ],
            ),
            tool(
                "generate_plantuml_png",
                "Render a diagram to an image file",
                &[PUML],
                &[OUTPUT, SERVER, ("format", "png, svg or txt")],
            ),
            tool(
                "write_code_to_excel",
                "List source line ranges or named symbols in a new workbook",
                &[FILE],
                &[RANGES, NAMES, OUTPUT, TITLE],
            ),
            tool(
                "write_code_and_diagram_to_excel",
                "List source line ranges and a rendered diagram on two sheets",
                &[FILE, PUML],
                &[RANGES, NAMES, OUTPUT, SERVER, TITLE],
            ),
            tool(
                "capture_code",
                "Return source line ranges as numbered markdown",
                &[FILE],
                &[RANGES, NAMES, TITLE],
            ),
            tool(
                "list_symbols",
                "List the functions and classes of a source file with their lines",
                &[("file_path", "Rust, Python, TypeScript or Go source file")],
                &[],
            ),
            tool(
                "write_diff_to_excel",
                "Write a coloured line diff of two texts, with optional side sheets",
                &[OLD, NEW],
                &[
                    OUTPUT,
                    ("old_label", "Name of the original side, default Old Code"),
                    ("new_label", "Name of the changed side, default New Code"),
                    ("file_path", "File name shown in headers and used for colouring"),
                    ("side_by_side", "Add a sheet per version, default true"),
                ],
            ),
            tool(
                "format_diff",
                "Return a unified diff of two texts",
                &[OLD, NEW],
                &[("context_lines", "Unchanged lines around each change, default 3")],
            ),
            tool(
                "search_in_folder",
                "Find matching lines in the source files of a folder",
                &[FOLDER, QUERY],
                &SEARCH_OPTIONS,
            ),
            tool(
                "write_search_to_excel",
                "Search a folder and write the matches to a workbook",
                &[FOLDER, QUERY],
                &[
                    SEARCH_OPTIONS[0],
                    SEARCH_OPTIONS[1],
                    SEARCH_OPTIONS[2],
                    SEARCH_OPTIONS[3],
                    SEARCH_OPTIONS[4],
                    OUTPUT,
                    ("include_context", "Write context rows around matches, default true"),
                ],
            ),
        ],
        prompts: vec![PromptSpec {
            name: "random_task_list".to_string(),
            description: "Invent task lists and save them with write_task_list".to_string(),
            arguments: vec![
                ParamSpec::new("main_count", "Number of main tasks, default 3"),
                ParamSpec::new("support_count", "Number of support tasks, default 3"),
                ParamSpec::new(TEMPLATE.0, TEMPLATE.1),
                ParamSpec::new(OUTPUT.0, OUTPUT.1),
            ],
        }],
    }
}

/// Messages asking a model to invent tasks and save them
pub fn random_task_list(args: &RandomTaskList, config: &Config) -> Vec<PromptMessage> {
    let template = config.template(args.template_path.as_deref());
    let output = config.output(args.output_path.as_deref(), "tasks.xlsx");

    vec![
        PromptMessage {
            role: "system".to_string(),
            content: "Create concise, varied project tasks in two lists: main tasks and \
                      support tasks. Give each item as plain text; numbering is added when \
                      the list is written. Then call `write_task_list` to save both lists \
                      into the spreadsheet template, keeping its formatting."
                .to_string(),
        },
        PromptMessage {
            role: "user".to_string(),
            content: format!(
                "Generate {} main tasks and {} support tasks. Save them with \
                 `write_task_list`, using template_path='{}' and output_path='{}'. \
                 Keep each task under ten words. Confirm where the file was written.",
                args.main_count,
                args.support_count,
                template.display(),
                output.display()
            ),
        },
    ]
}

/// Renders the named prompt with JSON arguments
pub fn render_prompt(config: &Config, name: &str, arguments: Value) -> Result<Vec<PromptMessage>, ToolError> {
    match name {
        "random_task_list" => {
            let args = if arguments.is_null() {
                RandomTaskList::default()
            } else {
                serde_json::from_value(arguments).map_err(|e| ToolError::InvalidParams {
                    operation: "prompt".to_string(),
                    message: e.to_string(),
                })?
            };
            Ok(random_task_list(&args, config))
        }
        other => Err(ToolError::UnknownPrompt(other.to_string())),
    }
}
