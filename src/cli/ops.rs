//! Operation subcommands
//!
//! Thin wrappers that build the operation parameters from flags, run the
//! operation and print the result.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{format_matches, LineRange};
use crate::engine::ensure_distinct;
use crate::render::DiagramFormat;
use crate::storage::Config;
use crate::tools::{
    self, CaptureCode, FileWritten, FormatDiff, GeneratePlantumlPng, ListSymbols, SearchInFolder,
    ToolContext, WriteCodeAndDiagramToExcel, WriteCodeToExcel, WriteDiffToExcel,
    WritePlantumlImage, WritePlantumlToExcel, WriteSearchToExcel, WriteTaskList,
};

/// Line ranges and symbol names picked on the command line
pub type Selection = (Vec<LineRange>, Vec<String>);

/// Reads diagram source from a file, or stdin for `-`
fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read diagram source from stdin")?;
        return Ok(source);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read diagram source {}", path.display()))
}

fn read_version(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn describe(selection: &Selection) -> String {
    format!("{} range(s), {} name(s)", selection.0.len(), selection.1.len())
}

fn report(output: &Output, context: &str, written: &FileWritten) {
    if let Some(report) = &written.report {
        for (kind, at) in &report.markers {
            output.verbose_ctx(context, &format!("{} at {}", kind.sentinel(), at));
        }
        output.verbose_ctx(
            context,
            &format!(
                "{} row(s) inserted, {} image(s) attached",
                report.rows_inserted, report.images
            ),
        );
    }
    if let Some(diff) = &written.diff {
        output.verbose_ctx(
            context,
            &format!(
                "{} added, {} removed, {} unchanged",
                diff.added, diff.removed, diff.unchanged
            ),
        );
    }
    if let Some(matches) = written.matches {
        output.verbose_ctx(context, &format!("{} match(es)", matches));
    }
    output.result(&format!("Wrote {}", written.path.display()), written);
}

pub fn tasks(
    output: &Output,
    config: Config,
    main_tasks: Vec<String>,
    support_tasks: Vec<String>,
    template_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<()> {
    output.verbose_ctx(
        "tasks",
        &format!("{} main, {} support", main_tasks.len(), support_tasks.len()),
    );
    let ctx = ToolContext::new(config);
    let written = tools::write_task_list(
        &ctx,
        WriteTaskList {
            main_tasks,
            support_tasks,
            template_path,
            output_path,
        },
    )?;
    report(output, "tasks", &written);
    Ok(())
}

pub fn plantuml(
    output: &Output,
    config: Config,
    source: &Path,
    template_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    image_width: Option<u32>,
    image_height: Option<u32>,
) -> Result<()> {
    let puml_code = read_source(source)?;
    output.verbose_ctx("plantuml", &format!("Rendering via {}", config.server_url()));

    let ctx = ToolContext::new(config);
    let written = tools::write_plantuml_to_excel(
        &ctx,
        WritePlantumlToExcel {
            puml_code,
            template_path,
            output_path,
            server_url: None,
            image_width,
            image_height,
        },
    )?;
    report(output, "plantuml", &written);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn image(
    output: &Output,
    config: Config,
    source: &Path,
    excel_path: PathBuf,
    cell: String,
    sheet_name: Option<String>,
    output_path: Option<PathBuf>,
    (image_width, image_height): (Option<u32>, Option<u32>),
) -> Result<()> {
    let puml_code = read_source(source)?;
    output.verbose_ctx(
        "image",
        &format!("Placing diagram at {} of {}", cell, excel_path.display()),
    );

    let ctx = ToolContext::new(config);
    let written = tools::write_plantuml_image(
        &ctx,
        WritePlantumlImage {
            puml_code,
            excel_path,
            output_path,
            cell_anchor: Some(cell),
            sheet_name,
            server_url: None,
            image_width,
            image_height,
        },
    )?;
    report(output, "image", &written);
    Ok(())
}

pub fn png(
    output: &Output,
    config: Config,
    source: &Path,
    output_path: Option<PathBuf>,
    format: DiagramFormat,
) -> Result<()> {
    let puml_code = read_source(source)?;
    output.verbose_ctx("png", &format!("Rendering {} via {}", format, config.server_url()));

    let ctx = ToolContext::new(config);
    let written = tools::generate_plantuml_png(
        &ctx,
        GeneratePlantumlPng {
            puml_code,
            output_path,
            server_url: None,
            format,
        },
    )?;
    report(output, "png", &written);
    Ok(())
}

pub fn code(
    output: &Output,
    config: Config,
    file_path: PathBuf,
    selection: Selection,
    output_path: Option<PathBuf>,
    title: Option<String>,
) -> Result<()> {
    output.verbose_ctx("code", &format!("{} of {}", describe(&selection), file_path.display()));
    let (ranges, names) = selection;

    let ctx = ToolContext::new(config);
    let written = tools::write_code_to_excel(
        &ctx,
        WriteCodeToExcel {
            file_path,
            ranges,
            names,
            output_path,
            title,
        },
    )?;
    report(output, "code", &written);
    Ok(())
}

pub fn code_diagram(
    output: &Output,
    config: Config,
    file_path: PathBuf,
    diagram: &Path,
    selection: Selection,
    output_path: Option<PathBuf>,
    title: Option<String>,
) -> Result<()> {
    let puml_code = read_source(diagram)?;
    output.verbose_ctx("code-diagram", &format!("{} of {}", describe(&selection), file_path.display()));
    let (ranges, names) = selection;

    let ctx = ToolContext::new(config);
    let written = tools::write_code_and_diagram_to_excel(
        &ctx,
        WriteCodeAndDiagramToExcel {
            file_path,
            ranges,
            names,
            puml_code,
            output_path,
            server_url: None,
            title,
        },
    )?;
    report(output, "code-diagram", &written);
    Ok(())
}

pub fn capture(
    output: &Output,
    config: Config,
    file_path: PathBuf,
    (ranges, names): Selection,
    title: Option<String>,
) -> Result<()> {
    let ctx = ToolContext::new(config);
    let captured = tools::capture_code(
        &ctx,
        CaptureCode {
            file_path,
            ranges,
            names,
            title,
        },
    )?;
    output.verbose_ctx("capture", &format!("{} block(s)", captured.blocks));
    output.text("markdown", &captured.markdown);
    Ok(())
}

pub fn symbols(output: &Output, config: Config, file_path: PathBuf) -> Result<()> {
    let ctx = ToolContext::new(config);
    let symbols = tools::list_file_symbols(&ctx, ListSymbols { file_path })?;

    if output.is_json() {
        output.data(&symbols);
        return Ok(());
    }
    for symbol in &symbols {
        println!(
            "{:<8} {:<32} {}-{}",
            symbol.kind, symbol.name, symbol.start_line, symbol.end_line
        );
    }
    Ok(())
}

pub fn diff(
    output: &Output,
    config: Config,
    (old, new): (&Path, &Path),
    output_path: Option<PathBuf>,
    (old_label, new_label): (Option<String>, Option<String>),
    side_by_side: bool,
) -> Result<()> {
    let target = config.output(output_path.as_deref(), "diff.xlsx");
    ensure_distinct(old, &target, "original file")?;
    ensure_distinct(new, &target, "changed file")?;
    let ctx = ToolContext::new(config);
    output.verbose_ctx("diff", &format!("{} -> {}", old.display(), new.display()));

    let written = tools::write_diff_to_excel(
        &ctx,
        WriteDiffToExcel {
            old_code: read_version(old)?,
            new_code: read_version(new)?,
            output_path: Some(target),
            old_label,
            new_label,
            file_path: Some(new.display().to_string()),
            side_by_side,
        },
    )?;
    report(output, "diff", &written);
    Ok(())
}

pub fn diff_text(
    output: &Output,
    config: Config,
    old: &Path,
    new: &Path,
    context_lines: usize,
) -> Result<()> {
    let ctx = ToolContext::new(config);
    let text = tools::format_diff(
        &ctx,
        FormatDiff {
            old_code: read_version(old)?,
            new_code: read_version(new)?,
            context_lines,
        },
    )?;
    output.verbose_ctx(
        "diff",
        &format!("{} added, {} removed", text.stats.added, text.stats.removed),
    );
    output.text("diff", &text.diff);
    Ok(())
}

pub fn search(
    output: &Output,
    config: Config,
    params: SearchInFolder,
    include_context: bool,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let ctx = ToolContext::new(config);

    if output_path.is_some() {
        let written = tools::write_search_to_excel(
            &ctx,
            WriteSearchToExcel {
                folder_path: params.folder_path,
                query: params.query,
                regex: params.regex,
                case_sensitive: params.case_sensitive,
                extensions: params.extensions,
                context_lines: params.context_lines,
                max_results: params.max_results,
                output_path,
                include_context,
            },
        )?;
        report(output, "search", &written);
        return Ok(());
    }

    let summary = tools::search_in_folder(&ctx, params)?;
    if output.is_json() {
        output.data(&summary);
    } else {
        print!("{}", format_matches(&summary, include_context));
    }
    Ok(())
}

pub fn manifest(output: &Output) {
    let manifest = tools::manifest();

    if output.is_json() {
        output.data(&manifest);
        return;
    }

    println!("{} {}", manifest.name, manifest.version);
    println!();
    for tool in &manifest.tools {
        let required: Vec<_> = tool.required.iter().map(|p| p.name.as_str()).collect();
        println!("{:<34} {}", tool.name, tool.description);
        println!("{:<34} requires: {}", "", required.join(", "));
    }
    println!();
    println!("Prompts:");
    for prompt in &manifest.prompts {
        println!("{:<34} {}", prompt.name, prompt.description);
    }
}
