//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{ops, serve};
use crate::tools;
use crate::domain::LineRange;
use crate::render::DiagramFormat;
use crate::storage::{Config, SERVER_ENV, TEMPLATE_ENV};

#[derive(Parser)]
#[command(name = "marksheet")]
#[command(author, version, about = "Fill Excel templates with task lists, code listings and diagrams")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the nearest marksheet.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// PlantUML server base URL
    #[arg(long, global = true, env = SERVER_ENV)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default marksheet.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Write numbered main and support tasks into a template
    ///
    /// Examples:
    ///   marksheet tasks --main "Buy milk" --main "Pay rent" --support "Backup files"
    Tasks {
        /// Main task (repeatable)
        #[arg(long = "main", value_name = "TASK")]
        main_tasks: Vec<String>,

        /// Support task (repeatable)
        #[arg(long = "support", value_name = "TASK")]
        support_tasks: Vec<String>,

        /// Template workbook
        #[arg(long, env = TEMPLATE_ENV)]
        template: Option<PathBuf>,

        /// Output workbook
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Write PlantUML source and its rendered image into a template
    Plantuml {
        /// Diagram source file (`-` for stdin)
        source: PathBuf,

        /// Template workbook
        #[arg(long, env = TEMPLATE_ENV)]
        template: Option<PathBuf>,

        /// Output workbook
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Image height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Place a rendered diagram at a cell of an existing workbook
    Image {
        /// Diagram source file (`-` for stdin)
        source: PathBuf,

        /// Workbook to copy
        workbook: PathBuf,

        /// Top-left cell of the image
        #[arg(long, default_value = "A1")]
        cell: String,

        /// Target sheet (defaults to the active sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Output workbook
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Image height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Render a diagram to an image file
    Png {
        /// Diagram source file (`-` for stdin)
        source: PathBuf,

        /// Output file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Image format (png, svg, txt)
        #[arg(long = "as", default_value = "png")]
        diagram_format: DiagramFormat,
    },

    /// List source line ranges in a new workbook
    ///
    /// Examples:
    ///   marksheet code src/main.rs --range 1-20 --range 42
    ///   marksheet code app.py --name load_config --name Store
    Code {
        /// Source file
        file: PathBuf,

        /// Line range, `START-END` or `LINE` (repeatable)
        #[arg(long = "range", short = 'r', required_unless_present = "names")]
        ranges: Vec<LineRange>,

        /// Function or class to capture whole (repeatable)
        #[arg(long = "name", short = 'n', value_name = "SYMBOL")]
        names: Vec<String>,

        /// Output workbook
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// List source line ranges and a rendered diagram on two sheets
    CodeDiagram {
        /// Source file
        file: PathBuf,

        /// Diagram source file (`-` for stdin)
        #[arg(long)]
        diagram: PathBuf,

        /// Line range, `START-END` or `LINE` (repeatable)
        #[arg(long = "range", short = 'r', required_unless_present = "names")]
        ranges: Vec<LineRange>,

        /// Function or class to capture whole (repeatable)
        #[arg(long = "name", short = 'n', value_name = "SYMBOL")]
        names: Vec<String>,

        /// Output workbook
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Print source line ranges as numbered markdown
    Capture {
        /// Source file
        file: PathBuf,

        /// Line range, `START-END` or `LINE` (repeatable)
        #[arg(long = "range", short = 'r', required_unless_present = "names")]
        ranges: Vec<LineRange>,

        /// Function or class to capture whole (repeatable)
        #[arg(long = "name", short = 'n', value_name = "SYMBOL")]
        names: Vec<String>,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// List the functions and classes of a source file
    Symbols {
        /// Source file (Rust, Python, TypeScript or Go)
        file: PathBuf,
    },

    /// Compare two files line by line
    ///
    /// Examples:
    ///   marksheet diff old/app.py app.py -o review.xlsx
    ///   marksheet diff old/app.py app.py --text
    Diff {
        /// Original version
        old: PathBuf,

        /// Changed version
        new: PathBuf,

        /// Output workbook
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Sheet label of the original version
        #[arg(long)]
        old_label: Option<String>,

        /// Sheet label of the changed version
        #[arg(long)]
        new_label: Option<String>,

        /// Write only the diff view, without a sheet per version
        #[arg(long)]
        unified_only: bool,

        /// Print a unified diff instead of writing a workbook
        #[arg(long, conflicts_with_all = ["output", "old_label", "new_label", "unified_only"])]
        text: bool,

        /// Unchanged lines around each change in `--text` output
        #[arg(long, default_value_t = 3)]
        context: usize,
    },

    /// Search the source files under a folder
    ///
    /// Examples:
    ///   marksheet search src TODO
    ///   marksheet search . "fn \w+_test" --regex -o matches.xlsx
    Search {
        /// Folder to search
        folder: PathBuf,

        /// Text to look for
        query: String,

        /// Treat the query as a regular expression
        #[arg(long)]
        regex: bool,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,

        /// File extension to search (repeatable, defaults to common source files)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Lines of context around each match
        #[arg(long, short = 'C', default_value_t = 2)]
        context: usize,

        /// Stop after this many matches
        #[arg(long, default_value_t = 1000)]
        max: usize,

        /// Leave context lines out of the report
        #[arg(long)]
        no_context: bool,

        /// Write the matches to this workbook instead of printing them
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Serve operations as JSON lines over stdin/stdout
    Serve,

    /// Print the tool manifest
    Tools,
}

/// Installs the stderr log subscriber
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "marksheet=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env();
            config
        }
        None => Config::load().context("Failed to load configuration")?,
    };

    if let Some(server) = &cli.server {
        config.settings.render.server_url = server.clone();
    }
    Ok(config)
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("marksheet starting");

    if let Commands::Init { path } = &cli.command {
        output.verbose_ctx("init", &format!("Writing config into: {}", path.display()));
        let written = Config::init(path)?;
        output.success(&format!("Created {}", written.display()));
        return Ok(());
    }

    let config = load_config(&cli)?;
    match &config.source {
        Some(path) => output.verbose_ctx("config", &format!("Loaded {}", path.display())),
        None => output.verbose_ctx("config", "Using built-in defaults"),
    }

    match cli.command {
        Commands::Init { .. } => {}

        Commands::Tasks {
            main_tasks,
            support_tasks,
            template,
            output: out,
        } => ops::tasks(&output, config, main_tasks, support_tasks, template, out)?,

        Commands::Plantuml {
            source,
            template,
            output: out,
            width,
            height,
        } => ops::plantuml(&output, config, &source, template, out, width, height)?,

        Commands::Image {
            source,
            workbook,
            cell,
            sheet,
            output: out,
            width,
            height,
        } => ops::image(
            &output,
            config,
            &source,
            workbook,
            cell,
            sheet,
            out,
            (width, height),
        )?,

        Commands::Png {
            source,
            output: out,
            diagram_format,
        } => ops::png(&output, config, &source, out, diagram_format)?,

        Commands::Code {
            file,
            ranges,
            names,
            output: out,
            title,
        } => ops::code(&output, config, file, (ranges, names), out, title)?,

        Commands::CodeDiagram {
            file,
            diagram,
            ranges,
            names,
            output: out,
            title,
        } => ops::code_diagram(&output, config, file, &diagram, (ranges, names), out, title)?,

        Commands::Capture {
            file,
            ranges,
            names,
            title,
        } => ops::capture(&output, config, file, (ranges, names), title)?,

        Commands::Symbols { file } => ops::symbols(&output, config, file)?,

        Commands::Diff {
            old,
            new,
            output: out,
            old_label,
            new_label,
            unified_only,
            text,
            context,
        } => {
            if text {
                ops::diff_text(&output, config, &old, &new, context)?
            } else {
                ops::diff(
                    &output,
                    config,
                    (&old, &new),
                    out,
                    (old_label, new_label),
                    !unified_only,
                )?
            }
        }

        Commands::Search {
            folder,
            query,
            regex,
            case_sensitive,
            extensions,
            context,
            max,
            no_context,
            output: out,
        } => {
            let params = tools::SearchInFolder {
                folder_path: folder,
                query,
                regex,
                case_sensitive,
                extensions,
                context_lines: context,
                max_results: max,
            };
            ops::search(&output, config, params, !no_context, out)?
        }

        Commands::Serve => {
            output.verbose("Serving requests on stdin");
            serve::run(config)?
        }

        Commands::Tools => ops::manifest(&output),
    }

    output.verbose("Command completed successfully");
    Ok(())
}
