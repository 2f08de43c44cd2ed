//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Operation |
//! |---------|-----------|
//! | `tasks` | `write_task_list` |
//! | `plantuml` | `write_plantuml_to_excel` |
//! | `image` | `write_plantuml_image` |
//! | `png` | `generate_plantuml_png` |
//! | `code` | `write_code_to_excel` |
//! | `code-diagram` | `write_code_and_diagram_to_excel` |
//! | `capture` | `capture_code` |
//! | `serve` | all of the above as JSON lines on stdin/stdout |
//! | `tools` | print the tool manifest |
//! | `init` | write a default `marksheet.toml` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! marksheet --verbose tasks --main "Buy milk"
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod ops;
mod output;
mod serve;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
