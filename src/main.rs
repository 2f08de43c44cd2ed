//! marksheet - fill Excel templates with task lists, code listings and diagrams

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = marksheet::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
