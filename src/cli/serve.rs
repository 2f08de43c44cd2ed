//! JSON-lines tool server
//!
//! One request per stdin line, one response per stdout line. Logs go to
//! stderr so stdout stays clean for the protocol.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::storage::Config;
use crate::tools::{dispatch, ToolContext, ToolRequest, ToolResponse};

/// Answers one raw line
pub fn respond(ctx: &ToolContext, line: &str) -> ToolResponse {
    match serde_json::from_str::<ToolRequest>(line) {
        Ok(request) => {
            debug!(operation = %request.operation, "request");
            dispatch(ctx, &request)
        }
        Err(e) => ToolResponse::error(format!("Invalid request: {}", e), "malformed_request"),
    }
}

/// Serves requests until stdin closes
pub fn run(config: Config) -> Result<()> {
    let ctx = ToolContext::new(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut handled = 0usize;

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = respond(&ctx, &line);
        serde_json::to_writer(&mut stdout, &response).context("Failed to encode response")?;
        writeln!(stdout).context("Failed to write response")?;
        stdout.flush().context("Failed to flush response")?;
        handled += 1;
    }

    info!(handled, "input closed, stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_malformed() {
        let ctx = ToolContext::new(Config::default());
        let response = respond(&ctx, "{not json");

        assert!(!response.success);
        assert_eq!(response.kind.as_deref(), Some("malformed_request"));
    }

    #[test]
    fn manifest_over_the_wire() {
        let ctx = ToolContext::new(Config::default());
        let response = respond(&ctx, r#"{"operation": "tools"}"#);

        assert!(response.success);
        assert_eq!(response.data.unwrap()["name"], "marksheet");
    }
}
