//! # Diagram Rendering
//!
//! Turns diagram source text into image bytes by asking a PlantUML server.
//!
//! ## Protocol
//!
//! ```text
//! source ── wrap @startuml/@enduml ── raw deflate ── PlantUML base64
//!                                                        │
//!                       GET {server}/{png|svg|txt}/{encoded}
//! ```
//!
//! ## Key Types
//!
//! - [`DiagramRenderer`] - Anything that can render diagram source
//! - [`PlantUmlServer`] - Blocking HTTP client for a PlantUML server
//! - [`DiagramFormat`] - Requested output format

mod plantuml;
mod server;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use plantuml::{encode, wrap_source};
pub use server::PlantUmlServer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to set up HTTP client: {0}")]
    Client(String),

    #[error("Diagram server unreachable at {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Diagram server at {url} did not answer within {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Diagram server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to encode diagram source: {0}")]
    Encode(String),
}

/// Output format requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramFormat {
    #[default]
    Png,
    Svg,
    Txt,
}

impl DiagramFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramFormat::Png => "png",
            DiagramFormat::Svg => "svg",
            DiagramFormat::Txt => "txt",
        }
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(DiagramFormat::Png),
            "svg" => Ok(DiagramFormat::Svg),
            "txt" => Ok(DiagramFormat::Txt),
            other => Err(format!("Unknown diagram format '{}': expected png, svg or txt", other)),
        }
    }
}

/// Renders diagram source text into bytes of the requested format
pub trait DiagramRenderer {
    fn render(&self, source: &str, format: DiagramFormat) -> Result<Vec<u8>, RenderError>;

    /// Where diagrams are rendered, for logs and error messages
    fn endpoint(&self) -> &str;
}

impl<R: DiagramRenderer + ?Sized> DiagramRenderer for &R {
    fn render(&self, source: &str, format: DiagramFormat) -> Result<Vec<u8>, RenderError> {
        (**self).render(source, format)
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

impl<R: DiagramRenderer + ?Sized> DiagramRenderer for Box<R> {
    fn render(&self, source: &str, format: DiagramFormat) -> Result<Vec<u8>, RenderError> {
        (**self).render(source, format)
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parse_and_display() {
        assert_eq!("PNG".parse::<DiagramFormat>().unwrap(), DiagramFormat::Png);
        assert_eq!("svg".parse::<DiagramFormat>().unwrap(), DiagramFormat::Svg);
        assert!("gif".parse::<DiagramFormat>().is_err());
        assert_eq!(DiagramFormat::Txt.to_string(), "txt");
    }

    #[test]
    fn format_serde() {
        let json = serde_json::to_string(&DiagramFormat::Svg).unwrap();
        assert_eq!(json, "\"svg\"");
        let format: DiagramFormat = serde_json::from_str("\"txt\"").unwrap();
        assert_eq!(format, DiagramFormat::Txt);
    }
}
