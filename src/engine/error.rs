//! Engine error taxonomy

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{
    CellRefError, DiffError, MarkerKind, MarkerLocation, PayloadError, PlanError, SearchError,
    SourceError,
};
use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Marker '{}' not found in {scope}", kind.sentinel())]
    MarkerNotFound { kind: MarkerKind, scope: String },

    #[error("Marker '{}' appears more than once: {first} and {second}", kind.sentinel())]
    DuplicateMarker {
        kind: MarkerKind,
        first: MarkerLocation,
        second: MarkerLocation,
    },

    #[error("{0}")]
    Malformed(String),

    #[error("Diagram rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Diagram server at {endpoint} did not return an image")]
    NotAnImage { endpoint: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    CellRef(#[from] CellRefError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn malformed(message: impl Into<String>) -> Self {
        EngineError::Malformed(message.into())
    }

    /// Stable error category used in tool responses
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::MarkerNotFound { .. } => "marker_not_found",
            EngineError::DuplicateMarker { .. } => "duplicate_marker",
            EngineError::Render(_) | EngineError::NotAnImage { .. } => "render_failure",
            EngineError::Source(SourceError::OutOfBounds { .. }) => "out_of_bounds",
            EngineError::Source(SourceError::Read { .. }) => "io",
            EngineError::Search(SearchError::NotAFolder(_)) => "io",
            EngineError::Source(_) => "malformed_request",
            EngineError::Payload(PayloadError::NotAnImage) => "render_failure",
            EngineError::Payload(_)
            | EngineError::Plan(_)
            | EngineError::CellRef(_)
            | EngineError::Diff(_)
            | EngineError::Search(_)
            | EngineError::Malformed(_) => "malformed_request",
            EngineError::Workbook { .. } => "workbook",
            EngineError::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        let not_found = EngineError::MarkerNotFound {
            kind: MarkerKind::MainTask,
            scope: "all sheets (Sheet1)".to_string(),
        };
        assert_eq!(not_found.kind(), "marker_not_found");
        assert!(not_found.to_string().contains("marker[main_task]"));

        let oob = EngineError::from(SourceError::OutOfBounds {
            path: PathBuf::from("a.rs"),
            range: crate::domain::LineRange::new(5, Some(3)),
            total: 10,
            reason: "end is before start",
        });
        assert_eq!(oob.kind(), "out_of_bounds");

        let status = EngineError::from(RenderError::Status {
            url: "http://localhost:8080".to_string(),
            status: 500,
        });
        assert_eq!(status.kind(), "render_failure");
        assert!(status.to_string().contains("500"));

        assert_eq!(EngineError::malformed("bad").kind(), "malformed_request");
        assert_eq!(EngineError::from(PayloadError::NotAnImage).kind(), "render_failure");
        assert_eq!(EngineError::from(SearchError::EmptyQuery).kind(), "malformed_request");
        assert_eq!(
            EngineError::from(SearchError::NotAFolder(PathBuf::from("nope"))).kind(),
            "io"
        );
    }
}
