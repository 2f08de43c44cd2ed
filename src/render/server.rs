//! Blocking HTTP client for a PlantUML server

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::plantuml::{encode, wrap_source};
use super::{DiagramFormat, DiagramRenderer, RenderError};

/// A PlantUML server reachable over HTTP
pub struct PlantUmlServer {
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl PlantUmlServer {
    /// Creates a client for the server at `base_url`.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RenderError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("marksheet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RenderError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    /// Full request URL for a diagram
    pub fn url_for(&self, source: &str, format: DiagramFormat) -> Result<String, RenderError> {
        let encoded = encode(&wrap_source(source))?;
        Ok(format!("{}/{}/{}", self.base_url, format, encoded))
    }
}

impl DiagramRenderer for PlantUmlServer {
    fn render(&self, source: &str, format: DiagramFormat) -> Result<Vec<u8>, RenderError> {
        let url = self.url_for(source, format)?;
        debug!(server = %self.base_url, %format, "requesting diagram");

        let response = self.http.get(&url).send().map_err(|e| {
            if e.is_timeout() {
                RenderError::Timeout {
                    url: self.base_url.clone(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                RenderError::Transport {
                    url: self.base_url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: self.base_url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| RenderError::Transport {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;
        debug!(bytes = bytes.len(), "diagram received");

        Ok(bytes.to_vec())
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_layout() {
        let server = PlantUmlServer::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        let url = server.url_for("A -> B", DiagramFormat::Svg).unwrap();

        assert!(url.starts_with("http://localhost:8080/svg/"));
        assert_eq!(server.endpoint(), "http://localhost:8080");
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) is closed on test machines
        let server = PlantUmlServer::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = server.render("A -> B", DiagramFormat::Png).unwrap_err();

        assert!(matches!(
            err,
            RenderError::Transport { .. } | RenderError::Timeout { .. }
        ));
    }
}
