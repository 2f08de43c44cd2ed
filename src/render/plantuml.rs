//! PlantUML text encoding
//!
//! The server expects the diagram text deflated (raw, no zlib framing) and
//! base64-encoded with its own alphabet: digits first, then upper, lower,
//! `-` and `_`.

use std::io::Write;

use base64::alphabet::Alphabet;
use base64::engine::general_purpose::NO_PAD;
use base64::engine::GeneralPurpose;
use base64::Engine;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use super::RenderError;

const PLANTUML_ALPHABET: Alphabet =
    match Alphabet::new("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("invalid PlantUML alphabet"),
    };

const PLANTUML_BASE64: GeneralPurpose = GeneralPurpose::new(&PLANTUML_ALPHABET, NO_PAD);

/// Wraps bare diagram text in `@startuml`/`@enduml`.
///
/// Text that already opens with an `@start...` directive is only trimmed.
pub fn wrap_source(source: &str) -> String {
    let code = source.trim();
    if code.starts_with("@start") {
        code.to_string()
    } else {
        format!("@startuml\n{}\n@enduml", code)
    }
}

/// Encodes diagram text for use in a server URL path
pub fn encode(text: &str) -> Result<String, RenderError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    Ok(PLANTUML_BASE64.encode(compressed))
}
