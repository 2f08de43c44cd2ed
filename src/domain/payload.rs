//! Payloads carried by a template request
//!
//! Text payloads are rendered into [`RenderedRow`]s before anything touches
//! a workbook, so every validation failure surfaces ahead of the first
//! mutation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cell::MAX_CELL_CHARS;
use super::marker::MarkerKind;

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("{kind} item {index} is empty")]
    EmptyItem { kind: MarkerKind, index: usize },

    #[error("{kind} item {index} has {len} characters (cell limit is {MAX_CELL_CHARS})")]
    TooLong {
        kind: MarkerKind,
        index: usize,
        len: usize,
    },

    #[error("image dimensions must be positive, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("image payload is not a recognized raster image")]
    NotAnImage,
}

/// How the entries of a text block are written into rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "style")]
pub enum ItemFormat {
    /// `"1. first"`, `"2. second"`, ...
    Numbered,

    /// Entry text as-is
    Plain,

    /// Source line number in the column left of the marker, text in the marker column
    LineNumbered { first_line: u32 },
}

/// One row's worth of rendered content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    /// Number written into the column left of the text (line-numbered blocks only)
    pub label: Option<u32>,

    /// Text for the marker column
    pub text: String,
}

/// An ordered sequence of text entries bound to a marker
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub kind: MarkerKind,
    pub entries: Vec<String>,
    pub format: ItemFormat,
}

impl TextBlock {
    pub fn new(kind: MarkerKind, entries: Vec<String>, format: ItemFormat) -> Self {
        Self {
            kind,
            entries,
            format,
        }
    }

    /// Numbered task list
    pub fn numbered(kind: MarkerKind, entries: Vec<String>) -> Self {
        Self::new(kind, entries, ItemFormat::Numbered)
    }

    /// Plain lines of text, e.g. diagram source
    pub fn plain_lines(kind: MarkerKind, text: &str) -> Self {
        Self::new(kind, text.lines().map(str::to_string).collect(), ItemFormat::Plain)
    }

    /// Returns the number of rows this block occupies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the entries into row contents.
    ///
    /// Numbered entries are trimmed and must not be empty. Plain and
    /// line-numbered entries keep their indentation; only trailing
    /// whitespace is dropped.
    pub fn render(&self) -> Result<Vec<RenderedRow>, PayloadError> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let index = i + 1;
                let cleaned = sanitize(entry);

                let row = match self.format {
                    ItemFormat::Numbered => {
                        let item = cleaned.trim();
                        if item.is_empty() {
                            return Err(PayloadError::EmptyItem {
                                kind: self.kind,
                                index,
                            });
                        }
                        RenderedRow {
                            label: None,
                            text: format!("{}. {}", index, item),
                        }
                    }
                    ItemFormat::Plain => RenderedRow {
                        label: None,
                        text: cleaned.trim_end().to_string(),
                    },
                    ItemFormat::LineNumbered { first_line } => RenderedRow {
                        label: Some(first_line + i as u32),
                        text: cleaned.trim_end().to_string(),
                    },
                };

                let len = row.text.chars().count();
                if len > MAX_CELL_CHARS {
                    return Err(PayloadError::TooLong {
                        kind: self.kind,
                        index,
                        len,
                    });
                }
                Ok(row)
            })
            .collect()
    }
}

/// Drops characters that cannot appear in spreadsheet XML: C0 controls
/// other than tab, LF and CR, and the two noncharacters U+FFFE/U+FFFF
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| *c >= ' ' || matches!(c, '\t' | '\n' | '\r'))
        .filter(|c| !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
        .collect()
}

/// Target size of an embedded image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Fills in whichever side the caller omitted from the defaults
    pub fn resolve(width: Option<u32>, height: Option<u32>, default: ImageSize) -> Self {
        Self {
            width: width.unwrap_or(default.width),
            height: height.unwrap_or(default.height),
        }
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.width == 0 || self.height == 0 {
            return Err(PayloadError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Raster formats an image payload may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// Sniffs the format from the leading bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }
}

/// Image bytes plus the size they are embedded at
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    format: ImageFormat,
    size: ImageSize,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, size: ImageSize) -> Result<Self, PayloadError> {
        size.validate()?;
        let format = ImageFormat::detect(&bytes).ok_or(PayloadError::NotAnImage)?;
        Ok(Self {
            bytes,
            format,
            size,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Content-addressed media name, stable for identical bytes
    pub fn media_name(&self) -> String {
        let hash = blake3::hash(&self.bytes);
        format!("diagram-{}.{}", &hash.to_hex()[..12], self.format.extension())
    }
}
