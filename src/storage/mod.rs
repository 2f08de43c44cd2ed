//! # Storage Layer
//!
//! Configuration and default file locations.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Project config | TOML | `marksheet.toml` (nearest ancestor directory) |
//! | Global config | TOML | `~/.config/marksheet/config.toml` |
//! | Default template | xlsx | `templates/template.xlsx` |
//! | Default outputs | xlsx / png | `output/` |
//!
//! Workbook reads and atomic writes live in [`crate::engine`].

mod config;

pub use config::{
    Config, ConfigError, ImageConfig, ListingConfig, PathsConfig, RenderConfig, Settings,
    CONFIG_FILE, SERVER_ENV, TEMPLATE_ENV,
};
