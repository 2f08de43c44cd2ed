//! Configuration handling for marksheet
//!
//! Configuration is read from `marksheet.toml` (project, found by walking
//! up from the working directory) or `~/.config/marksheet/config.toml`
//! (global). The first file found wins; missing keys take their defaults.
//! `MARKSHEET_PLANTUML_SERVER` and `MARKSHEET_TEMPLATE` override the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::ImageSize;
use crate::engine::ListingOptions;

/// Project configuration file name
pub const CONFIG_FILE: &str = "marksheet.toml";

pub const SERVER_ENV: &str = "MARKSHEET_PLANTUML_SERVER";
pub const TEMPLATE_ENV: &str = "MARKSHEET_TEMPLATE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to write configuration {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Template and output locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Template used when a request names none
    pub template: PathBuf,

    /// Directory for default output files
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from("templates").join("template.xlsx"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Diagram server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Base URL of the PlantUML server
    pub server_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default embedded image size, in pixels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl ImageConfig {
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }
}

/// Sheet names, title and colouring for generated listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingConfig {
    pub code_sheet_name: String,
    pub diagram_sheet_name: String,
    pub title: String,
    pub syntax_colors: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        let opts = ListingOptions::default();
        Self {
            code_sheet_name: opts.code_sheet,
            diagram_sheet_name: opts.diagram_sheet,
            title: opts.title,
            syntax_colors: opts.highlight,
        }
    }
}

impl ListingConfig {
    /// Listing options, with an optional title override
    pub fn options(&self, title: Option<&str>) -> ListingOptions {
        ListingOptions {
            code_sheet: self.code_sheet_name.clone(),
            diagram_sheet: self.diagram_sheet_name.clone(),
            title: title.unwrap_or(&self.title).to_string(),
            highlight: self.syntax_colors,
        }
    }
}

/// Contents of a configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsConfig,
    pub render: RenderConfig,
    pub image: ImageConfig,
    pub listing: ListingConfig,
}

impl Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.image.width == 0 || self.image.height == 0 {
            return Err(ConfigError::Invalid(
                "image width and height must be positive".to_string(),
            ));
        }
        if self.render.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "render.timeout_secs must be positive".to_string(),
            ));
        }
        if self.listing.code_sheet_name == self.listing.diagram_sheet_name {
            return Err(ConfigError::Invalid(
                "listing.code_sheet_name and listing.diagram_sheet_name must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Effective configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: Settings,

    /// File the settings came from, if any
    pub source: Option<PathBuf>,

    /// Directory relative paths are resolved against
    pub root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for the current directory
    pub fn load() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().ok();
        let mut config = Self::discover(cwd.as_deref())?;
        config.apply_env();
        Ok(config)
    }

    /// Finds the nearest project config above `start`, else the global one
    pub fn discover(start: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = start.and_then(Self::find_project_config) {
            return Self::from_file(&path);
        }

        if let Some(path) = Self::global_config_dir().map(|dir| dir.join("config.toml")) {
            if path.is_file() {
                return Self::from_file(&path);
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Loads a specific configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;

        debug!(path = %path.display(), "configuration loaded");
        Ok(Self {
            settings,
            source: Some(path.to_path_buf()),
            root: path.parent().map(Path::to_path_buf),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "marksheet", "marksheet").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Walks up from `start` looking for `marksheet.toml`
    pub fn find_project_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Applies environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVER_ENV) {
            if !url.trim().is_empty() {
                self.settings.render.server_url = url;
            }
        }
        if let Ok(template) = std::env::var(TEMPLATE_ENV) {
            if !template.trim().is_empty() {
                self.settings.paths.template = PathBuf::from(template);
            }
        }
    }

    /// Resolves a configured path against the config file's directory
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Template to use: the explicit one, else the configured default
    pub fn template(&self, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => self.resolve(&self.settings.paths.template),
        }
    }

    /// Output path: the explicit one, else `output_dir/<default_name>`
    pub fn output(&self, explicit: Option<&Path>, default_name: &str) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => self.resolve(&self.settings.paths.output_dir).join(default_name),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.settings.render.server_url
    }

    pub fn timeout(&self) -> Duration {
        self.settings.render.timeout()
    }

    pub fn image_size(&self) -> ImageSize {
        self.settings.image.size()
    }

    /// Writes a default `marksheet.toml` into `dir`
    pub fn init(dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path));
        }

        fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let content = toml::to_string_pretty(&Settings::default())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        fs::write(&path, content).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings() {
        let config = Config::default();

        assert_eq!(config.server_url(), "http://localhost:8080");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.image_size(), ImageSize::new(800, 600));
        assert_eq!(
            config.template(None),
            PathBuf::from("templates").join("template.xlsx")
        );
        assert_eq!(
            config.output(None, "tasks.xlsx"),
            PathBuf::from("output").join("tasks.xlsx")
        );
    }

    #[test]
    fn parse_partial_settings() {
        let toml = r#"
[render]
server_url = "http://plantuml:9000"

[image]
width = 1024
"#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.render.server_url, "http://plantuml:9000");
        assert_eq!(settings.render.timeout_secs, 30);
        assert_eq!(settings.image.width, 1024);
        assert_eq!(settings.image.height, 600);
        assert_eq!(settings.listing.code_sheet_name, "Code Blocks");
    }

    #[test]
    fn find_project_config_walks_up() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let found = Config::find_project_config(&sub_dir);
        assert_eq!(found, Some(dir.path().join(CONFIG_FILE)));
    }

    #[test]
    fn paths_resolve_against_config_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[paths]\ntemplate = \"t/base.xlsx\"\noutput_dir = \"out\"\n",
        )
        .unwrap();

        let config = Config::discover(Some(dir.path())).unwrap();
        assert_eq!(config.template(None), dir.path().join("t").join("base.xlsx"));
        assert_eq!(
            config.output(None, "code.xlsx"),
            dir.path().join("out").join("code.xlsx")
        );
        assert_eq!(
            config.output(Some(Path::new("/tmp/x.xlsx")), "code.xlsx"),
            PathBuf::from("/tmp/x.xlsx")
        );
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        fs::write(&path, "[image]\nwidth = 0\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(&path, "[render\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn init_writes_loadable_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = Config::init(dir.path()).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.settings, Settings::default());

        assert!(matches!(
            Config::init(dir.path()),
            Err(ConfigError::AlreadyExists(_))
        ));
    }

    #[test]
    fn listing_title_override() {
        let listing = ListingConfig::default();
        assert_eq!(listing.options(None).title, "Code Documentation");
        assert_eq!(listing.options(Some("API")).title, "API");
        assert!(listing.options(None).highlight);

        let plain: Settings = toml::from_str("[listing]\nsyntax_colors = false\n").unwrap();
        assert!(!plain.listing.options(None).highlight);
    }
}
