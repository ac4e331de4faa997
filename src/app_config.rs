use anyhow::{anyhow, Context, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::language_utils::{self, LanguageTagStyle};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Workbook/XLIFF conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Deployment package settings
    #[serde(default)]
    pub package: PackageConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Conversion settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversionConfig {
    /// How language tags are written into documents and filenames
    #[serde(default)]
    pub language_tag_style: LanguageTagStyle,

    /// Maximum number of files converted at the same time
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            language_tag_style: LanguageTagStyle::default(),
            max_workers: default_max_workers(),
        }
    }
}

/// How designated sections are removed from metadata fragments
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StripStrategy {
    // @strategy: Event-stream parse, only top-level sections are removed
    #[default]
    Structural,
    // @strategy: Shortest-match text patterns; nested same-named tags break it
    Textual,
}

impl std::fmt::Display for StripStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Textual => write!(f, "textual"),
        }
    }
}

impl std::str::FromStr for StripStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "structural" => Ok(Self::Structural),
            "textual" => Ok(Self::Textual),
            _ => Err(anyhow!("Invalid strip strategy: {}", s)),
        }
    }
}

/// Deployment package settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PackageConfig {
    /// Extension of metadata translation fragments, without the dot
    #[serde(default = "default_fragment_extension")]
    pub fragment_extension: String,

    /// Top-level sections removed from every fragment
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,

    /// Removal strategy for those sections
    #[serde(default)]
    pub strip_strategy: StripStrategy,

    /// Metadata API version written into package.xml
    #[serde(default = "default_manifest_version")]
    pub manifest_version: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            fragment_extension: default_fragment_extension(),
            sections: default_sections(),
            strip_strategy: StripStrategy::default(),
            manifest_version: default_manifest_version(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_max_workers() -> usize {
    4
}

fn default_fragment_extension() -> String {
    "objectTranslation".to_string()
}

fn default_sections() -> Vec<String> {
    ["fields", "validationRules", "webLinks", "layouts", "fieldSets"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_manifest_version() -> String {
    "57.0".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.conversion.max_workers == 0 {
            return Err(anyhow!("conversion.max_workers must be at least 1"));
        }

        let extension = &self.package.fragment_extension;
        if extension.is_empty() || extension.starts_with('.') || extension.contains(['/', '\\']) {
            return Err(anyhow!(
                "package.fragment_extension must be a bare extension such as 'objectTranslation', got '{}'",
                extension
            ));
        }

        if self.package.sections.is_empty() {
            return Err(anyhow!("package.sections must name at least one section"));
        }
        for section in &self.package.sections {
            if !is_xml_name(section) {
                return Err(anyhow!("package.sections contains an invalid element name: '{}'", section));
            }
        }

        let version = &self.package.manifest_version;
        if version.parse::<f32>().is_err() {
            return Err(anyhow!("package.manifest_version must look like '57.0', got '{}'", version));
        }

        Ok(())
    }

    /// Load the configuration at `path`, falling back to the user config
    /// directory, and creating a default file at `path` when neither exists.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if let Some(existing) = Self::locate(path) {
            let file = File::open(&existing)
                .with_context(|| format!("Failed to open config file: {:?}", existing))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", existing))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))
    }

    fn locate(path: &Path) -> Option<PathBuf> {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        let fallback = dirs::config_dir()?.join("xliffsheet").join("conf.json");
        fallback.exists().then_some(fallback)
    }

    /// Describe the configured tag style with an example, for logs
    pub fn describe_tag_style(&self) -> String {
        format!(
            "{:?} (pt_BR -> {})",
            self.conversion.language_tag_style,
            language_utils::normalize_language_tag("pt_BR", self.conversion.language_tag_style)
        )
    }
}

// @const: Element names accepted as strippable sections
static XML_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").unwrap());

fn is_xml_name(name: &str) -> bool {
    XML_NAME_REGEX.is_match(name)
}
