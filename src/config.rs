//! Configuration for lessonkit paths and validation.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (LESSONKIT_HOME, LESSONKIT_CONTENT)
//! 2. Config file (.lessonkit/config.yaml)
//! 3. Defaults (~/.lessonkit, ./content)
//!
//! Config file discovery:
//! - Searches current directory and parents for .lessonkit/config.yaml
//! - `paths.content` is relative to the directory holding .lessonkit/
//! - `paths.home` is relative to .lessonkit/ itself

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::library::FsSource;
use crate::validation::ValidationSettings;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Directory holding the config file
pub const CONFIG_DIR: &str = ".lessonkit";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub validation: Option<ValidationConfig>,
    #[serde(default)]
    pub loader: Option<LoaderConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Catalog and state directory (relative to .lessonkit/)
    pub home: Option<String>,
    /// Content root (relative to the project root)
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub max_file_lines: Option<usize>,
    pub readability_tolerance: Option<f64>,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    pub ignore: Option<Vec<String>>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to lessonkit home (catalog)
    pub home: PathBuf,
    /// Content root
    pub content: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Validation settings
    pub validation: ValidationSettings,
    /// Loader ignore globs
    pub ignore: Vec<String>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge config file values over the default validation settings
fn validation_settings(config: Option<&ValidationConfig>) -> ValidationSettings {
    let defaults = ValidationSettings::default();
    let Some(config) = config else {
        return defaults;
    };

    ValidationSettings {
        max_file_lines: config.max_file_lines.unwrap_or(defaults.max_file_lines),
        readability_tolerance: config
            .readability_tolerance
            .unwrap_or(defaults.readability_tolerance),
        strict: config.strict.unwrap_or(defaults.strict),
        ..defaults
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    // Default home directory
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    // Check for config file
    let config_file = find_config_file();

    let (home, content, validation, ignore) = if let Some(ref config_path) = config_file {
        // Config file found - use it as base
        let config = load_config_file(config_path)?;

        // .lessonkit/ and the project root above it
        let lessonkit_dir = config_path.parent().unwrap_or(Path::new("."));
        let base_dir = lessonkit_dir.parent().unwrap_or(Path::new("."));

        let home = if let Ok(env_home) = std::env::var("LESSONKIT_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            resolve_path(lessonkit_dir, home_path)
        } else {
            default_home.clone()
        };

        let content = if let Ok(env_content) = std::env::var("LESSONKIT_CONTENT") {
            PathBuf::from(env_content)
        } else if let Some(ref content_path) = config.paths.content {
            resolve_path(base_dir, content_path)
        } else {
            base_dir.join("content")
        };

        let validation = validation_settings(config.validation.as_ref());

        let ignore = config
            .loader
            .and_then(|l| l.ignore)
            .unwrap_or_else(FsSource::default_ignore_patterns);

        (home, content, validation, ignore)
    } else {
        // No config file - use env vars or defaults
        let home = std::env::var("LESSONKIT_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home.clone());

        let content = std::env::var("LESSONKIT_CONTENT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("content"));

        (
            home,
            content,
            ValidationSettings::default(),
            FsSource::default_ignore_patterns(),
        )
    };

    Ok(ResolvedConfig {
        home,
        content,
        config_file,
        validation,
        ignore,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the content root
pub fn content_dir() -> Result<PathBuf> {
    Ok(config()?.content.clone())
}

/// Get the catalog path ($LESSONKIT_HOME/catalog.json)
pub fn catalog_path() -> Result<PathBuf> {
    Ok(config()?.home.join("catalog.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let lessonkit_dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&lessonkit_dir).unwrap();

        let config_path = lessonkit_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./
  content: ../content
validation:
  max_file_lines: 400
  strict: true
loader:
  ignore: ["**/_*"]
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./".to_string()));
        assert_eq!(config.paths.content, Some("../content".to_string()));
        assert_eq!(config.loader.unwrap().ignore, Some(vec!["**/_*".to_string()]));

        let settings = validation_settings(config.validation.as_ref());
        assert_eq!(settings.max_file_lines, 400);
        assert!(settings.strict);
        // Unset values keep their defaults
        assert_eq!(settings.readability_tolerance, 4.0);
    }

    #[test]
    fn test_validation_defaults_without_section() {
        let settings = validation_settings(None);
        assert_eq!(settings, ValidationSettings::default());
        assert_eq!(settings.max_file_lines, 600);
    }

    #[test]
    fn test_minimal_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        std::fs::write(&config_path, "version: \"1.0\"\n").unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert!(config.paths.content.is_none());
        assert!(config.validation.is_none());
        assert!(config.loader.is_none());
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "../sibling"),
            PathBuf::from("/home/user/project/../sibling")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
