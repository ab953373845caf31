//! Configuration management for the attribute verifier.
//!
//! Handles:
//! - Command-line argument parsing
//! - Project configuration (`.attr-verify.toml`, searched upward)
//! - Rule set directory configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::expectation::MarkerPolicy;
use crate::runner::{MatchMode, OutputFormat};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = ".attr-verify.toml";

/// Fixture extension used when nothing else is configured
pub const DEFAULT_EXTENSION: &str = "swift";

/// Command-line arguments for the attribute verifier
#[derive(Debug, Parser)]
#[command(name = "attr-verify")]
#[command(about = "Check attribute diagnostics against expectations written in fixtures")]
#[command(version)]
pub struct Args {
    /// Fixture files, or directories to search for fixtures
    #[arg(required = true)]
    pub fixtures: Vec<PathBuf>,

    /// Extra rule set directory (repeatable)
    #[arg(long = "attribute-dir", help = "Directory containing attribute rule set TOML files")]
    pub attribute_dirs: Vec<PathBuf>,

    /// How to treat stray `}}` after an expectation payload
    #[arg(long, value_enum)]
    pub marker_policy: Option<MarkerPolicy>,

    /// How expectation payloads are compared with diagnostic messages
    #[arg(long, value_enum)]
    pub match_mode: Option<MatchMode>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Re-run whenever a fixture or rule set changes
    #[arg(long)]
    pub watch: bool,

    /// Log level for the verifier
    #[arg(
        long,
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Contents of `.attr-verify.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub marker_policy: Option<MarkerPolicy>,
    pub match_mode: Option<MatchMode>,
    /// Relative paths resolve against the config file's directory
    pub attribute_dirs: Vec<PathBuf>,
    /// Fixture file extensions searched in directories
    pub extensions: Vec<String>,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project config: {}", path.display()))?;
        let mut config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse project config: {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.attribute_dirs = config
                .attribute_dirs
                .into_iter()
                .map(|dir| if dir.is_relative() { base.join(dir) } else { dir })
                .collect();
        }
        Ok(config)
    }

    /// Find the nearest `.attr-verify.toml` in `start` or its ancestors
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub fixtures: Vec<PathBuf>,
    /// User-global rule set directory
    pub user_attribute_dir: Option<PathBuf>,
    /// Project rule set directories: project config first, then CLI
    pub attribute_dirs: Vec<PathBuf>,
    pub marker_policy: MarkerPolicy,
    pub match_mode: MatchMode,
    pub extensions: Vec<String>,
    pub format: OutputFormat,
    pub watch: bool,
    pub log_level: String,
    pub project_config_path: Option<PathBuf>,
}

impl Config {
    /// Create configuration from command-line arguments and the working directory
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine working directory")?;
        Self::from_args_in(args, &cwd)
    }

    /// Create configuration as if started in `dir` (useful for testing)
    pub fn from_args_in(args: Args, dir: &Path) -> Result<Self> {
        let project_config_path = ProjectConfig::discover(dir);
        let project = match &project_config_path {
            Some(path) => ProjectConfig::load(path)?,
            None => ProjectConfig::default(),
        };

        let mut attribute_dirs = project.attribute_dirs;
        attribute_dirs.extend(args.attribute_dirs);

        let extensions = if project.extensions.is_empty() {
            vec![DEFAULT_EXTENSION.to_string()]
        } else {
            project.extensions
        };

        Ok(Config {
            fixtures: args.fixtures,
            user_attribute_dir: dirs::config_dir()
                .map(|config_dir| config_dir.join("attr-verify").join("attributes")),
            attribute_dirs,
            marker_policy: args
                .marker_policy
                .or(project.marker_policy)
                .unwrap_or_default(),
            match_mode: args.match_mode.or(project.match_mode).unwrap_or_default(),
            extensions,
            format: args.format,
            watch: args.watch,
            log_level: args.log_level,
            project_config_path,
        })
    }

    pub fn has_project_config(&self) -> bool {
        self.project_config_path.is_some()
    }
}
