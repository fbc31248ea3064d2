//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::core::project::Project;
use crate::pipeline::PaginationMode;

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// cfadmin configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name recorded on review actions
    pub reviewer: Option<String>,

    /// Rows per page in list views
    pub page_limit: Option<usize>,

    /// Whether the data source pages (server) or the console does (client)
    pub pagination: Option<PaginationMode>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let project = Project::discover().ok();
        Self::load_for(project.as_ref())
    }

    /// Load configuration for an already discovered project
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/cfadmin/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 2. Project config (.cfadmin/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 3. Environment variables
        config.merge(Self::from_env());

        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    fn from_env() -> Config {
        let mut config = Config::default();
        if let Ok(reviewer) = std::env::var("CFADMIN_REVIEWER") {
            config.reviewer = Some(reviewer);
        }
        if let Ok(limit) = std::env::var("CFADMIN_PAGE_LIMIT") {
            match limit.trim().parse::<usize>() {
                Ok(n) => config.page_limit = Some(n),
                Err(_) => warn!(value = %limit, "ignoring invalid CFADMIN_PAGE_LIMIT"),
            }
        }
        if let Ok(mode) = std::env::var("CFADMIN_PAGINATION") {
            match mode.parse::<PaginationMode>() {
                Ok(m) => config.pagination = Some(m),
                Err(e) => warn!(error = %e, "ignoring invalid CFADMIN_PAGINATION"),
            }
        }
        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cfadmin")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.reviewer.is_some() {
            self.reviewer = other.reviewer;
        }
        if other.page_limit.is_some() {
            self.page_limit = other.page_limit;
        }
        if other.pagination.is_some() {
            self.pagination = other.pagination;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Get the reviewer name, falling back to git config or username
    pub fn reviewer(&self) -> String {
        if let Some(ref reviewer) = self.reviewer {
            return reviewer.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    pub fn pagination(&self) -> PaginationMode {
        self.pagination.unwrap_or_default()
    }
}
