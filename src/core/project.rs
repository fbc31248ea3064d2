//! Project discovery and structure
//!
//! A project is a directory holding `.cfadmin/` (configuration) and
//! `data/` (one JSON mirror file per backend collection).

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::entity::Record;
use crate::core::source::{JsonStore, SourceError};
use crate::entities::{Bank, Campaign, Language, Translation, Withdrawal};

/// Marker directory at the project root
pub const PROJECT_DIR: &str = ".cfadmin";

/// Collections created by `init`
pub const COLLECTIONS: &[&str] = &[
    Campaign::COLLECTION,
    Withdrawal::COLLECTION,
    Bank::COLLECTION,
    Language::COLLECTION,
    Translation::COLLECTION,
];

/// Represents a cfadmin project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .cfadmin/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }
        Self::write_structure(root, false)
    }

    /// Force initialization even if .cfadmin/ exists; data files are reset
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(root, true)
    }

    fn write_structure(root: PathBuf, overwrite_data: bool) -> Result<Self, ProjectError> {
        let io = |e: std::io::Error| ProjectError::IoError(e.to_string());
        let project = Self { root };

        std::fs::create_dir_all(project.config_dir()).map_err(io)?;
        std::fs::write(project.config_path(), Self::default_config()).map_err(io)?;

        std::fs::create_dir_all(project.data_dir()).map_err(io)?;
        for collection in COLLECTIONS {
            let path = project.collection_path(collection);
            if overwrite_data || !path.exists() {
                std::fs::write(&path, "[]\n").map_err(io)?;
            }
        }

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# cfadmin project configuration

# Name recorded on approvals and rejections (default: git user.name)
# reviewer: ""

# Rows per page in list views
# page_limit: 10

# Where paging happens: client (whole collection fetched) or server
# pagination: client

# Default output format (auto, tsv, json, yaml, csv, md, id)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .cfadmin configuration directory
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("config.yaml")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Mirror file for a collection
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir().join(format!("{}.json", collection))
    }

    /// Open the file-backed store for `T`
    pub fn store<T: Record>(&self) -> Result<JsonStore<T>, SourceError> {
        JsonStore::open(&self.collection_path(T::COLLECTION))
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a cfadmin project (searched from {searched_from:?}). Run 'cfadmin init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("cfadmin project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.config_dir().is_dir());
        assert!(project.config_path().exists());
        for collection in COLLECTIONS {
            let contents = std::fs::read_to_string(project.collection_path(collection)).unwrap();
            assert_eq!(contents.trim(), "[]");
        }
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_init_force_resets_data() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let banks = project.collection_path("banks");
        std::fs::write(&banks, r#"[{"id": "b1", "name": "Zenith"}]"#).unwrap();

        Project::init_force(tmp.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&banks).unwrap().trim(), "[]");
    }

    #[test]
    fn test_project_discover_finds_config_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_config_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_store_opens_collection() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let store = project.store::<Campaign>().unwrap();
        assert!(store.is_empty());
        assert_eq!(
            store.path().unwrap(),
            project.collection_path("campaigns").as_path()
        );
    }
}
