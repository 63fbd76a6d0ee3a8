//! Store configuration.
//!
//! Tells [`Bootstrap`](crate::Bootstrap) where the database lives and which
//! schema version the application expects. The file format is picked from
//! the extension: `.json` is read as JSON, anything else as YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! path: app.db
//! version: 3
//! create_if_missing: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Path that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Location and expected version of a store.
///
/// # Examples
///
/// ```
/// use lightrow_sqlite::StoreConfig;
///
/// let config: StoreConfig = serde_yaml::from_str("path: app.db\nversion: 2\n").unwrap();
/// assert_eq!(config.version, 2);
/// assert!(config.create_if_missing);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file, or `:memory:` for an in-memory store.
    pub path: PathBuf,
    /// Schema version of the application; must be at least 1.
    pub version: u32,
    /// Create the database file when it does not exist yet.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_create_if_missing() -> bool {
    true
}

impl StoreConfig {
    /// Configuration for a file-backed store.
    pub fn new(path: impl Into<PathBuf>, version: u32) -> Self {
        Self {
            path: path.into(),
            version,
            create_if_missing: true,
        }
    }

    /// Configuration for a private in-memory store.
    pub fn in_memory(version: u32) -> Self {
        Self::new(IN_MEMORY, version)
    }

    /// Returns `true` if the store lives in memory.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    /// Checks that the configuration can be used to open a store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] for an empty path or a version
    /// of 0, which SQLite reserves for a database that was never versioned.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig("path must not be empty".into()));
        }
        if self.version == 0 {
            return Err(StoreError::InvalidConfig("version must be at least 1".into()));
        }
        Ok(())
    }

    /// Loads a configuration from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read, or
    /// [`StoreError::Yaml`] / [`StoreError::Json`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let config = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(config)
    }

    /// Saves the configuration, as JSON for a `.json` path and YAML otherwise.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(std::fs::File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_complete() {
        let yaml = "path: data/app.db\nversion: 3\ncreate_if_missing: false\n";
        let config: StoreConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.path, PathBuf::from("data/app.db"));
        assert_eq!(config.version, 3);
        assert!(!config.create_if_missing);
    }

    #[test]
    fn test_validate() {
        assert!(StoreConfig::in_memory(1).validate().is_ok());
        assert!(matches!(
            StoreConfig::in_memory(0).validate(),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            StoreConfig::new("", 1).validate(),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_in_memory() {
        assert!(StoreConfig::in_memory(1).is_in_memory());
        assert!(!StoreConfig::new("app.db", 1).is_in_memory());
    }

    #[test]
    fn test_save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new("app.db", 4);

        for name in ["store.yml", "store.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(StoreConfig::load(&path).unwrap(), config);
        }

        let json = std::fs::read_to_string(dir.path().join("store.json")).unwrap();
        assert!(json.trim_start().starts_with('{'));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::load(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
