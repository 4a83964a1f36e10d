use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::PriorityLevel;

/// Configuration for requirement aggregation.
///
/// Controls how sub-analysis requirements are folded into their parents and
/// which level changes are accepted when modifying an existing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The cap applied to sub-analysis links that do not declare their own.
    ///
    /// The default, [`PriorityLevel::Mandatory`], performs no clamping.
    default_cap: PriorityLevel,

    /// Which level changes are accepted for values already present.
    pub level_updates: LevelUpdatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_cap: default_cap(),
            level_updates: LevelUpdatePolicy::default(),
        }
    }
}

/// Rule deciding whether the level of an existing value may change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LevelUpdatePolicy {
    /// Any level may replace any other.
    #[default]
    Unrestricted,
    /// A level may only be replaced by one at least as strong.
    StrengthenOnly,
}

impl LevelUpdatePolicy {
    /// Whether the policy allows replacing `current` with `new`.
    #[must_use]
    pub const fn permits(self, current: PriorityLevel, new: PriorityLevel) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::StrengthenOnly => !current.is_stronger_than(new),
        }
    }
}

/// Errors raised while loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file content is not a valid configuration.
    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        /// The file that was parsed.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// The configuration could not be encoded as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("Failed to write config file {}: {source}", .path.display())]
    Write {
        /// The file that was written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The cap applied to sub-analysis links that do not declare their own.
    #[must_use]
    pub const fn default_cap(&self) -> PriorityLevel {
        self.default_cap
    }

    /// Sets the cap applied to sub-analysis links that do not declare their
    /// own.
    pub const fn set_default_cap(&mut self, cap: PriorityLevel) {
        self.default_cap = cap;
    }

    /// Resolves the cap for a sub-analysis link.
    #[must_use]
    pub fn effective_cap(&self, cap: Option<PriorityLevel>) -> PriorityLevel {
        cap.unwrap_or(self.default_cap)
    }
}

const fn default_cap() -> PriorityLevel {
    PriorityLevel::Mandatory
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_cap")]
        default_cap: PriorityLevel,

        #[serde(default)]
        level_updates: LevelUpdatePolicy,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                default_cap,
                level_updates,
            } => Self {
                default_cap,
                level_updates,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            default_cap: config.default_cap,
            level_updates: config.level_updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use test_case::test_case;

    use super::*;
    use crate::domain::PriorityLevel::{Informative, Mandatory, Optional};

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ndefault_cap = \"optional\"\nlevel_updates = \"strengthen-only\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.default_cap(), Optional);
        assert_eq!(config.level_updates, LevelUpdatePolicy::StrengthenOnly);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
        assert!(error.to_string().starts_with("Failed to read config file"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ndefault_cap = \"required\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn load_unknown_version_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"99\"\n").unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = Config::default();
        config.set_default_cap(Informative);
        config.level_updates = LevelUpdatePolicy::StrengthenOnly;
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("_version = \"1\""));
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn effective_cap_prefers_explicit_cap() {
        let mut config = Config::default();
        assert_eq!(config.effective_cap(None), Mandatory);

        config.set_default_cap(Optional);
        assert_eq!(config.effective_cap(None), Optional);
        assert_eq!(config.effective_cap(Some(Informative)), Informative);
    }

    #[test_case(LevelUpdatePolicy::Unrestricted, Mandatory, Informative, true; "unrestricted weakens")]
    #[test_case(LevelUpdatePolicy::StrengthenOnly, Mandatory, Informative, false; "strict refuses weakening")]
    #[test_case(LevelUpdatePolicy::StrengthenOnly, Optional, Optional, true; "strict allows same level")]
    #[test_case(LevelUpdatePolicy::StrengthenOnly, Informative, Mandatory, true; "strict allows strengthening")]
    fn policy_permits(
        policy: LevelUpdatePolicy,
        current: PriorityLevel,
        new: PriorityLevel,
        expected: bool,
    ) {
        assert_eq!(policy.permits(current, new), expected);
    }
}
