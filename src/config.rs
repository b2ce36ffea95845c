//! Ledger configuration

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Difficulty used when none is configured
pub const DEFAULT_DIFFICULTY: usize = 4;

/// A SHA-256 hex digest has 64 characters
pub const MAX_DIFFICULTY: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid difficulty {0}: must be between 1 and 64")]
    InvalidDifficulty(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Leading zero hex characters required of every mined block hash
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty: usize) -> Result<Self, ConfigError> {
        LedgerConfig { difficulty }.validated()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(contents)?;
        config.validated()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::InvalidDifficulty(self.difficulty));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        assert_eq!(LedgerConfig::default().difficulty, DEFAULT_DIFFICULTY);
    }

    #[test]
    fn test_from_toml_str() {
        let config = LedgerConfig::from_toml_str("difficulty = 2").unwrap();
        assert_eq!(config.difficulty, 2);

        let config = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn test_invalid_difficulty() {
        assert!(matches!(
            LedgerConfig::from_toml_str("difficulty = 0"),
            Err(ConfigError::InvalidDifficulty(0))
        ));
        assert!(matches!(
            LedgerConfig::with_difficulty(65),
            Err(ConfigError::InvalidDifficulty(65))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("difficulty = \"high\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "difficulty = 3").unwrap();

        let config = LedgerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.difficulty, 3);

        assert!(matches!(
            LedgerConfig::from_file(file.path().with_extension("missing")),
            Err(ConfigError::Io(_))
        ));
    }
}
