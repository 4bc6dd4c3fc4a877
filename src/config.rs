//! Configuration management for RAX VFS
//!
//! Separates storage settings that are fixed for the lifetime of a storage
//! from the initial forbidden-character policy (which can still be changed at
//! runtime until it is locked) and from the shell settings.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::storage::validation::{DEFAULT_FORBIDDEN_CHARS, SEPARATOR};

/// Complete configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct VfsConfig {
    #[serde(flatten)]
    pub storage: StorageSettings,

    #[serde(flatten)]
    pub policy: PolicyConfig,

    #[serde(flatten)]
    pub shell: ShellConfig,
}

/// Settings fixed when the storage is built
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    /// A read-only item cannot be removed either (ancestor removal excepted)
    pub read_only_is_undeletable: bool,

    /// Inserted between old and new content by `append_file`
    pub append_separator: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            read_only_is_undeletable: true,
            append_separator: "\n".to_string(),
        }
    }
}

/// Initial state of the lockable forbidden-character policy
/// Environment: RAX_VFS__FORBIDDEN_CHARS, RAX_VFS__STRICT_FORBID, RAX_VFS__LOCK_ON_START
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PolicyConfig {
    pub forbidden_chars: String,
    pub strict_forbid: bool,

    /// Lock the policy right after applying it
    pub lock_on_start: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            forbidden_chars: DEFAULT_FORBIDDEN_CHARS.to_string(),
            strict_forbid: false,
            lock_on_start: false,
        }
    }
}

/// Line shell settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ShellConfig {
    pub prompt: String,
    pub greeting: String,
    pub max_command_length: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "vfs> ".to_string(),
            greeting: "RAX virtual filesystem ready".to_string(),
            max_command_length: 4096,
        }
    }
}

impl VfsConfig {
    /// Load configuration from config.toml with environment overrides
    ///
    /// A missing file is not an error; every value has a default.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_paths = ["rax-vfs/config", "config"];

        let mut builder = Config::builder();
        for config_path in config_paths {
            builder = builder.add_source(File::with_name(config_path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("RAX_VFS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: VfsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;

        let config: VfsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.policy.forbidden_chars.contains(SEPARATOR) {
            return Err(config::ConfigError::Message(
                "forbidden_chars cannot contain the '/' separator".into(),
            ));
        }

        if self.shell.max_command_length == 0 {
            return Err(config::ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VfsConfig::default();
        assert!(config.storage.read_only_is_undeletable);
        assert_eq!(config.storage.append_separator, "\n");
        assert_eq!(config.policy.forbidden_chars, ":*?<>|");
        assert!(!config.policy.lock_on_start);
        assert_eq!(config.shell.max_command_length, 4096);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = VfsConfig::from_toml_str(
            r#"
            forbidden_chars = "<>"
            strict_forbid = true
            prompt = "> "
            "#,
        )
        .unwrap();
        assert_eq!(config.policy.forbidden_chars, "<>");
        assert!(config.policy.strict_forbid);
        assert_eq!(config.shell.prompt, "> ");
        assert!(config.storage.read_only_is_undeletable);
    }

    #[test]
    fn test_environment_overrides_typed_values() {
        // Only this test reads RAX_VFS__* variables.
        unsafe {
            std::env::set_var("RAX_VFS__STRICT_FORBID", "true");
            std::env::set_var("RAX_VFS__MAX_COMMAND_LENGTH", "100");
        }
        let loaded = VfsConfig::load();
        unsafe {
            std::env::remove_var("RAX_VFS__STRICT_FORBID");
            std::env::remove_var("RAX_VFS__MAX_COMMAND_LENGTH");
        }

        let config = loaded.unwrap();
        assert!(config.policy.strict_forbid);
        assert_eq!(config.shell.max_command_length, 100);
        assert_eq!(config.policy.forbidden_chars, ":*?<>|");
    }

    #[test]
    fn test_validation_rejects_separator() {
        assert!(VfsConfig::from_toml_str(r#"forbidden_chars = "a/""#).is_err());
        assert!(VfsConfig::from_toml_str("max_command_length = 0").is_err());
    }
}
