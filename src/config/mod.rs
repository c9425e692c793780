//! Wiki configuration (`quire.toml`).
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── auth       # [auth]
//! │   ├── lock       # [lock]
//! │   ├── render     # [render]
//! │   ├── serve      # [serve]
//! │   └── site       # [site]
//! ├── error          # ConfigError
//! └── mod.rs         # WikiConfig (this file)
//! ```
//!
//! The config file is optional. Values are layered: defaults, then the file
//! given by `--config`, then command-line flags.

mod error;
mod section;

pub use error::ConfigError;
pub use section::{AuthConfig, LockConfig, RenderConfig, ServeConfig, SiteConfig};

use crate::{cli::Cli, lock::MAX_TTL, log};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Canonical wiki root (from the command line, never from the file)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl WikiConfig {
    /// Build the effective configuration from command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        config.root = cli
            .root
            .canonicalize()
            .map_err(|err| ConfigError::Io(cli.root.clone(), err))?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Command-line flags win over the file.
    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.serve.interface, cli.interface.as_ref());
        Self::update_option(&mut self.serve.port, cli.port.as_ref());
        Self::update_option(&mut self.render.minify, cli.minify.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "wiki root `{}` is not a directory",
                self.root.display()
            )));
        }
        if self.lock.ttl == 0 {
            return Err(ConfigError::Validation("lock.ttl must be positive".into()));
        }
        if self.lock.ttl() > MAX_TTL {
            return Err(ConfigError::Validation(format!(
                "lock.ttl must be at most {} seconds",
                MAX_TTL.as_secs()
            )));
        }
        if self.serve.workers == 0 {
            return Err(ConfigError::Validation(
                "serve.workers must be positive".into(),
            ));
        }
        if !AuthConfig::is_valid_cookie_name(&self.auth.cookie) {
            return Err(ConfigError::Validation(format!(
                "auth.cookie `{}` is not a valid cookie name",
                self.auth.cookie
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub fn test_parse_config(content: &str) -> WikiConfig {
    let (parsed, ignored) = WikiConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn valid(root: &Path) -> WikiConfig {
        WikiConfig {
            root: root.to_path_buf(),
            ..WikiConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.site.title, "wiki");
        assert!(config.render.minify);
        assert_eq!(config.lock.ttl, 60);
    }

    #[test]
    fn test_unknown_fields_are_collected() {
        let (config, ignored) =
            WikiConfig::parse_with_ignored("[serve]\nport = 9000\nwatch = true\n[extra]\nx = 1")
                .unwrap();
        assert_eq!(config.serve.port, 9000);
        assert_eq!(ignored, ["serve.watch", "extra"]);
    }

    #[test]
    fn test_invalid_toml() {
        let result = WikiConfig::parse_with_ignored("[serve\nport = 1");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validate() {
        let temp = TempDir::new().unwrap();
        assert!(valid(temp.path()).validate().is_ok());

        let mut config = valid(temp.path());
        config.lock.ttl = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = valid(temp.path());
        config.lock.ttl = MAX_TTL.as_secs();
        assert!(config.validate().is_ok());
        config.lock.ttl = MAX_TTL.as_secs() + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.lock.ttl = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = valid(temp.path());
        config.serve.workers = 0;
        assert!(config.validate().is_err());

        let mut config = valid(temp.path());
        config.auth.cookie = "bad cookie".into();
        assert!(config.validate().is_err());

        let config = valid(&temp.path().join("missing"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_layers_cli_over_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("quire.toml");
        fs::write(&config_path, "[serve]\nport = 9000\n[render]\nminify = true").unwrap();

        let root = temp.path().display().to_string();
        let config_arg = config_path.display().to_string();
        let cli = Cli::parse_from([
            "quire",
            root.as_str(),
            "-C",
            config_arg.as_str(),
            "-p",
            "9100",
            "--minify=false",
        ]);

        let config = WikiConfig::load(&cli).unwrap();
        assert_eq!(config.serve.port, 9100);
        assert!(!config.render.minify);
        assert_eq!(config.root, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_load_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("missing").display().to_string();
        let cli = Cli::parse_from(["quire", root.as_str()]);
        assert!(matches!(WikiConfig::load(&cli), Err(ConfigError::Io(..))));
    }
}
