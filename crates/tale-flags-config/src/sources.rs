// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment variables and
//! command-line overrides.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::FlagsConfigLayer;
use crate::sections::{ContextConfigLayer, LoggingConfigLayer, RemoteConfigLayer};

pub const ENV_ENVIRONMENT_ID: &str = "TALE_FLAGS_ENVIRONMENT_ID";
pub const ENV_API_URL: &str = "TALE_FLAGS_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TALE_FLAGS_REQUEST_TIMEOUT_SECS";
pub const ENV_REFRESH_DELAY_MS: &str = "TALE_FLAGS_REFRESH_DELAY_MS";
pub const ENV_LOG_LEVEL: &str = "TALE_FLAGS_LOG_LEVEL";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	CommandLine = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<FlagsConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<FlagsConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(FlagsConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// `$XDG_CONFIG_HOME/tale/flags.toml`, or `None` when the platform has
	/// no config directory.
	pub fn user() -> Option<Self> {
		default_config_path().map(Self::new)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<FlagsConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(FlagsConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: FlagsConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Default location of the user config file.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("tale").join("flags.toml"))
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable source.
///
/// Convention: TALE_FLAGS_<FIELD>. Empty values are treated as unset.
pub struct EnvSource {
	lookup: EnvLookup,
}

impl EnvSource {
	pub fn new() -> Self {
		Self::with_lookup(|name| std::env::var(name).ok())
	}

	/// Reads variables through `lookup` instead of the process environment.
	pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
		Self {
			lookup: Box::new(lookup),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn var_u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(name) {
			Some(v) => v
				.trim()
				.parse()
				.map(Some)
				.map_err(|_| ConfigError::invalid_value(name, format!("invalid u64 value '{v}'"))),
			None => Ok(None),
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<FlagsConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(FlagsConfigLayer {
			remote: Some(RemoteConfigLayer {
				environment_id: self.var(ENV_ENVIRONMENT_ID),
				api_url: self.var(ENV_API_URL),
				request_timeout_secs: self.var_u64(ENV_REQUEST_TIMEOUT_SECS)?,
			}),
			context: Some(ContextConfigLayer {
				refresh_delay_ms: self.var_u64(ENV_REFRESH_DELAY_MS)?,
			}),
			logging: Some(LoggingConfigLayer {
				level: self.var(ENV_LOG_LEVEL),
			}),
		})
	}
}

/// Values given as command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub environment_id: Option<String>,
	pub api_url: Option<String>,
	pub log_level: Option<String>,
}

impl ConfigSource for CliOverrides {
	fn name(&self) -> &'static str {
		"command-line"
	}

	fn precedence(&self) -> Precedence {
		Precedence::CommandLine
	}

	fn load(&self) -> Result<FlagsConfigLayer, ConfigError> {
		Ok(FlagsConfigLayer {
			remote: Some(RemoteConfigLayer {
				environment_id: self.environment_id.clone(),
				api_url: self.api_url.clone(),
				request_timeout_secs: None,
			}),
			context: None,
			logging: Some(LoggingConfigLayer {
				level: self.log_level.clone(),
			}),
		})
	}
}
