// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Tale feature flags SDK and CLI.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment, CLI)
//! - Consistent environment variable naming (`TALE_FLAGS_*`)
//! - Validation of values before any client is built
//!
//! # Usage
//!
//! ```ignore
//! use tale_flags_config::{load_config, CliOverrides};
//!
//! let config = load_config(None, CliOverrides::default())?;
//! println!("flags environment: {}", config.environment_label());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::FlagsConfigLayer;
pub use sections::*;
pub use sources::{
	default_config_path, CliOverrides, ConfigSource, DefaultsSource, EnvSource, Precedence,
	TomlSource,
};

use std::path::Path;

use tale_flags_core::FALLBACK_ENVIRONMENT_LABEL;
use tracing::{debug, info};

/// Fully resolved flags configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagsConfig {
	pub remote: RemoteConfig,
	pub context: ContextConfig,
	pub logging: LoggingConfig,
}

impl FlagsConfig {
	/// The environment identifier, or the fallback label when unset.
	pub fn environment_label(&self) -> &str {
		self
			.remote
			.environment_id
			.as_deref()
			.unwrap_or(FALLBACK_ENVIRONMENT_LABEL)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Command-line overrides
/// 2. Environment variables (`TALE_FLAGS_*`)
/// 3. Config file (`config_path`, or `$XDG_CONFIG_HOME/tale/flags.toml`)
/// 4. Built-in defaults
pub fn load_config(
	config_path: Option<&Path>,
	cli: CliOverrides,
) -> Result<FlagsConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> =
		vec![Box::new(DefaultsSource), Box::new(EnvSource::new()), Box::new(cli)];

	match config_path {
		Some(path) => sources.push(Box::new(TomlSource::new(path))),
		None => {
			if let Some(user) = TomlSource::user() {
				sources.push(Box::new(user));
			}
		}
	}

	load_from_sources(sources)
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<FlagsConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = FlagsConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

fn finalize(layer: FlagsConfigLayer) -> Result<FlagsConfig, ConfigError> {
	let config = FlagsConfig {
		remote: layer.remote.unwrap_or_default().finalize(),
		context: layer.context.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		environment = %config.environment_label(),
		api_url = %config.remote.api_url,
		remote_enabled = config.remote.is_configured(),
		"flags configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &FlagsConfig) -> Result<(), ConfigError> {
	let api_url = &config.remote.api_url;
	if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
		return Err(ConfigError::invalid_value(
			"remote.api_url",
			format!("'{api_url}' is not an http(s) URL"),
		));
	}
	if config.remote.request_timeout.is_zero() {
		return Err(ConfigError::invalid_value(
			"remote.request_timeout_secs",
			"must be greater than zero",
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use std::time::Duration;

	use proptest::prelude::*;
	use tale_flags_core::api::DEFAULT_API_URL;

	fn toml_file(content: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	fn no_env() -> EnvSource {
		EnvSource::with_lookup(|_| None)
	}

	fn env_with(name: &'static str, value: &'static str) -> EnvSource {
		EnvSource::with_lookup(move |n| (n == name).then(|| value.to_string()))
	}

	#[test]
	fn test_defaults_only() {
		let config = load_from_sources(vec![Box::new(DefaultsSource), Box::new(no_env())]).unwrap();

		assert_eq!(config.remote.environment_id, None);
		assert_eq!(config.remote.api_url, DEFAULT_API_URL);
		assert_eq!(config.context.refresh_delay, Duration::from_millis(500));
		assert_eq!(config.logging.level, "info");
		assert_eq!(config.environment_label(), FALLBACK_ENVIRONMENT_LABEL);
	}

	#[test]
	fn test_file_overrides_defaults() {
		let file = toml_file(
			r#"
[remote]
environment_id = "env_file"
request_timeout_secs = 5

[context]
refresh_delay_ms = 50

[logging]
level = "debug"
"#,
		);

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
			Box::new(no_env()),
		])
		.unwrap();

		assert_eq!(config.environment_label(), "env_file");
		assert_eq!(config.remote.request_timeout, Duration::from_secs(5));
		assert_eq!(config.context.refresh_delay, Duration::from_millis(50));
		assert_eq!(config.logging.level, "debug");
	}

	#[test]
	fn test_env_overrides_file_regardless_of_order() {
		let file = toml_file("[remote]\nenvironment_id = \"env_file\"\n");

		let config = load_from_sources(vec![
			Box::new(env_with(sources::ENV_ENVIRONMENT_ID, "env_from_env")),
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert_eq!(config.remote.environment_id.as_deref(), Some("env_from_env"));
	}

	#[test]
	fn test_cli_overrides_env() {
		let cli = CliOverrides {
			environment_id: Some("env_cli".to_string()),
			..Default::default()
		};

		let config = load_from_sources(vec![
			Box::new(cli),
			Box::new(env_with(sources::ENV_ENVIRONMENT_ID, "env_from_env")),
		])
		.unwrap();

		assert_eq!(config.remote.environment_id.as_deref(), Some("env_cli"));
	}

	#[test]
	fn test_rejects_non_http_url() {
		let err = load_from_sources(vec![Box::new(env_with(
			sources::ENV_API_URL,
			"ftp://flags.example.com",
		))])
		.unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "remote.api_url"));
	}

	#[test]
	fn test_rejects_zero_timeout() {
		let file = toml_file("[remote]\nrequest_timeout_secs = 0\n");
		let err = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}

	#[test]
	fn test_explicit_missing_file_is_skipped() {
		let dir = tempfile::tempdir().unwrap();
		let config = load_from_sources(vec![
			Box::new(TomlSource::new(dir.path().join("flags.toml"))),
			Box::new(no_env()),
		])
		.unwrap();
		assert_eq!(config, FlagsConfig::default());
	}

	proptest! {
		#[test]
		fn higher_precedence_timeout_wins(file_secs in 1u64..1000, env_secs in 1u64..1000) {
			let file = toml_file(&format!("[remote]\nrequest_timeout_secs = {file_secs}\n"));
			let env_value = env_secs.to_string();
			let env = EnvSource::with_lookup(move |name| {
				(name == sources::ENV_REQUEST_TIMEOUT_SECS).then(|| env_value.clone())
			});

			let config = load_from_sources(vec![
				Box::new(env),
				Box::new(TomlSource::new(file.path())),
			])
			.unwrap();

			prop_assert_eq!(config.remote.request_timeout, Duration::from_secs(env_secs));
		}
	}
}
