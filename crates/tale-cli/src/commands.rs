// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand handlers.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use tale_flags::{
	DemoFlagContext, FlagContext, FlagContextBuilder, FlagSummary, FlagValue, RemoteFlagClient,
	RemoteOutcome, Traits,
};
use tale_flags_config::FlagsConfig;
use tracing::warn;

/// Context builder wired from configuration. The remote client is only
/// created when an environment identifier is configured.
pub fn context_builder(config: &FlagsConfig) -> Result<FlagContextBuilder> {
	let mut builder = FlagContext::builder()
		.environment_label(config.environment_label())
		.refresh_delay(config.context.refresh_delay);

	if let Some(environment_id) = &config.remote.environment_id {
		let remote = RemoteFlagClient::builder()
			.environment_id(environment_id)
			.api_url(&config.remote.api_url)
			.request_timeout(config.remote.request_timeout)
			.build()
			.context("failed to create remote flag client")?;
		builder = builder.remote(remote);
	}

	Ok(builder)
}

/// Runs the context's initialization. Failure leaves the context on
/// fallback flags, so it is reported but not returned.
pub async fn initialize(flags: &FlagContext) {
	if let Err(e) = flags.initialize().await {
		warn!(error = %e, "remote flags unavailable");
	}
}

/// Builds a read-only context and initializes it.
pub async fn connect(builder: FlagContextBuilder) -> FlagContext {
	let flags = builder.build();
	initialize(&flags).await;
	flags
}

pub fn status(flags: &FlagContext) -> String {
	format!(
		"Environment: {}\nConnection:  {}\nLoading:     {}",
		flags.environment_label(),
		flags.connection_status(),
		if flags.is_loading() { "yes" } else { "no" },
	)
}

pub fn list(flags: &FlagContext) -> String {
	render_catalog(&flags.catalog())
}

pub fn check(flags: &FlagContext, flag: &str) -> String {
	let state = if flags.has_feature(flag) {
		"enabled"
	} else {
		"disabled"
	};
	format!("{flag}: {state}")
}

pub fn value(flags: &FlagContext, flag: &str, default: &str) -> String {
	flags
		.get_value(flag, FlagValue::parse_loose(default))
		.to_string()
}

pub async fn identify(flags: &FlagContext, user_id: &str, traits: &[String]) -> Result<String> {
	let traits = parse_traits(traits)?;
	let outcome = flags.identify_user(user_id, traits).await?;
	Ok(describe(outcome, &format!("identified {user_id}")))
}

pub async fn logout(flags: &FlagContext) -> Result<String> {
	let outcome = flags.logout().await?;
	Ok(describe(outcome, "logged out"))
}

pub async fn refresh(flags: &FlagContext) -> Result<String> {
	let outcome = flags.refresh_flags().await?;
	Ok(describe(outcome, "flags refreshed"))
}

/// Toggles each flag in turn and renders the resulting catalog.
pub fn toggle(demo: &DemoFlagContext, flags: &[String]) -> String {
	let mut out = String::new();
	for flag in flags {
		let enabled = demo.toggle_flag(flag);
		let _ = writeln!(out, "{flag} -> {}", if enabled { "on" } else { "off" });
	}
	out.push_str(&render_catalog(&demo.catalog()));
	out
}

fn describe(outcome: RemoteOutcome, applied: &str) -> String {
	match outcome {
		RemoteOutcome::Applied => applied.to_string(),
		RemoteOutcome::Skipped => "skipped: remote flags not ready".to_string(),
	}
}

/// Parses `key=value` pairs. Values are read as bool, integer, float or
/// string, in that order.
pub fn parse_traits(raw: &[String]) -> Result<Traits> {
	let mut traits = Traits::new();
	for pair in raw {
		let Some((key, value)) = pair.split_once('=') else {
			bail!("trait '{pair}' is not in key=value form");
		};
		let key = key.trim();
		if key.is_empty() {
			bail!("trait '{pair}' has an empty key");
		}
		traits.insert(key.to_string(), FlagValue::parse_loose(value.trim()));
	}
	Ok(traits)
}

pub fn render_catalog(flags: &[FlagSummary]) -> String {
	let width = flags
		.iter()
		.map(|f| f.definition.key.len())
		.max()
		.unwrap_or(0);

	let mut out = String::new();
	for flag in flags {
		let state = if flag.enabled { "on " } else { "off" };
		let value = flag
			.value
			.as_ref()
			.map(|v| format!(" = {v}"))
			.unwrap_or_default();
		let _ = writeln!(
			out,
			"{:<width$}  {state}  {}{value}",
			flag.definition.key, flag.definition.name,
		);
	}
	out
}
