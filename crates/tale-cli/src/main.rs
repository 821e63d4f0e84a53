// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tale feature flags operator CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tale_flags_config::CliOverrides;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod version;

/// Tale flags - inspect and exercise the story reader's feature flags.
#[derive(Parser, Debug)]
#[command(
	name = "tale-flags",
	about = "Inspect and exercise Tale feature flags",
	version
)]
struct Args {
	/// Config file (defaults to $XDG_CONFIG_HOME/tale/flags.toml)
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Flag service environment identifier
	#[arg(long, global = true)]
	environment_id: Option<String>,

	/// Flag service API URL
	#[arg(long, global = true)]
	api_url: Option<String>,

	/// Log filter used when RUST_LOG is unset
	#[arg(long, global = true)]
	log_level: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show the environment and connection state
	Status,
	/// List catalog flags with their effective state
	List,
	/// Print whether a flag is enabled
	Check {
		flag: String,
	},
	/// Print a flag's value
	Value {
		flag: String,
		/// Printed when neither source has a value
		#[arg(long, default_value = "")]
		default: String,
	},
	/// Identify a user, optionally with traits
	Identify {
		user_id: String,
		/// Trait as key=value; repeatable
		#[arg(long = "trait", value_name = "KEY=VALUE")]
		traits: Vec<String>,
	},
	/// Forget the identified user
	Logout,
	/// Re-fetch flags from the flag service
	Refresh,
	/// Flip fallback flags locally and show the result
	Toggle {
		#[arg(required = true)]
		flags: Vec<String>,
	},
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = tale_flags_config::load_config(
		args.config.as_deref(),
		CliOverrides {
			environment_id: args.environment_id,
			api_url: args.api_url,
			log_level: args.log_level,
		},
	)?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	tracing::debug!(
		environment = %config.environment_label(),
		api_url = %config.remote.api_url,
		"starting tale-flags"
	);

	let builder = commands::context_builder(&config)?;

	let output = match args.command {
		Command::Status => commands::status(&commands::connect(builder).await),
		Command::List => commands::list(&commands::connect(builder).await),
		Command::Check { flag } => commands::check(&commands::connect(builder).await, &flag),
		Command::Value { flag, default } => {
			commands::value(&commands::connect(builder).await, &flag, &default)
		}
		Command::Identify { user_id, traits } => {
			commands::identify(&commands::connect(builder).await, &user_id, &traits).await?
		}
		Command::Logout => commands::logout(&commands::connect(builder).await).await?,
		Command::Refresh => commands::refresh(&commands::connect(builder).await).await?,
		Command::Toggle { flags } => {
			let demo = builder.build_demo();
			commands::initialize(&demo).await;
			commands::toggle(&demo, &flags)
		}
		Command::Version => version::format_version_info(),
	};

	println!("{}", output.trim_end());
	Ok(())
}
