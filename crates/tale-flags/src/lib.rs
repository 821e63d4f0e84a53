// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Feature flags SDK for the Tale story reader.
//!
//! Flags come from a Flagsmith-compatible flag service when an environment
//! identifier is configured, and from a local fallback store otherwise.
//! Application code only talks to a [`FlagContext`], which decides per query
//! which source answers.
//!
//! # Features
//!
//! - **Synchronous queries**: `has_feature` and `get_value` never wait on the network
//! - **Local fallback**: catalog defaults answer `has_feature` before and without the remote service; `get_value` returns the caller's default
//! - **User identity**: identify and log out users for per-user flag evaluation
//! - **Change notifications**: subscribe to flag changes after each fetch
//! - **Demo overrides**: [`DemoFlagContext`] can toggle fallback flags in place
//!
//! # Example
//!
//! ```ignore
//! use tale_flags::{FlagContext, RemoteFlagClient, Traits};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let remote = RemoteFlagClient::builder()
//!         .environment_id("env_12345")
//!         .build()?;
//!
//!     let flags = FlagContext::builder()
//!         .remote(remote)
//!         .environment_label("env_12345")
//!         .build();
//!     flags.spawn_initialize();
//!
//!     if flags.has_feature("enable_dynamic_themes") {
//!         // apply theme
//!     }
//!
//!     flags.identify_user("user-123", Traits::new()).await?;
//!     flags.refresh_flags().await?;
//!     Ok(())
//! }
//! ```

mod cache;
mod context;
mod error;
mod remote;
mod store;

pub use cache::{FlagCache, FlagsChanged};
pub use context::{
	DemoFlagContext, FlagContext, FlagContextBuilder, FlagOverride, FlagQuery, FlagSummary,
	RemoteOutcome, DEFAULT_REFRESH_DELAY,
};
pub use error::{FlagsError, Result};
pub use remote::{
	ClientConfig, RemoteFlagClient, RemoteFlagClientBuilder, RemoteFlags, SharedRemoteFlags,
	DEFAULT_API_URL,
};
pub use store::FlagStore;

// Re-export core types for convenience
pub use tale_flags_core::{
	catalog, ConnectionStatus, Flag, FlagDefinition, FlagSet, FlagValue, Readiness, Traits,
	UserIdentity, FALLBACK_ENVIRONMENT_LABEL,
};
