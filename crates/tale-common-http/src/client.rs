// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Platform string in `{os}-{arch}` format, e.g. "linux-x86_64".
///
/// Derived at compile time from target configuration.
pub const PLATFORM: &str = env!("TALE_PLATFORM");

/// Creates a new HTTP client builder with the standard Tale User-Agent header.
///
/// # Example
/// ```ignore
/// let client = tale_common_http::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client with a custom timeout and the standard User-Agent.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).build()
}

/// Returns the standard Tale User-Agent string.
///
/// Format: `tale/{platform}/{version}`
pub fn user_agent() -> String {
	format!("tale/{}/{}", PLATFORM, env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		assert!(ua.starts_with("tale/"));
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 3);
		assert_eq!(parts[0], "tale");
		assert_eq!(parts[1], PLATFORM);
		assert_eq!(parts[2], env!("CARGO_PKG_VERSION"));
	}

	#[test]
	fn builds_client_with_timeout() {
		assert!(new_client_with_timeout(Duration::from_secs(5)).is_ok());
	}
}
