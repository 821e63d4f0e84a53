// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flag service connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tale_flags_core::api::DEFAULT_API_URL;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfigLayer {
	pub environment_id: Option<String>,
	pub api_url: Option<String>,
	pub request_timeout_secs: Option<u64>,
}

impl RemoteConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.environment_id.is_some() {
			self.environment_id = other.environment_id;
		}
		if other.api_url.is_some() {
			self.api_url = other.api_url;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> RemoteConfig {
		RemoteConfig {
			environment_id: self
				.environment_id
				.map(|id| id.trim().to_string())
				.filter(|id| !id.is_empty()),
			api_url: self
				.api_url
				.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
			request_timeout: Duration::from_secs(
				self.request_timeout_secs
					.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
			),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
	/// `None` disables the remote client entirely.
	pub environment_id: Option<String>,
	pub api_url: String,
	pub request_timeout: Duration,
}

impl RemoteConfig {
	pub fn is_configured(&self) -> bool {
		self.environment_id.is_some()
	}
}

impl Default for RemoteConfig {
	fn default() -> Self {
		RemoteConfigLayer::default().finalize()
	}
}
