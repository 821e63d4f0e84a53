// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flag context behavior.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REFRESH_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextConfigLayer {
	pub refresh_delay_ms: Option<u64>,
}

impl ContextConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.refresh_delay_ms.is_some() {
			self.refresh_delay_ms = other.refresh_delay_ms;
		}
	}

	pub fn finalize(self) -> ContextConfig {
		ContextConfig {
			refresh_delay: Duration::from_millis(
				self.refresh_delay_ms.unwrap_or(DEFAULT_REFRESH_DELAY_MS),
			),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
	/// Wait applied by a refresh when no remote client is ready.
	pub refresh_delay: Duration,
}

impl Default for ContextConfig {
	fn default() -> Self {
		Self {
			refresh_delay: Duration::from_millis(DEFAULT_REFRESH_DELAY_MS),
		}
	}
}
