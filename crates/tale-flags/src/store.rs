// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local fallback flag state.

use std::sync::Arc;

use parking_lot::RwLock;
use tale_flags_core::{catalog, FlagSet, FlagValue};
use tracing::info;

/// In-process flag values used before the remote client is ready, when it
/// fails, and for names it does not know.
///
/// Clones share the same state. Reads never fail: unknown names are
/// disabled and have no value.
#[derive(Debug, Clone, Default)]
pub struct FlagStore {
	flags: Arc<RwLock<FlagSet>>,
}

impl FlagStore {
	pub fn new(flags: FlagSet) -> Self {
		Self {
			flags: Arc::new(RwLock::new(flags)),
		}
	}

	/// A store seeded with the story reader's catalog defaults.
	pub fn with_catalog_defaults() -> Self {
		Self::new(catalog::default_flags())
	}

	/// Enabled state of `name`, or `false` if absent.
	pub fn read(&self, name: &str) -> bool {
		self.flags.read().is_enabled(name)
	}

	/// Stored value of `name`, if any.
	pub fn value(&self, name: &str) -> Option<FlagValue> {
		self.flags.read().get(name).and_then(|f| f.value.clone())
	}

	/// Flips `name` in place and returns the new state. Absent names start
	/// from `false`.
	pub fn toggle(&self, name: &str) -> bool {
		let enabled = self.flags.write().toggle(name);
		info!(flag = %name, enabled, "toggled fallback flag");
		enabled
	}

	pub fn snapshot(&self) -> FlagSet {
		self.flags.read().clone()
	}
}
