// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cache of the last flag set fetched from the flag service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tale_flags_core::{Flag, FlagSet};
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Published whenever a fetch changes the cached flag set.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagsChanged {
	/// Names added, removed or modified, in name order.
	pub changed: Vec<String>,
	pub at: DateTime<Utc>,
}

/// Thread-safe snapshot of remote flag state.
///
/// Reads are synchronous so flag checks never wait on the network.
#[derive(Debug, Clone)]
pub struct FlagCache {
	inner: Arc<FlagCacheInner>,
}

#[derive(Debug)]
struct FlagCacheInner {
	flags: RwLock<FlagSet>,
	last_updated: RwLock<Option<DateTime<Utc>>>,
	sender: broadcast::Sender<FlagsChanged>,
}

impl FlagCache {
	pub fn new() -> Self {
		let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
		Self {
			inner: Arc::new(FlagCacheInner {
				flags: RwLock::new(FlagSet::new()),
				last_updated: RwLock::new(None),
				sender,
			}),
		}
	}

	/// Replaces the cached set and returns the names that changed.
	///
	/// Subscribers are notified only when something changed.
	pub fn replace(&self, flags: FlagSet) -> Vec<String> {
		let now = Utc::now();
		let changed = {
			let mut current = self.inner.flags.write();
			let changed = current.changed_keys(&flags);
			*current = flags;
			changed
		};
		*self.inner.last_updated.write() = Some(now);

		if !changed.is_empty() {
			debug!(count = changed.len(), "remote flags changed");
			// No receivers is fine
			let _ = self.inner.sender.send(FlagsChanged {
				changed: changed.clone(),
				at: now,
			});
		}
		changed
	}

	pub fn get(&self, name: &str) -> Option<Flag> {
		self.inner.flags.read().get(name).cloned()
	}

	pub fn snapshot(&self) -> FlagSet {
		self.inner.flags.read().clone()
	}

	pub fn len(&self) -> usize {
		self.inner.flags.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.flags.read().is_empty()
	}

	/// Time of the last successful replace.
	pub fn last_updated(&self) -> Option<DateTime<Utc>> {
		*self.inner.last_updated.read()
	}

	pub fn subscribe(&self) -> broadcast::Receiver<FlagsChanged> {
		self.inner.sender.subscribe()
	}
}

impl Default for FlagCache {
	fn default() -> Self {
		Self::new()
	}
}
