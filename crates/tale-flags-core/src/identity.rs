// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::FlagValue;

/// Named attributes attached to a user for targeted evaluation.
pub type Traits = BTreeMap<String, FlagValue>;

/// A user the flag service evaluates against.
///
/// Traits are passed through to the service as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
	pub identifier: String,
	#[serde(default)]
	pub traits: Traits,
}

impl UserIdentity {
	pub fn new(identifier: impl Into<String>) -> Self {
		Self {
			identifier: identifier.into(),
			traits: Traits::new(),
		}
	}

	pub fn with_traits(mut self, traits: Traits) -> Self {
		self.traits = traits;
		self
	}

	pub fn with_trait(mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> Self {
		self.traits.insert(key.into(), value.into());
		self
	}

	/// Combines a re-identification with the current identity.
	///
	/// The same identifier keeps its existing traits, overwritten by any new
	/// ones. A different identifier replaces the identity entirely.
	pub fn merged_with(self, next: UserIdentity) -> UserIdentity {
		if self.identifier != next.identifier {
			return next;
		}
		let mut traits = self.traits;
		traits.extend(next.traits);
		UserIdentity {
			identifier: next.identifier,
			traits,
		}
	}
}
