// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as produced by a single source.

use serde::{Deserialize, Serialize};

use crate::sections::{ContextConfigLayer, LoggingConfigLayer, RemoteConfigLayer};

/// One source's view of the configuration. Unset fields defer to
/// lower-precedence sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FlagsConfigLayer {
	pub remote: Option<RemoteConfigLayer>,
	pub context: Option<ContextConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl FlagsConfigLayer {
	/// Overlays `other` on top of `self`.
	pub fn merge(&mut self, other: Self) {
		if let Some(other_remote) = other.remote {
			let remote = self.remote.get_or_insert_with(Default::default);
			remote.merge(other_remote);
		}
		if let Some(other_context) = other.context {
			let context = self.context.get_or_insert_with(Default::default);
			context.merge(other_context);
		}
		if let Some(other_logging) = other.logging {
			let logging = self.logging.get_or_insert_with(Default::default);
			logging.merge(other_logging);
		}
	}
}
