// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the flag service's client API (Flagsmith-compatible v1).
//!
//! # Endpoints
//!
//! - `GET flags/` - environment flags
//! - `POST identities/` - identify a user with traits, returns their flags
//! - `GET identities/?identifier=<id>` - flags for a known identity

use serde::{Deserialize, Serialize};

use crate::{Flag, FlagSet, FlagValue, UserIdentity};

/// Header carrying the environment identifier.
pub const ENVIRONMENT_KEY_HEADER: &str = "X-Environment-Key";

/// Public edge API of the flag service.
pub const DEFAULT_API_URL: &str = "https://edge.api.flagsmith.com/api/v1/";

/// Feature metadata attached to a flag state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRef {
	#[serde(default)]
	pub id: Option<u64>,
	pub name: String,
	#[serde(default, rename = "type")]
	pub feature_type: Option<String>,
}

/// One flag as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagStateResponse {
	pub feature: FeatureRef,
	pub enabled: bool,
	#[serde(default)]
	pub feature_state_value: serde_json::Value,
}

impl From<FlagStateResponse> for Flag {
	fn from(state: FlagStateResponse) -> Self {
		Flag {
			name: state.feature.name,
			enabled: state.enabled,
			value: FlagValue::from_json(state.feature_state_value),
		}
	}
}

/// Collects service flag states into a [`FlagSet`].
pub fn into_flag_set(states: Vec<FlagStateResponse>) -> FlagSet {
	states.into_iter().map(Flag::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitPayload {
	pub trait_key: String,
	pub trait_value: serde_json::Value,
}

/// Body of `POST identities/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRequest {
	pub identifier: String,
	pub traits: Vec<TraitPayload>,
}

impl From<&UserIdentity> for IdentityRequest {
	fn from(identity: &UserIdentity) -> Self {
		Self {
			identifier: identity.identifier.clone(),
			traits: identity
				.traits
				.iter()
				.map(|(k, v)| TraitPayload {
					trait_key: k.clone(),
					trait_value: v.to_json(),
				})
				.collect(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityResponse {
	#[serde(default)]
	pub identifier: Option<String>,
	#[serde(default)]
	pub flags: Vec<FlagStateResponse>,
	#[serde(default)]
	pub traits: Vec<TraitPayload>,
}
