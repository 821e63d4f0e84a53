// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::FlagValue;

/// A named toggle with an optional payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
	pub name: String,
	pub enabled: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<FlagValue>,
}

impl Flag {
	pub fn new(name: impl Into<String>, enabled: bool) -> Self {
		Self {
			name: name.into(),
			enabled,
			value: None,
		}
	}

	pub fn with_value(mut self, value: impl Into<FlagValue>) -> Self {
		self.value = Some(value.into());
		self
	}
}

/// Flags keyed by name. Names are unique; inserting an existing name
/// replaces the previous flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet {
	flags: BTreeMap<String, Flag>,
}

impl FlagSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, flag: Flag) -> Option<Flag> {
		self.flags.insert(flag.name.clone(), flag)
	}

	pub fn get(&self, name: &str) -> Option<&Flag> {
		self.flags.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.flags.contains_key(name)
	}

	/// Enabled state of `name`; unknown names are disabled.
	pub fn is_enabled(&self, name: &str) -> bool {
		self.flags.get(name).is_some_and(|f| f.enabled)
	}

	/// Flips the enabled state of `name` and returns the new state.
	///
	/// An absent flag is treated as disabled, so toggling creates it enabled.
	pub fn toggle(&mut self, name: &str) -> bool {
		let flag = self
			.flags
			.entry(name.to_string())
			.or_insert_with(|| Flag::new(name, false));
		flag.enabled = !flag.enabled;
		flag.enabled
	}

	pub fn len(&self) -> usize {
		self.flags.len()
	}

	pub fn is_empty(&self) -> bool {
		self.flags.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Flag> {
		self.flags.values()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.flags.keys().map(String::as_str)
	}

	/// Names whose flag was added, removed or modified between `self` and
	/// `other`, in name order.
	pub fn changed_keys(&self, other: &FlagSet) -> Vec<String> {
		let mut changed: Vec<String> = self
			.flags
			.iter()
			.filter(|(name, flag)| other.flags.get(*name) != Some(*flag))
			.map(|(name, _)| name.clone())
			.collect();

		changed.extend(
			other
				.flags
				.keys()
				.filter(|name| !self.flags.contains_key(*name))
				.cloned(),
		);
		changed.sort();
		changed
	}
}

impl FromIterator<Flag> for FlagSet {
	fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
		let mut set = FlagSet::new();
		for flag in iter {
			set.insert(flag);
		}
		set
	}
}

impl IntoIterator for FlagSet {
	type Item = Flag;
	type IntoIter = std::collections::btree_map::IntoValues<String, Flag>;

	fn into_iter(self) -> Self::IntoIter {
		self.flags.into_values()
	}
}
