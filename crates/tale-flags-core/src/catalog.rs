// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flags known to the story reader, with display metadata and the defaults
//! used when the flag service cannot be reached.

use serde::Serialize;

use crate::{Flag, FlagSet, FlagValue};

pub const ENABLE_DYNAMIC_THEMES: &str = "enable_dynamic_themes";
pub const USE_FIRST_PERSON_NARRATIVE: &str = "use_first_person_narrative";
pub const ENABLE_DETECTIVE_STORY: &str = "enable_detective_story";
pub const SHOW_CONTINUE_READING: &str = "show_continue_reading";
pub const ENABLE_STORY_SHARING: &str = "enable_story_sharing";
pub const IS_ADMIN: &str = "is_admin";
pub const HEADER: &str = "header";

/// A flag the application knows about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagDefinition {
	pub key: &'static str,
	pub name: &'static str,
	pub description: &'static str,
	pub default_enabled: bool,
	pub default_value: Option<&'static str>,
}

impl FlagDefinition {
	pub fn default_flag(&self) -> Flag {
		Flag {
			name: self.key.to_string(),
			enabled: self.default_enabled,
			value: self.default_value.map(FlagValue::from),
		}
	}
}

pub const STORY_FLAGS: &[FlagDefinition] = &[
	FlagDefinition {
		key: ENABLE_DYNAMIC_THEMES,
		name: "Dynamic Themes",
		description: "Enable theme changes based on story context",
		default_enabled: false,
		default_value: None,
	},
	FlagDefinition {
		key: USE_FIRST_PERSON_NARRATIVE,
		name: "First Person Narrative",
		description: "Use first person instead of second person narrative",
		default_enabled: false,
		default_value: None,
	},
	FlagDefinition {
		key: ENABLE_DETECTIVE_STORY,
		name: "Detective Story",
		description: "Enable the detective story in the catalog",
		default_enabled: false,
		default_value: None,
	},
	FlagDefinition {
		key: SHOW_CONTINUE_READING,
		name: "Continue Reading Section",
		description: "Show the continue reading section on the home page",
		default_enabled: true,
		default_value: None,
	},
	FlagDefinition {
		key: ENABLE_STORY_SHARING,
		name: "Story Sharing",
		description: "Allow users to share stories with others",
		default_enabled: false,
		default_value: None,
	},
	FlagDefinition {
		key: IS_ADMIN,
		name: "Admin Access",
		description: "Expose the flag dashboard and setup screens",
		default_enabled: true,
		default_value: None,
	},
	FlagDefinition {
		key: HEADER,
		name: "Header Banner",
		description: "Show the configurable header text",
		default_enabled: true,
		default_value: Some("xyz"),
	},
];

/// Returns the catalog entry for `key`, if the application knows it.
pub fn definition(key: &str) -> Option<&'static FlagDefinition> {
	STORY_FLAGS.iter().find(|d| d.key == key)
}

/// Fallback flag set seeded from the catalog defaults.
pub fn default_flags() -> FlagSet {
	STORY_FLAGS.iter().map(FlagDefinition::default_flag).collect()
}
