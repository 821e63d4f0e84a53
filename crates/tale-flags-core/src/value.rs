// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload carried by a flag or a user trait.
///
/// Serialized untagged, so a `FlagValue` reads and writes as plain JSON:
/// `true`, `42`, `1.5`, `"dark"`, `{"theme": "dark"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
	Bool(bool),
	Integer(i64),
	Float(f64),
	String(String),
	Map(BTreeMap<String, FlagValue>),
}

impl FlagValue {
	/// Converts an arbitrary JSON value.
	///
	/// `null` has no `FlagValue` and yields `None`. Arrays are kept as their
	/// JSON text.
	pub fn from_json(value: serde_json::Value) -> Option<Self> {
		match value {
			serde_json::Value::Null => None,
			serde_json::Value::Bool(b) => Some(FlagValue::Bool(b)),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => Some(FlagValue::Integer(i)),
				None => n.as_f64().map(FlagValue::Float),
			},
			serde_json::Value::String(s) => Some(FlagValue::String(s)),
			serde_json::Value::Array(_) => Some(FlagValue::String(value.to_string())),
			serde_json::Value::Object(map) => Some(FlagValue::Map(
				map
					.into_iter()
					.filter_map(|(k, v)| FlagValue::from_json(v).map(|v| (k, v)))
					.collect(),
			)),
		}
	}

	pub fn to_json(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			FlagValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			FlagValue::Integer(i) => Some(*i),
			_ => None,
		}
	}

	/// Numeric view; integers widen to `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			FlagValue::Integer(i) => Some(*i as f64),
			FlagValue::Float(f) => Some(*f),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			FlagValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&BTreeMap<String, FlagValue>> {
		match self {
			FlagValue::Map(m) => Some(m),
			_ => None,
		}
	}

	/// Parses a loosely typed string, as typed on a command line.
	///
	/// Tries bool, then integer, then float, and falls back to a string.
	pub fn parse_loose(raw: &str) -> Self {
		if let Ok(b) = raw.parse::<bool>() {
			return FlagValue::Bool(b);
		}
		if let Ok(i) = raw.parse::<i64>() {
			return FlagValue::Integer(i);
		}
		if let Ok(f) = raw.parse::<f64>() {
			if f.is_finite() {
				return FlagValue::Float(f);
			}
		}
		FlagValue::String(raw.to_string())
	}
}

impl fmt::Display for FlagValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FlagValue::Bool(b) => write!(f, "{b}"),
			FlagValue::Integer(i) => write!(f, "{i}"),
			FlagValue::Float(x) => write!(f, "{x}"),
			FlagValue::String(s) => write!(f, "{s}"),
			FlagValue::Map(_) => write!(f, "{}", self.to_json()),
		}
	}
}

impl From<bool> for FlagValue {
	fn from(value: bool) -> Self {
		FlagValue::Bool(value)
	}
}

impl From<i64> for FlagValue {
	fn from(value: i64) -> Self {
		FlagValue::Integer(value)
	}
}

impl From<i32> for FlagValue {
	fn from(value: i32) -> Self {
		FlagValue::Integer(value.into())
	}
}

impl From<f64> for FlagValue {
	fn from(value: f64) -> Self {
		FlagValue::Float(value)
	}
}

impl From<&str> for FlagValue {
	fn from(value: &str) -> Self {
		FlagValue::String(value.to_string())
	}
}

impl From<String> for FlagValue {
	fn from(value: String) -> Self {
		FlagValue::String(value)
	}
}

impl From<BTreeMap<String, FlagValue>> for FlagValue {
	fn from(value: BTreeMap<String, FlagValue>) -> Self {
		FlagValue::Map(value)
	}
}
