// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use serde::{Deserialize, Serialize};

/// Label shown in place of the environment identifier when none is configured.
pub const FALLBACK_ENVIRONMENT_LABEL: &str = "local-fallback";

/// Lifecycle of a remote flag client.
///
/// `Uninitialized → Initializing → Ready`, or `→ Failed`. Failed is
/// terminal for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
	Uninitialized,
	Initializing,
	Ready,
	Failed { reason: String },
}

impl Readiness {
	pub fn is_ready(&self) -> bool {
		matches!(self, Readiness::Ready)
	}
}

impl fmt::Display for Readiness {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Readiness::Uninitialized => write!(f, "uninitialized"),
			Readiness::Initializing => write!(f, "initializing"),
			Readiness::Ready => write!(f, "ready"),
			Readiness::Failed { reason } => write!(f, "failed: {reason}"),
		}
	}
}

/// Operator-facing view of the connection to the flag service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
	/// No environment identifier configured; fallback flags only.
	NotConfigured,
	Pending,
	Connected,
	Error { message: String },
}

impl ConnectionStatus {
	/// Derives the status from a remote client's readiness, or `None` when no
	/// remote client exists.
	pub fn from_readiness(readiness: Option<&Readiness>) -> Self {
		match readiness {
			None => ConnectionStatus::NotConfigured,
			Some(Readiness::Uninitialized | Readiness::Initializing) => ConnectionStatus::Pending,
			Some(Readiness::Ready) => ConnectionStatus::Connected,
			Some(Readiness::Failed { reason }) => ConnectionStatus::Error {
				message: reason.clone(),
			},
		}
	}
}

impl fmt::Display for ConnectionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConnectionStatus::NotConfigured => write!(f, "not configured"),
			ConnectionStatus::Pending => write!(f, "pending"),
			ConnectionStatus::Connected => write!(f, "connected"),
			ConnectionStatus::Error { message } => write!(f, "error: {message}"),
		}
	}
}
