// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the flags SDK.

use thiserror::Error;

/// Flags SDK errors.
#[derive(Debug, Error)]
pub enum FlagsError {
	/// No environment identifier was supplied to the remote client.
	#[error("missing environment identifier")]
	MissingEnvironmentId,

	/// API URL could not be used.
	#[error("invalid API URL: {0}")]
	InvalidApiUrl(String),

	/// The single initialization attempt failed.
	#[error("initialization failed: {0}")]
	Initialization(String),

	/// The remote client has not completed initialization.
	#[error("remote flag client is not ready")]
	NotReady,

	/// The remote flag set has no flag with this name.
	#[error("flag not found: {0}")]
	FlagNotFound(String),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server returned an error response.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// Response body could not be parsed.
	#[error("failed to parse response: {0}")]
	ParseFailed(String),
}

impl FlagsError {
	/// Whether this is an expected miss rather than a fault.
	///
	/// The flag context substitutes fallback values for every evaluation
	/// error, but only faults are logged above debug level.
	pub fn is_expected_miss(&self) -> bool {
		matches!(self, FlagsError::NotReady | FlagsError::FlagNotFound(_))
	}
}

/// Result type alias for flags operations.
pub type Result<T> = std::result::Result<T, FlagsError>;
