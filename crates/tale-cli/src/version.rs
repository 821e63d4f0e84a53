// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build information and version utilities.

/// Format version info for display.
pub fn format_version_info() -> String {
	format!(
		"Version:    {}\n\
		 Platform:   {}\n\
		 User-Agent: {}",
		env!("CARGO_PKG_VERSION"),
		tale_common_http::PLATFORM,
		tale_common_http::user_agent(),
	)
}
