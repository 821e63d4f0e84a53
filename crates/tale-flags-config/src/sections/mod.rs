// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod context;
mod logging;
mod remote;

pub use context::{ContextConfig, ContextConfigLayer, DEFAULT_REFRESH_DELAY_MS};
pub use logging::{LoggingConfig, LoggingConfigLayer, DEFAULT_LOG_LEVEL};
pub use remote::{RemoteConfig, RemoteConfigLayer, DEFAULT_REQUEST_TIMEOUT_SECS};
