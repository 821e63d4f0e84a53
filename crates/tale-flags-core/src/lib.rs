// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Tale feature flag layer.
//!
//! This crate holds the data model shared by the flag SDK (`tale-flags`) and
//! its tooling:
//! - [`FlagValue`], a closed set of payload shapes
//! - [`Flag`] and [`FlagSet`]
//! - [`UserIdentity`] and its [`Traits`]
//! - [`Readiness`] and [`ConnectionStatus`]
//! - the story reader's flag [`catalog`]
//! - wire types for the flag service ([`api`])
//!
//! # Example
//!
//! ```
//! use tale_flags_core::{catalog, Flag, FlagValue};
//!
//! let mut flags = catalog::default_flags();
//! assert!(flags.is_enabled(catalog::SHOW_CONTINUE_READING));
//!
//! flags.insert(Flag::new("header", true).with_value("Once upon a time"));
//! assert_eq!(
//!     flags.get("header").unwrap().value,
//!     Some(FlagValue::from("Once upon a time"))
//! );
//! ```

pub mod api;
pub mod catalog;
pub mod flag;
pub mod identity;
pub mod status;
pub mod value;

pub use catalog::FlagDefinition;
pub use flag::{Flag, FlagSet};
pub use identity::{Traits, UserIdentity};
pub use status::{ConnectionStatus, Readiness, FALLBACK_ENVIRONMENT_LABEL};
pub use value::FlagValue;
