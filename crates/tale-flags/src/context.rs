// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The flag context: one synchronous query surface over the remote client
//! and the local fallback store.
//!
//! # Arbitration
//!
//! | Remote state | Query result |
//! |--------------|--------------|
//! | none configured | fallback store |
//! | not ready (uninitialized, initializing, failed) | fallback store |
//! | ready, flag known | remote value |
//! | ready, flag unknown or evaluation error | fallback store |
//!
//! Unknown everywhere means `false` for [`has_feature`](FlagContext::has_feature).
//! [`get_value`](FlagContext::get_value) returns the caller's default wherever
//! the table says fallback store.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tale_flags_core::catalog::{self, FlagDefinition};
use tale_flags_core::{
	ConnectionStatus, FlagSet, FlagValue, Readiness, Traits, UserIdentity,
	FALLBACK_ENVIRONMENT_LABEL,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::FlagsChanged;
use crate::error::{FlagsError, Result};
use crate::remote::{RemoteFlags, SharedRemoteFlags};
use crate::store::FlagStore;

/// How long a refresh waits when there is no ready remote client.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(500);

/// Whether an asynchronous operation reached the flag service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOutcome {
	/// The remote client performed the operation.
	Applied,
	/// No ready remote client; nothing was sent.
	Skipped,
}

/// A catalog flag with its current effective state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagSummary {
	pub definition: &'static FlagDefinition,
	pub enabled: bool,
	pub value: Option<FlagValue>,
}

/// Read-only flag capabilities shared by every context.
#[async_trait]
pub trait FlagQuery: Send + Sync {
	fn is_loading(&self) -> bool;

	fn has_feature(&self, name: &str) -> bool;

	fn get_value(&self, name: &str, default: FlagValue) -> FlagValue;

	async fn identify_user(&self, user_id: &str, traits: Traits) -> Result<RemoteOutcome>;

	async fn logout(&self) -> Result<RemoteOutcome>;

	async fn refresh_flags(&self) -> Result<RemoteOutcome>;
}

/// Local override capability, available only on [`DemoFlagContext`].
pub trait FlagOverride: FlagQuery {
	/// Flips the fallback value of `name` and returns the new state.
	fn toggle_flag(&self, name: &str) -> bool;
}

/// Builder for [`FlagContext`] and [`DemoFlagContext`].
pub struct FlagContextBuilder {
	remote: Option<SharedRemoteFlags>,
	store: Option<FlagStore>,
	environment_label: Option<String>,
	refresh_delay: Duration,
}

impl FlagContextBuilder {
	pub fn new() -> Self {
		Self {
			remote: None,
			store: None,
			environment_label: None,
			refresh_delay: DEFAULT_REFRESH_DELAY,
		}
	}

	/// Sets the remote client. Without one, every query uses the fallback
	/// store.
	pub fn remote(self, remote: impl RemoteFlags) -> Self {
		self.shared_remote(Arc::new(remote))
	}

	pub fn shared_remote(mut self, remote: SharedRemoteFlags) -> Self {
		self.remote = Some(remote);
		self
	}

	/// Sets the fallback store. Defaults to the catalog defaults.
	pub fn store(mut self, store: FlagStore) -> Self {
		self.store = Some(store);
		self
	}

	/// Sets the identifier displayed to operators.
	pub fn environment_label(mut self, label: impl Into<String>) -> Self {
		self.environment_label = Some(label.into());
		self
	}

	pub fn refresh_delay(mut self, delay: Duration) -> Self {
		self.refresh_delay = delay;
		self
	}

	/// Builds a read-only context.
	pub fn build(self) -> FlagContext {
		let inner = ContextInner {
			remote: self.remote,
			store: self.store.unwrap_or_else(FlagStore::with_catalog_defaults),
			environment_label: self
				.environment_label
				.filter(|l| !l.is_empty())
				.unwrap_or_else(|| FALLBACK_ENVIRONMENT_LABEL.to_string()),
			refresh_delay: self.refresh_delay,
			init_started: AtomicBool::new(false),
			init_settled: AtomicBool::new(false),
			refreshes_in_flight: AtomicUsize::new(0),
		};
		FlagContext {
			inner: Arc::new(inner),
		}
	}

	/// Builds a context that can also toggle fallback flags.
	pub fn build_demo(self) -> DemoFlagContext {
		DemoFlagContext {
			context: self.build(),
		}
	}
}

impl Default for FlagContextBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct ContextInner {
	remote: Option<SharedRemoteFlags>,
	store: FlagStore,
	environment_label: String,
	refresh_delay: Duration,
	init_started: AtomicBool,
	init_settled: AtomicBool,
	refreshes_in_flight: AtomicUsize,
}

/// Handle to the application's flag state.
///
/// Cheap to clone; clones share the same store, remote client and loading
/// state.
///
/// # Example
///
/// ```ignore
/// use tale_flags::{FlagContext, RemoteFlagClient};
///
/// let remote = RemoteFlagClient::builder().environment_id("env_12345").build()?;
/// let flags = FlagContext::builder()
///     .remote(remote)
///     .environment_label("env_12345")
///     .build();
///
/// flags.initialize().await.ok();
/// if flags.has_feature("show_continue_reading") {
///     // render the section
/// }
/// let header = flags.get_value("header", "xyz");
/// ```
#[derive(Clone)]
pub struct FlagContext {
	inner: Arc<ContextInner>,
}

impl std::fmt::Debug for FlagContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FlagContext")
			.field("environment_label", &self.inner.environment_label)
			.field("readiness", &self.readiness())
			.field("is_loading", &self.is_loading())
			.finish()
	}
}

impl FlagContext {
	pub fn builder() -> FlagContextBuilder {
		FlagContextBuilder::new()
	}

	/// Runs the single initialization attempt for this context.
	///
	/// Settles the initial loading state whatever the outcome, including when
	/// the returned future is dropped mid-handshake. Only the first call does
	/// any work; later calls return `Ok(())` immediately.
	pub async fn initialize(&self) -> Result<()> {
		if self.inner.init_started.swap(true, Ordering::SeqCst) {
			debug!("flag context already initialized");
			return Ok(());
		}
		let _settle = SettleGuard(&self.inner.init_settled);

		let result = match &self.inner.remote {
			Some(remote) => remote.initialize().await,
			None => {
				info!(
					environment = %self.inner.environment_label,
					"no flag environment configured, using fallback flags"
				);
				Ok(())
			}
		};

		if let Err(e) = &result {
			warn!(error = %e, "continuing with fallback flags");
		}
		result
	}

	/// Runs [`initialize`](Self::initialize) on the tokio runtime.
	pub fn spawn_initialize(&self) -> JoinHandle<Result<()>> {
		let context = self.clone();
		tokio::spawn(async move { context.initialize().await })
	}

	/// True until initialization settles and while any refresh is running.
	pub fn is_loading(&self) -> bool {
		!self.inner.init_settled.load(Ordering::SeqCst)
			|| self.inner.refreshes_in_flight.load(Ordering::SeqCst) > 0
	}

	pub fn has_feature(&self, name: &str) -> bool {
		if let Some(remote) = self.ready_remote() {
			match remote.has_feature(name) {
				Ok(enabled) => return enabled,
				Err(e) => log_evaluation_fallback(name, &e),
			}
		}
		self.inner.store.read(name)
	}

	/// Value of `name` from the ready remote client, else `default`.
	///
	/// The fallback store's values are not consulted; they only show in
	/// [`catalog`](Self::catalog).
	pub fn get_value(&self, name: &str, default: impl Into<FlagValue>) -> FlagValue {
		if let Some(remote) = self.ready_remote() {
			match remote.get_value(name) {
				Ok(Some(value)) => return value,
				Ok(None) => {}
				Err(e) => log_evaluation_fallback(name, &e),
			}
		}
		default.into()
	}

	/// Associates later evaluations with `user_id`.
	///
	/// Skipped when the remote client is not ready. Traits never reach the
	/// fallback store.
	pub async fn identify_user(
		&self,
		user_id: impl Into<String>,
		traits: Traits,
	) -> Result<RemoteOutcome> {
		let identity = UserIdentity::new(user_id).with_traits(traits);

		let Some(remote) = self.ready_remote() else {
			info!(
				user_id = %identity.identifier,
				traits = identity.traits.len(),
				"remote flags not ready, skipping identify"
			);
			return Ok(RemoteOutcome::Skipped);
		};

		match remote.identify(&identity).await {
			Ok(()) => Ok(RemoteOutcome::Applied),
			Err(e) => {
				error!(user_id = %identity.identifier, error = %e, "failed to identify user");
				Err(e)
			}
		}
	}

	pub async fn logout(&self) -> Result<RemoteOutcome> {
		let Some(remote) = self.ready_remote() else {
			info!("remote flags not ready, skipping logout");
			return Ok(RemoteOutcome::Skipped);
		};

		match remote.logout().await {
			Ok(()) => Ok(RemoteOutcome::Applied),
			Err(e) => {
				error!(error = %e, "failed to log out");
				Err(e)
			}
		}
	}

	/// Re-fetches remote flags with the loading indicator raised.
	///
	/// Without a ready remote client this only waits the configured delay.
	/// Loading is lowered on every exit path, including when the returned
	/// future is dropped early.
	pub async fn refresh_flags(&self) -> Result<RemoteOutcome> {
		let _loading = LoadingGuard::enter(&self.inner.refreshes_in_flight);

		match self.ready_remote() {
			Some(remote) => match remote.fetch_latest().await {
				Ok(()) => {
					info!("flags refreshed");
					Ok(RemoteOutcome::Applied)
				}
				Err(e) => {
					error!(error = %e, "failed to refresh flags");
					Err(e)
				}
			},
			None => {
				debug!(
					delay_ms = self.inner.refresh_delay.as_millis() as u64,
					"remote flags not ready, simulating refresh"
				);
				tokio::time::sleep(self.inner.refresh_delay).await;
				Ok(RemoteOutcome::Skipped)
			}
		}
	}

	/// Readiness of the remote client, or `None` without one.
	pub fn readiness(&self) -> Option<Readiness> {
		self.inner.remote.as_ref().map(|r| r.readiness())
	}

	pub fn connection_status(&self) -> ConnectionStatus {
		ConnectionStatus::from_readiness(self.readiness().as_ref())
	}

	pub fn environment_label(&self) -> &str {
		&self.inner.environment_label
	}

	/// Change notifications from the remote client, if there is one.
	pub fn subscribe(&self) -> Option<broadcast::Receiver<FlagsChanged>> {
		self.inner.remote.as_ref().map(|r| r.subscribe())
	}

	/// Every catalog flag with the value the application would see now.
	pub fn catalog(&self) -> Vec<FlagSummary> {
		catalog::STORY_FLAGS
			.iter()
			.map(|definition| FlagSummary {
				definition,
				enabled: self.has_feature(definition.key),
				value: self.resolve_value(definition.key),
			})
			.collect()
	}

	/// Copy of the fallback flags.
	pub fn fallback_flags(&self) -> FlagSet {
		self.inner.store.snapshot()
	}

	fn ready_remote(&self) -> Option<&SharedRemoteFlags> {
		self.inner
			.remote
			.as_ref()
			.filter(|remote| remote.readiness().is_ready())
	}

	fn resolve_value(&self, name: &str) -> Option<FlagValue> {
		if let Some(remote) = self.ready_remote() {
			match remote.get_value(name) {
				Ok(value) => return value,
				Err(e) => log_evaluation_fallback(name, &e),
			}
		}
		self.inner.store.value(name)
	}
}

#[async_trait]
impl FlagQuery for FlagContext {
	fn is_loading(&self) -> bool {
		FlagContext::is_loading(self)
	}

	fn has_feature(&self, name: &str) -> bool {
		FlagContext::has_feature(self, name)
	}

	fn get_value(&self, name: &str, default: FlagValue) -> FlagValue {
		FlagContext::get_value(self, name, default)
	}

	async fn identify_user(&self, user_id: &str, traits: Traits) -> Result<RemoteOutcome> {
		FlagContext::identify_user(self, user_id, traits).await
	}

	async fn logout(&self) -> Result<RemoteOutcome> {
		FlagContext::logout(self).await
	}

	async fn refresh_flags(&self) -> Result<RemoteOutcome> {
		FlagContext::refresh_flags(self).await
	}
}

/// A [`FlagContext`] that can also override fallback flags locally.
///
/// Toggles never reach the flag service, so they only show through for
/// names the ready remote client does not answer.
#[derive(Debug, Clone)]
pub struct DemoFlagContext {
	context: FlagContext,
}

impl DemoFlagContext {
	pub fn toggle_flag(&self, name: &str) -> bool {
		self.context.inner.store.toggle(name)
	}

	pub fn context(&self) -> &FlagContext {
		&self.context
	}
}

impl Deref for DemoFlagContext {
	type Target = FlagContext;

	fn deref(&self) -> &FlagContext {
		&self.context
	}
}

#[async_trait]
impl FlagQuery for DemoFlagContext {
	fn is_loading(&self) -> bool {
		self.context.is_loading()
	}

	fn has_feature(&self, name: &str) -> bool {
		self.context.has_feature(name)
	}

	fn get_value(&self, name: &str, default: FlagValue) -> FlagValue {
		self.context.get_value(name, default)
	}

	async fn identify_user(&self, user_id: &str, traits: Traits) -> Result<RemoteOutcome> {
		self.context.identify_user(user_id, traits).await
	}

	async fn logout(&self) -> Result<RemoteOutcome> {
		self.context.logout().await
	}

	async fn refresh_flags(&self) -> Result<RemoteOutcome> {
		self.context.refresh_flags().await
	}
}

impl FlagOverride for DemoFlagContext {
	fn toggle_flag(&self, name: &str) -> bool {
		DemoFlagContext::toggle_flag(self, name)
	}
}

/// Counts an in-flight refresh for as long as it lives.
struct LoadingGuard<'a> {
	counter: &'a AtomicUsize,
}

impl<'a> LoadingGuard<'a> {
	fn enter(counter: &'a AtomicUsize) -> Self {
		counter.fetch_add(1, Ordering::SeqCst);
		Self { counter }
	}
}

impl Drop for LoadingGuard<'_> {
	fn drop(&mut self) {
		self.counter.fetch_sub(1, Ordering::SeqCst);
	}
}

/// Marks the initial attempt settled when dropped.
struct SettleGuard<'a>(&'a AtomicBool);

impl Drop for SettleGuard<'_> {
	fn drop(&mut self) {
		self.0.store(true, Ordering::SeqCst);
	}
}

fn log_evaluation_fallback(name: &str, error: &FlagsError) {
	if error.is_expected_miss() {
		debug!(flag = %name, error = %error, "using fallback flag");
	} else {
		warn!(flag = %name, error = %error, "flag evaluation failed, using fallback");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::AtomicU64;

	use parking_lot::Mutex;
	use tale_flags_core::catalog::{
		ENABLE_STORY_SHARING, HEADER, IS_ADMIN, SHOW_CONTINUE_READING,
	};
	use tale_flags_core::Flag;

	use crate::cache::FlagCache;

	/// In-memory remote client with scripted behavior.
	struct FakeRemote {
		state: Mutex<Readiness>,
		flags: FlagSet,
		cache: FlagCache,
		init_fails: bool,
		init_delay: Option<Duration>,
		evaluation_fails: bool,
		fetch_fails: bool,
		handshakes: AtomicU64,
		fetches: AtomicU64,
		identified: Mutex<Vec<UserIdentity>>,
	}

	impl FakeRemote {
		fn new(flags: FlagSet) -> Self {
			Self {
				state: Mutex::new(Readiness::Uninitialized),
				flags,
				cache: FlagCache::new(),
				init_fails: false,
				init_delay: None,
				evaluation_fails: false,
				fetch_fails: false,
				handshakes: AtomicU64::new(0),
				fetches: AtomicU64::new(0),
				identified: Mutex::new(Vec::new()),
			}
		}

		fn check(&self) -> Result<()> {
			if !self.state.lock().is_ready() {
				return Err(FlagsError::NotReady);
			}
			if self.evaluation_fails {
				return Err(FlagsError::ParseFailed("corrupt state".to_string()));
			}
			Ok(())
		}
	}

	#[async_trait]
	impl RemoteFlags for Arc<FakeRemote> {
		async fn initialize(&self) -> Result<()> {
			if *self.state.lock() != Readiness::Uninitialized {
				return Ok(());
			}
			*self.state.lock() = Readiness::Initializing;
			self.handshakes.fetch_add(1, Ordering::SeqCst);
			match self.init_delay {
				Some(delay) => tokio::time::sleep(delay).await,
				None => tokio::task::yield_now().await,
			}
			if self.init_fails {
				*self.state.lock() = Readiness::Failed {
					reason: "connection refused".to_string(),
				};
				return Err(FlagsError::Initialization("connection refused".to_string()));
			}
			self.cache.replace(self.flags.clone());
			*self.state.lock() = Readiness::Ready;
			Ok(())
		}

		fn readiness(&self) -> Readiness {
			self.state.lock().clone()
		}

		fn has_feature(&self, name: &str) -> Result<bool> {
			self.check()?;
			self.cache
				.get(name)
				.map(|f| f.enabled)
				.ok_or_else(|| FlagsError::FlagNotFound(name.to_string()))
		}

		fn get_value(&self, name: &str) -> Result<Option<FlagValue>> {
			self.check()?;
			self.cache
				.get(name)
				.map(|f| f.value)
				.ok_or_else(|| FlagsError::FlagNotFound(name.to_string()))
		}

		async fn identify(&self, identity: &UserIdentity) -> Result<()> {
			if !self.state.lock().is_ready() {
				return Err(FlagsError::NotReady);
			}
			self.identified.lock().push(identity.clone());
			Ok(())
		}

		async fn logout(&self) -> Result<()> {
			Ok(())
		}

		async fn fetch_latest(&self) -> Result<()> {
			self.fetches.fetch_add(1, Ordering::SeqCst);
			if self.fetch_fails {
				return Err(FlagsError::ServerError {
					status: 503,
					message: "unavailable".to_string(),
				});
			}
			Ok(())
		}

		fn subscribe(&self) -> broadcast::Receiver<FlagsChanged> {
			self.cache.subscribe()
		}
	}

	fn remote_flags() -> FlagSet {
		[
			Flag::new(SHOW_CONTINUE_READING, false),
			Flag::new(ENABLE_STORY_SHARING, true),
			Flag::new(HEADER, true).with_value("Remote header"),
			Flag::new("plain_flag", true),
		]
		.into_iter()
		.collect()
	}

	fn context_with(remote: &Arc<FakeRemote>) -> FlagContext {
		FlagContext::builder()
			.remote(Arc::clone(remote))
			.environment_label("env_123")
			.build()
	}

	#[test]
	fn unknown_flag_is_false_and_default() {
		let ctx = FlagContext::builder().build();
		assert!(!ctx.has_feature("no_such_flag"));
		assert_eq!(ctx.get_value("no_such_flag", "d"), FlagValue::from("d"));
	}

	#[test]
	fn header_value_without_remote() {
		let ctx = FlagContext::builder().build();
		assert_eq!(ctx.get_value(HEADER, "xyz"), FlagValue::from("xyz"));
	}

	#[test]
	fn value_default_wins_over_stored_fallback_value() {
		let ctx = FlagContext::builder().build();
		let stored = ctx.fallback_flags().get(HEADER).and_then(|f| f.value.clone());
		assert_eq!(stored, Some(FlagValue::from("xyz")));
		assert_eq!(ctx.get_value(HEADER, "abc"), FlagValue::from("abc"));
	}

	#[tokio::test]
	async fn value_default_used_before_remote_is_ready() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		assert_eq!(ctx.get_value(HEADER, "abc"), FlagValue::from("abc"));

		ctx.initialize().await.unwrap();
		assert_eq!(ctx.get_value(HEADER, "abc"), FlagValue::from("Remote header"));
	}

	#[test]
	fn loading_until_initialized() {
		let ctx = FlagContext::builder().build();
		assert!(ctx.is_loading());
	}

	#[test]
	fn uninitialized_remote_uses_fallback() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		assert!(ctx.has_feature(SHOW_CONTINUE_READING));
		assert!(!ctx.has_feature(ENABLE_STORY_SHARING));
		assert_eq!(ctx.connection_status(), ConnectionStatus::Pending);
	}

	#[tokio::test]
	async fn no_environment_settles_on_fallback() {
		let ctx = FlagContext::builder().build();
		ctx.initialize().await.unwrap();

		assert!(!ctx.is_loading());
		assert!(ctx.has_feature(IS_ADMIN));
		assert_eq!(ctx.environment_label(), FALLBACK_ENVIRONMENT_LABEL);
		assert_eq!(ctx.connection_status(), ConnectionStatus::NotConfigured);
		assert!(ctx.readiness().is_none());
		assert!(ctx.subscribe().is_none());
	}

	#[tokio::test]
	async fn ready_remote_wins_over_fallback() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		ctx.initialize().await.unwrap();

		assert!(!ctx.is_loading());
		assert!(!ctx.has_feature(SHOW_CONTINUE_READING));
		assert!(ctx.has_feature(ENABLE_STORY_SHARING));
		assert_eq!(ctx.get_value(HEADER, "xyz"), FlagValue::from("Remote header"));
		assert_eq!(ctx.connection_status(), ConnectionStatus::Connected);
	}

	#[tokio::test]
	async fn names_unknown_to_remote_fall_back() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		ctx.initialize().await.unwrap();

		assert!(ctx.has_feature(IS_ADMIN));
		assert!(!ctx.has_feature("unknown_everywhere"));
		assert_eq!(ctx.get_value("unknown_everywhere", 7), FlagValue::Integer(7));
	}

	#[tokio::test]
	async fn remote_flag_without_value_uses_default() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		ctx.initialize().await.unwrap();

		assert_eq!(ctx.get_value("plain_flag", "d"), FlagValue::from("d"));
	}

	#[tokio::test]
	async fn evaluation_errors_fall_back_per_call() {
		let mut fake = FakeRemote::new(remote_flags());
		fake.evaluation_fails = true;
		let remote = Arc::new(fake);
		let ctx = context_with(&remote);
		ctx.initialize().await.unwrap();

		assert!(ctx.has_feature(SHOW_CONTINUE_READING));
		assert_eq!(ctx.get_value(HEADER, "d"), FlagValue::from("d"));
		assert_eq!(ctx.readiness(), Some(Readiness::Ready));
	}

	#[tokio::test]
	async fn failed_initialization_routes_to_fallback() {
		let mut fake = FakeRemote::new(remote_flags());
		fake.init_fails = true;
		let remote = Arc::new(fake);
		let ctx = context_with(&remote);

		let result = ctx.initialize().await;
		assert!(matches!(result, Err(FlagsError::Initialization(_))));
		assert!(!ctx.is_loading());
		assert!(ctx.has_feature(SHOW_CONTINUE_READING));
		assert_eq!(
			ctx.connection_status(),
			ConnectionStatus::Error {
				message: "connection refused".to_string()
			}
		);
	}

	#[tokio::test]
	async fn initialize_runs_handshake_once() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		let other = ctx.clone();

		let (a, b) = tokio::join!(ctx.initialize(), other.initialize());
		assert!(a.is_ok());
		assert!(b.is_ok());
		ctx.initialize().await.unwrap();

		assert_eq!(remote.handshakes.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn spawn_initialize_settles_loading() {
		let ctx = FlagContext::builder().build();
		ctx.spawn_initialize().await.unwrap().unwrap();
		assert!(!ctx.is_loading());
	}

	#[tokio::test(start_paused = true)]
	async fn abandoned_initialize_still_settles_loading() {
		let mut fake = FakeRemote::new(remote_flags());
		fake.init_delay = Some(Duration::from_secs(60));
		let remote = Arc::new(fake);
		let ctx = context_with(&remote);

		let result = tokio::time::timeout(Duration::from_millis(10), ctx.initialize()).await;
		assert!(result.is_err());
		assert!(!ctx.is_loading());

		ctx.initialize().await.unwrap();
		assert!(!ctx.is_loading());
		assert_eq!(remote.handshakes.load(Ordering::SeqCst), 1);
		assert!(ctx.has_feature(SHOW_CONTINUE_READING));
	}

	#[tokio::test(start_paused = true)]
	async fn aborted_spawn_initialize_settles_loading() {
		let mut fake = FakeRemote::new(remote_flags());
		fake.init_delay = Some(Duration::from_secs(60));
		let ctx = context_with(&Arc::new(fake));

		let handle = ctx.spawn_initialize();
		tokio::time::sleep(Duration::from_millis(10)).await;
		assert!(ctx.is_loading());

		handle.abort();
		assert!(handle.await.unwrap_err().is_cancelled());
		assert!(!ctx.is_loading());
	}

	#[tokio::test]
	async fn identify_before_ready_is_a_noop() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		let before = ctx.fallback_flags();

		let mut traits = Traits::new();
		traits.insert("name".to_string(), FlagValue::from("John Doe"));
		let outcome = ctx.identify_user("user-123", traits).await.unwrap();

		assert_eq!(outcome, RemoteOutcome::Skipped);
		assert!(remote.identified.lock().is_empty());
		assert_eq!(ctx.fallback_flags(), before);
	}

	#[tokio::test]
	async fn identify_when_ready_reaches_remote() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		ctx.initialize().await.unwrap();

		let mut traits = Traits::new();
		traits.insert("favorite_genre".to_string(), FlagValue::from("fantasy"));
		let outcome = ctx.identify_user("user-123", traits).await.unwrap();

		assert_eq!(outcome, RemoteOutcome::Applied);
		let identified = remote.identified.lock();
		assert_eq!(identified.len(), 1);
		assert_eq!(identified[0].identifier, "user-123");
		assert_eq!(
			identified[0].traits["favorite_genre"],
			FlagValue::from("fantasy")
		);
	}

	#[tokio::test]
	async fn logout_outcomes() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		assert_eq!(ctx.logout().await.unwrap(), RemoteOutcome::Skipped);

		ctx.initialize().await.unwrap();
		assert_eq!(ctx.logout().await.unwrap(), RemoteOutcome::Applied);
	}

	#[tokio::test(start_paused = true)]
	async fn refresh_raises_loading_while_in_flight() {
		let ctx = FlagContext::builder().build();
		ctx.initialize().await.unwrap();
		assert!(!ctx.is_loading());

		let task = tokio::spawn({
			let ctx = ctx.clone();
			async move { ctx.refresh_flags().await }
		});

		tokio::time::sleep(Duration::from_millis(100)).await;
		assert!(ctx.is_loading());

		let outcome = task.await.unwrap().unwrap();
		assert_eq!(outcome, RemoteOutcome::Skipped);
		assert!(!ctx.is_loading());
	}

	#[tokio::test(start_paused = true)]
	async fn dropped_refresh_lowers_loading() {
		let ctx = FlagContext::builder().build();
		ctx.initialize().await.unwrap();

		let result = tokio::time::timeout(Duration::from_millis(10), ctx.refresh_flags()).await;
		assert!(result.is_err());
		assert!(!ctx.is_loading());
	}

	#[tokio::test]
	async fn refresh_delegates_when_ready() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = context_with(&remote);
		ctx.initialize().await.unwrap();

		let outcome = ctx.refresh_flags().await.unwrap();
		assert_eq!(outcome, RemoteOutcome::Applied);
		assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
		assert!(!ctx.is_loading());
	}

	#[tokio::test]
	async fn failed_refresh_reports_error_and_clears_loading() {
		let mut fake = FakeRemote::new(remote_flags());
		fake.fetch_fails = true;
		let remote = Arc::new(fake);
		let ctx = context_with(&remote);
		ctx.initialize().await.unwrap();

		let result = ctx.refresh_flags().await;
		assert!(matches!(result, Err(FlagsError::ServerError { status: 503, .. })));
		assert!(!ctx.is_loading());
		assert_eq!(ctx.readiness(), Some(Readiness::Ready));
	}

	#[test]
	fn toggle_is_read_back_immediately() {
		let ctx = FlagContext::builder().build_demo();
		assert!(!ctx.has_feature(ENABLE_STORY_SHARING));
		assert!(ctx.toggle_flag(ENABLE_STORY_SHARING));
		assert!(ctx.has_feature(ENABLE_STORY_SHARING));
	}

	#[tokio::test]
	async fn toggle_does_not_override_ready_remote() {
		let remote = Arc::new(FakeRemote::new(remote_flags()));
		let ctx = FlagContext::builder()
			.remote(Arc::clone(&remote))
			.build_demo();
		ctx.initialize().await.unwrap();

		ctx.toggle_flag(ENABLE_STORY_SHARING);
		assert!(ctx.has_feature(ENABLE_STORY_SHARING));

		ctx.toggle_flag(IS_ADMIN);
		assert!(!ctx.has_feature(IS_ADMIN));
	}

	#[test]
	fn override_capability_through_trait_object() {
		let demo = FlagContext::builder().build_demo();
		let flags: &dyn FlagOverride = &demo;
		assert!(flags.toggle_flag("brand_new"));
		assert!(flags.has_feature("brand_new"));
		assert_eq!(
			flags.get_value("brand_new", FlagValue::Bool(false)),
			FlagValue::Bool(false)
		);
	}

	#[test]
	fn catalog_reports_effective_state() {
		let ctx = FlagContext::builder().build();
		let summary = ctx.catalog();
		assert_eq!(summary.len(), catalog::STORY_FLAGS.len());

		let header = summary.iter().find(|s| s.definition.key == HEADER).unwrap();
		assert!(header.enabled);
		assert_eq!(header.value, Some(FlagValue::from("xyz")));
	}

	mod properties {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn overlapping_refreshes_settle_loading(delays in prop::collection::vec(1u64..500, 1..8)) {
				let rt = tokio::runtime::Builder::new_current_thread()
					.enable_time()
					.start_paused(true)
					.build()
					.unwrap();

				rt.block_on(async {
					let ctx = FlagContext::builder().build();
					ctx.initialize().await.unwrap();

					let mut tasks = Vec::new();
					for delay in &delays {
						let ctx = ctx.clone();
						let delay = Duration::from_millis(*delay);
						tasks.push(tokio::spawn(async move {
							tokio::time::timeout(delay, ctx.refresh_flags()).await
						}));
					}
					tokio::task::yield_now().await;
					assert!(ctx.is_loading());

					for task in tasks {
						let _ = task.await.unwrap();
					}
					assert!(!ctx.is_loading());
				});
			}

			#[test]
			fn toggle_parity_decides_state(times in 0usize..16) {
				let demo = FlagContext::builder().build_demo();
				let initial = demo.has_feature(ENABLE_STORY_SHARING);
				for _ in 0..times {
					demo.toggle_flag(ENABLE_STORY_SHARING);
				}
				prop_assert_eq!(demo.has_feature(ENABLE_STORY_SHARING), initial ^ (times % 2 == 1));
			}
		}
	}

	#[test]
	fn blank_environment_label_uses_fallback() {
		let ctx = FlagContext::builder().environment_label("").build();
		assert_eq!(ctx.environment_label(), FALLBACK_ENVIRONMENT_LABEL);
	}
}
