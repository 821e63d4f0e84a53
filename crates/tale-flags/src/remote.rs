// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Remote flag client for the flag evaluation service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use tale_flags_core::api::{
	self, FlagStateResponse, IdentityRequest, IdentityResponse, ENVIRONMENT_KEY_HEADER,
};
use tale_flags_core::{FlagSet, FlagValue, Readiness, UserIdentity};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::cache::{FlagCache, FlagsChanged};
use crate::error::{FlagsError, Result};

/// SDK version for identification.
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
/// SDK name for identification.
const SDK_NAME: &str = "tale-flags-rust";

pub use tale_flags_core::api::DEFAULT_API_URL;

/// Bridge to a flag evaluation service.
///
/// Queries are synchronous and answer from the last fetched state. They fail
/// with [`FlagsError::NotReady`] until [`initialize`](RemoteFlags::initialize)
/// succeeds, and with [`FlagsError::FlagNotFound`] for names the service did
/// not return.
#[async_trait]
pub trait RemoteFlags: Send + Sync + 'static {
	/// Performs the single initialization handshake.
	///
	/// Later calls never repeat the handshake. They return `Ok(())`, or the
	/// recorded error if the first attempt failed.
	async fn initialize(&self) -> Result<()>;

	fn readiness(&self) -> Readiness;

	fn has_feature(&self, name: &str) -> Result<bool>;

	/// Value of `name`; `Ok(None)` when the flag exists without a value.
	fn get_value(&self, name: &str) -> Result<Option<FlagValue>>;

	/// Evaluates subsequent queries for `identity`.
	async fn identify(&self, identity: &UserIdentity) -> Result<()>;

	/// Drops the identified user and returns to environment flags.
	async fn logout(&self) -> Result<()>;

	/// Re-pulls flag state for the current identity, or the environment.
	async fn fetch_latest(&self) -> Result<()>;

	/// Notifications for fetches that changed the flag set.
	fn subscribe(&self) -> broadcast::Receiver<FlagsChanged>;
}

/// Type alias for a shared remote client.
pub type SharedRemoteFlags = Arc<dyn RemoteFlags>;

/// Configuration for the remote client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Timeout for HTTP requests.
	pub request_timeout: Duration,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(10),
		}
	}
}

/// Builder for constructing a [`RemoteFlagClient`].
#[derive(Debug, Default)]
pub struct RemoteFlagClientBuilder {
	environment_id: Option<String>,
	api_url: Option<String>,
	config: ClientConfig,
}

impl RemoteFlagClientBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the client-side environment identifier.
	pub fn environment_id(mut self, id: impl Into<String>) -> Self {
		self.environment_id = Some(id.into());
		self
	}

	/// Sets the API root, e.g. `https://edge.api.flagsmith.com/api/v1/`.
	pub fn api_url(mut self, url: impl Into<String>) -> Self {
		self.api_url = Some(url.into());
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Builds the client. No network traffic happens until
	/// [`RemoteFlags::initialize`].
	pub fn build(self) -> Result<RemoteFlagClient> {
		let environment_id = self
			.environment_id
			.map(|id| id.trim().to_string())
			.filter(|id| !id.is_empty())
			.ok_or(FlagsError::MissingEnvironmentId)?;

		let api_url = self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
		if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
			return Err(FlagsError::InvalidApiUrl(api_url));
		}
		let api_url = api_url.trim_end_matches('/').to_string();

		let http_client = tale_common_http::new_client_with_timeout(self.config.request_timeout)?;

		debug!(api_url = %api_url, sdk_name = SDK_NAME, sdk_version = SDK_VERSION, "remote flag client created");

		Ok(RemoteFlagClient {
			inner: Arc::new(RemoteFlagClientInner {
				environment_id,
				api_url,
				http_client,
				cache: FlagCache::new(),
				state: RwLock::new(Readiness::Uninitialized),
				identity: RwLock::new(None),
				handshakes: AtomicU64::new(0),
			}),
		})
	}
}

/// Internal client state.
struct RemoteFlagClientInner {
	environment_id: String,
	api_url: String,
	http_client: Client,
	cache: FlagCache,
	state: RwLock<Readiness>,
	identity: RwLock<Option<UserIdentity>>,
	handshakes: AtomicU64,
}

/// HTTP client for the flag service.
///
/// # Example
///
/// ```ignore
/// use tale_flags::{RemoteFlagClient, RemoteFlags};
///
/// let client = RemoteFlagClient::builder()
///     .environment_id("env_12345")
///     .build()?;
///
/// client.initialize().await?;
/// let sharing = client.has_feature("enable_story_sharing")?;
/// ```
#[derive(Clone)]
pub struct RemoteFlagClient {
	inner: Arc<RemoteFlagClientInner>,
}

impl std::fmt::Debug for RemoteFlagClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteFlagClient")
			.field("environment_id", &self.inner.environment_id)
			.field("api_url", &self.inner.api_url)
			.field("readiness", &*self.inner.state.read())
			.finish()
	}
}

impl RemoteFlagClient {
	pub fn builder() -> RemoteFlagClientBuilder {
		RemoteFlagClientBuilder::new()
	}

	pub fn environment_id(&self) -> &str {
		&self.inner.environment_id
	}

	/// Number of initialization handshakes started. At most one.
	pub fn handshake_count(&self) -> u64 {
		self.inner.handshakes.load(Ordering::SeqCst)
	}

	/// The currently identified user, if any.
	pub fn identity(&self) -> Option<UserIdentity> {
		self.inner.identity.read().clone()
	}

	/// Snapshot of the last fetched flags.
	pub fn flags(&self) -> FlagSet {
		self.inner.cache.snapshot()
	}

	fn ensure_ready(&self) -> Result<()> {
		if self.inner.state.read().is_ready() {
			Ok(())
		} else {
			Err(FlagsError::NotReady)
		}
	}

	fn lookup(&self, name: &str) -> Result<tale_flags_core::Flag> {
		self.ensure_ready()?;
		self
			.inner
			.cache
			.get(name)
			.ok_or_else(|| FlagsError::FlagNotFound(name.to_string()))
	}

	async fn fetch_environment_flags(&self) -> Result<FlagSet> {
		let url = format!("{}/flags/", self.inner.api_url);
		debug!(url = %url, "fetching environment flags");

		let response = self
			.inner
			.http_client
			.get(&url)
			.header(ENVIRONMENT_KEY_HEADER, &self.inner.environment_id)
			.send()
			.await?;
		let response = check_status(response).await?;

		let states: Vec<FlagStateResponse> = response
			.json()
			.await
			.map_err(|e| FlagsError::ParseFailed(e.to_string()))?;
		Ok(api::into_flag_set(states))
	}

	async fn post_identity(&self, identity: &UserIdentity) -> Result<FlagSet> {
		let url = format!("{}/identities/", self.inner.api_url);
		debug!(url = %url, user_id = %identity.identifier, "posting identity");

		let response = self
			.inner
			.http_client
			.post(&url)
			.header(ENVIRONMENT_KEY_HEADER, &self.inner.environment_id)
			.json(&IdentityRequest::from(identity))
			.send()
			.await?;
		parse_identity(check_status(response).await?).await
	}

	async fn fetch_identity_flags(&self, identifier: &str) -> Result<FlagSet> {
		let url = format!("{}/identities/", self.inner.api_url);
		debug!(url = %url, user_id = %identifier, "fetching identity flags");

		let response = self
			.inner
			.http_client
			.get(&url)
			.header(ENVIRONMENT_KEY_HEADER, &self.inner.environment_id)
			.query(&[("identifier", identifier)])
			.send()
			.await?;
		parse_identity(check_status(response).await?).await
	}
}

#[async_trait]
impl RemoteFlags for RemoteFlagClient {
	async fn initialize(&self) -> Result<()> {
		{
			let mut state = self.inner.state.write();
			match &*state {
				Readiness::Uninitialized => {}
				Readiness::Failed { reason } => {
					return Err(FlagsError::Initialization(reason.clone()));
				}
				Readiness::Initializing | Readiness::Ready => {
					debug!("initialization already attempted, skipping");
					return Ok(());
				}
			}
			*state = Readiness::Initializing;
		}

		self.inner.handshakes.fetch_add(1, Ordering::SeqCst);
		info!(
			environment = %self.inner.environment_id,
			api_url = %self.inner.api_url,
			"initializing remote flag client"
		);

		match self.fetch_environment_flags().await {
			Ok(flags) => {
				let count = flags.len();
				self.inner.cache.replace(flags);
				*self.inner.state.write() = Readiness::Ready;
				info!(flags = count, "remote flag client ready");
				Ok(())
			}
			Err(e) => {
				error!(error = %e, "remote flag client initialization failed");
				let reason = e.to_string();
				*self.inner.state.write() = Readiness::Failed {
					reason: reason.clone(),
				};
				Err(FlagsError::Initialization(reason))
			}
		}
	}

	fn readiness(&self) -> Readiness {
		self.inner.state.read().clone()
	}

	fn has_feature(&self, name: &str) -> Result<bool> {
		self.lookup(name).map(|flag| flag.enabled)
	}

	fn get_value(&self, name: &str) -> Result<Option<FlagValue>> {
		self.lookup(name).map(|flag| flag.value)
	}

	async fn identify(&self, identity: &UserIdentity) -> Result<()> {
		self.ensure_ready()?;

		let current = self.inner.identity.read().clone();
		let identity = match current {
			Some(current) => current.merged_with(identity.clone()),
			None => identity.clone(),
		};

		let flags = self.post_identity(&identity).await?;
		let changed = self.inner.cache.replace(flags);
		info!(
			user_id = %identity.identifier,
			traits = identity.traits.len(),
			changed = changed.len(),
			"identified user"
		);
		*self.inner.identity.write() = Some(identity);
		Ok(())
	}

	async fn logout(&self) -> Result<()> {
		self.ensure_ready()?;

		let flags = self.fetch_environment_flags().await?;
		let previous = self.inner.identity.write().take();
		self.inner.cache.replace(flags);
		info!(
			user_id = ?previous.map(|i| i.identifier),
			"logged out, using environment flags"
		);
		Ok(())
	}

	async fn fetch_latest(&self) -> Result<()> {
		self.ensure_ready()?;

		let identifier = self
			.inner
			.identity
			.read()
			.as_ref()
			.map(|i| i.identifier.clone());
		let flags = match identifier {
			Some(id) => self.fetch_identity_flags(&id).await?,
			None => self.fetch_environment_flags().await?,
		};
		let changed = self.inner.cache.replace(flags);
		debug!(changed = changed.len(), "fetched latest flags");
		Ok(())
	}

	fn subscribe(&self) -> broadcast::Receiver<FlagsChanged> {
		self.inner.cache.subscribe()
	}
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
	if response.status().is_success() {
		return Ok(response);
	}
	let status = response.status().as_u16();
	let message = response.text().await.unwrap_or_default();
	error!(status, message = %message, "flag service returned an error");
	Err(FlagsError::ServerError { status, message })
}

async fn parse_identity(response: reqwest::Response) -> Result<FlagSet> {
	let body: IdentityResponse = response
		.json()
		.await
		.map_err(|e| FlagsError::ParseFailed(e.to_string()))?;
	Ok(api::into_flag_set(body.flags))
}
