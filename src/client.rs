//! The authenticated request client and its dispatch rules.

pub mod refresh;

pub use refresh::RefreshMetrics;

// crates.io
use http::{HeaderValue, StatusCode, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::ClientConfig,
	error::ConfigError,
	ext::{LoginRedirect, NoopLoginRedirect},
	http::{ApiRequest, ApiResponse, PreparedRequest, Transport},
	obs::{self, OpKind, OpOutcome, OpSpan},
	singleflight::RefreshCoordinator,
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestGateClient = Client<ReqwestTransport>;

/// Issues authenticated requests against one backend and owns the refresh protocol.
///
/// The client holds the transport, the caller-owned token store, the refresh coordinator,
/// and the redirect hook so [`Client::send`] can focus on the dispatch rules: skip the
/// credential on public paths, pass non-401 responses through untouched, and funnel
/// first-time authorization failures into a single shared refresh cycle.
pub struct Client<T>
where
	T: ?Sized + Transport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Token store owned by the surrounding application.
	pub store: Arc<dyn TokenStore>,
	/// Validated endpoint configuration.
	pub config: ClientConfig,
	/// Shared metrics recorder for refresh cycle outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	redirect: Arc<dyn LoginRedirect>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<T> Client<T>
where
	T: ?Sized + Transport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn TokenStore>,
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			redirect: Arc::new(NoopLoginRedirect),
			coordinator: Default::default(),
			refresh_metrics: Default::default(),
		}
	}

	/// Sets or replaces the login-redirect hook fired on unrecoverable session failures.
	pub fn with_login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
		self.redirect = redirect;

		self
	}

	/// Issues one request, transparently refreshing the credential on a first 401.
	///
	/// Non-401 statuses resolve as [`ApiResponse`] values for the caller to interpret. A
	/// 401 on a request that was already replayed, or on the replay itself, surfaces as
	/// [`Error::AuthorizationDenied`] after the session has been abandoned.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Send;

		let span = OpSpan::new(KIND, "send");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.dispatch(request)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn dispatch(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		if self.config.is_public_path(request.path()) {
			let prepared = self.prepare(&request, None)?;

			return self.transport.execute(prepared).await.map_err(Error::from);
		}

		let credential = self.store.get().await?;
		let prepared = self.prepare(&request, credential.as_ref())?;
		let response = self.transport.execute(prepared).await?;

		if response.status != StatusCode::UNAUTHORIZED {
			return Ok(response);
		}
		if request.was_replayed() {
			self.abandon_session().await;

			return Err(Error::AuthorizationDenied { status: response.status.as_u16() });
		}

		request.mark_replayed();

		let refreshed = self.refresh_credential().await?;
		let prepared = self.prepare(&request, Some(&refreshed))?;

		obs::record_op_outcome(OpKind::Replay, OpOutcome::Attempt);

		let replayed = self.transport.execute(prepared).await?;

		if replayed.status == StatusCode::UNAUTHORIZED {
			obs::record_op_outcome(OpKind::Replay, OpOutcome::Failure);
			self.abandon_session().await;

			return Err(Error::AuthorizationDenied { status: replayed.status.as_u16() });
		}

		obs::record_op_outcome(OpKind::Replay, OpOutcome::Success);

		Ok(replayed)
	}

	fn prepare(
		&self,
		request: &ApiRequest,
		credential: Option<&Credential>,
	) -> Result<PreparedRequest> {
		let mut url = self
			.config
			.base_url
			.join(request.path())
			.map_err(|e| ConfigError::InvalidPath { path: request.path().to_owned(), source: e })?;

		if !request.query_pairs().is_empty() {
			url.query_pairs_mut().extend_pairs(request.query_pairs());
		}

		let mut headers = request.extra_headers().clone();

		if let Some(credential) = credential {
			let mut value = HeaderValue::from_str(&credential.authorization_value())
				.map_err(|e| ConfigError::InvalidAuthorizationHeader { source: e })?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		Ok(PreparedRequest {
			method: request.method().clone(),
			url,
			headers,
			body: request.body().map(<[u8]>::to_vec),
		})
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client backed by a fresh cookie-aware reqwest transport.
	pub fn new(store: Arc<dyn TokenStore>, config: ClientConfig) -> Result<Self> {
		Ok(Self::with_transport(store, config, ReqwestTransport::new()?))
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			store: Arc::clone(&self.store),
			config: self.config.clone(),
			refresh_metrics: Arc::clone(&self.refresh_metrics),
			redirect: Arc::clone(&self.redirect),
			coordinator: Arc::clone(&self.coordinator),
		}
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client").field("config", &self.config).finish()
	}
}
