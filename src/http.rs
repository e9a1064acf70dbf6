//! Transport primitives for authenticated backend requests.
//!
//! [`Transport`] is the crate's only dependency on an HTTP stack: the client resolves an
//! [`ApiRequest`] into a [`PreparedRequest`] (absolute URL, final headers, body) and hands
//! it to the transport, which owns connection pooling, timeouts, and cookie handling. The
//! refresh endpoint authenticates through an out-of-band session cookie, so transports that
//! talk to a real backend must carry a cookie store across calls.

// std
use std::ops::Deref;
// crates.io
use http::header::{CONTENT_TYPE, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing backend requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can serve every
/// in-flight request of a shared client. Timeouts are the transport's concern; an elapsed
/// timeout surfaces as a [`TransportError`] and never enters the refresh protocol.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Executes one prepared request and resolves with the raw response.
	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_>;
}

/// Request description accepted by [`Client::send`](crate::client::Client::send).
///
/// The path is backend-relative; the client joins it against the configured base URL. The
/// attempt counter travels with the description so a replayed request can never re-enter
/// the refresh protocol.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	headers: HeaderMap,
	body: Option<Vec<u8>>,
	attempts: u8,
}
impl ApiRequest {
	/// Creates a request for the provided method and backend-relative path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			attempts: 0,
		}
	}

	/// Convenience constructor for `GET` requests.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Convenience constructor for `POST` requests.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Convenience constructor for `PUT` requests.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Convenience constructor for `DELETE` requests.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query pair to the request URL.
	pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Adds an extra header to the outgoing request.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Serializes `payload` as the JSON request body and stamps the content type.
	pub fn json<T>(mut self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(payload)
			.map_err(|e| ConfigError::BodySerialization { source: e })?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(body);

		Ok(self)
	}

	/// Returns the request method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Returns the backend-relative path.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Returns how many times this request has been replayed after a refresh.
	pub fn attempts(&self) -> u8 {
		self.attempts
	}

	pub(crate) fn query_pairs(&self) -> &[(String, String)] {
		&self.query
	}

	pub(crate) fn extra_headers(&self) -> &HeaderMap {
		&self.headers
	}

	pub(crate) fn body(&self) -> Option<&[u8]> {
		self.body.as_deref()
	}

	pub(crate) fn mark_replayed(&mut self) {
		self.attempts = self.attempts.saturating_add(1);
	}

	pub(crate) fn was_replayed(&self) -> bool {
		self.attempts > 0
	}
}

/// Fully resolved request handed to a [`Transport`].
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	/// HTTP method to execute.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Final header set, including `Authorization` when one was attached.
	pub headers: HeaderMap,
	/// Optional request body bytes.
	pub body: Option<Vec<u8>>,
}

/// Raw response surfaced by a [`Transport`].
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Response status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Deserializes the body as JSON, reporting the failing path on a mismatch.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
	}

	/// Returns the body decoded as UTF-8, lossily.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Parses the `Retry-After` header as a relative duration, when present.
	pub fn retry_after(&self) -> Option<Duration> {
		let value = self.headers.get(RETRY_AFTER)?;
		let raw = value.to_str().ok()?.trim();

		if let Ok(secs) = raw.parse::<u64>() {
			return Some(Duration::seconds(secs as i64));
		}
		if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
			let delta = moment - OffsetDateTime::now_utc();

			if delta.is_positive() {
				return Some(delta);
			}
		}

		None
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`ReqwestTransport::new`] enables a cookie store because the refresh endpoint relies on
/// a session cookie carried outside the `Authorization` header. Callers wrapping their own
/// client via [`ReqwestTransport::with_client`] should configure one when they talk to a
/// real backend.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with a cookie store enabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client =
			ReqwestClient::builder().cookie_store(true).build().map_err(ConfigError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.request(request.method, request.url).headers(request.headers);

			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}
