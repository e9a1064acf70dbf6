//! Client-level error types shared across the dispatch path, refresh protocol, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The shared refresh cycle failed; the original request was not replayed.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// The backend rejected the request again after a replay; the session is not viable.
	#[error("Authorization was denied after a replay (HTTP {status}).")]
	AuthorizationDenied {
		/// Status code returned by the replayed request.
		status: u16,
	},
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP transport could not be constructed.
	#[error("HTTP transport could not be constructed.")]
	TransportBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL uses a scheme the client cannot dispatch on.
	#[error("Base URL `{url}` must use the http or https scheme.")]
	UnsupportedScheme {
		/// Offending URL rendered as a string.
		url: String,
	},
	/// Configured backend path does not begin with `/`.
	#[error("The {kind} path `{path}` must begin with `/`.")]
	RelativePath {
		/// Which configured path is invalid (refresh, login).
		kind: &'static str,
		/// Offending path value.
		path: String,
	},
	/// Public allow-list entry is empty or whitespace.
	#[error("Public allow-list entries cannot be empty.")]
	EmptyPublicPath,

	/// Request path cannot be joined against the base URL.
	#[error("Request path `{path}` cannot be joined against the base URL.")]
	InvalidPath {
		/// Offending request path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Credential material cannot be encoded as an `Authorization` header.
	#[error("Credential cannot be encoded as an Authorization header.")]
	InvalidAuthorizationHeader {
		/// Underlying header-value failure.
		#[source]
		source: http::header::InvalidHeaderValue,
	},
	/// Request body failed to serialize as JSON.
	#[error("Request body failed to serialize as JSON.")]
	BodySerialization {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn transport_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::TransportBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::transport_build(e)
	}
}

/// Transport-level failures (network, IO).
///
/// Timeouts surface here as generic network failures and never enter the refresh protocol.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Shared refresh-cycle failure fanned out to every queued waiter.
///
/// One refresh failure terminates every request parked on the cycle, so the type is `Clone`
/// and carries rendered messages instead of error sources.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a failure status (e.g., an expired session).
	#[error("Refresh endpoint rejected the session (HTTP {status}): {message}.")]
	Endpoint {
		/// Status code returned by the refresh endpoint.
		status: u16,
		/// Truncated response body preview.
		message: String,
	},
	/// The refresh call could not be issued or failed in transit.
	#[error("Refresh call failed in transit: {message}.")]
	Transport {
		/// Rendered transport failure.
		message: String,
	},
	/// Refresh endpoint returned a malformed or invalid payload.
	#[error("Refresh endpoint returned an invalid payload: {message}.")]
	Payload {
		/// Rendered parsing or validation failure.
		message: String,
	},
	/// The refreshed credential could not be written to the token store.
	#[error("Refreshed credential could not be stored: {message}.")]
	Store {
		/// Rendered storage failure.
		message: String,
	},
	/// The refresh leader was cancelled before the cycle completed.
	#[error("Refresh attempt was aborted before completing.")]
	Aborted,
}
