//! Single-flight bearer-token HTTP client—attach credentials, coalesce 401-driven refreshes
//! into one round-trip, and replay queued requests in order.
//!
//! The crate centers on [`client::Client`]: it joins request paths against a configured base
//! URL, attaches the credential held by a caller-owned [`store::TokenStore`], and lets
//! non-401 responses pass through untouched. The first request to observe an authorization
//! failure leads exactly one refresh round-trip; every request that fails while that call is
//! in flight parks on the shared coordinator and is replayed once against the new credential.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod ext;
pub mod http;
pub mod obs;
pub mod store;

mod singleflight;

mod _prelude {
	pub use std::{
		collections::VecDeque,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
