//! Refresh protocol: leader election, the refresh round-trip, and waiter fan-out.
//!
//! The first request to observe an authorization failure becomes the cycle leader and
//! performs exactly one `POST` against the configured refresh endpoint; requests failing
//! while that call is in flight park on the coordinator and receive the leader's outcome in
//! FIFO order. A successful cycle writes the new credential into the token store before any
//! waiter resolves. A failed cycle rejects every waiter with the same error, clears the
//! store, and fires the login-redirect hook exactly once.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use http::{HeaderMap, Method};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	client::Client,
	error::RefreshError,
	http::{PreparedRequest, Transport},
	obs::{self, OpKind, OpOutcome, OpSpan},
	singleflight::{RefreshOutcome, Ticket},
};

const BODY_PREVIEW_LIMIT: usize = 256;
// Ten years, the widest session lifetime any backend is allowed to claim.
const MAX_EXPIRES_IN_SECS: i64 = 10 * 366 * 24 * 60 * 60;

/// Successful refresh payload returned by the backend.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
	access_token: String,
	#[serde(default)]
	token_type: Option<String>,
	expires_in: i64,
}

impl<T> Client<T>
where
	T: ?Sized + Transport,
{
	/// Obtains a fresh credential, joining the in-flight cycle when one exists.
	pub(crate) async fn refresh_credential(&self) -> Result<Credential> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh_credential");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				match self.coordinator.join() {
					Ticket::Follower(waiter) => {
						// The leader guard guarantees a send; a closed channel can only
						// mean the cycle was torn down mid-flight.
						let outcome = waiter.await.unwrap_or(Err(RefreshError::Aborted));

						outcome.map_err(Error::from)
					},
					Ticket::Leader(lead) => {
						self.refresh_metrics.record_attempt();

						let outcome = self.run_refresh_cycle().await;

						match &outcome {
							Ok(_) => self.refresh_metrics.record_success(),
							Err(_) => self.refresh_metrics.record_failure(),
						}

						lead.complete(&outcome);

						outcome.map_err(Error::from)
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Performs the round-trip plus the success/failure bookkeeping for one cycle.
	async fn run_refresh_cycle(&self) -> RefreshOutcome {
		match self.request_refreshed_credential().await {
			Ok(credential) => {
				// Waiters replay against the credential they receive, but later requests
				// read the store, so it must hold the new value before anyone resolves.
				if let Err(err) = self.store.set(credential.clone()).await {
					let failure = RefreshError::Store { message: err.to_string() };

					self.abandon_session().await;

					return Err(failure);
				}

				Ok(credential)
			},
			Err(failure) => {
				self.abandon_session().await;

				Err(failure)
			},
		}
	}

	/// Calls the refresh endpoint and parses the credential payload.
	async fn request_refreshed_credential(&self) -> RefreshOutcome {
		let url = self.config.base_url.join(&self.config.refresh_path).map_err(|e| {
			RefreshError::Transport { message: format!("Refresh URL is invalid: {e}") }
		})?;
		// The session cookie rides along via the transport's cookie store; the request
		// itself carries neither a body nor an Authorization header.
		let request =
			PreparedRequest { method: Method::POST, url, headers: HeaderMap::new(), body: None };
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|err| RefreshError::Transport { message: err.to_string() })?;

		if !response.is_success() {
			return Err(RefreshError::Endpoint {
				status: response.status.as_u16(),
				message: body_preview(&response.body),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let payload: RefreshPayload = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|err| RefreshError::Payload { message: err.to_string() })?;

		self.credential_from_payload(payload)
	}

	fn credential_from_payload(&self, payload: RefreshPayload) -> RefreshOutcome {
		if payload.access_token.trim().is_empty() {
			return Err(RefreshError::Payload { message: "accessToken must not be empty".into() });
		}
		if payload.expires_in <= 0 {
			return Err(RefreshError::Payload { message: "expiresIn must be positive".into() });
		}
		if payload.expires_in > MAX_EXPIRES_IN_SECS {
			return Err(RefreshError::Payload {
				message: "expiresIn exceeds the supported range".into(),
			});
		}

		let token_type = payload
			.token_type
			.filter(|value| !value.trim().is_empty())
			.unwrap_or_else(|| self.config.default_token_type.clone());

		Credential::builder()
			.access_token(payload.access_token)
			.token_type(token_type)
			.issued_now()
			.expires_in(Duration::seconds(payload.expires_in))
			.build()
			.map_err(|err| RefreshError::Payload { message: err.to_string() })
	}

	/// Clears the stored credential and fires the login redirect.
	pub(crate) async fn abandon_session(&self) {
		// Clearing is best effort; the redirect must fire even if the store misbehaves.
		let _ = self.store.clear().await;

		self.redirect.on_session_expired(&self.config.login_path);
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.len() <= BODY_PREVIEW_LIMIT {
		return text.into_owned();
	}

	let mut preview: String = text.chars().take(BODY_PREVIEW_LIMIT).collect();

	preview.push_str("...");

	preview
}
