#![cfg(feature = "reqwest")]

// std
use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use bearer_gate::{
	auth::Credential,
	client::{Client, ReqwestGateClient},
	config::ClientConfig,
	error::{Error, RefreshError},
	ext::LoginRedirect,
	http::ApiRequest,
	store::{MemoryStore, TokenStore},
	url::Url,
};

const STALE: &str = "stale-token";
const FRESH: &str = "fresh-token";

/// Login-redirect double that counts invocations and records the target path.
#[derive(Debug, Default)]
struct RecordingRedirect {
	invocations: AtomicUsize,
	last_target: Mutex<Option<String>>,
}
impl RecordingRedirect {
	fn invocations(&self) -> usize {
		self.invocations.load(Ordering::SeqCst)
	}

	fn last_target(&self) -> Option<String> {
		self.last_target.lock().expect("Redirect mutex should not be poisoned.").clone()
	}
}
impl LoginRedirect for RecordingRedirect {
	fn on_session_expired(&self, login_path: &str) {
		self.invocations.fetch_add(1, Ordering::SeqCst);
		*self.last_target.lock().expect("Redirect mutex should not be poisoned.") =
			Some(login_path.to_owned());
	}
}

fn build_client(server: &MockServer) -> (ReqwestGateClient, Arc<MemoryStore>, Arc<RecordingRedirect>) {
	let store = Arc::new(MemoryStore::default());
	let redirect = Arc::new(RecordingRedirect::default());
	let config = ClientConfig::builder(
		Url::parse(&server.url("")).expect("Mock server URL should parse successfully."),
	)
	.build()
	.expect("Client configuration should build successfully.");
	let client = Client::new(store.clone(), config)
		.expect("Reqwest client should build successfully.")
		.with_login_redirect(redirect.clone());

	(client, store, redirect)
}

async fn seed_credential(store: &MemoryStore, token: &str) {
	let credential = Credential::builder()
		.access_token(token)
		.issued_now()
		.expires_in(Duration::minutes(30))
		.build()
		.expect("Credential fixture should build successfully.");

	store.set(credential).await.expect("Seeding the memory store should succeed.");
}

fn refresh_body(token: &str, expires_in: u64) -> String {
	format!(r#"{{"accessToken":"{token}","tokenType":"Bearer","expiresIn":{expires_in}}}"#)
}

#[tokio::test]
async fn first_unauthorized_refreshes_and_replays() {
	let server = MockServer::start_async().await;
	let (client, store, redirect) = build_client(&server);

	seed_credential(&store, STALE).await;

	let stale_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer stale-token");
			then.status(401);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(refresh_body(FRESH, 1800));
		})
		.await;
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer fresh-token");
			then.status(200).body(r#"{"id":7}"#);
		})
		.await;
	let response = client
		.send(ApiRequest::get("/profile"))
		.await
		.expect("Refresh-and-replay should resolve transparently.");

	stale_mock.assert_async().await;
	refresh_mock.assert_async().await;
	fresh_mock.assert_async().await;

	assert_eq!(response.status.as_u16(), 200);
	assert_eq!(response.text(), r#"{"id":7}"#);

	let current = store
		.get()
		.await
		.expect("Reading the store should succeed.")
		.expect("Store should hold the refreshed credential.");

	assert_eq!(current.access_token.expose(), FRESH);
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);
	assert_eq!(redirect.invocations(), 0, "A successful cycle must not redirect.");
}

#[tokio::test]
async fn concurrent_failures_share_one_refresh() {
	let server = MockServer::start_async().await;
	let (client, store, _redirect) = build_client(&server);

	seed_credential(&store, STALE).await;

	let _stale_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer stale-token");
			then.status(401);
		})
		.await;
	// The delay keeps the cycle open long enough for every 401 of the wave to arrive.
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(refresh_body(FRESH, 1800))
				.delay(StdDuration::from_millis(250));
		})
		.await;
	let _fresh_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer fresh-token");
			then.status(200).body("{}");
		})
		.await;
	let (first, second, third) = tokio::join!(
		client.send(ApiRequest::get("/profile")),
		client.send(ApiRequest::get("/profile")),
		client.send(ApiRequest::get("/profile")),
	);

	for result in [first, second, third] {
		let response = result.expect("Every request of the wave should resolve.");

		assert_eq!(response.status.as_u16(), 200);
	}

	refresh_mock.assert_calls_async(1).await;

	assert_eq!(client.refresh_metrics.attempts(), 1, "The wave must collapse into one cycle.");
}

#[tokio::test]
async fn refresh_failure_rejects_the_wave_and_redirects_once() {
	let server = MockServer::start_async().await;
	let (client, store, redirect) = build_client(&server);

	seed_credential(&store, STALE).await;

	let _unauthorized_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/library");
			then.status(401);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"session_expired"}"#)
				.delay(StdDuration::from_millis(250));
		})
		.await;
	let (first, second, third) = tokio::join!(
		client.send(ApiRequest::get("/library")),
		client.send(ApiRequest::get("/library")),
		client.send(ApiRequest::get("/library")),
	);

	for result in [first, second, third] {
		let err = result.expect_err("Every request behind the failed refresh should error.");

		assert!(matches!(err, Error::Refresh(RefreshError::Endpoint { status: 400, .. })));
	}

	refresh_mock.assert_calls_async(1).await;

	assert!(store.is_empty(), "A failed refresh must clear the stored credential.");
	assert_eq!(redirect.invocations(), 1, "The login redirect must fire exactly once per cycle.");
	assert_eq!(redirect.last_target().as_deref(), Some("/auth/login"));
	assert_eq!(client.refresh_metrics.failures(), 1);

	// The coordinator must come back idle: a later request starts a fresh cycle.
	let retry = client
		.send(ApiRequest::get("/library"))
		.await
		.expect_err("A later request should lead its own refresh cycle.");

	assert!(matches!(retry, Error::Refresh(RefreshError::Endpoint { status: 400, .. })));

	refresh_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn replayed_request_rejected_again_gives_up() {
	let server = MockServer::start_async().await;
	let (client, store, redirect) = build_client(&server);

	seed_credential(&store, STALE).await;

	let locked_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/locked");
			then.status(401);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(refresh_body(FRESH, 1800));
		})
		.await;
	let err = client
		.send(ApiRequest::get("/locked"))
		.await
		.expect_err("A replay rejected again should surface a terminal failure.");

	assert!(matches!(err, Error::AuthorizationDenied { status: 401 }));

	refresh_mock.assert_calls_async(1).await;
	locked_mock.assert_calls_async(2).await;

	assert!(store.is_empty(), "A dead session must not leave a credential behind.");
	assert_eq!(redirect.invocations(), 1);
}

#[tokio::test]
async fn refreshed_credential_serves_later_requests() {
	let server = MockServer::start_async().await;
	let (client, store, _redirect) = build_client(&server);

	seed_credential(&store, STALE).await;

	let _stale_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer stale-token");
			then.status(401);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(refresh_body(FRESH, 1800));
		})
		.await;
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer fresh-token");
			then.status(200).body("{}");
		})
		.await;
	let first = client
		.send(ApiRequest::get("/profile"))
		.await
		.expect("Refresh-and-replay should resolve transparently.");
	let second = client
		.send(ApiRequest::get("/profile"))
		.await
		.expect("A later request should reuse the refreshed credential.");

	assert_eq!(first.status.as_u16(), 200);
	assert_eq!(second.status.as_u16(), 200);

	refresh_mock.assert_calls_async(1).await;
	fresh_mock.assert_calls_async(2).await;

	assert_eq!(
		client.refresh_metrics.attempts(),
		1,
		"A request issued after the cycle must not trigger another refresh.",
	);
}
