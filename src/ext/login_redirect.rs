//! Login-redirect contract fired when a refresh cycle fails terminally.

/// Application hook invoked once per unrecoverable session failure.
///
/// The client fires the hook after the token store has been cleared, so the application is
/// never left holding a credential the backend already rejected. Implementations typically
/// navigate the user agent to the login entry point.
pub trait LoginRedirect
where
	Self: Send + Sync,
{
	/// Reacts to an expired session; `login_path` is the configured redirect target.
	fn on_session_expired(&self, login_path: &str);
}

/// Default hook that records the event and otherwise does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLoginRedirect;
impl LoginRedirect for NoopLoginRedirect {
	fn on_session_expired(&self, login_path: &str) {
		#[cfg(feature = "tracing")]
		tracing::debug!(login_path, "Session expired without a redirect hook installed.");
		#[cfg(not(feature = "tracing"))]
		let _ = login_path;
	}
}
