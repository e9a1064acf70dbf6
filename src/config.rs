//! Client configuration: backend endpoints, the public allow-list, and validation.

// self
use crate::{_prelude::*, auth::DEFAULT_TOKEN_TYPE, error::ConfigError};

/// Default public path fragments that never carry an `Authorization` header.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
	"/auth/login",
	"/auth/register",
	"/auth/refresh",
	"/auth/forgot-password",
	"/auth/reset-password",
	"/auth/oauth2",
	"/health",
];

/// Validated client configuration produced by [`ClientConfigBuilder`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Base URL every request path is joined against.
	pub base_url: Url,
	/// Backend path of the refresh endpoint (`POST`, no body, session cookie out-of-band).
	pub refresh_path: String,
	/// Application path the login redirect targets after an unrecoverable failure.
	pub login_path: String,
	/// Path fragments matched by substring containment against outgoing request paths.
	pub public_paths: Vec<String>,
	/// Token type attached when the stored credential or refresh payload omits one.
	pub default_token_type: String,
}
impl ClientConfig {
	/// Returns a builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Returns `true` when the path is on the public allow-list.
	pub fn is_public_path(&self, path: &str) -> bool {
		self.public_paths.iter().any(|fragment| path.contains(fragment.as_str()))
	}
}

/// Builder that validates endpoint shapes before producing a [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	base_url: Url,
	refresh_path: Option<String>,
	login_path: Option<String>,
	public_paths: Option<Vec<String>>,
	default_token_type: Option<String>,
}
impl ClientConfigBuilder {
	const DEFAULT_LOGIN_PATH: &'static str = "/auth/login";
	const DEFAULT_REFRESH_PATH: &'static str = "/auth/refresh";

	fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: None,
			login_path: None,
			public_paths: None,
			default_token_type: None,
		}
	}

	/// Overrides the refresh endpoint path (defaults to `/auth/refresh`).
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = Some(path.into());

		self
	}

	/// Overrides the login redirect target (defaults to `/auth/login`).
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = Some(path.into());

		self
	}

	/// Replaces the public allow-list (defaults to [`DEFAULT_PUBLIC_PATHS`]).
	pub fn public_paths<I, S>(mut self, paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.public_paths = Some(paths.into_iter().map(Into::into).collect());

		self
	}

	/// Overrides the fallback token type (defaults to `Bearer`).
	pub fn default_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.default_token_type = Some(token_type.into());

		self
	}

	/// Consumes the builder, validating every endpoint shape.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}

		let refresh_path =
			self.refresh_path.unwrap_or_else(|| Self::DEFAULT_REFRESH_PATH.to_owned());
		let login_path = self.login_path.unwrap_or_else(|| Self::DEFAULT_LOGIN_PATH.to_owned());

		validate_path("refresh", &refresh_path)?;
		validate_path("login", &login_path)?;

		let mut public_paths = self
			.public_paths
			.unwrap_or_else(|| DEFAULT_PUBLIC_PATHS.iter().map(|&p| p.to_owned()).collect());

		if public_paths.iter().any(|fragment| fragment.trim().is_empty()) {
			return Err(ConfigError::EmptyPublicPath);
		}
		// The refresh endpoint itself must never carry an Authorization header.
		if !public_paths.iter().any(|fragment| refresh_path.contains(fragment.as_str())) {
			public_paths.push(refresh_path.clone());
		}

		Ok(ClientConfig {
			base_url: self.base_url,
			refresh_path,
			login_path,
			public_paths,
			default_token_type: self
				.default_token_type
				.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned()),
		})
	}
}

fn validate_path(kind: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(ConfigError::RelativePath { kind, path: path.to_owned() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base_url() -> Url {
		Url::parse("https://api.example.com").expect("Base URL fixture should parse successfully.")
	}

	#[test]
	fn builder_applies_defaults() {
		let config = ClientConfig::builder(base_url())
			.build()
			.expect("Default configuration should build successfully.");

		assert_eq!(config.refresh_path, "/auth/refresh");
		assert_eq!(config.login_path, "/auth/login");
		assert_eq!(config.default_token_type, "Bearer");
		assert_eq!(config.public_paths.len(), DEFAULT_PUBLIC_PATHS.len());
	}

	#[test]
	fn builder_rejects_unsupported_schemes() {
		let ftp = Url::parse("ftp://files.example.com")
			.expect("Scheme fixture URL should parse successfully.");
		let err = ClientConfig::builder(ftp)
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
	}

	#[test]
	fn builder_rejects_relative_paths() {
		let err = ClientConfig::builder(base_url())
			.refresh_path("session/renew")
			.build()
			.expect_err("Relative refresh paths should be rejected.");

		assert!(matches!(err, ConfigError::RelativePath { kind: "refresh", .. }));
	}

	#[test]
	fn builder_rejects_empty_allow_list_entries() {
		let err = ClientConfig::builder(base_url())
			.public_paths(["/auth/login", "  "])
			.build()
			.expect_err("Blank allow-list entries should be rejected.");

		assert!(matches!(err, ConfigError::EmptyPublicPath));
	}

	#[test]
	fn refresh_path_is_always_public() {
		let config = ClientConfig::builder(base_url())
			.refresh_path("/session/renew")
			.public_paths(["/auth/login"])
			.build()
			.expect("Custom allow-list configuration should build successfully.");

		assert!(config.is_public_path("/session/renew"));
	}

	#[test]
	fn public_matching_uses_substring_containment() {
		let config = ClientConfig::builder(base_url())
			.build()
			.expect("Default configuration should build successfully.");

		assert!(config.is_public_path("/auth/login"));
		assert!(config.is_public_path("/api/v2/auth/login"));
		assert!(config.is_public_path("/health/liveness"));
		assert!(!config.is_public_path("/courses/7/modules"));
	}
}
