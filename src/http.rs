//! Transport construction shared by every outbound call.
//!
//! The module wraps [`ReqwestClient`] behind [`HttpTransport`] so timeout,
//! default headers, and User-Agent are configured in exactly one place. Tests
//! and embedders can inject a pre-built client through
//! [`HttpTransport::with_client`] without losing those conventions.

// std
use std::ops::Deref;
// crates.io
use reqwest::{RequestBuilder, header::{HeaderMap, HeaderValue}};
// self
use crate::{
	_prelude::*,
	config::{ClientConfig, ConfigError},
};

/// Header carrying the configured API version on every request.
pub const API_VERSION_HEADER: &str = "x-api-version";
/// User-Agent advertised by every request this crate issues.
pub const USER_AGENT: &str = concat!("token-courier/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone)]
pub struct HttpTransport(ReqwestClient);
impl HttpTransport {
	/// Builds a transport honoring the config's timeout, API version, and User-Agent.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let mut headers = HeaderMap::new();
		let version = HeaderValue::from_str(&config.api_version).map_err(|_| {
			ConfigError::InvalidApiVersion { version: config.api_version.clone() }
		})?;

		headers.insert(API_VERSION_HEADER, version);

		let client = ReqwestClient::builder()
			.timeout(config.timeout)
			.user_agent(USER_AGENT)
			.default_headers(headers)
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing [`ReqwestClient`].
	///
	/// The caller keeps responsibility for timeout and default-header choices;
	/// the per-attempt timeout from [`ClientConfig`] is NOT applied here.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Starts a request against the wrapped client.
	pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
		self.0.request(method, url)
	}
}
impl AsRef<ReqwestClient> for HttpTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for HttpTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transport_builds_from_default_config() {
		let config = ClientConfig::builder("https://api.example.com", "id", "secret")
			.build()
			.expect("Config should build.");

		assert!(HttpTransport::from_config(&config).is_ok());
	}

	#[test]
	fn user_agent_carries_the_crate_version() {
		assert!(USER_AGENT.starts_with("token-courier/"));
	}
}
