//! Immutable client configuration with validated construction and defaults.

// self
use crate::{_prelude::*, auth::SecretString};

/// Default API version sent in the version header of every request.
pub const DEFAULT_API_VERSION: &str = "2024-01-31";
/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);
/// Default maximum number of retries performed after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay between retry attempts; attempt *n* waits `n` times this.
pub const DEFAULT_RETRY_DELAY: StdDuration = StdDuration::from_secs(1);

type BoxError = Box<dyn StdError + Send + Sync>;

/// Configuration and validation failures raised while constructing a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// API version contains characters unusable in an HTTP header.
	#[error("API version `{version}` cannot be sent as a header value.")]
	InvalidApiVersion {
		/// Rejected version string.
		version: String,
	},
	/// Per-attempt timeout must be positive.
	#[error("Timeout must be positive.")]
	ZeroTimeout,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Immutable settings shared by every call a client issues.
///
/// Construct through [`ClientConfig::builder`]; optional fields fall back to the
/// crate defaults above. The client secret is redacted from all debug output.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Base URL every request path is resolved against.
	pub base_url: Url,
	/// Client identifier used in credential-grant exchanges.
	pub client_id: String,
	/// Client secret used in credential-grant exchanges.
	pub client_secret: SecretString,
	/// Version string sent in the API version header.
	pub api_version: String,
	/// Per-attempt timeout applied to every outbound call.
	pub timeout: StdDuration,
	/// Maximum retries after the initial attempt.
	pub max_retries: u32,
	/// Base delay between retries; retry *n* waits `n * retry_delay`.
	pub retry_delay: StdDuration,
}
impl ClientConfig {
	/// Starts a builder for the mandatory base URL + credential pair.
	pub fn builder(
		base_url: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> ClientConfigBuilder {
		ClientConfigBuilder {
			base_url: base_url.into(),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			api_version: None,
			timeout: None,
			max_retries: None,
			retry_delay: None,
		}
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	base_url: String,
	client_id: String,
	client_secret: String,
	api_version: Option<String>,
	timeout: Option<StdDuration>,
	max_retries: Option<u32>,
	retry_delay: Option<StdDuration>,
}
impl ClientConfigBuilder {
	/// Overrides the API version header value.
	pub fn api_version(mut self, version: impl Into<String>) -> Self {
		self.api_version = Some(version.into());

		self
	}

	/// Overrides the per-attempt timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Overrides the maximum number of retries after the initial attempt.
	pub fn max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = Some(max_retries);

		self
	}

	/// Overrides the base retry delay.
	pub fn retry_delay(mut self, retry_delay: StdDuration) -> Self {
		self.retry_delay = Some(retry_delay);

		self
	}

	/// Validates the settings and produces an immutable [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url =
			Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let api_version = self.api_version.unwrap_or_else(|| DEFAULT_API_VERSION.into());

		if !api_version.bytes().all(|byte| byte.is_ascii_graphic()) {
			return Err(ConfigError::InvalidApiVersion { version: api_version });
		}

		let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

		if timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}

		Ok(ClientConfig {
			base_url,
			client_id: self.client_id,
			client_secret: SecretString::new(self.client_secret),
			api_version,
			timeout,
			max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
			retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
		})
	}
}
