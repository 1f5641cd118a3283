//! Authenticated API client coordinating token lifecycle and resilient dispatch.

pub mod request;
pub mod token;

mod execute;

pub use request::*;
pub use token::RefreshStats;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::{ClientConfig, ConfigError},
	http::HttpTransport,
	obs::sink::{ErrorSink, ErrorTracker, Metrics, MetricsSink},
};

/// Coordinates authenticated calls against a single remote API.
///
/// The client owns the transport, the credential cache, and the observability
/// sinks so the request path can focus on retry and normalization logic.
/// Cloning is cheap; every clone shares one credential cache and one refresh
/// guard, so concurrent requests across clones still perform at most one
/// credential-grant exchange at a time.
#[derive(Clone)]
pub struct ApiClient {
	pub(crate) config: ClientConfig,
	pub(crate) transport: HttpTransport,
	pub(crate) credential: Arc<RwLock<Option<Credential>>>,
	pub(crate) refresh_guard: Arc<AsyncMutex<()>>,
	pub(crate) refresh_stats: Arc<RefreshStats>,
	pub(crate) metrics: Arc<dyn MetricsSink>,
	pub(crate) errors: Arc<dyn ErrorSink>,
}
impl ApiClient {
	/// Creates a client, provisioning its own transport from the config.
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		let transport = HttpTransport::from_config(&config)?;

		Ok(Self::with_transport(config, transport))
	}

	/// Creates a client reusing a caller-provided transport.
	pub fn with_transport(config: ClientConfig, transport: HttpTransport) -> Self {
		Self {
			config,
			transport,
			credential: Default::default(),
			refresh_guard: Default::default(),
			refresh_stats: Default::default(),
			metrics: Arc::new(Metrics::default()),
			errors: Arc::new(ErrorTracker::default()),
		}
	}

	/// Replaces the latency/call-count sink.
	pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
		self.metrics = sink;

		self
	}

	/// Replaces the terminal-error sink.
	pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
		self.errors = sink;

		self
	}

	/// Returns the immutable configuration this client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Resolves a request path against the configured base URL.
	pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url> {
		self.config.base_url.join(path).map_err(|err| ApiError::invalid_path(path, err))
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url)
			.field("client_id", &self.config.client_id)
			.field("credential_set", &self.credential.read().is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> ClientConfig {
		ClientConfig::builder("https://api.example.com", "client-id", "client-secret")
			.build()
			.expect("Test config should build.")
	}

	#[test]
	fn endpoint_urls_resolve_against_the_base() {
		let client = ApiClient::new(config()).expect("Client should build.");
		let url = client.endpoint_url("/v1/entities").expect("Path should resolve.");

		assert_eq!(url.as_str(), "https://api.example.com/v1/entities");
	}

	#[test]
	fn debug_output_reports_credential_presence_only() {
		let client = ApiClient::new(config()).expect("Client should build.");
		let rendered = format!("{client:?}");

		assert!(rendered.contains("credential_set: false"));
		assert!(!rendered.contains("client-secret"));
	}

	#[test]
	fn clones_share_the_credential_cache() {
		let client = ApiClient::new(config()).expect("Client should build.");
		let clone = client.clone();

		assert!(Arc::ptr_eq(&client.credential, &clone.credential));
		assert!(Arc::ptr_eq(&client.refresh_guard, &clone.refresh_guard));
	}
}
