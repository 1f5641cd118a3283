//! Latency and error sinks consumed at the client's observability boundary.
//!
//! The client reports one latency sample per completed request, one call-count
//! increment per observed HTTP response, and one error event per terminal
//! failure. Aggregation and alerting live behind the sink traits so embedders
//! can forward into their own pipelines; the in-memory [`Metrics`] and
//! [`ErrorTracker`] implementations ship as defaults.

// self
use crate::_prelude::*;

/// Number of identical error events after which [`ErrorTracker`] raises an alert.
pub const DEFAULT_ERROR_THRESHOLD: u64 = 5;

/// Receives latency samples and call counts from the client.
pub trait MetricsSink
where
	Self: Send + Sync,
{
	/// Records the duration of one completed call, successful or not.
	fn record_api_latency(&self, path: &str, method: &str, duration_secs: f64);

	/// Counts one HTTP response observed for the path/method/status triple.
	fn increment_api_calls(&self, path: &str, method: &str, status: u16);
}

/// Receives one event per terminal request failure.
pub trait ErrorSink
where
	Self: Send + Sync,
{
	/// Tracks a terminal failure together with its call-site context.
	fn track_error(&self, error: &ApiError, context: ErrorContext);
}

/// Call-site metadata attached to tracked errors.
#[derive(Clone, Debug, Default)]
pub struct ErrorContext {
	/// Fully resolved URL of the failed call, when known.
	pub url: Option<String>,
	/// HTTP method of the failed call, when known.
	pub method: Option<String>,
}
impl ErrorContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches the resolved URL.
	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());

		self
	}

	/// Attaches the HTTP method.
	pub fn with_method(mut self, method: impl Into<String>) -> Self {
		self.method = Some(method.into());

		self
	}
}

/// In-memory [`MetricsSink`] retaining per-endpoint call counts and latency series.
#[derive(Debug, Default)]
pub struct Metrics {
	calls: Mutex<HashMap<String, u64>>,
	latencies: Mutex<HashMap<String, Vec<f64>>>,
}
impl Metrics {
	fn key(path: &str, method: &str, status: Option<u16>) -> String {
		match status {
			Some(status) => format!("{method}:{path}:{status}"),
			None => format!("{method}:{path}"),
		}
	}

	/// Returns how many responses were observed for the path/method (and status, if given).
	pub fn api_call_count(&self, path: &str, method: &str, status: Option<u16>) -> u64 {
		self.calls.lock().get(&Self::key(path, method, status)).copied().unwrap_or(0)
	}

	/// Returns the recorded latency series for the path/method pair.
	pub fn api_latencies(&self, path: &str, method: &str) -> Vec<f64> {
		self.latencies.lock().get(&Self::key(path, method, None)).cloned().unwrap_or_default()
	}

	/// Returns the mean latency for the path/method pair, `0.0` when no samples exist.
	pub fn average_latency(&self, path: &str, method: &str) -> f64 {
		let samples = self.api_latencies(path, method);

		if samples.is_empty() {
			return 0.;
		}

		samples.iter().sum::<f64>() / samples.len() as f64
	}

	/// Clears every retained count and sample.
	pub fn reset(&self) {
		self.calls.lock().clear();
		self.latencies.lock().clear();
	}
}
impl MetricsSink for Metrics {
	fn record_api_latency(&self, path: &str, method: &str, duration_secs: f64) {
		self.latencies
			.lock()
			.entry(Self::key(path, method, None))
			.or_default()
			.push(duration_secs);
	}

	fn increment_api_calls(&self, path: &str, method: &str, status: u16) {
		*self.calls.lock().entry(Self::key(path, method, Some(status))).or_insert(0) += 1;
	}
}

/// In-memory [`ErrorSink`] that counts identical failures and flags repeats.
///
/// Identity is the error key `<code>:<message>`; once a key recurs
/// [`DEFAULT_ERROR_THRESHOLD`] times (or a configured threshold), every further
/// occurrence raises a repeated-error alert through `tracing` (when enabled).
#[derive(Debug)]
pub struct ErrorTracker {
	threshold: u64,
	counts: Mutex<HashMap<String, u64>>,
}
impl ErrorTracker {
	/// Creates a tracker alerting after `threshold` identical events.
	pub fn with_threshold(threshold: u64) -> Self {
		Self { threshold, counts: Mutex::default() }
	}

	/// Returns how often the given error key has been tracked.
	pub fn occurrences(&self, error_key: &str) -> u64 {
		self.counts.lock().get(error_key).copied().unwrap_or(0)
	}

	/// Clears every retained count.
	pub fn reset(&self) {
		self.counts.lock().clear();
	}

	fn trigger_alert(&self, error_key: &str, count: u64, context: &ErrorContext) {
		#[cfg(feature = "tracing")]
		{
			tracing::warn!(
				error = %error_key,
				count,
				threshold = self.threshold,
				url = context.url.as_deref(),
				method = context.method.as_deref(),
				"Error threshold exceeded."
			);
		}

		#[cfg(not(feature = "tracing"))]
		{
			let _ = (error_key, count, context);
		}
	}
}
impl Default for ErrorTracker {
	fn default() -> Self {
		Self::with_threshold(DEFAULT_ERROR_THRESHOLD)
	}
}
impl ErrorSink for ErrorTracker {
	fn track_error(&self, error: &ApiError, context: ErrorContext) {
		let error_key = error.error_key();
		let count = {
			let mut counts = self.counts.lock();
			let count = counts.entry(error_key.clone()).or_insert(0);

			*count += 1;

			*count
		};

		#[cfg(feature = "tracing")]
		{
			tracing::error!(
				error = %error_key,
				count,
				status = error.http_status,
				retries = error.retry_count,
				url = context.url.as_deref(),
				method = context.method.as_deref(),
				"API call failed."
			);
		}

		if count >= self.threshold {
			self.trigger_alert(&error_key, count, &context);
		}

		#[cfg(not(feature = "tracing"))]
		{
			let _ = context;
		}
	}
}
