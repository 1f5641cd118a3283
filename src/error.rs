//! Normalized error shape surfaced by every client operation.
//!
//! All request-path failures—transport, HTTP, decode, cancellation—collapse into
//! [`ApiError`] before crossing the crate boundary. Callers never observe raw
//! transport errors; the original failure stays reachable through
//! [`StdError::source`] for diagnostics.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`ApiError`] by default.
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Stable machine-readable codes attached to every [`ApiError`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
	/// Credential-grant exchange failed; fatal for the current request, never retried.
	AuthRefresh,
	/// Remote API answered with an error status and no usable error code of its own.
	Api,
	/// Connection-level failure (refused, reset, timeout, DNS) with no HTTP response.
	Network,
	/// The caller cancelled the request before it completed.
	Cancelled,
	/// Unexpected failure matching no other classification; never retried.
	Unknown,
	/// Error code string supplied verbatim by the remote API response body.
	Upstream(String),
}
impl ErrorCode {
	/// Returns the stable label surfaced in logs and error keys.
	pub fn as_str(&self) -> &str {
		match self {
			ErrorCode::AuthRefresh => "AUTH_REFRESH_ERROR",
			ErrorCode::Api => "API_ERROR",
			ErrorCode::Network => "NETWORK_ERROR",
			ErrorCode::Cancelled => "CANCELLED",
			ErrorCode::Unknown => "UNKNOWN_ERROR",
			ErrorCode::Upstream(code) => code,
		}
	}
}
impl Display for ErrorCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Normalized error surfaced for every failed API call.
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct ApiError {
	/// Human-readable failure summary; prefers the response body's `message` field.
	pub message: String,
	/// Stable machine-readable code.
	pub code: ErrorCode,
	/// HTTP status returned by the remote API, when a response was received.
	pub http_status: Option<u16>,
	/// Structured error payload returned by the remote API, when one parsed.
	pub details: Option<serde_json::Value>,
	/// Number of retry attempts performed before the failure became terminal.
	pub retry_count: u32,
	/// Underlying transport or decode failure, when one exists.
	#[source]
	pub source: Option<BoxError>,
}
impl ApiError {
	fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			code,
			http_status: None,
			details: None,
			retry_count: 0,
			source: None,
		}
	}

	/// Normalizes a non-success HTTP response.
	///
	/// `message` and `code` come from the response body when it carries them;
	/// otherwise the status line stands in and the code falls back to
	/// [`ErrorCode::Api`]. The parsed payload, when any, is retained in `details`.
	pub fn from_response(status: u16, body: &[u8]) -> Self {
		let details: Option<serde_json::Value> = serde_json::from_slice(body).ok();
		let message = details
			.as_ref()
			.and_then(|value| value.get("message"))
			.and_then(serde_json::Value::as_str)
			.map(str::to_owned)
			.unwrap_or_else(|| format!("API request failed with HTTP status {status}."));
		let code = details
			.as_ref()
			.and_then(|value| value.get("code"))
			.and_then(serde_json::Value::as_str)
			.map(|code| ErrorCode::Upstream(code.to_owned()))
			.unwrap_or(ErrorCode::Api);

		Self { message, code, http_status: Some(status), details, retry_count: 0, source: None }
	}

	/// Normalizes a transport-level failure that produced no HTTP response.
	pub fn network(err: ReqwestError) -> Self {
		let status = err.status().map(|status| status.as_u16());
		let mut error = Self::new(ErrorCode::Network, err.to_string());

		error.http_status = status;
		error.source = Some(Box::new(err));

		error
	}

	/// Builds the error surfaced when the caller cancels a request.
	pub fn cancelled(retry_count: u32) -> Self {
		let mut error =
			Self::new(ErrorCode::Cancelled, "Request was cancelled before it completed.");

		error.retry_count = retry_count;

		error
	}

	/// Normalizes a response-body decode failure.
	pub fn decode(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let mut error =
			Self::new(ErrorCode::Unknown, format!("Response body could not be decoded: {err}."));

		error.source = Some(Box::new(err));

		error
	}

	/// Builds the error surfaced when a request path does not resolve against the base URL.
	pub fn invalid_path(path: &str, err: url::ParseError) -> Self {
		let mut error = Self::new(
			ErrorCode::Unknown,
			format!("Request path `{path}` could not be resolved against the base URL."),
		);

		error.source = Some(Box::new(err));

		error
	}

	/// Wraps an unexpected failure with its own message.
	pub fn unknown(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::Unknown, message)
	}

	/// Wraps a credential-grant exchange failure, forcing [`ErrorCode::AuthRefresh`].
	pub(crate) fn auth_refresh(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::AuthRefresh, message)
	}

	/// Normalizes a non-success token endpoint response, forcing [`ErrorCode::AuthRefresh`].
	pub(crate) fn auth_refresh_response(status: u16, body: &[u8]) -> Self {
		let mut error = Self::from_response(status, body);
		let body_message = error
			.details
			.as_ref()
			.and_then(|value| value.get("message"))
			.and_then(serde_json::Value::as_str)
			.is_some();

		if !body_message {
			error.message = format!("Credential-grant exchange failed with HTTP status {status}.");
		}

		error.code = ErrorCode::AuthRefresh;

		error
	}

	/// Attaches the underlying failure for `source()` chains.
	pub(crate) fn with_source(mut self, source: impl 'static + Send + Sync + StdError) -> Self {
		self.source = Some(Box::new(source));

		self
	}

	/// Stamps the number of retries performed before this failure became terminal.
	pub(crate) fn with_retry_count(mut self, retry_count: u32) -> Self {
		self.retry_count = retry_count;

		self
	}

	/// Returns `true` when the retry policy may re-attempt after this failure.
	pub fn is_retryable(&self) -> bool {
		if matches!(self.code, ErrorCode::Network) {
			return true;
		}

		self.http_status.is_some_and(|status| status >= 500)
	}

	/// Returns the aggregation key consumed by error sinks: `<code>:<message>`.
	pub fn error_key(&self) -> String {
		format!("{}:{}", self.code.as_str(), self.message)
	}
}
