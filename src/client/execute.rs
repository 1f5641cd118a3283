//! Request execution: auth injection, retry loop, cancellation, normalization.
//!
//! One logical call flows through [`ApiClient::request`]: resolve a bearer
//! token, issue the attempt, classify any failure against the retry policy,
//! wait out the linear backoff, and normalize whatever remains into
//! [`ApiError`]. The caller observes a typed success value or one normalized
//! error; retries stay internal except for the final `retry_count`.

// crates.io
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	client::{ApiClient, request::ApiRequest},
	obs::{self, CallKind, CallOutcome, CallSpan, sink::ErrorContext},
	retry::{AttemptFailure, RetryPolicy},
};

impl ApiClient {
	/// Executes one logical API call, returning the deserialized response body.
	///
	/// The bearer token is validated (and refreshed if stale) before every
	/// attempt. Transient failures are retried per the configured policy with
	/// linear backoff; terminal failures surface as a single [`ApiError`]. One
	/// latency sample is reported per call, success or not, and every terminal
	/// failure is forwarded to the error sink.
	pub async fn request<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::Request;

		let method = request.method.clone();
		let path = request.path.clone();
		let span = CallSpan::for_request(method.as_str(), &path);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let started = Instant::now();
		let result = span.instrument(self.dispatch(&request)).await;

		self.metrics.record_api_latency(&path, method.as_str(), started.elapsed().as_secs_f64());

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(error) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);

				let url = self
					.endpoint_url(&path)
					.map(|url| url.to_string())
					.unwrap_or_else(|_| path.clone());

				self.errors.track_error(
					error,
					ErrorContext::new().with_url(url).with_method(method.as_str()),
				);
			},
		}

		result
	}

	async fn dispatch<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let url = self.endpoint_url(&request.path)?;
		let body = self.execute_with_retry(request, &url).await?;

		decode_body(&body)
	}

	async fn execute_with_retry(&self, request: &ApiRequest, url: &Url) -> Result<Vec<u8>> {
		let policy = RetryPolicy::new(self.config.max_retries, self.config.retry_delay);
		let mut retries = 0;

		loop {
			let attempt = self.attempt(request, url);
			let outcome = match &request.cancel {
				Some(cancel) => tokio::select! {
					_ = cancel.cancelled() => return Err(ApiError::cancelled(retries)),
					outcome = attempt => outcome,
				},
				None => attempt.await,
			};
			let failure = match outcome {
				Ok(body) => return Ok(body),
				Err(failure) => failure,
			};

			if !policy.should_retry(&failure, retries) {
				return Err(failure.into_error(retries));
			}

			retries += 1;

			obs::record_retry(CallKind::Request);

			let delay = policy.delay_before(retries);

			match &request.cancel {
				Some(cancel) => tokio::select! {
					_ = cancel.cancelled() => return Err(ApiError::cancelled(retries)),
					_ = tokio::time::sleep(delay) => {},
				},
				None => tokio::time::sleep(delay).await,
			}
		}
	}

	async fn attempt(&self, request: &ApiRequest, url: &Url) -> Result<Vec<u8>, AttemptFailure> {
		let authorization =
			self.authorization_header().await.map_err(AttemptFailure::Fatal)?;
		let mut builder = self
			.transport
			.request(request.method.clone(), url.clone())
			.header(AUTHORIZATION, authorization)
			.headers(request.headers.clone());

		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder.send().await.map_err(AttemptFailure::Transport)?;
		let status = response.status();
		let body = response.bytes().await.map_err(AttemptFailure::Transport)?;

		self.metrics.increment_api_calls(&request.path, request.method.as_str(), status.as_u16());

		if status.is_success() {
			Ok(body.to_vec())
		} else {
			Err(AttemptFailure::Status { status: status.as_u16(), body: body.to_vec() })
		}
	}
}

/// Decodes a response body; empty bodies (204, DELETE responses) decode as JSON `null`.
fn decode_body<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let raw: &[u8] = if body.is_empty() { b"null" } else { body };
	let mut deserializer = serde_json::Deserializer::from_slice(raw);

	serde_path_to_error::deserialize(&mut deserializer).map_err(ApiError::decode)
}
