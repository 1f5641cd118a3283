//! Retry policy: failure classification and linear backoff.
//!
//! Only two failure shapes qualify for another attempt: transport errors that
//! produced no HTTP response (refused, reset, timeout, DNS) and responses with
//! status ≥ 500. Client errors (400–499) are terminal on the first attempt, and
//! credential-exchange failures bypass the policy entirely.

// self
use crate::_prelude::*;

/// Decides whether and when a failed attempt is retried.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
	max_retries: u32,
	retry_delay: StdDuration,
}
impl RetryPolicy {
	/// Creates a policy allowing `max_retries` retries spaced by linear backoff.
	pub fn new(max_retries: u32, retry_delay: StdDuration) -> Self {
		Self { max_retries, retry_delay }
	}

	/// Returns `true` when `failure` qualifies and the retry budget is not exhausted.
	pub(crate) fn should_retry(&self, failure: &AttemptFailure, retries_so_far: u32) -> bool {
		failure.is_retryable() && retries_so_far < self.max_retries
	}

	/// Returns the delay preceding retry `retry_number` (1-indexed): `n * retry_delay`.
	pub fn delay_before(&self, retry_number: u32) -> StdDuration {
		self.retry_delay.saturating_mul(retry_number)
	}
}

/// Returns `true` for HTTP statuses the policy treats as transient.
pub fn is_retryable_status(status: u16) -> bool {
	status >= 500
}

/// Internal failure shape produced by a single request attempt.
#[derive(Debug)]
pub(crate) enum AttemptFailure {
	/// Already-normalized failure that must bypass the retry policy
	/// (credential-exchange errors, unusable tokens).
	Fatal(ApiError),
	/// HTTP response with a non-success status.
	Status {
		/// Status code of the response.
		status: u16,
		/// Raw response body, parsed lazily during normalization.
		body: Vec<u8>,
	},
	/// Transport-level failure with no HTTP response.
	Transport(ReqwestError),
}
impl AttemptFailure {
	pub(crate) fn is_retryable(&self) -> bool {
		match self {
			AttemptFailure::Fatal(_) => false,
			AttemptFailure::Status { status, .. } => is_retryable_status(*status),
			AttemptFailure::Transport(_) => true,
		}
	}

	/// Normalizes the failure, stamping the retries actually performed.
	pub(crate) fn into_error(self, retry_count: u32) -> ApiError {
		match self {
			AttemptFailure::Fatal(error) => error.with_retry_count(retry_count),
			AttemptFailure::Status { status, body } =>
				ApiError::from_response(status, &body).with_retry_count(retry_count),
			AttemptFailure::Transport(error) =>
				ApiError::network(error).with_retry_count(retry_count),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn backoff_grows_linearly() {
		let policy = RetryPolicy::new(3, StdDuration::from_millis(100));

		assert_eq!(policy.delay_before(1), StdDuration::from_millis(100));
		assert_eq!(policy.delay_before(2), StdDuration::from_millis(200));
		assert_eq!(policy.delay_before(3), StdDuration::from_millis(300));
	}

	#[test]
	fn server_errors_retry_until_budget_is_spent() {
		let policy = RetryPolicy::new(3, StdDuration::from_millis(1));
		let failure = AttemptFailure::Status { status: 503, body: Vec::new() };

		assert!(policy.should_retry(&failure, 0));
		assert!(policy.should_retry(&failure, 2));
		assert!(!policy.should_retry(&failure, 3));
	}

	#[test]
	fn client_errors_never_retry() {
		let policy = RetryPolicy::new(3, StdDuration::from_millis(1));

		assert!(!policy.should_retry(&AttemptFailure::Status { status: 404, body: Vec::new() }, 0));
		assert!(!policy.should_retry(&AttemptFailure::Status { status: 400, body: Vec::new() }, 0));
		assert!(!policy.should_retry(&AttemptFailure::Status { status: 499, body: Vec::new() }, 0));
	}

	#[test]
	fn fatal_failures_bypass_the_policy() {
		let policy = RetryPolicy::new(3, StdDuration::from_millis(1));
		let failure = AttemptFailure::Fatal(ApiError::auth_refresh("Exchange failed."));

		assert!(!policy.should_retry(&failure, 0));
	}

	#[test]
	fn status_classification_splits_at_500() {
		assert!(is_retryable_status(500));
		assert!(is_retryable_status(503));
		assert!(!is_retryable_status(499));
		assert!(!is_retryable_status(404));
	}

	#[test]
	fn normalization_stamps_retry_count() {
		let failure = AttemptFailure::Status { status: 503, body: Vec::new() };
		let error = failure.into_error(3);

		assert_eq!(error.retry_count, 3);
		assert_eq!(error.http_status, Some(503));
	}
}
