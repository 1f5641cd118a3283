//! Optional observability helpers plus the latency/error sink boundary.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_courier.call` with the `call`
//!   (request or token refresh) and `stage`/`method`/`path` fields.
//! - Enable `metrics` to increment the `token_courier_call_total` counter for every
//!   attempt/success/failure, labeled by `call` + `outcome`, and the
//!   `token_courier_retry_total` counter for every retry performed.
//!
//! Independent of both features, the [`sink`] module defines the boundary through
//! which the client reports latency samples and terminal errors to its collaborators.

mod metrics;
mod tracing;

pub mod sink;

pub use metrics::*;
pub use sink::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outbound call kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Caller-issued API request.
	Request,
	/// Credential-grant exchange against the token endpoint.
	TokenRefresh,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Request => "request",
			CallKind::TokenRefresh => "token_refresh",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
