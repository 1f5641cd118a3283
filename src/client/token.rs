//! Token lifecycle: cached credential, singleflight refresh, forced rotation.
//!
//! Every outbound call asks [`ApiClient::bearer_token`] for a non-stale token.
//! Callers that observe a stale or absent credential serialize on one async
//! guard and re-check the cache after acquiring it, so concurrent requests
//! piggy-back on a single credential-grant exchange instead of stampeding the
//! token endpoint. The exchange itself performs exactly one attempt; the
//! generic retry policy does not apply to it.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use reqwest::header::HeaderValue;
// self
use crate::{
	_prelude::*,
	auth::{
		Credential, GRANT_TYPE_CLIENT_CREDENTIALS, SecretString, TokenGrantResponse,
		credential::TokenGrantRequest,
	},
	client::ApiClient,
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Path of the credential-grant endpoint, relative to the base URL.
pub const TOKEN_ENDPOINT: &str = "/v1/auth/token";

/// Thread-safe counters for credential-grant exchanges.
#[derive(Debug, Default)]
pub struct RefreshStats {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshStats {
	/// Returns the total number of exchange attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful exchanges.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed exchanges.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}

impl ApiClient {
	/// Returns the currently cached access token, if any.
	pub fn access_token(&self) -> Option<SecretString> {
		self.credential.read().as_ref().map(|credential| credential.access_token.clone())
	}

	/// Returns the expiry instant of the currently cached credential, if any.
	pub fn token_expires_at(&self) -> Option<OffsetDateTime> {
		self.credential.read().as_ref().map(|credential| credential.expires_at)
	}

	/// Returns the exchange counters shared by every clone of this client.
	pub fn refresh_stats(&self) -> &RefreshStats {
		&self.refresh_stats
	}

	/// Performs an unconditional credential-grant exchange.
	///
	/// Runs under the same singleflight guard as implicit refreshes; two
	/// sequential calls perform two exchanges, the second credential replacing
	/// the first.
	pub async fn force_token_refresh(&self) -> Result<Credential> {
		let _singleflight = self.refresh_guard.lock().await;

		self.refresh_credential().await
	}

	/// Returns a token valid for at least the refresh margin, exchanging if needed.
	pub(crate) async fn bearer_token(&self) -> Result<SecretString> {
		if let Some(token) = self.fresh_token_at(OffsetDateTime::now_utc()) {
			return Ok(token);
		}

		let _singleflight = self.refresh_guard.lock().await;

		// A concurrent caller may have refreshed while this one awaited the guard.
		if let Some(token) = self.fresh_token_at(OffsetDateTime::now_utc()) {
			return Ok(token);
		}

		let credential = self.refresh_credential().await?;

		Ok(credential.access_token)
	}

	/// Builds the `Authorization` header for the current (possibly refreshed) token.
	pub(crate) async fn authorization_header(&self) -> Result<HeaderValue> {
		let token = self.bearer_token().await?;
		let mut value =
			HeaderValue::from_str(&format!("Bearer {}", token.expose())).map_err(|err| {
				ApiError::unknown("Access token produced an unusable Authorization header.")
					.with_source(err)
			})?;

		value.set_sensitive(true);

		Ok(value)
	}

	fn fresh_token_at(&self, now: OffsetDateTime) -> Option<SecretString> {
		self.credential
			.read()
			.as_ref()
			.filter(|credential| !credential.needs_refresh_at(now))
			.map(|credential| credential.access_token.clone())
	}

	async fn refresh_credential(&self) -> Result<Credential> {
		const KIND: CallKind = CallKind::TokenRefresh;

		let span = CallSpan::new(KIND, "refresh_credential");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.refresh_stats.record_attempt();

		let result = span.instrument(self.exchange_credentials()).await;

		match &result {
			Ok(_) => {
				obs::record_call_outcome(KIND, CallOutcome::Success);
				self.refresh_stats.record_success();
			},
			Err(_) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);
				self.refresh_stats.record_failure();
			},
		}

		result
	}

	async fn exchange_credentials(&self) -> Result<Credential> {
		let url = self.endpoint_url(TOKEN_ENDPOINT)?;
		let grant = TokenGrantRequest {
			client_id: &self.config.client_id,
			client_secret: self.config.client_secret.expose(),
			grant_type: GRANT_TYPE_CLIENT_CREDENTIALS,
		};
		// One attempt only; exchange failures surface immediately instead of
		// feeding the generic retry policy.
		let response = self
			.transport
			.request(Method::POST, url)
			.json(&grant)
			.send()
			.await
			.map_err(|err| {
				ApiError::auth_refresh("Credential-grant exchange could not reach the token endpoint.")
					.with_source(err)
			})?;
		let status = response.status();
		let body = response.bytes().await.map_err(|err| {
			ApiError::auth_refresh("Credential-grant exchange response could not be read.")
				.with_source(err)
		})?;

		if !status.is_success() {
			return Err(ApiError::auth_refresh_response(status.as_u16(), &body));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let grant: TokenGrantResponse =
			serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
				ApiError::auth_refresh("Token endpoint returned a malformed grant response.")
					.with_source(err)
			})?;
		let credential =
			Credential::from_grant(grant, OffsetDateTime::now_utc()).map_err(|err| {
				ApiError::auth_refresh("Token endpoint granted an unusable credential lifetime.")
					.with_source(err)
			})?;

		// Single-writer replacement; readers observe the old or new credential, never a torn one.
		*self.credential.write() = Some(credential.clone());

		Ok(credential)
	}
}
