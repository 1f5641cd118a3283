//! Bearer credential model plus the wire types of the credential-grant exchange.

// self
use crate::{_prelude::*, auth::secret::SecretString};

/// Safety margin subtracted from the expiry instant when deciding refreshes.
///
/// Absorbs clock skew between client and token endpoint as well as the latency
/// of requests already in flight when the check runs.
pub const REFRESH_MARGIN: Duration = Duration::minutes(5);

/// Grant type sent in every credential exchange.
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// Errors produced while turning a token endpoint response into a [`Credential`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialError {
	/// Token endpoint returned a zero or negative `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}

/// Bearer credential currently held by a client.
///
/// Lives only in process memory; replaced wholesale on every refresh and never
/// persisted anywhere.
#[derive(Clone)]
pub struct Credential {
	/// Access token secret; callers must avoid logging it.
	pub access_token: SecretString,
	/// Token type reported by the endpoint, normally `bearer`.
	pub token_type: String,
	/// Instant the grant response was received.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `issued_at` plus the granted `expires_in`.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Builds a credential from a grant response received at `issued_at`.
	pub fn from_grant(
		grant: TokenGrantResponse,
		issued_at: OffsetDateTime,
	) -> Result<Self, CredentialError> {
		if grant.expires_in <= 0 {
			return Err(CredentialError::NonPositiveExpiresIn);
		}

		Ok(Self {
			access_token: SecretString::new(grant.access_token),
			token_type: grant.token_type,
			issued_at,
			expires_at: issued_at + Duration::seconds(grant.expires_in),
		})
	}

	/// Returns `true` once `now` reaches the refresh threshold (expiry minus margin).
	pub fn needs_refresh_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at - REFRESH_MARGIN
	}

	/// Returns `true` once the credential has fully expired at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Wire body of the credential-grant exchange request.
#[derive(Debug, Serialize)]
pub(crate) struct TokenGrantRequest<'a> {
	pub client_id: &'a str,
	pub client_secret: &'a str,
	pub grant_type: &'a str,
}

/// Wire body returned by the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenGrantResponse {
	/// Issued access token value.
	pub access_token: String,
	/// Lifetime of the token in seconds; must be positive.
	pub expires_in: i64,
	/// Token type, normally `bearer`.
	pub token_type: String,
}
