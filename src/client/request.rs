//! Request description accepted by [`ApiClient::request`](crate::client::ApiClient::request).

// crates.io
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
// self
use crate::_prelude::*;

/// One logical API call: method, path, optional body/headers, optional cancellation.
///
/// The path is resolved against the client's base URL at dispatch time. Bodies
/// are opaque JSON values; the client attaches auth and version headers itself,
/// so per-request headers are only needed for endpoint-specific extras.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method of the call.
	pub method: Method,
	/// Path resolved against the client's base URL, e.g. `/v1/entities`.
	pub path: String,
	/// Optional JSON body sent with the call.
	pub body: Option<serde_json::Value>,
	/// Extra headers merged into the call.
	pub headers: HeaderMap,
	/// Optional token aborting the in-flight attempt and any pending retry delay.
	pub cancel: Option<CancellationToken>,
}
impl ApiRequest {
	/// Creates a request with the given method and path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			body: None,
			headers: HeaderMap::new(),
			cancel: None,
		}
	}

	/// Creates a GET request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Creates a POST request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Creates a PATCH request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Creates a DELETE request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Attaches a JSON body.
	pub fn with_json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes any value into the JSON body.
	pub fn with_body<T>(self, body: &T) -> Result<Self>
	where
		T: Serialize,
	{
		let value = serde_json::to_value(body)
			.map_err(|err| ApiError::unknown("Request body could not be serialized.").with_source(err))?;

		Ok(self.with_json(value))
	}

	/// Adds one extra header to the call.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Attaches a cancellation token observed during attempts and retry delays.
	pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
		self.cancel = Some(cancel);

		self
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn convenience_constructors_set_the_method() {
		assert_eq!(ApiRequest::get("/v1/entities").method, Method::GET);
		assert_eq!(ApiRequest::post("/v1/entities").method, Method::POST);
		assert_eq!(ApiRequest::patch("/v1/entities/1").method, Method::PATCH);
		assert_eq!(ApiRequest::delete("/v1/entities/1").method, Method::DELETE);
	}

	#[test]
	fn with_body_serializes_any_serde_value() {
		#[derive(Serialize)]
		struct NewEntity<'a> {
			name: &'a str,
		}

		let request = ApiRequest::post("/v1/entities")
			.with_body(&NewEntity { name: "acme" })
			.expect("Serializable body should be accepted.");

		assert_eq!(request.body, Some(json!({"name": "acme"})));
	}
}
