// std
use std::{
	net::TcpListener,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::{Duration, Instant},
};
// crates.io
use serde_json::json;
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path},
};
// self
use token_courier::{
	client::{ApiClient, ApiRequest},
	config::ClientConfig,
	error::ErrorCode,
	tokio_util::sync::CancellationToken,
};

const TOKEN_PATH: &str = "/v1/auth/token";

async fn mount_token_endpoint(server: &MockServer) {
	Mock::given(method("POST"))
		.and(path(TOKEN_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(
			json!({ "access_token": "retry-token", "token_type": "bearer", "expires_in": 3600 }),
		))
		.mount(server)
		.await;
}

fn build_client(base_url: &str, max_retries: u32, retry_delay: Duration) -> ApiClient {
	let config = ClientConfig::builder(base_url, "client-id", "client-secret")
		.timeout(Duration::from_secs(2))
		.max_retries(max_retries)
		.retry_delay(retry_delay)
		.build()
		.expect("Test config should build.");

	ApiClient::new(config).expect("Test client should build.")
}

#[tokio::test]
async fn server_errors_retry_until_success_with_linear_backoff() {
	let server = MockServer::start().await;

	mount_token_endpoint(&server).await;

	let attempts = Arc::new(AtomicUsize::new(0));
	let attempts_in_responder = attempts.clone();

	Mock::given(method("GET"))
		.and(path("/v1/entities"))
		.respond_with(move |_: &wiremock::Request| {
			if attempts_in_responder.fetch_add(1, Ordering::SeqCst) < 3 {
				ResponseTemplate::new(503)
			} else {
				ResponseTemplate::new(200).set_body_json(json!({ "data": ["ent_1"] }))
			}
		})
		.expect(4)
		.mount(&server)
		.await;

	let retry_delay = Duration::from_millis(30);
	let client = build_client(&server.uri(), 3, retry_delay);
	let started = Instant::now();
	let listing: serde_json::Value = client
		.request(ApiRequest::get("/v1/entities"))
		.await
		.expect("Fourth attempt should succeed.");

	// Three retries with delays d, 2d, 3d put a hard floor under the elapsed time.
	assert!(started.elapsed() >= retry_delay * 6);
	assert_eq!(listing, json!({ "data": ["ent_1"] }));
	assert_eq!(attempts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn exhausted_retries_surface_the_final_status() {
	let server = MockServer::start().await;

	mount_token_endpoint(&server).await;

	Mock::given(method("GET"))
		.and(path("/v1/entities"))
		.respond_with(ResponseTemplate::new(503).set_body_json(
			json!({ "code": "UPSTREAM_DOWN", "message": "Service melting." }),
		))
		.expect(3)
		.mount(&server)
		.await;

	let client = build_client(&server.uri(), 2, Duration::from_millis(10));
	let error = client
		.request::<serde_json::Value>(ApiRequest::get("/v1/entities"))
		.await
		.expect_err("Persistent 503 should exhaust retries.");

	assert_eq!(error.code, ErrorCode::Upstream("UPSTREAM_DOWN".into()));
	assert_eq!(error.http_status, Some(503));
	assert_eq!(error.retry_count, 2);
}

#[tokio::test]
async fn client_errors_never_retry() {
	let server = MockServer::start().await;

	mount_token_endpoint(&server).await;

	Mock::given(method("POST"))
		.and(path("/v1/entities"))
		.respond_with(ResponseTemplate::new(400).set_body_json(
			json!({ "code": "VALIDATION_ERROR", "message": "Name is required." }),
		))
		.expect(1)
		.mount(&server)
		.await;

	let client = build_client(&server.uri(), 3, Duration::from_millis(10));
	let error = client
		.request::<serde_json::Value>(ApiRequest::post("/v1/entities").with_json(json!({})))
		.await
		.expect_err("Validation failure should surface immediately.");

	assert_eq!(error.code, ErrorCode::Upstream("VALIDATION_ERROR".into()));
	assert_eq!(error.http_status, Some(400));
	assert_eq!(error.retry_count, 0);
}

#[tokio::test]
async fn timeouts_are_retried_as_network_failures() {
	let server = MockServer::start().await;

	mount_token_endpoint(&server).await;

	Mock::given(method("GET"))
		.and(path("/v1/entities"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(json!({ "data": [] }))
				.set_delay(Duration::from_millis(500)),
		)
		.expect(2)
		.mount(&server)
		.await;

	let config = ClientConfig::builder(server.uri(), "client-id", "client-secret")
		.timeout(Duration::from_millis(100))
		.max_retries(1)
		.retry_delay(Duration::from_millis(10))
		.build()
		.expect("Test config should build.");
	let client = ApiClient::new(config).expect("Test client should build.");
	let error = client
		.request::<serde_json::Value>(ApiRequest::get("/v1/entities"))
		.await
		.expect_err("Slow upstream should exhaust the timeout.");

	assert_eq!(error.code, ErrorCode::Network);
	assert_eq!(error.retry_count, 1);
}

#[tokio::test]
async fn connection_failures_are_retried_as_network_failures() {
	let server = MockServer::start().await;

	mount_token_endpoint(&server).await;

	let base_url = server.uri();
	let client = build_client(&base_url, 2, Duration::from_millis(10));

	client.force_token_refresh().await.expect("Priming the credential should succeed.");

	// Shutting the mock server down leaves the port closed, so every attempt
	// fails at the connection level while the cached credential stays valid.
	drop(server);

	let error = client
		.request::<serde_json::Value>(ApiRequest::get("/v1/entities"))
		.await
		.expect_err("Closed port should fail every attempt.");

	assert_eq!(error.code, ErrorCode::Network);
	assert_eq!(error.http_status, None);
	assert_eq!(error.retry_count, 2);
}

#[tokio::test]
async fn cancellation_aborts_a_pending_retry_delay() {
	let server = MockServer::start().await;

	mount_token_endpoint(&server).await;

	Mock::given(method("GET"))
		.and(path("/v1/entities"))
		.respond_with(ResponseTemplate::new(503))
		.expect(1)
		.mount(&server)
		.await;

	let client = build_client(&server.uri(), 3, Duration::from_secs(30));
	let cancel = CancellationToken::new();
	let request = ApiRequest::get("/v1/entities").with_cancel(cancel.clone());
	let started = Instant::now();
	let handle =
		tokio::spawn(async move { client.request::<serde_json::Value>(request).await });

	tokio::time::sleep(Duration::from_millis(100)).await;
	cancel.cancel();

	let error = handle
		.await
		.expect("Request task should not panic.")
		.expect_err("Cancelled request should fail.");

	assert_eq!(error.code, ErrorCode::Cancelled);
	assert_eq!(error.retry_count, 1);
	assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn pre_cancelled_requests_fail_without_reaching_the_api() {
	let listener = TcpListener::bind("127.0.0.1:0").expect("Ephemeral port should bind.");
	let base_url = format!("http://{}", listener.local_addr().expect("Bound port should report."));

	// The listener stays bound but never accepts, so any attempt would hang;
	// the pre-cancelled token must win before the transport matters.
	let client = build_client(&base_url, 0, Duration::from_millis(10));
	let cancel = CancellationToken::new();

	cancel.cancel();

	let started = Instant::now();
	let error = client
		.request::<serde_json::Value>(ApiRequest::get("/v1/entities").with_cancel(cancel))
		.await
		.expect_err("Pre-cancelled request should fail.");

	assert_eq!(error.code, ErrorCode::Cancelled);
	assert_eq!(error.retry_count, 0);
	assert!(started.elapsed() < Duration::from_secs(2));
}
