//! HTTP tests against the in-memory store

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use fertipath_backend::{
    ai::TextGenerator,
    app,
    insights::InsightKey,
    notify::OtpSender,
    store::MemoryStore,
    translations::localize,
    AppState, Config,
};

// ============================================================================
// Harness
// ============================================================================

#[derive(Default)]
struct CapturingSender {
    messages: Mutex<Vec<(String, String)>>,
}

impl CapturingSender {
    fn last_code(&self) -> String {
        let messages = self.messages.lock().unwrap();
        let (_, text) = messages.last().expect("an OTP was sent");
        text.rsplit(' ').next().unwrap().to_string()
    }
}

#[async_trait]
impl OtpSender for CapturingSender {
    async fn send_sms(&self, phone_number: &str, message: &str) -> anyhow::Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((phone_number.to_string(), message.to_string()));
        Ok(())
    }
}

struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(format!("echo: {}", prompt.lines().next().unwrap_or_default()))
    }
}

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("connection refused: https://api.example.test/v1/chat")
    }
}

struct TestApp {
    router: Router,
    sender: Arc<CapturingSender>,
}

fn test_app(generator: Option<Arc<dyn TextGenerator>>) -> TestApp {
    test_app_with(generator, |_| {})
}

fn test_app_with(
    generator: Option<Arc<dyn TextGenerator>>,
    configure: impl FnOnce(&mut Config),
) -> TestApp {
    let mut config = Config::with_defaults().unwrap();
    config.auth.bcrypt_cost = 4;
    configure(&mut config);

    let sender = Arc::new(CapturingSender::default());
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config: Arc::new(config),
        otp_sender: sender.clone(),
        generator,
    };

    TestApp {
        router: app(state),
        sender,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn registration(username: &str, language: &str) -> Value {
    json!({
        "email": format!("{username}@example.com"),
        "username": username,
        "first_name": "Ada",
        "last_name": "Obi",
        "password": "supersecret",
        "role": "user",
        "phone_number": format!("+234-{username}"),
        "language_preference": language,
    })
}

/// Starts a registration; returns the verification id and the texted code.
async fn request_code(app: &TestApp, registration: Value) -> (String, String) {
    let (status, body) = send(
        &app.router,
        json_request("POST", "/auth/send-otp", None, registration),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let verification_id = body["verification_id"].as_str().unwrap().to_string();
    (verification_id, app.sender.last_code())
}

async fn verify(app: &TestApp, verification_id: &str, code: &str) -> (StatusCode, Value) {
    send(
        &app.router,
        json_request(
            "POST",
            "/auth/verify-otp",
            None,
            json!({ "verification_id": verification_id, "otp_code": code }),
        ),
    )
    .await
}

/// Registers, verifies and logs in a user; returns the bearer token.
async fn signed_in(app: &TestApp, username: &str, language: &str) -> String {
    let (status, body) = send(
        &app.router,
        json_request("POST", "/auth/send-otp", None, registration(username, language)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let verification_id = body["verification_id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app.router,
        json_request(
            "POST",
            "/auth/verify-otp",
            None,
            json!({ "verification_id": verification_id, "otp_code": app.sender.last_code() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let login = Request::builder()
        .method("POST")
        .uri("/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}%40example.com&password=supersecret")))
        .unwrap();
    let (status, body) = send(&app.router, login).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn health_responds() {
    let app = test_app(None);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_requires_correct_code() {
    let app = test_app(None);
    let (_, body) = send(
        &app.router,
        json_request("POST", "/auth/send-otp", None, registration("ngozi", "en")),
    )
    .await;
    let verification_id = body["verification_id"].as_str().unwrap().to_string();

    let code = app.sender.last_code();
    assert_eq!(code.len(), 4);
    let wrong = if code == "1111" { "2222" } else { "1111" };

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/auth/verify-otp",
            None,
            json!({ "verification_id": verification_id, "otp_code": wrong }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_OTP");

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/auth/verify-otp",
            None,
            json!({ "verification_id": verification_id, "otp_code": code }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");

    // the code cannot be used twice
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/auth/verify-otp",
            None,
            json!({ "verification_id": verification_id, "otp_code": code }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "OTP_NOT_FOUND");
}

#[tokio::test]
async fn repeated_wrong_codes_lock_the_verification() {
    let app = test_app(None);
    let (_, body) = send(
        &app.router,
        json_request("POST", "/auth/send-otp", None, registration("chioma", "ig")),
    )
    .await;
    let verification_id = body["verification_id"].as_str().unwrap().to_string();
    let code = app.sender.last_code();
    let wrong = if code == "1111" { "2222" } else { "1111" };

    for _ in 0..5 {
        let (status, _) = send(
            &app.router,
            json_request(
                "POST",
                "/auth/verify-otp",
                None,
                json!({ "verification_id": verification_id, "otp_code": wrong }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = send(
        &app.router,
        json_request(
            "POST",
            "/auth/verify-otp",
            None,
            json!({ "verification_id": verification_id, "otp_code": code }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app(None);
    signed_in(&app, "amaka", "en").await;

    let (status, body) = send(
        &app.router,
        json_request("POST", "/auth/send-otp", None, registration("amaka", "en")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn interleaved_registrations_cannot_share_an_email() {
    let app = test_app(None);

    let mut first = registration("dup", "en");
    first["phone_number"] = json!("+1");
    let mut second = registration("dup2", "en");
    second["email"] = json!("dup@example.com");
    second["phone_number"] = json!("+2");

    // both pass the up-front check because neither is verified yet
    let (first_id, first_code) = request_code(&app, first).await;
    let (second_id, second_code) = request_code(&app, second).await;

    let (status, _) = verify(&app, &first_id, &first_code).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = verify(&app, &second_id, &second_code).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    // the losing code was not consumed
    let (status, body) = verify(&app, &second_id, &second_code).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn expired_code_is_rejected() {
    let app = test_app_with(None, |config| config.otp.expire_minutes = -1);
    let (verification_id, code) = request_code(&app, registration("efe", "en")).await;

    let (status, body) = verify(&app, &verification_id, &code).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "OTP_EXPIRED");
}

#[tokio::test]
async fn invalid_registration_is_rejected() {
    let app = test_app(None);
    let mut body = registration("bola", "en");
    body["password"] = json!("short");

    let (status, body) = send(&app.router, json_request("POST", "/auth/send-otp", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "password");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app(None);
    signed_in(&app, "funke", "en").await;

    let login = Request::builder()
        .method("POST")
        .uri("/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=funke%40example.com&password=not-it"))
        .unwrap();
    let (status, _) = send(&app.router, login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn profile_is_created_then_updated() {
    let app = test_app(None);
    let token = signed_in(&app, "halima", "ha").await;

    let (status, body) = send(&app.router, get("/user/get_user", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "halima");
    assert_eq!(body["language_preference"], "ha");
    assert!(body.get("hashed_password").is_none());

    let (status, body) = send(&app.router, get("/user/profile", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["age"], Value::Null);

    let (status, body) = send(
        &app.router,
        json_request(
            "PUT",
            "/user/profile",
            Some(&token),
            json!({
                "age": 29,
                "cycle_length": 30,
                "last_period_date": "2024-03-01",
                "faith_preference": "none",
                "audio_preference": true,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cycle_length"], 30);
    assert_eq!(body["last_period_date"], "2024-03-01");
}

#[tokio::test]
async fn deleting_user_removes_their_records() {
    let app = test_app(None);
    let token = signed_in(&app, "kemi", "en").await;

    let (status, _) = send(
        &app.router,
        json_request(
            "POST",
            "/insights",
            Some(&token),
            json!({ "last_period_date": "2020-01-01", "cycle_length": 28, "period_length": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("DELETE")
        .uri("/user/delete_user")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted");

    let (status, _) = send(&app.router, get("/insights", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn token_of_deleted_user_cannot_write() {
    let app = test_app(None);
    let token = signed_in(&app, "dayo", "en").await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/user/delete_user")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        json_request(
            "POST",
            "/cycle/cycles",
            Some(&token),
            json!({ "last_period_date": "2024-01-01", "cycle_length": 28, "period_length": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        json_request(
            "PUT",
            "/user/profile",
            Some(&token),
            json!({
                "age": 30,
                "cycle_length": 28,
                "last_period_date": "2024-01-01",
                "faith_preference": "none",
                "audio_preference": false,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, get("/user/profile", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, get("/cycle/cycles", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Cycles
// ============================================================================

#[tokio::test]
async fn cycle_returns_prediction_and_is_listed() {
    let app = test_app(None);
    let token = signed_in(&app, "tolu", "en").await;

    let (status, _) = send(&app.router, get("/cycle/cycles", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/cycle/cycles",
            Some(&token),
            json!({
                "last_period_date": "2024-01-01",
                "cycle_length": 28,
                "period_length": 5,
                "symptoms": ["fatigue", "headache", "cramps"],
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["period_end"], "2024-01-05");
    assert_eq!(body["ovulation_day"], "2024-01-15");
    assert_eq!(body["fertile_window"]["start"], "2024-01-13");
    assert_eq!(body["fertile_window"]["end"], "2024-01-17");
    assert_eq!(body["next_period"], "2024-01-29");
    assert_eq!(body["fertility_score"], 72);

    let (status, body) = send(&app.router, get("/cycle/cycles", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["symptoms"], json!(["fatigue", "headache", "cramps"]));

    let (status, body) = send(&app.router, get("/cycle/summary", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let day = body["cycle_day"].as_i64().unwrap();
    assert!((1..=28).contains(&day));
    assert_eq!(body["period_expected_in_days"].as_i64().unwrap(), 29 - day);
}

#[tokio::test]
async fn cycle_lengths_are_validated() {
    let app = test_app(None);
    let token = signed_in(&app, "ireti", "en").await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/cycle/cycles",
            Some(&token),
            json!({ "last_period_date": "2024-01-01", "cycle_length": 40, "period_length": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "cycle_length");
}

#[tokio::test]
async fn out_of_range_dates_are_rejected() {
    let app = test_app(None);
    let token = signed_in(&app, "nneka", "en").await;

    for uri in ["/cycle/cycles", "/insights"] {
        let (status, body) = send(
            &app.router,
            json_request(
                "POST",
                uri,
                Some(&token),
                json!({ "last_period_date": "+262142-12-20", "cycle_length": 32, "period_length": 5 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
        assert_eq!(body["error"]["field"], "last_period_date");
    }

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/insights",
            Some(&token),
            json!({ "last_period_date": "2199-12-31", "cycle_length": 32, "period_length": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["next_period"], "2200-02-01");
}

// ============================================================================
// Insights
// ============================================================================

#[tokio::test]
async fn insights_require_a_token() {
    let app = test_app(None);
    let (status, body) = send(
        &app.router,
        json_request("POST", "/insights", None, json!({ "last_period_date": "2024-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn insight_is_localized_and_overwritten() {
    let app = test_app(None);
    let token = signed_in(&app, "yetunde", "yo").await;

    // A cycle far in the past keeps today outside the fertile window.
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/insights",
            Some(&token),
            json!({ "last_period_date": "2020-01-01", "cycle_length": 28, "period_length": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["fertility_score"], 80);
    assert_eq!(body["insight_key"], "HIGH_FERTILITY");
    assert_eq!(body["insight_text"], localize(InsightKey::HighFertility, "yo"));
    assert!(body.get("ai_insight").is_none());

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/insights",
            Some(&token),
            json!({
                "last_period_date": "2020-01-01",
                "symptoms": ["fatigue", "headache"],
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fertility_score"], 72);
    assert_eq!(body["insight_key"], "DEFAULT");

    let (status, body) = send(&app.router, get("/insights", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insight_key"], "DEFAULT");
    assert_eq!(body["insight_text"], localize(InsightKey::Default, "yo"));
    assert_eq!(body["symptoms"], json!(["fatigue", "headache"]));
}

#[tokio::test]
async fn insight_includes_generated_text_when_configured() {
    let app = test_app(Some(Arc::new(EchoGenerator)));
    let token = signed_in(&app, "zainab", "pg").await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/insights",
            Some(&token),
            json!({ "last_period_date": "2020-01-01", "cycle_length": 28, "period_length": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ai_insight"], "echo: These are the fertility predictions:");
}

#[tokio::test]
async fn insight_survives_a_failing_provider() {
    let app = test_app(Some(Arc::new(FailingGenerator)));
    let token = signed_in(&app, "ronke", "en").await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/insights",
            Some(&token),
            json!({ "last_period_date": "2020-01-01", "cycle_length": 28, "period_length": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["insight_key"], "HIGH_FERTILITY");
    assert!(body.get("ai_insight").is_none());

    let (status, _) = send(&app.router, get("/insights", &token)).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn chat_without_provider_is_unavailable() {
    let app = test_app(None);
    let (status, _) = send(
        &app.router,
        json_request("POST", "/chat", None, json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn chat_relays_generated_reply() {
    let app = test_app(Some(Arc::new(EchoGenerator)));
    let (status, body) = send(
        &app.router,
        json_request("POST", "/chat", None, json!({ "message": "how are you" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "echo: how are you");
}

#[tokio::test]
async fn chat_provider_failure_is_bad_gateway() {
    let app = test_app(Some(Arc::new(FailingGenerator)));
    let (status, body) = send(
        &app.router,
        json_request("POST", "/chat", None, json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "EXTERNAL_SERVICE_ERROR");

    let message = body["error"]["message"].as_str().unwrap();
    assert!(!message.contains("api.example.test"), "{message}");
    assert!(!message.contains("connection refused"), "{message}");
}
