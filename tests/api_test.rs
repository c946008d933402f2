//! Integration tests for API endpoints.
//!
//! The full router runs against an in-memory user repository and a
//! switchable database probe, so no Postgres instance is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use day_guard_api::config::{AppEnv, Config, PROBLEM_JSON_CONTENT_TYPE, REQUEST_ID_HEADER};
use day_guard_api::domain::{NewUser, User, UserChanges};
use day_guard_api::errors::{AppError, AppResult};
use day_guard_api::infra::{DatabaseHealth, UserRepository};
use day_guard_api::services::UserManager;
use day_guard_api::{create_router, AppState};

// =============================================================================
// Test doubles
// =============================================================================

/// In-memory repository enforcing the unique email constraint
#[derive(Default)]
struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_active_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id && u.is_active)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn list_active(&self) -> AppResult<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_active)
            .cloned()
            .collect())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict(format!(
                "Email {} já está sendo usado",
                new_user.email
            )));
        }
        let user = User::new(
            Uuid::new_v4(),
            new_user.name,
            new_user.email,
            new_user.password_hash,
        );
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found(format!("Usuário com ID {} não encontrado", id)))?;
        user.apply(changes);
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<u64> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok((before - users.len()) as u64)
    }
}

/// Database probe that can be switched down
struct FakeDatabase {
    up: AtomicBool,
}

#[async_trait]
impl DatabaseHealth for FakeDatabase {
    async fn ping(&self) -> AppResult<()> {
        if self.up.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::internal("connect ECONNREFUSED 127.0.0.1:5432"))
        }
    }
}

struct TestApp {
    router: Router,
    users: Arc<InMemoryUsers>,
    database: Arc<FakeDatabase>,
}

impl TestApp {
    fn new() -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let database = Arc::new(FakeDatabase {
            up: AtomicBool::new(true),
        });
        let config = Config {
            app_env: AppEnv::Test,
            ..Config::default()
        };
        let state = AppState::new(
            Arc::new(UserManager::new(users.clone())),
            database.clone(),
            config,
        );

        Self {
            router: create_router(state),
            users,
            database,
        }
    }

    fn seed(&self, name: &str, email: &str, is_active: bool) -> User {
        let mut user = User::new(
            Uuid::new_v4(),
            name.to_string(),
            email.to_string(),
            "hashed".to_string(),
        );
        user.is_active = is_active;
        user.updated_at = Utc::now();
        self.users.users.lock().unwrap().push(user.clone());
        user
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        TestResponse {
            status,
            content_type,
            request_id,
            text,
            body,
        }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

struct TestResponse {
    status: StatusCode,
    content_type: String,
    request_id: Option<String>,
    text: String,
    body: Value,
}

impl TestResponse {
    fn assert_problem(&self, status: StatusCode, title: &str) {
        assert_eq!(self.status, status, "body: {}", self.text);
        assert_eq!(self.content_type, PROBLEM_JSON_CONTENT_TYPE);
        assert_eq!(self.body["type"], "about:blank");
        assert_eq!(self.body["title"], title);
        assert_eq!(self.body["status"], status.as_u16());
        assert_eq!(
            self.body["correlationId"].as_str(),
            self.request_id.as_deref()
        );
    }
}

// =============================================================================
// App endpoints
// =============================================================================

#[tokio::test]
async fn test_root_endpoint_returns_welcome_message() {
    let app = TestApp::new();

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "Welcome to Day Guard API");
    assert!(response.request_id.is_some());
}

#[tokio::test]
async fn test_health_ok() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({
            "status": "ok",
            "info": { "database": { "status": "up" } },
            "error": {},
            "details": { "database": { "status": "up" } }
        })
    );
}

#[tokio::test]
async fn test_health_down_is_problem_503() {
    let app = TestApp::new();
    app.database.up.store(false, Ordering::SeqCst);

    let response = app.get("/health").await;

    response.assert_problem(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
    assert_eq!(response.body["detail"], "Health check failed");
    assert_eq!(response.body["instance"], "/health");
    assert_eq!(response.body["errors"]["database"]["status"], "down");
}

// =============================================================================
// Correlation ids
// =============================================================================

#[tokio::test]
async fn test_supplied_request_id_is_echoed_on_failure() {
    let app = TestApp::new();
    let id = Uuid::new_v4();

    let response = app
        .send(
            Request::get(format!("/users/{}", id))
                .header(REQUEST_ID_HEADER, "abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.request_id.as_deref(), Some("abc"));
    assert_eq!(response.body["correlationId"], "abc");
}

#[tokio::test]
async fn test_non_ascii_request_id_is_echoed_on_failure() {
    let app = TestApp::new();
    let value = HeaderValue::from_bytes(b"caf\xc3\xa9-42").unwrap();

    let response = app
        .send(
            Request::get("/users/not-a-uuid")
                .header(REQUEST_ID_HEADER, value)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    response.assert_problem(StatusCode::BAD_REQUEST, "Bad Request");
    assert_eq!(response.request_id.as_deref(), Some("café-42"));
    assert_eq!(response.body["correlationId"], "café-42");
}

#[tokio::test]
async fn test_missing_request_id_is_generated() {
    let app = TestApp::new();

    let response = app.get("/users").await;

    let id = response.request_id.unwrap();
    assert!(Uuid::parse_str(&id).is_ok());
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_get_unknown_user_is_problem_404() {
    let app = TestApp::new();
    let id = Uuid::new_v4();

    let response = app.get(&format!("/users/{}", id)).await;

    response.assert_problem(StatusCode::NOT_FOUND, "Not Found");
    assert_eq!(
        response.body["detail"],
        format!("Usuário com ID {} não encontrado", id)
    );
    assert_eq!(response.body["instance"], format!("/users/{}", id));
    assert!(response.body.get("errors").is_none());
}

#[tokio::test]
async fn test_malformed_id_is_problem_400() {
    let app = TestApp::new();

    let response = app.get("/users/not-a-uuid").await;

    response.assert_problem(StatusCode::BAD_REQUEST, "Bad Request");
    assert_eq!(response.body["detail"], "id must be a UUID");
}

#[tokio::test]
async fn test_create_user() {
    let app = TestApp::new();

    let response = app
        .json(
            "POST",
            "/users",
            json!({ "name": "João Silva", "email": "joao@example.com", "password": "senha123" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["name"], "João Silva");
    assert_eq!(response.body["email"], "joao@example.com");
    assert_eq!(response.body["isActive"], true);
    assert!(response.body.get("password").is_none());
    assert!(response.body.get("passwordHash").is_none());

    let stored = app.users.users.lock().unwrap()[0].password_hash.clone();
    assert!(stored.starts_with("$argon2"));
}

#[tokio::test]
async fn test_create_duplicate_email_is_problem_409() {
    let app = TestApp::new();
    app.seed("Existing", "taken@example.com", true);

    let response = app
        .json(
            "POST",
            "/users",
            json!({ "name": "Other", "email": "taken@example.com", "password": "senha123" }),
        )
        .await;

    response.assert_problem(StatusCode::CONFLICT, "Conflict");
    assert_eq!(
        response.body["detail"],
        "Email taken@example.com já está sendo usado"
    );
    assert_eq!(response.body["instance"], "/users");
}

#[tokio::test]
async fn test_create_invalid_body_is_problem_400_with_errors() {
    let app = TestApp::new();

    let response = app
        .json(
            "POST",
            "/users",
            json!({ "name": "", "email": "nope", "password": "123" }),
        )
        .await;

    response.assert_problem(StatusCode::BAD_REQUEST, "Bad Request");
    assert_eq!(
        response.body["errors"],
        json!({
            "email": ["email must be an email"],
            "name": ["name should not be empty"],
            "password": ["password must be longer than or equal to 6 characters"]
        })
    );
}

#[tokio::test]
async fn test_create_missing_field_is_problem_400_with_errors() {
    let app = TestApp::new();

    let response = app
        .json(
            "POST",
            "/users",
            json!({ "email": "ana@example.com", "password": "senha123" }),
        )
        .await;

    response.assert_problem(StatusCode::BAD_REQUEST, "Bad Request");
    assert_eq!(response.body["detail"], "name should not be empty");
    assert_eq!(
        response.body["errors"],
        json!({ "name": ["name should not be empty"] })
    );
    assert!(app.users.users.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_wrong_field_type_is_problem_400_with_errors() {
    let app = TestApp::new();

    let response = app
        .json(
            "POST",
            "/users",
            json!({ "name": 123, "email": "ana@example.com", "password": "senha123" }),
        )
        .await;

    response.assert_problem(StatusCode::BAD_REQUEST, "Bad Request");
    assert_eq!(
        response.body["errors"],
        json!({ "name": ["name must be a string"] })
    );
}

#[tokio::test]
async fn test_create_with_unknown_field_is_rejected() {
    let app = TestApp::new();

    let response = app
        .json(
            "POST",
            "/users",
            json!({ "name": "A", "email": "a@example.com", "password": "senha123", "isActive": false }),
        )
        .await;

    response.assert_problem(StatusCode::BAD_REQUEST, "Bad Request");
    assert!(app.users.users.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_list_active() {
    let app = TestApp::new();
    app.seed("Ativo", "ativo@example.com", true);
    app.seed("Inativo", "inativo@example.com", false);

    let all = app.get("/users").await;
    let active = app.get("/users/active").await;

    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body.as_array().unwrap().len(), 2);
    assert_eq!(active.body.as_array().unwrap().len(), 1);
    assert_eq!(active.body[0]["email"], "ativo@example.com");
}

#[tokio::test]
async fn test_find_by_email() {
    let app = TestApp::new();
    let user = app.seed("Maria", "maria@example.com", true);

    let found = app.get("/users/email/maria@example.com").await;
    let missing = app.get("/users/email/ghost@example.com").await;

    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["id"], user.id.to_string());
    missing.assert_problem(StatusCode::NOT_FOUND, "Not Found");
    assert_eq!(
        missing.body["detail"],
        "Usuário com email ghost@example.com não encontrado"
    );
}

#[tokio::test]
async fn test_find_active_by_id() {
    let app = TestApp::new();
    let inactive = app.seed("Inativo", "inativo@example.com", false);

    let response = app.get(&format!("/users/{}/active", inactive.id)).await;

    response.assert_problem(StatusCode::NOT_FOUND, "Not Found");
    assert_eq!(
        response.body["detail"],
        format!("Usuário ativo com ID {} não encontrado", inactive.id)
    );
}

#[tokio::test]
async fn test_update_user() {
    let app = TestApp::new();
    let user = app.seed("Ana", "ana@example.com", true);

    let response = app
        .json(
            "PATCH",
            &format!("/users/{}", user.id),
            json!({ "name": "Ana Maria" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Ana Maria");
    assert_eq!(response.body["email"], "ana@example.com");
}

#[tokio::test]
async fn test_update_to_taken_email_is_problem_409() {
    let app = TestApp::new();
    let user = app.seed("Ana", "ana@example.com", true);
    app.seed("Bia", "bia@example.com", true);

    let response = app
        .json(
            "PATCH",
            &format!("/users/{}", user.id),
            json!({ "email": "bia@example.com" }),
        )
        .await;

    response.assert_problem(StatusCode::CONFLICT, "Conflict");
}

#[tokio::test]
async fn test_deactivate_user() {
    let app = TestApp::new();
    let user = app.seed("Ana", "ana@example.com", true);

    let response = app
        .send(
            Request::patch(format!("/users/{}/deactivate", user.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isActive"], false);
}

#[tokio::test]
async fn test_delete_user() {
    let app = TestApp::new();
    let user = app.seed("Ana", "ana@example.com", true);
    let uri = format!("/users/{}", user.id);

    let first = app
        .send(Request::delete(&uri).body(Body::empty()).unwrap())
        .await;
    let second = app
        .send(Request::delete(&uri).body(Body::empty()).unwrap())
        .await;

    assert_eq!(first.status, StatusCode::NO_CONTENT);
    assert!(first.text.is_empty());
    second.assert_problem(StatusCode::NOT_FOUND, "Not Found");
}

// =============================================================================
// Framework-level failures
// =============================================================================

#[tokio::test]
async fn test_unknown_route_is_problem_404() {
    let app = TestApp::new();

    let response = app.get("/does/not/exist?q=1").await;

    response.assert_problem(StatusCode::NOT_FOUND, "Not Found");
    assert_eq!(response.body["detail"], "Cannot GET /does/not/exist");
    assert_eq!(response.body["instance"], "/does/not/exist?q=1");
}

#[tokio::test]
async fn test_wrong_method_is_problem_405() {
    let app = TestApp::new();

    let response = app
        .send(Request::put("/users").body(Body::empty()).unwrap())
        .await;

    response.assert_problem(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
}
