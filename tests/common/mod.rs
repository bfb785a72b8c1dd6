// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fake of the task API.
//!
//! Serves the same routes as the real backend under `/api`, with HS256 JWT
//! bearer auth. Counts every request so tests can assert that nothing was
//! sent, and exposes knobs for expiring tokens and injecting failures.

#![allow(dead_code)]

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use taskmaster::config::{CompletionSync, Config};
use taskmaster::models::{AuthToken, Task, TaskId};
use taskmaster::services::MemoryTokenSlot;
use taskmaster::TaskClient;
use tower_http::trace::TraceLayer;

const SIGNING_KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

/// JWT claims issued by the fake backend.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
    /// Tokens minted before the last `expire_tokens` call are rejected
    gen: u64,
}

#[derive(Debug, Clone)]
struct AuthUser {
    user_id: String,
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: String,
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct StoredTask {
    owner: String,
    task: Task,
}

/// Shared state of the fake backend.
#[derive(Default)]
pub struct BackendState {
    users: Mutex<Vec<StoredUser>>,
    tasks: Mutex<Vec<StoredTask>>,
    next_id: AtomicU64,
    token_gen: AtomicU64,
    requests: AtomicUsize,
    ack_only: AtomicBool,
    fail_next: Mutex<Option<StatusCode>>,
    delay_ms: AtomicU64,
    login_delay_ms: AtomicU64,
}

/// Running fake backend.
pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

impl FakeBackend {
    /// Bind an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = create_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn config(&self, completion_sync: CompletionSync) -> Config {
        Config {
            api_url: self.base_url.clone(),
            completion_sync,
            ..Config::test_default()
        }
    }

    /// Client with an in-memory token slot and local completion toggles.
    pub fn client(&self) -> TaskClient {
        self.client_with(Arc::new(MemoryTokenSlot::new()), CompletionSync::Local)
    }

    pub fn client_with(&self, slot: Arc<MemoryTokenSlot>, sync: CompletionSync) -> TaskClient {
        TaskClient::new(&self.config(sync), slot).expect("client")
    }

    pub fn add_user(&self, id: &str, name: &str, email: &str, password: &str) {
        self.state.users.lock().unwrap().push(StoredUser {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
    }

    pub fn seed_task(&self, owner: &str, id: &str, title: &str, completed: bool) {
        self.state.tasks.lock().unwrap().push(StoredTask {
            owner: owner.to_string(),
            task: Task {
                id: Some(TaskId::new(id)),
                title: title.to_string(),
                description: format!("{} description", title),
                completed,
                created_at: Some(chrono::Utc::now()),
            },
        });
    }

    /// Stored tasks of `owner`, in insertion order.
    pub fn tasks_of(&self, owner: &str) -> Vec<Task> {
        self.state
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner == owner)
            .map(|t| t.task.clone())
            .collect()
    }

    /// Mint a valid token for `user_id` without going through login.
    pub fn token_for(&self, user_id: &str) -> AuthToken {
        AuthToken::new(create_jwt(user_id, self.state.token_gen.load(Ordering::SeqCst)))
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Invalidate every token issued so far.
    pub fn expire_tokens(&self) {
        self.state.token_gen.fetch_add(1, Ordering::SeqCst);
    }

    /// Answer the next task mutation with `status`.
    pub fn fail_next(&self, status: StatusCode) {
        *self.state.fail_next.lock().unwrap() = Some(status);
    }

    /// Answer creates with `{ message }` instead of the stored document.
    pub fn set_ack_only(&self, ack_only: bool) {
        self.state.ack_only.store(ack_only, Ordering::SeqCst);
    }

    /// Hold `/user/login` for `delay` before answering.
    pub fn set_login_delay(&self, delay: Duration) {
        self.state
            .login_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Hold task mutations for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

/// Standard fixture: Ana (`u1`) and Bo (`u2`).
pub async fn backend_with_users() -> FakeBackend {
    let backend = FakeBackend::start().await;
    backend.add_user("u1", "Ana", "ana@example.com", "ana-pw");
    backend.add_user("u2", "Bo", "bo@example.com", "bo-pw");
    backend
}

fn create_jwt(user_id: &str, gen: u64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + 24 * 60 * 60,
        gen,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap()
}

fn create_router(state: Arc<BackendState>) -> Router {
    let protected = Router::new()
        .route("/api/user/getUser", get(get_user))
        .route("/api/task/getTask", get(get_tasks))
        .route("/api/task/addTask", post(add_task))
        .route("/api/task/removeTask", post(remove_task))
        .route("/api/task/updateTask", post(update_task))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/user/login", post(login))
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn count_requests(
    State(state): State<Arc<BackendState>>,
    request: Request,
    next: Next,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

async fn require_auth(
    State(state): State<Arc<BackendState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = match request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let token_data = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    if token_data.claims.gen < state.token_gen.load(Ordering::SeqCst) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(AuthUser {
        user_id: token_data.claims.sub,
    });
    Ok(next.run(request).await)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn before_mutation(state: &BackendState) -> Option<Response> {
    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let injected = state.fail_next.lock().unwrap().take();
    injected.map(|status| message(status, "injected failure"))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<LoginBody>) -> Response {
    let delay = state.login_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let user = state
        .users
        .lock()
        .unwrap()
        .iter()
        .find(|u| u.email == body.email)
        .cloned();

    match user {
        Some(user) if user.password == body.password => {
            let token = create_jwt(&user.id, state.token_gen.load(Ordering::SeqCst));
            Json(json!({ "token": token, "message": "Logged in successfully" })).into_response()
        }
        _ => message(StatusCode::BAD_REQUEST, "Invalid credentials"),
    }
}

async fn get_user(
    State(state): State<Arc<BackendState>>,
    Extension(auth): Extension<AuthUser>,
) -> Response {
    let user = state
        .users
        .lock()
        .unwrap()
        .iter()
        .find(|u| u.id == auth.user_id)
        .cloned();

    match user {
        Some(u) => Json(json!({ "user": { "_id": u.id, "name": u.name, "email": u.email } }))
            .into_response(),
        None => message(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn get_tasks(
    State(state): State<Arc<BackendState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<Vec<Task>> {
    let tasks = state
        .tasks
        .lock()
        .unwrap()
        .iter()
        .filter(|t| t.owner == auth.user_id)
        .map(|t| t.task.clone())
        .collect();
    Json(tasks)
}

#[derive(Deserialize)]
struct AddTaskBody {
    title: String,
    description: String,
}

async fn add_task(
    State(state): State<Arc<BackendState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<AddTaskBody>,
) -> Response {
    if let Some(failure) = before_mutation(&state).await {
        return failure;
    }
    if body.title.trim().is_empty() || body.description.trim().is_empty() {
        return message(StatusCode::BAD_REQUEST, "Title and description are required");
    }

    let id = format!("t{}", state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    let task = Task {
        id: Some(TaskId::new(id)),
        title: body.title,
        description: body.description,
        completed: false,
        created_at: Some(chrono::Utc::now()),
    };
    state.tasks.lock().unwrap().push(StoredTask {
        owner: auth.user_id,
        task: task.clone(),
    });

    if state.ack_only.load(Ordering::SeqCst) {
        return Json(json!({ "message": "New task added successfully" })).into_response();
    }
    Json(task).into_response()
}

#[derive(Deserialize)]
struct RemoveTaskBody {
    id: String,
}

async fn remove_task(
    State(state): State<Arc<BackendState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<RemoveTaskBody>,
) -> Response {
    if let Some(failure) = before_mutation(&state).await {
        return failure;
    }
    let mut tasks = state.tasks.lock().unwrap();
    let owned = tasks.iter().position(|t| {
        t.owner == auth.user_id && t.task.id.as_ref().map(TaskId::as_str) == Some(&body.id)
    });
    match owned {
        Some(pos) => {
            tasks.remove(pos);
            message(StatusCode::OK, "Task removed")
        }
        None => message(StatusCode::NOT_FOUND, "Task not found"),
    }
}

#[derive(Deserialize)]
struct UpdateTaskBody {
    id: String,
    completed: bool,
}

async fn update_task(
    State(state): State<Arc<BackendState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateTaskBody>,
) -> Response {
    if let Some(failure) = before_mutation(&state).await {
        return failure;
    }
    let mut tasks = state.tasks.lock().unwrap();
    let owned = tasks.iter_mut().find(|t| {
        t.owner == auth.user_id && t.task.id.as_ref().map(TaskId::as_str) == Some(&body.id)
    });
    match owned {
        Some(stored) => {
            stored.task.completed = body.completed;
            message(StatusCode::OK, "Task updated")
        }
        None => message(StatusCode::NOT_FOUND, "Task not found"),
    }
}
