//! In-process stand-in for the Google token, Rules, Identity Toolkit and
//! Firestore endpoints.
//!
//! Every API lives under its own prefix (`/token`, `/rules`, `/identity`,
//! `/firestore`) on one local axum server. Tests inspect and seed
//! [`MockState`] directly.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path as UrlPath, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{json, Map, Value};

use firerules::auth::AssertionClaims;
use firerules::credentials::ServiceAccountKey;
use firerules::session::{Endpoints, Session};

pub const PROJECT: &str = "demo-project";
pub const CLIENT_EMAIL: &str = "deployer@demo-project.iam.gserviceaccount.com";
pub const ACCESS_TOKEN: &str = "ya29.test-token";
pub const PRIVATE_KEY: &str = include_str!("../fixtures/test_key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/test_key.pub.pem");

pub const RULES: &str = "rules_version = '2';\nservice cloud.firestore {\n  match /databases/{database}/documents {\n    match /users/{uid} {\n      allow read: if request.auth.uid == uid;\n    }\n  }\n}\n";

#[derive(Default)]
pub struct MockState {
    /// Audience every assertion must carry.
    pub token_uri: String,
    pub token_requests: usize,
    pub reject_tokens: bool,
    /// Method and logical target of every authorized API call, in order.
    pub calls: Vec<String>,

    /// Created rulesets: full name and submitted files.
    pub rulesets: Vec<(String, Value)>,
    /// Release name to ruleset name.
    pub releases: HashMap<String, String>,
    pub fail_create: Option<StatusCode>,
    pub fail_release: Option<StatusCode>,

    /// Email to uid.
    pub users: HashMap<String, String>,
    /// Uid to password.
    pub passwords: HashMap<String, String>,

    /// Document name to fields.
    pub documents: HashMap<String, Map<String, Value>>,
    pub commits: Vec<Value>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockGoogle {
    pub state: Shared,
    pub base_url: String,
}

impl MockGoogle {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let base_url = format!("http://{}", addr);

        let state: Shared = Arc::new(Mutex::new(MockState {
            token_uri: format!("{}/token", base_url),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/token", post(token))
            .route("/rules/projects/{project}/rulesets", post(create_ruleset))
            .route("/rules/projects/{project}/releases", post(create_release))
            .route(
                "/rules/projects/{project}/releases/{*release}",
                get(get_release).patch(update_release),
            )
            .route("/identity/projects/{project}/accounts", post(create_user))
            .route(
                "/identity/projects/{project}/accounts:lookup",
                post(lookup_users),
            )
            .route(
                "/identity/projects/{project}/accounts:update",
                post(update_user),
            )
            .route(
                "/firestore/projects/{project}/databases/{database}/documents:commit",
                post(commit),
            )
            .route(
                "/firestore/projects/{project}/databases/{database}/documents/{*path}",
                get(get_document),
            )
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server failed");
        });

        Self { state, base_url }
    }

    pub fn token_uri(&self) -> String {
        format!("{}/token", self.base_url)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            rules: format!("{}/rules", self.base_url),
            identity: format!("{}/identity", self.base_url),
            firestore: format!("{}/firestore", self.base_url),
        }
    }

    pub fn key(&self) -> ServiceAccountKey {
        ServiceAccountKey::from_json(&self.key_json()).expect("Invalid test key")
    }

    pub fn key_json(&self) -> String {
        json!({
            "type": "service_account",
            "project_id": PROJECT,
            "private_key_id": "test-kid",
            "private_key": PRIVATE_KEY,
            "client_email": CLIENT_EMAIL,
            "token_uri": self.token_uri(),
        })
        .to_string()
    }

    pub fn session(&self) -> Session {
        Session::new(self.key(), self.endpoints())
    }

    /// Write the key file into `dir` and return its path.
    pub fn write_credentials(&self, dir: &Path) -> PathBuf {
        let path = dir.join("service_account.json");
        std::fs::write(&path, self.key_json()).expect("Failed to write credentials");
        path
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    pub fn release_name(release_id: &str) -> String {
        format!("projects/{}/releases/{}", PROJECT, release_id)
    }

    pub fn document_name(path: &str) -> String {
        format!("projects/{}/databases/(default)/documents/{}", PROJECT, path)
    }

    pub fn seed_release(&self, release_id: &str, ruleset_name: &str) {
        self.lock()
            .releases
            .insert(Self::release_name(release_id), ruleset_name.to_string());
    }

    pub fn seed_user(&self, email: &str, uid: &str, password: &str) {
        let mut state = self.lock();
        state.users.insert(email.to_string(), uid.to_string());
        state
            .passwords
            .insert(uid.to_string(), password.to_string());
    }

    pub fn seed_document(&self, path: &str, fields: Value) {
        let fields = fields.as_object().cloned().unwrap_or_default();
        self.lock().documents.insert(Self::document_name(path), fields);
    }

    pub fn active_ruleset(&self, release_id: &str) -> Option<String> {
        self.lock()
            .releases
            .get(&Self::release_name(release_id))
            .cloned()
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": { "code": status.as_u16(), "message": message }
        })),
    )
        .into_response()
}

/// Check the bearer token and record the call.
fn authorize(state: &Shared, headers: &HeaderMap, call: &str) -> Result<(), Response> {
    let expected = format!("Bearer {}", ACCESS_TOKEN);
    let ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if !ok {
        return Err(api_error(StatusCode::UNAUTHORIZED, "missing or invalid token"));
    }
    state.lock().unwrap().calls.push(call.to_string());
    Ok(())
}

// ============================================================
// Token
// ============================================================

async fn token(
    State(state): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.token_requests += 1;
    if state.reject_tokens {
        return api_error(StatusCode::BAD_REQUEST, "invalid_grant");
    }
    if form.get("grant_type").map(String::as_str)
        != Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    {
        return api_error(StatusCode::BAD_REQUEST, "unsupported_grant_type");
    }
    let Some(assertion) = form.get("assertion") else {
        return api_error(StatusCode::BAD_REQUEST, "missing assertion");
    };

    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).expect("Invalid public key");
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[state.token_uri.as_str()]);
    validation.set_issuer(&[CLIENT_EMAIL]);
    match decode::<AssertionClaims>(assertion, &key, &validation) {
        Ok(data) if data.claims.scope.contains("cloud-platform") => Json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3600,
            "token_type": "Bearer",
        }))
        .into_response(),
        _ => api_error(StatusCode::BAD_REQUEST, "invalid_grant"),
    }
}

// ============================================================
// Rules
// ============================================================

async fn create_ruleset(
    State(state): State<Shared>,
    UrlPath(project): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "POST rulesets") {
        return resp;
    }
    let mut state = state.lock().unwrap();
    if let Some(status) = state.fail_create {
        return api_error(status, "ruleset rejected");
    }

    let files = body["source"]["files"].clone();
    let name = format!("projects/{}/rulesets/{}", project, uuid::Uuid::new_v4());
    state.rulesets.push((name.clone(), files.clone()));
    Json(json!({
        "name": name,
        "createTime": "2024-05-01T10:00:00Z",
        "source": { "files": files },
    }))
    .into_response()
}

fn release_json(name: &str, ruleset_name: &str) -> Response {
    Json(json!({
        "name": name,
        "rulesetName": ruleset_name,
        "updateTime": "2024-05-01T10:00:01Z",
    }))
    .into_response()
}

async fn get_release(
    State(state): State<Shared>,
    UrlPath((project, release)): UrlPath<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "GET release") {
        return resp;
    }
    let name = format!("projects/{}/releases/{}", project, release);
    let state = state.lock().unwrap();
    match state.releases.get(&name) {
        Some(ruleset) => release_json(&name, ruleset),
        None => api_error(StatusCode::NOT_FOUND, "release not found"),
    }
}

async fn update_release(
    State(state): State<Shared>,
    UrlPath((project, release)): UrlPath<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "PATCH release") {
        return resp;
    }
    let name = format!("projects/{}/releases/{}", project, release);
    let mut state = state.lock().unwrap();
    if let Some(status) = state.fail_release {
        return api_error(status, "release rejected");
    }
    if body["release"]["name"] != json!(name) {
        return api_error(StatusCode::BAD_REQUEST, "release name mismatch");
    }
    let Some(ruleset) = body["release"]["rulesetName"].as_str() else {
        return api_error(StatusCode::BAD_REQUEST, "rulesetName required");
    };
    if !state.releases.contains_key(&name) {
        return api_error(StatusCode::NOT_FOUND, "release not found");
    }
    state.releases.insert(name.clone(), ruleset.to_string());
    release_json(&name, ruleset)
}

async fn create_release(
    State(state): State<Shared>,
    UrlPath(_project): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "POST release") {
        return resp;
    }
    let mut state = state.lock().unwrap();
    if let Some(status) = state.fail_release {
        return api_error(status, "release rejected");
    }
    let (Some(name), Some(ruleset)) = (body["name"].as_str(), body["rulesetName"].as_str())
    else {
        return api_error(StatusCode::BAD_REQUEST, "name and rulesetName required");
    };
    if state.releases.contains_key(name) {
        return api_error(StatusCode::CONFLICT, "release already exists");
    }
    state.releases.insert(name.to_string(), ruleset.to_string());
    release_json(name, ruleset)
}

// ============================================================
// Identity Toolkit
// ============================================================

async fn lookup_users(
    State(state): State<Shared>,
    UrlPath(_project): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "POST accounts:lookup") {
        return resp;
    }
    let state = state.lock().unwrap();
    let users: Vec<Value> = body["email"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|email| {
            state
                .users
                .get(email)
                .map(|uid| json!({ "localId": uid, "email": email }))
        })
        .collect();

    // The real API omits `users` entirely when nothing matched.
    if users.is_empty() {
        Json(json!({ "kind": "identitytoolkit#GetAccountInfoResponse" })).into_response()
    } else {
        Json(json!({ "users": users })).into_response()
    }
}

async fn create_user(
    State(state): State<Shared>,
    UrlPath(_project): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "POST accounts") {
        return resp;
    }
    let (Some(email), Some(password)) = (body["email"].as_str(), body["password"].as_str()) else {
        return api_error(StatusCode::BAD_REQUEST, "email and password required");
    };
    let mut state = state.lock().unwrap();
    if state.users.contains_key(email) {
        return api_error(StatusCode::BAD_REQUEST, "EMAIL_EXISTS");
    }
    let uid = uuid::Uuid::new_v4().simple().to_string();
    state.users.insert(email.to_string(), uid.clone());
    state.passwords.insert(uid.clone(), password.to_string());
    Json(json!({ "localId": uid, "email": email })).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    UrlPath(_project): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "POST accounts:update") {
        return resp;
    }
    let (Some(uid), Some(password)) = (body["localId"].as_str(), body["password"].as_str()) else {
        return api_error(StatusCode::BAD_REQUEST, "localId and password required");
    };
    let mut state = state.lock().unwrap();
    if !state.passwords.contains_key(uid) {
        return api_error(StatusCode::BAD_REQUEST, "USER_NOT_FOUND");
    }
    state.passwords.insert(uid.to_string(), password.to_string());
    Json(json!({ "localId": uid })).into_response()
}

// ============================================================
// Firestore
// ============================================================

async fn get_document(
    State(state): State<Shared>,
    UrlPath((project, database, path)): UrlPath<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "GET document") {
        return resp;
    }
    let name = format!("projects/{}/databases/{}/documents/{}", project, database, path);
    let state = state.lock().unwrap();
    match state.documents.get(&name) {
        Some(fields) => Json(json!({ "name": name, "fields": fields })).into_response(),
        None => api_error(StatusCode::NOT_FOUND, "document not found"),
    }
}

async fn commit(
    State(state): State<Shared>,
    UrlPath((_project, _database)): UrlPath<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers, "POST commit") {
        return resp;
    }
    let mut state = state.lock().unwrap();
    state.commits.push(body.clone());

    // Commits are atomic: a failed precondition rejects every write.
    for write in body["writes"].as_array().into_iter().flatten() {
        if let (Some(name), Some(exists)) = (
            write["update"]["name"].as_str(),
            write["currentDocument"]["exists"].as_bool(),
        ) {
            if state.documents.contains_key(name) != exists {
                let status = if exists {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::CONFLICT
                };
                return api_error(status, "precondition failed");
            }
        }
    }

    for write in body["writes"].as_array().into_iter().flatten() {
        let Some(name) = write["update"]["name"].as_str() else {
            return api_error(StatusCode::BAD_REQUEST, "write without document name");
        };
        let incoming = write["update"]["fields"]
            .as_object()
            .cloned()
            .unwrap_or_default();

        let doc = state.documents.entry(name.to_string()).or_default();
        match write["updateMask"]["fieldPaths"].as_array() {
            Some(paths) => {
                for path in paths.iter().filter_map(Value::as_str) {
                    match incoming.get(path) {
                        Some(value) => {
                            doc.insert(path.to_string(), value.clone());
                        }
                        None => {
                            doc.remove(path);
                        }
                    }
                }
            }
            None => *doc = incoming,
        }

        for transform in write["updateTransforms"].as_array().into_iter().flatten() {
            if transform["setToServerValue"] == "REQUEST_TIME" {
                if let Some(field) = transform["fieldPath"].as_str() {
                    doc.insert(
                        field.to_string(),
                        json!({ "timestampValue": "2024-05-01T10:00:02Z" }),
                    );
                }
            }
        }
    }

    Json(json!({ "commitTime": "2024-05-01T10:00:02Z" })).into_response()
}
