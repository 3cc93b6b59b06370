#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{http::header, test, web};
use serde_json::json;
use std::sync::Arc;
use taskkeeper::auth::{AuthResponse, AuthService, CredentialStore, TokenManager};
use taskkeeper::models::Task;
use taskkeeper::store::InMemoryStore;
use taskkeeper::TaskService;

pub const TEST_SECRET: &str = "integration-test-secret";

// bcrypt's minimum cost keeps the suite fast.
const TEST_HASH_COST: u32 = 4;

/// Services backed by a fresh in-memory store.
pub fn services(auth_required: bool) -> (web::Data<AuthService>, web::Data<TaskService>) {
    let store = InMemoryStore::new();
    let credentials = CredentialStore::new(Arc::new(store.clone()), TEST_HASH_COST);
    let auth = AuthService::new(
        credentials,
        TokenManager::new(TEST_SECRET, 3600),
        auth_required,
    );
    (
        web::Data::new(auth),
        web::Data::new(TaskService::new(Arc::new(store))),
    )
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register_user<S, B>(app: &S, username: &str, password: &str) -> Result<AuthResponse, String>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    serde_json::from_slice(&body).map_err(|e| format!("Failed to parse registration response: {}", e))
}

pub async fn create_task<S, B>(app: &S, payload: serde_json::Value, token: Option<&str>) -> Task
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut req = test::TestRequest::post().uri("/api/tasks").set_json(payload);
    if let Some(token) = token {
        req = req.append_header(bearer(token));
    }
    let resp = test::call_service(app, req.to_request()).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    test::read_body_json(resp).await
}
