use crate::{
    auth::{AuthService, LoginRequest, RegisterRequest},
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
///
/// ## Responses:
/// - `201 Created`: `{ "token": ..., "user_id": ... }`.
/// - `400 Bad Request`: the username is taken, or the body is not valid JSON.
/// - `422 Unprocessable Entity`: username or password fails validation.
/// - `500 Internal Server Error`: store or hashing failure.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let response = auth.register(&register_data).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Login user
///
/// Authenticates a user and returns a fresh authentication token.
///
/// ## Responses:
/// - `200 OK`: `{ "token": ..., "user_id": ... }`.
/// - `400 Bad Request`: unknown username or wrong password (same body for both).
/// - `500 Internal Server Error`: store failure.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = auth.login(&login_data).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, TokenManager};
    use crate::store::InMemoryStore;
    use actix_web::{http::StatusCode, test};
    use serde_json::json;
    use std::sync::Arc;

    fn auth_data() -> web::Data<AuthService> {
        let credentials = CredentialStore::new(Arc::new(InMemoryStore::new()), 4);
        web::Data::new(AuthService::new(
            credentials,
            TokenManager::new("routes-secret", 3600),
            false,
        ))
    }

    #[actix_rt::test]
    async fn test_register_validation() {
        let app = test::init_service(
            actix_web::App::new()
                .app_data(auth_data())
                .service(register),
        )
        .await;

        // Username with spaces
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({ "username": "bad name", "password": "password123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // Short password
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({ "username": "tester", "password": "short" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_rt::test]
    async fn test_register_then_login() {
        let app = test::init_service(
            actix_web::App::new()
                .app_data(auth_data())
                .service(register)
                .service(login),
        )
        .await;

        let credentials = json!({ "username": "route_user", "password": "password123" });

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(&credentials)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(&credentials)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
