use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::AuthService;
use crate::error::AppError;

/// Verifies bearer tokens on the routes it wraps.
///
/// A valid token puts its [`Claims`](crate::auth::Claims) into the request extensions.
/// An invalid or expired token is answered with 401. A request without a token passes
/// through unless the registered [`AuthService`] requires authentication.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S> AuthMiddlewareService<S> {
    fn reject<B>(
        req: ServiceRequest,
        app_err: AppError,
    ) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>
    where
        B: 'static,
    {
        let response = req.into_response(app_err.error_response());
        Box::pin(ready(Ok(response.map_into_right_body())))
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth = match req.app_data::<web::Data<AuthService>>() {
            Some(auth) => auth.clone(),
            None => {
                let app_err =
                    AppError::InternalServerError("AuthService is not registered as app data".into());
                return Self::reject(req, app_err);
            }
        };

        let bearer = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_owned);

        match bearer {
            Some(token) => match auth.verify(&token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    self.pass(req)
                }
                Err(app_err) => {
                    log::warn!("Rejected bearer token on {}: {}", req.path(), app_err);
                    Self::reject(req, app_err)
                }
            },
            None if auth.auth_required() => {
                Self::reject(req, AppError::Unauthorized("Missing token".into()))
            }
            None => self.pass(req),
        }
    }
}

impl<S, B> AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    fn pass(
        &self,
        req: ServiceRequest,
    ) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>> {
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Caller, CredentialStore, TokenManager};
    use crate::store::InMemoryStore;
    use actix_web::{get, http::StatusCode, test, App, HttpResponse, Responder};
    use std::sync::Arc;
    use uuid::Uuid;

    #[get("/whoami")]
    async fn whoami(caller: Caller) -> impl Responder {
        HttpResponse::Ok().json(caller.0)
    }

    fn auth_service(auth_required: bool) -> AuthService {
        let credentials = CredentialStore::new(Arc::new(InMemoryStore::new()), 4);
        AuthService::new(credentials, TokenManager::new("middleware-secret", 3600), auth_required)
    }

    #[actix_rt::test]
    async fn test_valid_token_sets_caller() {
        let auth = auth_service(false);
        let user_id = Uuid::new_v4();
        let token = TokenManager::new("middleware-secret", 3600)
            .generate_token(user_id)
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth))
                .wrap(AuthMiddleware)
                .service(whoami),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let caller: Option<Uuid> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(caller, Some(user_id));
    }

    #[actix_rt::test]
    async fn test_missing_token_allowed_when_optional() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth_service(false)))
                .wrap(AuthMiddleware)
                .service(whoami),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let caller: Option<Uuid> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(caller, None);
    }

    #[actix_rt::test]
    async fn test_missing_token_rejected_when_required() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth_service(true)))
                .wrap(AuthMiddleware)
                .service(whoami),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({ "message": "Missing token" }));
    }

    #[actix_rt::test]
    async fn test_invalid_token_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth_service(false)))
                .wrap(AuthMiddleware)
                .service(whoami),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .append_header((header::AUTHORIZATION, "Bearer not-a-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().starts_with("Invalid token"));
    }
}
