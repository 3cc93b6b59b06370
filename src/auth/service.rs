use crate::auth::{AuthResponse, Claims, CredentialStore, LoginRequest, RegisterRequest, TokenManager};
use crate::error::AppError;
use validator::Validate;

/// Registration, login and token verification.
#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    tokens: TokenManager,
    auth_required: bool,
}

impl AuthService {
    pub fn new(credentials: CredentialStore, tokens: TokenManager, auth_required: bool) -> Self {
        Self {
            credentials,
            tokens,
            auth_required,
        }
    }

    /// Whether task routes reject requests that carry no bearer token.
    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    /// Creates an account and returns a token for it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, AppError> {
        request.validate()?;

        let user = self
            .credentials
            .create(&request.username, &request.password)
            .await?;
        log::info!("Registered user {}", user.id);

        Ok(AuthResponse {
            token: self.tokens.generate_token(user.id)?,
            user_id: user.id,
        })
    }

    /// Checks a username/password pair and returns a fresh token.
    ///
    /// Unknown usernames and wrong passwords both yield `AppError::InvalidCredentials`.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AppError> {
        let user = match self.credentials.find_by_username(&request.username).await? {
            Some(user) => user,
            None => {
                log::debug!("Login failed: unknown username");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.credentials.verify(&user, &request.password).await? {
            log::debug!("Login failed: password mismatch for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        Ok(AuthResponse {
            token: self.tokens.generate_token(user.id)?,
            user_id: user.id,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.verify_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn service() -> AuthService {
        let credentials = CredentialStore::new(Arc::new(InMemoryStore::new()), 4);
        AuthService::new(credentials, TokenManager::new("service-secret", 3600), false)
    }

    fn register_request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_register_then_login() {
        let auth = service();
        let registered = auth
            .register(&register_request("alice", "password123"))
            .await
            .unwrap();
        assert_eq!(auth.verify(&registered.token).unwrap().sub, registered.user_id);

        let logged_in = auth
            .login(&login_request("alice", "password123"))
            .await
            .unwrap();
        assert_eq!(logged_in.user_id, registered.user_id);
        assert_eq!(auth.verify(&logged_in.token).unwrap().sub, registered.user_id);
    }

    #[actix_rt::test]
    async fn test_register_duplicate() {
        let auth = service();
        auth.register(&register_request("bob", "password123"))
            .await
            .unwrap();

        let again = auth.register(&register_request("bob", "otherpass")).await;
        assert!(matches!(again, Err(AppError::DuplicateUsername)));
    }

    #[actix_rt::test]
    async fn test_register_validates_input() {
        let auth = service();
        let result = auth.register(&register_request("a b", "password123")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service();
        auth.register(&register_request("carol", "password123"))
            .await
            .unwrap();

        let wrong_password = auth
            .login(&login_request("carol", "not-the-password"))
            .await
            .unwrap_err();
        let unknown_user = auth
            .login(&login_request("nobody", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
        assert_eq!(wrong_password.public_message(), unknown_user.public_message());
    }
}
