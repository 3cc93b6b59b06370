use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::process;
use std::sync::Arc;

use taskkeeper::auth::{AuthService, CredentialStore, TokenManager};
use taskkeeper::config::{Config, StoreBackend};
use taskkeeper::routes;
use taskkeeper::store::{InMemoryStore, PgStore, StoreError, TaskStore, UserStore};
use taskkeeper::TaskService;

type Stores = (Arc<dyn UserStore>, Arc<dyn TaskStore>);

async fn open_store(config: &Config) -> Result<Stores, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on exit");
            let store = InMemoryStore::new();
            let users: Arc<dyn UserStore> = Arc::new(store.clone());
            let tasks: Arc<dyn TaskStore> = Arc::new(store);
            Ok((users, tasks))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".into()))?;
            let store = PgStore::connect(url, config.database_max_connections).await?;
            log::info!("Connected to PostgreSQL");
            let users: Arc<dyn UserStore> = Arc::new(store.clone());
            let tasks: Arc<dyn TaskStore> = Arc::new(store);
            Ok((users, tasks))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let (users, tasks) = match open_store(&config).await {
        Ok(stores) => stores,
        Err(e) => {
            log::error!("Store connection error: {}", e);
            process::exit(1);
        }
    };

    let credentials = CredentialStore::new(users, config.bcrypt_cost);
    let tokens = TokenManager::new(&config.jwt_secret, config.token_ttl_seconds);
    let auth = web::Data::new(AuthService::new(credentials, tokens, config.auth_required));
    let task_service = web::Data::new(TaskService::new(tasks));

    if !config.auth_required {
        log::warn!("AUTH_REQUIRED is off: task routes accept requests without a bearer token");
    }
    log::info!("Server is running on {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(auth.clone())
            .app_data(task_service.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
