mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::{Config, StorageBackend};
use db::{DBClient, MemoryStore, Store};
use dotenv::dotenv;
use mail::{
    mails::EmailService,
    sendmail::{transport_from_config, EmailTransport},
};
use routes::create_router;
use service::{
    admin_service::AdminService, auth_service::AuthService,
    instructor_service::InstructorService, lesson_service::LessonService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn Store>,
    pub auth_service: Arc<AuthService>,
    pub instructor_service: Arc<InstructorService>,
    pub admin_service: Arc<AdminService>,
    pub lesson_service: Arc<LessonService>,
    pub email_service: Arc<EmailService>,
}

impl AppState {
    pub fn new(db_client: Arc<dyn Store>, transport: Arc<dyn EmailTransport>, config: Config) -> Self {
        AppState {
            auth_service: Arc::new(AuthService::new(
                db_client.clone(),
                config.jwt_secret.clone(),
                config.jwt_maxage,
            )),
            instructor_service: Arc::new(InstructorService::new(
                db_client.clone(),
                config.default_instructor_password.clone(),
            )),
            admin_service: Arc::new(AdminService::new(db_client.clone())),
            lesson_service: Arc::new(LessonService::new(db_client.clone())),
            email_service: Arc::new(EmailService::new(transport, config.frontend_url.clone())),
            db_client,
            env: config,
        }
    }
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;

            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("failed to connect to the database")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;

            tracing::info!("connection to the database is successful");
            Ok(Arc::new(DBClient::new(pool)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("seuinstrutor=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let db_client = connect_store(&config).await?;
    let transport: Arc<dyn EmailTransport> = transport_from_config(&config.mail)
        .context("failed to build the email transport")?
        .into();

    let app_state = AppState::new(db_client, transport, config.clone());

    if let Some(admin) = &config.admin {
        if let Some(user) = app_state
            .auth_service
            .ensure_admin(admin)
            .await
            .context("failed to create the bootstrap admin")?
        {
            tracing::info!(email = %user.email, "admin account ready");
        }
    }

    let origin = config
        .frontend_url
        .parse::<HeaderValue>()
        .context("FRONTEND_URL is not a valid origin")?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    let app = create_router(Arc::new(app_state)).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .context("failed to bind the listener")?;

    tracing::info!("server is running on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
