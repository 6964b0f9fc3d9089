// src/main.rs - Lab inventory service: routes, middleware and startup
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod handlers;
mod import_export;
mod models;
mod monitoring;
mod status;
mod store;
mod workbook;

use crate::config::{load_config, Config};
use crate::store::{RecordStore, SqliteRecordStore};

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Config,
}

// ==================== ROUTES ====================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(monitoring::health_check))
            .route("/health/ready", web::get().to(monitoring::readiness_check))
            .route("/health/live", web::get().to(monitoring::liveness_check))
            // Workbooks
            .route("/reports/monthly", web::get().to(import_export::download_monthly_report))
            .route("/reports/template", web::get().to(import_export::download_template))
            .route("/import", web::post().to(import_export::import_upload))
            .route("/import/raw", web::post().to(import_export::import_raw))
            .service(
                web::resource("/lab-tests")
                    .route(web::get().to(handlers::list_lab_tests))
                    .route(web::post().to(handlers::add_lab_test)),
            )
            // Inventory; `/live` must be registered ahead of `/{id}`
            .service(
                web::resource("/inventory/{category}")
                    .route(web::get().to(handlers::list_inventory))
                    .route(web::post().to(handlers::add_record)),
            )
            .route("/inventory/{category}/live", web::get().to(handlers::live_inventory))
            .service(
                web::resource("/inventory/{category}/{id}")
                    .route(web::get().to(handlers::get_record))
                    .route(web::put().to(handlers::update_record))
                    .route(web::delete().to(handlers::delete_record)),
            ),
    );
}

// ==================== MIDDLEWARE ====================

pub fn setup_cors(allowed_origins: &[String], is_production: bool) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::USER_AGENT,
            header::REFERER,
        ])
        .expose_headers(vec![header::CONTENT_LENGTH, header::CONTENT_DISPOSITION])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") && !is_production {
        log::warn!("⚠️  Using wildcard CORS (*) in development mode");
        return cors.allow_any_origin().allow_any_header().allow_any_method();
    }

    for origin in allowed_origins.iter().filter(|o| !o.is_empty() && o.as_str() != "*") {
        cors = cors.allowed_origin(origin);
    }
    cors
}

fn setup_security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("X-XSS-Protection", "1; mode=block"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
}

// ==================== STARTUP ====================

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn validate_production_config(config: &Config) -> anyhow::Result<()> {
    if config.security.allowed_origins.iter().any(|o| o == "*") {
        anyhow::bail!("Wildcard CORS origins not allowed in production!");
    }
    Ok(())
}

async fn create_database_pool(db_config: &config::DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&db_config.url)
        .with_context(|| format!("Invalid database url: {}", db_config.url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout))
        .connect_with(options)
        .await
        .context("Failed to open database")?;
    Ok(pool)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    setup_logging(&config)?;
    monitoring::mark_started();

    let is_production = config.is_production();
    if is_production {
        validate_production_config(&config)?;
    }
    config.print_startup_info();

    let pool = create_database_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let app_state = Arc::new(AppState {
        store: Arc::new(SqliteRecordStore::new(pool)),
        config: config.clone(),
    });

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let upload_limit = config.security.max_upload_bytes;
    let keep_alive = Duration::from_secs(config.server.keep_alive);
    let workers = config.server.workers;
    let mut server = HttpServer::new(move || {
        let cors = setup_cors(&config.security.allowed_origins, is_production);

        App::new()
            .wrap(cors)
            .wrap(setup_security_headers())
            .wrap(Logger::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::PayloadConfig::new(upload_limit))
            .app_data(web::JsonConfig::default().limit(upload_limit))
            .configure(configure_routes)
    })
    .keep_alive(keep_alive);

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)?
        .run()
        .await
        .context("Server failed to run")?;

    Ok(())
}
