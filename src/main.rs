use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod attendance;
mod auth;
mod clock;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod report;
mod routes;
mod state;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::attendance::reconciler::spawn_daily_sweep;
use crate::clock::{Clock, ZonedClock};
use crate::docs::ApiDoc;
use crate::model::employee::Employee;
use crate::state::AppState;
use crate::store::memory::InMemoryStore;
use crate::store::mysql::MySqlStore;
use crate::store::{AttendanceStore, EmployeeDirectory, ReportStore};
use crate::utils::employee_cache::CachedDirectory;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRM attendance service"
}

struct Stores {
    attendance: Arc<dyn AttendanceStore>,
    reports: Arc<dyn ReportStore>,
    directory: Arc<dyn EmployeeDirectory>,
}

async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    if let Some(url) = &config.database_url {
        let store = Arc::new(MySqlStore::new(init_db(url).await?));
        info!("Using MySQL store");
        return Ok(Stores {
            attendance: store.clone(),
            reports: store.clone(),
            directory: store,
        });
    }

    let employees = match &config.employee_seed_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read employee seed file {path}"))?;
            serde_json::from_str::<Vec<Employee>>(&raw)
                .with_context(|| format!("Invalid employee seed file {path}"))?
        }
        None => Vec::new(),
    };
    warn!(
        employees = employees.len(),
        "DATABASE_URL not set, using in-memory store"
    );

    let store = Arc::new(InMemoryStore::with_employees(employees));
    Ok(Stores {
        attendance: store.clone(),
        reports: store.clone(),
        directory: store,
    })
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(zone = %config.timezone, "Server starting...");

    let stores = open_stores(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(ZonedClock::new(config.timezone));

    let directory = Arc::new(CachedDirectory::new(
        stores.directory,
        config.employee_cache_capacity,
        Duration::from_secs(config.employee_cache_ttl_secs),
    ));
    let directory_for_warmup = directory.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = directory_for_warmup.warmup().await {
            warn!(error = %e, "Failed to warm up employee cache");
        }
    });

    let state = Data::new(AppState::new(
        stores.attendance,
        stores.reports,
        directory,
        clock.clone(),
    ));
    spawn_daily_sweep(state.reconciler.clone(), clock, config.absence_sweep_at);

    let limiter = routes::build_limiter(config.rate_protected_per_min)?;
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let api_prefix = config_data.api_prefix.clone();
        let limiter = limiter.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(config_data.clone())
            .service(index)
            .configure(move |cfg| routes::configure(cfg, &api_prefix, &limiter))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
