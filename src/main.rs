use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

mod api;
mod attendance;
mod auth;
mod clock;
mod config;
mod db;
mod docs;
mod model;
mod models;
mod routes;
mod state;
mod store;
mod utils;

#[cfg(test)]
mod test_helpers;

use clock::SystemClock;
use config::Config;
use db::init_db;
use state::AppState;
use store::mysql::{MySqlAttendanceStore, MySqlSiteStore};
use store::SiteStore;
use utils::site_cache::SiteCache;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "sitecheck.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(offset = %config.local_offset, "Server starting...");

    let pool = init_db(&config.database_url).await?;

    let site_store: Arc<dyn SiteStore> = Arc::new(MySqlSiteStore::new(pool.clone()));
    let sites = SiteCache::new(
        site_store.clone(),
        config.site_cache_capacity,
        config.site_cache_ttl,
    );
    let state = AppState::new(
        site_store,
        Arc::new(MySqlAttendanceStore::new(pool)),
        Arc::new(SystemClock::new(config.local_offset)),
        sites.clone(),
    );

    actix_web::rt::spawn(async move {
        if let Err(e) = sites.warmup().await {
            warn!(error = %e, "Failed to warm up site cache");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(state.clone()))
            .app_data(Data::new(config.clone()))
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
