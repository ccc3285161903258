//! Test helpers.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{test::TestRequest, web};
use chrono::{DateTime, FixedOffset};

use crate::attendance::service::tests::{clock_at, site_store};
use crate::auth::jwt::tests::{SECRET, token};
use crate::config::Config;
use crate::models::TokenType;
use crate::routes;
use crate::state::AppState;
use crate::store::{MockAttendanceStore, MockSiteStore};
use crate::utils::site_cache::SiteCache;

pub(crate) fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        rate_check_in_per_min: 1000,
        rate_protected_per_min: 1000,
        site_cache_capacity: 10,
        site_cache_ttl: Duration::from_secs(60),
        local_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
    }
}

pub(crate) fn state_from(
    sites: MockSiteStore,
    attendance: MockAttendanceStore,
    now: DateTime<FixedOffset>,
) -> AppState {
    let site_store: Arc<dyn crate::store::SiteStore> = Arc::new(sites);
    let cache = SiteCache::new(site_store.clone(), 10, Duration::from_secs(60));
    AppState::new(site_store, Arc::new(attendance), Arc::new(clock_at(now)), cache)
}

/// State whose only site is site 1 at Seoul City Hall.
pub(crate) fn state_with(attendance: MockAttendanceStore, now: DateTime<FixedOffset>) -> AppState {
    state_from(site_store(), attendance, now)
}

pub(crate) fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let config = test_config();
        cfg.app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(state));
        routes::configure(cfg, config);
    }
}

/// Authenticated request from a fixed peer so rate limiting can key on it.
pub(crate) fn request(req: TestRequest, uri: &str, token: &str) -> TestRequest {
    req.uri(uri)
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {token}")))
}

pub(crate) fn worker_token() -> String {
    token(3, Some(1000), TokenType::Access)
}

pub(crate) fn admin_token() -> String {
    token(1, None, TokenType::Access)
}

pub(crate) fn manager_token() -> String {
    token(2, None, TokenType::Access)
}
