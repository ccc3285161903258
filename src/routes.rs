use crate::{
    api::{attendance, site},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, Responder, middleware::from_fn, web};
use serde_json::json;
use std::sync::Arc;

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            // finish() only rejects a zero period or burst, both clamped above
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let check_in_limiter = Arc::new(build_limiter(config.rate_check_in_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(web::resource("/health").route(web::get().to(health)));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance/check-in
                    .service(
                        web::resource("/check-in")
                            .wrap(check_in_limiter)
                            .route(web::post().to(attendance::check_in)),
                    )
                    // /attendance/eligibility
                    .service(
                        web::resource("/eligibility").route(web::get().to(attendance::eligibility)),
                    )
                    // /attendance/today
                    .service(web::resource("/today").route(web::get().to(attendance::today))),
            )
            .service(
                web::scope("/sites")
                    // /sites
                    .service(web::resource("").route(web::get().to(site::list_sites)))
                    // /sites/{id}
                    .service(web::resource("/{id}").route(web::get().to(site::get_site)))
                    // /sites/{id}/geofence
                    .service(
                        web::resource("/{id}/geofence")
                            .route(web::put().to(site::update_geofence)),
                    )
                    // /sites/{id}/headcount
                    .service(
                        web::resource("/{id}/headcount").route(web::get().to(site::headcount)),
                    ),
            ),
    );
}
