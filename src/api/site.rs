use crate::attendance::time_of_day::TimeOfDay;
use crate::auth::auth::AuthUser;
use crate::model::site::{CheckInWindow, Position, Site, SiteConfigError, SiteGeofence};
use crate::state::AppState;
use crate::utils::headcount::HeadcountSnapshot;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateGeofence {
    #[schema(example = 37.5665)]
    pub latitude: f64,
    #[schema(example = 126.978)]
    pub longitude: f64,
    #[schema(example = 50.0)]
    pub radius_meters: f64,
    #[schema(value_type = String, example = "09:00")]
    pub checkin_start: TimeOfDay,
    #[schema(value_type = String, example = "18:00")]
    pub checkin_end: TimeOfDay,
}

impl TryFrom<&UpdateGeofence> for SiteGeofence {
    type Error = SiteConfigError;

    fn try_from(update: &UpdateGeofence) -> Result<Self, Self::Error> {
        SiteGeofence::new(
            Position::new(update.latitude, update.longitude)?,
            update.radius_meters,
            CheckInWindow::new(update.checkin_start, update.checkin_end)?,
        )
    }
}

fn store_failure(e: impl std::fmt::Display, site_id: Option<u64>) -> actix_web::Error {
    tracing::error!(error = %e, ?site_id, "Site store failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

#[utoipa::path(
    get,
    path = "/api/sites",
    responses(
        (status = 200, description = "All configured sites", body = [Site]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Site"
)]
pub async fn list_sites(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let sites = state
        .site_store
        .list_sites()
        .await
        .map_err(|e| store_failure(e, None))?;

    for site in &sites {
        state.sites.put(site.clone()).await;
    }

    Ok(HttpResponse::Ok().json(sites))
}

#[utoipa::path(
    get,
    path = "/api/sites/{site_id}",
    params(
        ("site_id" = u64, Path, description = "Site ID")
    ),
    responses(
        (status = 200, description = "Site found", body = Site),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Site not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Site"
)]
pub async fn get_site(
    _auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let site_id = path.into_inner();

    match state.sites.get(site_id).await {
        Ok(Some(site)) => Ok(HttpResponse::Ok().json(site.as_ref())),
        Ok(None) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Site not found"
        }))),
        Err(e) => Err(store_failure(e, Some(site_id))),
    }
}

/// Replaces a site's geofence and check-in window (Admin)
#[utoipa::path(
    put,
    path = "/api/sites/{site_id}/geofence",
    params(
        ("site_id" = u64, Path, description = "Site ID")
    ),
    request_body = UpdateGeofence,
    responses(
        (status = 200, description = "Geofence updated", body = Site),
        (status = 400, description = "Invalid geofence", body = Object, example = json!({
            "message": "check-in window 22:00-02:00 ends before it starts"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Site not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Site"
)]
pub async fn update_geofence(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<UpdateGeofence>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let site_id = path.into_inner();

    let geofence = match SiteGeofence::try_from(&*payload) {
        Ok(g) => g,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": e.to_string()
            })));
        }
    };

    let updated = state
        .site_store
        .update_geofence(site_id, geofence)
        .await
        .map_err(|e| store_failure(e, Some(site_id)))?;

    state.sites.invalidate(site_id).await;

    match updated {
        Some(site) => {
            tracing::info!(
                site_id,
                user_id = auth.user_id,
                admin = %auth.username,
                "Site geofence updated"
            );
            Ok(HttpResponse::Ok().json(site))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Site not found"
        }))),
    }
}

/// Today's check-in count for a site (Manager/Admin)
#[utoipa::path(
    get,
    path = "/api/sites/{site_id}/headcount",
    params(
        ("site_id" = u64, Path, description = "Site ID")
    ),
    responses(
        (status = 200, description = "Headcount for today", body = HeadcountSnapshot),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager/Admin only"),
        (status = 404, description = "Site not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Site"
)]
pub async fn headcount(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let site_id = path.into_inner();
    let work_date = state.check_in.today();

    // an in-flight check-in settles the count itself
    if state.headcount.is_pending(site_id, work_date) {
        if let Some(snapshot) = state.headcount.snapshot(site_id, work_date) {
            return Ok(HttpResponse::Ok().json(snapshot));
        }
    }

    let site = state
        .sites
        .get(site_id)
        .await
        .map_err(|e| store_failure(e, Some(site_id)))?;
    if site.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Site not found"
        })));
    }

    let count = state
        .attendance
        .count_for_site_day(site_id, work_date)
        .await
        .map_err(|e| store_failure(e, Some(site_id)))?;
    state.headcount.reconcile(site_id, work_date, count);

    Ok(HttpResponse::Ok().json(HeadcountSnapshot {
        site_id,
        work_date,
        confirmed: count,
        current: count,
        pending: false,
    }))
}
