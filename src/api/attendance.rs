use crate::attendance::eligibility::{Decision, Reason};
use crate::attendance::service::{CheckInError, CheckInOutcome};
use crate::auth::auth::AuthUser;
use crate::model::attendance::AttendanceRecord;
use crate::model::site::Position;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = 1)]
    pub site_id: u64,
    /// Device latitude; omit when location is unavailable
    #[schema(example = 37.5665, nullable = true)]
    pub latitude: Option<f64>,
    /// Device longitude; omit when location is unavailable
    #[schema(example = 126.978, nullable = true)]
    pub longitude: Option<f64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct EligibilityQuery {
    #[schema(example = 1)]
    /// Site to check in at
    pub site_id: u64,
    #[schema(example = 37.5665)]
    /// Device latitude
    pub latitude: Option<f64>,
    #[schema(example = 126.978)]
    /// Device longitude
    pub longitude: Option<f64>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "allowed": true,
    "reason": "NONE",
    "message": "Check-in available",
    "work_date": "2026-01-05",
    "local_time": "10:00"
}))]
pub struct EligibilityResponse {
    pub allowed: bool,
    pub reason: Reason,
    pub message: String,
    #[schema(value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(value_type = String, example = "10:00")]
    pub local_time: String,
}

#[derive(Serialize, ToSchema)]
pub struct TodayResponse {
    #[schema(nullable = true)]
    pub record: Option<AttendanceRecord>,
}

fn blocked_response(decision: Decision) -> HttpResponse {
    let body = json!({
        "allowed": false,
        "reason": decision.reason,
        "message": decision.reason.message(),
    });

    match decision.reason {
        Reason::AlreadyCheckedIn => HttpResponse::Conflict().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn service_error(e: CheckInError, worker_id: u64, site_id: u64) -> actix_web::Error {
    match e {
        CheckInError::SiteNotFound(_) => actix_web::error::ErrorNotFound("Site not found"),
        CheckInError::Store(e) => {
            tracing::error!(error = %e, worker_id, site_id, "Attendance store failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        }
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body(
        content = CheckInRequest,
        description = "Site and current device position",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "record": {
                "id": 1,
                "worker_id": 1000,
                "site_id": 1,
                "work_date": "2026-01-05",
                "created_at": "2026-01-05T01:00:00Z"
            }
        })),
        (status = 400, description = "Check-in blocked", body = Object, example = json!({
            "allowed": false,
            "reason": "OUT_OF_RANGE",
            "message": "You are outside the site check-in area"
        })),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "allowed": false,
            "reason": "ALREADY_CHECKED_IN",
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No worker profile"),
        (status = 404, description = "Site not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CheckInRequest>,
) -> actix_web::Result<impl Responder> {
    let worker_id = auth.require_worker()?;
    let site_id = payload.site_id;
    let position = Position::resolve(payload.latitude, payload.longitude);

    let outcome = state
        .check_in
        .check_in(worker_id, site_id, position)
        .await
        .map_err(|e| service_error(e, worker_id, site_id))?;

    Ok(match outcome {
        CheckInOutcome::CheckedIn(record) => HttpResponse::Created().json(json!({
            "message": "Checked in successfully",
            "record": record
        })),
        CheckInOutcome::Blocked(decision) => blocked_response(decision),
    })
}

/// Evaluates a check-in without recording anything
#[utoipa::path(
    get,
    path = "/api/attendance/eligibility",
    params(EligibilityQuery),
    responses(
        (status = 200, description = "Current eligibility", body = EligibilityResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No worker profile"),
        (status = 404, description = "Site not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn eligibility(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<EligibilityQuery>,
) -> actix_web::Result<impl Responder> {
    let worker_id = auth.require_worker()?;
    let position = Position::resolve(query.latitude, query.longitude);

    let evaluation = state
        .check_in
        .evaluate(worker_id, query.site_id, position)
        .await
        .map_err(|e| service_error(e, worker_id, query.site_id))?;

    let reason = evaluation.decision.reason;
    Ok(HttpResponse::Ok().json(EligibilityResponse {
        allowed: evaluation.decision.allowed,
        reason,
        message: reason.message().to_string(),
        work_date: evaluation.work_date,
        local_time: evaluation.local_time.to_string(),
    }))
}

/// Today's attendance record for the caller
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Record for today, null if not checked in", body = TodayResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No worker profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let worker_id = auth.require_worker()?;

    let record = state.check_in.today_record(worker_id).await.map_err(|e| {
        tracing::error!(error = %e, worker_id, "Fetching today's attendance failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(TodayResponse { record }))
}
