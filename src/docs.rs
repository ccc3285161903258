use crate::api::attendance::{CheckInRequest, EligibilityQuery, EligibilityResponse, TodayResponse};
use crate::api::site::UpdateGeofence;
use crate::attendance::eligibility::{Decision, Reason};
use crate::model::attendance::AttendanceRecord;
use crate::model::site::{CheckInWindow, Position, Site, SiteGeofence};
use crate::utils::headcount::HeadcountSnapshot;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Site Check-in API",
        version = "1.0.0",
        description = r#"
## Site attendance check-in

Staff check in once per day at their work site. A check-in is accepted only when:

- the worker has not checked in yet today,
- the device reports a position,
- that position is inside the site's geofence (center + radius, boundary inclusive),
- the local time is inside the site's check-in window (start and end inclusive).

Blocked attempts return a single reason code:
`ALREADY_CHECKED_IN`, `LOCATION_UNAVAILABLE`, `OUT_OF_RANGE` or `OUTSIDE_TIME_WINDOW`.

### 🔐 Security
All `/api` endpoints require a **JWT Bearer** access token issued by the identity provider.
Geofence changes are **Admin** only; headcounts are **Manager/Admin**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::eligibility,
        crate::api::attendance::today,

        crate::api::site::list_sites,
        crate::api::site::get_site,
        crate::api::site::update_geofence,
        crate::api::site::headcount
    ),
    components(
        schemas(
            CheckInRequest,
            EligibilityQuery,
            EligibilityResponse,
            TodayResponse,
            AttendanceRecord,
            Decision,
            Reason,
            Position,
            CheckInWindow,
            SiteGeofence,
            Site,
            UpdateGeofence,
            HeadcountSnapshot
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Daily check-in APIs"),
        (name = "Site", description = "Site geofence and headcount APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_check_in_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/attendance/check-in"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
