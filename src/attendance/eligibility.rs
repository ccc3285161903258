//! Decides whether a worker may check in at a site right now.
//!
//! Everything here is pure: the same inputs always produce the same
//! [`Decision`], and nothing is written anywhere.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use utoipa::ToSchema;

use crate::attendance::time_of_day::TimeOfDay;
use crate::model::site::{Position, Site};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Why a check-in is blocked. `None` means it is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    None,
    AlreadyCheckedIn,
    LocationUnavailable,
    OutOfRange,
    OutsideTimeWindow,
}

impl Reason {
    /// Text shown to the worker for this reason.
    pub fn message(self) -> &'static str {
        match self {
            Reason::None => "Check-in available",
            Reason::AlreadyCheckedIn => "Already checked in today",
            Reason::LocationUnavailable => "Location unavailable, enable location services",
            Reason::OutOfRange => "You are outside the site check-in area",
            Reason::OutsideTimeWindow => "Check-in is not open at this time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "allowed": false, "reason": "OUT_OF_RANGE" }))]
pub struct Decision {
    pub allowed: bool,
    pub reason: Reason,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: Reason::None,
        }
    }

    pub fn block(reason: Reason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Great-circle distance in meters (haversine).
pub fn distance_meters(a: Position, b: Position) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Inclusive: a point exactly on the boundary is in range.
pub fn is_within_radius(current: Position, site: &Site) -> bool {
    distance_meters(current, site.geofence.center) <= site.geofence.radius_meters
}

pub fn is_within_time_window(now: TimeOfDay, start: TimeOfDay, end: TimeOfDay) -> bool {
    start <= now && now <= end
}

/// First failing condition wins, in this order: already checked in,
/// no position, out of range, outside the window.
pub fn can_check_in(
    has_checked_in_today: bool,
    current: Option<Position>,
    site: &Site,
    now: TimeOfDay,
) -> Decision {
    if has_checked_in_today {
        return Decision::block(Reason::AlreadyCheckedIn);
    }

    let Some(current) = current else {
        return Decision::block(Reason::LocationUnavailable);
    };

    if !is_within_radius(current, site) {
        return Decision::block(Reason::OutOfRange);
    }

    let window = site.geofence.window;
    if !is_within_time_window(now, window.start, window.end) {
        return Decision::block(Reason::OutsideTimeWindow);
    }

    Decision::allow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::site::{CheckInWindow, SiteGeofence};
    use testresult::TestResult;

    fn pos(latitude: f64, longitude: f64) -> Position {
        Position {
            latitude,
            longitude,
        }
    }

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn city_hall() -> Site {
        Site {
            id: 1,
            name: "City Hall".into(),
            geofence: SiteGeofence {
                center: pos(37.5665, 126.9780),
                radius_meters: 50.0,
                window: CheckInWindow {
                    start: t("09:00"),
                    end: t("18:00"),
                },
            },
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        for p in [pos(0.0, 0.0), pos(37.5665, 126.978), pos(-89.9, 179.9), pos(51.5, -0.12)] {
            assert_eq!(distance_meters(p, p), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (pos(37.5665, 126.978), pos(37.57, 126.978)),
            (pos(40.7128, -74.006), pos(51.5074, -0.1278)),
            (pos(-33.8688, 151.2093), pos(35.6762, 139.6503)),
        ];
        for (p, q) in pairs {
            let pq = distance_meters(p, q);
            let qp = distance_meters(q, p);
            assert!((pq - qp).abs() <= pq * 1e-6, "{pq} != {qp}");
        }
    }

    #[test]
    fn distance_along_meridian_matches_arc_length() {
        // 0.0035 degrees of latitude
        let d = distance_meters(pos(37.5665, 126.978), pos(37.5700, 126.978));
        let expected = EARTH_RADIUS_METERS * 0.0035_f64.to_radians();
        assert!((d - expected).abs() < 1e-3, "{d} vs {expected}");
        assert!(d > 380.0 && d < 395.0);
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let mut site = city_hall();
        let center = site.geofence.center;
        let edge = pos(center.latitude + (50.0 / EARTH_RADIUS_METERS).to_degrees(), center.longitude);

        let d = distance_meters(center, edge);
        assert!((d - 50.0).abs() < 1e-6);

        site.geofence.radius_meters = d;
        assert!(is_within_radius(edge, &site));

        site.geofence.radius_meters = d - 1e-3;
        assert!(!is_within_radius(edge, &site));
    }

    #[test]
    fn time_window_is_inclusive_on_both_ends() {
        assert!(is_within_time_window(t("09:00"), t("09:00"), t("18:00")));
        assert!(is_within_time_window(t("18:00"), t("09:00"), t("18:00")));
        assert!(!is_within_time_window(t("18:01"), t("09:00"), t("18:00")));
        assert!(!is_within_time_window(t("08:59"), t("09:00"), t("18:00")));
    }

    #[test]
    fn allowed_at_center_during_window() {
        let decision = can_check_in(false, Some(pos(37.5665, 126.9780)), &city_hall(), t("10:00"));
        assert_eq!(decision, Decision::allow());
        assert_eq!(decision.reason, Reason::None);
    }

    #[test]
    fn out_of_range_when_far_from_site() {
        let decision = can_check_in(false, Some(pos(37.5700, 126.9780)), &city_hall(), t("10:00"));
        assert_eq!(decision, Decision::block(Reason::OutOfRange));
    }

    #[test]
    fn outside_window_in_the_evening() {
        let decision = can_check_in(false, Some(pos(37.5665, 126.9780)), &city_hall(), t("20:00"));
        assert_eq!(decision, Decision::block(Reason::OutsideTimeWindow));
    }

    #[test]
    fn missing_position_is_location_unavailable() {
        let decision = can_check_in(false, None, &city_hall(), t("10:00"));
        assert_eq!(decision, Decision::block(Reason::LocationUnavailable));
    }

    #[test]
    fn already_checked_in_wins_over_everything() {
        let site = city_hall();
        let cases = [
            (Some(pos(37.5665, 126.9780)), t("10:00")),
            (Some(pos(37.5700, 126.9780)), t("10:00")),
            (Some(pos(37.5665, 126.9780)), t("20:00")),
            (None, t("03:00")),
        ];
        for (position, now) in cases {
            assert_eq!(
                can_check_in(true, position, &site, now),
                Decision::block(Reason::AlreadyCheckedIn)
            );
        }
    }

    #[test]
    fn range_is_checked_before_window() {
        let decision = can_check_in(false, Some(pos(37.5700, 126.9780)), &city_hall(), t("20:00"));
        assert_eq!(decision.reason, Reason::OutOfRange);
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let site = city_hall();
        let here = Some(pos(37.5666, 126.9781));
        let first = can_check_in(false, here, &site, t("12:30"));
        let second = can_check_in(false, here, &site, t("12:30"));
        assert_eq!(first, second);
        assert_eq!(site, city_hall());
    }

    #[test]
    fn reason_codes_serialize_screaming_snake_case() -> TestResult {
        let json = serde_json::to_value(Decision::block(Reason::OutsideTimeWindow))?;
        assert_eq!(json, serde_json::json!({ "allowed": false, "reason": "OUTSIDE_TIME_WINDOW" }));
        assert_eq!(Reason::AlreadyCheckedIn.to_string(), "ALREADY_CHECKED_IN");
        assert_eq!(Reason::None.as_ref(), "NONE");
        Ok(())
    }
}
