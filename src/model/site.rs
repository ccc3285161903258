use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::attendance::time_of_day::TimeOfDay;

#[derive(Debug, Error, PartialEq)]
pub enum SiteConfigError {
    #[error("latitude {0} must be within [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} must be within [-180, 180]")]
    Longitude(f64),
    #[error("radius {0} must be a positive number of meters")]
    Radius(f64),
    #[error("check-in window {start}-{end} ends before it starts")]
    Window { start: TimeOfDay, end: TimeOfDay },
}

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    #[schema(example = 37.5665)]
    pub latitude: f64,
    #[schema(example = 126.978)]
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SiteConfigError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(SiteConfigError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(SiteConfigError::Longitude(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    /// Builds a device fix from optional coordinates. Anything missing or
    /// invalid counts as "location unavailable".
    pub fn resolve(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Self::new(latitude?, longitude?).ok()
    }
}

/// Daily check-in interval, inclusive on both ends. Never wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckInWindow {
    #[schema(value_type = String, example = "09:00")]
    pub start: TimeOfDay,
    #[schema(value_type = String, example = "18:00")]
    pub end: TimeOfDay,
}

impl CheckInWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, SiteConfigError> {
        if end < start {
            return Err(SiteConfigError::Window { start, end });
        }
        Ok(Self { start, end })
    }
}

/// The geofence and window an admin configures for a site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SiteGeofence {
    pub center: Position,
    #[schema(example = 50.0)]
    pub radius_meters: f64,
    pub window: CheckInWindow,
}

impl SiteGeofence {
    pub fn new(
        center: Position,
        radius_meters: f64,
        window: CheckInWindow,
    ) -> Result<Self, SiteConfigError> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(SiteConfigError::Radius(radius_meters));
        }
        Ok(Self {
            center,
            radius_meters,
            window,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Seoul City Hall",
        "geofence": {
            "center": { "latitude": 37.5665, "longitude": 126.978 },
            "radius_meters": 50.0,
            "window": { "start": "09:00", "end": "18:00" }
        }
    })
)]
pub struct Site {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Seoul City Hall")]
    pub name: String,
    pub geofence: SiteGeofence,
}
