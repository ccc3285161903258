//! Persistence collaborators for sites and attendance.

use async_trait::async_trait;
use chrono::NaiveDate;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::site::{Site, SiteConfigError, SiteGeofence};

pub mod mysql;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The (worker, work date) unique key rejected the insert.
    #[error("attendance already recorded for this worker and date")]
    Duplicate,
    #[error("site {site_id} has an invalid configuration: {source}")]
    InvalidSite {
        site_id: u64,
        #[source]
        source: SiteConfigError,
    },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn find_site(&self, site_id: u64) -> Result<Option<Site>, StoreError>;

    async fn list_sites(&self) -> Result<Vec<Site>, StoreError>;

    /// Returns the updated site, or `None` if it does not exist.
    async fn update_geofence(
        &self,
        site_id: u64,
        geofence: SiteGeofence,
    ) -> Result<Option<Site>, StoreError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn exists(&self, worker_id: u64, work_date: NaiveDate) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the worker already has a
    /// record for `work_date`.
    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    async fn find_for_day(
        &self,
        worker_id: u64,
        work_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn count_for_site_day(&self, site_id: u64, work_date: NaiveDate)
    -> Result<u32, StoreError>;
}
