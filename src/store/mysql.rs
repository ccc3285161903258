use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures_util::StreamExt;
use sqlx::error::ErrorKind;
use sqlx::{FromRow, MySqlPool};

use super::{AttendanceStore, SiteStore, StoreError};
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::site::{CheckInWindow, Position, Site, SiteConfigError, SiteGeofence};

const SITE_COLUMNS: &str =
    "id, name, latitude, longitude, radius_meters, checkin_start, checkin_end";

#[derive(FromRow)]
struct SiteRow {
    id: u64,
    name: String,
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
    checkin_start: NaiveTime,
    checkin_end: NaiveTime,
}

impl TryFrom<SiteRow> for Site {
    type Error = StoreError;

    fn try_from(row: SiteRow) -> Result<Self, Self::Error> {
        let invalid = |source: SiteConfigError| StoreError::InvalidSite {
            site_id: row.id,
            source,
        };

        let center = Position::new(row.latitude, row.longitude).map_err(invalid)?;
        let window = CheckInWindow::new(row.checkin_start.into(), row.checkin_end.into())
            .map_err(invalid)?;
        let geofence = SiteGeofence::new(center, row.radius_meters, window).map_err(invalid)?;

        Ok(Site {
            id: row.id,
            name: row.name,
            geofence,
        })
    }
}

/// Only a unique-key violation (MySQL 1062) means the worker already has a
/// record. Foreign-key and NOT NULL failures share SQLSTATE 23000 but are
/// real errors.
fn is_duplicate(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => matches!(db_err.kind(), ErrorKind::UniqueViolation),
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct MySqlSiteStore {
    pool: MySqlPool,
}

impl MySqlSiteStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SiteStore for MySqlSiteStore {
    async fn find_site(&self, site_id: u64) -> Result<Option<Site>, StoreError> {
        let sql = format!("SELECT {SITE_COLUMNS} FROM sites WHERE id = ?");

        sqlx::query_as::<_, SiteRow>(&sql)
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Site::try_from)
            .transpose()
    }

    async fn list_sites(&self) -> Result<Vec<Site>, StoreError> {
        let sql = format!("SELECT {SITE_COLUMNS} FROM sites ORDER BY id");
        let mut stream = sqlx::query_as::<_, SiteRow>(&sql).fetch(&self.pool);

        let mut sites = Vec::new();
        while let Some(row) = stream.next().await {
            match Site::try_from(row?) {
                Ok(site) => sites.push(site),
                // one bad row should not hide every other site
                Err(e) => tracing::warn!(error = %e, "Skipping misconfigured site"),
            }
        }

        Ok(sites)
    }

    async fn update_geofence(
        &self,
        site_id: u64,
        geofence: SiteGeofence,
    ) -> Result<Option<Site>, StoreError> {
        sqlx::query(
            r#"
            UPDATE sites
            SET latitude = ?, longitude = ?, radius_meters = ?,
                checkin_start = ?, checkin_end = ?
            WHERE id = ?
            "#,
        )
        .bind(geofence.center.latitude)
        .bind(geofence.center.longitude)
        .bind(geofence.radius_meters)
        .bind(NaiveTime::from(geofence.window.start))
        .bind(NaiveTime::from(geofence.window.end))
        .bind(site_id)
        .execute(&self.pool)
        .await?;

        // rows_affected() is 0 for an unchanged row too, so re-read instead
        self.find_site(site_id).await
    }
}

#[derive(Debug, Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn exists(&self, worker_id: u64, work_date: NaiveDate) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM attendance WHERE worker_id = ? AND work_date = ? LIMIT 1)",
        )
        .bind(worker_id)
        .bind(work_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (worker_id, site_id, work_date, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.worker_id)
        .bind(record.site_id)
        .bind(record.work_date)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate(&e) {
                StoreError::Duplicate
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(AttendanceRecord {
            id: result.last_insert_id(),
            worker_id: record.worker_id,
            site_id: record.site_id,
            work_date: record.work_date,
            created_at: record.created_at,
        })
    }

    async fn find_for_day(
        &self,
        worker_id: u64,
        work_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, worker_id, site_id, work_date, created_at
            FROM attendance
            WHERE worker_id = ? AND work_date = ?
            "#,
        )
        .bind(worker_id)
        .bind(work_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn count_for_site_day(
        &self,
        site_id: u64,
        work_date: NaiveDate,
    ) -> Result<u32, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance WHERE site_id = ? AND work_date = ?",
        )
        .bind(site_id)
        .bind(work_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::DatabaseError;

    use super::*;

    fn row(start: (u32, u32), end: (u32, u32), radius_meters: f64) -> SiteRow {
        SiteRow {
            id: 7,
            name: "Depot".into(),
            latitude: 37.5665,
            longitude: 126.978,
            radius_meters,
            checkin_start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            checkin_end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        }
    }

    #[test]
    fn site_row_converts_to_site() {
        let site = Site::try_from(row((9, 0), (18, 0), 50.0)).unwrap();
        assert_eq!(site.id, 7);
        assert_eq!(site.geofence.window.start.to_string(), "09:00");
        assert_eq!(site.geofence.window.end.to_string(), "18:00");
    }

    #[test]
    fn overnight_row_is_reported_as_invalid_site() {
        let err = Site::try_from(row((22, 0), (2, 0), 50.0)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidSite {
                site_id: 7,
                source: SiteConfigError::Window { .. }
            }
        ));
    }

    #[test]
    fn non_positive_radius_is_reported_as_invalid_site() {
        let err = Site::try_from(row((9, 0), (18, 0), 0.0)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSite { .. }));
    }

    /// A MySQL integrity failure as the driver classifies it.
    #[derive(Debug)]
    struct IntegrityError {
        number: u16,
    }

    impl std::fmt::Display for IntegrityError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{} (23000): integrity constraint violation", self.number)
        }
    }

    impl std::error::Error for IntegrityError {}

    impl DatabaseError for IntegrityError {
        fn message(&self) -> &str {
            "integrity constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23000"))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.number {
                1062 => ErrorKind::UniqueViolation,
                1452 => ErrorKind::ForeignKeyViolation,
                1048 => ErrorKind::NotNullViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn integrity_error(number: u16) -> sqlx::Error {
        sqlx::Error::Database(Box::new(IntegrityError { number }))
    }

    #[test]
    fn unique_key_violation_is_a_duplicate() {
        assert!(is_duplicate(&integrity_error(1062)));
    }

    #[test]
    fn other_integrity_violations_are_not_duplicates() {
        // unknown site or worker reference
        assert!(!is_duplicate(&integrity_error(1452)));
        // column cannot be null
        assert!(!is_duplicate(&integrity_error(1048)));
    }

    #[test]
    fn non_database_errors_are_not_duplicates() {
        assert!(!is_duplicate(&sqlx::Error::RowNotFound));
    }
}
