use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::attendance::eligibility::{Decision, Reason, can_check_in};
use crate::attendance::time_of_day::TimeOfDay;
use crate::clock::Clock;
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::site::Position;
use crate::store::{AttendanceStore, StoreError};
use crate::utils::headcount::HeadcountBoard;
use crate::utils::site_cache::SiteCache;

#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("site {0} not found")]
    SiteNotFound(u64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    /// The clock reading the decision was made at.
    pub checked_at: DateTime<FixedOffset>,
    pub work_date: NaiveDate,
    pub local_time: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    CheckedIn(AttendanceRecord),
    Blocked(Decision),
}

/// Runs the daily check-in flow against the site and attendance stores.
#[derive(Clone)]
pub struct CheckInService {
    sites: SiteCache,
    attendance: Arc<dyn AttendanceStore>,
    headcount: Arc<HeadcountBoard>,
    clock: Arc<dyn Clock>,
}

impl CheckInService {
    pub fn new(
        sites: SiteCache,
        attendance: Arc<dyn AttendanceStore>,
        headcount: Arc<HeadcountBoard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sites,
            attendance,
            headcount,
            clock,
        }
    }

    /// The local work date according to the service clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Decides without writing anything.
    pub async fn evaluate(
        &self,
        worker_id: u64,
        site_id: u64,
        position: Option<Position>,
    ) -> Result<Evaluation, CheckInError> {
        let now = self.clock.now();
        let work_date = now.date_naive();
        let local_time = TimeOfDay::from(now.time());

        let site = self
            .sites
            .get(site_id)
            .await?
            .ok_or(CheckInError::SiteNotFound(site_id))?;

        let has_checked_in_today = self.attendance.exists(worker_id, work_date).await?;
        let decision = can_check_in(has_checked_in_today, position, &site, local_time);

        debug!(
            worker_id,
            site_id,
            %work_date,
            %local_time,
            reason = %decision.reason,
            "Evaluated check-in"
        );

        Ok(Evaluation {
            decision,
            checked_at: now,
            work_date,
            local_time,
        })
    }

    pub async fn check_in(
        &self,
        worker_id: u64,
        site_id: u64,
        position: Option<Position>,
    ) -> Result<CheckInOutcome, CheckInError> {
        let evaluation = self.evaluate(worker_id, site_id, position).await?;
        if !evaluation.decision.allowed {
            info!(worker_id, site_id, reason = %evaluation.decision.reason, "Check-in blocked");
            return Ok(CheckInOutcome::Blocked(evaluation.decision));
        }

        let work_date = evaluation.work_date;
        self.headcount.begin(site_id, work_date);

        let inserted = self
            .attendance
            .insert(NewAttendance {
                worker_id,
                site_id,
                work_date,
                created_at: evaluation.checked_at.with_timezone(&Utc),
            })
            .await;

        match inserted {
            Ok(record) => {
                self.refresh_headcount(site_id, work_date).await;
                info!(worker_id, site_id, record_id = record.id, "Checked in");
                Ok(CheckInOutcome::CheckedIn(record))
            }
            // lost the race against a concurrent check-in for the same day
            Err(StoreError::Duplicate) => {
                self.headcount.rollback(site_id, work_date);
                info!(worker_id, site_id, "Duplicate check-in rejected by store");
                Ok(CheckInOutcome::Blocked(Decision::block(
                    Reason::AlreadyCheckedIn,
                )))
            }
            Err(e) => {
                self.headcount.rollback(site_id, work_date);
                Err(e.into())
            }
        }
    }

    async fn refresh_headcount(&self, site_id: u64, work_date: NaiveDate) {
        match self.attendance.count_for_site_day(site_id, work_date).await {
            Ok(count) => self.headcount.reconcile(site_id, work_date, count),
            Err(e) => {
                warn!(error = %e, site_id, "Could not refresh headcount");
                self.headcount.rollback(site_id, work_date);
            }
        }
    }

    pub async fn today_record(
        &self,
        worker_id: u64,
    ) -> Result<Option<AttendanceRecord>, CheckInError> {
        Ok(self.attendance.find_for_day(worker_id, self.today()).await?)
    }
}
