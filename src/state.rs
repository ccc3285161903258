use std::sync::Arc;

use crate::attendance::service::CheckInService;
use crate::clock::Clock;
use crate::store::{AttendanceStore, SiteStore};
use crate::utils::headcount::HeadcountBoard;
use crate::utils::site_cache::SiteCache;

/// Everything request handlers share, built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub check_in: CheckInService,
    pub sites: SiteCache,
    pub site_store: Arc<dyn SiteStore>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub headcount: Arc<HeadcountBoard>,
}

impl AppState {
    pub fn new(
        site_store: Arc<dyn SiteStore>,
        attendance: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        sites: SiteCache,
    ) -> Self {
        let headcount = Arc::new(HeadcountBoard::new());
        let check_in = CheckInService::new(
            sites.clone(),
            attendance.clone(),
            headcount.clone(),
            clock,
        );

        Self {
            check_in,
            sites,
            site_store,
            attendance,
            headcount,
        }
    }
}
