pub mod eligibility;
pub mod service;
pub mod time_of_day;
