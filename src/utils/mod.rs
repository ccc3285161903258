pub mod headcount;
pub mod site_cache;
pub mod tentative;
