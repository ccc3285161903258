pub mod attendance;
pub mod site;
