pub mod blacklist_token;
pub mod captain;
pub mod ride;
pub mod rider;
