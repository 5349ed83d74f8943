pub mod auth;
pub mod captain;
pub mod maps;
pub mod ride;
