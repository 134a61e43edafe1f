pub mod api;
pub mod application;
pub mod client;
pub mod domain;
pub mod infrastructure;
