pub mod api;
pub mod config;
pub mod core;
pub mod logging;
pub mod store;
