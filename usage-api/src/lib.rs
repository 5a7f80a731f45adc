pub mod api;
pub mod config;
pub mod dates;
pub mod metrics_server;
pub mod observability;
pub mod series;
pub mod validate;
