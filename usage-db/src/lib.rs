pub mod db;
pub mod domain;

pub use db::UsageQueries;
pub use domain::{NewUsageRecord, UsageRecord, UsageType};
