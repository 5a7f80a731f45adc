pub mod schema;
pub mod usage_queries;

pub use schema::ensure_schema;
pub use usage_queries::{
    DailyTotal, HourlyTotal, QueryError, RangeTotal, UsageQueries,
};
