pub mod usage_record;

pub use usage_record::{NewUsageRecord, ParseUsageTypeError, UsageRecord, UsageType};
