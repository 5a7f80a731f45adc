use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The two kinds of readings the system accepts. Closed set; everything else
/// is rejected at ingestion and at every query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageType {
    Electricity,
    Water,
}

impl UsageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Water => "water",
        }
    }

    /// Measurement unit implied by the type.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Electricity => "kWh",
            Self::Water => "litres",
        }
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown usage type '{0}', expected 'electricity' or 'water'")]
pub struct ParseUsageTypeError(pub String);

impl FromStr for UsageType {
    type Err = ParseUsageTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electricity" => Ok(Self::Electricity),
            "water" => Ok(Self::Water),
            other => Err(ParseUsageTypeError(other.to_string())),
        }
    }
}

/// One stored meter reading. Rows are insert-only; no update or delete path
/// exists anywhere in the service.
#[derive(Debug, Clone, Serialize)]
pub struct UsageRecord {
    pub id: i64,
    pub user_id: i64,
    pub usage_type: UsageType,
    pub amount: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub notes: Option<String>,
}

/// A reading as it arrives from ingestion, before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewUsageRecord {
    pub user_id: i64,
    pub usage_type: UsageType,
    pub amount: f64,
    pub ts: OffsetDateTime,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_type_parses_known_values() {
        assert_eq!("electricity".parse::<UsageType>(), Ok(UsageType::Electricity));
        assert_eq!("water".parse::<UsageType>(), Ok(UsageType::Water));
    }

    #[test]
    fn usage_type_rejects_unknown_values() {
        assert!("gas".parse::<UsageType>().is_err());
        assert!("Electricity".parse::<UsageType>().is_err());
        assert!("".parse::<UsageType>().is_err());
    }

    #[test]
    fn usage_type_round_trips_through_as_str() {
        for t in [UsageType::Electricity, UsageType::Water] {
            assert_eq!(t.as_str().parse::<UsageType>(), Ok(t));
        }
    }

    #[test]
    fn units_follow_type() {
        assert_eq!(UsageType::Electricity.unit(), "kWh");
        assert_eq!(UsageType::Water.unit(), "litres");
    }
}
