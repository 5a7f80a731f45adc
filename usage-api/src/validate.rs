use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use usage_db::domain::{NewUsageRecord, UsageType};

/// Raw ingestion form as submitted by the browser. Everything arrives as
/// text so the checks below control the order and wording of rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddUsageForm {
    #[serde(rename = "usageType")]
    pub usage_type: String,
    pub amount: String,
    pub timestamp: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("usage type must be 'electricity' or 'water'")]
    UnknownUsageType,
    #[error("amount must be a number")]
    AmountNotNumeric,
    #[error("amount must not be negative")]
    NegativeAmount,
    #[error("a reading timestamp is required")]
    MissingTimestamp,
    #[error("timestamp is not a recognized date-time")]
    BadTimestamp,
}

/// Check a submission field by field, first failure wins:
/// usage type, then amount, then timestamp. Notes are optional and an empty
/// string normalizes to none.
pub fn validate_submission(
    user_id: i64,
    form: &AddUsageForm,
) -> Result<NewUsageRecord, ValidationError> {
    let usage_type: UsageType = form
        .usage_type
        .trim()
        .parse()
        .map_err(|_| ValidationError::UnknownUsageType)?;

    let amount: f64 = form
        .amount
        .trim()
        .parse()
        .map_err(|_| ValidationError::AmountNotNumeric)?;
    if !amount.is_finite() {
        return Err(ValidationError::AmountNotNumeric);
    }
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount);
    }

    let raw_ts = form.timestamp.trim();
    if raw_ts.is_empty() {
        return Err(ValidationError::MissingTimestamp);
    }
    let ts = parse_timestamp(raw_ts).ok_or(ValidationError::BadTimestamp)?;

    let notes = form
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(NewUsageRecord {
        user_id,
        usage_type,
        amount,
        ts,
        notes,
    })
}

/// Parse a reading timestamp. RFC 3339 is preferred; naive date-times (the
/// shape an HTML datetime-local input submits) are taken as UTC.
pub fn parse_timestamp(input: &str) -> Option<OffsetDateTime> {
    let trimmed = input.trim();
    if let Ok(ts) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(ts);
    }

    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for format in naive_formats {
        if let Ok(dt) = PrimitiveDateTime::parse(trimmed, format) {
            return Some(dt.assume_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn form(usage_type: &str, amount: &str, timestamp: &str, notes: Option<&str>) -> AddUsageForm {
        AddUsageForm {
            usage_type: usage_type.to_string(),
            amount: amount.to_string(),
            timestamp: timestamp.to_string(),
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn accepts_a_valid_submission() {
        let record = validate_submission(
            7,
            &form("electricity", "11.5", "2025-03-14T09:00", Some("oven on all day")),
        )
        .expect("submission should validate");

        assert_eq!(record.user_id, 7);
        assert_eq!(record.usage_type, UsageType::Electricity);
        assert_eq!(record.amount, 11.5);
        assert_eq!(record.ts, datetime!(2025 - 03 - 14 09:00:00 UTC));
        assert_eq!(record.notes.as_deref(), Some("oven on all day"));
    }

    #[test]
    fn rejects_unknown_usage_type_before_other_checks() {
        let res = validate_submission(7, &form("gas", "-5", "", None));
        assert_eq!(res.unwrap_err(), ValidationError::UnknownUsageType);
    }

    #[test]
    fn rejects_non_numeric_amount() {
        let res = validate_submission(7, &form("water", "a lot", "2025-03-14T09:00", None));
        assert_eq!(res.unwrap_err(), ValidationError::AmountNotNumeric);
    }

    #[test]
    fn rejects_negative_amount() {
        let res = validate_submission(7, &form("water", "-0.1", "2025-03-14T09:00", None));
        assert_eq!(res.unwrap_err(), ValidationError::NegativeAmount);
    }

    #[test]
    fn zero_amount_is_allowed() {
        assert!(validate_submission(7, &form("water", "0", "2025-03-14T09:00", None)).is_ok());
    }

    #[test]
    fn rejects_missing_timestamp() {
        let res = validate_submission(7, &form("water", "3.2", "   ", None));
        assert_eq!(res.unwrap_err(), ValidationError::MissingTimestamp);
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let res = validate_submission(7, &form("water", "3.2", "14/03/2025 9am", None));
        assert_eq!(res.unwrap_err(), ValidationError::BadTimestamp);
    }

    #[test]
    fn empty_notes_normalize_to_none() {
        let record =
            validate_submission(7, &form("water", "3.2", "2025-03-14T09:00", Some("  "))).unwrap();
        assert_eq!(record.notes, None);
    }

    #[test]
    fn notes_are_trimmed() {
        let record = validate_submission(
            7,
            &form("water", "3.2", "2025-03-14T09:00", Some("  laundry day ")),
        )
        .unwrap();
        assert_eq!(record.notes.as_deref(), Some("laundry day"));
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339() {
        assert_eq!(
            parse_timestamp("2025-03-14T09:00:00Z"),
            Some(datetime!(2025 - 03 - 14 09:00:00 UTC))
        );
        assert_eq!(
            parse_timestamp("2025-03-14T09:00:00+02:00"),
            Some(datetime!(2025 - 03 - 14 09:00:00 +02:00))
        );
    }

    #[test]
    fn parse_timestamp_assumes_utc_for_naive_forms() {
        assert_eq!(
            parse_timestamp("2025-03-14T09:30"),
            Some(datetime!(2025 - 03 - 14 09:30:00 UTC))
        );
        assert_eq!(
            parse_timestamp("2025-03-14 09:30:15"),
            Some(datetime!(2025 - 03 - 14 09:30:15 UTC))
        );
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("not a time"), None);
        assert_eq!(parse_timestamp("2025-03-14"), None);
    }
}
