use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};
use usage_db::{UsageRecord, UsageType};

use crate::dates;

use super::{ApiError, AppState};

/// Fixed-vocabulary dispatch surface for the external conversational agent.
///
/// Body: `{userId, intent, parameters}`. Each intent maps onto exactly one
/// query-service call; unknown intents and missing parameters are client
/// errors, store failures are a generic 500.
pub async fn chat_data(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    metrics::counter!("chat_intent_requests_total").increment(1);

    let user_id = body
        .get("userId")
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest("userId must be a positive integer".into()))?;
    let intent = body
        .get("intent")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("intent is required".into()))?;
    let params = body.get("parameters").cloned().unwrap_or(Value::Null);

    match intent {
        "search_notes" => search_notes(&state, user_id, &params).await,
        "get_peak_usage" => get_peak_usage(&state, user_id, &params).await,
        "get_total_usage" => get_total_usage(&state, user_id, &params).await,
        other => {
            metrics::counter!("chat_intent_unknown_total").increment(1);
            Err(ApiError::BadRequest(format!("unknown intent '{other}'")))
        }
    }
}

async fn search_notes(state: &AppState, user_id: i64, params: &Value) -> Result<Response, ApiError> {
    let keywords = params
        .get("keywords")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("keywords parameter is required".into()))?;
    let usage_type = optional_type(params)?;
    let start = optional_date(params, "startDate")?;
    let end = optional_date(params, "endDate")?;

    let records = state
        .queries
        .search_notes(user_id, keywords, usage_type, start, end)
        .await?;

    let body: Vec<Value> = records.iter().map(record_summary).collect();
    Ok(Json(body).into_response())
}

async fn get_peak_usage(
    state: &AppState,
    user_id: i64,
    params: &Value,
) -> Result<Response, ApiError> {
    let usage_type = optional_type(params)?;
    let (start, end) = requested_window(params)?;

    match state
        .queries
        .peak_in_range(user_id, usage_type, start, end)
        .await?
    {
        Some(record) => Ok(Json(record_summary(&record)).into_response()),
        // "no data" is an answer, not an error; give the agent a sentence to render
        None => Ok(Json(json!({
            "message": "No usage data found for the selected period."
        }))
        .into_response()),
    }
}

async fn get_total_usage(
    state: &AppState,
    user_id: i64,
    params: &Value,
) -> Result<Response, ApiError> {
    let usage_type = optional_type(params)?;
    let (start, end) = requested_window(params)?;

    let total = state
        .queries
        .total_for_range(user_id, usage_type, start, end)
        .await?;

    Ok(Json(json!({
        "totalAmount": total.total,
        "usageType": total.usage_type.as_ref().map(UsageType::as_str).unwrap_or("all"),
        "periodStart": dates::format_date(total.period_start),
        "periodEnd": dates::format_date(total.period_end),
    }))
    .into_response())
}

/// The date window named in `parameters`, defaulting each missing bound to
/// the month-to-date window.
fn requested_window(params: &Value) -> Result<(Date, Date), ApiError> {
    let today = OffsetDateTime::now_utc().date();
    let (default_start, default_end) = dates::month_to_date(today);

    let start = optional_date(params, "startDate")?.unwrap_or(default_start);
    let end = optional_date(params, "endDate")?.unwrap_or(default_end);
    Ok((start, end))
}

fn optional_type(params: &Value) -> Result<Option<UsageType>, ApiError> {
    match params.get("usageType").and_then(Value::as_str) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: usage_db::domain::ParseUsageTypeError| ApiError::BadRequest(e.to_string())),
    }
}

fn optional_date(params: &Value, key: &str) -> Result<Option<Date>, ApiError> {
    match params.get(key).and_then(Value::as_str) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => dates::parse_date(raw)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("{key} is not a valid YYYY-MM-DD date"))),
    }
}

fn record_summary(record: &UsageRecord) -> Value {
    json!({
        "usageType": record.usage_type.as_str(),
        "amount": record.amount,
        "unit": record.usage_type.unit(),
        "timestamp": record.ts.format(&Rfc3339).unwrap_or_default(),
        "notes": record.notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn optional_type_accepts_absent_or_blank() {
        assert_eq!(optional_type(&json!({})).unwrap(), None);
        assert_eq!(optional_type(&json!({"usageType": ""})).unwrap(), None);
    }

    #[test]
    fn optional_type_parses_known_types() {
        assert_eq!(
            optional_type(&json!({"usageType": "water"})).unwrap(),
            Some(UsageType::Water)
        );
        assert!(optional_type(&json!({"usageType": "gas"})).is_err());
    }

    #[test]
    fn optional_date_parses_or_rejects() {
        assert_eq!(
            optional_date(&json!({"startDate": "2025-03-01"}), "startDate").unwrap(),
            Some(date!(2025 - 03 - 01))
        );
        assert_eq!(optional_date(&json!({}), "startDate").unwrap(), None);
        assert!(optional_date(&json!({"startDate": "March 1st"}), "startDate").is_err());
    }

    #[test]
    fn record_summary_carries_the_unit() {
        let record = UsageRecord {
            id: 1,
            user_id: 7,
            usage_type: UsageType::Electricity,
            amount: 11.5,
            ts: date!(2025 - 03 - 14).midnight().assume_utc(),
            notes: Some("oven".to_string()),
        };
        let summary = record_summary(&record);
        assert_eq!(summary["usageType"], "electricity");
        assert_eq!(summary["unit"], "kWh");
        assert_eq!(summary["amount"], 11.5);
        assert_eq!(summary["notes"], "oven");
    }
}
