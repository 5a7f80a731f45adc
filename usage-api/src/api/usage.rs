use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use usage_db::db::DailyTotal;
use usage_db::UsageType;

use crate::dates;
use crate::series::{self, DayPoint, HourPoint, OverviewSeries};

use super::{ApiError, AppState, SessionUser};

/// Window used when a range endpoint is called without explicit dates.
const DEFAULT_RANGE_DAYS: u16 = 7;

#[derive(Debug, Deserialize)]
pub struct TypeQuery {
    #[serde(rename = "type")]
    usage_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(rename = "type")]
    usage_type: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TodayTotal {
    date: String,
    #[serde(rename = "usageType")]
    usage_type: UsageType,
    total: f64,
}

/// Today's consumption by hour, always 24 zero-filled entries.
pub async fn hourly_today(
    State(state): State<AppState>,
    user: SessionUser,
    Query(params): Query<TypeQuery>,
) -> Result<Json<Vec<HourPoint>>, ApiError> {
    let usage_type = parse_type(params.usage_type.as_deref())?;
    let today = OffsetDateTime::now_utc().date();

    let rows = match state
        .queries
        .hourly_totals_for_day(user.0, usage_type, today)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            // Dashboard feed: degrade to a zero series rather than failing the page.
            tracing::error!(error = %e, user_id = user.0, "hourly totals query failed");
            metrics::counter!("usage_query_errors_total").increment(1);
            Vec::new()
        }
    };

    Ok(Json(series::fill_hours(&rows)))
}

/// Daily consumption over an inclusive date range, one zero-filled entry per
/// day. Defaults to the trailing seven days.
pub async fn daily_range(
    State(state): State<AppState>,
    user: SessionUser,
    Query(params): Query<RangeQuery>,
) -> Result<Json<Vec<DayPoint>>, ApiError> {
    let usage_type = parse_type(params.usage_type.as_deref())?;
    let (start, end) = parse_range(params.start.as_deref(), params.end.as_deref())?;

    let rows = daily_or_empty(&state, user.0, usage_type, start, end).await;
    Ok(Json(series::fill_days(start, end, &rows)))
}

/// Today's total for one usage type. A store failure renders as 0.0, same as
/// a day with no readings.
pub async fn today_total(
    State(state): State<AppState>,
    user: SessionUser,
    Query(params): Query<TypeQuery>,
) -> Result<Json<TodayTotal>, ApiError> {
    let usage_type = parse_type(params.usage_type.as_deref())?;
    let today = OffsetDateTime::now_utc().date();

    let total = match state.queries.total_for_date(user.0, usage_type, today).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!(error = %e, user_id = user.0, "today total query failed");
            metrics::counter!("usage_query_errors_total").increment(1);
            0.0
        }
    };

    Ok(Json(TodayTotal {
        date: dates::format_date(today),
        usage_type,
        total,
    }))
}

/// Combined electricity and water series for the dashboard, aligned on one
/// shared label array.
pub async fn overview(
    State(state): State<AppState>,
    user: SessionUser,
    Query(params): Query<OverviewQuery>,
) -> Result<Json<OverviewSeries>, ApiError> {
    let (start, end) = parse_range(params.start.as_deref(), params.end.as_deref())?;

    let electricity = daily_or_empty(&state, user.0, UsageType::Electricity, start, end).await;
    let water = daily_or_empty(&state, user.0, UsageType::Water, start, end).await;

    Ok(Json(series::overview_series(start, end, &electricity, &water)))
}

async fn daily_or_empty(
    state: &AppState,
    user_id: i64,
    usage_type: UsageType,
    start: Date,
    end: Date,
) -> Vec<DailyTotal> {
    match state
        .queries
        .daily_totals_for_range(user_id, usage_type, start, end)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, user_id, usage_type = %usage_type, "daily totals query failed");
            metrics::counter!("usage_query_errors_total").increment(1);
            Vec::new()
        }
    }
}

fn parse_type(raw: Option<&str>) -> Result<UsageType, ApiError> {
    raw.unwrap_or_default()
        .trim()
        .parse()
        .map_err(|e: usage_db::domain::ParseUsageTypeError| ApiError::BadRequest(e.to_string()))
}

fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<(Date, Date), ApiError> {
    let today = OffsetDateTime::now_utc().date();
    let (default_start, default_end) = dates::trailing_window(today, DEFAULT_RANGE_DAYS);

    let start = match start {
        None => default_start,
        Some(raw) => dates::parse_date(raw)
            .ok_or_else(|| ApiError::BadRequest("start is not a valid YYYY-MM-DD date".into()))?,
    };
    let end = match end {
        None => default_end,
        Some(raw) => dates::parse_date(raw)
            .ok_or_else(|| ApiError::BadRequest("end is not a valid YYYY-MM-DD date".into()))?,
    };
    if start > end {
        return Err(ApiError::BadRequest("start must not be after end".into()));
    }

    Ok((start, end))
}
