use sqlx::{postgres::PgPool, Postgres, QueryBuilder};
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::domain::{NewUsageRecord, ParseUsageTypeError, UsageRecord, UsageType};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("stored record is corrupt: {0}")]
    CorruptRecord(#[from] ParseUsageTypeError),
}

/// Per-hour aggregate for one calendar day. Hours with no readings are
/// absent; the presentation layer zero-fills.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct HourlyTotal {
    pub hour: i32,
    pub total: f64,
}

/// Per-day aggregate over a date range. Days with no readings are absent.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DailyTotal {
    pub day: Date,
    pub total: f64,
}

/// Sum over an inclusive date range, echoing the window it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTotal {
    pub total: f64,
    pub usage_type: Option<UsageType>,
    pub period_start: Date,
    pub period_end: Date,
}

#[derive(Debug, sqlx::FromRow)]
struct UsageRecordRow {
    id: i64,
    user_id: i64,
    usage_type: String,
    amount: f64,
    ts: OffsetDateTime,
    notes: Option<String>,
}

impl TryFrom<UsageRecordRow> for UsageRecord {
    type Error = ParseUsageTypeError;

    fn try_from(row: UsageRecordRow) -> Result<Self, Self::Error> {
        Ok(UsageRecord {
            id: row.id,
            user_id: row.user_id,
            usage_type: row.usage_type.parse()?,
            amount: row.amount,
            ts: row.ts,
            notes: row.notes,
        })
    }
}

/// Read-side query service over one user's usage history.
///
/// Every operation binds `user_id` in its WHERE clause; no call can observe
/// another user's rows. All failures surface as `Err` — whether a caller
/// degrades to an empty series or converts to an HTTP 500 is decided at the
/// handler layer, not here.
#[derive(Clone)]
pub struct UsageQueries {
    pool: PgPool,
}

impl UsageQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Per-hour totals for one calendar day (UTC).
    pub async fn hourly_totals_for_day(
        &self,
        user_id: i64,
        usage_type: UsageType,
        day: Date,
    ) -> Result<Vec<HourlyTotal>, QueryError> {
        let rows = sqlx::query_as::<_, HourlyTotal>(
            r#"
            SELECT
                CAST(EXTRACT(HOUR FROM ts AT TIME ZONE 'UTC') AS INT4) AS hour,
                SUM(amount) AS total
            FROM usage_records
            WHERE user_id = $1
              AND usage_type = $2
              AND ts >= $3
              AND ts <  $4
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(user_id)
        .bind(usage_type.as_str())
        .bind(start_of(day))
        .bind(end_exclusive(day))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Per-day totals over an inclusive calendar range (UTC days).
    pub async fn daily_totals_for_range(
        &self,
        user_id: i64,
        usage_type: UsageType,
        start: Date,
        end: Date,
    ) -> Result<Vec<DailyTotal>, QueryError> {
        let rows = sqlx::query_as::<_, DailyTotal>(
            r#"
            SELECT
                CAST(ts AT TIME ZONE 'UTC' AS DATE) AS day,
                SUM(amount) AS total
            FROM usage_records
            WHERE user_id = $1
              AND usage_type = $2
              AND ts >= $3
              AND ts <  $4
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(user_id)
        .bind(usage_type.as_str())
        .bind(start_of(start))
        .bind(end_exclusive(end))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sum of readings whose date component equals `day`. No rows sums to 0.0.
    pub async fn total_for_date(
        &self,
        user_id: i64,
        usage_type: UsageType,
        day: Date,
    ) -> Result<f64, QueryError> {
        let total = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT CAST(COALESCE(SUM(amount), 0) AS DOUBLE PRECISION)
            FROM usage_records
            WHERE user_id = $1
              AND usage_type = $2
              AND ts >= $3
              AND ts <  $4
            "#,
        )
        .bind(user_id)
        .bind(usage_type.as_str())
        .bind(start_of(day))
        .bind(end_exclusive(day))
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// The single highest-amount reading in the inclusive range, optionally
    /// filtered by type. `None` means the range holds no readings at all.
    ///
    /// Ties break deterministically: earliest timestamp wins, then lowest id.
    pub async fn peak_in_range(
        &self,
        user_id: i64,
        usage_type: Option<UsageType>,
        start: Date,
        end: Date,
    ) -> Result<Option<UsageRecord>, QueryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, user_id, usage_type, amount, ts, notes \
             FROM usage_records WHERE user_id = ",
        );
        qb.push_bind(user_id);
        qb.push(" AND ts >= ").push_bind(start_of(start));
        qb.push(" AND ts < ").push_bind(end_exclusive(end));
        if let Some(t) = usage_type {
            qb.push(" AND usage_type = ").push_bind(t.as_str());
        }
        qb.push(" ORDER BY amount DESC, ts ASC, id ASC LIMIT 1");

        let row = qb
            .build_query_as::<UsageRecordRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(UsageRecord::try_from)
            .transpose()
            .map_err(QueryError::from)
    }

    /// Keyword search over the notes field, newest reading first.
    ///
    /// `keywords` is split on whitespace; a record matches when its notes
    /// contain any one token as a case-sensitive substring. Blank input
    /// returns an empty result without touching the store.
    pub async fn search_notes(
        &self,
        user_id: i64,
        keywords: &str,
        usage_type: Option<UsageType>,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Vec<UsageRecord>, QueryError> {
        let tokens: Vec<&str> = keywords.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, user_id, usage_type, amount, ts, notes \
             FROM usage_records WHERE user_id = ",
        );
        qb.push_bind(user_id);
        if let Some(t) = usage_type {
            qb.push(" AND usage_type = ").push_bind(t.as_str());
        }
        if let Some(s) = start {
            qb.push(" AND ts >= ").push_bind(start_of(s));
        }
        if let Some(e) = end {
            qb.push(" AND ts < ").push_bind(end_exclusive(e));
        }
        qb.push(" AND (");
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("notes LIKE ");
            qb.push_bind(like_pattern(token));
            qb.push(" ESCAPE '\\'");
        }
        qb.push(") ORDER BY ts DESC, id DESC");

        let rows = qb
            .build_query_as::<UsageRecordRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| UsageRecord::try_from(row).map_err(QueryError::from))
            .collect()
    }

    /// Sum over an inclusive date range, optionally filtered by type.
    /// Nothing in range sums to 0.0; that is an answer, not an error.
    pub async fn total_for_range(
        &self,
        user_id: i64,
        usage_type: Option<UsageType>,
        start: Date,
        end: Date,
    ) -> Result<RangeTotal, QueryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT CAST(COALESCE(SUM(amount), 0) AS DOUBLE PRECISION) \
             FROM usage_records WHERE user_id = ",
        );
        qb.push_bind(user_id);
        qb.push(" AND ts >= ").push_bind(start_of(start));
        qb.push(" AND ts < ").push_bind(end_exclusive(end));
        if let Some(t) = usage_type {
            qb.push(" AND usage_type = ").push_bind(t.as_str());
        }

        let total: f64 = qb.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(RangeTotal {
            total,
            usage_type,
            period_start: start,
            period_end: end,
        })
    }

    /// Insert one reading and return the store-assigned id.
    pub async fn insert_record(&self, record: &NewUsageRecord) -> Result<i64, QueryError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO usage_records (user_id, usage_type, amount, ts, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(record.user_id)
        .bind(record.usage_type.as_str())
        .bind(record.amount)
        .bind(record.ts)
        .bind(&record.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}

fn start_of(day: Date) -> OffsetDateTime {
    day.midnight().assume_utc()
}

fn end_exclusive(day: Date) -> OffsetDateTime {
    match day.next_day() {
        Some(next) => next.midnight().assume_utc(),
        None => PrimitiveDateTime::MAX.assume_utc(),
    }
}

/// Wrap a search token in `%` wildcards, escaping LIKE metacharacters so the
/// token only ever matches literally.
fn like_pattern(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len() + 2);
    for c in token.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{escaped}%")
}
