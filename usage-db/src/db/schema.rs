use anyhow::Result;
use sqlx::PgPool;

/// Inline DDL, applied idempotently at service startup. The schema is a
/// single insert-only table, so numbered migration files would be overkill.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS usage_records (
    id         BIGSERIAL PRIMARY KEY,
    user_id    BIGINT NOT NULL,
    usage_type TEXT NOT NULL CHECK (usage_type IN ('electricity', 'water')),
    amount     DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
    ts         TIMESTAMPTZ NOT NULL,
    notes      TEXT
);

CREATE INDEX IF NOT EXISTS idx_usage_records_user_type_ts
    ON usage_records (user_id, usage_type, ts);
"#;

pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
