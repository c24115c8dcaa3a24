//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Simple query protocol: the schema is several statements
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    // Existing rows may predate the sequence
    let next = sqlx::query_scalar::<_, i64>(ALIGN_ALERT_SEQ_SQL)
        .fetch_one(pool)
        .await?;
    tracing::debug!("Alert sequence aligned, next alert number {}", next);

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Move `threat_alert_seq` past the highest `ALT-<n>` already stored.
/// Never moves it backwards. Returns the number the next `nextval` yields.
const ALIGN_ALERT_SEQ_SQL: &str = r#"
WITH used AS (
    SELECT GREATEST(
        COALESCE((
            SELECT MAX(substring(alert_id FROM 5)::BIGINT)
            FROM threat_events
            WHERE alert_id ~ '^ALT-[0-9]{1,18}$'
        ), 0),
        (SELECT CASE WHEN is_called THEN last_value ELSE last_value - 1 END FROM threat_alert_seq)
    ) AS n
)
SELECT setval('threat_alert_seq', GREATEST(n, 1), n >= 1) + CASE WHEN n >= 1 THEN 1 ELSE 0 END
FROM used
"#;

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Alert numbering. Assigned by the database so concurrent
-- fabricator invocations never share an alert id.
CREATE SEQUENCE IF NOT EXISTS threat_alert_seq START WITH 1;

-- Threat events
CREATE TABLE IF NOT EXISTS threat_events (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    alert_id VARCHAR(32) NOT NULL UNIQUE,
    type VARCHAR(100) NOT NULL,
    module VARCHAR(50) NOT NULL,
    risk_level VARCHAR(20) NOT NULL,
    confidence INT NOT NULL CHECK (confidence BETWEEN 0 AND 100),
    explanation TEXT,
    source_ip VARCHAR(45),
    status VARCHAR(20) NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Aggregate statistics (a single row is expected, none is tolerated)
CREATE TABLE IF NOT EXISTS threat_stats (
    id SERIAL PRIMARY KEY,
    total_threats BIGINT NOT NULL DEFAULT 0,
    blocked_attacks BIGINT NOT NULL DEFAULT 0,
    active_alerts BIGINT NOT NULL DEFAULT 0,
    risk_score INT NOT NULL DEFAULT 0 CHECK (risk_score BETWEEN 0 AND 100),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Honeypot interactions
CREATE TABLE IF NOT EXISTS honeypot_events (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ip_address VARCHAR(45) NOT NULL,
    payload TEXT NOT NULL,
    attempt_type VARCHAR(50) NOT NULL,
    attempts INT NOT NULL CHECK (attempts >= 1),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Users
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    name VARCHAR(255),
    role VARCHAR(50) NOT NULL DEFAULT 'analyst',
    is_active BOOLEAN NOT NULL DEFAULT true,
    last_login TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Analyst progress
CREATE TABLE IF NOT EXISTS user_progress (
    user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    xp INT NOT NULL DEFAULT 0,
    level INT NOT NULL DEFAULT 1,
    badges TEXT[] NOT NULL DEFAULT '{}',
    total_actions INT NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_threat_events_created ON threat_events(created_at);
CREATE INDEX IF NOT EXISTS idx_threat_events_risk ON threat_events(risk_level);
CREATE INDEX IF NOT EXISTS idx_honeypot_events_created ON honeypot_events(created_at);
"#;
