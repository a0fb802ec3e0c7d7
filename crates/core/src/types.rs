//! Shared identifier and timestamp aliases.

/// Primary-key type for ledger rows (PostgreSQL BIGSERIAL).
pub type DbId = i64;

/// UTC timestamp as stored in `created_at` / `updated_at` columns.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
