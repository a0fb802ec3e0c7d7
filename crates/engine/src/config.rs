//! Admission tuning knobs.

use std::time::Duration;

/// Retry and timeout policy for the admission coordinator.
///
/// All fields have defaults suitable for local development; override via
/// environment variables in production.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Additional attempts after the first when the ledger reports a
    /// transient failure (`ADMISSION_MAX_RETRIES`, default `3`).
    pub max_retries: u32,
    /// Delay between attempts (`ADMISSION_RETRY_BACKOFF_MS`, default `25`).
    pub retry_backoff: Duration,
    /// Budget for one whole admission call including retries
    /// (`ADMISSION_TIMEOUT_MS`, default `5000`). An expired attempt aborts
    /// with nothing written.
    pub admit_timeout: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: Duration::from_millis(25),
            admit_timeout: Duration::from_millis(5000),
        }
    }
}

impl AdmissionConfig {
    /// Load configuration from the environment, reading `.env` if present.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `ADMISSION_MAX_RETRIES`     | `3`     |
    /// | `ADMISSION_RETRY_BACKOFF_MS`| `25`    |
    /// | `ADMISSION_TIMEOUT_MS`      | `5000`  |
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let max_retries: u32 = std::env::var("ADMISSION_MAX_RETRIES")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("ADMISSION_MAX_RETRIES must be a valid u32");

        let backoff_ms: u64 = std::env::var("ADMISSION_RETRY_BACKOFF_MS")
            .unwrap_or_else(|_| "25".into())
            .parse()
            .expect("ADMISSION_RETRY_BACKOFF_MS must be a valid u64");

        let timeout_ms: u64 = std::env::var("ADMISSION_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("ADMISSION_TIMEOUT_MS must be a valid u64");

        Self {
            max_retries,
            retry_backoff: Duration::from_millis(backoff_ms),
            admit_timeout: Duration::from_millis(timeout_ms),
        }
    }
}
