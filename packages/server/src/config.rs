//! Process-wide configuration, loaded once from the environment at startup.
//!
//! Required credentials fail fast with a descriptive error; optional knobs
//! fall back to the documented defaults silently. A `.env` file is loaded
//! first when present (development convenience only).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,

    /// Postgres DSN for the competitor/run persistence adapter.
    pub storage_url: String,
    /// Postgres DSN backing the durable job queue; defaults to `storage_url`
    /// when unset, since the reference deployment keeps both in one database.
    pub queue_backend: String,

    /// Absence disables the primary search provider; the pipeline falls
    /// back to the AI-synthesis provider only.
    pub primary_search_api_key: Option<String>,
    pub chat_model_api_key: String,

    pub worker_concurrency: usize,
    pub job_max_attempts: u32,
    pub job_wallclock_seconds: u64,
    pub search_inter_call_ms: u64,
    pub query_inter_call_ms: u64,
    /// The minimum score (§4.4) a candidate must meet to be persisted.
    /// Configuration-driven rather than an inline literal, per the source's
    /// own open question about the magic number 75.
    pub relevance_threshold: u8,
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} must be a valid value: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        let storage_url = env::var("STORAGE_URL").context("STORAGE_URL must be set")?;
        let queue_backend = env::var("QUEUE_BACKEND").unwrap_or_else(|_| storage_url.clone());

        Ok(Self {
            port: parse_env_or("PORT", 8080u16)?,
            storage_url,
            queue_backend,
            primary_search_api_key: env::var("PRIMARY_SEARCH_API_KEY").ok(),
            chat_model_api_key: env::var("CHAT_MODEL_API_KEY").context("CHAT_MODEL_API_KEY must be set")?,
            worker_concurrency: parse_env_or("WORKER_CONCURRENCY", 5usize)?,
            job_max_attempts: parse_env_or("JOB_MAX_ATTEMPTS", 2u32)?,
            job_wallclock_seconds: parse_env_or("JOB_WALLCLOCK_SECONDS", 600u64)?,
            search_inter_call_ms: parse_env_or("SEARCH_INTER_CALL_MS", 500u64)?,
            query_inter_call_ms: parse_env_or("QUERY_INTER_CALL_MS", 1000u64)?,
            relevance_threshold: parse_env_or(
                "RELEVANCE_THRESHOLD",
                extraction::scorer::DEFAULT_RELEVANCE_THRESHOLD,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_key_falls_back_to_default() {
        env::remove_var("SOME_UNUSED_TEST_KEY");
        let value: u64 = parse_env_or("SOME_UNUSED_TEST_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn malformed_value_is_rejected() {
        env::set_var("SOME_MALFORMED_TEST_KEY", "not-a-number");
        let result: Result<u64> = parse_env_or("SOME_MALFORMED_TEST_KEY", 42);
        assert!(result.is_err());
        env::remove_var("SOME_MALFORMED_TEST_KEY");
    }
}
