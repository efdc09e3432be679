use std::env;

use crate::rate_limit::KeyStrategy;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Shared counter store for the admission gate. When unset the gate
    /// falls back to an in-process counter, so the limit is per instance.
    pub const REDIS_URL: &str = "REDIS_URL";
    pub const RATE_LIMIT_MAX: &str = "RATE_LIMIT_MAX";
    pub const RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
    /// "global" (one budget for every caller) or "per-client".
    pub const RATE_LIMIT_KEY_STRATEGY: &str = "RATE_LIMIT_KEY_STRATEGY";
    /// Set to "true" to report validation failures as generic server
    /// errors, matching the pre-rewrite API for compatibility testing.
    pub const LEGACY_VALIDATION_ERRORS: &str = "LEGACY_VALIDATION_ERRORS";
    pub const DEV_MODE: &str = "JOTTER_DEV";
    /// Set to "1" to skip static file serving (for a separate dev server).
    pub const DISABLE_FRONTEND: &str = "DISABLE_FRONTEND";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/jotter.db";
    pub const RATE_LIMIT_MAX: u64 = 100;
    pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub rate_limit_max: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_key_strategy: KeyStrategy,
    pub legacy_validation_errors: bool,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            redis_url: env::var(env_vars::REDIS_URL).ok().filter(|v| !v.is_empty()),
            rate_limit_max: env::var(env_vars::RATE_LIMIT_MAX)
                .unwrap_or_else(|_| defaults::RATE_LIMIT_MAX.to_string())
                .parse()
                .expect("RATE_LIMIT_MAX must be a valid number"),
            rate_limit_window_secs: env::var(env_vars::RATE_LIMIT_WINDOW_SECS)
                .unwrap_or_else(|_| defaults::RATE_LIMIT_WINDOW_SECS.to_string())
                .parse()
                .expect("RATE_LIMIT_WINDOW_SECS must be a valid number"),
            rate_limit_key_strategy: env::var(env_vars::RATE_LIMIT_KEY_STRATEGY)
                .ok()
                .map(|v| {
                    KeyStrategy::from_str(&v).unwrap_or_else(|| {
                        log::warn!(
                            "Unknown {} value: {} - using global",
                            env_vars::RATE_LIMIT_KEY_STRATEGY,
                            v
                        );
                        KeyStrategy::Global
                    })
                })
                .unwrap_or(KeyStrategy::Global),
            legacy_validation_errors: flag(env_vars::LEGACY_VALIDATION_ERRORS),
            dev_mode: flag(env_vars::DEV_MODE),
        }
    }
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}
