use crate::app_config::{AppConfig, Environment};
use crate::view::MemberMatch;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Parsing and validation over an arbitrary lookup, so tests can feed a
/// `HashMap` instead of mutating the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let firestore_project_id = require("DOTHI_FIRESTORE_PROJECT_ID")?;
    let firestore_api_key = optional("DOTHI_FIRESTORE_API_KEY");
    let firestore_base_url = or_default(
        "DOTHI_FIRESTORE_BASE_URL",
        "https://firestore.googleapis.com/v1",
    );
    let links_collection = or_default("DOTHI_LINKS_COLLECTION", "scraped_links");

    let env = parse_environment(&or_default("DOTHI_ENV", "development"));
    let log_level = or_default("DOTHI_LOG_LEVEL", "info");

    let rtdb_url = optional("DOTHI_RTDB_URL");
    let rtdb_auth = optional("DOTHI_RTDB_AUTH");

    let cache_dir = PathBuf::from(or_default("DOTHI_CACHE_DIR", "./.dothi-cache"));
    let cache_window_secs = parse_positive_u64("DOTHI_CACHE_WINDOW_SECS", "600")?;
    let cache_sweep_interval_secs = parse_positive_u64("DOTHI_CACHE_SWEEP_INTERVAL_SECS", "300")?;
    let visitor_stats_window_secs = parse_positive_u64("DOTHI_VISITOR_STATS_WINDOW_SECS", "60")?;

    let request_timeout_secs = parse_positive_u64("DOTHI_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("DOTHI_USER_AGENT", "dothi/0.1 (link-aggregator)");
    let max_retries = parse_u32("DOTHI_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("DOTHI_RETRY_BACKOFF_BASE_MS", "500")?;

    let member_match = or_default("DOTHI_MEMBER_MATCH", "exact")
        .parse::<MemberMatch>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "DOTHI_MEMBER_MATCH".to_string(),
            reason: e.to_string(),
        })?;

    Ok(AppConfig {
        env,
        log_level,
        firestore_project_id,
        firestore_api_key,
        firestore_base_url,
        links_collection,
        rtdb_url,
        rtdb_auth,
        cache_dir,
        cache_window_secs,
        cache_sweep_interval_secs,
        visitor_stats_window_secs,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        member_match,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
