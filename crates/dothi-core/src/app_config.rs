use std::path::PathBuf;

use crate::view::MemberMatch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub firestore_project_id: String,
    pub firestore_api_key: Option<String>,
    pub firestore_base_url: String,
    pub links_collection: String,
    pub rtdb_url: Option<String>,
    pub rtdb_auth: Option<String>,
    pub cache_dir: PathBuf,
    pub cache_window_secs: u64,
    pub cache_sweep_interval_secs: u64,
    pub visitor_stats_window_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub member_match: MemberMatch,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("firestore_project_id", &self.firestore_project_id)
            .field(
                "firestore_api_key",
                &self.firestore_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("firestore_base_url", &self.firestore_base_url)
            .field("links_collection", &self.links_collection)
            .field("rtdb_url", &self.rtdb_url)
            .field("rtdb_auth", &self.rtdb_auth.as_ref().map(|_| "[redacted]"))
            .field("cache_dir", &self.cache_dir)
            .field("cache_window_secs", &self.cache_window_secs)
            .field("cache_sweep_interval_secs", &self.cache_sweep_interval_secs)
            .field("visitor_stats_window_secs", &self.visitor_stats_window_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("member_match", &self.member_match)
            .finish()
    }
}
