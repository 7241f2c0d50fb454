pub mod app_config;
pub mod clock;
pub mod config;
pub mod links;
pub mod members;
pub mod view;
pub mod week;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use links::{embed_url, LinkRecord};
pub use members::{Member, MemberSelection, StatCard};
pub use view::{
    compute_grouped_view, compute_stats, has_any_data, GroupedView, MemberMatch, ViewEngine,
    ViewMemo, WeeklyStats,
};
pub use week::{is_current_week, next_is_blocked, shift, week_of, WeekNavigator, WeekRange};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown member: {0}")]
    UnknownMember(String),

    #[error("unknown member match rule: {0}")]
    UnknownMatchRule(String),
}
