mod browse;
mod context;
mod logging;
mod visitors;
mod week;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dothi_core::Member;
use dothi_store::PageCursor;

use crate::context::AppContext;

#[derive(Debug, Parser)]
#[command(name = "dothi")]
#[command(about = "Weekly video link browser")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the Monday-to-Sunday range for a week
    Week {
        /// Any day in the week (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Weeks to move from that week (negative for earlier weeks)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
    },
    /// Per-member upload counts for a week
    Stats {
        /// Weeks back from the current week (e.g. -1 for last week)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Ignore the cache and fetch from the store
        #[arg(long)]
        refresh: bool,
    },
    /// A week's videos grouped by member
    Videos {
        /// Weeks back from the current week (e.g. -1 for last week)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Only show these members (label or slug, repeatable)
        #[arg(long = "member")]
        members: Vec<Member>,
        /// Ignore the cache and fetch from the store
        #[arg(long)]
        refresh: bool,
        /// Print the grouped view as JSON
        #[arg(long)]
        json: bool,
    },
    /// One page of the full date-ordered list
    Page {
        /// Records per page
        #[arg(long, default_value_t = 20)]
        size: u32,
        /// Upload date of the last record on the previous page
        #[arg(long, requires = "after_name")]
        after_date: Option<String>,
        /// Document name of the last record on the previous page
        #[arg(long, requires = "after_date")]
        after_name: Option<String>,
    },
    /// Records uploaded within a date range (inclusive)
    Range {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Count a visit and show visitor totals
    Visitors {
        /// Keep polling and print changes every SECS seconds
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Clear the in-memory and on-disk link cache
    CacheClear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Week { date, offset } = cli.command {
        logging::init("warn")?;
        week::run_week(date, offset);
        return Ok(());
    }

    let config = dothi_core::load_app_config()?;
    logging::init(&config.log_level)?;
    tracing::debug!(?config, "configuration loaded");

    if let Commands::Visitors { watch } = cli.command {
        return visitors::run_visitors(&config, watch).await;
    }

    let ctx = AppContext::build(&config)?;
    match cli.command {
        Commands::Stats { offset, refresh } => browse::run_stats(&ctx, offset, refresh).await,
        Commands::Videos {
            offset,
            members,
            refresh,
            json,
        } => browse::run_videos(&ctx, offset, &members, refresh, json).await,
        Commands::Page {
            size,
            after_date,
            after_name,
        } => {
            let after = after_date
                .zip(after_name)
                .map(|(uploaded_date, document_name)| PageCursor {
                    uploaded_date,
                    document_name,
                });
            browse::run_page(&ctx, size, after).await
        }
        Commands::Range { start, end } => browse::run_range(&ctx, start, end).await,
        Commands::CacheClear => {
            browse::run_cache_clear(&ctx);
            Ok(())
        }
        Commands::Week { .. } | Commands::Visitors { .. } => Ok(()),
    }
}
