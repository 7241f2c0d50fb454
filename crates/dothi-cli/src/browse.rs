//! Read-only link commands: weekly stats, grouped videos, pages and ranges.

use chrono::NaiveDate;
use dothi_core::{
    has_any_data, GroupedView, LinkRecord, Member, MemberSelection, ViewMemo, WeekRange,
};
use dothi_store::PageCursor;

use crate::context::AppContext;

fn print_header(range: &WeekRange, can_go_next: bool) {
    println!(
        "{}  ({} .. {}){}",
        range.label(),
        range.start_str(),
        range.end_str(),
        if can_go_next { "" } else { "  [current week]" }
    );
}

fn print_record(record: &LinkRecord) {
    let title = if record.title.chars().count() > 60 {
        format!("{}...", record.title.chars().take(60).collect::<String>())
    } else {
        record.title.clone()
    };
    println!("  {:<12}{}", record.uploaded_date, title);
    println!("  {:<12}{}", "", record.iframe_url);
}

/// Videos left after member filtering.
pub(crate) fn videos_shown(grouped: &GroupedView) -> usize {
    grouped.values().map(Vec::len).sum()
}

/// Per-member upload counts for one week.
pub(crate) async fn run_stats(ctx: &AppContext, offset: i64, refresh: bool) -> anyhow::Result<()> {
    let records = ctx.all_links(refresh).await?;
    let navigator = ctx.navigator(offset);
    let range = navigator.range();
    let stats = ctx.engine.compute_stats(&records, &range);

    print_header(&range, navigator.can_go_next());
    println!("{:<10}{}", "전체", stats.total);
    for (member, count) in &stats.members {
        println!("{:<10}{count}", member.label());
    }
    Ok(())
}

/// The week's records grouped by member, optionally narrowed to `members`.
pub(crate) async fn run_videos(
    ctx: &AppContext,
    offset: i64,
    members: &[Member],
    refresh: bool,
    json: bool,
) -> anyhow::Result<()> {
    let records = ctx.all_links(refresh).await?;
    let navigator = ctx.navigator(offset);
    let range = navigator.range();
    let selection: MemberSelection = members.iter().copied().collect();

    let mut memo = ViewMemo::new(ctx.engine);
    let grouped = memo.grouped(&records, range, &selection);

    if json {
        println!("{}", serde_json::to_string_pretty(grouped)?);
        return Ok(());
    }

    print_header(&range, navigator.can_go_next());
    if !has_any_data(grouped) {
        println!("no videos this week; try an earlier week with --offset -1");
        return Ok(());
    }
    println!("{} videos this week", videos_shown(grouped));
    for (member, videos) in grouped {
        println!();
        println!("{} ({})", member.label(), videos.len());
        for record in videos {
            print_record(record);
        }
    }
    Ok(())
}

/// One page of the full ordered list, bypassing the cache.
pub(crate) async fn run_page(
    ctx: &AppContext,
    size: u32,
    after: Option<PageCursor>,
) -> anyhow::Result<()> {
    let page = ctx.links.fetch_page(size, after.as_ref()).await?;
    if page.items.is_empty() {
        println!("no records");
        return Ok(());
    }
    for record in &page.items {
        let member = record.member.as_deref().unwrap_or("\u{2014}");
        println!("{:<12}{:<8}{}", record.uploaded_date, member, record.title);
    }
    if let (true, Some(cursor)) = (page.has_more, page.next_cursor) {
        println!();
        println!(
            "next: --after-date {} --after-name {}",
            cursor.uploaded_date, cursor.document_name
        );
    }
    Ok(())
}

/// Records uploaded between `start` and `end`, both inclusive.
pub(crate) async fn run_range(
    ctx: &AppContext,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<()> {
    if start > end {
        anyhow::bail!("--start {start} is after --end {end}");
    }
    let records = ctx.links.fetch_by_date_range(start, end).await?;
    println!("{} records from {start} to {end}", records.len());
    for record in records.iter() {
        let member = record.member.as_deref().unwrap_or("\u{2014}");
        println!("{:<12}{:<8}{}", record.uploaded_date, member, record.title);
    }
    Ok(())
}

/// Drops every cached list, in memory and on disk.
pub(crate) fn run_cache_clear(ctx: &AppContext) {
    ctx.links.invalidate(None);
    match &ctx.snapshot_dir {
        Some(dir) => println!("cleared link cache in {}", dir.display()),
        None => println!("cleared in-memory link cache"),
    }
}
