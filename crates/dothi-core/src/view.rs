//! Derived views over the raw link list: weekly statistics and the
//! member-grouped listing.
//!
//! Everything here is a pure function of its inputs. [`ViewMemo`] adds
//! memoization keyed on the identity of the shared record list plus the
//! filters, so callers can ask for views on every input change without
//! paying for recomputation when nothing moved.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::links::LinkRecord;
use crate::members::{Member, MemberSelection};
use crate::week::{DateBounds, WeekRange};
use crate::CoreError;

/// How a record is attributed to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberMatch {
    /// `member` field equals the canonical label.
    #[default]
    Exact,
    /// Exact match, or for records without a `member` field, `text` containing
    /// the label or one of its legacy aliases. A record may then count for
    /// more than one member.
    LegacyText,
}

impl MemberMatch {
    #[must_use]
    pub fn matches(self, record: &LinkRecord, member: Member) -> bool {
        match (self, record.member.as_deref()) {
            (_, Some(name)) if name == member.label() => true,
            (MemberMatch::Exact, _) => false,
            (MemberMatch::LegacyText, Some(name)) => member.legacy_aliases().contains(&name),
            (MemberMatch::LegacyText, None) => record.text.as_deref().is_some_and(|text| {
                text.contains(member.label())
                    || member.legacy_aliases().iter().any(|a| text.contains(a))
            }),
        }
    }
}

impl FromStr for MemberMatch {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "exact" => Ok(MemberMatch::Exact),
            "legacy-text" => Ok(MemberMatch::LegacyText),
            other => Err(CoreError::UnknownMatchRule(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyStats {
    pub total: usize,
    /// Every roster member is present, zero when nothing matched.
    pub members: BTreeMap<Member, usize>,
}

/// Records in the week grouped by member. Members without records are absent.
pub type GroupedView = BTreeMap<Member, Vec<LinkRecord>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewEngine {
    rule: MemberMatch,
}

impl ViewEngine {
    #[must_use]
    pub fn new(rule: MemberMatch) -> Self {
        Self { rule }
    }

    #[must_use]
    pub fn compute_stats(&self, records: &[LinkRecord], range: &WeekRange) -> WeeklyStats {
        let in_week = filter_week(records, range);
        let members = Member::ALL
            .into_iter()
            .map(|member| {
                let count = in_week
                    .iter()
                    .filter(|record| self.rule.matches(record, member))
                    .count();
                (member, count)
            })
            .collect();

        WeeklyStats {
            total: in_week.len(),
            members,
        }
    }

    #[must_use]
    pub fn compute_grouped_view(
        &self,
        records: &[LinkRecord],
        range: &WeekRange,
        selected: &MemberSelection,
    ) -> GroupedView {
        let in_week = filter_week(records, range);
        let mut grouped = GroupedView::new();
        for member in Member::ALL.into_iter().filter(|m| selected.admits(*m)) {
            let matching: Vec<LinkRecord> = in_week
                .iter()
                .filter(|record| self.rule.matches(record, member))
                .map(|record| (*record).clone())
                .collect();
            if !matching.is_empty() {
                grouped.insert(member, matching);
            }
        }
        grouped
    }
}

fn filter_week<'a>(records: &'a [LinkRecord], range: &WeekRange) -> Vec<&'a LinkRecord> {
    let bounds = DateBounds::from(range);
    records
        .iter()
        .filter(|record| bounds.contains(&record.uploaded_date))
        .collect()
}

/// Weekly statistics with exact member matching.
#[must_use]
pub fn compute_stats(records: &[LinkRecord], range: &WeekRange) -> WeeklyStats {
    ViewEngine::default().compute_stats(records, range)
}

/// Grouped view with exact member matching. An empty selection means no
/// member filter.
#[must_use]
pub fn compute_grouped_view(
    records: &[LinkRecord],
    range: &WeekRange,
    selected: &MemberSelection,
) -> GroupedView {
    ViewEngine::default().compute_grouped_view(records, range, selected)
}

#[must_use]
pub fn has_any_data(view: &GroupedView) -> bool {
    view.values().any(|records| !records.is_empty())
}

struct StatsEntry {
    records: Arc<Vec<LinkRecord>>,
    range: WeekRange,
    stats: WeeklyStats,
}

struct GroupedEntry {
    records: Arc<Vec<LinkRecord>>,
    range: WeekRange,
    selected: MemberSelection,
    grouped: GroupedView,
}

/// Memoized derived state.
///
/// Stats are keyed on (list identity, week); the grouped view additionally on
/// the member selection. List identity is `Arc` pointer equality, so a fresh
/// fetch that produced a new list always recomputes even when its contents are
/// equal.
#[derive(Default)]
pub struct ViewMemo {
    engine: ViewEngine,
    stats: Option<StatsEntry>,
    grouped: Option<GroupedEntry>,
    recomputations: usize,
}

impl ViewMemo {
    #[must_use]
    pub fn new(engine: ViewEngine) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }

    pub fn stats(&mut self, records: &Arc<Vec<LinkRecord>>, range: WeekRange) -> &WeeklyStats {
        let entry = match self.stats.take() {
            Some(entry) if Arc::ptr_eq(&entry.records, records) && entry.range == range => entry,
            _ => {
                self.recomputations += 1;
                StatsEntry {
                    records: Arc::clone(records),
                    range,
                    stats: self.engine.compute_stats(records, &range),
                }
            }
        };
        &self.stats.insert(entry).stats
    }

    pub fn grouped(
        &mut self,
        records: &Arc<Vec<LinkRecord>>,
        range: WeekRange,
        selected: &MemberSelection,
    ) -> &GroupedView {
        let entry = match self.grouped.take() {
            Some(entry)
                if Arc::ptr_eq(&entry.records, records)
                    && entry.range == range
                    && entry.selected == *selected =>
            {
                entry
            }
            _ => {
                self.recomputations += 1;
                GroupedEntry {
                    records: Arc::clone(records),
                    range,
                    selected: selected.clone(),
                    grouped: self.engine.compute_grouped_view(records, &range, selected),
                }
            }
        };
        &self.grouped.insert(entry).grouped
    }

    /// Number of times either view was actually computed.
    #[must_use]
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
