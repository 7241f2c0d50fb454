use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The fixed roster used to categorize link records.
///
/// Declaration order is display order, and `Ord` follows it, so maps keyed by
/// `Member` iterate in the order the roster is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Member {
    #[serde(rename = "아이네")]
    Ine,
    #[serde(rename = "징버거")]
    Jingburger,
    #[serde(rename = "릴파")]
    Lilpa,
    #[serde(rename = "고세구")]
    Gosegu,
    #[serde(rename = "비챤")]
    Viichan,
}

impl Member {
    pub const ALL: [Member; 5] = [
        Member::Ine,
        Member::Jingburger,
        Member::Lilpa,
        Member::Gosegu,
        Member::Viichan,
    ];

    /// Canonical name as stored in the `member` field of a record.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Member::Ine => "아이네",
            Member::Jingburger => "징버거",
            Member::Lilpa => "릴파",
            Member::Gosegu => "고세구",
            Member::Viichan => "비챤",
        }
    }

    /// ASCII handle, used on the command line.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Member::Ine => "ine",
            Member::Jingburger => "jingburger",
            Member::Lilpa => "lilpa",
            Member::Gosegu => "gosegu",
            Member::Viichan => "viichan",
        }
    }

    /// Older names that appear in records written before the roster settled.
    /// Only consulted by legacy text matching.
    #[must_use]
    pub fn legacy_aliases(self) -> &'static [&'static str] {
        match self {
            Member::Jingburger => &["부가땅"],
            _ => &[],
        }
    }

    /// Exact lookup by canonical label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label() == label)
    }
}

impl std::fmt::Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Member {
    type Err = CoreError;

    /// Accepts the canonical label or the slug (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::from_label(trimmed)
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|m| m.slug().eq_ignore_ascii_case(trimmed))
            })
            .ok_or_else(|| CoreError::UnknownMember(trimmed.to_string()))
    }
}

/// Member filter state. Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MemberSelection(BTreeSet<Member>);

/// A clickable statistics card: the total card or one member's card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCard {
    Total,
    Member(Member),
}

impl MemberSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `member` if absent, removes it if present.
    pub fn toggle(&mut self, member: Member) {
        if !self.0.remove(&member) {
            self.0.insert(member);
        }
    }

    pub fn select_all(&mut self) {
        self.0.clear();
    }

    pub fn click(&mut self, card: StatCard) {
        match card {
            StatCard::Total => self.select_all(),
            StatCard::Member(member) => self.toggle(member),
        }
    }

    #[must_use]
    pub fn contains(&self, member: Member) -> bool {
        self.0.contains(&member)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `member` passes the filter.
    #[must_use]
    pub fn admits(&self, member: Member) -> bool {
        self.0.is_empty() || self.0.contains(&member)
    }

    pub fn iter(&self) -> impl Iterator<Item = Member> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Member> for MemberSelection {
    fn from_iter<I: IntoIterator<Item = Member>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_label_is_exact() {
        assert_eq!(Member::from_label("릴파"), Some(Member::Lilpa));
        assert_eq!(Member::from_label(" 릴파"), None);
        assert_eq!(Member::from_label("부가땅"), None);
    }

    #[test]
    fn from_str_accepts_label_and_slug() {
        assert_eq!("고세구".parse::<Member>().unwrap(), Member::Gosegu);
        assert_eq!("Viichan".parse::<Member>().unwrap(), Member::Viichan);
        assert!(matches!(
            "wak".parse::<Member>(),
            Err(CoreError::UnknownMember(ref name)) if name == "wak"
        ));
    }

    #[test]
    fn ordering_follows_roster() {
        let mut shuffled = vec![Member::Viichan, Member::Ine, Member::Gosegu];
        shuffled.sort();
        assert_eq!(shuffled, vec![Member::Ine, Member::Gosegu, Member::Viichan]);
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&Member::Jingburger).unwrap();
        assert_eq!(json, "\"징버거\"");
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = MemberSelection::new();
        selection.toggle(Member::Ine);
        assert!(selection.contains(Member::Ine));
        selection.toggle(Member::Ine);
        assert!(selection.is_empty());
    }

    #[test]
    fn empty_selection_admits_everyone() {
        let selection = MemberSelection::new();
        assert!(Member::ALL.into_iter().all(|m| selection.admits(m)));

        let only_lilpa: MemberSelection = [Member::Lilpa].into_iter().collect();
        assert!(only_lilpa.admits(Member::Lilpa));
        assert!(!only_lilpa.admits(Member::Ine));
    }

    #[test]
    fn total_card_clears_selection() {
        let mut selection: MemberSelection = [Member::Ine, Member::Lilpa].into_iter().collect();
        selection.click(StatCard::Member(Member::Gosegu));
        assert_eq!(selection.iter().count(), 3);
        selection.click(StatCard::Total);
        assert!(selection.is_empty());
    }
}
