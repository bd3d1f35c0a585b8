//! View-model derivations
//!
//! Pure functions turning fetched record sets into what the screens
//! render: recency-ordered lists, per-day calendar counts, dashboard
//! stats, search matches with highlighted spans, and weekly digest
//! eligibility. Every derivation works on a single self-consistent fetch
//! result; nothing here touches the store.

use crate::types::{Entry, Notebook};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::{BTreeMap, HashSet};

/// Fixed summary copy shown by an eligible weekly digest.
///
/// A placeholder for a future content-analysis feature, not the output of
/// any real analysis. Keep treating it as such.
pub const DIGEST_SUMMARY_PLACEHOLDER: &str =
    "You've been consistent this week. Keep writing to discover more patterns.";

/// Fixed dominant-time-of-day copy. Placeholder, same caveat as
/// [`DIGEST_SUMMARY_PLACEHOLDER`].
pub const DIGEST_DOMINANT_TIME_PLACEHOLDER: &str = "Evening";

/// Fixed recurring-theme keywords. Placeholder, same caveat as
/// [`DIGEST_SUMMARY_PLACEHOLDER`].
pub const DIGEST_KEYWORDS_PLACEHOLDER: [&str; 3] = ["Journaling", "Reflection", "Growth"];

/// Sort entries by recency: `entry_date` descending, then creation
/// timestamp descending, then id. The explicit tie-break keeps ordering
/// deterministic when several entries share a date.
pub fn recency_sort(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.entry_date
            .cmp(&a.entry_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// The `limit` most recent entries.
pub fn most_recent(mut entries: Vec<Entry>, limit: usize) -> Vec<Entry> {
    recency_sort(&mut entries);
    entries.truncate(limit);
    entries
}

/// Per-day entry counts for one month. Days without entries are absent
/// from the map, never zero-valued; the calendar treats absence as zero.
pub fn calendar_counts(year: i32, month: u32, entries: &[Entry]) -> BTreeMap<NaiveDate, u32> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        let date = entry.entry_date;
        if date.year() == year && date.month() == month {
            *counts.entry(date).or_insert(0) += 1;
        }
    }
    counts
}

/// Consecutive calendar days with at least one entry, ending today or
/// yesterday.
pub fn writing_streak(entry_dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = if entry_dates.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if entry_dates.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    loop {
        streak += 1;
        match day.pred_opt() {
            Some(prev) if entry_dates.contains(&prev) => day = prev,
            _ => return streak,
        }
    }
}

/// Dashboard headline numbers plus the recent-entries strip.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    /// Lifetime entry count
    pub total_entries: u64,
    /// Notebook count
    pub total_notebooks: u64,
    /// Consecutive writing days, see [`writing_streak`]
    pub writing_streak: u32,
    /// Most recent entries, recency ordered
    pub recent_entries: Vec<Entry>,
}

/// A run of text in a search result, either plain or matching the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSpan {
    /// Text outside any match
    Plain(String),
    /// Text matching the query, rendered highlighted
    Match(String),
}

/// Split text into plain and matched spans for a case-insensitive query.
/// A blank query yields the whole text as a single plain span.
pub fn highlight(text: &str, query: &str) -> Vec<TextSpan> {
    let trimmed = query.trim();
    if trimmed.is_empty() || text.is_empty() {
        return vec![TextSpan::Plain(text.to_string())];
    }

    let needle = trimmed.to_lowercase();
    let mut spans = Vec::new();
    let mut cursor = 0;
    while let Some((start, end)) = find_case_insensitive(text, &needle, cursor) {
        if start > cursor {
            spans.push(TextSpan::Plain(text[cursor..start].to_string()));
        }
        spans.push(TextSpan::Match(text[start..end].to_string()));
        cursor = end;
    }
    if cursor < text.len() {
        spans.push(TextSpan::Plain(text[cursor..].to_string()));
    }
    if spans.is_empty() {
        spans.push(TextSpan::Plain(text.to_string()));
    }
    spans
}

/// Whether an entry's title or body contains the query,
/// case-insensitively. Blank queries match nothing.
pub fn entry_matches(entry: &Entry, query: &str) -> bool {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return false;
    }
    let needle = trimmed.to_lowercase();
    find_case_insensitive(&entry.title, &needle, 0).is_some()
        || find_case_insensitive(&entry.content, &needle, 0).is_some()
}

/// Filter entries down to query matches, recency ordered.
pub fn search_entries(entries: Vec<Entry>, query: &str) -> Vec<Entry> {
    let mut matches: Vec<Entry> = entries
        .into_iter()
        .filter(|entry| entry_matches(entry, query))
        .collect();
    recency_sort(&mut matches);
    matches
}

/// Byte range of the first case-insensitive occurrence of `needle_lower`
/// (already lowercased) at or after `from`.
fn find_case_insensitive(haystack: &str, needle_lower: &str, from: usize) -> Option<(usize, usize)> {
    let tail = haystack.get(from..)?;
    for (offset, _) in tail.char_indices() {
        if let Some(len) = case_insensitive_prefix_len(&tail[offset..], needle_lower) {
            return Some((from + offset, from + offset + len));
        }
    }
    None
}

/// Length in bytes of a prefix of `candidate` that lowercases to
/// `needle_lower`, if one exists.
fn case_insensitive_prefix_len(candidate: &str, needle_lower: &str) -> Option<usize> {
    let mut needle_chars = needle_lower.chars();
    let mut target = needle_chars.next();
    let mut len = 0;
    for c in candidate.chars() {
        for folded in c.to_lowercase() {
            match target {
                Some(expected) if expected == folded => target = needle_chars.next(),
                _ => return None,
            }
        }
        len += c.len_utf8();
        if target.is_none() {
            return Some(len);
        }
    }
    None
}

/// The weekly digest view model.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyDigest {
    /// Whether enough opted-in entries exist in the trailing window
    pub has_enough_data: bool,
    /// Opted-in entries inside the window, 0 when ineligible
    pub entry_count: usize,
    /// Placeholder summary copy, present only when eligible
    pub summary_text: Option<String>,
    /// Placeholder dominant-time copy, present only when eligible
    pub dominant_time: Option<String>,
    /// Placeholder theme keywords, empty when ineligible
    pub top_keywords: Vec<String>,
}

impl WeeklyDigest {
    fn not_enough_data() -> Self {
        Self {
            has_enough_data: false,
            entry_count: 0,
            summary_text: None,
            dominant_time: None,
            top_keywords: Vec::new(),
        }
    }
}

/// Weekly digest eligibility over one owner's notebooks and entries.
///
/// Eligibility requires at least `min_entries` entries from the trailing
/// `window_days` days belonging to a digest-opted notebook. The rendered
/// summary fields are fixed placeholder copy, not analysis output.
pub fn weekly_digest(
    notebooks: &[Notebook],
    entries: &[Entry],
    today: NaiveDate,
    window_days: u32,
    min_entries: usize,
) -> WeeklyDigest {
    let opted: HashSet<&str> = notebooks
        .iter()
        .filter(|nb| nb.include_in_weekly_digest)
        .map(|nb| nb.id.as_str())
        .collect();
    if opted.is_empty() {
        return WeeklyDigest::not_enough_data();
    }

    let cutoff = today
        .checked_sub_days(Days::new(window_days.into()))
        .unwrap_or(today);
    let entry_count = entries
        .iter()
        .filter(|entry| entry.entry_date >= cutoff && opted.contains(entry.notebook_id.as_str()))
        .count();

    if entry_count < min_entries {
        return WeeklyDigest::not_enough_data();
    }

    WeeklyDigest {
        has_enough_data: true,
        entry_count,
        summary_text: Some(DIGEST_SUMMARY_PLACEHOLDER.to_string()),
        dominant_time: Some(DIGEST_DOMINANT_TIME_PLACEHOLDER.to_string()),
        top_keywords: DIGEST_KEYWORDS_PLACEHOLDER
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}
