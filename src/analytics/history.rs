//! The retained multi-week analytics history.
//!
//! An explicit repository with a defined load/save lifecycle: construct it
//! from a previously exported JSON document, mutate it through the typed
//! setters, and serialize it back out. Persistence timing is the caller's
//! contract, not a side effect.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::info;

use super::types::{DailyRow, PostRecord, WeeklySnapshot};
use super::ingest::ContentUpload;

/// Week key → snapshot map, ordered by key so "previous recorded week" is
/// well defined even when weeks were skipped.
#[derive(Debug, Default)]
pub struct AnalyticsHistory {
    weeks: BTreeMap<String, WeeklySnapshot>,
}

impl AnalyticsHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a history from an exported JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a week-key → snapshot map.
    pub fn from_json(json: &str) -> Result<Self> {
        let weeks: BTreeMap<String, WeeklySnapshot> =
            serde_json::from_str(json).context("Failed to parse analytics history JSON")?;
        Ok(Self { weeks })
    }

    /// Export the whole history as a single JSON document.
    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.weeks).context("Failed to serialize analytics history")
    }

    /// Merge an exported document into this history. Only the weeks present
    /// in the imported file are overwritten; everything else is retained.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let imported: BTreeMap<String, WeeklySnapshot> =
            serde_json::from_str(json).context("Failed to parse analytics history JSON")?;
        let count = imported.len();
        for (week, snapshot) in imported {
            self.weeks.insert(week, snapshot);
        }
        info!(weeks = count, "analytics history imported");
        Ok(count)
    }

    /// Store a content upload's post records for its week, replacing any
    /// prior records wholesale. Daily rows for the week are retained.
    pub fn set_posts(&mut self, upload: ContentUpload, matched: usize) {
        let spontaneous = upload.originals.len() - matched;
        let entry = self.weeks.entry(upload.week).or_default();
        entry.originals = upload.originals;
        entry.total_rows = upload.total_rows;
        entry.reply_count = upload.reply_count;
        entry.matched_count = matched;
        entry.spontaneous_count = spontaneous;
    }

    /// Replace one week's post records in place (re-match).
    pub fn replace_posts(&mut self, week: &str, originals: Vec<PostRecord>, matched: usize) {
        if let Some(entry) = self.weeks.get_mut(week) {
            entry.spontaneous_count = originals.len() - matched;
            entry.matched_count = matched;
            entry.originals = originals;
        }
    }

    /// Store an overview upload's daily rows, replacing any prior rows for
    /// that week. Post records for the week are retained.
    pub fn set_daily(&mut self, week: &str, daily: Vec<DailyRow>) {
        self.weeks.entry(week.to_string()).or_default().daily = daily;
    }

    #[must_use]
    pub fn get(&self, week: &str) -> Option<&WeeklySnapshot> {
        self.weeks.get(week)
    }

    /// Tracked week keys in ascending order.
    #[must_use]
    pub fn weeks(&self) -> Vec<&str> {
        self.weeks.keys().map(String::as_str).collect()
    }

    /// Most recent tracked week.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.weeks.keys().next_back().map(String::as_str)
    }

    /// Nearest tracked week strictly before the given key.
    #[must_use]
    pub fn previous_week(&self, week: &str) -> Option<&str> {
        self.weeks
            .range::<str, _>((std::ops::Bound::Unbounded, std::ops::Bound::Excluded(week)))
            .next_back()
            .map(|(k, _)| k.as_str())
    }

    pub fn clear(&mut self) {
        self.weeks.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    /// Iterate (week, snapshot) in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WeeklySnapshot)> {
        self.weeks.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::ingest::parse_content_csv;

    fn upload(week_date: &str, text: &str, impressions: u64) -> ContentUpload {
        let csv = format!(
            "Date,Post text,Impressions\n\"{week_date}\",\"{text}\",{impressions}\n"
        );
        parse_content_csv(&csv).unwrap()
    }

    #[test]
    fn test_reupload_replaces_posts() {
        let mut history = AnalyticsHistory::new();
        history.set_posts(upload("Thu, Feb 12, 2026", "first upload post text", 100), 0);
        assert_eq!(history.get("2026-W07").unwrap().originals.len(), 1);
        assert_eq!(
            history.get("2026-W07").unwrap().originals[0].text,
            "first upload post text"
        );

        history.set_posts(upload("Thu, Feb 12, 2026", "second upload post text", 200), 0);
        let snapshot = history.get("2026-W07").unwrap();
        assert_eq!(snapshot.originals.len(), 1);
        assert_eq!(snapshot.originals[0].text, "second upload post text");
    }

    #[test]
    fn test_daily_survives_post_reupload() {
        let mut history = AnalyticsHistory::new();
        history.set_daily(
            "2026-W07",
            vec![crate::analytics::DailyRow {
                date: "Thu, Feb 12, 2026".to_string(),
                impressions: 5000,
                likes: 100,
                engagements: 200,
                new_follows: 10,
                unfollows: 2,
            }],
        );
        history.set_posts(upload("Thu, Feb 12, 2026", "post body text here", 100), 0);
        let snapshot = history.get("2026-W07").unwrap();
        assert_eq!(snapshot.daily.len(), 1);
        assert_eq!(snapshot.originals.len(), 1);
    }

    #[test]
    fn test_export_import_merge() {
        let mut a = AnalyticsHistory::new();
        a.set_posts(upload("Thu, Feb 12, 2026", "week seven post text", 100), 0);
        let exported = a.export_json().unwrap();

        let mut b = AnalyticsHistory::new();
        b.set_posts(upload("Thu, Feb 19, 2026", "week eight post text", 900), 0);
        b.import_json(&exported).unwrap();

        // both weeks present: import only overwrote what it carried
        assert_eq!(b.weeks(), vec!["2026-W07", "2026-W08"]);
        assert_eq!(b.get("2026-W07").unwrap().originals[0].impressions, 100);
    }

    #[test]
    fn test_previous_week_skips_gaps() {
        let mut history = AnalyticsHistory::new();
        history.set_posts(upload("Thu, Feb 12, 2026", "week seven post text", 100), 0);
        history.set_posts(upload("Thu, Mar 5, 2026", "week ten post text", 300), 0);
        assert_eq!(history.previous_week("2026-W10"), Some("2026-W07"));
        assert_eq!(history.previous_week("2026-W07"), None);
    }

    #[test]
    fn test_round_trip_is_stable() {
        let mut history = AnalyticsHistory::new();
        history.set_posts(upload("Thu, Feb 12, 2026", "round trip post text", 100), 0);
        let once = history.export_json().unwrap();
        let again = AnalyticsHistory::from_json(&once).unwrap().export_json().unwrap();
        assert_eq!(once, again);
    }
}
