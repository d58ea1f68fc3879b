//! The content pipeline: one owned collection of items and the five-state
//! lifecycle over them.
//!
//! The pipeline is a plain in-memory structure with a single logical writer
//! (the hosting session). It performs no I/O; mirroring to the persistence
//! collaborator is the caller's concern so that local state always wins.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::constants::DAY_ORDER;
use crate::csv::CsvRow;

use super::models::{Account, ContentItem, EngagementMetrics, Tab};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no content item with id {0}")]
    UnknownItem(u64),
    #[error("transition {from} → {to} is not allowed")]
    InvalidTransition { from: &'static str, to: &'static str },
}

/// Sort orders offered over a tab's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Manual posts and rewrites first, then by score descending.
    MineFirst,
    Category,
    ScoreDesc,
    ScoreAsc,
    Impressions,
    DayOfWeek,
}

/// Owning collection of content items with monotonic id assignment.
#[derive(Debug, Default)]
pub struct ContentPipeline {
    items: Vec<ContentItem>,
    next_id: u64,
}

impl ContentPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Next unique id, advancing the counter.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an item built by the caller around [`ContentPipeline::allocate_id`].
    pub fn add(&mut self, item: ContentItem) {
        debug_assert!(self.items.iter().all(|i| i.id != item.id));
        self.items.push(item);
    }

    pub fn add_many(&mut self, items: impl IntoIterator<Item = ContentItem>) {
        for item in items {
            self.add(item);
        }
    }

    /// Import parsed sheet rows for one tab, assigning sequential ids.
    ///
    /// Column spellings follow the sheet: `Post`/`Post text`,
    /// `Notes`/`Why Bad`, `Post Link`/`Post link`.
    pub fn import_rows(&mut self, tab: Tab, account: Account, rows: &[CsvRow]) -> usize {
        let mut imported = 0;
        for row in rows {
            let id = self.allocate_id();
            self.items.push(ContentItem {
                id,
                tab,
                category: row.get("Category").to_string(),
                structure: row.get("Structure").to_string(),
                post: row.get_any(&["Post", "Post text"]).to_string(),
                notes: row.get_any(&["Notes", "Why Bad"]).to_string(),
                score: row.get("Score").to_string(),
                how_to_fix: row.get("How to Fix").to_string(),
                day: String::new(),
                account,
                source: String::new(),
                image_url: String::new(),
                post_link: row.get_any(&["Post Link", "Post link"]).to_string(),
                metrics: EngagementMetrics {
                    impressions: row.get("Impressions").to_string(),
                    likes: row.get("Likes").to_string(),
                    engagements: row.get("Engagements").to_string(),
                    bookmarks: row.get("Bookmarks").to_string(),
                    replies: row.get("Replies").to_string(),
                    reposts: row.get("Reposts").to_string(),
                    profile_visits: row.get("Profile visits").to_string(),
                    new_follows: row.get("New follows").to_string(),
                    url_clicks: row.get("URL Clicks").to_string(),
                },
                store_id: None,
            });
            imported += 1;
        }
        imported
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&ContentItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut ContentItem, PipelineError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(PipelineError::UnknownItem(id))
    }

    /// Move an item along a documented lifecycle edge.
    ///
    /// # Errors
    ///
    /// Rejects unknown ids and any transition not listed in
    /// [`Tab::allowed_transitions`]. Moving into BAD goes through
    /// [`ContentPipeline::move_to_bad`] because it requires a reason.
    pub fn transition(&mut self, id: u64, to: Tab) -> Result<(), PipelineError> {
        let item = self.get_mut(id)?;
        if !item.tab.allowed_transitions().contains(&to) {
            return Err(PipelineError::InvalidTransition {
                from: item.tab.as_str(),
                to: to.as_str(),
            });
        }
        debug!(id, from = item.tab.as_str(), to = to.as_str(), "content transition");
        item.tab = to;
        Ok(())
    }

    /// Reject an item with a reason. The reason overwrites the notes and
    /// the fix suggestion is cleared: a rejected item's prior metadata is
    /// presumed stale.
    pub fn move_to_bad(&mut self, id: u64, reason: &str) -> Result<(), PipelineError> {
        let item = self.get_mut(id)?;
        if !item.tab.allowed_transitions().contains(&Tab::Bad) {
            return Err(PipelineError::InvalidTransition {
                from: item.tab.as_str(),
                to: Tab::Bad.as_str(),
            });
        }
        item.tab = Tab::Bad;
        item.notes = reason.to_string();
        item.how_to_fix.clear();
        Ok(())
    }

    pub fn set_day(&mut self, id: u64, day: &str) -> Result<(), PipelineError> {
        self.get_mut(id)?.day = day.to_string();
        Ok(())
    }

    pub fn edit_text(&mut self, id: u64, text: &str) -> Result<(), PipelineError> {
        self.get_mut(id)?.post = text.to_string();
        Ok(())
    }

    pub fn set_score(&mut self, id: u64, score: &str, notes: &str) -> Result<(), PipelineError> {
        let item = self.get_mut(id)?;
        item.score = score.to_string();
        item.notes = notes.to_string();
        Ok(())
    }

    pub fn set_notes(&mut self, id: u64, notes: &str) -> Result<(), PipelineError> {
        self.get_mut(id)?.notes = notes.to_string();
        Ok(())
    }

    pub fn set_image(&mut self, id: u64, url: &str) -> Result<(), PipelineError> {
        self.get_mut(id)?.image_url = url.to_string();
        Ok(())
    }

    pub fn set_store_id(&mut self, id: u64, store_id: i64) -> Result<(), PipelineError> {
        self.get_mut(id)?.store_id = Some(store_id);
        Ok(())
    }

    /// Remove an item outright. Allowed from any state.
    pub fn delete(&mut self, id: u64) -> Result<ContentItem, PipelineError> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(PipelineError::UnknownItem(id))?;
        Ok(self.items.remove(idx))
    }

    /// Remove every item of one account sitting in a tab; returns them.
    pub fn clear_tab(&mut self, account: Account, tab: Tab) -> Vec<ContentItem> {
        let (removed, kept) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|i| i.account == account && i.tab == tab);
        self.items = kept;
        removed
    }

    #[must_use]
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Items of one account, in insertion order.
    #[must_use]
    pub fn account_items(&self, account: Account) -> Vec<&ContentItem> {
        self.items.iter().filter(|i| i.account == account).collect()
    }

    /// Items of one account currently in a tab.
    #[must_use]
    pub fn tab_items(&self, account: Account, tab: Tab) -> Vec<&ContentItem> {
        self.items
            .iter()
            .filter(|i| i.account == account && i.tab == tab)
            .collect()
    }

    /// Per-tab item counts for one account.
    #[must_use]
    pub fn counts(&self, account: Account) -> HashMap<Tab, usize> {
        let mut counts = HashMap::new();
        for item in self.items.iter().filter(|i| i.account == account) {
            *counts.entry(item.tab).or_insert(0) += 1;
        }
        counts
    }

    /// Sorted view over one tab's items.
    #[must_use]
    pub fn sorted_tab_items(&self, account: Account, tab: Tab, sort: SortBy) -> Vec<&ContentItem> {
        let mut items = self.tab_items(account, tab);
        match sort {
            SortBy::MineFirst => items.sort_by(|a, b| {
                let rank = |i: &ContentItem| {
                    usize::from(!(i.source == "manual" || i.notes.starts_with("rewrite")))
                };
                rank(a).cmp(&rank(b)).then(
                    b.score_value()
                        .unwrap_or(0.0)
                        .total_cmp(&a.score_value().unwrap_or(0.0)),
                )
            }),
            SortBy::Category => items.sort_by(|a, b| a.category.cmp(&b.category)),
            SortBy::ScoreDesc => items.sort_by(|a, b| {
                b.score_value()
                    .unwrap_or(0.0)
                    .total_cmp(&a.score_value().unwrap_or(0.0))
            }),
            SortBy::ScoreAsc => items.sort_by(|a, b| {
                a.score_value()
                    .unwrap_or(0.0)
                    .total_cmp(&b.score_value().unwrap_or(0.0))
            }),
            SortBy::Impressions => {
                items.sort_by(|a, b| b.impressions_value().cmp(&a.impressions_value()));
            }
            SortBy::DayOfWeek => items.sort_by_key(|i| {
                DAY_ORDER
                    .iter()
                    .position(|d| *d == i.day)
                    .unwrap_or(usize::MAX)
            }),
        }
        items
    }
}
