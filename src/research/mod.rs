//! Daily research inbox: candidate sources awaiting transformation into
//! content items.
//!
//! Items arrive from the social-listening fetch, from a pasted research
//! blob, or manually. Generation attaches candidate post variants; the best
//! variant gets promoted into the content pipeline as a DRAFT and the
//! research item is retired as `moved_draft`. Variants are never persisted
//! on their own, they live inside their parent item.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::{Account, ContentItem, ContentPipeline, Tab};

static NUMBERED_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\d+[.)]\s").expect("valid regex"));
static NUMBER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s*").expect("valid regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s)]+").expect("valid regex"));
static SOURCE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:Source|Author|By):\s*([^\n(]+)").expect("valid regex"));
static HANDLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResearchError {
    #[error("no research item with id {0}")]
    UnknownItem(u64),
    #[error("research item {0} is in a terminal state")]
    Terminal(u64),
    #[error("research item {0} has no variant {1}")]
    UnknownVariant(u64, usize),
}

/// Status of a research item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    Inbox,
    Processed,
    MovedDraft,
    MovedBad,
}

impl ResearchStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MovedDraft | Self::MovedBad)
    }
}

/// An AI-generated candidate post attached to a research item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub post: String,
    pub category: String,
    pub structure: String,
    pub score: f64,
}

/// Engagement counts carried over from the source post.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SourceEngagement {
    pub views: u64,
    pub likes: u64,
    pub replies: u64,
    pub retweets: u64,
}

/// A candidate source/insight awaiting transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchItem {
    pub id: u64,
    pub date: NaiveDate,
    pub source_url: String,
    pub author: String,
    pub original_post: String,
    pub headline: String,
    pub description: String,
    pub account: Account,
    pub status: ResearchStatus,
    /// Which fetch prompt produced the item, when fetched.
    pub source: String,
    pub engagement: SourceEngagement,
    pub variants: Vec<Variant>,
}

/// Fields of the manual-entry form.
#[derive(Debug, Clone, Default)]
pub struct ManualEntry {
    pub source_url: String,
    pub author: String,
    pub original_post: String,
    pub headline: String,
    pub description: String,
}

/// Owning collection of research items.
#[derive(Debug, Default)]
pub struct ResearchLog {
    items: Vec<ResearchItem>,
    next_id: u64,
}

impl ResearchLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a fully-built item (used by the listening fetch). Newest first.
    pub fn add(&mut self, mut item: ResearchItem) -> u64 {
        let id = self.allocate_id();
        item.id = id;
        self.items.insert(0, item);
        id
    }

    /// Add a manually-entered item. An entry with neither headline nor
    /// content is silently ignored and returns `None`.
    pub fn add_manual(&mut self, account: Account, entry: &ManualEntry) -> Option<u64> {
        let headline = entry.headline.trim();
        let post = entry.original_post.trim();
        if headline.is_empty() && post.is_empty() {
            return None;
        }
        let headline = if headline.is_empty() {
            post.chars().take(80).collect()
        } else {
            headline.to_string()
        };
        let item = ResearchItem {
            id: 0,
            date: Utc::now().date_naive(),
            source_url: entry.source_url.trim().to_string(),
            author: entry.author.trim().to_string(),
            original_post: post.to_string(),
            headline,
            description: entry.description.trim().to_string(),
            account,
            status: ResearchStatus::Inbox,
            source: "manual".to_string(),
            engagement: SourceEngagement::default(),
            variants: Vec::new(),
        };
        Some(self.add(item))
    }

    /// Split a pasted research blob into inbox items.
    ///
    /// Numbered items (`1.` / `1)`) are split on their markers; otherwise
    /// blank-line separation applies. Blocks of 10 characters or fewer are
    /// dropped. The first line becomes the headline, a URL and an author
    /// handle are extracted when present.
    pub fn add_pasted(&mut self, account: Account, input: &str) -> Vec<u64> {
        let blocks = split_blocks(input);
        let mut ids = Vec::new();
        for block in blocks {
            let mut lines = block.trim().lines();
            let headline = lines
                .next()
                .map(|l| NUMBER_PREFIX_RE.replace(l, "").trim().to_string())
                .unwrap_or_default();
            let body: String = lines.collect::<Vec<_>>().join("\n").trim().to_string();

            let url = URL_RE
                .find(&block)
                .map(|m| m.as_str().to_string())
                .filter(|u| url::Url::parse(u).is_ok())
                .unwrap_or_default();
            let author = SOURCE_LINE_RE
                .captures(&block)
                .or_else(|| HANDLE_RE.captures(&block))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().trim_start_matches('@').to_string())
                .unwrap_or_default();

            ids.push(self.add(ResearchItem {
                id: 0,
                date: Utc::now().date_naive(),
                source_url: url,
                author,
                original_post: body,
                headline,
                description: String::new(),
                account,
                status: ResearchStatus::Inbox,
                source: String::new(),
                engagement: SourceEngagement::default(),
                variants: Vec::new(),
            }));
        }
        ids
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&ResearchItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut ResearchItem, ResearchError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ResearchError::UnknownItem(id))
    }

    /// Attach generated variants, marking the item processed.
    ///
    /// # Errors
    ///
    /// Rejected on terminal items: `moved_draft`/`moved_bad` allow no
    /// further generation.
    pub fn attach_variants(&mut self, id: u64, variants: Vec<Variant>) -> Result<(), ResearchError> {
        let item = self.get_mut(id)?;
        if item.status.is_terminal() {
            return Err(ResearchError::Terminal(id));
        }
        item.variants = variants;
        item.status = ResearchStatus::Processed;
        Ok(())
    }

    /// Edit one attached variant's field in place.
    pub fn update_variant(
        &mut self,
        id: u64,
        idx: usize,
        update: impl FnOnce(&mut Variant),
    ) -> Result<(), ResearchError> {
        let item = self.get_mut(id)?;
        let variant = item
            .variants
            .get_mut(idx)
            .ok_or(ResearchError::UnknownVariant(id, idx))?;
        update(variant);
        Ok(())
    }

    /// Promote one variant into a new DRAFT content item; the research item
    /// is retired as `moved_draft` (its variants stay visible for audit).
    pub fn promote_variant(
        &mut self,
        id: u64,
        idx: usize,
        pipeline: &mut ContentPipeline,
    ) -> Result<u64, ResearchError> {
        let item = self.get_mut(id)?;
        if item.status != ResearchStatus::Processed {
            return Err(ResearchError::Terminal(id));
        }
        let variant = item
            .variants
            .get(idx)
            .ok_or(ResearchError::UnknownVariant(id, idx))?
            .clone();

        let headline: String = item.headline.chars().take(60).collect();
        let account = item.account;
        item.status = ResearchStatus::MovedDraft;

        let new_id = pipeline.allocate_id();
        let mut draft = ContentItem::draft(new_id, account, variant.post);
        draft.tab = Tab::Draft;
        draft.category = if variant.category.is_empty() {
            account.default_pillar().to_string()
        } else {
            variant.category
        };
        draft.structure = variant.structure;
        draft.score = if variant.score > 0.0 {
            variant.score.to_string()
        } else {
            String::new()
        };
        draft.notes = format!("from research: {headline}");
        pipeline.add(draft);
        Ok(new_id)
    }

    /// Reject an item. Allowed from inbox or processed.
    pub fn reject(&mut self, id: u64) -> Result<(), ResearchError> {
        let item = self.get_mut(id)?;
        if item.status.is_terminal() {
            return Err(ResearchError::Terminal(id));
        }
        item.status = ResearchStatus::MovedBad;
        Ok(())
    }

    pub fn delete(&mut self, id: u64) -> Result<(), ResearchError> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(ResearchError::UnknownItem(id))?;
        self.items.remove(idx);
        Ok(())
    }

    /// Remove all of an account's items in the given statuses.
    pub fn clear_statuses(&mut self, account: Account, statuses: &[ResearchStatus]) -> usize {
        let before = self.items.len();
        self.items
            .retain(|i| !(i.account == account && statuses.contains(&i.status)));
        before - self.items.len()
    }

    #[must_use]
    pub fn items(&self) -> &[ResearchItem] {
        &self.items
    }

    /// An account's items with the given status, newest first.
    #[must_use]
    pub fn by_status(&self, account: Account, status: ResearchStatus) -> Vec<&ResearchItem> {
        self.items
            .iter()
            .filter(|i| i.account == account && i.status == status)
            .collect()
    }
}

/// Split a pasted blob into candidate blocks.
fn split_blocks(input: &str) -> Vec<String> {
    let starts: Vec<usize> = NUMBERED_BLOCK_RE.find_iter(input).map(|m| m.start()).collect();

    let blocks: Vec<String> = if starts.len() > 1 {
        let mut out = Vec::new();
        for (i, start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(input.len());
            out.push(input[*start..end].to_string());
        }
        out
    } else {
        input.split("\n\n").map(ToString::to_string).collect()
    };

    blocks
        .into_iter()
        .filter(|b| b.trim().len() > 10)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> Vec<Variant> {
        vec![
            Variant {
                post: "short punchy take".to_string(),
                category: "market".to_string(),
                structure: "One-liner / Hot take".to_string(),
                score: 7.0,
            },
            Variant {
                post: "longer breakdown with context".to_string(),
                category: "growth".to_string(),
                structure: "Tactical how-to".to_string(),
                score: 8.0,
            },
        ]
    }

    #[test]
    fn test_manual_entry_empty_is_noop() {
        let mut log = ResearchLog::new();
        assert!(log.add_manual(Account::Primary, &ManualEntry::default()).is_none());
        assert!(log.items().is_empty());
    }

    #[test]
    fn test_manual_entry_headline_falls_back_to_post() {
        let mut log = ResearchLog::new();
        let entry = ManualEntry {
            original_post: "interesting thread about liquidity".to_string(),
            ..ManualEntry::default()
        };
        let id = log.add_manual(Account::Primary, &entry).unwrap();
        assert_eq!(log.get(id).unwrap().headline, "interesting thread about liquidity");
    }

    #[test]
    fn test_pasted_numbered_blocks() {
        let mut log = ResearchLog::new();
        let input = "1. First insight headline\nSome body text here\nhttps://x.com/a/status/1\n2) Second insight headline\nBy: @someone\nMore body";
        let ids = log.add_pasted(Account::Primary, input);
        assert_eq!(ids.len(), 2);

        // newest-first insertion: the second block is items()[0]
        let first = log.get(ids[0]).unwrap();
        assert_eq!(first.headline, "First insight headline");
        assert_eq!(first.source_url, "https://x.com/a/status/1");
        let second = log.get(ids[1]).unwrap();
        assert_eq!(second.headline, "Second insight headline");
        assert_eq!(second.author, "someone");
    }

    #[test]
    fn test_pasted_blank_line_fallback() {
        let mut log = ResearchLog::new();
        let ids = log.add_pasted(
            Account::Primary,
            "a block without numbering\n\nanother separate block here\n\nshort",
        );
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_lifecycle_inbox_processed_moved() {
        let mut log = ResearchLog::new();
        let mut pipeline = ContentPipeline::new();
        let entry = ManualEntry {
            headline: "test headline".to_string(),
            ..ManualEntry::default()
        };
        let id = log.add_manual(Account::Primary, &entry).unwrap();
        assert_eq!(log.get(id).unwrap().status, ResearchStatus::Inbox);

        log.attach_variants(id, variants()).unwrap();
        assert_eq!(log.get(id).unwrap().status, ResearchStatus::Processed);

        let draft_id = log.promote_variant(id, 1, &mut pipeline).unwrap();
        assert_eq!(log.get(id).unwrap().status, ResearchStatus::MovedDraft);

        let draft = pipeline.get(draft_id).unwrap();
        assert_eq!(draft.tab, Tab::Draft);
        assert_eq!(draft.category, "growth");
        assert_eq!(draft.score, "8");
        assert!(draft.notes.starts_with("from research: test headline"));
    }

    #[test]
    fn test_terminal_states_reject_regeneration() {
        let mut log = ResearchLog::new();
        let entry = ManualEntry {
            headline: "x y z headline".to_string(),
            ..ManualEntry::default()
        };
        let id = log.add_manual(Account::Primary, &entry).unwrap();
        log.reject(id).unwrap();
        assert_eq!(
            log.attach_variants(id, variants()),
            Err(ResearchError::Terminal(id))
        );
        assert_eq!(log.reject(id), Err(ResearchError::Terminal(id)));
        // variants stay visible for audit
        assert!(log.get(id).is_some());
    }

    #[test]
    fn test_clear_statuses() {
        let mut log = ResearchLog::new();
        for headline in ["one headline", "two headline"] {
            let entry = ManualEntry {
                headline: headline.to_string(),
                ..ManualEntry::default()
            };
            log.add_manual(Account::Primary, &entry).unwrap();
        }
        let removed = log.clear_statuses(Account::Primary, &[ResearchStatus::Inbox]);
        assert_eq!(removed, 2);
        assert!(log.items().is_empty());
    }
}
