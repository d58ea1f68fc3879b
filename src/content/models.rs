use serde::{Deserialize, Serialize};

use crate::constants::{ACCOUNT_PRIMARY, ACCOUNT_SECONDARY, PILLARS_PRIMARY, PILLARS_SECONDARY};

/// Lifecycle tab of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tab {
    Draft,
    Post,
    Used,
    Database,
    Bad,
}

impl Tab {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Post => "POST",
            Self::Used => "USED",
            Self::Database => "DATABASE",
            Self::Bad => "BAD",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(Self::Draft),
            "POST" => Some(Self::Post),
            "USED" => Some(Self::Used),
            "DATABASE" => Some(Self::Database),
            "BAD" => Some(Self::Bad),
            _ => None,
        }
    }

    /// Direct transitions allowed out of this tab.
    #[must_use]
    pub fn allowed_transitions(&self) -> &'static [Tab] {
        match self {
            Self::Draft => &[Self::Post, Self::Database, Self::Bad],
            Self::Post => &[Self::Used, Self::Draft, Self::Bad],
            Self::Database => &[Self::Draft, Self::Post, Self::Bad],
            Self::Bad => &[Self::Draft],
            Self::Used => &[Self::Draft],
        }
    }
}

/// One of the two configured accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Account {
    Primary,
    Secondary,
}

impl Account {
    #[must_use]
    pub fn handle(&self) -> &'static str {
        match self {
            Self::Primary => ACCOUNT_PRIMARY,
            Self::Secondary => ACCOUNT_SECONDARY,
        }
    }

    #[must_use]
    pub fn from_handle(handle: &str) -> Option<Self> {
        match handle {
            ACCOUNT_PRIMARY => Some(Self::Primary),
            ACCOUNT_SECONDARY => Some(Self::Secondary),
            _ => None,
        }
    }

    /// Content pillars available on this account.
    #[must_use]
    pub fn pillars(&self) -> &'static [&'static str] {
        match self {
            Self::Primary => PILLARS_PRIMARY,
            Self::Secondary => PILLARS_SECONDARY,
        }
    }

    /// Default pillar for new manual drafts.
    #[must_use]
    pub fn default_pillar(&self) -> &'static str {
        match self {
            Self::Primary => "growth",
            Self::Secondary => "market",
        }
    }

    #[must_use]
    pub fn other(&self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

/// Per-post engagement metrics as exported by the platform.
///
/// Values travel as raw strings: sheet cells and store rows carry them
/// unparsed and empty means "not reported".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub impressions: String,
    pub likes: String,
    pub engagements: String,
    pub bookmarks: String,
    pub replies: String,
    pub reposts: String,
    pub profile_visits: String,
    pub new_follows: String,
    pub url_clicks: String,
}

/// A unit of social-media content in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    pub tab: Tab,
    pub category: String,
    pub structure: String,
    pub post: String,
    pub notes: String,
    /// Score in `[0, 10]` as a string; empty when unscored.
    pub score: String,
    pub how_to_fix: String,
    /// Scheduled day of week; only meaningful while in POST, preserved
    /// through USED as a historical record.
    pub day: String,
    pub account: Account,
    /// Where the item came from: `manual`, `translated`, or empty for
    /// generated/imported items.
    pub source: String,
    pub image_url: String,
    pub post_link: String,
    pub metrics: EngagementMetrics,
    /// Row id assigned by the persistence collaborator, once mirrored.
    pub store_id: Option<i64>,
}

impl ContentItem {
    /// New empty DRAFT item for an account.
    #[must_use]
    pub fn draft(id: u64, account: Account, post: String) -> Self {
        Self {
            id,
            tab: Tab::Draft,
            category: String::new(),
            structure: String::new(),
            post,
            notes: String::new(),
            score: String::new(),
            how_to_fix: String::new(),
            day: String::new(),
            account,
            source: String::new(),
            image_url: String::new(),
            post_link: String::new(),
            metrics: EngagementMetrics::default(),
            store_id: None,
        }
    }

    /// Parsed numeric score, when present and parseable.
    #[must_use]
    pub fn score_value(&self) -> Option<f64> {
        let parsed: f64 = self.score.trim().parse().ok()?;
        (0.0..=10.0).contains(&parsed).then_some(parsed)
    }

    /// Parsed impressions, defaulting to 0.
    #[must_use]
    pub fn impressions_value(&self) -> u64 {
        self.metrics.impressions.trim().parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_round_trip() {
        for tab in [Tab::Draft, Tab::Post, Tab::Used, Tab::Database, Tab::Bad] {
            assert_eq!(Tab::from_str(tab.as_str()), Some(tab));
        }
        assert_eq!(Tab::from_str("NOPE"), None);
    }

    #[test]
    fn test_account_handles() {
        assert_eq!(Account::from_handle("@django_crypto"), Some(Account::Primary));
        assert_eq!(Account::from_handle("@henryk0x"), Some(Account::Secondary));
        assert_eq!(Account::from_handle("@someone_else"), None);
    }

    #[test]
    fn test_score_value_range() {
        let mut item = ContentItem::draft(1, Account::Primary, "post".to_string());
        item.score = "7.5".to_string();
        assert_eq!(item.score_value(), Some(7.5));
        item.score = "11".to_string();
        assert_eq!(item.score_value(), None);
        item.score = String::new();
        assert_eq!(item.score_value(), None);
    }
}
