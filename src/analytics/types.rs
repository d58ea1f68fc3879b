use serde::{Deserialize, Serialize};

/// Whether a performant post went through the pipeline or appeared only in
/// the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSource {
    /// Matched a tracked content item above the similarity threshold.
    Planned,
    /// No local record; posted off the cuff.
    Spontaneous,
}

/// One post's performance as reported by the export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub date: String,
    pub text: String,
    pub link: String,
    pub impressions: u64,
    pub likes: u64,
    pub engagements: u64,
    pub bookmarks: u64,
    pub reposts: u64,
    pub replies: u64,
    pub follows: u64,
    /// Recovered from a match or AI classification.
    pub pillar: Option<String>,
    pub structure: Option<String>,
    pub ai_score: Option<f64>,
    pub source: PostSource,
}

/// One day's account-level aggregate row from the overview export.
///
/// Daily aggregates include engagement outside tracked posts (replies and
/// the like), so they are preferred over per-post sums when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRow {
    pub date: String,
    pub impressions: u64,
    pub likes: u64,
    pub engagements: u64,
    pub new_follows: u64,
    pub unfollows: u64,
}

/// One ISO week's imported analytics data.
///
/// Replaced wholesale per upload: a content upload replaces `originals` and
/// its counts, an overview upload replaces `daily`; nothing is ever merged
/// field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklySnapshot {
    #[serde(default)]
    pub originals: Vec<PostRecord>,
    #[serde(default)]
    pub daily: Vec<DailyRow>,
    /// Row count of the uploaded content CSV, replies included.
    #[serde(default)]
    pub total_rows: usize,
    /// Rows excluded as replies or zero-impression noise.
    #[serde(default)]
    pub reply_count: usize,
    #[serde(default)]
    pub matched_count: usize,
    #[serde(default)]
    pub spontaneous_count: usize,
}

impl WeeklySnapshot {
    /// Total impressions, preferring daily aggregates when they carry data.
    #[must_use]
    pub fn total_impressions(&self) -> u64 {
        let daily: u64 = self.daily.iter().map(|d| d.impressions).sum();
        if daily > 0 {
            daily
        } else {
            self.originals.iter().map(|p| p.impressions).sum()
        }
    }

    /// Total engagements under the same daily-preferred rule.
    #[must_use]
    pub fn total_engagements(&self) -> u64 {
        let daily: u64 = self.daily.iter().map(|d| d.engagements).sum();
        if daily > 0 {
            daily
        } else {
            self.originals.iter().map(|p| p.engagements).sum()
        }
    }

    /// Engagement rate in percent.
    #[must_use]
    pub fn engagement_rate(&self) -> f64 {
        let impressions = self.total_impressions();
        if impressions == 0 {
            return 0.0;
        }
        self.total_engagements() as f64 / impressions as f64 * 100.0
    }

    /// Net follower delta: new follows minus unfollows across the days.
    #[must_use]
    pub fn net_follows(&self) -> i64 {
        let gained: u64 = self.daily.iter().map(|d| d.new_follows).sum();
        let lost: u64 = self.daily.iter().map(|d| d.unfollows).sum();
        gained as i64 - lost as i64
    }
}
