//! Weekly rollups and multi-week trends.
//!
//! Everything here is a pure function of stored snapshot state: running an
//! aggregation twice over the same history yields identical output, and
//! re-uploading a week simply changes the input it reads.

use std::collections::BTreeMap;

use serde::Serialize;

use super::history::AnalyticsHistory;
use super::types::{PostRecord, PostSource, WeeklySnapshot};

/// Per-pillar performance for one week.
#[derive(Debug, Clone, Serialize)]
pub struct PillarStats {
    pub pillar: String,
    pub posts: usize,
    pub impressions: u64,
    pub likes: u64,
    pub engagements: u64,
    pub avg_impressions: u64,
    pub avg_engagement_rate: f64,
    pub top_impressions: u64,
    pub planned: usize,
    pub spontaneous: usize,
}

/// Per-structure performance for one week.
#[derive(Debug, Clone, Serialize)]
pub struct StructureStats {
    pub structure: String,
    pub posts: usize,
    pub avg_impressions: u64,
    pub avg_engagement_rate: f64,
}

/// AI-score vs realized-performance comparison for one post.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreComparison {
    pub text: String,
    pub ai: f64,
    /// Impressions scaled against the week's best post onto 1–10.
    pub real: f64,
    pub diff: f64,
    pub impressions: u64,
    pub pillar: Option<String>,
    pub source: PostSource,
}

/// Week-level score-accuracy proxy. Illustrative only: "real" is an
/// impression-derived heuristic, not ground truth.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreAccuracy {
    pub comparisons: Vec<ScoreComparison>,
    pub mean_abs_diff: f64,
}

/// Complete rollup of one week's snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct WeekSummary {
    pub week: String,
    pub post_count: usize,
    pub planned_count: usize,
    pub spontaneous_count: usize,
    pub total_impressions: u64,
    pub engagement_rate: f64,
    pub net_follows: i64,
    pub planned_avg_impressions: u64,
    pub spontaneous_avg_impressions: u64,
    /// Sorted by average impressions descending.
    pub pillars: Vec<PillarStats>,
    /// Sorted by average impressions descending.
    pub structures: Vec<StructureStats>,
    pub score_accuracy: Option<ScoreAccuracy>,
}

/// Percentage change against the nearest previous recorded week.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WeekOverWeek {
    pub impressions_pct: f64,
    pub engagement_rate_pct: f64,
}

/// One week's point in the multi-week trend series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub week: String,
    /// Average impressions per pillar that week.
    pub pillar_avg_impressions: BTreeMap<String, u64>,
    pub impressions: u64,
    pub engagement_rate: f64,
    pub net_follows: i64,
    pub posts: usize,
}

/// Roll one week's snapshot up into its summary.
#[must_use]
pub fn summarize(week: &str, snapshot: &WeeklySnapshot) -> WeekSummary {
    let originals = &snapshot.originals;
    let planned: Vec<&PostRecord> = originals
        .iter()
        .filter(|p| p.source == PostSource::Planned)
        .collect();
    let spontaneous: Vec<&PostRecord> = originals
        .iter()
        .filter(|p| p.source == PostSource::Spontaneous)
        .collect();

    WeekSummary {
        week: week.to_string(),
        post_count: originals.len(),
        planned_count: planned.len(),
        spontaneous_count: spontaneous.len(),
        total_impressions: snapshot.total_impressions(),
        engagement_rate: snapshot.engagement_rate(),
        net_follows: snapshot.net_follows(),
        planned_avg_impressions: avg_impressions(&planned),
        spontaneous_avg_impressions: avg_impressions(&spontaneous),
        pillars: pillar_stats(originals),
        structures: structure_stats(originals),
        score_accuracy: score_accuracy(originals),
    }
}

/// Deltas against the nearest previous recorded week (by sorted key, so a
/// skipped week still compares against whatever came before it). `None`
/// when there is no prior week or it had no impressions.
#[must_use]
pub fn week_over_week(history: &AnalyticsHistory, week: &str) -> Option<WeekOverWeek> {
    let current = history.get(week)?;
    let prev_key = history.previous_week(week)?;
    let previous = history.get(prev_key)?;

    let prev_impressions = previous.total_impressions();
    if prev_impressions == 0 {
        return None;
    }
    let impressions_pct = (current.total_impressions() as f64 - prev_impressions as f64)
        / prev_impressions as f64
        * 100.0;

    let prev_rate = previous.engagement_rate();
    let engagement_rate_pct = if prev_rate == 0.0 {
        0.0
    } else {
        (current.engagement_rate() - prev_rate) / prev_rate * 100.0
    };

    Some(WeekOverWeek {
        impressions_pct,
        engagement_rate_pct,
    })
}

/// One chartable point per tracked week, in week order.
#[must_use]
pub fn trend_series(history: &AnalyticsHistory) -> Vec<TrendPoint> {
    history
        .iter()
        .map(|(week, snapshot)| {
            let mut per_pillar: BTreeMap<String, (u64, usize)> = BTreeMap::new();
            for post in snapshot.originals.iter().filter(|p| p.pillar.is_some()) {
                let entry = per_pillar
                    .entry(post.pillar.clone().unwrap_or_default())
                    .or_insert((0, 0));
                entry.0 += post.impressions;
                entry.1 += 1;
            }
            let pillar_avg_impressions = per_pillar
                .into_iter()
                .map(|(pillar, (sum, n))| (pillar, ratio_round(sum, n)))
                .collect();

            TrendPoint {
                week: week.to_string(),
                pillar_avg_impressions,
                impressions: snapshot.total_impressions(),
                engagement_rate: snapshot.engagement_rate(),
                net_follows: snapshot.net_follows(),
                posts: snapshot.originals.len(),
            }
        })
        .collect()
}

fn avg_impressions(posts: &[&PostRecord]) -> u64 {
    if posts.is_empty() {
        return 0;
    }
    ratio_round(posts.iter().map(|p| p.impressions).sum(), posts.len())
}

fn ratio_round(sum: u64, n: usize) -> u64 {
    if n == 0 {
        0
    } else {
        (sum as f64 / n as f64).round() as u64
    }
}

fn pillar_stats(originals: &[PostRecord]) -> Vec<PillarStats> {
    let mut by_pillar: BTreeMap<&str, Vec<&PostRecord>> = BTreeMap::new();
    for post in originals.iter().filter(|p| p.pillar.is_some()) {
        by_pillar
            .entry(post.pillar.as_deref().unwrap_or_default())
            .or_default()
            .push(post);
    }

    let mut stats: Vec<PillarStats> = by_pillar
        .into_iter()
        .map(|(pillar, posts)| {
            let impressions: u64 = posts.iter().map(|p| p.impressions).sum();
            let engagements: u64 = posts.iter().map(|p| p.engagements).sum();
            PillarStats {
                pillar: pillar.to_string(),
                posts: posts.len(),
                impressions,
                likes: posts.iter().map(|p| p.likes).sum(),
                engagements,
                avg_impressions: ratio_round(impressions, posts.len()),
                avg_engagement_rate: rate_pct(engagements, impressions),
                top_impressions: posts.iter().map(|p| p.impressions).max().unwrap_or(0),
                planned: posts
                    .iter()
                    .filter(|p| p.source == PostSource::Planned)
                    .count(),
                spontaneous: posts
                    .iter()
                    .filter(|p| p.source == PostSource::Spontaneous)
                    .count(),
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.avg_impressions
            .cmp(&a.avg_impressions)
            .then_with(|| a.pillar.cmp(&b.pillar))
    });
    stats
}

fn structure_stats(originals: &[PostRecord]) -> Vec<StructureStats> {
    let mut by_structure: BTreeMap<&str, Vec<&PostRecord>> = BTreeMap::new();
    for post in originals.iter().filter(|p| p.structure.is_some()) {
        by_structure
            .entry(post.structure.as_deref().unwrap_or_default())
            .or_default()
            .push(post);
    }

    let mut stats: Vec<StructureStats> = by_structure
        .into_iter()
        .map(|(structure, posts)| {
            let impressions: u64 = posts.iter().map(|p| p.impressions).sum();
            let engagements: u64 = posts.iter().map(|p| p.engagements).sum();
            StructureStats {
                structure: structure.to_string(),
                posts: posts.len(),
                avg_impressions: ratio_round(impressions, posts.len()),
                avg_engagement_rate: rate_pct(engagements, impressions),
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.avg_impressions
            .cmp(&a.avg_impressions)
            .then_with(|| a.structure.cmp(&b.structure))
    });
    stats
}

fn rate_pct(engagements: u64, impressions: u64) -> f64 {
    if impressions == 0 {
        0.0
    } else {
        engagements as f64 / impressions as f64 * 100.0
    }
}

/// AI-score accuracy proxy over posts carrying both an AI score and real
/// engagement. The realized score is the post's impressions scaled against
/// the week's best post onto a 1–10 scale.
fn score_accuracy(originals: &[PostRecord]) -> Option<ScoreAccuracy> {
    let max_impressions = originals.iter().map(|p| p.impressions).max().unwrap_or(0).max(1);

    let mut comparisons: Vec<ScoreComparison> = originals
        .iter()
        .filter_map(|p| {
            let ai = p.ai_score?;
            let real = (p.impressions as f64 / max_impressions as f64 * 10.0)
                .round()
                .clamp(1.0, 10.0);
            Some(ScoreComparison {
                text: p.text.chars().take(45).collect(),
                ai,
                real,
                diff: ai - real,
                impressions: p.impressions,
                pillar: p.pillar.clone(),
                source: p.source,
            })
        })
        .collect();

    if comparisons.is_empty() {
        return None;
    }
    comparisons.sort_by(|a, b| b.impressions.cmp(&a.impressions));

    let mean_abs_diff =
        comparisons.iter().map(|c| c.diff.abs()).sum::<f64>() / comparisons.len() as f64;
    Some(ScoreAccuracy {
        comparisons,
        mean_abs_diff,
    })
}
