//! Shared constants: account catalogs, content taxonomies, tuning knobs.

/// Handle of the primary (English) account.
pub const ACCOUNT_PRIMARY: &str = "@django_crypto";

/// Handle of the secondary (Polish) account.
pub const ACCOUNT_SECONDARY: &str = "@henryk0x";

/// Content pillars for the primary account.
pub const PILLARS_PRIMARY: &[&str] = &["growth", "market", "lifestyle", "busting", "shitposting"];

/// Content pillars for the secondary account.
pub const PILLARS_SECONDARY: &[&str] =
    &["market", "busting", "shitposting", "growth", "ai", "lifestyle"];

/// Sheet tab names, in lifecycle order.
pub const TAB_ORDER: &[&str] = &["DRAFT", "POST", "USED", "DATABASE", "BAD"];

/// Catalog of post structure templates.
pub const STRUCTURES: &[&str] = &[
    "Problem → Insight → Action",
    "Framework (3 steps)",
    "Contrarian take + reasoning",
    "Personal story + lesson",
    "Myth busting + truth",
    "Before/After transformation",
    "Tactical how-to",
    "Market observation + prediction",
    "Trend analysis + context",
    "Data + interpretation",
    "Mindset shift",
    "Discipline story",
    "Health/productivity tip",
    "One-liner / Hot take",
    "Meme / Relatable",
    "Thread opener",
];

/// Days of the week used for POST scheduling, in sort order.
pub const DAY_ORDER: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

// Fuzzy matcher tuning. Thresholds are deliberately permissive: a missed
// match only loses recovered metadata, while a false positive mislabels
// performance data.

/// Normalized texts shorter than this are never matched.
pub const MATCH_MIN_LEN: usize = 10;

/// Comparison length cap applied during normalization.
pub const NORMALIZE_LEN: usize = 60;

/// Minimum prefix-containment ratio for a match.
pub const PREFIX_RATIO_MIN: f64 = 0.5;

/// Character window for the positional-overlap strategy.
pub const OVERLAP_WINDOW: usize = 50;

/// Minimum window length for the positional-overlap strategy to apply.
pub const OVERLAP_MIN_LEN: usize = 15;

/// Minimum positional-overlap ratio for a match.
pub const OVERLAP_RATIO_MIN: f64 = 0.75;

/// Posts per scoring request.
pub const SCORE_BATCH_SIZE: usize = 10;

/// Pause between pillar batch requests, to stay under collaborator rate limits.
pub const BATCH_DELAY_MS: u64 = 500;

/// Pause between social-listening search queries.
pub const SEARCH_DELAY_MS: u64 = 300;

/// Results kept per social-listening query.
pub const SEARCH_RESULTS_PER_QUERY: usize = 5;

/// Cap on research items processed by one bulk-generate run.
pub const BULK_GENERATE_CAP: usize = 10;

/// Character threshold separating short-form from long-form posts.
pub const SHORT_POST_CHARS: usize = 280;

/// Candidate rows fetched from the row store for analytics matching.
pub const MATCH_CANDIDATE_LIMIT: usize = 500;
