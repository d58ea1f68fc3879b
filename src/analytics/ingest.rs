//! Turning uploaded CSV text into weekly snapshot data.

use tracing::debug;

use crate::csv::{parse_lines, CsvRow};
use crate::matching::{find_best_match, MatchCandidate};
use crate::week::detect_week;

use super::types::{DailyRow, PostRecord, PostSource};

/// A parsed content-CSV upload, before matching.
#[derive(Debug)]
pub struct ContentUpload {
    pub week: String,
    pub originals: Vec<PostRecord>,
    pub total_rows: usize,
    pub reply_count: usize,
}

/// Parse a per-post performance export.
///
/// Replies (text starting with `@`) and zero-impression rows are filtered
/// out; they dominate raw exports and carry no pillar signal. Everything
/// surviving starts out tagged spontaneous. Returns `None` on an empty
/// upload so the caller can report it instead of storing a hollow week.
#[must_use]
pub fn parse_content_csv(text: &str) -> Option<ContentUpload> {
    let rows = parse_lines(text);
    if rows.is_empty() {
        return None;
    }

    let week = detect_week(&rows);
    let total_rows = rows.len();
    let originals: Vec<PostRecord> = rows.iter().filter_map(post_record).collect();
    let reply_count = total_rows - originals.len();
    debug!(week = %week, kept = originals.len(), filtered = reply_count, "content CSV parsed");

    Some(ContentUpload {
        week,
        originals,
        total_rows,
        reply_count,
    })
}

fn post_record(row: &CsvRow) -> Option<PostRecord> {
    let text = row.get_any(&["Post text", "Tweet text"]);
    let impressions = row.num_any(&["Impressions", "impressions"]);
    if text.starts_with('@') || impressions == 0 {
        return None;
    }
    Some(PostRecord {
        id: row.get("Post id").to_string(),
        date: row.get("Date").to_string(),
        text: text.to_string(),
        link: row.get("Post Link").to_string(),
        impressions,
        likes: row.num_any(&["Likes", "likes"]),
        engagements: row.num_any(&["Engagements", "engagements"]),
        bookmarks: row.num_any(&["Bookmarks", "bookmarks"]),
        reposts: row.num_any(&["Reposts", "Retweets", "reposts"]),
        replies: row.num_any(&["Replies", "replies"]),
        follows: row.num("New follows"),
        pillar: None,
        structure: None,
        ai_score: None,
        source: PostSource::Spontaneous,
    })
}

/// Match records against tracked content, recovering pillar, structure and
/// score for everything above the similarity threshold.
///
/// Returns the number matched. Records left spontaneous are the caller's
/// AI-classification queue; an unmatched post is expected, not an error.
pub fn apply_matches(records: &mut [PostRecord], candidates: &[MatchCandidate]) -> usize {
    let mut matched = 0;
    for record in records.iter_mut() {
        match find_best_match(&record.text, candidates) {
            Some(hit) => {
                record.pillar = Some(hit.pillar.to_lowercase());
                record.structure = Some(hit.structure.to_lowercase());
                record.ai_score = hit.score.trim().parse().ok();
                record.source = PostSource::Planned;
                matched += 1;
            }
            None => {
                record.source = PostSource::Spontaneous;
            }
        }
    }
    matched
}

/// Parse a daily-overview export into (week, daily rows).
#[must_use]
pub fn parse_overview_csv(text: &str) -> Option<(String, Vec<DailyRow>)> {
    let rows = parse_lines(text);
    if rows.is_empty() {
        return None;
    }
    let week = detect_week(&rows);
    let daily = rows
        .iter()
        .map(|row| DailyRow {
            date: row.get("Date").to_string(),
            impressions: row.num("Impressions"),
            likes: row.num("Likes"),
            engagements: row.num("Engagements"),
            new_follows: row.num("New follows"),
            unfollows: row.num("Unfollows"),
        })
        .collect();
    Some((week, daily))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_CSV: &str = "\
Date,Post text,Impressions,Likes,Engagements,Replies
\"Thu, Feb 12, 2026\",\"bitcoin is dead fam do not fomo\",1200,40,90,3
\"Thu, Feb 12, 2026\",@someone thanks fam,300,5,10,1
\"Fri, Feb 13, 2026\",\"zero impression post here\",0,0,0,0
\"Fri, Feb 13, 2026\",\"patience is the only edge retail has\",800,22,31,2
";

    #[test]
    fn test_parse_content_filters_replies_and_zero_impressions() {
        let upload = parse_content_csv(CONTENT_CSV).unwrap();
        assert_eq!(upload.week, "2026-W07");
        assert_eq!(upload.total_rows, 4);
        assert_eq!(upload.originals.len(), 2);
        assert_eq!(upload.reply_count, 2);
        assert!(upload
            .originals
            .iter()
            .all(|p| p.source == PostSource::Spontaneous));
    }

    #[test]
    fn test_parse_content_empty_is_none() {
        assert!(parse_content_csv("").is_none());
        assert!(parse_content_csv("Date,Post text\n").is_none());
    }

    #[test]
    fn test_apply_matches_recovers_metadata() {
        let mut upload = parse_content_csv(CONTENT_CSV).unwrap();
        let candidates = vec![MatchCandidate {
            text: "bitcoin is dead fam do not fomo in".to_string(),
            pillar: "Market".to_string(),
            structure: "Contrarian take + reasoning".to_string(),
            score: "8".to_string(),
        }];
        let matched = apply_matches(&mut upload.originals, &candidates);
        assert_eq!(matched, 1);

        let hit = &upload.originals[0];
        assert_eq!(hit.source, PostSource::Planned);
        assert_eq!(hit.pillar.as_deref(), Some("market"));
        assert_eq!(hit.ai_score, Some(8.0));

        let miss = &upload.originals[1];
        assert_eq!(miss.source, PostSource::Spontaneous);
        assert!(miss.pillar.is_none());
    }

    #[test]
    fn test_parse_overview() {
        let csv = "\
Date,Impressions,Likes,Engagements,New follows,Unfollows
\"Thu, Feb 12, 2026\",5000,120,300,25,4
\"Fri, Feb 13, 2026\",4200,100,250,18,6
";
        let (week, daily) = parse_overview_csv(csv).unwrap();
        assert_eq!(week, "2026-W07");
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].new_follows, 25);
        assert_eq!(daily[1].unfollows, 6);
    }
}
