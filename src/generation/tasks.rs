//! Single-purpose LLM tasks around the pipeline: research variants,
//! classification of unmatched analytics posts, per-post scoring, rewrite
//! and fix flows, cross-account translation, and the weekly report.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::analytics::aggregate::summarize;
use crate::analytics::{PostRecord, PostSource, WeeklySnapshot};
use crate::constants::{BATCH_DELAY_MS, BULK_GENERATE_CAP};
use crate::content::{Account, ContentItem, ContentPipeline, PipelineError};
use crate::llm::parse::{json_payload, Parsed};
use crate::llm::{ContentPart, LlmClient, MessageContent};
use crate::research::{ResearchItem, ResearchLog, ResearchStatus, Variant};

use super::persona;

const VARIANT_MAX_TOKENS: u32 = 3000;
const CLASSIFY_MAX_TOKENS: u32 = 1000;
const SCORE_MAX_TOKENS: u32 = 300;
const REWRITE_MAX_TOKENS: u32 = 600;
const FIX_MAX_TOKENS: u32 = 800;
const TRANSLATE_MAX_TOKENS: u32 = 800;
const REPORT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Deserialize)]
struct VariantPayload {
    #[serde(default)]
    post: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    structure: String,
    #[serde(default)]
    score: f64,
}

/// Generate four differently-angled post variants for a research item.
///
/// # Errors
///
/// Fails on request errors or an unparseable response; the item stays in
/// its current status and can be retried.
pub async fn generate_variants(llm: &LlmClient, item: &ResearchItem) -> Result<Vec<Variant>> {
    let mut context_block = format!("Headline: {}\n", item.headline);
    if !item.original_post.is_empty() {
        let excerpt: String = item.original_post.chars().take(500).collect();
        context_block.push_str(&format!("Original content: {excerpt}\n"));
    }
    if !item.author.is_empty() {
        context_block.push_str(&format!("Author: {}\n", item.author));
    }
    if !item.description.is_empty() {
        context_block.push_str(&format!("Context: {}\n", item.description));
    }

    let pillars = item.account.pillars().join("|");
    let prompt = format!(
        "Create 4 different post variants based on this research item. Each variant should \
take a DIFFERENT angle, use a DIFFERENT post structure, and vary in length.\n\n\
RESEARCH ITEM:\n{context_block}\n\
VARIANT REQUIREMENTS:\n\
- V1: Short & punchy (under 280 chars) — hot take or observation\n\
- V2: Medium (300-500 chars) — more context, story, or breakdown\n\
- V3: Contrarian angle — opposite or unexpected perspective\n\
- V4: Educational/actionable — teach something from this\n\n\
Each must feel like a different post, not rephrased versions of the same idea.\n\n\
Respond ONLY with valid JSON array, no markdown:\n\
[{{\"post\":\"text\",\"category\":\"{pillars}\",\"structure\":\"Structure Name\",\"score\":7}}]"
    );

    let text = llm
        .complete(
            Some(persona(item.account)),
            &MessageContent::Text(prompt),
            VARIANT_MAX_TOKENS,
        )
        .await?;

    let parsed: Parsed<Vec<VariantPayload>> = json_payload(&text);
    match parsed {
        Parsed::Ok(payloads) => Ok(payloads
            .into_iter()
            .map(|v| Variant {
                post: v.post,
                category: if v.category.is_empty() {
                    item.account.default_pillar().to_string()
                } else {
                    v.category
                },
                structure: v.structure,
                score: v.score,
            })
            .collect()),
        Parsed::Failed { error } => bail!("error parsing variants response: {error}"),
    }
}

/// Outcome of a bulk variant-generation run over the inbox.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub processed: usize,
    pub failed: usize,
}

/// Generate variants for every inbox item of an account, capped per run,
/// with a short delay between calls. Failures skip the item and continue.
pub async fn bulk_generate(
    llm: &LlmClient,
    log: &mut ResearchLog,
    account: Account,
    mut progress: impl FnMut(usize, usize, &str),
) -> BulkOutcome {
    let ids: Vec<u64> = log
        .by_status(account, ResearchStatus::Inbox)
        .iter()
        .take(BULK_GENERATE_CAP)
        .map(|i| i.id)
        .collect();

    let mut outcome = BulkOutcome::default();
    let total = ids.len();
    for (done, id) in ids.into_iter().enumerate() {
        let Some(item) = log.get(id).cloned() else {
            continue;
        };
        progress(done + 1, total, &item.headline);

        match generate_variants(llm, &item).await {
            Ok(variants) => {
                if log.attach_variants(id, variants).is_ok() {
                    outcome.processed += 1;
                }
            }
            Err(e) => {
                warn!(id, error = %e, "variant generation failed, skipping item");
                outcome.failed += 1;
            }
        }
        if done + 1 < total {
            sleep(Duration::from_millis(BATCH_DELAY_MS)).await;
        }
    }
    outcome
}

#[derive(Debug, Deserialize)]
struct ClassifyPayload {
    idx: usize,
    #[serde(default)]
    pillar: String,
    #[serde(default)]
    structure: String,
    #[serde(default)]
    score: Option<f64>,
}

/// Classify unmatched (spontaneous) analytics posts: pillar, structure and
/// an estimated score each. Applies results in place and returns how many
/// records were labeled.
///
/// # Errors
///
/// Fails on request errors or an unparseable response; records keep their
/// spontaneous tag and stay unlabeled, which downstream treats as normal.
pub async fn classify_spontaneous(llm: &LlmClient, records: &mut [PostRecord]) -> Result<usize> {
    let targets: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.source == PostSource::Spontaneous && r.pillar.is_none())
        .map(|(i, _)| i)
        .collect();
    if targets.is_empty() {
        return Ok(0);
    }

    let texts = targets
        .iter()
        .enumerate()
        .map(|(i, &rec)| {
            let excerpt: String = records[rec].text.chars().take(150).collect();
            format!("[{i}] \"{excerpt}\"")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Classify these posts.\n\
For each: pillar (growth|market|lifestyle|busting|shitpost), structure \
(framework|contrarian|personal|thread|observation|question|callout), score (1-10).\n\n\
Posts:\n{texts}\n\n\
JSON array only: [{{\"idx\":0,\"pillar\":\"growth\",\"structure\":\"framework\",\"score\":7}}]"
    );

    let text = llm.complete_text(None, prompt, CLASSIFY_MAX_TOKENS).await?;
    let parsed: Parsed<Vec<ClassifyPayload>> = json_payload(&text);
    match parsed {
        Parsed::Ok(payloads) => {
            let mut labeled = 0;
            for payload in payloads {
                let Some(&rec) = targets.get(payload.idx) else {
                    continue;
                };
                let record = &mut records[rec];
                if !payload.pillar.is_empty() {
                    record.pillar = Some(payload.pillar);
                }
                if !payload.structure.is_empty() {
                    record.structure = Some(payload.structure);
                }
                if record.ai_score.is_none() {
                    record.ai_score = payload.score;
                }
                labeled += 1;
            }
            Ok(labeled)
        }
        Parsed::Failed { error } => bail!("error parsing classification response: {error}"),
    }
}

/// A single-post score with explanation notes.
#[derive(Debug, Deserialize)]
pub struct ScoreResult {
    #[serde(deserialize_with = "score_as_string")]
    pub score: String,
    #[serde(default)]
    pub notes: String,
}

fn score_as_string<'de, D: serde::Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Score one post 1–10, optionally weighing an attached image.
///
/// Returns `Ok(None)` when the response does not parse; scoring is
/// best-effort and an unscored post stays valid.
pub async fn auto_score(
    llm: &LlmClient,
    post: &str,
    category: &str,
    image: Option<(&str, &[u8])>,
) -> Result<Option<ScoreResult>> {
    if post.is_empty() {
        return Ok(None);
    }

    let image_note = if image.is_some() {
        "\nThis post includes an attached image (shown above). Consider the image's quality, \
relevance, humor, and engagement potential in your scoring."
    } else {
        ""
    };
    let prompt = format!(
        "Score this post 1-10 and explain briefly.\n\n\
Post: \"{post}\"\nCategory: {category}{image_note}\n\n\
CRITERIA: voice authenticity, specificity, engagement potential, framework invisibility, \
pillar fit.\n9-10: viral. 7-8: solid. 5-6: generic. 1-4: weak/AI.\n\n\
Respond ONLY in JSON: {{\"score\": 7.5, \"notes\": \"one sentence why + one concrete \
improvement suggestion\"}}"
    );

    let content = match image {
        Some((media_type, bytes)) => MessageContent::Parts(vec![
            ContentPart::image(media_type, bytes),
            ContentPart::text(prompt),
        ]),
        None => MessageContent::Text(prompt),
    };

    let text = llm.complete(None, &content, SCORE_MAX_TOKENS).await?;
    Ok(json_payload::<ScoreResult>(&text).ok())
}

#[derive(Debug, Deserialize)]
pub struct Rewrite {
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub structure: String,
}

/// Rewrite a post applying the user's feedback.
pub async fn rewrite_post(
    llm: &LlmClient,
    item: &ContentItem,
    feedback: &str,
) -> Result<Option<Rewrite>> {
    let prompt = format!(
        "Rewrite this post based on the feedback below.\n\n\
ORIGINAL POST:\n\"{post}\"\n\nCATEGORY: {category}\nSTRUCTURE: {structure}\n\n\
USER FEEDBACK:\n{feedback}\n\n\
Keep the same category and general topic but apply the feedback. Write an improved \
version that stays close to the original intent.\n\n\
Respond ONLY with JSON: {{\"post\": \"rewritten text\", \"structure\": \"Structure Name\"}}",
        post = item.post,
        category = item.category,
        structure = item.structure,
    );
    let text = llm
        .complete(
            Some(persona(item.account)),
            &MessageContent::Text(prompt),
            REWRITE_MAX_TOKENS,
        )
        .await?;
    Ok(json_payload::<Rewrite>(&text).ok().filter(|r| !r.post.is_empty()))
}

/// Replace the original draft with its rewrite: the original is deleted
/// and a new DRAFT carrying the feedback note takes its place.
pub fn apply_rewrite(
    pipeline: &mut ContentPipeline,
    original_id: u64,
    feedback: &str,
    rewrite: Rewrite,
) -> Result<u64, PipelineError> {
    let original = pipeline.delete(original_id)?;
    let id = pipeline.allocate_id();
    let mut item = ContentItem::draft(id, original.account, rewrite.post);
    item.category = original.category;
    item.structure = if rewrite.structure.is_empty() {
        original.structure
    } else {
        rewrite.structure
    };
    let excerpt: String = feedback.chars().take(60).collect();
    item.notes = format!("rewrite of #{original_id}: \"{excerpt}\"");
    pipeline.add(item);
    Ok(id)
}

#[derive(Debug, Deserialize)]
pub struct Fix {
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub changes: String,
}

/// Polish a post: grammar, style, voice. Minor improvements only.
pub async fn fix_post(llm: &LlmClient, item: &ContentItem) -> Result<Option<Fix>> {
    let prompt = format!(
        "Fix this post.\n\nORIGINAL POST:\n\"{post}\"\n\nCATEGORY: {category}\n\n\
INSTRUCTIONS:\n\
- fix grammar and stylistic errors\n\
- translate to English if needed — make it sound natural and logical in English\n\
- only make minor improvements UNLESS a better hook would significantly improve it\n\
- if adding a hook or twist, keep the original message intact\n\
- keep the same length roughly — the fixed version should feel like a polished version \
of the original, not a rewrite\n\n\
Respond ONLY with JSON: {{\"post\": \"fixed text\", \"changes\": \"brief note what you \
changed (1 sentence)\"}}",
        post = item.post,
        category = item.category,
    );
    let text = llm
        .complete(
            Some(persona(item.account)),
            &MessageContent::Text(prompt),
            FIX_MAX_TOKENS,
        )
        .await?;
    Ok(json_payload::<Fix>(&text).ok().filter(|f| !f.post.is_empty()))
}

/// Apply a fix in place, appending a `fixed:` note. The caller re-scores
/// the post afterwards.
pub fn apply_fix(pipeline: &mut ContentPipeline, id: u64, fix: &Fix) -> Result<(), PipelineError> {
    let changes: String = fix.changes.chars().take(80).collect();
    let existing = pipeline.get(id).ok_or(PipelineError::UnknownItem(id))?;
    let notes = if existing.notes.is_empty() {
        format!("fixed: {changes}")
    } else {
        format!("{} | fixed: {changes}", existing.notes)
    };
    pipeline.edit_text(id, &fix.post)?;
    pipeline.set_notes(id, &notes)
}

#[derive(Debug, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub category: String,
}

/// Translate a post into the other account's language and voice.
pub async fn translate_post(llm: &LlmClient, item: &ContentItem) -> Result<Option<Translation>> {
    let target = item.account.other();
    let mapped_category = if target.pillars().contains(&item.category.as_str()) {
        item.category.clone()
    } else {
        target.pillars()[0].to_string()
    };

    let prompt = match target {
        Account::Secondary => format!(
            "Przetłumacz ten post z angielskiego na polski. Dostosuj do głosu henryka:\n\
- zawsze małe litery, bez kropek na końcu, bez emoji, bez hashtagów\n\
- \">\" jako bullet point\n\
- NIGDY nie używaj \"fam\"\n\
- terminy crypto/AI zostaw po angielsku jeśli nie mają dobrego polskiego odpowiednika\n\
- nie tłumacz dosłownie — adaptuj naturalnie do polskiego X\n\n\
POST DO PRZETŁUMACZENIA:\n\"{post}\"\n\n\
ODPOWIEDZ TYLKO JSON: {{\"post\": \"przetłumaczony tekst\", \"category\": \"{mapped_category}\"}}",
            post = item.post,
        ),
        Account::Primary => format!(
            "Translate this post from Polish to English. Adapt to the django voice:\n\
- always lowercase, no dots at end, no emoji, no hashtags\n\
- \">\" for bullet points\n\
- use \"fam\" sparingly (only if it fits naturally)\n\
- keep crypto/AI terms as-is\n\
- don't translate literally — adapt naturally for English CT\n\n\
POST TO TRANSLATE:\n\"{post}\"\n\n\
RESPOND ONLY with JSON: {{\"post\": \"translated text\", \"category\": \"{mapped_category}\"}}",
            post = item.post,
        ),
    };

    let text = llm.complete_text(None, prompt, TRANSLATE_MAX_TOKENS).await?;
    Ok(json_payload::<Translation>(&text)
        .ok()
        .filter(|t| !t.post.is_empty())
        .map(|mut t| {
            if t.category.is_empty() {
                t.category = mapped_category;
            }
            t
        }))
}

/// Add a translation to the other account as a new DRAFT.
pub fn apply_translation(
    pipeline: &mut ContentPipeline,
    source: &ContentItem,
    translation: Translation,
) -> u64 {
    let target = source.account.other();
    let id = pipeline.allocate_id();
    let mut item = ContentItem::draft(id, target, translation.post);
    item.category = translation.category;
    item.structure = source.structure.clone();
    item.notes = format!("translated from {}", source.account.handle());
    item.source = "translated".to_string();
    item.image_url = source.image_url.clone();
    pipeline.add(item);
    id
}

/// Generate the strategist's weekly report over a week's aggregates.
pub async fn weekly_report(
    llm: &LlmClient,
    week: &str,
    snapshot: &WeeklySnapshot,
) -> Result<String> {
    let summary = summarize(week, snapshot);

    let pillar_lines = summary
        .pillars
        .iter()
        .map(|p| format!("{}: {}x, avg {} imp", p.pillar, p.posts, p.avg_impressions))
        .collect::<Vec<_>>()
        .join("\n");

    let mut top = snapshot.originals.iter().collect::<Vec<_>>();
    top.sort_by(|a, b| b.impressions.cmp(&a.impressions));
    let top_lines = top
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, p)| {
            let excerpt: String = p.text.chars().take(100).collect();
            let source = match p.source {
                PostSource::Planned => "planned",
                PostSource::Spontaneous => "spontaneous",
            };
            format!(
                "{}. [{}imp {}L] {}/{} \"{}\"",
                i + 1,
                p.impressions,
                p.likes,
                source,
                p.pillar.as_deref().unwrap_or("untagged"),
                excerpt
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "You are the account's content strategist.\n\n\
WEEK: {week}\n\
Impressions: {imp} | Posts: {posts} ({planned} planned, {spont} spontaneous)\n\
Planned avg: {pl_avg} | Spont avg: {sp_avg}\n\n\
Pillars:\n{pillar_lines}\n\nTop 10:\n{top_lines}\n\n\
Give: 1)TL;DR 2)Planned vs Spontaneous 3)Pillar Performance 4)Structure Analysis \
5)Scoring Check 6)Top Insight 7)3 Action Items. Direct, lowercase, no fluff.",
        imp = summary.total_impressions,
        posts = summary.post_count,
        planned = summary.planned_count,
        spont = summary.spontaneous_count,
        pl_avg = summary.planned_avg_impressions,
        sp_avg = summary.spontaneous_avg_impressions,
    );

    llm.complete_text(None, prompt, REPORT_MAX_TOKENS)
        .await
        .context("weekly report request failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_rewrite_replaces_original() {
        let mut pipeline = ContentPipeline::new();
        let id = pipeline.allocate_id();
        let mut original = ContentItem::draft(id, Account::Primary, "original text".to_string());
        original.category = "market".to_string();
        original.structure = "Single Insight".to_string();
        pipeline.add(original);

        let new_id = apply_rewrite(
            &mut pipeline,
            id,
            "make it punchier",
            Rewrite {
                post: "rewritten text".to_string(),
                structure: String::new(),
            },
        )
        .unwrap();

        assert!(pipeline.get(id).is_none());
        let item = pipeline.get(new_id).unwrap();
        assert_eq!(item.post, "rewritten text");
        assert_eq!(item.category, "market");
        assert_eq!(item.structure, "Single Insight");
        assert!(item.notes.starts_with("rewrite of #1"));
    }

    #[test]
    fn test_apply_translation_lands_on_other_account() {
        let mut pipeline = ContentPipeline::new();
        let id = pipeline.allocate_id();
        let mut original = ContentItem::draft(id, Account::Primary, "bear markets are a gift".to_string());
        original.category = "market".to_string();
        pipeline.add(original);

        let source = pipeline.get(id).unwrap().clone();
        let new_id = apply_translation(
            &mut pipeline,
            &source,
            Translation {
                post: "bessa to prezent".to_string(),
                category: "market".to_string(),
            },
        );
        let item = pipeline.get(new_id).unwrap();
        assert_eq!(item.account, Account::Secondary);
        assert_eq!(item.source, "translated");
        assert_eq!(item.notes, "translated from @django_crypto");
    }

    #[test]
    fn test_score_result_accepts_number_or_string() {
        let a: ScoreResult = serde_json::from_str(r#"{"score": 7.5, "notes": "n"}"#).unwrap();
        assert_eq!(a.score, "7.5");
        let b: ScoreResult = serde_json::from_str(r#"{"score": "8", "notes": "n"}"#).unwrap();
        assert_eq!(b.score, "8");
    }
}
