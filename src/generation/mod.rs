//! The weekly generation/scoring orchestrator.
//!
//! One completion request per pillar batch, issued strictly sequentially:
//! a deliberate throttle for the collaborator's rate limits, and it lets a
//! later batch's prompt reflect earlier outcomes if that is ever needed.
//! A batch whose response fails to parse is recorded and skipped; the run
//! continues. A second phase scores the accumulated posts in fixed-size
//! sub-batches; scoring failures leave scores blank, and unscored drafts
//! are still valid pipeline entries.

mod plan;
pub mod tasks;

pub use plan::{weekly_plan, BatchSpec};

use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::constants::{BATCH_DELAY_MS, SCORE_BATCH_SIZE, SHORT_POST_CHARS};
use crate::content::{Account, ContentItem, ContentPipeline, Tab};
use crate::llm::parse::{json_payload, Parsed};
use crate::llm::LlmClient;

/// Caps applied to prompt inputs.
const BRAND_VOICE_MAX: usize = 6000;
const LAST_ANALYSIS_MAX: usize = 1500;
const BAD_FEEDBACK_POSTS: usize = 10;

const GENERATION_MAX_TOKENS: u32 = 4000;
const SCORING_MAX_TOKENS: u32 = 2000;

/// Condensed voice personas. The uploaded brand-voice profile carries the
/// detail; these pin the non-negotiable rules.
const PRIMARY_PERSONA: &str = "\
You are django_xbt — crypto trader, AI enthusiast, personal brand builder on Twitter/X.

VOICE RULES:
- always lowercase (never caps except proper nouns)
- no dots at end of sentences, no emojis, no hashtags, no em dashes
- use \">\" for bullet points in lists
- use \"fam\" sparingly - max 1 in 5 posts, never forced
- short punchy sentences, mix with longer explanations
- sound human and authentic, NOT like AI
- be specific, opinionated, direct
- share personal experience (\"i did X\") rather than generic advice (\"you should X\")";

const SECONDARY_PERSONA: &str = "\
Jesteś henryk0x — ekspert od marketingu, entuzjasta AI, twórca na polskim X.

ZASADY GŁOSU:
- ZAWSZE PISZ PO POLSKU (wyjątek: crypto/AI terminy bez polskiego odpowiednika)
- zawsze małe litery, bez kropek na końcu zdań, bez emoji, bez hashtagów, bez em dashes
- \">\" jako bullet point w listach
- NIGDY nie używaj \"fam\" — to fraza Django, nie Henryka
- sporadycznie \"kłaniam się nisko\" jako zakończenie (max 1 na 10 postów)
- bądź konkretny, stanowczy, bezpośredni — żadnych generycznych porad";

/// Everything a weekly run is conditioned on besides the plan itself.
#[derive(Debug, Clone, Default)]
pub struct GenerationInputs {
    /// Uploaded voice/style profile text.
    pub brand_voice: String,
    /// Rejected posts with their rejection reasons, newest first.
    pub bad_feedback: Vec<(String, String)>,
    /// Free-form direction for the coming week.
    pub weekly_notes: String,
    /// The previous week's strategist report, when one was generated.
    pub last_analysis: String,
}

/// Progress events reported while a run is underway.
#[derive(Debug, Clone)]
pub enum GenProgress {
    /// Starting a pillar batch (1-based index).
    Batch {
        category: String,
        index: usize,
        total: usize,
        count: usize,
    },
    /// A pillar batch failed and was skipped.
    BatchFailed { category: String, error: String },
    /// Scoring a sub-batch covering `from..=to` of `total` (1-based).
    Scoring { from: usize, to: usize, total: usize },
    /// Run complete.
    Done { generated: usize },
}

/// What a finished run produced.
#[derive(Debug, Default)]
pub struct GenerationOutcome {
    /// Ids of the DRAFT items created.
    pub generated_ids: Vec<u64>,
    /// Pillar batches that failed, with the failure text.
    pub batch_errors: Vec<(String, String)>,
    /// Number of scoring sub-batches that failed.
    pub scoring_errors: usize,
}

#[derive(Debug, Deserialize)]
struct GeneratedPost {
    #[serde(default)]
    post: String,
    #[serde(default)]
    structure: String,
    #[serde(default)]
    subtopic: String,
    #[serde(default)]
    humor_structure: Option<String>,
    #[serde(default)]
    humor_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ScoreFeedback {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    feedback: String,
}

/// A generated post awaiting scoring and promotion to DRAFT.
#[derive(Debug)]
struct PendingPost {
    category: String,
    structure: String,
    post: String,
    notes: String,
    score: String,
}

/// Run a full weekly generation: sequential pillar batches, then scoring,
/// then promotion of everything that survived into DRAFT.
pub async fn generate_weekly(
    llm: &LlmClient,
    account: Account,
    inputs: &GenerationInputs,
    plan: &[BatchSpec],
    pipeline: &mut ContentPipeline,
    mut progress: impl FnMut(&GenProgress),
) -> GenerationOutcome {
    let mut outcome = GenerationOutcome::default();
    let mut pending: Vec<PendingPost> = Vec::new();

    for (index, batch) in plan.iter().enumerate() {
        progress(&GenProgress::Batch {
            category: batch.category.to_string(),
            index: index + 1,
            total: plan.len(),
            count: batch.count,
        });

        let prompt = build_batch_prompt(account, batch, inputs);
        let response = llm.complete_text(None, prompt, GENERATION_MAX_TOKENS).await;

        let parsed: Parsed<Vec<GeneratedPost>> = match response {
            Ok(text) => json_payload(&text),
            Err(e) => Parsed::Failed {
                error: format!("{e:#}"),
            },
        };

        match parsed {
            Parsed::Ok(posts) => {
                info!(category = batch.category, posts = posts.len(), "batch generated");
                for post in posts {
                    let notes = match (&post.humor_structure, post.humor_score) {
                        (Some(hs), Some(score)) if !hs.is_empty() => {
                            format!("humor: {hs} ({score}/10)")
                        }
                        _ => format!("subtopic: {}", post.subtopic),
                    };
                    pending.push(PendingPost {
                        category: batch.category.to_string(),
                        structure: post.structure,
                        post: post.post,
                        notes,
                        score: post.humor_score.map(fmt_score).unwrap_or_default(),
                    });
                }
            }
            Parsed::Failed { error } => {
                warn!(category = batch.category, error = %error, "batch failed, continuing");
                progress(&GenProgress::BatchFailed {
                    category: batch.category.to_string(),
                    error: error.clone(),
                });
                outcome.batch_errors.push((batch.category.to_string(), error));
            }
        }

        if index + 1 < plan.len() {
            sleep(Duration::from_millis(BATCH_DELAY_MS)).await;
        }
    }

    score_pending(llm, account, &mut pending, &mut outcome, &mut progress).await;

    for p in pending {
        let id = pipeline.allocate_id();
        let mut item = ContentItem::draft(id, account, p.post);
        item.tab = Tab::Draft;
        item.category = p.category;
        item.structure = p.structure;
        item.notes = p.notes;
        item.score = p.score;
        pipeline.add(item);
        outcome.generated_ids.push(id);
    }

    progress(&GenProgress::Done {
        generated: outcome.generated_ids.len(),
    });
    outcome
}

/// Score pending posts in fixed-size sub-batches. Failures leave the
/// affected posts unscored; an unscored draft is still a valid draft.
async fn score_pending(
    llm: &LlmClient,
    account: Account,
    pending: &mut [PendingPost],
    outcome: &mut GenerationOutcome,
    progress: &mut impl FnMut(&GenProgress),
) {
    let total = pending.len();
    let mut start = 0;
    while start < total {
        let end = (start + SCORE_BATCH_SIZE).min(total);
        progress(&GenProgress::Scoring {
            from: start + 1,
            to: end,
            total,
        });

        let batch = &mut pending[start..end];
        let prompt = build_scoring_prompt(account, start, batch);
        match llm.complete_text(None, prompt, SCORING_MAX_TOKENS).await {
            Ok(text) => {
                let parsed: Parsed<Vec<ScoreFeedback>> = json_payload(&text);
                match parsed {
                    Parsed::Ok(scores) => {
                        for (post, scored) in batch.iter_mut().zip(scores) {
                            if let Some(score) = scored.score {
                                post.score = fmt_score(score);
                            }
                            if !scored.feedback.is_empty() {
                                if post.notes.is_empty() {
                                    post.notes = scored.feedback;
                                } else {
                                    post.notes = format!("{} · {}", post.notes, scored.feedback);
                                }
                            }
                        }
                    }
                    Parsed::Failed { error } => {
                        warn!(error = %error, "scoring batch unparseable, leaving scores blank");
                        outcome.scoring_errors += 1;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "scoring batch failed, leaving scores blank");
                outcome.scoring_errors += 1;
            }
        }
        start = end;
    }
}

/// Up to ten rejected posts formatted as avoid-this feedback.
#[must_use]
pub fn collect_bad_feedback(pipeline: &ContentPipeline, account: Account) -> Vec<(String, String)> {
    pipeline
        .tab_items(account, Tab::Bad)
        .into_iter()
        .take(BAD_FEEDBACK_POSTS)
        .map(|item| (item.post.clone(), item.notes.clone()))
        .collect()
}

#[must_use]
pub fn persona(account: Account) -> &'static str {
    match account {
        Account::Primary => PRIMARY_PERSONA,
        Account::Secondary => SECONDARY_PERSONA,
    }
}

fn fmt_score(score: f64) -> String {
    if (score - score.trunc()).abs() < f64::EPSILON {
        format!("{}", score.trunc() as i64)
    } else {
        format!("{score}")
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn build_batch_prompt(account: Account, batch: &BatchSpec, inputs: &GenerationInputs) -> String {
    let subtopics = numbered(batch.subtopics);
    let structures = numbered(batch.structures);
    let voice = truncate(&inputs.brand_voice, BRAND_VOICE_MAX);

    let bad_feedback = if inputs.bad_feedback.is_empty() {
        String::new()
    } else {
        let block = inputs
            .bad_feedback
            .iter()
            .take(BAD_FEEDBACK_POSTS)
            .map(|(post, why)| format!("POST: \"{}\"\nWHY BAD: {}", truncate(post, 100), why))
            .collect::<Vec<_>>()
            .join("\n---\n");
        format!("=== POSTS THAT FAILED (avoid these patterns) ===\n{block}\n\n")
    };
    let weekly_notes = if inputs.weekly_notes.is_empty() {
        String::new()
    } else {
        format!(
            "=== WEEKLY NOTES (follow these directions) ===\n{}\n\n",
            inputs.weekly_notes
        )
    };
    let last_analysis = if inputs.last_analysis.is_empty() {
        String::new()
    } else {
        format!(
            "=== LAST WEEK'S ANALYSIS (apply these insights) ===\n{}\n\n",
            truncate(&inputs.last_analysis, LAST_ANALYSIS_MAX)
        )
    };

    let humor_fields = if batch.category == "shitposting" {
        ", \"humor_structure\": \"name or null\", \"humor_score\": 0"
    } else {
        ""
    };

    format!(
        "{persona}\n\nYOUR BRAND VOICE:\n{voice}\n\n\
=== CATEGORY: {category} ===\n\n\
SUBTOPICS (ROTATE across all — each post different subtopic):\n{subtopics}\n\n\
AVAILABLE POST STRUCTURES (vary across posts):\n{structures}\n\n\
=== ADVISOR SYSTEM ===\n{advisor}\n\n\
{bad_feedback}{weekly_notes}{last_analysis}\
=== TASK ===\n\
Generate exactly {count} original posts for the \"{category}\" pillar.\n\n\
CRITICAL RULES:\n\
- ROTATE subtopics — each post DIFFERENT subtopic (no repeats)\n\
- VARY structures — don't use same structure twice in a row\n\
- LENGTH DISTRIBUTION: exactly 50% of posts MUST be under {short} characters \
(short, punchy). the other 50% should be 300-700 characters. alternate between short and long\n\
- sound like it was written at 2am by a human, not generated by AI\n\
- if using a framework/advisor, it must be INVISIBLE — never name it\n\n\
RESPOND ONLY with valid JSON array:\n\
[{{\"post\": \"the actual post text\", \"structure\": \"Structure Name\", \"subtopic\": \"subtopic used\"{humor_fields}}}]",
        persona = persona(account),
        category = batch.category,
        advisor = batch.advisor,
        count = batch.count,
        short = SHORT_POST_CHARS,
    )
}

fn build_scoring_prompt(account: Account, offset: usize, batch: &[PendingPost]) -> String {
    let posts_text = batch
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{}. [{}/{}] \"{}\"",
                offset + i + 1,
                p.category,
                p.notes,
                truncate(&p.post, 200)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{persona}\n\n\
You are the account's content strategist and honest critic. Score these posts.\n\n\
SCORING CRITERIA:\n\
- Does it sound like the account owner actually wrote this? (voice authenticity)\n\
- Is it specific and opinionated? (not generic advice anyone could write)\n\
- Would it get engagement? (viral potential)\n\
- Is the framework/advisor thinking invisible? (should feel natural)\n\n\
SCORE:\n\
- 9-10: exceptional, screenshot-worthy, would go viral\n\
- 7-8: solid engagement, strong authentic take\n\
- 5-6: decent but could be anyone's post\n\
- 1-4: generic, sounds like AI, or misses the voice entirely\n\n\
POSTS:\n{posts_text}\n\n\
RESPOND ONLY with JSON array, one per post in order:\n\
[{{\"score\": 7.5, \"feedback\": \"brief specific feedback + improvement suggestion\"}}]",
        persona = persona(account),
    )
}

fn numbered(items: &[&str]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {s}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
