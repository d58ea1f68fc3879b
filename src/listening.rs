//! Social-listening collaborator: keyed advanced search over live posts,
//! used by the research fetch.
//!
//! Queries are grouped into four research prompts. Each query keeps only
//! its top few results, duplicates are dropped across queries, and a short
//! delay separates calls to respect the collaborator's rate limits.

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::{SEARCH_DELAY_MS, SEARCH_RESULTS_PER_QUERY};
use crate::content::Account;
use crate::research::{ResearchItem, ResearchLog, ResearchStatus, SourceEngagement};

/// One predefined research prompt: a labeled group of search queries.
#[derive(Debug, Clone, Copy)]
pub struct ResearchPrompt {
    pub id: &'static str,
    pub label: &'static str,
    pub queries: &'static [(&'static str, &'static str)],
}

/// The four research prompt groups.
pub const RESEARCH_PROMPTS: &[ResearchPrompt] = &[
    ResearchPrompt {
        id: "crypto",
        label: "Crypto",
        queries: &[
            ("crypto news min_faves:500", "Crypto News"),
            ("crypto scam OR rug OR hack min_faves:200", "Scams & Rugs"),
            ("crypto drama OR controversy min_faves:300", "CT Drama"),
            ("new token launch OR airdrop crypto min_faves:200", "New Trends"),
        ],
    },
    ResearchPrompt {
        id: "marketing",
        label: "Marketing",
        queries: &[
            ("marketing strategy OR growth hack min_faves:500", "Growth Strategies"),
            ("personal branding OR content creation min_faves:300", "Personal Brand"),
            ("viral campaign OR case study marketing min_faves:300", "Viral Campaigns"),
            ("audience building OR creator economy min_faves:200", "Creator Economy"),
        ],
    },
    ResearchPrompt {
        id: "trading",
        label: "Trading",
        queries: &[
            ("from:robert_ruszala OR from:IncomeSharks OR from:omzcharts", "Trading Accounts"),
            ("bitcoin technical analysis min_faves:300", "BTC Analysis"),
            ("crypto trade setup OR risk management min_faves:200", "Trade Setups"),
            ("market structure OR support resistance crypto min_faves:200", "Market Structure"),
        ],
    },
    ResearchPrompt {
        id: "controversy",
        label: "Controversy",
        queries: &[
            ("controversial take OR hot take min_faves:1000", "Hot Takes"),
            ("drama OR scandal viral min_faves:2000", "Viral Drama"),
            ("unpopular opinion min_faves:500", "Unpopular Opinions"),
            ("ratio OR call out min_faves:1000", "Ratio & Callouts"),
        ],
    },
];

#[derive(Debug, Clone, Deserialize)]
pub struct FoundPost {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: Option<FoundAuthor>,
    #[serde(rename = "viewCount", default)]
    pub view_count: u64,
    #[serde(rename = "likeCount", default)]
    pub like_count: u64,
    #[serde(rename = "replyCount", default)]
    pub reply_count: u64,
    #[serde(rename = "retweetCount", default)]
    pub retweet_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoundAuthor {
    #[serde(rename = "userName", default)]
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tweets: Vec<FoundPost>,
}

/// Search API client.
#[derive(Debug, Clone)]
pub struct ListeningClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ListeningClient {
    /// Build a client from configuration; `None` without an API key.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.listening_api_key.clone()?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .expect("Failed to build HTTP client");
        Some(Self {
            client,
            base_url: config.listening_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Run one ranked search.
    ///
    /// # Errors
    ///
    /// Fails on network errors or a non-2xx status.
    pub async fn search(&self, query: &str) -> Result<Vec<FoundPost>> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = format!(
            "{}/twitter/tweet/advanced_search?query={encoded}&queryType=Top",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .context("Failed to reach search API")?;
        if !response.status().is_success() {
            anyhow::bail!("search failed with status {}", response.status());
        }
        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to decode search response")?;
        Ok(parsed.tweets)
    }

    /// Run a whole research prompt and land the results in the inbox.
    ///
    /// A failing query is skipped, not fatal. Returns how many items were
    /// added; zero means nothing was found across all queries.
    pub async fn fetch_research(
        &self,
        prompt: &ResearchPrompt,
        account: Account,
        log: &mut ResearchLog,
        mut progress: impl FnMut(&str),
    ) -> usize {
        let mut found: Vec<FoundPost> = Vec::new();
        for (i, (query, label)) in prompt.queries.iter().enumerate() {
            progress(label);
            match self.search(query).await {
                Ok(posts) => {
                    let fresh: Vec<FoundPost> = posts
                        .into_iter()
                        .take(SEARCH_RESULTS_PER_QUERY)
                        .filter(|p| !found.iter().any(|f| f.id == p.id))
                        .collect();
                    debug!(query = label, kept = fresh.len(), "search results");
                    found.extend(fresh);
                }
                Err(e) => warn!(query = label, error = %e, "search query failed, skipping"),
            }
            if i + 1 < prompt.queries.len() {
                sleep(Duration::from_millis(SEARCH_DELAY_MS)).await;
            }
        }

        for post in &found {
            log.add(research_item_from_post(post, account, prompt.id));
        }
        found.len()
    }
}

fn research_item_from_post(post: &FoundPost, account: Account, prompt_id: &str) -> ResearchItem {
    let author = post
        .author
        .as_ref()
        .map(|a| a.user_name.clone())
        .unwrap_or_default();
    let source_url = if post.url.is_empty() {
        format!("https://x.com/{author}/status/{}", post.id)
    } else {
        post.url.clone()
    };
    let headline: String = post.text.chars().take(100).collect::<String>().replace('\n', " ");
    let description = format!(
        "{} views · {} likes · {} replies · {} RTs",
        post.view_count, post.like_count, post.reply_count, post.retweet_count
    );

    ResearchItem {
        id: 0,
        date: chrono::Utc::now().date_naive(),
        source_url,
        author,
        original_post: post.text.clone(),
        headline,
        description,
        account,
        status: ResearchStatus::Inbox,
        source: prompt_id.to_string(),
        engagement: SourceEngagement {
            views: post.view_count,
            likes: post.like_count,
            replies: post.reply_count,
            retweets: post.retweet_count,
        },
        variants: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_groups() {
        assert_eq!(RESEARCH_PROMPTS.len(), 4);
        for prompt in RESEARCH_PROMPTS {
            assert_eq!(prompt.queries.len(), 4, "{}", prompt.id);
        }
    }

    #[test]
    fn test_item_from_post_builds_fallback_url() {
        let post = FoundPost {
            id: "123".to_string(),
            url: String::new(),
            text: "some finding\nwith newline".to_string(),
            author: Some(FoundAuthor {
                user_name: "someone".to_string(),
            }),
            view_count: 1000,
            like_count: 50,
            reply_count: 5,
            retweet_count: 8,
        };
        let item = research_item_from_post(&post, Account::Primary, "crypto");
        assert_eq!(item.source_url, "https://x.com/someone/status/123");
        assert_eq!(item.headline, "some finding with newline");
        assert_eq!(item.description, "1000 views · 50 likes · 5 replies · 8 RTs");
        assert_eq!(item.source, "crypto");
    }
}
