//! Persistence collaborator: a REST-style row store with simple
//! query-string filters, plus binary object upload for post images.
//!
//! The store is a convenience mirror, not the system of record during a
//! session. The `mirror_*` methods implement the eventual-mirror policy:
//! local state is updated first and is authoritative; a failed mirror write
//! is logged and swallowed, never surfaced as a user-visible error.

use anyhow::{Context, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::MATCH_CANDIDATE_LIMIT;
use crate::content::{Account, ContentItem, EngagementMetrics, Tab};
use crate::matching::MatchCandidate;

const IMAGE_BUCKET: &str = "post-images";

/// A `posts` table row in store column naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub tab: String,
    pub category: String,
    pub structure: String,
    pub post: String,
    pub notes: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub score: String,
    #[serde(default)]
    pub how_to_fix: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub post_link: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub impressions: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub likes: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub engagements: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub bookmarks: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub replies: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub reposts: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub profile_visits: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub new_follows: String,
    #[serde(deserialize_with = "string_or_number", default)]
    pub url_clicks: String,
    pub account: String,
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

impl PostRow {
    /// Row for mirroring a local item (no id; the store assigns one).
    #[must_use]
    pub fn from_item(item: &ContentItem) -> Self {
        Self {
            id: None,
            tab: item.tab.as_str().to_string(),
            category: item.category.clone(),
            structure: item.structure.clone(),
            post: item.post.clone(),
            notes: item.notes.clone(),
            score: item.score.clone(),
            how_to_fix: item.how_to_fix.clone(),
            day: item.day.clone(),
            source: item.source.clone(),
            image_url: item.image_url.clone(),
            post_link: item.post_link.clone(),
            impressions: item.metrics.impressions.clone(),
            likes: item.metrics.likes.clone(),
            engagements: item.metrics.engagements.clone(),
            bookmarks: item.metrics.bookmarks.clone(),
            replies: item.metrics.replies.clone(),
            reposts: item.metrics.reposts.clone(),
            profile_visits: item.metrics.profile_visits.clone(),
            new_follows: item.metrics.new_follows.clone(),
            url_clicks: item.metrics.url_clicks.clone(),
            account: item.account.handle().to_string(),
        }
    }

    /// Rebuild a content item from a stored row, under a fresh local id.
    #[must_use]
    pub fn into_item(self, local_id: u64) -> ContentItem {
        ContentItem {
            id: local_id,
            tab: Tab::from_str(&self.tab).unwrap_or(Tab::Draft),
            category: self.category,
            structure: self.structure,
            post: self.post,
            notes: self.notes,
            score: self.score,
            how_to_fix: self.how_to_fix,
            day: self.day,
            account: Account::from_handle(&self.account).unwrap_or(Account::Primary),
            source: self.source,
            image_url: self.image_url,
            post_link: self.post_link,
            metrics: EngagementMetrics {
                impressions: self.impressions,
                likes: self.likes,
                engagements: self.engagements,
                bookmarks: self.bookmarks,
                replies: self.replies,
                reposts: self.reposts,
                profile_visits: self.profile_visits,
                new_follows: self.new_follows,
                url_clicks: self.url_clicks,
            },
            store_id: self.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    #[serde(default)]
    post: String,
    #[serde(deserialize_with = "string_or_number", default)]
    category: String,
    #[serde(deserialize_with = "string_or_number", default)]
    structure: String,
    #[serde(deserialize_with = "string_or_number", default)]
    score: String,
}

#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: i64,
}

/// Row store client.
#[derive(Debug, Clone)]
pub struct RowStore {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl RowStore {
    /// Build a client from configuration. `None` when the store is not
    /// configured; the session then runs in local-only mode.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        let base_url = config.store_url.clone()?;
        let key = config.store_key.clone()?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .expect("Failed to build HTTP client");
        Some(Self {
            client,
            base_url,
            key,
        })
    }

    fn table_url(&self, table: &str, params: &str) -> String {
        if params.is_empty() {
            format!("{}/rest/v1/{table}", self.base_url)
        } else {
            format!("{}/rest/v1/{table}?{params}", self.base_url)
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    /// Fetch rows from a table with a raw query-string filter
    /// (`column=eq.value` style).
    pub async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        params: &str,
    ) -> Result<Vec<T>> {
        let response = self
            .authed(self.client.get(self.table_url(table, params)))
            .send()
            .await
            .with_context(|| format!("Failed to query table {table}"))?;
        if !response.status().is_success() {
            anyhow::bail!("query on {table} failed with status {}", response.status());
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to decode rows from {table}"))
    }

    /// Insert rows, returning the representation the store sends back.
    pub async fn insert<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<Vec<Value>> {
        let response = self
            .authed(self.client.post(self.table_url(table, "")))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await
            .with_context(|| format!("Failed to insert into {table}"))?;
        if !response.status().is_success() {
            anyhow::bail!("insert into {table} failed with status {}", response.status());
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to decode insert response from {table}"))
    }

    /// Patch rows matching a filter, returning the updated representation.
    pub async fn patch(&self, table: &str, params: &str, body: &Value) -> Result<Vec<Value>> {
        let response = self
            .authed(self.client.patch(self.table_url(table, params)))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to patch {table}"))?;
        if !response.status().is_success() {
            anyhow::bail!("patch on {table} failed with status {}", response.status());
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to decode patch response from {table}"))
    }

    /// Delete rows matching a filter.
    pub async fn delete(&self, table: &str, params: &str) -> Result<()> {
        let response = self
            .authed(self.client.delete(self.table_url(table, params)))
            .send()
            .await
            .with_context(|| format!("Failed to delete from {table}"))?;
        if !response.status().is_success() {
            anyhow::bail!("delete on {table} failed with status {}", response.status());
        }
        Ok(())
    }

    /// Patch-if-exists else insert, keyed by the settings table's `key`.
    pub async fn upsert_setting(&self, key: &str, value: &str) -> Result<()> {
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        let body = serde_json::json!({ "value": value });
        let patched = self.patch("settings", &format!("key=eq.{encoded}"), &body).await?;
        if patched.is_empty() {
            self.insert("settings", &[serde_json::json!({ "key": key, "value": value })])
                .await?;
        }
        Ok(())
    }

    /// Read one settings value.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct SettingRow {
            #[serde(default)]
            value: String,
        }
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        let rows: Vec<SettingRow> = self
            .get_rows("settings", &format!("key=eq.{encoded}"))
            .await?;
        Ok(rows.into_iter().next().map(|r| r.value))
    }

    /// Upload an image to the public bucket, returning its public URL.
    pub async fn upload_image(&self, bytes: Vec<u8>, ext: &str, content_type: &str) -> Result<String> {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect::<String>()
            .to_lowercase();
        let filename = format!(
            "{}-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            suffix,
            ext
        );

        let url = format!("{}/storage/v1/object/{IMAGE_BUCKET}/{filename}", self.base_url);
        let response = self
            .authed(self.client.post(&url))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .context("Failed to upload image")?;
        if !response.status().is_success() {
            anyhow::bail!("image upload failed with status {}", response.status());
        }
        Ok(format!(
            "{}/storage/v1/object/public/{IMAGE_BUCKET}/{filename}",
            self.base_url
        ))
    }

    /// Tracked posts worth matching analytics exports against: everything
    /// in POST, USED or DATABASE, newest first, capped.
    pub async fn fetch_match_candidates(&self) -> Result<Vec<MatchCandidate>> {
        let params = format!(
            "select=post,category,structure,score,tab\
&or=(tab.eq.USED,tab.eq.DATABASE,tab.eq.POST)&order=created_at.desc&limit={MATCH_CANDIDATE_LIMIT}"
        );
        let rows: Vec<CandidateRow> = self.get_rows("posts", &params).await?;
        Ok(rows
            .into_iter()
            .map(|r| MatchCandidate {
                text: r.post,
                pillar: r.category,
                structure: r.structure,
                score: r.score,
            })
            .collect())
    }

    // ── Eventual mirror ──

    /// Mirror new items into the `posts` table, stamping the store-assigned
    /// row ids back onto the pipeline. Failures are logged and swallowed.
    pub async fn mirror_save_posts(
        &self,
        pipeline: &mut crate::content::ContentPipeline,
        ids: &[u64],
    ) {
        let rows: Vec<PostRow> = ids
            .iter()
            .filter_map(|id| pipeline.get(*id).map(PostRow::from_item))
            .collect();
        if rows.is_empty() {
            return;
        }
        match self.insert("posts", &rows).await {
            Ok(saved) => {
                for (local_id, row) in ids.iter().zip(saved) {
                    if let Ok(inserted) = serde_json::from_value::<InsertedRow>(row) {
                        let _ = pipeline.set_store_id(*local_id, inserted.id);
                    }
                }
                debug!(count = ids.len(), "posts mirrored to store");
            }
            Err(e) => warn!(error = %e, "store mirror failed; local state kept"),
        }
    }

    /// Mirror a field update for one already-mirrored item.
    pub async fn mirror_patch_post(&self, store_id: i64, body: Value) {
        if let Err(e) = self.patch("posts", &format!("id=eq.{store_id}"), &body).await {
            warn!(store_id, error = %e, "store patch failed; local state kept");
        }
    }

    /// Mirror a deletion.
    pub async fn mirror_delete_post(&self, store_id: i64) {
        if let Err(e) = self.delete("posts", &format!("id=eq.{store_id}")).await {
            warn!(store_id, error = %e, "store delete failed; local state kept");
        }
    }

    /// Mirror a bulk clear of one tab.
    pub async fn mirror_clear_tab(&self, tab: Tab) {
        if let Err(e) = self.delete("posts", &format!("tab=eq.{}", tab.as_str())).await {
            warn!(tab = tab.as_str(), error = %e, "store clear failed; local state kept");
        }
    }
}
