//! Spreadsheet collaborator: CSV export fetch for the five content tabs.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::constants::TAB_ORDER;
use crate::content::{Account, ContentPipeline, Tab};
use crate::csv::parse_sheet;

/// Client for the published-CSV endpoint of the content spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    sheet_id: String,
}

impl SheetsClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: config.sheets_base_url.trim_end_matches('/').to_string(),
            sheet_id: config.sheet_id.clone(),
        }
    }

    fn tab_url(&self, tab: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(tab.as_bytes()).collect();
        format!(
            "{}/spreadsheets/d/{}/gviz/tq?tqx=out:csv&sheet={}",
            self.base_url, self.sheet_id, encoded
        )
    }

    /// Fetch one tab's CSV text.
    ///
    /// # Errors
    ///
    /// A non-2xx status fails with the tab named, so the caller can report
    /// which tab's load broke.
    pub async fn fetch_tab(&self, tab: &str) -> Result<String> {
        let response = self
            .client
            .get(self.tab_url(tab))
            .send()
            .await
            .with_context(|| format!("Failed to fetch tab {tab}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch {tab}: {}", response.status());
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read tab {tab} body"))?;
        debug!(tab, bytes = text.len(), "tab fetched");
        Ok(text)
    }

    /// Fetch all five tabs sequentially and import their rows as content
    /// items with fresh sequential ids.
    ///
    /// # Errors
    ///
    /// Aborts on the first tab that fails to fetch; rows already imported
    /// from earlier tabs are kept (partial-result tolerance).
    pub async fn import_all(
        &self,
        pipeline: &mut ContentPipeline,
        account: Account,
    ) -> Result<usize> {
        let mut imported = 0;
        for tab_name in TAB_ORDER {
            let tab = Tab::from_str(tab_name).expect("TAB_ORDER holds valid tabs");
            let text = self.fetch_tab(tab_name).await?;
            let parsed = parse_sheet(&text);
            imported += pipeline.import_rows(tab, account, &parsed.rows);
        }
        info!(imported, "sheet import complete");
        Ok(imported)
    }
}
