//! Google Sheets adapter (channel list).
//!
//! Reads the `values` API for a range and turns rows into channel entries.
//! The sheet has a header row somewhere near the top containing `Name` and
//! `Link` columns (and optionally `Type`); everything below it is data.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use relay_core::{domain::ChannelEntry, errors::Error, ports::ChannelDirectory, Result};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct GoogleSheetDirectory {
    sheet_id: String,
    api_key: String,
    range: String,
    http: reqwest::Client,
}

impl GoogleSheetDirectory {
    pub fn new(
        sheet_id: impl Into<String>,
        api_key: impl Into<String>,
        range: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("sheets http client: {e}")))?;
        Ok(Self {
            sheet_id: sheet_id.into(),
            api_key: api_key.into(),
            range: range.into(),
            http,
        })
    }

    fn values_url(&self) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(SHEETS_API_BASE)
            .map_err(|e| Error::Config(format!("sheets url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("sheets url cannot be a base".to_string()))?
            .extend([self.sheet_id.as_str(), "values", self.range.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl ChannelDirectory for GoogleSheetDirectory {
    async fn list_channels(&self) -> Result<Vec<ChannelEntry>> {
        let resp = self
            .http
            .get(self.values_url()?)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::External(format!("sheets request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "sheets read failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("sheets json error: {e}")))?;

        let channels = parse_channel_rows(&range.values);
        info!(count = channels.len(), "loaded channel list");
        Ok(channels)
    }
}

/// Locate the header row and map every later row with a name and a link.
///
/// Only the first `link` column is used. No header → no channels.
pub fn parse_channel_rows(rows: &[Vec<String>]) -> Vec<ChannelEntry> {
    let Some((header_idx, header)) = rows.iter().enumerate().find_map(|(i, row)| {
        let low: Vec<String> = row.iter().map(|c| c.trim().to_lowercase()).collect();
        (low.iter().any(|c| c == "name") && low.iter().any(|c| c == "link")).then_some((i, low))
    }) else {
        return Vec::new();
    };

    let col = |name: &str| header.iter().position(|h| h == name);
    let (Some(name_idx), Some(link_idx)) = (col("name"), col("link")) else {
        return Vec::new();
    };
    let type_idx = col("type");

    let cell = |row: &Vec<String>, idx: usize| -> String {
        row.get(idx).map(|c| c.trim().to_string()).unwrap_or_default()
    };

    rows[header_idx + 1..]
        .iter()
        .filter_map(|row| {
            let name = cell(row, name_idx);
            let link = cell(row, link_idx);
            if name.is_empty() || link.is_empty() {
                return None;
            }
            let category = type_idx.map(|i| cell(row, i)).filter(|t| !t.is_empty());
            Some(ChannelEntry {
                name,
                link,
                category,
            })
        })
        .collect()
}
