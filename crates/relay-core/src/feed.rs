//! Feed source over JSON channel exports.
//!
//! An external fetcher drops one `<username>.json` file per source channel
//! into the feed directory, holding the channel's recent posts oldest first:
//!
//! ```json
//! [{ "id": 17, "text": "...", "date": "2026-10-16T08:00:00+00:00", "media": "media/17.jpg" }]
//! ```
//!
//! Relative media paths are resolved against the feed directory.

use std::{path::PathBuf, sync::OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::{
    domain::{ChannelEntry, MediaRef, SourceItem},
    errors::Error,
    ports::FeedSource,
    Result,
};

#[derive(Clone, Debug, Deserialize)]
struct ExportedPost {
    id: i64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    media: Option<String>,
}

/// Derive a channel username from a link such as `https://t.me/name`,
/// `t.me/s/name`, `@name` or a bare `name`.
pub fn extract_channel_username(link: &str) -> Option<String> {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    let re = LINK_RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?:https?://)?(?:www\.)?(?:t\.me|telegram\.me)/(?:s/)?|@)?([A-Za-z0-9_]{3,})/?(?:[?#].*)?$",
        )
        .expect("valid regex")
    });
    re.captures(link.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Clone, Debug)]
pub struct JsonFeedSource {
    dir: PathBuf,
    max_items: usize,
}

impl JsonFeedSource {
    pub fn new(dir: impl Into<PathBuf>, max_items: usize) -> Self {
        Self {
            dir: dir.into(),
            max_items,
        }
    }

    fn to_items(&self, posts: Vec<ExportedPost>, channel: &ChannelEntry) -> Vec<SourceItem> {
        let start = posts.len().saturating_sub(self.max_items);
        posts
            .into_iter()
            .skip(start)
            .filter(|p| !p.text.trim().is_empty())
            .map(|p| SourceItem {
                id: p.id,
                original_text: p.text,
                media: p.media.and_then(|m| self.resolve_media(m)),
                date: p.date,
                channel_label: channel.link.clone(),
                channel_category: channel.category.clone(),
            })
            .collect()
    }

    fn resolve_media(&self, raw: String) -> Option<MediaRef> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let media = MediaRef(raw.to_string());
        if media.is_remote() || PathBuf::from(raw).is_absolute() {
            return Some(media);
        }
        Some(MediaRef(self.dir.join(raw).to_string_lossy().to_string()))
    }
}

#[async_trait]
impl FeedSource for JsonFeedSource {
    async fn fetch_items(&self, channel: &ChannelEntry) -> Result<Vec<SourceItem>> {
        let username = extract_channel_username(&channel.link).ok_or_else(|| {
            Error::Feed(format!("cannot derive channel username from {}", channel.link))
        })?;

        let path = self.dir.join(format!("{username}.json"));
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Feed(format!("{}: {e}", path.display())))?;
        let posts: Vec<ExportedPost> = serde_json::from_str(&raw)
            .map_err(|e| Error::Feed(format!("{}: {e}", path.display())))?;

        Ok(self.to_items(posts, channel))
    }
}
