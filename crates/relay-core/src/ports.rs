//! Hexagonal ports for every collaborator of the relay run.
//!
//! Adapter crates implement these over Telegram, Google Sheets and Gemini; the
//! core only ever talks to the traits.

use std::path::Path;

use async_trait::async_trait;

use crate::{
    dedup::DedupIndex,
    domain::{ChannelEntry, MediaRef, MessageId, ResultRecord, SourceItem},
    media::StagedMedia,
    Result,
};

/// Source of the channel list, in processing order.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn list_channels(&self) -> Result<Vec<ChannelEntry>>;
}

/// Fetches the latest posts of one channel, in the feed's order.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_items(&self, channel: &ChannelEntry) -> Result<Vec<SourceItem>>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Transport boundary. Payloads are already HTML-escaped and within limits.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn send_text(&self, html: &str) -> Result<MessageId>;
    async fn send_media(&self, media: &Path, caption_html: &str) -> Result<MessageId>;
}

/// Materializes a media reference into a local, scoped file.
#[async_trait]
pub trait MediaStager: Send + Sync {
    async fn stage(&self, item_id: i64, media: &MediaRef) -> Result<StagedMedia>;
}

/// Persistence of delivered items between runs.
///
/// `load` is called once at start; `append` at most once at the end of a run
/// with every record that run produced.
pub trait ResultStore: Send + Sync {
    fn load(&self) -> Result<DedupIndex>;
    fn append(&self, records: &[ResultRecord]) -> Result<()>;
}
