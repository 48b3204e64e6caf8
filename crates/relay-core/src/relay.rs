//! The relay run: channels → items → dedup → translate → deliver → record.
//!
//! Everything runs sequentially in arrival order. Per-channel and per-item
//! failures are logged and contained; only loading the result log, listing
//! channels and saving results can fail the run.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    dedup::{should_skip, DedupIndex},
    delivery::{DeliveryOrchestrator, DeliveryReport},
    domain::{ChannelEntry, MediaRef, ResultRecord, SourceItem},
    formatting::tag_with_category,
    ports::{ChannelDirectory, FeedSource, MediaStager, ResultStore, Translator},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct RelayOptions {
    /// Prefix outgoing posts with `[<channel category>]`.
    pub category_prefix: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            category_prefix: true,
        }
    }
}

/// Terminal state of one source item.
#[derive(Clone, Debug)]
pub enum ItemOutcome {
    /// Already delivered in an earlier run.
    Skipped,
    /// Translation failed; nothing was sent or recorded.
    TranslationFailed(String),
    /// Every unit was attempted; per-unit outcomes are in the report.
    Recorded {
        record: ResultRecord,
        report: DeliveryReport,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub channels: usize,
    pub channels_failed: usize,
    pub items_seen: usize,
    pub skipped_duplicates: usize,
    pub translation_failures: usize,
    pub delivered_items: usize,
    pub failed_units: usize,
    pub records: usize,
}

pub struct Relay {
    directory: Arc<dyn ChannelDirectory>,
    feed: Arc<dyn FeedSource>,
    translator: Arc<dyn Translator>,
    stager: Arc<dyn MediaStager>,
    store: Arc<dyn ResultStore>,
    orchestrator: DeliveryOrchestrator,
    options: RelayOptions,
}

impl Relay {
    pub fn new(
        directory: Arc<dyn ChannelDirectory>,
        feed: Arc<dyn FeedSource>,
        translator: Arc<dyn Translator>,
        stager: Arc<dyn MediaStager>,
        store: Arc<dyn ResultStore>,
        orchestrator: DeliveryOrchestrator,
        options: RelayOptions,
    ) -> Self {
        Self {
            directory,
            feed,
            translator,
            stager,
            store,
            orchestrator,
            options,
        }
    }

    /// One full pass over every channel. Records are flushed once, at the end.
    pub async fn run(&self) -> Result<RunSummary> {
        let index = self.store.load()?;
        info!(known = index.len(), "loaded delivered-message index");

        let channels = self.directory.list_channels().await?;
        let mut summary = RunSummary {
            channels: channels.len(),
            ..Default::default()
        };
        let mut records = Vec::new();

        for channel in &channels {
            self.process_channel(&index, channel, &mut summary, &mut records)
                .await;
        }

        summary.records = records.len();
        if !records.is_empty() {
            self.store.append(&records)?;
        }

        info!(
            channels = summary.channels,
            channels_failed = summary.channels_failed,
            items = summary.items_seen,
            skipped = summary.skipped_duplicates,
            translation_failures = summary.translation_failures,
            delivered = summary.delivered_items,
            failed_units = summary.failed_units,
            "relay run finished"
        );
        Ok(summary)
    }

    async fn process_channel(
        &self,
        index: &DedupIndex,
        channel: &ChannelEntry,
        summary: &mut RunSummary,
        records: &mut Vec<ResultRecord>,
    ) {
        info!(
            channel = %channel.link,
            category = channel.category.as_deref().unwrap_or("-"),
            "processing channel"
        );

        let items = match self.feed.fetch_items(channel).await {
            Ok(items) => items,
            Err(e) => {
                error!(channel = %channel.link, error = %e, "failed to fetch channel; skipping");
                summary.channels_failed += 1;
                return;
            }
        };

        for item in &items {
            summary.items_seen += 1;
            match self.process_item(index, item).await {
                ItemOutcome::Skipped => summary.skipped_duplicates += 1,
                ItemOutcome::TranslationFailed(_) => summary.translation_failures += 1,
                ItemOutcome::Recorded { record, report } => {
                    summary.delivered_items += 1;
                    summary.failed_units += report.failed_units();
                    records.push(record);
                }
            }
        }
    }

    /// Drive one item through dedup, translation, routing and delivery.
    pub async fn process_item(&self, index: &DedupIndex, item: &SourceItem) -> ItemOutcome {
        if should_skip(index, &item.original_text) {
            warn!(item_id = item.id, channel = %item.channel_label, "skipping duplicate message");
            return ItemOutcome::Skipped;
        }

        let translated = match self.translator.translate(&item.original_text).await {
            Ok(t) => t,
            Err(e) => {
                error!(
                    item_id = item.id,
                    channel = %item.channel_label,
                    error = %e,
                    "translation failed; item dropped"
                );
                return ItemOutcome::TranslationFailed(e.to_string());
            }
        };

        let outgoing = if self.options.category_prefix {
            tag_with_category(item.channel_category.as_deref(), &translated)
        } else {
            translated.clone()
        };

        let report = match &item.media {
            Some(media) => self.deliver_with_media(item.id, media, &outgoing).await,
            None => self.orchestrator.deliver_text(&outgoing).await,
        };

        if !report.all_succeeded() {
            warn!(
                item_id = item.id,
                failed = report.failed_units(),
                total = report.outcomes.len(),
                "item recorded with failed units"
            );
        }

        ItemOutcome::Recorded {
            record: ResultRecord {
                channel_label: item.channel_label.clone(),
                channel_category: item.channel_category.clone(),
                original_text: item.original_text.clone(),
                translated_text: translated,
                date: item.date.clone(),
                message_id: item.id,
                recorded_at: Some(Utc::now().to_rfc3339()),
            },
            report,
        }
    }

    async fn deliver_with_media(&self, item_id: i64, media: &MediaRef, text: &str) -> DeliveryReport {
        let staged = match self.stager.stage(item_id, media).await {
            Ok(staged) => Some(staged),
            Err(e) => {
                error!(item_id, media = %media.0, error = %e, "failed to stage media");
                None
            }
        };

        let report = self.orchestrator.deliver_media(text, staged.as_ref()).await;

        if let Some(staged) = staged {
            let path = staged.path().display().to_string();
            if let Err(e) = staged.release() {
                warn!(item_id, path = %path, error = %e, "failed to remove staged media");
            }
        }
        report
    }
}
