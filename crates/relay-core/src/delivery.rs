//! Delivery orchestration: text-only vs media+caption routing, chunking, and
//! the continue-on-failure policy.
//!
//! Units are sent strictly in order. A failed unit is logged and recorded in
//! its [`DeliveryOutcome`]; the remaining units are still attempted and
//! nothing is retried.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    caption::{split_caption, CaptionSplit},
    chunking,
    domain::{Chunk, DeliveryOutcome, DeliveryUnit},
    formatting::escape_html,
    media::StagedMedia,
    ports::DeliveryClient,
};

/// Telegram Bot API limit for a text message.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;
/// Telegram Bot API limit for a media caption.
pub const TELEGRAM_CAPTION_LIMIT: usize = 1024;

/// Transport length limits, in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryLimits {
    pub body_limit: usize,
    pub caption_limit: usize,
}

impl Default for DeliveryLimits {
    fn default() -> Self {
        Self {
            body_limit: TELEGRAM_MESSAGE_LIMIT,
            caption_limit: TELEGRAM_CAPTION_LIMIT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Text,
    Media,
}

/// Per-unit outcomes of one item, in send order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReport {
    pub route: Route,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn failed_units(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_units() == 0
    }
}

pub struct DeliveryOrchestrator {
    client: Arc<dyn DeliveryClient>,
    limits: DeliveryLimits,
}

impl DeliveryOrchestrator {
    pub fn new(client: Arc<dyn DeliveryClient>, limits: DeliveryLimits) -> Self {
        Self { client, limits }
    }

    pub fn limits(&self) -> DeliveryLimits {
        self.limits
    }

    /// TEXT route: escape, chunk at the body limit, send every chunk.
    pub async fn deliver_text(&self, text: &str) -> DeliveryReport {
        let html = escape_html(text);
        let chunks = chunking::split(&html, self.limits.body_limit);
        DeliveryReport {
            route: Route::Text,
            outcomes: self.send_chunks(&chunks).await,
        }
    }

    /// MEDIA route: the media with the caption head, then the caption tail as
    /// body-limit chunks.
    ///
    /// `media` is `None` when staging failed; only the tail is attempted then.
    /// A failed media send does not stop the tail.
    pub async fn deliver_media(&self, text: &str, media: Option<&StagedMedia>) -> DeliveryReport {
        let html = escape_html(text);
        let CaptionSplit { head, tail } = split_caption(&html, self.limits.caption_limit);
        let mut outcomes = Vec::new();

        match media {
            Some(staged) => {
                let len = head.chars().count();
                let outcome = match self.client.send_media(staged.path(), &head).await {
                    Ok(id) => {
                        info!(caption_len = len, "media sent");
                        DeliveryOutcome::sent(DeliveryUnit::Media, len, id)
                    }
                    Err(e) => {
                        error!(caption_len = len, error = %e, "failed to send media");
                        DeliveryOutcome::failed(DeliveryUnit::Media, len, e.to_string())
                    }
                };
                outcomes.push(outcome);
            }
            None => warn!("media unavailable; sending caption remainder only"),
        }

        if !tail.is_empty() {
            info!(len = tail.chars().count(), "sending caption remainder as text");
            let chunks = chunking::split(&tail, self.limits.body_limit);
            outcomes.extend(self.send_chunks(&chunks).await);
        }

        DeliveryReport {
            route: Route::Media,
            outcomes,
        }
    }

    async fn send_chunks(&self, chunks: &[Chunk]) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let unit = DeliveryUnit::Text {
                index: chunk.sequence_index,
                total: chunk.total_chunks,
            };
            let len = chunk.content.chars().count();
            let outcome = match self.client.send_text(&chunk.content).await {
                Ok(id) => {
                    info!(part = %chunk.label(), len, "message part sent");
                    DeliveryOutcome::sent(unit, len, id)
                }
                Err(e) => {
                    error!(part = %chunk.label(), len, error = %e, "failed to send message part");
                    DeliveryOutcome::failed(unit, len, e.to_string())
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}
