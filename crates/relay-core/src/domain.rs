use serde::{Deserialize, Serialize};

/// Telegram message id (numeric) returned by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i32);

/// One row of the channel list: a source channel to relay from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelEntry {
    pub name: String,
    pub link: String,
    /// Free-form channel type from the sheet (e.g. "Alpha").
    pub category: Option<String>,
}

/// Reference to the media attached to a source post.
///
/// Either a local file path or an http(s) URL; the media stager decides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

/// A post fetched from a source channel. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceItem {
    pub id: i64,
    pub original_text: String,
    pub media: Option<MediaRef>,
    pub date: String,
    pub channel_label: String,
    pub channel_category: Option<String>,
}

impl SourceItem {
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }
}

/// A transport-safe slice of outgoing text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    /// Zero-based position in the split sequence.
    pub sequence_index: usize,
    pub total_chunks: usize,
}

impl Chunk {
    /// Human "i/n" label (1-based) used in logs.
    pub fn label(&self) -> String {
        format!("{}/{}", self.sequence_index + 1, self.total_chunks)
    }
}

/// What a delivery call carried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryUnit {
    /// The media payload with its caption head.
    Media,
    /// A text chunk; zero-based index within the item's text sequence.
    Text { index: usize, total: usize },
}

/// Typed outcome of a single delivery call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub unit: DeliveryUnit,
    pub len: usize,
    pub message_id: Option<MessageId>,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn sent(unit: DeliveryUnit, len: usize, message_id: MessageId) -> Self {
        Self {
            unit,
            len,
            message_id: Some(message_id),
            error: None,
        }
    }

    pub fn failed(unit: DeliveryUnit, len: usize, error: impl Into<String>) -> Self {
        Self {
            unit,
            len,
            message_id: None,
            error: Some(error.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Durable record of one processed (not skipped) item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub channel_label: String,
    #[serde(default)]
    pub channel_category: Option<String>,
    pub original_text: String,
    pub translated_text: String,
    pub date: String,
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}
