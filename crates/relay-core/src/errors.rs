/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the run loop
/// can decide which failures are contained (feed, translation, delivery,
/// media) and which end the run (config, persistence).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("media error: {0}")]
    Media(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
