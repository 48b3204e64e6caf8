//! Telegram adapter (teloxide).
//!
//! This crate implements the `relay-core` DeliveryClient over the Telegram Bot
//! API, posting HTML-formatted messages and photos into one destination chat.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, InputFile, ParseMode, Recipient},
};

use tracing::debug;

use relay_core::{domain::MessageId, errors::Error, ports::DeliveryClient, Result};

#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
    chat: Recipient,
    disable_web_page_preview: bool,
}

impl TelegramDelivery {
    pub fn new(bot: Bot, chat: Recipient, disable_web_page_preview: bool) -> Self {
        Self {
            bot,
            chat,
            disable_web_page_preview,
        }
    }

    /// Build a bot whose every API call is bounded by `timeout`.
    pub fn from_token(
        token: &str,
        chat_id: &str,
        timeout: Duration,
        disable_web_page_preview: bool,
    ) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("telegram http client: {e}")))?;
        let bot = Bot::with_client(token, client);
        Ok(Self::new(bot, parse_recipient(chat_id)?, disable_web_page_preview))
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Delivery(format!("telegram error: {e}"))
    }
}

/// `-100123…` → numeric chat id, `@name` → channel username.
pub fn parse_recipient(chat_id: &str) -> Result<Recipient> {
    let raw = chat_id.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if raw.len() > 1 && raw.starts_with('@') {
        return Ok(Recipient::ChannelUsername(raw.to_string()));
    }
    Err(Error::Config(format!(
        "TELEGRAM_CHAT_ID must be numeric or an @channel username, got {raw:?}"
    )))
}

#[async_trait]
impl DeliveryClient for TelegramDelivery {
    async fn send_text(&self, html: &str) -> Result<MessageId> {
        let msg = self
            .bot
            .send_message(self.chat.clone(), html.to_string())
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(self.disable_web_page_preview)
            .await
            .map_err(Self::map_err)?;
        debug!(message_id = msg.id.0, len = html.len(), "sent text message");
        Ok(MessageId(msg.id.0))
    }

    async fn send_media(&self, media: &Path, caption_html: &str) -> Result<MessageId> {
        ensure_media_file(media).await?;
        let msg = self
            .bot
            .send_photo(self.chat.clone(), InputFile::file(media.to_path_buf()))
            .caption(caption_html.to_string())
            .parse_mode(ParseMode::Html)
            .await
            .map_err(Self::map_err)?;
        debug!(
            message_id = msg.id.0,
            caption_len = caption_html.len(),
            "sent photo"
        );
        Ok(MessageId(msg.id.0))
    }
}

async fn ensure_media_file(media: &Path) -> Result<()> {
    match tokio::fs::metadata(media).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(Error::Media(format!("media not found: {}", media.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_username_recipients() {
        assert_eq!(
            parse_recipient("-1001234567890").unwrap(),
            Recipient::Id(ChatId(-1001234567890))
        );
        assert_eq!(
            parse_recipient(" @relay_out ").unwrap(),
            Recipient::ChannelUsername("@relay_out".to_string())
        );
    }

    #[tokio::test]
    async fn missing_or_non_file_media_is_a_media_error() {
        let dir = std::env::temp_dir().join(format!("relay-tg-media-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let photo = dir.join("photo_1.jpg");
        std::fs::write(&photo, b"img").unwrap();

        assert!(ensure_media_file(&photo).await.is_ok());
        assert!(matches!(
            ensure_media_file(&dir.join("absent.jpg")).await,
            Err(Error::Media(_))
        ));
        assert!(matches!(ensure_media_file(&dir).await, Err(Error::Media(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_garbage_recipient() {
        assert!(matches!(parse_recipient("relay out"), Err(Error::Config(_))));
        assert!(matches!(parse_recipient("@"), Err(Error::Config(_))));
    }
}
