use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use relay_core::{
    config::Config,
    delivery::DeliveryOrchestrator,
    feed::JsonFeedSource,
    media::FileMediaStager,
    ports::DeliveryClient,
    relay::{Relay, RelayOptions},
    store::JsonResultStore,
    throttled::ThrottledDelivery,
};
use relay_gemini::GeminiTranslator;
use relay_sheets::GoogleSheetDirectory;
use relay_telegram::TelegramDelivery;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    relay_core::logging::init("relay")?;

    // Missing credentials stop us here, before any channel is touched.
    let cfg = Config::load().context("invalid configuration")?;

    let telegram: Arc<dyn DeliveryClient> = Arc::new(TelegramDelivery::from_token(
        &cfg.telegram_bot_token,
        &cfg.telegram_chat_id,
        cfg.http_timeout,
        cfg.disable_web_page_preview,
    )?);
    let delivery: Arc<dyn DeliveryClient> =
        Arc::new(ThrottledDelivery::new(telegram, cfg.send_interval));

    let relay = Relay::new(
        Arc::new(GoogleSheetDirectory::new(
            cfg.google_sheet_id.clone(),
            cfg.google_sheet_api_key.clone(),
            cfg.google_sheet_range.clone(),
            cfg.http_timeout,
        )?),
        Arc::new(JsonFeedSource::new(cfg.feed_dir.clone(), cfg.feed_max_items)),
        Arc::new(GeminiTranslator::new(
            cfg.gemini_api_key.clone(),
            cfg.gemini_model.clone(),
            cfg.target_language.clone(),
            cfg.http_timeout,
        )?),
        Arc::new(FileMediaStager::new(cfg.temp_dir.clone(), cfg.media_timeout)?),
        Arc::new(JsonResultStore::new(cfg.results_path.clone())),
        DeliveryOrchestrator::new(delivery, cfg.limits),
        RelayOptions {
            category_prefix: cfg.category_prefix,
        },
    );

    info!(
        chat = %cfg.telegram_chat_id,
        body_limit = cfg.limits.body_limit,
        caption_limit = cfg.limits.caption_limit,
        "relay starting"
    );

    let summary = relay.run().await.context("relay run failed")?;
    if summary.records == 0 {
        info!("nothing new to relay");
    }
    Ok(())
}
