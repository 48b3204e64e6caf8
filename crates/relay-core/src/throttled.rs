use std::{path::Path, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{domain::MessageId, ports::DeliveryClient, Result};

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// DeliveryClient decorator that spaces out outbound calls.
///
/// All relay output goes to one destination chat, so a single limiter covers
/// Telegram's per-chat flood control. Calls keep their order and are never
/// retried here.
pub struct ThrottledDelivery {
    inner: Arc<dyn DeliveryClient>,
    limiter: Mutex<IntervalLimiter>,
}

impl ThrottledDelivery {
    pub fn new(inner: Arc<dyn DeliveryClient>, min_interval: Duration) -> Self {
        Self {
            inner,
            limiter: Mutex::new(IntervalLimiter::new(min_interval)),
        }
    }

    async fn throttle(&self) {
        let wait = { self.limiter.lock().await.reserve() };
        if wait > Duration::from_millis(0) {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl DeliveryClient for ThrottledDelivery {
    async fn send_text(&self, html: &str) -> Result<MessageId> {
        self.throttle().await;
        self.inner.send_text(html).await
    }

    async fn send_media(&self, media: &Path, caption_html: &str) -> Result<MessageId> {
        self.throttle().await;
        self.inner.send_media(media, caption_html).await
    }
}
