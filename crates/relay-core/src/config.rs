use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{delivery::DeliveryLimits, errors::Error, Result};

const DEFAULT_SHEET_RANGE: &str = "'api call'!A2:E1000";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TARGET_LANGUAGE: &str = "Indonesian";

/// Typed configuration for one relay run.
///
/// Built once at startup and passed down explicitly; nothing reads the
/// environment after this.
#[derive(Clone, Debug)]
pub struct Config {
    // Transport
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub limits: DeliveryLimits,
    pub send_interval: Duration,
    pub disable_web_page_preview: bool,

    // Channel list
    pub google_sheet_id: String,
    pub google_sheet_api_key: String,
    pub google_sheet_range: String,

    // Translation
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub target_language: String,

    // Feed + media
    pub feed_dir: PathBuf,
    pub feed_max_items: usize,
    pub temp_dir: PathBuf,

    // Persistence
    pub results_path: PathBuf,

    // Network
    pub http_timeout: Duration,
    pub media_timeout: Duration,

    // Behavior flags
    pub category_prefix: bool,
}

impl Config {
    /// Load from the process environment (after an optional `.env`).
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Every required value is
    /// validated before anything else is computed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = required(&var, "TELEGRAM_BOT_TOKEN")?;
        let telegram_chat_id = required(&var, "TELEGRAM_CHAT_ID")?;
        let google_sheet_id = required(&var, "GOOGLE_SHEET_ID")?;
        let google_sheet_api_key = required(&var, "GOOGLE_SHEET_API_KEY")?;
        let gemini_api_key = required(&var, "GEMINI_API_KEY")?;

        let limits = DeliveryLimits {
            body_limit: parse_or(&var, "TELEGRAM_MESSAGE_LIMIT", DeliveryLimits::default().body_limit)?,
            caption_limit: parse_or(
                &var,
                "TELEGRAM_CAPTION_LIMIT",
                DeliveryLimits::default().caption_limit,
            )?,
        };
        if limits.body_limit == 0 || limits.caption_limit == 0 {
            return Err(Error::Config(
                "TELEGRAM_MESSAGE_LIMIT and TELEGRAM_CAPTION_LIMIT must be at least 1".to_string(),
            ));
        }

        let send_interval = Duration::from_millis(parse_or(&var, "SEND_INTERVAL_MS", 1050u64)?);
        let http_timeout = Duration::from_secs(parse_or(&var, "HTTP_TIMEOUT_SECS", 20u64)?);
        let media_timeout = Duration::from_secs(parse_or(&var, "MEDIA_TIMEOUT_SECS", 30u64)?);

        let temp_dir = var("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("tg-relay"));

        Ok(Self {
            telegram_bot_token,
            telegram_chat_id,
            limits,
            send_interval,
            disable_web_page_preview: parse_bool_or(&var, "DISABLE_WEB_PAGE_PREVIEW", false),
            google_sheet_id,
            google_sheet_api_key,
            google_sheet_range: var("GOOGLE_SHEET_RANGE")
                .unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string()),
            gemini_api_key,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            target_language: var("TRANSLATION_TARGET_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_TARGET_LANGUAGE.to_string()),
            feed_dir: PathBuf::from(var("FEED_DIR").unwrap_or_else(|| "feeds".to_string())),
            feed_max_items: parse_or(&var, "FEED_MAX_ITEMS", 10usize)?,
            temp_dir,
            results_path: PathBuf::from(
                var("RESULTS_PATH").unwrap_or_else(|| "results.json".to_string()),
            ),
            http_timeout,
            media_timeout,
            category_prefix: parse_bool_or(&var, "CATEGORY_PREFIX", true),
        })
    }
}

fn required(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    var(key).ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw}"))),
    }
}

fn parse_bool_or(var: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    var(key)
        .map(|s| {
            matches!(
                s.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
