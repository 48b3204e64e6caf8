//! Gemini adapter (post translation).
//!
//! Uses the `generateContent` endpoint with a fixed translation instruction.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use relay_core::{errors::Error, ports::Translator, Result};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone, Debug)]
pub struct GeminiTranslator {
    api_key: String,
    model: String,
    target_language: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiTranslator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        target_language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("gemini http client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            target_language: target_language.into(),
            http,
        })
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "Translate the following Telegram post into {}.\n\
Keep numbers, tickers, links, @mentions and emoji unchanged.\n\
Reply with the translation only, no notes or quotes.\n\n{text}",
            self.target_language
        )
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let prompt = self.prompt(text);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        let resp = self
            .http
            .post(format!("{GEMINI_API_BASE}/{}:generateContent", self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Translation(format!("gemini request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Translation(format!(
                "gemini translation failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| Error::Translation(format!("gemini json error: {e}")))?;

        let translated = extract_text(&parsed)?;
        debug!(in_len = text.len(), out_len = translated.len(), "translated post");
        Ok(translated)
    }
}

fn extract_text(resp: &GenerateResponse) -> Result<String> {
    let text = resp
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Translation(
            "gemini returned empty text".to_string(),
        ));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(v: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let resp = parse(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Halo " }, { "text": "dunia\n" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }));
        assert_eq!(extract_text(&resp).unwrap(), "Halo dunia");
    }

    #[test]
    fn empty_or_blocked_response_is_a_translation_error() {
        let blocked = parse(serde_json::json!({
            "candidates": [{ "finishReason": "SAFETY" }],
            "promptFeedback": { "blockReason": "SAFETY" }
        }));
        assert!(matches!(extract_text(&blocked), Err(Error::Translation(_))));
        assert!(matches!(
            extract_text(&GenerateResponse::default()),
            Err(Error::Translation(_))
        ));
    }

    #[test]
    fn prompt_names_target_language_and_carries_text() {
        let t = GeminiTranslator::new("k", "gemini-1.5-flash", "Indonesian", Duration::from_secs(1))
            .unwrap();
        let p = t.prompt("BTC breaks 100k");
        assert!(p.contains("into Indonesian"));
        assert!(p.ends_with("BTC breaks 100k"));
    }
}
