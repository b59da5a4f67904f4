use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tomas_shared::chat::ChatTurn;

use crate::config::{ChatConfig, SYSTEM_PROMPT, SYSTEM_PROMPT_ACK};

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [ChatTurn],
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// The priming pair followed by the session history and the new user turn.
pub fn build_contents(history: &[ChatTurn], message: &str) -> Vec<ChatTurn> {
    let mut contents = Vec::with_capacity(history.len() + 3);
    contents.push(ChatTurn::user(SYSTEM_PROMPT));
    contents.push(ChatTurn::model(SYSTEM_PROMPT_ACK));
    contents.extend_from_slice(history);
    contents.push(ChatTurn::user(message));
    contents
}

pub fn generate_content_url(api_base: &str, model: &str) -> String {
    format!("{api_base}/v1beta/models/{model}:generateContent")
}

/// Send one conversation to the generateContent endpoint and return the reply text.
pub async fn generate_reply(
    client: &reqwest::Client,
    config: &ChatConfig,
    api_key: &str,
    contents: &[ChatTurn],
) -> Result<String> {
    let url = generate_content_url(&config.api_base, &config.model);
    let response = client
        .post(&url)
        .query(&[("key", api_key)])
        .json(&GenerateContentRequest { contents })
        .send()
        .await
        .with_context(|| format!("request to {} failed", config.model))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("upstream returned {status}: {}", truncate(&body, 200));
    }

    let payload: GenerateContentResponse = response
        .json()
        .await
        .context("failed to decode generateContent response")?;
    extract_text(payload)
}

fn extract_text(payload: GenerateContentResponse) -> Result<String> {
    let text: String = payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        bail!("upstream response contained no text");
    }
    Ok(text)
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tomas_shared::chat::ChatRole;

    #[test]
    fn contents_start_with_priming_pair() {
        let history = vec![ChatTurn::user("earlier"), ChatTurn::model("reply")];

        let contents = build_contents(&history, "now");

        assert_eq!(contents.len(), 5);
        assert_eq!(contents[0].role, ChatRole::User);
        assert_eq!(contents[1].text(), SYSTEM_PROMPT_ACK);
        assert_eq!(contents[4], ChatTurn::user("now"));
    }

    #[test]
    fn url_targets_model_endpoint() {
        assert_eq!(
            generate_content_url("http://localhost:1234", "gemini-pro"),
            "http://localhost:1234/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn extracts_joined_candidate_text() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Flood "}, {"text": "depth"}]}}]
        }))
        .expect("payload parses");
        assert_eq!(extract_text(payload).expect("text"), "Flood depth");
    }

    #[test]
    fn empty_candidates_are_an_error() {
        let payload: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).expect("payload parses");
        assert!(extract_text(payload).is_err());
    }
}
