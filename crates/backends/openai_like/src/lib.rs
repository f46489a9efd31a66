use async_trait::async_trait;
use atelier_common::Config;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

mod error;

pub use error::BackendError;

/// A generator call. `chat_stream` invokes `on_chunk` with the cumulative
/// raw buffer (not the delta) after every received fragment, in arrival
/// order, and returns the full text once the transport signals completion.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn chat(&self, sys: &str, user: &str) -> Result<String, BackendError>;

    async fn chat_stream(
        &self,
        sys: &str,
        user: &str,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, BackendError>;
}

pub struct OpenAiLike {
    cfg: Config,
    http: Client,
}

impl OpenAiLike {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            http: Client::new(),
        }
    }

    fn request(&self, sys: &str, user: &str, stream: bool) -> reqwest::RequestBuilder {
        let url = format!("{}/chat/completions", self.cfg.backend.base_url);
        let req = ChatReq {
            model: &self.cfg.backend.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            stream,
        };
        let mut rb = self.http.post(&url).json(&req);
        if !self.cfg.backend.api_key.is_empty() {
            rb = rb.bearer_auth(&self.cfg.backend.api_key);
        }
        rb
    }

    async fn check_status(&self, resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let model = self.cfg.backend.model.clone();
        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(BackendError::RateLimited { model }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(BackendError::AuthFailed { model })
            }
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(BackendError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

#[derive(Deserialize)]
struct StreamResp {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

/// Extracts the text delta from one SSE line, if any.
/// Returns `Err(())` on the `[DONE]` sentinel.
fn sse_delta(line: &str) -> Result<Option<String>, ()> {
    let data = match line.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None => return Ok(None),
    };
    if data == "[DONE]" {
        return Err(());
    }
    // Malformed fragments are skipped, not fatal.
    let parsed: StreamResp = match serde_json::from_str(data) {
        Ok(p) => p,
        Err(err) => {
            tracing::debug!(%err, "skipping malformed stream fragment");
            return Ok(None);
        }
    };
    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content))
}

#[async_trait]
impl LlmBackend for OpenAiLike {
    async fn chat(&self, sys: &str, user: &str) -> Result<String, BackendError> {
        let resp = self.request(sys, user, false).send().await?;
        let resp = self.check_status(resp).await?;
        let parsed: ChatResp = resp.json().await?;
        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(text)
    }

    async fn chat_stream(
        &self,
        sys: &str,
        user: &str,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, BackendError> {
        let resp = self.request(sys, user, true).send().await?;
        let mut resp = self.check_status(resp).await?;

        let mut accumulated = String::new();
        // SSE lines may be split across transport chunks; hold the tail.
        let mut line_buf = String::new();
        let mut done = false;

        'recv: while let Some(bytes) = resp.chunk().await? {
            line_buf.push_str(&String::from_utf8_lossy(&bytes));
            while let Some(pos) = line_buf.find('\n') {
                let line: String = line_buf.drain(..=pos).collect();
                match sse_delta(line.trim_end()) {
                    Ok(Some(delta)) => {
                        accumulated.push_str(&delta);
                        on_chunk(&accumulated);
                    }
                    Ok(None) => {}
                    Err(()) => {
                        done = true;
                        break 'recv;
                    }
                }
            }
        }
        if !done {
            // Transport ended without the sentinel; whatever arrived stands.
            tracing::debug!("stream closed without [DONE]");
        }

        if accumulated.is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_delta_extracts_content() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(sse_delta(line), Ok(Some("Hel".to_string())));
    }

    #[test]
    fn sse_delta_skips_non_data_and_malformed_lines() {
        assert_eq!(sse_delta(": keep-alive"), Ok(None));
        assert_eq!(sse_delta(""), Ok(None));
        assert_eq!(sse_delta("data: {not json"), Ok(None));
        assert_eq!(sse_delta(r#"data: {"choices":[]}"#), Ok(None));
    }

    #[test]
    fn sse_delta_stops_on_done() {
        assert_eq!(sse_delta("data: [DONE]"), Err(()));
    }
}
