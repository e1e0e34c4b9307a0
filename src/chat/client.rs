use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use serde_json::Value;

/// Environment variable holding the chat backend's bearer key.
pub const API_KEY_ENV: &str = "DIFY_API_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    inputs: serde_json::Map<String, Value>,
    response_mode: &'static str,
    auto_generate_name: bool,
    user: &'a str,
    query: &'a str,
    conversation_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Answer {
        answer: String,
        conversation_id: Option<String>,
    },
    /// 2xx response without a string `answer`.
    Invalid,
}

/// Blocking-mode client for a Dify-style chat-messages endpoint.
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    user: String,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, user: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build chat HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
            user: user.into(),
        })
    }

    pub async fn send(&self, query: &str, conversation_id: &str) -> Result<ChatReply> {
        let body = ChatRequest {
            inputs: serde_json::Map::new(),
            response_mode: "blocking",
            auto_generate_name: true,
            user: &self.user,
            query,
            conversation_id,
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.context("chat request failed")?;
        let status = response.status();
        debug!("Chat backend responded with {status}");
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("chat backend returned {status}: {detail}");
        }

        let data: Value = response
            .json()
            .await
            .context("chat response was not valid JSON")?;
        Ok(parse_reply(&data))
    }
}

fn parse_reply(data: &Value) -> ChatReply {
    let Some(answer) = data.get("answer").and_then(Value::as_str) else {
        return ChatReply::Invalid;
    };
    ChatReply::Answer {
        answer: answer.to_string(),
        conversation_id: data
            .get("conversation_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
    }
}
