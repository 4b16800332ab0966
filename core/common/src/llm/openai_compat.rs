//! OpenAI Chat Completions 互換 (/chat/completions) プロバイダ
//!
//! base_url で任意のエンドポイント（llama.cpp server、Ollama など）を指定できる。
//! API キーは任意。

use crate::domain::Message;
use crate::error::Error;
use crate::llm::gpt::{chat_messages, parse_chat_completion};
use crate::llm::provider::{post_json, LlmProvider};
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";
pub const DEFAULT_MODEL: &str = "local";

/// OpenAI Chat Completions 互換プロバイダ
pub struct OpenAiCompatProvider {
    client: reqwest::blocking::Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    stop: Vec<String>,
}

impl OpenAiCompatProvider {
    /// 新しいプロバイダを作成
    ///
    /// * `model` - モデル名（None のとき DEFAULT_MODEL）
    /// * `base_url` - ベース URL（None のとき DEFAULT_BASE_URL）
    /// * `api_key` - None のとき Authorization を付けない
    pub fn new(
        model: Option<String>,
        base_url: Option<String>,
        api_key: Option<String>,
        temperature: Option<f32>,
    ) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            temperature,
            max_tokens: None,
            stop: Vec::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai_compat"
    }

    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error> {
        let mut payload = json!({
            "model": self.model,
            "messages": chat_messages(query, system_instruction, history),
        });
        if let Some(t) = self.temperature {
            payload["temperature"] = json!(t);
        }
        if let Some(n) = self.max_tokens {
            payload["max_tokens"] = json!(n);
        }
        if !self.stop.is_empty() {
            payload["stop"] = json!(self.stop);
        }
        Ok(payload)
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        let headers: Vec<(&str, String)> = self
            .api_key
            .as_ref()
            .map(|key| vec![("Authorization", format!("Bearer {}", key))])
            .unwrap_or_default();
        post_json(
            &self.client,
            &self.url(),
            &headers,
            request_json,
            "OpenAI-compatible",
        )
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        parse_chat_completion(response_json, "OpenAI-compatible")
    }
}
