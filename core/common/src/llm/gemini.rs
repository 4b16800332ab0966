//! Gemini（generateContent）プロバイダの実装

use crate::domain::{Message, Role};
use crate::error::Error;
use crate::llm::provider::{post_json, LlmProvider};
use serde_json::{json, Value};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// 履歴中の system レコードの直後に挟む model 側の応答
pub const SYSTEM_ACK: &str = "Understood.";

/// Gemini の role（system を持たない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiRole {
    User,
    Model,
}

impl From<Role> for GeminiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::System | Role::User => Self::User,
            Role::Assistant => Self::Model,
        }
    }
}

impl GeminiRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

fn content(role: GeminiRole, text: &str) -> Value {
    json!({
        "role": role.as_str(),
        "parts": [{"text": text}]
    })
}

/// Geminiプロバイダ
pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    model: String,
    base_url: String,
    api_key: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl GeminiProvider {
    /// 新しいGeminiプロバイダを作成
    ///
    /// * `model` - モデル名（None のとき DEFAULT_MODEL）
    /// * `api_key` - 解決済みの API キー
    pub fn new(
        model: Option<String>,
        api_key: String,
        base_url: Option<String>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<Self, Error> {
        if api_key.trim().is_empty() {
            return Err(Error::env(format!("{} is empty", API_KEY_ENV)));
        }
        Ok(Self {
            client: reqwest::blocking::Client::new(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            temperature,
            max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error> {
        let mut payload = json!({});

        if let Some(system) = system_instruction {
            payload["systemInstruction"] = json!({
                "parts": [{"text": system}]
            });
        }

        // system レコードは user ターン + model の了解ターンとして送る
        let mut contents = Vec::with_capacity(history.len() + 1);
        for msg in history {
            contents.push(content(GeminiRole::from(msg.role), &msg.content));
            if msg.role == Role::System {
                contents.push(content(GeminiRole::Model, SYSTEM_ACK));
            }
        }
        contents.push(content(GeminiRole::User, query));
        payload["contents"] = json!(contents);

        let mut generation_config = serde_json::Map::new();
        if let Some(t) = self.temperature {
            generation_config.insert("temperature".to_string(), json!(t));
        }
        if let Some(n) = self.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(n));
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }

        Ok(payload)
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        post_json(
            &self.client,
            &self.url(),
            &[("x-goog-api-key", self.api_key.clone())],
            request_json,
            "Gemini",
        )
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        let v: Value = serde_json::from_str(response_json)
            .map_err(|e| Error::json(format!("Failed to parse response JSON: {}", e)))?;

        if let Some(error) = v.get("error") {
            let error_msg = error["message"].as_str().unwrap_or("Unknown error");
            return Err(Error::http(format!("Gemini API error: {}", error_msg)));
        }

        if let Some(reason) = v["promptFeedback"]["blockReason"].as_str() {
            return Err(Error::http(format!("Gemini blocked the prompt: {}", reason)));
        }

        // parts が複数に分かれることがあるので連結する
        let text: Option<String> = v["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .filter(|s| !s.is_empty());

        Ok(text)
    }
}
