//! GPT（OpenAI Chat Completions）プロバイダの実装

use crate::domain::{Message, Role};
use crate::error::Error;
use crate::llm::provider::{post_json, LlmProvider};
use serde_json::{json, Value};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Chat Completions の role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiRole {
    System,
    User,
    Assistant,
}

impl From<Role> for OpenAiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::System => Self::System,
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
        }
    }
}

impl OpenAiRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Chat Completions 形式の messages 配列を作る（system → 履歴 → クエリ）
pub(crate) fn chat_messages(
    query: &str,
    system_instruction: Option<&str>,
    history: &[Message],
) -> Vec<Value> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = system_instruction {
        messages.push(json!({
            "role": OpenAiRole::System.as_str(),
            "content": system
        }));
    }
    for msg in history {
        messages.push(json!({
            "role": OpenAiRole::from(msg.role).as_str(),
            "content": msg.content
        }));
    }
    messages.push(json!({
        "role": OpenAiRole::User.as_str(),
        "content": query
    }));
    messages
}

/// Chat Completions のレスポンスから本文を取り出す
pub(crate) fn parse_chat_completion(
    response_json: &str,
    api_label: &str,
) -> Result<Option<String>, Error> {
    let v: Value = serde_json::from_str(response_json)
        .map_err(|e| Error::json(format!("Failed to parse response JSON: {}", e)))?;

    if let Some(error) = v.get("error") {
        let error_msg = error["message"].as_str().unwrap_or("Unknown error");
        return Err(Error::http(format!("{} API error: {}", api_label, error_msg)));
    }

    Ok(v["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string()))
}

/// GPTプロバイダ
pub struct GptProvider {
    client: reqwest::blocking::Client,
    model: String,
    base_url: String,
    api_key: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl GptProvider {
    /// 新しいGPTプロバイダを作成
    ///
    /// * `model` - モデル名（None のとき DEFAULT_MODEL）
    /// * `api_key` - 解決済みの API キー（空文字は設定不備として扱う）
    /// * `base_url` - None のとき DEFAULT_BASE_URL
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
}

impl LlmProvider for GptProvider {
    fn name(&self) -> &str {
        "gpt"
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
        Ok(payload)
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        let url = format!("{}/chat/completions", self.base_url);
        post_json(
            &self.client,
            &url,
            &[("Authorization", format!("Bearer {}", self.api_key))],
            request_json,
            "OpenAI",
        )
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        parse_chat_completion(response_json, "OpenAI")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GptProvider {
        GptProvider::new(None, "sk-test".to_string(), None, None, None).unwrap()
    }

    #[test]
    fn test_default_model() {
        assert_eq!(provider().model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_empty_key_is_env_error() {
        let e = GptProvider::new(None, "  ".to_string(), None, None, None)
            .err()
            .unwrap();
        assert_eq!(e.exit_code(), 78);
    }

    #[test]
    fn test_role_mapping_is_identity() {
        assert_eq!(OpenAiRole::from(Role::System).as_str(), "system");
        assert_eq!(OpenAiRole::from(Role::User).as_str(), "user");
        assert_eq!(OpenAiRole::from(Role::Assistant).as_str(), "assistant");
    }

    #[test]
    fn test_payload_order_system_history_query() {
        let history = vec![Message::user("salom"), Message::assistant("Assalomu alaykum")];
        let payload = provider()
            .make_request_payload("qalaysiz?", Some("You are Dilshod."), &history)
            .unwrap();
        let messages = payload["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"], "qalaysiz?");
        assert_eq!(payload["model"], "gpt-3.5-turbo");
        assert!(payload.get("temperature").is_none());
    }

    #[test]
    fn test_payload_with_generation_params() {
        let p = GptProvider::new(
            Some("gpt-4o".to_string()),
            "k".to_string(),
            None,
            Some(0.5),
            Some(256),
        )
        .unwrap();
        let payload = p.make_request_payload("q", None, &[]).unwrap();
        assert_eq!(payload["temperature"], 0.5);
        assert_eq!(payload["max_tokens"], 256);
        assert_eq!(payload["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_response_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi!"}}]}"#;
        assert_eq!(
            provider().parse_response_text(body).unwrap().as_deref(),
            Some("Hi!")
        );
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"error":{"message":"Rate limit reached"}}"#;
        let e = provider().parse_response_text(body).unwrap_err();
        assert!(e.to_string().contains("Rate limit reached"));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            provider().parse_response_text("<html>"),
            Err(Error::Json(_))
        ));
    }
}
