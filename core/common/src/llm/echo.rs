//! Echoプロバイダの実装
//!
//! 実際にLLM APIを呼び出さず、クエリをそのまま（または固定の返答を）返します。
//! オフラインでの動作確認やテスト用に使用します。

use crate::domain::Message;
use crate::error::Error;
use crate::llm::provider::LlmProvider;
use serde_json::{json, Value};

/// Echoプロバイダ
#[derive(Debug, Clone, Default)]
pub struct EchoProvider {
    reply: Option<String>,
}

impl EchoProvider {
    /// クエリを `[echo] <query>` として返すプロバイダを作成
    pub fn new() -> Self {
        Self { reply: None }
    }

    /// 常に同じ文字列を返すプロバイダを作成
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }
}

impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error> {
        Ok(json!({
            "query": query,
            "system": system_instruction,
            "history_len": history.len(),
        }))
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        let request: Value = serde_json::from_str(request_json)?;
        let text = match self.reply {
            Some(ref reply) => reply.clone(),
            None => format!("[echo] {}", request["query"].as_str().unwrap_or_default()),
        };
        Ok(json!({ "text": text }).to_string())
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        let v: Value = serde_json::from_str(response_json)?;
        Ok(v["text"].as_str().map(|s| s.to_string()))
    }
}
