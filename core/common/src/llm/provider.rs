//! LLMプロバイダのトレイト定義

use crate::domain::Message;
use crate::error::Error;
use serde_json::Value;

/// LLMプロバイダのトレイト
///
/// 各プロバイダ（Gemini、GPTなど）はこのトレイトを実装する必要があります。
/// 1 ターン = ペイロード生成 → HTTP → テキスト抽出 の 3 段で、合成は LlmDriver が行う。
pub trait LlmProvider {
    /// プロバイダ名を返す
    fn name(&self) -> &str;

    /// リクエストペイロードを生成
    ///
    /// # Arguments
    /// * `query` - ユーザークエリ
    /// * `system_instruction` - システム指示（オプション）
    /// * `history` - 会話履歴（古い順）
    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error>;

    /// HTTPリクエストを実行してレスポンス JSON 文字列を取得
    fn make_http_request(&self, request_json: &str) -> Result<String, Error>;

    /// レスポンスからテキストを抽出（存在しない場合は None）
    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error>;
}

/// JSON を POST してレスポンス本文を返す（各プロバイダ共通）
///
/// 非 2xx のときは本文の `error.message` を優先してエラーメッセージにする。
pub(crate) fn post_json(
    client: &reqwest::blocking::Client,
    url: &str,
    headers: &[(&str, String)],
    body: &str,
    api_label: &str,
) -> Result<String, Error> {
    let mut builder = client
        .post(url)
        .header("Content-Type", "application/json")
        .body(body.to_string());
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }
    let response = builder
        .send()
        .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    let response_text = response
        .text()
        .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        let detail = api_error_message(&response_text)
            .unwrap_or_else(|| format!("HTTP {}: {}", status, response_text));
        return Err(Error::http(format!("{} API error: {}", api_label, detail)));
    }
    Ok(response_text)
}

/// `{"error": {"message": ...}}` 形式のエラーメッセージを取り出す
pub(crate) fn api_error_message(response_text: &str) -> Option<String> {
    let v: Value = serde_json::from_str(response_text).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}
