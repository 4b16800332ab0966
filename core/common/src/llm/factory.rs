//! プロバイダファクトリー
//!
//! 解決済みプロファイルから ChatModel を作成します。API キーはここで EnvResolver から読む。

use crate::error::Error;
use crate::llm::chat_model::{ChatModel, Labeled};
use crate::llm::driver::LlmDriver;
use crate::llm::echo::EchoProvider;
use crate::llm::gemini::{self, GeminiProvider};
use crate::llm::gpt::{self, GptProvider};
use crate::llm::llama::LlamaSettings;
use crate::llm::openai_compat::OpenAiCompatProvider;
use crate::llm::provider::LlmProvider;
use crate::llm::resolver::ResolvedProvider;
use crate::domain::Message;
use crate::ports::outbound::EnvResolver;
use serde_json::Value;

/// プロバイダタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Gemini generateContent
    Gemini,
    /// OpenAI Chat Completions
    Gpt,
    /// OpenAI Chat Completions 互換 (/chat/completions)
    OpenAiCompat,
    /// Echo（クエリを返すだけ）
    Echo,
    /// ローカル GGUF（llama.cpp）
    Llama,
}

impl ProviderType {
    /// 文字列からプロバイダタイプを解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "gpt" | "openai" | "chatgpt" => Some(Self::Gpt),
            "openai_compat" => Some(Self::OpenAiCompat),
            "echo" => Some(Self::Echo),
            "llama" => Some(Self::Llama),
            _ => None,
        }
    }

    /// プロバイダタイプを文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Gpt => "gpt",
            Self::OpenAiCompat => "openai_compat",
            Self::Echo => "echo",
            Self::Llama => "llama",
        }
    }
}

/// HTTP プロバイダのenumラッパー
///
/// 異なるプロバイダタイプを型安全に扱うために使用します。
pub enum AnyProvider {
    Gemini(GeminiProvider),
    Gpt(GptProvider),
    OpenAiCompat(OpenAiCompatProvider),
    Echo(EchoProvider),
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::Gemini(p) => p.name(),
            Self::Gpt(p) => p.name(),
            Self::OpenAiCompat(p) => p.name(),
            Self::Echo(p) => p.name(),
        }
    }

    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error> {
        match self {
            Self::Gemini(p) => p.make_request_payload(query, system_instruction, history),
            Self::Gpt(p) => p.make_request_payload(query, system_instruction, history),
            Self::OpenAiCompat(p) => p.make_request_payload(query, system_instruction, history),
            Self::Echo(p) => p.make_request_payload(query, system_instruction, history),
        }
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        match self {
            Self::Gemini(p) => p.make_http_request(request_json),
            Self::Gpt(p) => p.make_http_request(request_json),
            Self::OpenAiCompat(p) => p.make_http_request(request_json),
            Self::Echo(p) => p.make_http_request(request_json),
        }
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        match self {
            Self::Gemini(p) => p.parse_response_text(response_json),
            Self::Gpt(p) => p.parse_response_text(response_json),
            Self::OpenAiCompat(p) => p.parse_response_text(response_json),
            Self::Echo(p) => p.parse_response_text(response_json),
        }
    }
}

/// 必須の API キーを読む。未設定なら Env エラー（終了コード 78）。
fn require_api_key(
    env: &dyn EnvResolver,
    resolved: &ResolvedProvider,
    default_env: &str,
) -> Result<String, Error> {
    let name = resolved.api_key_env.as_deref().unwrap_or(default_env);
    env.var(name).ok_or_else(|| {
        Error::env(format!(
            "{} is not set (needed by profile '{}'). Put it in .env or export it.",
            name, resolved.profile_name
        ))
    })
}

/// HTTP プロバイダを作成する。Llama は HTTP プロバイダではないので usage エラー。
pub fn create_provider(
    resolved: &ResolvedProvider,
    env: &dyn EnvResolver,
) -> Result<AnyProvider, Error> {
    match resolved.provider_type {
        ProviderType::Gemini => {
            let key = require_api_key(env, resolved, gemini::API_KEY_ENV)?;
            let provider = GeminiProvider::new(
                resolved.model.clone(),
                key,
                resolved.base_url.clone(),
                resolved.temperature,
                resolved.max_tokens,
            )?;
            Ok(AnyProvider::Gemini(provider))
        }
        ProviderType::Gpt => {
            let key = require_api_key(env, resolved, gpt::API_KEY_ENV)?;
            let provider = GptProvider::new(
                resolved.model.clone(),
                key,
                resolved.base_url.clone(),
                resolved.temperature,
                resolved.max_tokens,
            )?;
            Ok(AnyProvider::Gpt(provider))
        }
        ProviderType::OpenAiCompat => {
            let key = resolved.api_key_env.as_deref().and_then(|n| env.var(n));
            let provider = OpenAiCompatProvider::new(
                resolved.model.clone(),
                resolved.base_url.clone(),
                key,
                resolved.temperature,
            )
            .with_max_tokens(resolved.max_tokens)
            .with_stop(resolved.stop.clone().unwrap_or_default());
            Ok(AnyProvider::OpenAiCompat(provider))
        }
        ProviderType::Echo => Ok(AnyProvider::Echo(EchoProvider::new())),
        ProviderType::Llama => Err(Error::invalid_argument(format!(
            "Profile '{}' is a local model, not an HTTP provider",
            resolved.profile_name
        ))),
    }
}

/// ローカルモデル用の実行パラメータを組み立てる
pub fn llama_settings(resolved: &ResolvedProvider) -> Result<LlamaSettings, Error> {
    let model_path = resolved.model_path.clone().ok_or_else(|| {
        Error::env(format!(
            "Profile '{}' needs \"model_path\" (a GGUF file) in profiles.json, or pass --model-path.",
            resolved.profile_name
        ))
    })?;
    let mut settings = LlamaSettings::new(resolved.profile_name.clone(), model_path);
    if let Some(t) = resolved.template {
        settings = settings.with_template(t);
    }
    if let Some(ref stop) = resolved.stop {
        settings.stop = stop.clone();
    }
    settings.lora_path = resolved.lora_path.clone();
    if let Some(n) = resolved.n_ctx {
        settings.n_ctx = n;
    }
    if let Some(n) = resolved.gpu_layers {
        settings.gpu_layers = n;
    }
    if let Some(n) = resolved.max_tokens {
        settings.max_tokens = n;
    }
    if let Some(t) = resolved.temperature {
        settings.temperature = t;
    }
    Ok(settings)
}

#[cfg(feature = "llama")]
fn create_local_model(resolved: &ResolvedProvider) -> Result<Box<dyn ChatModel>, Error> {
    let settings = llama_settings(resolved)?;
    Ok(Box::new(crate::llm::llama::LlamaModel::load(settings)?))
}

#[cfg(not(feature = "llama"))]
fn create_local_model(resolved: &ResolvedProvider) -> Result<Box<dyn ChatModel>, Error> {
    llama_settings(resolved)?.validate()?;
    Err(Error::env(format!(
        "Profile '{}' uses a local GGUF model, but this binary was built without the `llama` feature. Rebuild with `--features llama`.",
        resolved.profile_name
    )))
}

/// 表示名: ビルトイン名はそれらしい見出しにし、独自プロファイルは名前をそのまま使う
pub fn display_label(resolved: &ResolvedProvider) -> String {
    match (resolved.profile_name.as_str(), resolved.provider_type) {
        ("gpt" | "openai" | "chatgpt", ProviderType::Gpt) => "ChatGPT".to_string(),
        ("gemini", ProviderType::Gemini) => "Gemini".to_string(),
        (name, _) => name.to_string(),
    }
}

/// チャットループ用のモデルを作成する
pub fn create_chat_model(
    resolved: &ResolvedProvider,
    env: &dyn EnvResolver,
) -> Result<Box<dyn ChatModel>, Error> {
    let label = display_label(resolved);
    match resolved.provider_type {
        ProviderType::Llama => Ok(Box::new(Labeled::new(label, create_local_model(resolved)?))),
        _ => {
            let provider = create_provider(resolved, env)?;
            Ok(Box::new(Labeled::new(label, LlmDriver::new(provider))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompt_template::PromptTemplate;
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct MapEnv(HashMap<String, String>);

    impl MapEnv {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )
        }
    }

    impl EnvResolver for MapEnv {
        fn var(&self, name: &str) -> Option<String> {
            self.0.get(name).cloned()
        }
    }

    #[test]
    fn test_provider_type_from_str() {
        assert_eq!(ProviderType::from_str("Gemini"), Some(ProviderType::Gemini));
        assert_eq!(ProviderType::from_str("GPT"), Some(ProviderType::Gpt));
        assert_eq!(ProviderType::from_str("openai"), Some(ProviderType::Gpt));
        assert_eq!(ProviderType::from_str("openai_compat"), Some(ProviderType::OpenAiCompat));
        assert_eq!(ProviderType::from_str("ECHO"), Some(ProviderType::Echo));
        assert_eq!(ProviderType::from_str("llama"), Some(ProviderType::Llama));
        assert_eq!(ProviderType::from_str("unknown"), None);
    }

    #[test]
    fn test_missing_openai_key_is_env_error() {
        let r = ResolvedProvider::builtin("gpt", ProviderType::Gpt);
        let e = create_chat_model(&r, &MapEnv::new(&[])).err().unwrap();
        assert_eq!(e.exit_code(), 78);
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_custom_api_key_env() {
        let mut r = ResolvedProvider::builtin("work", ProviderType::Gemini);
        r.api_key_env = Some("WORK_GEMINI_KEY".to_string());
        assert!(create_provider(&r, &MapEnv::new(&[("GEMINI_API_KEY", "x")])).is_err());
        let p = create_provider(&r, &MapEnv::new(&[("WORK_GEMINI_KEY", "x")])).unwrap();
        assert_eq!(p.name(), "gemini");
    }

    #[test]
    fn test_labels() {
        let env = MapEnv::new(&[("OPENAI_API_KEY", "k"), ("GEMINI_API_KEY", "k")]);
        let gpt = create_chat_model(&ResolvedProvider::builtin("gpt", ProviderType::Gpt), &env).unwrap();
        assert_eq!(gpt.name(), "ChatGPT");
        let gem = create_chat_model(&ResolvedProvider::builtin("gemini", ProviderType::Gemini), &env).unwrap();
        assert_eq!(gem.name(), "Gemini");
        let echo = create_chat_model(&ResolvedProvider::builtin("echo", ProviderType::Echo), &env).unwrap();
        assert_eq!(echo.name(), "echo");
    }

    #[test]
    fn test_echo_model_answers_offline() {
        let echo = create_chat_model(
            &ResolvedProvider::builtin("echo", ProviderType::Echo),
            &MapEnv::new(&[]),
        )
        .unwrap();
        assert_eq!(echo.complete("salom", None, &[]).unwrap(), "[echo] salom");
    }

    #[test]
    fn test_llama_without_model_path_is_env_error() {
        let r = ResolvedProvider::builtin("llama", ProviderType::Llama);
        let e = create_chat_model(&r, &MapEnv::new(&[])).err().unwrap();
        assert_eq!(e.exit_code(), 78);
        assert!(e.to_string().contains("model_path"));
    }

    #[test]
    fn test_llama_is_not_http_provider() {
        let r = ResolvedProvider::builtin("llama", ProviderType::Llama);
        assert!(create_provider(&r, &MapEnv::new(&[])).err().unwrap().is_usage());
    }

    #[test]
    fn test_llama_settings_from_resolved() {
        let mut r = ResolvedProvider::builtin("agent", ProviderType::Llama);
        r.model_path = Some(PathBuf::from("base.gguf"));
        r.lora_path = Some(PathBuf::from("lora.gguf"));
        r.template = Some(PromptTemplate::Instruction);
        r.max_tokens = Some(128);
        r.n_ctx = Some(4096);
        r.gpu_layers = Some(0);
        let s = llama_settings(&r).unwrap();
        assert_eq!(s.label, "agent");
        assert_eq!(s.template, PromptTemplate::Instruction);
        assert_eq!(s.stop, PromptTemplate::Instruction.default_stop());
        assert_eq!(s.max_tokens, 128);
        assert_eq!(s.n_ctx, 4096);
        assert_eq!(s.gpu_layers, 0);
        assert_eq!(s.lora_path, Some(PathBuf::from("lora.gguf")));
    }
}
