//! profiles.json の設定型
//!
//! ```json
//! {
//!   "default_provider": "uz",
//!   "providers": {
//!     "uz": { "type": "llama", "model_path": "llama-2-7b-chat.Q4_K_M.gguf", "template": "llama2" },
//!     "work": { "type": "openai", "model": "gpt-4o-mini", "api_key_env": "WORK_OPENAI_KEY" }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilesConfig {
    /// 未指定時に使うプロファイル名
    #[serde(alias = "default")]
    pub default_provider: Option<String>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderProfile>,
}

/// 1 プロファイル分の設定。省略した項目は各プロバイダの既定値になる。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderProfile {
    #[serde(rename = "type", alias = "provider")]
    pub kind: ProviderTypeKind,
    pub base_url: Option<String>,
    #[serde(alias = "default_model")]
    pub model: Option<String>,
    /// API キーを読む環境変数名
    pub api_key_env: Option<String>,
    pub temperature: Option<f32>,
    #[serde(alias = "max_new_tokens")]
    pub max_tokens: Option<u32>,
    /// GGUF ファイル
    pub model_path: Option<String>,
    /// GGUF に変換した LoRA アダプタ
    #[serde(alias = "adapter_path")]
    pub lora_path: Option<String>,
    pub n_ctx: Option<u32>,
    #[serde(alias = "n_gpu_layers")]
    pub gpu_layers: Option<u32>,
    pub stop: Option<Vec<String>>,
    /// llama2 | llama3 | instruction
    pub template: Option<String>,
}

/// "type" に書けるプロバイダ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTypeKind {
    #[default]
    Gemini,
    #[serde(alias = "gpt")]
    Openai,
    #[serde(alias = "ollama")]
    OpenaiCompat,
    Echo,
    #[serde(alias = "gguf")]
    Llama,
}

impl ProviderTypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Openai => "openai",
            Self::OpenaiCompat => "openai_compat",
            Self::Echo => "echo",
            Self::Llama => "llama",
        }
    }
}

impl ProfilesConfig {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_object() {
        let cfg = ProfilesConfig::parse("{}").unwrap();
        assert!(cfg.default_provider.is_none());
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn test_parse_default_provider_and_providers() {
        let json = r#"
        {
            "default_provider": "my_gemini",
            "providers": {
                "my_gemini": { "type": "gemini", "model": "gemini-2.0-flash" },
                "my_openai": { "type": "openai", "api_key_env": "OPENAI_KEY" },
                "local": { "type": "openai_compat", "base_url": "http://localhost:8080/v1" },
                "echo": { "type": "echo" }
            }
        }
        "#;
        let cfg = ProfilesConfig::parse(json).unwrap();
        assert_eq!(cfg.default_provider.as_deref(), Some("my_gemini"));
        assert_eq!(cfg.providers.len(), 4);

        let g = cfg.providers.get("my_gemini").unwrap();
        assert_eq!(g.kind, ProviderTypeKind::Gemini);
        assert_eq!(g.model.as_deref(), Some("gemini-2.0-flash"));

        let o = cfg.providers.get("my_openai").unwrap();
        assert_eq!(o.kind, ProviderTypeKind::Openai);
        assert_eq!(o.api_key_env.as_deref(), Some("OPENAI_KEY"));

        let l = cfg.providers.get("local").unwrap();
        assert_eq!(l.kind, ProviderTypeKind::OpenaiCompat);
        assert_eq!(l.base_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_parse_llama_profile() {
        let json = r#"
        {
            "providers": {
                "uz": {
                    "type": "llama",
                    "model_path": "llama-2-7b-chat.Q4_K_M.gguf",
                    "n_ctx": 2048,
                    "n_gpu_layers": 0,
                    "max_tokens": 512,
                    "temperature": 0.7,
                    "stop": ["</s>"],
                    "template": "llama2"
                },
                "agent": {
                    "type": "gguf",
                    "model_path": "base.gguf",
                    "adapter_path": "lora_model.gguf",
                    "template": "instruction"
                }
            }
        }
        "#;
        let cfg = ProfilesConfig::parse(json).unwrap();
        let uz = cfg.providers.get("uz").unwrap();
        assert_eq!(uz.kind, ProviderTypeKind::Llama);
        assert_eq!(uz.model_path.as_deref(), Some("llama-2-7b-chat.Q4_K_M.gguf"));
        assert_eq!(uz.n_ctx, Some(2048));
        assert_eq!(uz.gpu_layers, Some(0));
        assert_eq!(uz.max_tokens, Some(512));
        assert_eq!(uz.stop.as_deref(), Some(&["</s>".to_string()][..]));

        let agent = cfg.providers.get("agent").unwrap();
        assert_eq!(agent.kind, ProviderTypeKind::Llama);
        assert_eq!(agent.lora_path.as_deref(), Some("lora_model.gguf"));
        assert_eq!(agent.template.as_deref(), Some("instruction"));
    }

    #[test]
    fn test_parse_type_alias_gpt_and_ollama() {
        let json = r#"
        {
            "default": "local",
            "providers": {
                "x": { "type": "gpt" },
                "local": { "type": "ollama", "default_model": "llama3.1" }
            }
        }
        "#;
        let cfg = ProfilesConfig::parse(json).unwrap();
        assert_eq!(cfg.default_provider.as_deref(), Some("local"));
        assert_eq!(cfg.providers["x"].kind, ProviderTypeKind::Openai);
        assert_eq!(cfg.providers["local"].kind, ProviderTypeKind::OpenaiCompat);
        assert_eq!(cfg.providers["local"].model.as_deref(), Some("llama3.1"));
    }

    #[test]
    fn test_parse_missing_type_fails() {
        let json = r#"{ "providers": { "x": { "model": "m" } } }"#;
        assert!(ProfilesConfig::parse(json).is_err());
    }

    #[test]
    fn test_parse_unknown_type_fails() {
        let json = r#"{ "providers": { "x": { "type": "claude" } } }"#;
        assert!(ProfilesConfig::parse(json).is_err());
    }
}
