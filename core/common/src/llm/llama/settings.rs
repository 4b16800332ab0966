//! ローカルモデルの実行パラメータ

use crate::error::Error;
use crate::llm::prompt_template::PromptTemplate;
use std::path::PathBuf;

pub const DEFAULT_N_CTX: u32 = 2048;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// 全層を GPU に載せる（GPU が無ければ llama.cpp が CPU にフォールバックする）
pub const ALL_GPU_LAYERS: u32 = 1000;
pub const DEFAULT_SEED: u32 = 3407;

/// ローカルモデルの実行パラメータ
#[derive(Debug, Clone, PartialEq)]
pub struct LlamaSettings {
    /// 表示名（プロファイル名）
    pub label: String,
    pub model_path: PathBuf,
    pub lora_path: Option<PathBuf>,
    pub lora_scale: f32,
    pub n_ctx: u32,
    pub gpu_layers: u32,
    pub max_tokens: u32,
    /// 0 以下なら greedy
    pub temperature: f32,
    pub seed: u32,
    pub stop: Vec<String>,
    pub template: PromptTemplate,
}

impl LlamaSettings {
    /// モデルパスだけ指定してデフォルト値で埋める
    pub fn new(label: impl Into<String>, model_path: impl Into<PathBuf>) -> Self {
        let template = PromptTemplate::default();
        Self {
            label: label.into(),
            model_path: model_path.into(),
            lora_path: None,
            lora_scale: 1.0,
            n_ctx: DEFAULT_N_CTX,
            gpu_layers: ALL_GPU_LAYERS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            seed: DEFAULT_SEED,
            stop: template.default_stop(),
            template,
        }
    }

    /// テンプレートを差し替える。stop が既定のままならテンプレートの既定に合わせる。
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        if self.stop == self.template.default_stop() {
            self.stop = template.default_stop();
        }
        self.template = template;
        self
    }

    /// 起動前に検出できる設定不備を確認する
    pub fn validate(&self) -> Result<(), Error> {
        if !self.model_path.is_file() {
            return Err(Error::env(format!(
                "Model file not found: {}. Download a GGUF model and set \"model_path\" in profiles.json (or pass --model-path).",
                self.model_path.display()
            )));
        }
        if let Some(ref lora) = self.lora_path {
            if !lora.is_file() {
                return Err(Error::env(format!(
                    "LoRA adapter not found: {}. Convert the trained adapter to GGUF and pass its path.",
                    lora.display()
                )));
            }
        }
        if self.n_ctx == 0 {
            return Err(Error::invalid_argument("n_ctx must be at least 1"));
        }
        if self.max_tokens == 0 {
            return Err(Error::invalid_argument("max_tokens must be at least 1"));
        }
        if self.max_tokens >= self.n_ctx {
            return Err(Error::invalid_argument(format!(
                "max_tokens ({}) must be smaller than n_ctx ({})",
                self.max_tokens, self.n_ctx
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = LlamaSettings::new("local", "model.gguf");
        assert_eq!(s.n_ctx, 2048);
        assert_eq!(s.max_tokens, 512);
        assert_eq!(s.temperature, 0.7);
        assert_eq!(s.stop, vec!["</s>".to_string()]);
        assert_eq!(s.template, PromptTemplate::Llama2);
    }

    #[test]
    fn test_with_template_follows_default_stop() {
        let s = LlamaSettings::new("local", "m.gguf").with_template(PromptTemplate::Llama3);
        assert_eq!(s.stop, vec!["<|eot_id|>".to_string()]);

        let mut custom = LlamaSettings::new("local", "m.gguf");
        custom.stop = vec!["END".to_string()];
        let custom = custom.with_template(PromptTemplate::Llama3);
        assert_eq!(custom.stop, vec!["END".to_string()]);
    }

    #[test]
    fn test_validate_missing_model_is_env_error() {
        let dir = tempfile::tempdir().unwrap();
        let s = LlamaSettings::new("local", dir.path().join("missing.gguf"));
        let e = s.validate().unwrap_err();
        assert_eq!(e.exit_code(), 78);
        assert!(e.to_string().contains("missing.gguf"));
    }

    #[test]
    fn test_validate_missing_lora() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("m.gguf");
        std::fs::write(&model, b"GGUF").unwrap();
        let mut s = LlamaSettings::new("local", &model);
        assert!(s.validate().is_ok());
        s.lora_path = Some(dir.path().join("lora_model"));
        assert!(s.validate().unwrap_err().to_string().contains("LoRA"));
    }

    #[test]
    fn test_validate_token_budget() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("m.gguf");
        std::fs::write(&model, b"GGUF").unwrap();
        let mut s = LlamaSettings::new("local", &model);
        s.max_tokens = 4096;
        assert!(s.validate().unwrap_err().is_usage());
    }
}
