//! llama.cpp でローカル GGUF モデルを動かす ChatModel 実装

use super::settings::LlamaSettings;
use crate::domain::Message;
use crate::error::Error;
use crate::llm::chat_model::ChatModel;
use crate::llm::prompt_template::stop_position;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaLoraAdapter, Special};
use llama_cpp_2::sampling::LlamaSampler;
use llama_cpp_2::{send_logs_to_tracing, LogOptions};
use std::cell::RefCell;
use std::num::NonZeroU32;
use std::sync::OnceLock;

/// llama.cpp のバックエンドはプロセスにつき 1 回だけ初期化できる
static BACKEND: OnceLock<LlamaBackend> = OnceLock::new();

fn backend() -> Result<&'static LlamaBackend, Error> {
    if let Some(b) = BACKEND.get() {
        return Ok(b);
    }
    let b = LlamaBackend::init()
        .map_err(|e| Error::system(format!("Failed to initialize llama.cpp backend: {}", e)))?;
    let _ = BACKEND.set(b);
    BACKEND
        .get()
        .ok_or_else(|| Error::system("llama.cpp backend is not initialized"))
}

/// ロード済みのローカルモデル
pub struct LlamaModel {
    model: llama_cpp_2::model::LlamaModel,
    lora: Option<RefCell<LlamaLoraAdapter>>,
    settings: LlamaSettings,
}

impl LlamaModel {
    /// GGUF（と任意の LoRA アダプタ）を読み込む
    pub fn load(settings: LlamaSettings) -> Result<Self, Error> {
        settings.validate()?;
        let backend = backend()?;
        // llama.cpp のログは stderr を埋めるので止める
        send_logs_to_tracing(LogOptions::default().with_logs_enabled(false));

        let params = LlamaModelParams::default().with_n_gpu_layers(settings.gpu_layers);
        let model =
            llama_cpp_2::model::LlamaModel::load_from_file(backend, &settings.model_path, &params)
                .map_err(|e| {
                    Error::system(format!(
                        "Unable to load model {}: {}",
                        settings.model_path.display(),
                        e
                    ))
                })?;

        let lora = match settings.lora_path {
            Some(ref path) => {
                let adapter = model.lora_adapter_init(path).map_err(|e| {
                    Error::system(format!(
                        "Unable to load LoRA adapter {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Some(RefCell::new(adapter))
            }
            None => None,
        };

        Ok(Self {
            model,
            lora,
            settings,
        })
    }

    pub fn settings(&self) -> &LlamaSettings {
        &self.settings
    }

    fn sampler(&self) -> LlamaSampler {
        if self.settings.temperature <= 0.0 {
            LlamaSampler::greedy()
        } else {
            LlamaSampler::chain_simple([
                LlamaSampler::temp(self.settings.temperature),
                LlamaSampler::dist(self.settings.seed),
            ])
        }
    }

    /// プロンプトの続きを最大 max_tokens トークン生成する。EOS か停止文字列で止まる。
    pub fn generate(&self, prompt: &str) -> Result<String, Error> {
        let tokens = self
            .model
            .str_to_token(prompt, AddBos::Always)
            .map_err(|e| Error::system(format!("Failed to tokenize prompt: {}", e)))?;

        let n_ctx = self.settings.n_ctx as usize;
        let max_tokens = self.settings.max_tokens as usize;
        if tokens.len() + max_tokens > n_ctx {
            return Err(Error::invalid_argument(format!(
                "Prompt is too long: {} tokens + {} new tokens exceeds the context of {}. Lower --max-history or raise n_ctx.",
                tokens.len(),
                max_tokens,
                n_ctx
            )));
        }

        let ctx_params = LlamaContextParams::default().with_n_ctx(NonZeroU32::new(self.settings.n_ctx));
        let mut ctx = self
            .model
            .new_context(backend()?, ctx_params)
            .map_err(|e| Error::system(format!("Unable to create llama context: {}", e)))?;

        if let Some(ref lora) = self.lora {
            ctx.lora_adapter_set(&mut lora.borrow_mut(), self.settings.lora_scale)
                .map_err(|e| Error::system(format!("Unable to apply LoRA adapter: {}", e)))?;
        }

        let mut batch = LlamaBatch::new(n_ctx, 1);
        let last_index = tokens.len() as i32 - 1;
        for (i, token) in (0_i32..).zip(tokens.iter()) {
            // logits は最後のトークンにだけ必要
            batch
                .add(*token, i, &[0], i == last_index)
                .map_err(|e| Error::system(format!("Failed to add token: {}", e)))?;
        }
        ctx.decode(&mut batch)
            .map_err(|e| Error::system(format!("llama_decode() failed: {}", e)))?;

        let mut sampler = self.sampler();
        let mut n_cur = batch.n_tokens();
        let mut output: Vec<u8> = Vec::new();

        for _ in 0..max_tokens {
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            sampler.accept(token);
            if token == self.model.token_eos() {
                break;
            }

            let bytes = self
                .model
                .token_to_bytes(token, Special::Tokenize)
                .map_err(|e| Error::system(format!("Failed to decode token: {}", e)))?;
            output.extend_from_slice(&bytes);

            if stop_position(&String::from_utf8_lossy(&output), &self.settings.stop).is_some() {
                break;
            }

            batch.clear();
            batch
                .add(token, n_cur, &[0], true)
                .map_err(|e| Error::system(format!("Failed to add token: {}", e)))?;
            n_cur += 1;
            ctx.decode(&mut batch)
                .map_err(|e| Error::system(format!("Failed to eval: {}", e)))?;
        }

        let mut text = String::from_utf8_lossy(&output).into_owned();
        if let Some(pos) = stop_position(&text, &self.settings.stop) {
            text.truncate(pos);
        }
        Ok(text)
    }
}

impl ChatModel for LlamaModel {
    fn name(&self) -> &str {
        &self.settings.label
    }

    fn complete(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<String, Error> {
        let prompt = self
            .settings
            .template
            .render_chat(system_instruction, history, query);
        Ok(self.generate(&prompt)?.trim().to_string())
    }

    fn complete_raw(&self, prompt: &str) -> Result<String, Error> {
        self.generate(prompt)
    }
}
