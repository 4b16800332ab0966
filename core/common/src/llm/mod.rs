//! LLMドライバーとプロバイダの実装
//!
//! ホスト型 API（Gemini、GPT、OpenAI 互換）とローカル GGUF モデルを ChatModel として同じ形で扱う。

pub mod chat_model;
pub mod config;
pub mod driver;
pub mod echo;
pub mod factory;
pub mod gemini;
pub mod gpt;
pub mod llama;
pub mod openai_compat;
pub mod prompt_template;
pub mod provider;
pub mod resolver;

pub use chat_model::{ChatModel, Labeled};
pub use driver::LlmDriver;
pub use factory::{create_chat_model, create_provider, display_label, AnyProvider, ProviderType};
pub use prompt_template::PromptTemplate;
pub use provider::LlmProvider;
pub use resolver::{list_available_profiles, load_profiles_config, resolve_provider, ResolvedProvider};
