//! ローカル GGUF モデル（llama.cpp）
//!
//! 実行時の本体は `llama` feature 有効時のみビルドする。設定の組み立ては常に使える。

pub mod settings;
#[cfg(feature = "llama")]
pub mod model;

pub use settings::LlamaSettings;
#[cfg(feature = "llama")]
pub use model::LlamaModel;
