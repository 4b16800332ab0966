//! 実行するサブコマンドとそのオプション

use common::domain::{ModelName, ProviderName};
use std::path::PathBuf;

/// 1 コマンドの生成に使うトークン数の既定値
pub const DEFAULT_AGENT_MAX_TOKENS: u32 = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentCommand {
    Help,
    ListProfiles,
    Run(RunOptions),
    Dataset(DatasetOptions),
}

/// `agent run` のオプション
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// None なら profiles.json の既定、それも無ければ llama
    pub profile: Option<ProviderName>,
    pub model: Option<ModelName>,
    pub model_path: Option<PathBuf>,
    pub lora_path: Option<PathBuf>,
    pub max_tokens: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            profile: None,
            model: None,
            model_path: None,
            lora_path: None,
            max_tokens: DEFAULT_AGENT_MAX_TOKENS,
        }
    }
}

/// `agent dataset` のオプション
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOptions {
    pub input: PathBuf,
    pub output: PathBuf,
}
