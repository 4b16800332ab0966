//! 実行するコマンドと、その検証済みオプション

use common::domain::{ModelName, PersonaPolicy, ProviderName};
use common::error::Error;
use std::path::PathBuf;

/// 保持する履歴レコード数の既定値（5 往復）
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// chat コマンドの種類
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Help,
    ListProfiles,
    Chat(ChatOptions),
}

/// 対話セッションのオプション
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    /// 空なら対話メニューか既定プロファイル
    pub profiles: Vec<ProviderName>,
    pub model: Option<ModelName>,
    pub persona: Option<String>,
    pub persona_file: Option<PathBuf>,
    pub persona_policy: PersonaPolicy,
    /// None なら環境変数か既定のファイル名
    pub memory_file: Option<PathBuf>,
    pub max_history: usize,
    pub no_memory: bool,
}

impl ChatOptions {
    /// 組み合わせとして成り立たない指定を弾く
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_history == 0 {
            return Err(Error::invalid_argument("--max-history must be at least 1"));
        }
        if self.persona_policy == PersonaPolicy::Pinned {
            if self.max_history < 2 {
                return Err(Error::invalid_argument(
                    "--persona-policy pinned needs --max-history of at least 2 (persona + one record)",
                ));
            }
            if self.no_memory {
                return Err(Error::invalid_argument(
                    "--persona-policy pinned stores the persona in memory; it cannot be combined with --no-memory",
                ));
            }
        }
        if self.model.is_some() && self.profiles.len() > 1 {
            return Err(Error::invalid_argument(
                "-m/--model applies to a single profile; set per-profile models in profiles.json for comparisons",
            ));
        }
        let mut seen: Vec<&str> = Vec::new();
        for p in &self.profiles {
            if seen.contains(&p.as_ref()) {
                return Err(Error::invalid_argument(format!(
                    "Profile '{}' is given more than once",
                    p
                )));
            }
            seen.push(p.as_ref());
        }
        Ok(())
    }
}
