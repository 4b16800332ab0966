//! 環境変数解決 Outbound ポート
//!
//! API キー・ホームディレクトリ・既定のメモリファイルを環境変数から解決する。
//! 環境変数を読むのは起動時の配線だけで、各コンポーネントは解決済みの値を受け取る。

use crate::domain::HomeDir;
use crate::error::Error;
use std::path::PathBuf;

/// 環境変数解決抽象（Outbound ポート）
///
/// 実装は `common::adapter::StdEnvResolver` やテスト用の固定値マップなど。
pub trait EnvResolver: Send + Sync {
    /// 空文字列は未設定として扱う
    fn var(&self, name: &str) -> Option<String>;

    /// ホームディレクトリを環境変数から解決する
    ///
    /// 優先順位:
    /// 1. MEMCHAT_HOME（設定されていれば）
    /// 2. $XDG_CONFIG_HOME/memchat（XDG_CONFIG_HOME が設定されていれば）
    /// 3. $HOME/.config/memchat
    fn resolve_home_dir(&self) -> Result<HomeDir, Error> {
        if let Some(home) = self.var("MEMCHAT_HOME") {
            return Ok(HomeDir::new(PathBuf::from(home)));
        }
        let config_base = self
            .var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| self.var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .ok_or_else(|| Error::env("HOME is not set"))?;
        Ok(HomeDir::new(config_base.join("memchat")))
    }

    /// プロバイダプロファイル設定ファイルのパス
    fn resolve_profiles_config_path(&self) -> Result<PathBuf, Error> {
        Ok(self.resolve_home_dir()?.profiles_path())
    }

    /// 既定のメモリファイル（MEMCHAT_MEMORY、なければカレントの memory.json）
    fn resolve_memory_file(&self) -> PathBuf {
        self.var("MEMCHAT_MEMORY")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("memory.json"))
    }
}
