//! 標準環境変数解決実装（std::env を委譲）

use crate::ports::outbound::EnvResolver;
use std::env;

/// 標準環境変数解決実装
#[derive(Debug, Clone, Default)]
pub struct StdEnvResolver;

impl StdEnvResolver {
    /// カレントディレクトリの .env を環境変数に読み込む（無ければ何もしない）。
    /// 既に設定済みの変数は上書きしない。
    pub fn load_dotenv() {
        let _ = dotenv::dotenv();
    }
}

impl EnvResolver for StdEnvResolver {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok().filter(|s| !s.is_empty())
    }
}
