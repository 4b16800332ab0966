//! 端末からの 1 行入力 Outbound ポート
//!
//! usecase は stdin に直接触れず、この trait 経由でユーザー入力を受け取る。

use crate::error::Error;

/// 1 行読み込みの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// 入力行（末尾の改行は除去済み）
    Line(String),
    /// 入力の終端（Ctrl+D / パイプの終わり）
    Eof,
    /// 入力待ち中に Ctrl+C が押された
    Interrupted,
}

/// プロンプトを表示して 1 行読む
pub trait LineReader {
    fn read_line(&self, prompt: &str) -> Result<ReadOutcome, Error>;
}
