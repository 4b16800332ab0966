//! 生成コマンドの実行可否をユーザーに問う Outbound ポート

use common::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approved,
    Denied,
}

/// 生成されたコマンドを実行してよいか確認する
///
/// 明示的な承認以外（空入力・EOF・Ctrl+C を含む）は Denied として扱う。
pub trait CommandApproval {
    fn confirm(&self, command: &str) -> Result<Approval, Error>;
}
