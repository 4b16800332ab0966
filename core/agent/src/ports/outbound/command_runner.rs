//! シェルコマンド実行の Outbound ポート

use common::error::Error;

/// 実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// シグナルで終了した場合は None
    pub status: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

pub trait CommandRunner {
    /// コマンドを実行し、終了まで待つ。起動できなかった場合だけ Err。
    fn run(&self, command: &str) -> Result<CommandOutput, Error>;
}
