//! アダプター（ポートの標準実装）
//!
//! usecase はポートの trait 経由でのみファイル・環境変数・端末に触れる。
//! 実装は標準実装（Std*）やテスト用のモックを注入する。

pub mod file_json_log;
pub mod sigint_checker;
pub mod std_env_resolver;
pub mod std_fs;
pub mod stdin_line_reader;

pub use file_json_log::{FileJsonLog, NoopLog, StderrLog, TeeLog};
pub use sigint_checker::{NoopInterruptChecker, SigintChecker};
pub use std_env_resolver::StdEnvResolver;
pub use std_fs::StdFileSystem;
pub use stdin_line_reader::StdinLineReader;
