//! Outbound ポート: アプリが外界（FS・ログ・環境変数・端末入力・割り込み）を使うための trait

pub mod env_resolver;
pub mod fs;
pub mod interrupt_checker;
pub mod line_reader;
pub mod log;

pub use env_resolver::EnvResolver;
pub use fs::FileSystem;
pub use interrupt_checker::InterruptChecker;
pub use line_reader::{LineReader, ReadOutcome};
pub use log::{now_iso8601, Log, LogLevel, LogRecord};
