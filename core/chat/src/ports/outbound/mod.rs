//! Outbound ポート: chat が外界を使うための trait

mod model_menu;

pub use common::ports::outbound::{InterruptChecker, LineReader, Log, LogRecord, ReadOutcome};
pub use model_menu::{MenuChoice, ModelMenu};
