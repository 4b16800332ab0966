//! Outbound ポート: agent が外界を使うための trait

mod approval;
mod command_runner;

pub use approval::{Approval, CommandApproval};
pub use command_runner::{CommandOutput, CommandRunner};
pub use common::ports::outbound::{
    EnvResolver, FileSystem, InterruptChecker, LineReader, Log, LogRecord, ReadOutcome,
};
