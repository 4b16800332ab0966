//! chat コマンドのドメイン型

pub mod command;
pub mod input;

pub use command::{ChatCommand, ChatOptions, DEFAULT_MAX_HISTORY};
pub use input::{classify, UserInput};
