//! agent コマンドのドメイン型

pub mod command;
pub mod command_text;
pub mod dataset;

pub use command::{AgentCommand, DatasetOptions, RunOptions, DEFAULT_AGENT_MAX_TOKENS};
pub use command_text::{extract_command, is_exit_word};
pub use dataset::{parse_dataset, DatasetRecord, TrainingLine};
