//! ユースケース

pub mod agent_loop;
pub mod dataset;

pub use agent_loop::{AgentLoop, LoopExit};
pub use dataset::DatasetUseCase;
