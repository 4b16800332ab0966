//! ユースケース

pub mod chat_loop;

pub use chat_loop::{ChatLoop, LoopExit};
