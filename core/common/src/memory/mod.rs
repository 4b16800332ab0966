//! 会話メモリ（ファイルに永続化する直近 N 件の履歴）

pub mod window;

pub use window::{MemoryLoadError, MemoryWindow};
