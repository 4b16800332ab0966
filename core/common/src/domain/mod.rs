//! ドメイン型
//!
//! 会話レコードと履歴、ペルソナ方針、設定まわりの名前型。

pub mod history;
pub mod message;
pub mod persona;

use std::path::{Path, PathBuf};

pub use history::History;
pub use message::{Message, Role};
pub use persona::{compose_request, ChatRequest, PersonaPolicy};

/// 設定ディレクトリ（profiles.json と logs/ を置く）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeDir(PathBuf);

impl HomeDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.0.join("profiles.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.0.join("logs")
    }
}

/// 文字列を包む名前型。`&str` として読めるが、取り違えは型で防ぐ。
macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

name_type!(
    /// プロファイル名（gpt, gemini, profiles.json のキー）
    ProviderName
);
name_type!(
    /// モデル名（gpt-3.5-turbo, gemini-1.5-flash 等）
    ModelName
);
