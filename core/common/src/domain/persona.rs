//! ペルソナ（system 指示）の扱い方
//!
//! 永続化する履歴とモデルへ送る文脈の関係を、起動時に選んだ方針で一意に決める。

use super::history::History;
use super::message::{Message, Role};

/// ペルソナの配置方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersonaPolicy {
    /// 送信時だけ system 指示として付与し、履歴には保存しない
    #[default]
    Transient,
    /// 履歴の先頭に system レコードとして保存し、切り詰めでも捨てない
    Pinned,
    /// 履歴が空のときだけ最初のユーザー発話の前に連結する（system role を持たないモデル向け）
    Inline,
}

impl PersonaPolicy {
    /// 文字列から方針を解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "transient" => Some(Self::Transient),
            "pinned" => Some(Self::Pinned),
            "inline" => Some(Self::Inline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Pinned => "pinned",
            Self::Inline => "inline",
        }
    }
}

/// モデルへ送る 1 ターン分の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub query: String,
    pub system_instruction: Option<String>,
    pub history: Vec<Message>,
}

/// 方針に従って (system 指示, 履歴, クエリ) を組み立てる
///
/// `context` はメモリから取得した直近の履歴。Pinned では既に先頭に persona が入っている前提。
pub fn compose_request(
    policy: PersonaPolicy,
    persona: Option<&str>,
    context: &History,
    query: &str,
) -> ChatRequest {
    let persona = persona.map(str::trim).filter(|p| !p.is_empty());
    match policy {
        PersonaPolicy::Transient => ChatRequest {
            query: query.to_string(),
            system_instruction: persona.map(str::to_string),
            history: context
                .messages()
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned()
                .collect(),
        },
        PersonaPolicy::Pinned => ChatRequest {
            query: query.to_string(),
            system_instruction: None,
            history: context.messages().to_vec(),
        },
        PersonaPolicy::Inline => {
            let query = match persona {
                Some(p) if context.is_empty() => format!("{}\n\n{}", p, query),
                _ => query.to_string(),
            };
            ChatRequest {
                query,
                system_instruction: None,
                history: context.messages().to_vec(),
            }
        }
    }
}
