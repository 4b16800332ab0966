//! 会話履歴のドメイン型
//!
//! 挿入順を保ったメッセージ列。ファイルには JSON 配列としてそのまま書き出す。

use super::message::{Message, Role};
use serde::{Deserialize, Serialize};

/// 会話履歴（メッセージ列）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        History {
            messages: Vec::new(),
        }
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        History { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 先頭が system レコードか
    pub fn starts_with_system(&self) -> bool {
        self.messages
            .first()
            .map_or(false, |m| m.role == Role::System)
    }

    /// 古いものから捨てて直近 `max` 件だけ残す
    pub fn truncate_to_last(&mut self, max: usize) {
        if self.messages.len() > max {
            let excess = self.messages.len() - max;
            self.messages.drain(..excess);
        }
    }

    /// 先頭の system レコードを残したまま、全体が `max` 件以下になるよう古いものから捨てる。
    /// 先頭が system でなければ `truncate_to_last` と同じ。
    pub fn truncate_keeping_head_system(&mut self, max: usize) {
        if !self.starts_with_system() || max == 0 {
            self.truncate_to_last(max);
            return;
        }
        if self.messages.len() > max {
            let excess = self.messages.len() - max;
            self.messages.drain(1..1 + excess);
        }
    }

    /// 位置 0 の system レコードを persona にする。
    /// 先頭が system でなければ挿入し、内容が違えば置き換える。
    pub fn set_system_head(&mut self, persona: &str) {
        match self.messages.first_mut() {
            Some(head) if head.role == Role::System => {
                if head.content != persona {
                    head.content = persona.to_string();
                }
            }
            _ => self.messages.insert(0, Message::system(persona)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> History {
        let mut h = History::new();
        for i in 1..=n {
            if i % 2 == 1 {
                h.push_user(format!("m{}", i));
            } else {
                h.push_assistant(format!("m{}", i));
            }
        }
        h
    }

    #[test]
    fn test_truncate_to_last_keeps_newest() {
        let mut h = numbered(12);
        h.truncate_to_last(10);
        assert_eq!(h.len(), 10);
        assert_eq!(h.messages()[0].content, "m3");
        assert_eq!(h.messages()[9].content, "m12");
    }

    #[test]
    fn test_truncate_to_last_noop_when_short() {
        let mut h = numbered(4);
        h.truncate_to_last(10);
        assert_eq!(h, numbered(4));
    }

    #[test]
    fn test_truncate_to_zero_clears() {
        let mut h = numbered(3);
        h.truncate_to_last(0);
        assert!(h.is_empty());
    }

    #[test]
    fn test_truncate_keeping_head_system() {
        let mut h = numbered(10);
        h.set_system_head("persona");
        assert_eq!(h.len(), 11);
        h.truncate_keeping_head_system(5);
        assert_eq!(h.len(), 5);
        assert_eq!(h.messages()[0], Message::system("persona"));
        assert_eq!(h.messages()[1].content, "m7");
        assert_eq!(h.messages()[4].content, "m10");
    }

    #[test]
    fn test_truncate_keeping_head_without_system_is_fifo() {
        let mut h = numbered(6);
        h.truncate_keeping_head_system(4);
        assert_eq!(h.messages()[0].content, "m3");
    }

    #[test]
    fn test_set_system_head_is_idempotent() {
        let mut h = numbered(2);
        h.set_system_head("p");
        h.set_system_head("p");
        assert_eq!(h.len(), 3);
        assert_eq!(h.messages()[0], Message::system("p"));
    }

    #[test]
    fn test_set_system_head_replaces_changed_persona() {
        let mut h = numbered(2);
        h.set_system_head("old");
        h.set_system_head("new");
        assert_eq!(h.len(), 3);
        assert_eq!(h.messages()[0], Message::system("new"));
        assert_eq!(h.messages()[1].content, "m1");
    }

    #[test]
    fn test_serialized_as_plain_array() {
        let h = numbered(2);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(
            json,
            r#"[{"role":"user","content":"m1"},{"role":"assistant","content":"m2"}]"#
        );
    }
}
