//! ローカルモデル用のプロンプトテンプレート
//!
//! トークナイザ側のチャットテンプレートは使わず、固定の書式で文字列を組み立てる。
//! BOS はトークナイズ時に付くので先頭には書かない。

use crate::domain::{Message, Role};

/// 指示チューニング用データセットの出力見出し
pub const OUTPUT_MARKER: &str = "### Output:";
pub const INSTRUCTION_MARKER: &str = "### Instruction:";

/// プロンプト書式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptTemplate {
    /// `[INST] <<SYS>> ... <</SYS>> ... [/INST]`
    #[default]
    Llama2,
    /// `<|start_header_id|>role<|end_header_id|> ... <|eot_id|>`
    Llama3,
    /// `### Instruction:` / `### Output:`（ファインチューニング済みエージェント用）
    Instruction,
}

impl PromptTemplate {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "llama2" | "llama-2" => Some(Self::Llama2),
            "llama3" | "llama-3" => Some(Self::Llama3),
            "instruction" | "alpaca" => Some(Self::Instruction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llama2 => "llama2",
            Self::Llama3 => "llama3",
            Self::Instruction => "instruction",
        }
    }

    /// stop が設定されていないときに使う停止文字列
    pub fn default_stop(&self) -> Vec<String> {
        let stops: &[&str] = match self {
            Self::Llama2 => &["</s>"],
            Self::Llama3 => &["<|eot_id|>"],
            Self::Instruction => &["</s>", INSTRUCTION_MARKER],
        };
        stops.iter().map(|s| s.to_string()).collect()
    }

    /// system 指示・履歴・今回の発話から生成用プロンプトを作る
    ///
    /// 履歴中の system レコードは system 指示に合流させる。
    pub fn render_chat(&self, system: Option<&str>, history: &[Message], query: &str) -> String {
        let mut system_parts: Vec<&str> = Vec::new();
        if let Some(s) = system {
            system_parts.push(s);
        }
        system_parts.extend(
            history
                .iter()
                .filter(|m| m.role == Role::System)
                .map(|m| m.content.as_str()),
        );
        let system_text = system_parts.join("\n");
        let system_text = Some(system_text.trim()).filter(|s| !s.is_empty());
        let turns = history.iter().filter(|m| m.role != Role::System);

        match self {
            Self::Llama2 => render_llama2(system_text, turns, query),
            Self::Llama3 => render_llama3(system_text, turns, query),
            Self::Instruction => {
                let body = match system_text {
                    Some(s) => format!("{}\n\n{}", s, query),
                    None => query.to_string(),
                };
                instruction_prompt(&body)
            }
        }
    }
}

fn render_llama2<'a>(
    system: Option<&str>,
    turns: impl Iterator<Item = &'a Message>,
    query: &str,
) -> String {
    let mut out = String::new();
    let mut system = system;
    let mut open_inst = |out: &mut String, user: &str| {
        match system.take() {
            Some(s) => out.push_str(&format!("[INST] <<SYS>>\n{}\n<</SYS>>\n\n{} [/INST]", s, user)),
            None => out.push_str(&format!("[INST] {} [/INST]", user)),
        }
    };
    for msg in turns {
        match msg.role {
            Role::User => open_inst(&mut out, &msg.content),
            Role::Assistant => out.push_str(&format!(" {} </s><s>", msg.content)),
            Role::System => {}
        }
    }
    open_inst(&mut out, query);
    out
}

fn render_llama3<'a>(
    system: Option<&str>,
    turns: impl Iterator<Item = &'a Message>,
    query: &str,
) -> String {
    let header = |role: &str, content: &str| {
        format!(
            "<|start_header_id|>{}<|end_header_id|>\n\n{}<|eot_id|>",
            role, content
        )
    };
    let mut out = String::new();
    if let Some(s) = system {
        out.push_str(&header("system", s));
    }
    for msg in turns {
        out.push_str(&header(msg.role.as_str(), &msg.content));
    }
    out.push_str(&header("user", query));
    out.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n");
    out
}

/// 出力が空の指示プロンプト（生成はこの続きから始まる）
pub fn instruction_prompt(instruction: &str) -> String {
    format!("{}\n{}\n\n{}\n", INSTRUCTION_MARKER, instruction, OUTPUT_MARKER)
}

/// 学習用テキスト（指示 + 期待出力）
pub fn training_text(instruction: &str, output: &str) -> String {
    format!(
        "{}\n{}\n\n{}\n{}",
        INSTRUCTION_MARKER, instruction, OUTPUT_MARKER, output
    )
}

/// 生成テキスト中で最初に現れる停止文字列の位置
pub fn stop_position(text: &str, stops: &[String]) -> Option<usize> {
    stops
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(PromptTemplate::from_str("Llama2"), Some(PromptTemplate::Llama2));
        assert_eq!(PromptTemplate::from_str("llama3"), Some(PromptTemplate::Llama3));
        assert_eq!(PromptTemplate::from_str("alpaca"), Some(PromptTemplate::Instruction));
        assert_eq!(PromptTemplate::from_str("chatml"), None);
    }

    #[test]
    fn test_llama2_single_turn_matches_fixed_format() {
        let p = PromptTemplate::Llama2.render_chat(Some("Be kind."), &[], "Salom");
        assert_eq!(p, "[INST] <<SYS>>\nBe kind.\n<</SYS>>\n\nSalom [/INST]");
    }

    #[test]
    fn test_llama2_without_system() {
        let p = PromptTemplate::Llama2.render_chat(None, &[], "Salom");
        assert_eq!(p, "[INST] Salom [/INST]");
    }

    #[test]
    fn test_llama2_multi_turn() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let p = PromptTemplate::Llama2.render_chat(Some("sys"), &history, "again");
        assert_eq!(
            p,
            "[INST] <<SYS>>\nsys\n<</SYS>>\n\nhi [/INST] hello </s><s>[INST] again [/INST]"
        );
    }

    #[test]
    fn test_system_records_merge_into_system() {
        let history = vec![Message::system("pinned persona"), Message::user("hi"), Message::assistant("yo")];
        let p = PromptTemplate::Llama3.render_chat(None, &history, "q");
        assert!(p.starts_with("<|start_header_id|>system<|end_header_id|>\n\npinned persona<|eot_id|>"));
        assert!(p.contains("<|start_header_id|>assistant<|end_header_id|>\n\nyo<|eot_id|>"));
        assert!(p.ends_with("<|start_header_id|>assistant<|end_header_id|>\n\n"));
    }

    #[test]
    fn test_instruction_prompt_and_training_text() {
        assert_eq!(
            instruction_prompt("list files"),
            "### Instruction:\nlist files\n\n### Output:\n"
        );
        assert_eq!(
            training_text("list files", "ls -la"),
            "### Instruction:\nlist files\n\n### Output:\nls -la"
        );
        assert_eq!(
            PromptTemplate::Instruction.render_chat(None, &[Message::user("ignored")], "pwd"),
            instruction_prompt("pwd")
        );
    }

    #[test]
    fn test_stop_position_picks_earliest() {
        let stops = vec!["</s>".to_string(), "### Instruction:".to_string()];
        assert_eq!(stop_position("ls -la\n### Instruction:\nx</s>", &stops), Some(7));
        assert_eq!(stop_position("ls -la", &stops), None);
        assert_eq!(stop_position("abc", &[String::new()]), None);
    }
}
