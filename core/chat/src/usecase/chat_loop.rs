//! 対話ループ
//!
//! 1 ターン: 入力 → 文脈取得 → 各モデルへ問い合わせ → 表示 → メモリへ追記。
//! モデルのエラーはそのターンだけを捨て、保存の失敗は報告して続ける。

use crate::domain::{classify, UserInput};
use crate::ports::outbound::{LineReader, Log, LogRecord, ReadOutcome};
use common::domain::{compose_request, ChatRequest, History, PersonaPolicy};
use common::error::Error;
use common::llm::ChatModel;
use common::memory::MemoryWindow;
use std::io::Write;
use std::sync::Arc;

/// ループを抜けた理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// `/bye`
    Sentinel,
    /// 入力の終端
    Eof,
    /// Ctrl+C
    Interrupted,
}

/// 1 ターンの結果（ログ・テスト用）
#[derive(Debug, Clone, PartialEq, Eq)]
enum TurnOutcome {
    Saved,
    NotPersisted,
    SaveFailed,
    ModelFailed,
}

pub struct ChatLoop {
    models: Vec<Box<dyn ChatModel>>,
    memory: Option<MemoryWindow>,
    persona: Option<String>,
    policy: PersonaPolicy,
    reader: Arc<dyn LineReader>,
    log: Arc<dyn Log>,
}

impl ChatLoop {
    pub fn new(
        models: Vec<Box<dyn ChatModel>>,
        memory: Option<MemoryWindow>,
        persona: Option<String>,
        policy: PersonaPolicy,
        reader: Arc<dyn LineReader>,
        log: Arc<dyn Log>,
    ) -> Result<Self, Error> {
        if models.is_empty() {
            return Err(Error::invalid_argument("No model selected"));
        }
        Ok(Self {
            models,
            memory,
            persona,
            policy,
            reader,
            log,
        })
    }

    /// `/bye`・EOF・Ctrl+C まで対話を続ける
    pub fn run(&self, out: &mut dyn Write) -> Result<LoopExit, Error> {
        writeln!(out, "End the dialogue with -------> '/bye'")?;
        let exit = loop {
            let line = match self.reader.read_line("\nUser: ")? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Eof => break LoopExit::Eof,
                ReadOutcome::Interrupted => break LoopExit::Interrupted,
            };
            match classify(&line) {
                UserInput::Exit => break LoopExit::Sentinel,
                UserInput::Empty => continue,
                UserInput::Turn(text) => {
                    let outcome = self.turn(&text, out)?;
                    let _ = self.log.log(
                        &LogRecord::debug("turn finished")
                            .layer("usecase")
                            .kind("turn")
                            .field("outcome", format!("{:?}", outcome)),
                    );
                }
            }
        };
        writeln!(out, "\nBye!")?;
        Ok(exit)
    }

    fn context(&self) -> History {
        self.memory
            .as_ref()
            .map(|m| m.get_context())
            .unwrap_or_default()
    }

    fn turn(&self, text: &str, out: &mut dyn Write) -> Result<TurnOutcome, Error> {
        let context = self.context();
        let request = compose_request(self.policy, self.persona.as_deref(), &context, text);
        writeln!(out, "Thinking...")?;

        let answers = match self.ask_all(&request) {
            Ok(answers) => answers,
            Err((name, e)) => {
                eprintln!("ERROR: {}: {}", name, e);
                let _ = self.log.log(
                    &LogRecord::error("model request failed")
                        .layer("usecase")
                        .kind("llm")
                        .field("model", name)
                        .field("error", e.to_string()),
                );
                return Ok(TurnOutcome::ModelFailed);
            }
        };

        let stored = render_answers(&answers, out)?;

        let memory = match self.memory {
            Some(ref m) => m,
            None => return Ok(TurnOutcome::NotPersisted),
        };
        match memory.append_turn(text, &stored) {
            Ok(()) => Ok(TurnOutcome::Saved),
            Err(e) => {
                eprintln!("ERROR: failed to save memory: {}", e);
                let _ = self.log.log(
                    &LogRecord::warn("memory save failed")
                        .layer("usecase")
                        .kind("memory")
                        .field("path", memory.path().display().to_string())
                        .field("error", e.to_string()),
                );
                Ok(TurnOutcome::SaveFailed)
            }
        }
    }

    /// 全モデルに同じ問い合わせをする。1 つでも失敗したらそのモデル名とエラーを返す。
    fn ask_all(&self, request: &ChatRequest) -> Result<Vec<(String, String)>, (String, Error)> {
        let mut answers = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let _ = self.log.log(
                &LogRecord::info("model request")
                    .layer("usecase")
                    .kind("llm")
                    .field("model", model.name())
                    .field("history", request.history.len()),
            );
            let text = model
                .complete(
                    &request.query,
                    request.system_instruction.as_deref(),
                    &request.history,
                )
                .map_err(|e| (model.name().to_string(), e))?;
            answers.push((model.name().to_string(), text));
        }
        Ok(answers)
    }
}

/// 応答を表示し、メモリに保存する assistant 本文を返す
fn render_answers(answers: &[(String, String)], out: &mut dyn Write) -> Result<String, Error> {
    if let [(name, text)] = answers {
        writeln!(out, "\n{}: {}", name, text)?;
        return Ok(text.clone());
    }
    for (name, text) in answers {
        writeln!(out, "\n=== {} ===", name)?;
        writeln!(out, "{}", text)?;
    }
    Ok(answers
        .iter()
        .map(|(name, text)| format!("{}: {}", name, text))
        .collect::<Vec<_>>()
        .join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_answer() {
        let mut out = Vec::new();
        let stored = render_answers(&[("ChatGPT".to_string(), "Salom!".to_string())], &mut out).unwrap();
        assert_eq!(stored, "Salom!");
        assert_eq!(String::from_utf8(out).unwrap(), "\nChatGPT: Salom!\n");
    }

    #[test]
    fn test_render_compare_answers() {
        let mut out = Vec::new();
        let stored = render_answers(
            &[
                ("ChatGPT".to_string(), "a".to_string()),
                ("Gemini".to_string(), "b".to_string()),
            ],
            &mut out,
        )
        .unwrap();
        assert_eq!(stored, "ChatGPT: a\n\nGemini: b");
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("=== ChatGPT ===\na\n"));
        assert!(shown.contains("=== Gemini ===\nb\n"));
    }
}
