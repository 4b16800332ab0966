//! コマンドエージェントの対話ループ
//!
//! 1 ターン: 指示 → 指示テンプレートで生成 → `### Output:` 以降を取り出す → 表示 →
//! 承認されたときだけ実行。生成の失敗や形式不正はそのターンだけを捨てる。

use crate::domain::{extract_command, is_exit_word};
use crate::ports::outbound::{
    Approval, CommandApproval, CommandOutput, CommandRunner, LineReader, Log, LogRecord,
    ReadOutcome,
};
use common::error::Error;
use common::llm::prompt_template::instruction_prompt;
use common::llm::ChatModel;
use std::io::Write;
use std::sync::Arc;

const RULE: &str = "======================";

/// ループを抜けた理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    ExitWord,
    Eof,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TurnOutcome {
    Executed(Option<i32>),
    Cancelled,
    ModelFailed,
    Malformed,
    RunFailed,
}

pub struct AgentLoop {
    model: Box<dyn ChatModel>,
    reader: Arc<dyn LineReader>,
    approval: Box<dyn CommandApproval>,
    runner: Box<dyn CommandRunner>,
    log: Arc<dyn Log>,
}

impl AgentLoop {
    pub fn new(
        model: Box<dyn ChatModel>,
        reader: Arc<dyn LineReader>,
        approval: Box<dyn CommandApproval>,
        runner: Box<dyn CommandRunner>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            model,
            reader,
            approval,
            runner,
            log,
        }
    }

    pub fn run(&self, out: &mut dyn Write) -> Result<LoopExit, Error> {
        writeln!(out, "Agent activated. Enter a command or /bye to quit.")?;
        let exit = loop {
            let line = match self.reader.read_line("Enter command: ")? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Eof => break LoopExit::Eof,
                ReadOutcome::Interrupted => break LoopExit::Interrupted,
            };
            if is_exit_word(&line) {
                break LoopExit::ExitWord;
            }
            let instruction = line.trim();
            if instruction.is_empty() {
                continue;
            }
            let outcome = self.turn(instruction, out)?;
            let _ = self.log.log(
                &LogRecord::info("turn finished")
                    .layer("usecase")
                    .kind("turn")
                    .field("outcome", format!("{:?}", outcome)),
            );
        };
        writeln!(out, "Agent deactivated.")?;
        Ok(exit)
    }

    fn turn(&self, instruction: &str, out: &mut dyn Write) -> Result<TurnOutcome, Error> {
        let prompt = instruction_prompt(instruction);
        let completion = match self.model.complete_raw(&prompt) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("ERROR: {}: {}", self.model.name(), e);
                self.log_error("generation failed", &e);
                return Ok(TurnOutcome::ModelFailed);
            }
        };
        let raw = format!("{}{}", prompt, completion);
        let command = match extract_command(&raw) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                let _ = self.log.log(
                    &LogRecord::warn("malformed model output")
                        .layer("usecase")
                        .kind("llm")
                        .field("completion", completion),
                );
                return Ok(TurnOutcome::Malformed);
            }
        };

        writeln!(out, "\n{}\n", RULE)?;
        writeln!(out, "{}", command)?;
        writeln!(out, "\n{}\n", RULE)?;
        out.flush()?;

        if self.approval.confirm(&command)? != Approval::Approved {
            writeln!(out, "Execution cancelled by user.\n")?;
            return Ok(TurnOutcome::Cancelled);
        }
        let _ = self.log.log(
            &LogRecord::info("executing command")
                .layer("usecase")
                .kind("exec")
                .field("command", command.as_str()),
        );
        match self.runner.run(&command) {
            Ok(output) => {
                report(&output, out)?;
                Ok(TurnOutcome::Executed(output.status))
            }
            Err(e) => {
                eprintln!("ERROR: {}", e);
                self.log_error("command failed to start", &e);
                Ok(TurnOutcome::RunFailed)
            }
        }
    }

    fn log_error(&self, message: &str, e: &Error) {
        let _ = self.log.log(
            &LogRecord::error(message)
                .layer("usecase")
                .field("model", self.model.name())
                .field("error", e.to_string()),
        );
    }
}

fn report(output: &CommandOutput, out: &mut dyn Write) -> Result<(), Error> {
    write!(out, "{}", output.stdout)?;
    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }
    match output.status {
        Some(0) => writeln!(out, "Executed.\n")?,
        Some(code) => writeln!(out, "Exited with status {}.\n", code)?,
        None => writeln!(out, "Terminated by signal.\n")?,
    }
    Ok(())
}
