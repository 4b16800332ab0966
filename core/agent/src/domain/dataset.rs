//! 微調整用データセット（JSONL）
//!
//! 入力は 1 行 1 レコードの `{"instruction": ..., "output": ...}`。
//! 出力は学習器が読む `{"text": ...}`。

use common::error::Error;
use common::llm::prompt_template::training_text;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetRecord {
    pub instruction: String,
    pub output: String,
}

impl DatasetRecord {
    pub fn to_training_line(&self) -> TrainingLine {
        TrainingLine {
            text: training_text(&self.instruction, &self.output),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingLine {
    pub text: String,
}

/// JSONL を解析する。空行は飛ばし、エラーは 1 始まりの行番号を含める。
pub fn parse_dataset(contents: &str) -> Result<Vec<DatasetRecord>, Error> {
    let mut records = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: DatasetRecord = serde_json::from_str(line)
            .map_err(|e| Error::json(format!("line {}: {}", i + 1, e)))?;
        if record.instruction.trim().is_empty() {
            return Err(Error::json(format!("line {}: empty \"instruction\"", i + 1)));
        }
        records.push(record);
    }
    Ok(records)
}
