//! データセット整形（JSONL → 学習テキスト JSONL）

use crate::domain::{parse_dataset, TrainingLine};
use crate::ports::outbound::{FileSystem, Log, LogRecord};
use common::error::Error;
use std::path::Path;
use std::sync::Arc;

pub struct DatasetUseCase {
    fs: Arc<dyn FileSystem>,
    log: Arc<dyn Log>,
}

impl DatasetUseCase {
    pub fn new(fs: Arc<dyn FileSystem>, log: Arc<dyn Log>) -> Self {
        Self { fs, log }
    }

    /// 入力を検証し、学習テキストを書き出す。書き出した件数を返す。
    /// 1 件でも不正なら何も書かない。
    pub fn convert(&self, input: &Path, output: &Path) -> Result<usize, Error> {
        let contents = self.fs.read_to_string(input)?;
        let records = parse_dataset(&contents)
            .map_err(|e| Error::json(format!("{}: {}", input.display(), e)))?;
        if records.is_empty() {
            return Err(Error::json(format!("{}: no records", input.display())));
        }

        let mut body = String::new();
        for record in &records {
            let line: TrainingLine = record.to_training_line();
            body.push_str(&serde_json::to_string(&line)?);
            body.push('\n');
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent)?;
        }
        self.fs.write(output, &body)?;

        let _ = self.log.log(
            &LogRecord::info("dataset written")
                .layer("usecase")
                .kind("dataset")
                .field("input", input.display().to_string())
                .field("output", output.display().to_string())
                .field("records", records.len()),
        );
        Ok(records.len())
    }
}
