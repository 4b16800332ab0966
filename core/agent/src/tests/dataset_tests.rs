//! DatasetUseCase のテスト

use std::sync::Arc;

use common::adapter::{NoopLog, StdFileSystem};

use crate::usecase::DatasetUseCase;

fn usecase() -> DatasetUseCase {
    DatasetUseCase::new(Arc::new(StdFileSystem), Arc::new(NoopLog))
}

#[test]
fn test_convert_writes_text_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dataset.jsonl");
    let output = dir.path().join("out").join("train.jsonl");
    std::fs::write(
        &input,
        "{\"instruction\":\"Open the browser\",\"output\":\"xdg-open https://example.com\"}\n\
         {\"instruction\":\"Show the date\",\"output\":\"date\"}\n",
    )
    .unwrap();

    let count = usecase().convert(&input, &output).unwrap();
    assert_eq!(count, 2);

    let written = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    let v: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(v["text"], "### Instruction:\nShow the date\n\n### Output:\ndate");
}

#[test]
fn test_invalid_record_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dataset.jsonl");
    let output = dir.path().join("train.jsonl");
    std::fs::write(&input, "{\"instruction\":\"a\",\"output\":\"b\"}\nnot json\n").unwrap();

    let err = usecase().convert(&input, &output).unwrap_err();
    assert!(err.to_string().contains("line 2"), "{}", err);
    assert!(!output.exists());
}

#[test]
fn test_missing_or_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("train.jsonl");
    let missing = dir.path().join("missing.jsonl");
    let err = usecase().convert(&missing, &output).unwrap_err();
    assert_eq!(err.exit_code(), 74);
    let msg = err.to_string();
    assert_eq!(msg.matches(&*missing.display().to_string()).count(), 1, "{}", msg);

    let empty = dir.path().join("empty.jsonl");
    std::fs::write(&empty, "\n\n").unwrap();
    assert!(usecase().convert(&empty, &output).is_err());
}
