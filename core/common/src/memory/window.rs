//! 会話メモリウィンドウ
//!
//! JSON ファイル 1 つに履歴を丸ごと保存する（read-modify-write）。
//! 保存のたびに直近 `max_records` 件へ切り詰める。古いものから捨てる。
//! ペルソナを固定（pinned）する場合は先頭の system レコードだけは捨てない。

use crate::domain::History;
use crate::error::Error;
use crate::ports::outbound::{FileSystem, Log, LogRecord};
use crate::adapter::NoopLog;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 履歴ファイルの読み込み失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryLoadError {
    /// ファイルはあるが読めない（権限・ディレクトリなど）
    #[error("memory file '{path}' is unreadable: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    /// 中身がメッセージ配列の JSON として解釈できない
    #[error("memory file '{path}' is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// 永続化された会話履歴への窓口
pub struct MemoryWindow {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    max_records: usize,
    pinned_persona: Option<String>,
    log: Arc<dyn Log>,
}

impl MemoryWindow {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl AsRef<Path>, max_records: usize) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
            max_records,
            pinned_persona: None,
            log: Arc::new(NoopLog),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn Log>) -> Self {
        self.log = log;
        self
    }

    /// ペルソナを履歴の先頭に固定する。空白のみの文字列は無視する。
    pub fn with_pinned_persona(mut self, persona: impl Into<String>) -> Self {
        let persona = persona.into();
        if !persona.trim().is_empty() {
            self.pinned_persona = Some(persona.trim().to_string());
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// 履歴ファイルを読む。ファイルが無ければ空の履歴。
    pub fn load(&self) -> Result<History, MemoryLoadError> {
        if !self.fs.exists(&self.path) {
            return Ok(History::new());
        }
        let content =
            self.fs
                .read_to_string(&self.path)
                .map_err(|e| MemoryLoadError::Unreadable {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;
        serde_json::from_str::<History>(&content).map_err(|e| MemoryLoadError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// 読み込みに失敗したら警告ログを残して空の履歴から始める
    pub fn load_or_empty(&self) -> History {
        match self.load() {
            Ok(history) => history,
            Err(e) => {
                let _ = self.log.log(
                    &LogRecord::warn("memory load failed, starting with empty history")
                        .layer("adapter")
                        .kind("memory")
                        .field("path", self.path.display().to_string())
                        .field("error", e.to_string()),
                );
                History::new()
            }
        }
    }

    /// 切り詰めてから一時ファイルへ書き、rename で置き換える
    pub fn save(&self, history: &History) -> Result<(), Error> {
        let mut history = history.clone();
        self.bound(&mut history);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                self.fs.create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&history)?;
        let tmp = self.tmp_path();
        self.fs.write(&tmp, &json)?;
        if let Err(e) = self.fs.rename(&tmp, &self.path) {
            let _ = self.fs.remove_file(&tmp);
            return Err(e);
        }
        let _ = self.log.log(
            &LogRecord::debug("memory saved")
                .layer("adapter")
                .kind("memory")
                .field("records", history.len()),
        );
        Ok(())
    }

    /// 1 ターン（ユーザー発話 + 応答）を追記して保存する
    pub fn append_turn(&self, user_text: &str, assistant_text: &str) -> Result<(), Error> {
        let mut history = self.load_or_empty();
        if let Some(ref persona) = self.pinned_persona {
            history.set_system_head(persona);
        }
        history.push_user(user_text);
        history.push_assistant(assistant_text);
        self.save(&history)
    }

    /// モデルへ渡す直近の履歴。pinned のときは先頭にペルソナが入る（保存はしない）。
    pub fn get_context(&self) -> History {
        let mut history = self.load_or_empty();
        if let Some(ref persona) = self.pinned_persona {
            history.set_system_head(persona);
        }
        self.bound(&mut history);
        history
    }

    fn bound(&self, history: &mut History) {
        if self.pinned_persona.is_some() {
            history.truncate_keeping_head_system(self.max_records);
        } else {
            history.truncate_to_last(self.max_records);
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StdFileSystem;
    use crate::domain::{Message, Role};
    use crate::ports::outbound::LogLevel;
    use std::sync::Mutex;

    struct RecordingLog(Mutex<Vec<LogRecord>>);

    impl Log for RecordingLog {
        fn log(&self, record: &LogRecord) -> Result<(), Error> {
            self.0.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn window(dir: &Path, max: usize) -> MemoryWindow {
        MemoryWindow::new(Arc::new(StdFileSystem), dir.join("memory.json"), max)
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(window(dir.path(), 10).load().unwrap(), History::new());
    }

    #[test]
    fn test_load_corrupt_is_err_and_load_or_empty_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memory.json"), "{not json").unwrap();
        let log = Arc::new(RecordingLog(Mutex::new(Vec::new())));
        let w = window(dir.path(), 10).with_log(log.clone());

        assert!(matches!(w.load(), Err(MemoryLoadError::Corrupt { .. })));
        assert!(w.load_or_empty().is_empty());
        let records = log.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Warn);
    }

    #[test]
    fn test_load_wrong_shape_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("memory.json"),
            r#"[{"role":"model","content":"x"}]"#,
        )
        .unwrap();
        assert!(matches!(
            window(dir.path(), 10).load(),
            Err(MemoryLoadError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_load_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("memory.json")).unwrap();
        assert!(matches!(
            window(dir.path(), 10).load(),
            Err(MemoryLoadError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let w = window(dir.path(), 10);
        let mut h = History::new();
        h.push_user("こんにちは");
        h.push_assistant("Hello!");
        w.save(&h).unwrap();
        assert_eq!(w.load().unwrap(), h);
        assert!(!dir.path().join("memory.json.tmp").exists());
    }

    #[test]
    fn test_saved_file_is_pretty_and_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        let w = window(dir.path(), 10);
        w.append_turn("Привет", "Salom").unwrap();
        let text = std::fs::read_to_string(w.path()).unwrap();
        assert!(text.contains("Привет"));
        assert!(text.contains('\n'));
        assert!(text.trim_start().starts_with('['));
    }

    #[test]
    fn test_six_turns_keep_last_ten() {
        let dir = tempfile::tempdir().unwrap();
        let w = window(dir.path(), 10);
        let mut n = 0;
        for _ in 0..6 {
            let u = format!("r{}", n + 1);
            let a = format!("r{}", n + 2);
            w.append_turn(&u, &a).unwrap();
            n += 2;
        }
        let h = w.load().unwrap();
        assert_eq!(h.len(), 10);
        assert_eq!(h.messages()[0].content, "r3");
        assert_eq!(h.messages()[9].content, "r12");
    }

    #[test]
    fn test_append_never_exceeds_max() {
        let dir = tempfile::tempdir().unwrap();
        for max in [1usize, 2, 3, 7] {
            let w = MemoryWindow::new(
                Arc::new(StdFileSystem),
                dir.path().join(format!("m{}.json", max)),
                max,
            );
            let mut all = Vec::new();
            for i in 0..5 {
                let (u, a) = (format!("u{}", i), format!("a{}", i));
                w.append_turn(&u, &a).unwrap();
                all.push(u);
                all.push(a);
                let h = w.load().unwrap();
                assert!(h.len() <= max);
                let expected: Vec<&String> = all.iter().skip(all.len().saturating_sub(max)).collect();
                let got: Vec<&String> = h.messages().iter().map(|m| &m.content).collect();
                assert_eq!(got, expected);
            }
        }
    }

    #[test]
    fn test_corrupt_file_append_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memory.json"), "garbage").unwrap();
        let w = window(dir.path(), 10);
        w.append_turn("hi", "hello").unwrap();
        let h = w.load().unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h.messages()[0], Message::user("hi"));
    }

    #[test]
    fn test_save_failure_is_err() {
        let dir = tempfile::tempdir().unwrap();
        // 保存先がディレクトリなので rename が失敗する
        std::fs::create_dir(dir.path().join("memory.json")).unwrap();
        std::fs::write(dir.path().join("memory.json").join("x"), "").unwrap();
        let w = window(dir.path(), 10);
        assert!(w.append_turn("hi", "hello").is_err());
        assert!(!dir.path().join("memory.json.tmp").exists());
    }

    #[test]
    fn test_pinned_persona_survives_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let w = window(dir.path(), 4).with_pinned_persona("You are Dilshod.");
        for i in 0..3 {
            w.append_turn(&format!("u{}", i), &format!("a{}", i)).unwrap();
        }
        let h = w.load().unwrap();
        assert_eq!(h.len(), 4);
        assert_eq!(h.messages()[0], Message::system("You are Dilshod."));
        assert_eq!(h.messages()[1].content, "a1");
        assert_eq!(h.messages()[3].content, "a2");
    }

    #[test]
    fn test_pinned_persona_change_replaces_head() {
        let dir = tempfile::tempdir().unwrap();
        window(dir.path(), 10)
            .with_pinned_persona("persona A")
            .append_turn("q1", "r1")
            .unwrap();

        let w = window(dir.path(), 10).with_pinned_persona("persona B");
        let ctx = w.get_context();
        assert_eq!(ctx.messages()[0], Message::system("persona B"));
        assert_eq!(ctx.len(), 3);

        w.append_turn("q2", "r2").unwrap();
        let h = w.load().unwrap();
        assert_eq!(h.len(), 5);
        assert_eq!(h.messages()[0], Message::system("persona B"));
        assert_eq!(h.messages().iter().filter(|m| m.role == Role::System).count(), 1);
    }

    #[test]
    fn test_get_context_pinned_inserts_persona_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let w = window(dir.path(), 10).with_pinned_persona("persona");
        let ctx = w.get_context();
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.messages()[0].role, Role::System);
        assert!(!w.path().exists());
    }

    #[test]
    fn test_get_context_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = History::new();
        for i in 0..8 {
            h.push_user(format!("m{}", i));
        }
        std::fs::write(
            dir.path().join("memory.json"),
            serde_json::to_string(&h).unwrap(),
        )
        .unwrap();
        let ctx = window(dir.path(), 3).get_context();
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.messages()[0].content, "m5");
    }
}
