//! std::fs による FileSystem 実装

use crate::error::Error;
use crate::ports::outbound::FileSystem;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct StdFileSystem;

/// `<action> '<path>': <cause>` 形式の I/O エラー
fn fs_error(action: &str, path: &Path, e: std::io::Error) -> Error {
    Error::io_msg(format!("Failed to {} '{}': {}", action, path.display(), e))
}

impl FileSystem for StdFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, Error> {
        std::fs::read_to_string(path).map_err(|e| fs_error("read", path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), Error> {
        std::fs::write(path, contents).map_err(|e| fs_error("write", path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), Error> {
        std::fs::rename(from, to).map_err(|e| {
            fs_error(&format!("move '{}' over", from.display()), to, e)
        })
    }

    fn remove_file(&self, path: &Path) -> Result<(), Error> {
        std::fs::remove_file(path).map_err(|e| fs_error("remove", path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), Error> {
        std::fs::create_dir_all(path).map_err(|e| fs_error("create directory", path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>, Error> {
        let f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| fs_error("open for append", path, e))?;
        Ok(Box::new(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_write_read_rename() {
        let dir = tempfile::tempdir().unwrap();
        let fs = StdFileSystem;
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs.write(&a, "hello").unwrap();
        fs.rename(&a, &b).unwrap();
        assert!(!fs.exists(&a));
        assert_eq!(fs.read_to_string(&b).unwrap(), "hello");
        fs.remove_file(&b).unwrap();
        assert!(!fs.exists(&b));
    }

    #[test]
    fn test_open_append_appends() {
        let dir = tempfile::tempdir().unwrap();
        let fs = StdFileSystem;
        let p = dir.path().join("log.jsonl");
        for line in ["1\n", "2\n"] {
            let mut w = fs.open_append(&p).unwrap();
            w.write_all(line.as_bytes()).unwrap();
        }
        assert_eq!(fs.read_to_string(&p).unwrap(), "1\n2\n");
    }

    #[test]
    fn test_read_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let e = StdFileSystem
            .read_to_string(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(e, Error::Io(ref m) if m.contains("nope")));
    }
}
