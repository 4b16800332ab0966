//! `sh -c` で実行する CommandRunner 実装

use crate::ports::outbound::{CommandOutput, CommandRunner};
use common::error::Error;

#[derive(Debug, Clone, Default)]
pub struct ShRunner;

impl CommandRunner for ShRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, Error> {
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| Error::io_msg(format!("Failed to execute 'sh -c': {}", e)))?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout_and_status() {
        let out = ShRunner.run("echo hello").unwrap();
        assert_eq!(out.stdout, "hello\n");
        assert!(out.success());
    }

    #[test]
    fn test_captures_stderr_and_failure() {
        let out = ShRunner.run("echo oops >&2; exit 3").unwrap();
        assert_eq!(out.stderr, "oops\n");
        assert_eq!(out.status, Some(3));
        assert!(!out.success());
    }
}
