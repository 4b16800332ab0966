//! stdin から 1 行ずつ読む LineReader 実装
//!
//! 読み取りは専用スレッドで行い、待機中は InterruptChecker をポーリングする。
//! これにより入力待ちの間でも Ctrl+C でループを抜けられる。

use crate::error::Error;
use crate::ports::outbound::{InterruptChecker, LineReader, ReadOutcome};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 読み取りスレッドから届く 1 件
type Incoming = io::Result<Option<String>>;

/// stdin の行リーダー
pub struct StdinLineReader {
    rx: Mutex<Receiver<Incoming>>,
    interrupt_checker: Arc<dyn InterruptChecker>,
}

impl StdinLineReader {
    /// 読み取りスレッドを起動する。プロセスにつき 1 つだけ作ること。
    pub fn spawn(interrupt_checker: Arc<dyn InterruptChecker>) -> Self {
        let (tx, rx) = mpsc::channel::<Incoming>();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            let mut lock = stdin.lock();
            loop {
                let mut line = String::new();
                let item = match lock.read_line(&mut line) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(strip_newline(line))),
                    Err(e) => Err(e),
                };
                let done = !matches!(item, Ok(Some(_)));
                if tx.send(item).is_err() || done {
                    break;
                }
            }
        });
        Self {
            rx: Mutex::new(rx),
            interrupt_checker,
        }
    }
}

fn strip_newline(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

impl LineReader for StdinLineReader {
    fn read_line(&self, prompt: &str) -> Result<ReadOutcome, Error> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let rx = self
            .rx
            .lock()
            .map_err(|_| Error::system("stdin reader lock poisoned"))?;
        loop {
            if self.interrupt_checker.take_interrupt() {
                return Ok(ReadOutcome::Interrupted);
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(Some(line))) => return Ok(ReadOutcome::Line(line)),
                Ok(Ok(None)) => return Ok(ReadOutcome::Eof),
                Ok(Err(e)) => return Err(Error::io_msg(format!("Failed to read stdin: {}", e))),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(ReadOutcome::Eof),
            }
        }
    }
}
