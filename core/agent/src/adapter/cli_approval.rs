//! 端末で y/n を尋ねる CommandApproval 実装

use crate::ports::outbound::{Approval, CommandApproval, LineReader, ReadOutcome};
use common::error::Error;
use std::sync::Arc;

pub struct CliApproval {
    reader: Arc<dyn LineReader>,
}

impl CliApproval {
    pub fn new(reader: Arc<dyn LineReader>) -> Self {
        Self { reader }
    }
}

impl CommandApproval for CliApproval {
    fn confirm(&self, _command: &str) -> Result<Approval, Error> {
        match self.reader.read_line("Execute this command? (y/n): ")? {
            ReadOutcome::Line(line) if line.trim().eq_ignore_ascii_case("y") => {
                Ok(Approval::Approved)
            }
            ReadOutcome::Line(_) | ReadOutcome::Eof | ReadOutcome::Interrupted => {
                Ok(Approval::Denied)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct One(std::cell::RefCell<Option<ReadOutcome>>);

    impl LineReader for One {
        fn read_line(&self, _prompt: &str) -> Result<ReadOutcome, Error> {
            Ok(self.0.borrow_mut().take().unwrap_or(ReadOutcome::Eof))
        }
    }

    fn ask(outcome: ReadOutcome) -> Approval {
        let approval = CliApproval::new(Arc::new(One(std::cell::RefCell::new(Some(outcome)))));
        approval.confirm("rm -rf build").unwrap()
    }

    #[test]
    fn test_only_y_approves() {
        assert_eq!(ask(ReadOutcome::Line("y".to_string())), Approval::Approved);
        assert_eq!(ask(ReadOutcome::Line(" Y ".to_string())), Approval::Approved);
        assert_eq!(ask(ReadOutcome::Line("yes".to_string())), Approval::Denied);
        assert_eq!(ask(ReadOutcome::Line("".to_string())), Approval::Denied);
        assert_eq!(ask(ReadOutcome::Line("n".to_string())), Approval::Denied);
    }

    #[test]
    fn test_eof_and_interrupt_deny() {
        assert_eq!(ask(ReadOutcome::Eof), Approval::Denied);
        assert_eq!(ask(ReadOutcome::Interrupted), Approval::Denied);
    }
}
