//! 端末に番号付きメニューを出してモデルを選ばせる

use crate::ports::outbound::{LineReader, MenuChoice, ModelMenu, ReadOutcome};
use common::error::Error;
use std::sync::Arc;

const MENU: &str = "
    ||============||
    ||   Models   ||
    ||============||
    || 1. ChatGPT ||
    || 2. Gemini  ||
    || 3. Both    ||
    ||============||
";

/// CLI のモデル選択メニュー
pub struct CliModelMenu {
    reader: Arc<dyn LineReader>,
}

impl CliModelMenu {
    pub fn new(reader: Arc<dyn LineReader>) -> Self {
        Self { reader }
    }
}

impl ModelMenu for CliModelMenu {
    fn choose(&self) -> Result<Option<MenuChoice>, Error> {
        println!("{}", MENU);
        loop {
            match self.reader.read_line("Enter your choice: ")? {
                ReadOutcome::Line(line) => match MenuChoice::from_number(&line) {
                    Some(choice) => return Ok(Some(choice)),
                    None => eprintln!("ERROR: Invalid choice, enter 1, 2 or 3"),
                },
                ReadOutcome::Eof | ReadOutcome::Interrupted => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Scripted(RefCell<VecDeque<ReadOutcome>>);

    impl LineReader for Scripted {
        fn read_line(&self, _prompt: &str) -> Result<ReadOutcome, Error> {
            Ok(self.0.borrow_mut().pop_front().unwrap_or(ReadOutcome::Eof))
        }
    }

    fn menu(lines: Vec<ReadOutcome>) -> CliModelMenu {
        CliModelMenu::new(Arc::new(Scripted(RefCell::new(lines.into()))))
    }

    #[test]
    fn test_retries_until_valid() {
        let m = menu(vec![
            ReadOutcome::Line("4".to_string()),
            ReadOutcome::Line("gpt".to_string()),
            ReadOutcome::Line(" 3 ".to_string()),
        ]);
        assert_eq!(m.choose().unwrap(), Some(MenuChoice::Both));
    }

    #[test]
    fn test_eof_means_no_choice() {
        assert_eq!(menu(vec![]).choose().unwrap(), None);
        assert_eq!(menu(vec![ReadOutcome::Interrupted]).choose().unwrap(), None);
    }

    #[test]
    fn test_choice_profiles() {
        let names: Vec<String> = MenuChoice::Both
            .profiles()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(names, vec!["gpt", "gemini"]);
    }
}
