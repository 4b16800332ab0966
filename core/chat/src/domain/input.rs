//! 入力行の分類

/// 対話を終える合図
pub const EXIT_SENTINEL: &str = "/bye";

/// 1 行の入力が何を意味するか
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// `/bye`（大文字小文字は問わない）
    Exit,
    /// 空行（無視する）
    Empty,
    /// 新しいターン（前後の空白は除去済み）
    Turn(String),
}

pub fn classify(line: &str) -> UserInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        UserInput::Empty
    } else if trimmed.eq_ignore_ascii_case(EXIT_SENTINEL) {
        UserInput::Exit
    } else {
        UserInput::Turn(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("/bye"), UserInput::Exit);
        assert_eq!(classify("  /BYE \n"), UserInput::Exit);
        assert_eq!(classify(""), UserInput::Empty);
        assert_eq!(classify("   "), UserInput::Empty);
        assert_eq!(classify(" salom "), UserInput::Turn("salom".to_string()));
        assert_eq!(classify("/bye now"), UserInput::Turn("/bye now".to_string()));
    }
}
