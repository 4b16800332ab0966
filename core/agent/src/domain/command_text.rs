//! モデル出力からコマンド本文を取り出す

use common::error::Error;
use common::llm::prompt_template::OUTPUT_MARKER;

/// 生成の末尾に残りうる EOS トークン
const EOS_MARKERS: &[&str] = &["</s>", "<|endoftext|>", "<|end|>", "<eos>"];

const EXIT_WORDS: &[&str] = &["/q", "/bye", "exit", "quit"];

/// 終了語か（大文字小文字は区別しない）
pub fn is_exit_word(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    EXIT_WORDS.contains(&lower.as_str())
}

fn strip_eos(text: &str) -> Option<&str> {
    EOS_MARKERS.iter().find_map(|eos| text.strip_suffix(eos))
}

/// `prompt + 生成文` から最初の `### Output:` 以降を取り出し、前後の空白と末尾の EOS を除く。
///
/// 区切りが無い、または中身が空なら MalformedOutput。
pub fn extract_command(raw: &str) -> Result<String, Error> {
    let (_, after) = raw.split_once(OUTPUT_MARKER).ok_or_else(|| {
        Error::malformed_output("The model did not return a command in the expected format")
    })?;
    let mut command = after.trim();
    while let Some(stripped) = strip_eos(command) {
        command = stripped.trim_end();
    }
    if command.is_empty() {
        return Err(Error::malformed_output("The model returned an empty command"));
    }
    Ok(command.to_string())
}
