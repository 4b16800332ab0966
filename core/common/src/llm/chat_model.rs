//! チャットループから見たモデルの抽象
//!
//! ホスト型（LlmDriver）とローカル（LlamaModel）を同じ形で呼べるようにする。

use crate::domain::Message;
use crate::error::Error;
use crate::llm::driver::LlmDriver;
use crate::llm::provider::LlmProvider;

/// 1 ターン分の応答を返すモデル
pub trait ChatModel {
    /// 表示・比較モードの見出しに使う名前
    fn name(&self) -> &str;

    /// system 指示と履歴を文脈として query への応答を返す
    fn complete(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<String, Error>;

    /// 整形済みプロンプトの続きを生成する。
    /// ローカルモデルはテンプレートを通さず生で続きを書く。ホスト型は 1 発話として送る。
    fn complete_raw(&self, prompt: &str) -> Result<String, Error> {
        self.complete(prompt, None, &[])
    }
}

/// ChatModel に表示名を付ける（プロファイル名と見出しを分けたいとき）
pub struct Labeled<M> {
    label: String,
    inner: M,
}

impl<M: ChatModel> Labeled<M> {
    pub fn new(label: impl Into<String>, inner: M) -> Self {
        Self {
            label: label.into(),
            inner,
        }
    }
}

impl<M: ChatModel> ChatModel for Labeled<M> {
    fn name(&self) -> &str {
        &self.label
    }

    fn complete(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<String, Error> {
        self.inner.complete(query, system_instruction, history)
    }

    fn complete_raw(&self, prompt: &str) -> Result<String, Error> {
        self.inner.complete_raw(prompt)
    }
}

impl<M: ChatModel + ?Sized> ChatModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<String, Error> {
        (**self).complete(query, system_instruction, history)
    }

    fn complete_raw(&self, prompt: &str) -> Result<String, Error> {
        (**self).complete_raw(prompt)
    }
}

impl<P: LlmProvider> ChatModel for LlmDriver<P> {
    fn name(&self) -> &str {
        self.provider().name()
    }

    fn complete(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<String, Error> {
        self.query(query, system_instruction, history)
    }
}
