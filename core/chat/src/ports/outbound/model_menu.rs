//! プロファイル未指定時のモデル選択メニュー

use common::domain::ProviderName;
use common::error::Error;

/// メニューの選択肢
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ChatGpt,
    Gemini,
    Both,
}

impl MenuChoice {
    /// 番号（1〜3）から選択肢へ
    pub fn from_number(s: &str) -> Option<Self> {
        match s.trim() {
            "1" => Some(Self::ChatGpt),
            "2" => Some(Self::Gemini),
            "3" => Some(Self::Both),
            _ => None,
        }
    }

    /// 選択肢に対応するビルトインプロファイル
    pub fn profiles(&self) -> Vec<ProviderName> {
        match self {
            Self::ChatGpt => vec![ProviderName::new("gpt")],
            Self::Gemini => vec![ProviderName::new("gemini")],
            Self::Both => vec![ProviderName::new("gpt"), ProviderName::new("gemini")],
        }
    }
}

/// モデルを選ばせる。None は選ばずに終了（Ctrl+C / EOF）。
pub trait ModelMenu {
    fn choose(&self) -> Result<Option<MenuChoice>, Error>;
}
