//! memchat 共通ライブラリ
//!
//! `chat` と `agent` コマンドで共有される機能を提供します。

/// エラーハンドリング
pub mod error;

/// ドメイン型（メッセージ・履歴・ペルソナ方針）
pub mod domain;

/// 会話メモリ（ファイルに永続化される直近 N 件のウィンドウ）
pub mod memory;

/// Outbound ポート（FS・ログ・環境変数・入力・割り込み）
pub mod ports;

/// ポートの標準実装
pub mod adapter;

/// LLMドライバーとプロバイダ
pub mod llm;
