//! ポート（agent 固有の Outbound と common のポートの再公開）

pub mod outbound;
