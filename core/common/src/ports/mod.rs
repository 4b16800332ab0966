//! ポート定義
//!
//! common はライブラリなので inbound を持たず、chat / agent が外界を使うための outbound だけを置く。

pub mod outbound;
