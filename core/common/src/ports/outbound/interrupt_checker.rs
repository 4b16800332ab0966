//! Ctrl+C の受信を伝える Outbound ポート

/// 割り込みフラグ
///
/// 入力待ちの側が `take_interrupt` で読み、読んだ時点でフラグは下りる。
/// 承認待ちの中断が次の入力待ちまで持ち越されないようにするため。
pub trait InterruptChecker: Send + Sync {
    fn take_interrupt(&self) -> bool;
}
