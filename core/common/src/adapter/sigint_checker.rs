//! SIGINT を割り込みフラグに変換する InterruptChecker 実装

use crate::ports::outbound::InterruptChecker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct SigintChecker {
    pending: Arc<AtomicBool>,
}

impl SigintChecker {
    /// ctrlc ハンドラを登録する。登録はプロセスにつき 1 回だけ成功する。
    pub fn new() -> Result<Self, ctrlc::Error> {
        let checker = Self::detached();
        let pending = Arc::clone(&checker.pending);
        ctrlc::set_handler(move || pending.store(true, Ordering::SeqCst))?;
        Ok(checker)
    }

    fn detached() -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl InterruptChecker for SigintChecker {
    fn take_interrupt(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}

/// 常に「割り込みなし」。ハンドラを登録できなかったときの代替。
#[derive(Debug, Clone, Default)]
pub struct NoopInterruptChecker;

impl NoopInterruptChecker {
    pub fn new() -> Self {
        Self
    }
}

impl InterruptChecker for NoopInterruptChecker {
    fn take_interrupt(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_is_consumed_once() {
        let checker = SigintChecker::detached();
        assert!(!checker.take_interrupt());
        checker.pending.store(true, Ordering::SeqCst);
        assert!(checker.take_interrupt());
        assert!(!checker.take_interrupt());
    }

    #[test]
    fn test_noop_never_interrupts() {
        assert!(!NoopInterruptChecker::new().take_interrupt());
    }
}
