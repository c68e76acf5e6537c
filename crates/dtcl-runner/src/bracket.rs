use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

/// Marks one slot command as in progress and gives the hardware a settle
/// delay on either side of it.
pub struct CommandBracket {
    in_progress: AtomicBool,
    settle: Duration,
}

impl CommandBracket {
    pub fn new(settle: Duration) -> Self {
        Self { in_progress: AtomicBool::new(false), settle }
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// The flag drops back to false when the guard goes out of scope,
    /// including during a panic unwind.
    pub fn pre_command(&self, slot: u8) -> CommandGuard<'_> {
        self.in_progress.store(true, Ordering::SeqCst);
        debug!(slot, "command started");
        settle(self.settle);
        CommandGuard { bracket: self, slot }
    }
}

pub struct CommandGuard<'a> {
    bracket: &'a CommandBracket,
    slot: u8,
}

impl Drop for CommandGuard<'_> {
    fn drop(&mut self) {
        self.bracket.in_progress.store(false, Ordering::SeqCst);
        debug!(slot = self.slot, "command finished");
        settle(self.bracket.settle);
    }
}

fn settle(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn flag_set_only_inside_bracket() {
        let b = CommandBracket::new(Duration::ZERO);
        assert!(!b.is_in_progress());
        {
            let _g = b.pre_command(1);
            assert!(b.is_in_progress());
        }
        assert!(!b.is_in_progress());
    }

    #[test]
    fn flag_reset_after_panic() {
        let b = CommandBracket::new(Duration::ZERO);
        let r = catch_unwind(AssertUnwindSafe(|| {
            let _g = b.pre_command(2);
            panic!("driver fault");
        }));
        assert!(r.is_err());
        assert!(!b.is_in_progress());
    }
}
