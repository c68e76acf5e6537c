//! Callback seams the hardware layer calls back into during a write.

use crate::Confirmation;

/// Yes/no question asked by the hardware layer mid-operation.
pub trait ConfirmationGate: Send + Sync {
    /// Message-id shape used by scripted confirmations.
    fn confirm(&self, msg_id: u32, extra: &str) -> Confirmation;

    /// Free-text shape. Interactive implementations may block here until an
    /// answer arrives; callers must not assume it returns promptly.
    fn confirm_text(&self, message: &str) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    pub slot: u8,
    pub bytes_done: u64,
    pub bytes_total: u64,
}

impl ProgressEvent {
    /// Whole percent, clamped to 100. An empty transfer counts as done.
    pub fn percent(&self) -> u8 {
        if self.bytes_total == 0 {
            return 100;
        }
        let pct = self.bytes_done.saturating_mul(100) / self.bytes_total;
        pct.min(100) as u8
    }
}

/// Receives fine-grained progress from a writer. Must not block.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Sink that drops everything.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}
