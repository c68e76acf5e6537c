use std::time::Duration;

use tracing::{debug, warn};

use crate::Hardware;

/// Poll `scan_for_hardware` at most `attempts` times, sleeping `interval`
/// between polls. Returns false once the attempts are exhausted.
pub fn wait_for_hardware(hw: &dyn Hardware, attempts: u32, interval: Duration) -> bool {
    for attempt in 1..=attempts {
        if hw.scan_for_hardware() {
            debug!(attempt, "hardware connected");
            return true;
        }
        debug!(attempt, attempts, "hardware not detected yet");
        if attempt < attempts {
            std::thread::sleep(interval);
        }
    }
    warn!(attempts, "hardware not detected; giving up");
    false
}
