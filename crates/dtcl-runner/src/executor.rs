use std::path::Path;

use dtcl_core::{ConfirmationGate, ProgressSink, SlotInfo, DTCL_NO_RESPONSE};
use dtcl_hw::Hardware;
use tracing::{debug, warn};

/// Routes one write attempt to the writer for the slot's cartridge type.
///
/// Result codes pass through untouched; classifying them is the caller's job.
pub struct SlotWriteExecutor<'a> {
    pub hardware: &'a dyn Hardware,
    pub confirm: &'a dyn ConfirmationGate,
    pub progress: &'a dyn ProgressSink,
    pub upload_path: &'a Path,
}

impl SlotWriteExecutor<'_> {
    pub fn execute(&self, slot: &SlotInfo) -> i32 {
        let Some(writer) = self.hardware.cart_instance(slot.detected_cart_type) else {
            warn!(
                slot = slot.slot_number,
                cart_type = %slot.detected_cart_type,
                "no writer for cartridge type"
            );
            return DTCL_NO_RESPONSE;
        };
        let code = writer.write_upload_files(self.upload_path, self.confirm, slot.slot_number, self.progress);
        debug!(slot = slot.slot_number, code, "write returned");
        code
    }
}
