use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use dtcl_core::{CartType, ConfirmationGate, ProgressSink};

use crate::HardwareEvent;

/// Cartridge-type specific programming operation.
pub trait CartWriter: Send + Sync {
    /// Upload the files under `path` to the cartridge in `slot`. Returns the
    /// hardware layer's integer result code unchanged.
    fn write_upload_files(
        &self,
        path: &Path,
        confirm: &dyn ConfirmationGate,
        slot: u8,
        progress: &dyn ProgressSink,
    ) -> i32;
}

pub trait Hardware: Send + Sync {
    /// One detection attempt. Returns true once a board is connected.
    fn scan_for_hardware(&self) -> bool;

    /// Writer for a cartridge type, if the board supports it.
    fn cart_instance(&self, cart_type: CartType) -> Option<Arc<dyn CartWriter>>;

    /// Identifier the board reports about itself.
    fn board_id(&self) -> u8;

    /// Connect/disconnect and cartridge insertion notifications.
    fn events(&self) -> Receiver<HardwareEvent>;
}
