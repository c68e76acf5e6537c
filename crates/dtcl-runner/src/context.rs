use std::collections::BTreeMap;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use dtcl_core::{ConfirmationGate, SlotInfo};
use dtcl_hw::{Hardware, HardwareEvent};
use dtcl_report::ReportWriter;
use tracing::{debug, info, warn};

use crate::MAX_SLOT;

/// Everything one harness process owns: the board, its reports, the
/// confirmation policy and the slot table. Built once and passed by reference.
pub struct HarnessContext {
    pub hardware: Arc<dyn Hardware>,
    pub reports: Box<dyn ReportWriter>,
    pub confirm: Box<dyn ConfirmationGate>,
    slots: BTreeMap<u8, SlotInfo>,
    events: Receiver<HardwareEvent>,
    connected: bool,
}

impl HarnessContext {
    pub fn new(hardware: Arc<dyn Hardware>, reports: Box<dyn ReportWriter>, confirm: Box<dyn ConfirmationGate>) -> Self {
        let events = hardware.events();
        let slots = (1..=MAX_SLOT).map(|n| (n, SlotInfo::new(n))).collect();
        Self { hardware, reports, confirm, slots, events, connected: false }
    }

    pub fn slot(&self, number: u8) -> Option<&SlotInfo> {
        self.slots.get(&number)
    }

    pub fn slot_mut(&mut self, number: u8) -> Option<&mut SlotInfo> {
        self.slots.get_mut(&number)
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotInfo> {
        self.slots.values()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Apply every queued hardware notification without blocking. Returns
    /// how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let pending: Vec<HardwareEvent> = self.events.try_iter().collect();
        for event in &pending {
            self.apply(event);
        }
        pending.len()
    }

    fn apply(&mut self, event: &HardwareEvent) {
        match *event {
            HardwareEvent::Connected => {
                info!("board connected");
                self.connected = true;
            }
            HardwareEvent::Disconnected => {
                warn!("board disconnected");
                self.connected = false;
                for slot in self.slots.values_mut() {
                    slot.cart_removed();
                }
            }
            HardwareEvent::CartDetected { slot, cart_type } => match self.slots.get_mut(&slot) {
                Some(info) => {
                    info!(slot, %cart_type, "cartridge detected");
                    info.cart_detected(cart_type);
                }
                None => debug!(slot, "cartridge event for unknown slot ignored"),
            },
            HardwareEvent::CartRemoved { slot } => match self.slots.get_mut(&slot) {
                Some(info) => {
                    info!(slot, "cartridge removed");
                    info.cart_removed();
                }
                None => debug!(slot, "cartridge event for unknown slot ignored"),
            },
        }
    }
}
