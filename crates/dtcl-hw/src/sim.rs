use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender};
use dtcl_core::{CartType, ConfirmationGate, ProgressEvent, ProgressSink, DTCL_NO_RESPONSE, DTCL_SUCCESS};
use tracing::debug;

use crate::{CartWriter, Hardware, HardwareEvent};

const SIM_TRANSFER_BYTES: u64 = 64 * 1024;
const SIM_TRANSFER_CHUNKS: u64 = 16;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking writer must not wedge the board for the next iteration.
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Writer that replays a script of result codes.
pub struct ScriptedWriter {
    codes: Mutex<VecDeque<i32>>,
    fallback: i32,
    panics: bool,
    calls: AtomicU32,
}

impl ScriptedWriter {
    pub fn always(code: i32) -> Self {
        Self::sequence(Vec::new(), code)
    }

    /// Returns `codes` in order, then `fallback` forever.
    pub fn sequence(codes: Vec<i32>, fallback: i32) -> Self {
        Self {
            codes: Mutex::new(codes.into()),
            fallback,
            panics: false,
            calls: AtomicU32::new(0),
        }
    }

    /// Writer whose every call panics, standing in for a faulting driver.
    pub fn panicking() -> Self {
        Self { panics: true, ..Self::always(DTCL_SUCCESS) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CartWriter for ScriptedWriter {
    fn write_upload_files(
        &self,
        path: &Path,
        confirm: &dyn ConfirmationGate,
        slot: u8,
        progress: &dyn ProgressSink,
    ) -> i32 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panics {
            panic!("simulated driver fault in slot {slot}");
        }
        debug!(slot, path = %path.display(), "simulated upload");

        if !confirm.confirm_text(&format!("Erase and program cartridge in slot {slot}?")) {
            return DTCL_NO_RESPONSE;
        }

        let chunk = SIM_TRANSFER_BYTES / SIM_TRANSFER_CHUNKS;
        for i in 1..=SIM_TRANSFER_CHUNKS {
            progress.report(ProgressEvent {
                slot,
                bytes_done: i * chunk,
                bytes_total: SIM_TRANSFER_BYTES,
            });
        }

        lock(&self.codes).pop_front().unwrap_or(self.fallback)
    }
}

struct Inner {
    /// Scans needed before the board shows up; `None` never connects.
    connect_after: Option<u32>,
    scans: u32,
    writers: HashMap<CartType, Arc<ScriptedWriter>>,
}

/// Board stand-in for tests and dry runs of the CLI.
pub struct SimulatedHardware {
    inner: Mutex<Inner>,
    board_id: u8,
    events_tx: Sender<HardwareEvent>,
    events_rx: Receiver<HardwareEvent>,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            inner: Mutex::new(Inner {
                connect_after: Some(1),
                scans: 0,
                writers: HashMap::new(),
            }),
            board_id: 0x01,
            events_tx,
            events_rx,
        }
    }

    pub fn with_board_id(mut self, board_id: u8) -> Self {
        self.board_id = board_id;
        self
    }

    pub fn connect_after(self, scans: u32) -> Self {
        lock(&self.inner).connect_after = Some(scans);
        self
    }

    pub fn never_connect(self) -> Self {
        lock(&self.inner).connect_after = None;
        self
    }

    pub fn with_writer(self, cart_type: CartType, writer: Arc<ScriptedWriter>) -> Self {
        lock(&self.inner).writers.insert(cart_type, writer);
        self
    }

    /// Queue a notification as if the board had raised it.
    pub fn emit(&self, event: HardwareEvent) {
        // Receiver lives in self, so the channel cannot be disconnected.
        let _ = self.events_tx.send(event);
    }

    pub fn scan_count(&self) -> u32 {
        lock(&self.inner).scans
    }
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl Hardware for SimulatedHardware {
    fn scan_for_hardware(&self) -> bool {
        let mut inner = lock(&self.inner);
        inner.scans += 1;
        let connected = matches!(inner.connect_after, Some(n) if inner.scans >= n);
        if connected && inner.scans == inner.connect_after.unwrap_or(0) {
            let _ = self.events_tx.send(HardwareEvent::Connected);
        }
        connected
    }

    fn cart_instance(&self, cart_type: CartType) -> Option<Arc<dyn CartWriter>> {
        if cart_type == CartType::Unknown {
            return None;
        }
        lock(&self.inner)
            .writers
            .get(&cart_type)
            .map(|w| Arc::clone(w) as Arc<dyn CartWriter>)
    }

    fn board_id(&self) -> u8 {
        self.board_id
    }

    fn events(&self) -> Receiver<HardwareEvent> {
        self.events_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtcl_core::{Confirmation, NullProgress};
    use std::sync::Mutex as StdMutex;

    struct Answer(bool);

    impl ConfirmationGate for Answer {
        fn confirm(&self, _msg_id: u32, _extra: &str) -> Confirmation {
            if self.0 { Confirmation::Yes } else { Confirmation::No }
        }
        fn confirm_text(&self, _message: &str) -> bool {
            self.0
        }
    }

    #[derive(Default)]
    struct Collect(StdMutex<Vec<ProgressEvent>>);

    impl ProgressSink for Collect {
        fn report(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn sequence_then_fallback() {
        let w = ScriptedWriter::sequence(vec![0, 7], 2);
        let codes: Vec<i32> = (0..4)
            .map(|_| w.write_upload_files(Path::new("up"), &Answer(true), 1, &NullProgress))
            .collect();
        assert_eq!(codes, vec![0, 7, 2, 2]);
        assert_eq!(w.calls(), 4);
    }

    #[test]
    fn declined_confirmation_reports_no_response() {
        let w = ScriptedWriter::always(0);
        assert_eq!(w.write_upload_files(Path::new("up"), &Answer(false), 1, &NullProgress), DTCL_NO_RESPONSE);
    }

    #[test]
    fn emits_progress_up_to_total() {
        let w = ScriptedWriter::always(0);
        let sink = Collect::default();
        w.write_upload_files(Path::new("up"), &Answer(true), 2, &sink);
        let events = sink.0.lock().unwrap();
        assert_eq!(events.len() as u64, SIM_TRANSFER_CHUNKS);
        assert_eq!(events.last().unwrap().percent(), 100);
        assert!(events.iter().all(|e| e.slot == 2));
    }

    #[test]
    fn unknown_cart_has_no_writer() {
        let hw = SimulatedHardware::new().with_writer(CartType::Darin1, Arc::new(ScriptedWriter::always(0)));
        assert!(hw.cart_instance(CartType::Unknown).is_none());
        assert!(hw.cart_instance(CartType::Darin2).is_none());
        assert!(hw.cart_instance(CartType::Darin1).is_some());
    }

    #[test]
    fn connect_raises_event_once() {
        let hw = SimulatedHardware::new().connect_after(2);
        let rx = hw.events();
        assert!(!hw.scan_for_hardware());
        assert!(hw.scan_for_hardware());
        assert!(hw.scan_for_hardware());
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![HardwareEvent::Connected]);
    }
}
