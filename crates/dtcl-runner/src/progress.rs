use std::collections::HashMap;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use dtcl_core::{ProgressEvent, ProgressSink};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Milestone {
    pub slot: u8,
    pub percent: u8,
}

/// Turns byte progress into coarse percent milestones, per slot.
#[derive(Debug)]
pub struct Quantizer {
    step: u8,
    last: HashMap<u8, u8>,
}

impl Quantizer {
    pub fn new(step: u8) -> Self {
        Self { step: step.clamp(1, 100), last: HashMap::new() }
    }

    /// A milestone the first time progress reaches each multiple of `step`.
    /// Falling progress means a new transfer and starts over.
    pub fn observe(&mut self, event: &ProgressEvent) -> Option<Milestone> {
        let reached = event.percent() / self.step * self.step;
        let emit = match self.last.get(&event.slot) {
            Some(&last) => reached != last,
            None => true,
        };
        if !emit {
            return None;
        }
        self.last.insert(event.slot, reached);
        Some(Milestone { slot: event.slot, percent: reached })
    }
}

/// Sink handed to writers. Sending on the unbounded channel never blocks.
#[derive(Clone)]
pub struct ChannelProgress {
    tx: Sender<ProgressEvent>,
}

impl ProgressSink for ChannelProgress {
    fn report(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

/// Background worker republishing writer progress as milestones.
pub struct ProgressRelay {
    tx: Option<Sender<ProgressEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl ProgressRelay {
    pub fn spawn(step: u8, subscriber: Option<Sender<Milestone>>) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let worker = std::thread::Builder::new()
            .name("progress-relay".into())
            .spawn(move || relay(rx, Quantizer::new(step), subscriber))
            .context("spawn progress relay")?;
        Ok(Self { tx: Some(tx), worker: Some(worker) })
    }

    pub fn sink(&self) -> Option<ChannelProgress> {
        self.tx.as_ref().map(|tx| ChannelProgress { tx: tx.clone() })
    }

    /// Stop accepting events and wait for queued ones to be relayed.
    /// Sinks handed out earlier must have been dropped.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("progress relay worker panicked");
            }
        }
    }
}

impl Drop for ProgressRelay {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn relay(rx: Receiver<ProgressEvent>, mut quantizer: Quantizer, subscriber: Option<Sender<Milestone>>) {
    for event in rx.iter() {
        if let Some(m) = quantizer.observe(&event) {
            info!(slot = m.slot, percent = m.percent, "write progress");
            if let Some(sub) = &subscriber {
                let _ = sub.try_send(m);
            }
        }
    }
}
