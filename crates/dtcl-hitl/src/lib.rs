use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use dtcl_core::{Confirmation, ConfirmationGate};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    messages: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: u32,
    text: String,
}

/// Popup message texts keyed by message id.
#[derive(Clone, Debug, Default)]
pub struct MessageCatalog {
    texts: HashMap<u32, String>,
}

impl MessageCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read message catalog {}", path.display()))?;
        Self::from_json(&bytes).with_context(|| format!("parse message catalog {}", path.display()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let file: CatalogFile = serde_json::from_slice(bytes)?;
        Ok(Self {
            texts: file.messages.into_iter().map(|m| (m.id, m.text)).collect(),
        })
    }

    pub fn resolve(&self, msg_id: u32) -> String {
        self.texts
            .get(&msg_id)
            .cloned()
            .unwrap_or_else(|| format!("message {msg_id}"))
    }
}

/// Prompt text shown for a message-id confirmation.
pub fn format_prompt(text: &str, extra: &str) -> String {
    let mut s = String::from(text);
    if !extra.is_empty() {
        s.push_str(&format!(" ({extra})"));
    }
    s.push_str(" [y/N] ");
    s
}

/// Unattended gate: every question is answered yes.
#[derive(Default)]
pub struct AutoConfirm {
    catalog: MessageCatalog,
}

impl AutoConfirm {
    pub fn new(catalog: MessageCatalog) -> Self {
        Self { catalog }
    }
}

impl ConfirmationGate for AutoConfirm {
    fn confirm(&self, msg_id: u32, extra: &str) -> Confirmation {
        info!(msg_id, extra, text = %self.catalog.resolve(msg_id), "auto-confirmed");
        Confirmation::Yes
    }

    fn confirm_text(&self, message: &str) -> bool {
        info!(message, "auto-confirmed");
        true
    }
}

/// Interactive gate that blocks on a line of input per question.
pub struct ConsoleConfirm<R, W> {
    catalog: MessageCatalog,
    io: Mutex<(R, W)>,
}

impl<R: BufRead + Send, W: Write + Send> ConsoleConfirm<R, W> {
    pub fn new(catalog: MessageCatalog, input: R, output: W) -> Self {
        Self { catalog, io: Mutex::new((input, output)) }
    }

    fn ask(&self, prompt: &str) -> bool {
        let mut io = self.io.lock().unwrap_or_else(|e| e.into_inner());
        let (input, output) = &mut *io;
        if let Err(e) = write!(output, "{prompt}").and_then(|_| output.flush()) {
            warn!(error = %e, "cannot write confirmation prompt");
        }
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                warn!(error = %e, "cannot read confirmation answer; treating as no");
                false
            }
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> ConfirmationGate for ConsoleConfirm<R, W> {
    fn confirm(&self, msg_id: u32, extra: &str) -> Confirmation {
        let prompt = format_prompt(&self.catalog.resolve(msg_id), extra);
        if self.ask(&prompt) {
            Confirmation::Yes
        } else {
            Confirmation::No
        }
    }

    fn confirm_text(&self, message: &str) -> bool {
        self.ask(&format_prompt(message, ""))
    }
}
