use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Active report path per multiplexer channel. Lives as long as the writer
/// that owns it.
#[derive(Clone, Debug, Default)]
pub struct LogDirectoryState {
    channels: HashMap<u32, PathBuf>,
}

impl LogDirectoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path previously registered for `channel`, if any.
    pub fn register(&mut self, channel: u32, path: PathBuf) -> Option<PathBuf> {
        self.channels.insert(channel, path)
    }

    pub fn get(&self, channel: u32) -> Option<&Path> {
        self.channels.get(&channel).map(PathBuf::as_path)
    }
}
