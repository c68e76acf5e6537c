use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("header has no `{label}` line")]
    MissingField { label: &'static str },

    #[error("malformed `{label}` line: {line:?}")]
    MalformedHeader { label: &'static str, line: String },

    /// An earlier report still occupies the active path after rotation.
    #[error("report {} still present after rotation; not overwritten", .0.display())]
    Collision(PathBuf),
}

impl ReportError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ReportError::Io { op, path, source }
    }
}
