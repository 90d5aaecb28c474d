//! System clipboard access and paste sanitizing for the API key field.

/// Failure to read text from the system clipboard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard read failed: {0}")]
    Read(String),
    /// The read ended without reporting a result (e.g. the reader panicked).
    #[error("clipboard read aborted")]
    Aborted,
}

/// Source of clipboard text.
///
/// Implementations may block for an unbounded amount of time or fail outright; callers run them
/// off the event loop and bound the wait themselves (see
/// [`PasteCoordinator`](crate::paste_coordinator::PasteCoordinator)).
pub trait ClipboardGateway: Send + Sync {
    fn read_all(&self) -> Result<String, ClipboardError>;
}

/// Reads the system clipboard through `arboard`.
///
/// A fresh `arboard::Clipboard` is opened per read so the handle never outlives the reader
/// thread that uses it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArboardClipboard;

impl ClipboardGateway for ArboardClipboard {
    fn read_all(&self) -> Result<String, ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
        clipboard.get_text().map_err(|err| match err {
            arboard::Error::ClipboardNotSupported => ClipboardError::Unavailable(err.to_string()),
            other => ClipboardError::Read(other.to_string()),
        })
    }
}

/// Normalize pasted text for a single-line secret: drop every line break, then trim surrounding
/// whitespace. Interior spaces are kept; rejecting them is the verifier's job.
pub fn sanitize_pasted_secret(pasted: &str) -> String {
    let joined: String = pasted.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    joined.trim().to_string()
}
