//! Paste handling for the API key field.
//!
//! There are two ways text gets pasted:
//!
//! - **Host-delivered** ([`PasteCoordinator::apply_delivered_paste`]): the terminal captured the
//!   paste itself (bracketed paste) and handed us the text. The clipboard is never queried, and
//!   the focus gate does not apply because the event is proof of a live paste gesture.
//! - **Shortcut-triggered** ([`PasteCoordinator::paste_from_clipboard`]): the user pressed a paste
//!   shortcut that the terminal did not turn into a paste event, so we must pull from the system
//!   clipboard. This path carries all of the defensive machinery:
//!   1. Refuse unless the field is editable.
//!   2. Refuse (and silently re-take focus) unless focus was confirmed recently. Querying the
//!      clipboard for a field that silently lost focus is what hangs on some platforms.
//!   3. Read on a detached thread and race the result against a deadline. On timeout we detach:
//!      the receiver is dropped, so a late result is discarded by the reader and never reaches
//!      the buffer.
//!
//! Both paths sanitize with [`sanitize_pasted_secret`] and splice at the cursor.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::oneshot;

use crate::api_key_state::ApiKeyInputState;
use crate::clipboard_paste::ClipboardError;
use crate::clipboard_paste::ClipboardGateway;
use crate::clipboard_paste::sanitize_pasted_secret;
use crate::focus_tracker::DEFAULT_FOCUS_FRESHNESS;
use crate::focus_tracker::FocusTracker;
use crate::text_buffer::TextBuffer;

const CLIPBOARD_READER_THREAD: &str = "keyprompt-clipboard";

/// Upper bound on how long the event loop waits for the system clipboard.
pub const DEFAULT_CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(1);

/// Tunables for the shortcut-triggered paste path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteConfig {
    /// Maximum age of the last focus confirmation before a clipboard read is refused.
    pub focus_freshness: Duration,
    /// Deadline for a single clipboard read.
    pub clipboard_timeout: Duration,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            focus_freshness: DEFAULT_FOCUS_FRESHNESS,
            clipboard_timeout: DEFAULT_CLIPBOARD_TIMEOUT,
        }
    }
}

/// What a paste did to the buffer when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOutcome {
    Inserted { chars: usize },
    /// Nothing left after sanitizing.
    Empty,
    /// The field is verifying or verified.
    NotEditable,
}

/// Why a shortcut-triggered paste gave up. Every variant leaves the buffer untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasteError {
    #[error(transparent)]
    Gateway(#[from] ClipboardError),
    #[error("clipboard read timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("clipboard paste refused: input focus is stale")]
    StaleFocus,
}

#[derive(Clone)]
pub struct PasteCoordinator {
    config: PasteConfig,
    gateway: Arc<dyn ClipboardGateway>,
}

impl PasteCoordinator {
    pub fn new(gateway: Arc<dyn ClipboardGateway>, config: PasteConfig) -> Self {
        Self { config, gateway }
    }

    pub fn config(&self) -> PasteConfig {
        self.config
    }

    /// Apply text the terminal delivered with the paste event.
    pub fn apply_delivered_paste(
        &self,
        state: ApiKeyInputState,
        buffer: &mut TextBuffer,
        pasted: &str,
    ) -> PasteOutcome {
        if !state.is_editable() {
            tracing::debug!(state = ?state, "delivered paste ignored: input not editable");
            return PasteOutcome::NotEditable;
        }
        splice_sanitized(buffer, pasted)
    }

    /// Pull from the system clipboard in response to a paste shortcut.
    ///
    /// Suspends the caller for at most [`PasteConfig::clipboard_timeout`]. The buffer is only
    /// touched after the clipboard read won the race.
    pub async fn paste_from_clipboard(
        &self,
        state: ApiKeyInputState,
        focus: &mut FocusTracker,
        buffer: &mut TextBuffer,
        now: Instant,
    ) -> Result<PasteOutcome, PasteError> {
        if !state.is_editable() {
            tracing::debug!(state = ?state, "clipboard paste ignored: input not editable");
            return Ok(PasteOutcome::NotEditable);
        }

        if !focus.is_fresh(self.config.focus_freshness, now) {
            tracing::warn!(
                focused = focus.is_focused(),
                since_confirmed_ms =
                    now.saturating_duration_since(focus.last_confirmed_at()).as_millis() as u64,
                "clipboard paste blocked: focus is stale"
            );
            focus.reassert(now);
            return Err(PasteError::StaleFocus);
        }
        focus.reassert(now);

        let pasted = self.read_clipboard_with_deadline().await?;
        Ok(splice_sanitized(buffer, &pasted))
    }

    async fn read_clipboard_with_deadline(&self) -> Result<String, PasteError> {
        let (result_tx, result_rx) = oneshot::channel();
        let gateway = Arc::clone(&self.gateway);
        // Not `spawn_blocking`: runtime shutdown waits on the blocking pool, and this read may
        // never return.
        std::thread::Builder::new()
            .name(CLIPBOARD_READER_THREAD.to_string())
            .spawn(move || {
                let result = gateway.read_all();
                // Fails once the waiter hit its deadline; the late result is dropped here.
                let _ = result_tx.send(result);
            })
            .map_err(|err| {
                PasteError::Gateway(ClipboardError::Unavailable(format!(
                    "failed to start clipboard reader: {err}"
                )))
            })?;

        let deadline = self.config.clipboard_timeout;
        match tokio::time::timeout(deadline, result_rx).await {
            Ok(Ok(result)) => Ok(result?),
            // Sender dropped without a result: the reader panicked.
            Ok(Err(_)) => Err(PasteError::Gateway(ClipboardError::Aborted)),
            Err(_) => {
                tracing::error!(
                    timeout_ms = deadline.as_millis() as u64,
                    "clipboard read timed out; abandoning it"
                );
                Err(PasteError::Timeout(deadline))
            }
        }
    }
}

fn splice_sanitized(buffer: &mut TextBuffer, pasted: &str) -> PasteOutcome {
    let sanitized = sanitize_pasted_secret(pasted);
    if sanitized.is_empty() {
        tracing::debug!("paste ignored: nothing left after sanitizing");
        return PasteOutcome::Empty;
    }
    let chars = sanitized.chars().count();
    buffer.insert_str(&sanitized);
    tracing::debug!(chars, "pasted into api key input");
    PasteOutcome::Inserted { chars }
}
