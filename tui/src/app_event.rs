//! Events consumed by the API key field and the intents it hands back.

use crossterm::event::KeyEvent;

use crate::api_key_state::ApiKeyInputState;

/// Inbound events, processed one at a time by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    FocusGained,
    FocusLost,

    /// Text the terminal captured itself (bracketed paste). No clipboard query is needed.
    Paste(String),

    /// Sent by whoever owns verification; the field never changes its own lifecycle state.
    StateChange(ApiKeyInputState),

    /// Progress-indicator tick while verifying.
    Tick,
}

/// Follow-up work for the presentation layer or the dialog owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputIntent {
    /// Verification started; begin ticking the progress indicator.
    StartProgress,
    /// Still verifying; schedule the next tick.
    ScheduleTick,
    /// The user submitted a key for verification.
    Submit(String),
    /// The user accepted a verified key.
    Confirm,
    Cancel,
}
