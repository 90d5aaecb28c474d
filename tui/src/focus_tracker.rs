use std::time::Duration;
use std::time::Instant;

/// How recently focus must have been confirmed before the field will query the system clipboard.
pub const DEFAULT_FOCUS_FRESHNESS: Duration = Duration::from_secs(2);

/// Heuristic record of whether the field holds keyboard focus.
///
/// Terminals report focus changes unreliably (events can race with paste gestures, and some
/// multiplexers never report them at all), so this is only ever used as a gate before touching
/// the clipboard. Keystrokes count as proof of focus.
///
/// Every method takes the current instant explicitly so callers and tests control the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTracker {
    focused: bool,
    last_confirmed_at: Instant,
}

impl FocusTracker {
    /// A tracker that starts focused, confirmed at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            focused: true,
            last_confirmed_at: now,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn last_confirmed_at(&self) -> Instant {
        self.last_confirmed_at
    }

    pub fn on_focus_gained(&mut self, now: Instant) {
        self.confirm(now);
    }

    /// Record focus loss. The buffer is untouched; some terminals deliver a paste right after a
    /// focus-out/focus-in pair.
    pub fn on_focus_lost(&mut self) {
        self.focused = false;
    }

    pub fn on_keystroke(&mut self, now: Instant) {
        self.confirm(now);
    }

    /// Silently take focus back after a paste was refused because focus looked stale.
    pub fn reassert(&mut self, now: Instant) {
        self.confirm(now);
    }

    /// True when focused and confirmed no longer than `threshold` before `now`.
    pub fn is_fresh(&self, threshold: Duration, now: Instant) -> bool {
        self.focused && now.saturating_duration_since(self.last_confirmed_at) <= threshold
    }

    fn confirm(&mut self, now: Instant) {
        self.focused = true;
        self.last_confirmed_at = now;
    }
}
