//! The API key input field.
//!
//! `ApiKeyInput` owns the text buffer, the lifecycle state and the focus tracker, and routes each
//! [`InputEvent`] to the piece responsible for it:
//!
//! - focus events update the [`FocusTracker`];
//! - paste shortcuts and bracketed pastes go through the [`PasteCoordinator`];
//! - `StateChange` events drive the lifecycle (the field never changes its own state);
//! - everything else is ordinary editing, allowed only while the state is editable.
//!
//! Failures on the paste path are logged and dropped here. Nothing returned from
//! [`ApiKeyInput::handle_event`] is an error; the caller only ever sees follow-up intents.

use std::time::Instant;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;

use crate::api_key_state::ApiKeyInputState;
use crate::app_event::InputEvent;
use crate::app_event::InputIntent;
use crate::focus_tracker::FocusTracker;
use crate::paste_coordinator::PasteCoordinator;
use crate::paste_coordinator::PasteError;
use crate::paste_coordinator::PasteOutcome;
use crate::text_buffer::TextBuffer;

/// Braille dot spinner shown in place of the prompt while verifying.
pub(crate) const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ApiKeyInput {
    buffer: TextBuffer,
    state: ApiKeyInputState,
    focus: FocusTracker,
    coordinator: PasteCoordinator,
    provider_name: String,
    show_title: bool,
    spinner_frame: usize,
}

impl ApiKeyInput {
    pub fn new(coordinator: PasteCoordinator) -> Self {
        Self::new_at(coordinator, Instant::now())
    }

    pub fn new_at(coordinator: PasteCoordinator, now: Instant) -> Self {
        Self {
            buffer: TextBuffer::new(),
            state: ApiKeyInputState::Initial,
            focus: FocusTracker::new(now),
            coordinator,
            provider_name: String::from("Provider"),
            show_title: true,
            spinner_frame: 0,
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn set_provider_name(&mut self, name: impl Into<String>) {
        self.provider_name = name.into();
    }

    pub fn show_title(&self) -> bool {
        self.show_title
    }

    pub fn set_show_title(&mut self, show: bool) {
        self.show_title = show;
    }

    pub fn value(&self) -> &str {
        self.buffer.text()
    }

    pub fn set_value(&mut self, value: &str) {
        self.buffer.set_text(value);
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn state(&self) -> ApiKeyInputState {
        self.state
    }

    pub fn is_focused(&self) -> bool {
        self.focus.is_focused()
    }

    /// Whether the view should ask the user to focus the field before pasting.
    pub fn focus_warning_visible(&self, now: Instant) -> bool {
        self.state.is_initial() && !self.focus.is_fresh(self.coordinator.config().focus_freshness, now)
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    /// Clear the field back to an empty, focused `Initial` state.
    pub fn reset(&mut self, now: Instant) {
        self.state.transition(ApiKeyInputState::Initial);
        self.buffer.clear();
        self.focus.on_focus_gained(now);
        self.spinner_frame = 0;
    }

    pub async fn handle_event(&mut self, event: InputEvent) -> Option<InputIntent> {
        self.handle_event_at(event, Instant::now()).await
    }

    pub async fn handle_event_at(&mut self, event: InputEvent, now: Instant) -> Option<InputIntent> {
        match event {
            InputEvent::FocusGained => {
                self.focus.on_focus_gained(now);
                None
            }
            InputEvent::FocusLost => {
                tracing::debug!("api key input lost focus; next clipboard paste may be refused");
                self.focus.on_focus_lost();
                None
            }
            InputEvent::Key(key_event) => self.handle_key_event(key_event, now).await,
            InputEvent::Paste(pasted) => {
                self.coordinator
                    .apply_delivered_paste(self.state, &mut self.buffer, &pasted);
                None
            }
            InputEvent::StateChange(state) => self.set_state(state, now),
            InputEvent::Tick => self.on_tick(),
        }
    }

    async fn handle_key_event(&mut self, key_event: KeyEvent, now: Instant) -> Option<InputIntent> {
        if key_event.kind == KeyEventKind::Release {
            return None;
        }
        self.focus.on_keystroke(now);

        if is_paste_shortcut(&key_event) {
            self.paste_from_clipboard(now).await;
            return None;
        }

        match key_event.code {
            KeyCode::Char(c)
                if key_event.modifiers.contains(KeyModifiers::CONTROL)
                    && c.eq_ignore_ascii_case(&'c') =>
            {
                Some(InputIntent::Cancel)
            }
            KeyCode::Esc => Some(InputIntent::Cancel),
            KeyCode::Enter => self.submit(),
            _ if !self.state.is_editable() => None,
            KeyCode::Char(c)
                if !key_event
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.buffer.insert_char(c);
                None
            }
            KeyCode::Backspace => {
                self.buffer.backspace();
                None
            }
            KeyCode::Delete => {
                self.buffer.delete_forward();
                None
            }
            KeyCode::Left => {
                self.buffer.move_left();
                None
            }
            KeyCode::Right => {
                self.buffer.move_right();
                None
            }
            KeyCode::Home => {
                self.buffer.move_home();
                None
            }
            KeyCode::End => {
                self.buffer.move_end();
                None
            }
            _ => None,
        }
    }

    async fn paste_from_clipboard(&mut self, now: Instant) {
        let result = self
            .coordinator
            .paste_from_clipboard(self.state, &mut self.focus, &mut self.buffer, now)
            .await;
        match result {
            Ok(PasteOutcome::Inserted { .. }) => {}
            Ok(outcome) => tracing::debug!(outcome = ?outcome, "clipboard paste had no effect"),
            Err(PasteError::StaleFocus) => {
                tracing::warn!("clipboard paste skipped; focus re-asserted, try pasting again");
            }
            Err(err) => tracing::warn!("clipboard paste failed: {err}"),
        }
    }

    fn submit(&self) -> Option<InputIntent> {
        match self.state {
            ApiKeyInputState::Initial | ApiKeyInputState::Error if !self.buffer.is_empty() => {
                Some(InputIntent::Submit(self.buffer.text().to_string()))
            }
            ApiKeyInputState::Verified => Some(InputIntent::Confirm),
            _ => None,
        }
    }

    fn set_state(&mut self, state: ApiKeyInputState, now: Instant) -> Option<InputIntent> {
        let intent = self.state.transition(state);
        match state {
            ApiKeyInputState::Verifying => self.spinner_frame = 0,
            // Let the user paste a corrected key straight away.
            ApiKeyInputState::Error => self.focus.reassert(now),
            ApiKeyInputState::Initial | ApiKeyInputState::Verified => {}
        }
        intent
    }

    fn on_tick(&mut self) -> Option<InputIntent> {
        if !self.state.is_verifying() {
            return None;
        }
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        Some(InputIntent::ScheduleTick)
    }
}

/// `Ctrl+V`, `Ctrl+Shift+V` and `Shift+Insert`.
pub fn is_paste_shortcut(key_event: &KeyEvent) -> bool {
    match key_event.code {
        KeyCode::Char(c) => {
            key_event.modifiers.contains(KeyModifiers::CONTROL) && c.eq_ignore_ascii_case(&'v')
        }
        KeyCode::Insert => key_event.modifiers.contains(KeyModifiers::SHIFT),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard_paste::ClipboardError;
    use crate::clipboard_paste::ClipboardGateway;
    use crate::paste_coordinator::PasteConfig;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingGateway {
        text: String,
        calls: AtomicUsize,
    }

    impl ClipboardGateway for CountingGateway {
        fn read_all(&self) -> Result<String, ClipboardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    fn input_with_clipboard(text: &str, now: Instant) -> (ApiKeyInput, Arc<CountingGateway>) {
        let gateway = Arc::new(CountingGateway {
            text: text.to_string(),
            ..Default::default()
        });
        let coordinator = PasteCoordinator::new(gateway.clone(), PasteConfig::default());
        (ApiKeyInput::new_at(coordinator, now), gateway)
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> InputEvent {
        InputEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    async fn type_text(input: &mut ApiKeyInput, text: &str, now: Instant) {
        for c in text.chars() {
            input.handle_event_at(key(KeyCode::Char(c)), now).await;
        }
    }

    #[tokio::test]
    async fn typing_edits_the_buffer() {
        let now = Instant::now();
        let (mut input, _) = input_with_clipboard("", now);

        type_text(&mut input, "sk-abc", now).await;
        input.handle_event_at(key(KeyCode::Backspace), now).await;
        input.handle_event_at(key(KeyCode::Home), now).await;
        input.handle_event_at(key(KeyCode::Delete), now).await;

        assert_eq!(input.value(), "k-ab");
        assert_eq!(input.buffer().cursor(), 0);
    }

    #[tokio::test]
    async fn key_release_events_are_ignored() {
        let now = Instant::now();
        let (mut input, _) = input_with_clipboard("", now);
        let mut release = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;

        assert_eq!(input.handle_event_at(InputEvent::Key(release), now).await, None);
        assert_eq!(input.value(), "");
    }

    #[tokio::test]
    async fn typing_is_ignored_while_not_editable() {
        let now = Instant::now();
        let (mut input, _) = input_with_clipboard("", now);
        input.set_value("sk-abc");
        input
            .handle_event_at(InputEvent::StateChange(ApiKeyInputState::Verifying), now)
            .await;

        type_text(&mut input, "zz", now).await;
        input.handle_event_at(key(KeyCode::Backspace), now).await;

        assert_eq!(input.value(), "sk-abc");
    }

    #[tokio::test]
    async fn keystroke_refreshes_focus_after_focus_loss() {
        let start = Instant::now();
        let (mut input, _) = input_with_clipboard("", start);
        input.handle_event_at(InputEvent::FocusLost, start).await;
        assert!(!input.is_focused());

        input.handle_event_at(key(KeyCode::Left), start).await;
        assert!(input.is_focused());
    }

    #[tokio::test]
    async fn every_paste_shortcut_reads_the_clipboard() {
        let now = Instant::now();
        let (mut input, gateway) = input_with_clipboard("ab", now);
        let shortcuts = [
            ctrl('v'),
            InputEvent::Key(KeyEvent::new(
                KeyCode::Char('V'),
                KeyModifiers::CONTROL | KeyModifiers::SHIFT,
            )),
            InputEvent::Key(KeyEvent::new(KeyCode::Insert, KeyModifiers::SHIFT)),
        ];

        for shortcut in shortcuts {
            assert_eq!(input.handle_event_at(shortcut, now).await, None);
        }

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
        assert_eq!(input.value(), "ababab");
    }

    #[tokio::test]
    async fn paste_shortcut_keystroke_counts_as_focus_after_focus_loss() {
        let now = Instant::now();
        let (mut input, gateway) = input_with_clipboard("sk-test123", now);
        input.handle_event_at(InputEvent::FocusLost, now).await;

        // The keystroke itself proves focus, so the shortcut goes through.
        input.handle_event_at(ctrl('v'), now).await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(input.value(), "sk-test123");
    }

    #[tokio::test]
    async fn delivered_paste_is_gated_by_state() {
        let now = Instant::now();
        for (state, expected) in [
            (ApiKeyInputState::Initial, "sk-test123456789"),
            (ApiKeyInputState::Error, "sk-test123456789"),
            (ApiKeyInputState::Verifying, ""),
            (ApiKeyInputState::Verified, ""),
        ] {
            let (mut input, gateway) = input_with_clipboard("unused", now);
            input.handle_event_at(InputEvent::StateChange(state), now).await;

            let intent = input
                .handle_event_at(InputEvent::Paste("sk-test123456789".to_string()), now)
                .await;

            assert_eq!(intent, None);
            assert_eq!(input.value(), expected, "state {state:?}");
            assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn empty_paste_changes_nothing() {
        let now = Instant::now();
        let (mut input, _) = input_with_clipboard("", now);
        input.set_value("old");

        let intent = input
            .handle_event_at(InputEvent::Paste("  \n ".to_string()), now)
            .await;

        assert_eq!(intent, None);
        assert_eq!(input.value(), "old");
        assert_eq!(input.buffer().cursor(), 3);
    }

    #[tokio::test]
    async fn enter_submits_or_confirms_depending_on_state() {
        let now = Instant::now();
        let (mut input, _) = input_with_clipboard("", now);

        assert_eq!(input.handle_event_at(key(KeyCode::Enter), now).await, None);

        input.set_value("sk-abc");
        assert_eq!(
            input.handle_event_at(key(KeyCode::Enter), now).await,
            Some(InputIntent::Submit("sk-abc".to_string()))
        );

        input
            .handle_event_at(InputEvent::StateChange(ApiKeyInputState::Verifying), now)
            .await;
        assert_eq!(input.handle_event_at(key(KeyCode::Enter), now).await, None);

        input
            .handle_event_at(InputEvent::StateChange(ApiKeyInputState::Verified), now)
            .await;
        assert_eq!(
            input.handle_event_at(key(KeyCode::Enter), now).await,
            Some(InputIntent::Confirm)
        );
    }

    #[tokio::test]
    async fn esc_and_ctrl_c_cancel_in_any_state() {
        let now = Instant::now();
        let (mut input, _) = input_with_clipboard("", now);
        assert_eq!(
            input.handle_event_at(key(KeyCode::Esc), now).await,
            Some(InputIntent::Cancel)
        );
        input
            .handle_event_at(InputEvent::StateChange(ApiKeyInputState::Verifying), now)
            .await;
        assert_eq!(
            input.handle_event_at(ctrl('c'), now).await,
            Some(InputIntent::Cancel)
        );
    }

    #[tokio::test]
    async fn spinner_ticks_only_while_verifying() {
        let now = Instant::now();
        let (mut input, _) = input_with_clipboard("", now);
        assert_eq!(input.handle_event_at(InputEvent::Tick, now).await, None);

        assert_eq!(
            input
                .handle_event_at(InputEvent::StateChange(ApiKeyInputState::Verifying), now)
                .await,
            Some(InputIntent::StartProgress)
        );
        assert_eq!(input.spinner_frame(), SPINNER_FRAMES[0]);
        assert_eq!(
            input.handle_event_at(InputEvent::Tick, now).await,
            Some(InputIntent::ScheduleTick)
        );
        assert_eq!(input.spinner_frame(), SPINNER_FRAMES[1]);

        input
            .handle_event_at(InputEvent::StateChange(ApiKeyInputState::Verified), now)
            .await;
        assert_eq!(input.handle_event_at(InputEvent::Tick, now).await, None);
    }

    #[tokio::test]
    async fn entering_error_state_reasserts_focus() {
        let start = Instant::now();
        let (mut input, _) = input_with_clipboard("", start);
        input.handle_event_at(InputEvent::FocusLost, start).await;

        let later = start + Duration::from_secs(30);
        input
            .handle_event_at(InputEvent::StateChange(ApiKeyInputState::Error), later)
            .await;

        assert!(input.is_focused());
        assert!(!input.focus_warning_visible(later));
    }

    #[tokio::test]
    async fn focus_warning_tracks_staleness_in_initial_state() {
        let start = Instant::now();
        let (mut input, _) = input_with_clipboard("", start);
        assert!(!input.focus_warning_visible(start));
        assert!(input.focus_warning_visible(start + Duration::from_secs(5)));

        input.handle_event_at(InputEvent::FocusGained, start + Duration::from_secs(5)).await;
        assert!(!input.focus_warning_visible(start + Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let start = Instant::now();
        let (mut input, _) = input_with_clipboard("", start);
        input.set_value("sk-test123456789");
        input
            .handle_event_at(InputEvent::StateChange(ApiKeyInputState::Error), start)
            .await;
        input.handle_event_at(InputEvent::FocusLost, start).await;

        input.reset(start);
        let once = (
            input.value().to_string(),
            input.state(),
            input.is_focused(),
        );
        input.reset(start);
        let twice = (
            input.value().to_string(),
            input.state(),
            input.is_focused(),
        );

        assert_eq!(once, (String::new(), ApiKeyInputState::Initial, true));
        assert_eq!(once, twice);
    }

    #[test]
    fn paste_shortcut_detection() {
        assert!(is_paste_shortcut(&KeyEvent::new(
            KeyCode::Char('v'),
            KeyModifiers::CONTROL
        )));
        assert!(is_paste_shortcut(&KeyEvent::new(
            KeyCode::Insert,
            KeyModifiers::SHIFT
        )));
        assert!(!is_paste_shortcut(&KeyEvent::new(
            KeyCode::Char('v'),
            KeyModifiers::NONE
        )));
        assert!(!is_paste_shortcut(&KeyEvent::new(
            KeyCode::Insert,
            KeyModifiers::NONE
        )));
    }
}
