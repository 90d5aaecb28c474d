//! Drives an [`ApiKeyInput`] from terminal events until the user confirms or cancels.
//!
//! The loop owns everything the field itself does not: the spinner timer, running the verifier,
//! and feeding its verdict back as a `StateChange`. Events are still handled strictly one at a time.

use std::future::Future;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

use crate::api_key_input::ApiKeyInput;
use crate::api_key_state::ApiKeyInputState;
use crate::api_key_view::ApiKeyInputStyles;
use crate::api_key_view::ApiKeyInputView;
use crate::app_event::InputEvent;
use crate::app_event::InputIntent;
use crate::render::Insets;
use crate::render::renderable::InsetRenderable;
use crate::render::renderable::Renderable;
use crate::tui;
use crate::tui::Tui;
use crate::tui::TuiEvent;

pub const SPINNER_TICK_INTERVAL: Duration = Duration::from_millis(100);

const DIALOG_INSETS: Insets = Insets::tlbr(1, 2, 0, 0);

/// Redraw cadence while idle, so the focus warning appears without further input.
const IDLE_REDRAW_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyPromptOutcome {
    Verified(String),
    Cancelled,
}

/// Show the dialog in an inline viewport and return once the user confirms or cancels.
///
/// `verify` receives the submitted key and resolves to whether it is valid.
pub async fn run_api_key_prompt<V, Fut>(
    input: &mut ApiKeyInput,
    styles: &ApiKeyInputStyles,
    config_path_display: Option<&str>,
    verify: V,
) -> anyhow::Result<ApiKeyPromptOutcome>
where
    V: Fn(String) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
{
    let terminal = tui::init()?;
    let mut tui = Tui::new(terminal);

    let result = run_event_loop(input, tui::event_stream(), verify, |input| {
        draw_dialog(&mut tui, input, styles, config_path_display)
    })
    .await;

    // The crossterm reader is gone with the stream; discard leftover keystrokes before restoring.
    tui::flush_terminal_input_buffer();
    let cleared = tui.terminal.clear();
    // Always attempt to restore the terminal, even if the prompt loop fails.
    log_restore_failure(tui::restore());
    cleared?;
    result
}

fn log_restore_failure(restored: anyhow::Result<()>) {
    if let Err(err) = restored {
        tracing::warn!("failed to restore terminal: {err:#}");
    }
}

fn draw_dialog(
    tui: &mut Tui,
    input: &ApiKeyInput,
    styles: &ApiKeyInputStyles,
    config_path_display: Option<&str>,
) -> anyhow::Result<()> {
    let mut view = ApiKeyInputView::new(input, styles, Instant::now());
    if let Some(path) = config_path_display {
        view = view.config_path_display(path);
    }
    let dialog = InsetRenderable::new(view, DIALOG_INSETS);
    tui.draw(|frame| {
        let area = frame.area();
        dialog.render(area, frame.buffer_mut());
        if let Some(position) = dialog.cursor_pos(area) {
            frame.set_cursor_position(position);
        }
    })
}

/// Event loop without a terminal attached. `draw` is called after every handled event.
///
/// Returns [`ApiKeyPromptOutcome::Cancelled`] if `events` ends.
pub async fn run_event_loop<S, V, Fut, D>(
    input: &mut ApiKeyInput,
    events: S,
    verify: V,
    mut draw: D,
) -> anyhow::Result<ApiKeyPromptOutcome>
where
    S: Stream<Item = TuiEvent>,
    V: Fn(String) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
    D: FnMut(&ApiKeyInput) -> anyhow::Result<()>,
{
    tokio::pin!(events);
    let (verdict_tx, mut verdict_rx) = mpsc::unbounded_channel::<ApiKeyInputState>();

    let spinner = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(spinner);
    let mut spinner_armed = false;

    let mut idle_redraw = tokio::time::interval(IDLE_REDRAW_INTERVAL);
    idle_redraw.set_missed_tick_behavior(MissedTickBehavior::Delay);

    draw(input)?;

    loop {
        let event = tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(TuiEvent::Input(event)) => event,
                Some(TuiEvent::Draw) => {
                    draw(input)?;
                    continue;
                }
                None => return Ok(ApiKeyPromptOutcome::Cancelled),
            },
            Some(verdict) = verdict_rx.recv() => InputEvent::StateChange(verdict),
            () = &mut spinner, if spinner_armed => {
                spinner_armed = false;
                InputEvent::Tick
            }
            _ = idle_redraw.tick() => {
                draw(input)?;
                continue;
            }
        };

        let mut pending = input.handle_event(event).await;
        while let Some(intent) = pending.take() {
            match intent {
                InputIntent::StartProgress | InputIntent::ScheduleTick => {
                    spinner
                        .as_mut()
                        .reset(tokio::time::Instant::now() + SPINNER_TICK_INTERVAL);
                    spinner_armed = true;
                }
                InputIntent::Submit(value) => {
                    tracing::debug!(chars = value.chars().count(), "verifying submitted api key");
                    let verdict = verify(value);
                    let verdict_tx = verdict_tx.clone();
                    tokio::spawn(async move {
                        let state = if verdict.await {
                            ApiKeyInputState::Verified
                        } else {
                            ApiKeyInputState::Error
                        };
                        let _ = verdict_tx.send(state);
                    });
                    pending = input
                        .handle_event(InputEvent::StateChange(ApiKeyInputState::Verifying))
                        .await;
                }
                InputIntent::Confirm => {
                    return Ok(ApiKeyPromptOutcome::Verified(input.value().to_string()));
                }
                InputIntent::Cancel => return Ok(ApiKeyPromptOutcome::Cancelled),
            }
        }

        draw(input)?;
    }
}
