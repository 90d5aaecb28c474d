//! Terminal setup, teardown and the crossterm event source.

use std::io::Stdout;
use std::io::stdout;
use std::time::Duration;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableFocusChange;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableFocusChange;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::TerminalOptions;
use ratatui::Viewport;
use ratatui::backend::CrosstermBackend;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

use crate::app_event::InputEvent;

pub type TerminalBackend = CrosstermBackend<Stdout>;

/// Rows reserved below the shell prompt for the dialog.
pub const DIALOG_VIEWPORT_HEIGHT: u16 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    Input(InputEvent),
    /// The terminal was resized; redraw.
    Draw,
}

/// Enter raw mode with bracketed paste and focus reporting, and set up an inline viewport.
pub fn init() -> anyhow::Result<Terminal<TerminalBackend>> {
    enable_raw_mode()?;
    if let Err(err) = execute!(stdout(), EnableBracketedPaste, EnableFocusChange) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }
    let terminal = Terminal::with_options(
        CrosstermBackend::new(stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(DIALOG_VIEWPORT_HEIGHT),
        },
    )?;
    Ok(terminal)
}

pub fn restore() -> anyhow::Result<()> {
    execute!(stdout(), DisableBracketedPaste, DisableFocusChange)?;
    disable_raw_mode()?;
    Ok(())
}

/// Drop any keystrokes still queued so they do not leak into the shell after exit.
pub fn flush_terminal_input_buffer() {
    while matches!(crossterm::event::poll(Duration::ZERO), Ok(true)) {
        if crossterm::event::read().is_err() {
            break;
        }
    }
}

pub struct Tui {
    pub(crate) terminal: Terminal<TerminalBackend>,
}

impl Tui {
    pub fn new(terminal: Terminal<TerminalBackend>) -> Self {
        Self { terminal }
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> anyhow::Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }
}

/// Terminal events translated for the dialog. The returned stream owns its crossterm reader; drop
/// it before calling [`restore`].
pub fn event_stream() -> impl Stream<Item = TuiEvent> {
    EventStream::new().filter_map(|event| match event {
        Ok(event) => translate_event(event),
        Err(err) => {
            tracing::warn!("failed to read terminal event: {err}");
            None
        }
    })
}

fn translate_event(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key_event) => Some(TuiEvent::Input(InputEvent::Key(key_event))),
        Event::Paste(text) => Some(TuiEvent::Input(InputEvent::Paste(text))),
        Event::FocusGained => Some(TuiEvent::Input(InputEvent::FocusGained)),
        Event::FocusLost => Some(TuiEvent::Input(InputEvent::FocusLost)),
        Event::Resize(_, _) => Some(TuiEvent::Draw),
        Event::Mouse(_) => None,
    }
}
