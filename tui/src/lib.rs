// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod api_key_input;
mod api_key_state;
mod api_key_view;
mod app_event;
mod clipboard_paste;
mod event_loop;
mod focus_tracker;
mod paste_coordinator;
mod render;
mod text_buffer;
mod tui;
mod version;

pub use api_key_input::ApiKeyInput;
pub use api_key_input::is_paste_shortcut;
pub use api_key_state::ApiKeyInputState;
pub use api_key_view::ApiKeyInputStyles;
pub use api_key_view::ApiKeyInputView;
pub use api_key_view::provider_env_var;
pub use api_key_view::title_line;
pub use app_event::InputEvent;
pub use app_event::InputIntent;
pub use clipboard_paste::ArboardClipboard;
pub use clipboard_paste::ClipboardError;
pub use clipboard_paste::ClipboardGateway;
pub use clipboard_paste::sanitize_pasted_secret;
pub use event_loop::ApiKeyPromptOutcome;
pub use event_loop::run_api_key_prompt;
pub use event_loop::run_event_loop;
pub use focus_tracker::DEFAULT_FOCUS_FRESHNESS;
pub use focus_tracker::FocusTracker;
pub use paste_coordinator::DEFAULT_CLIPBOARD_TIMEOUT;
pub use paste_coordinator::PasteConfig;
pub use paste_coordinator::PasteCoordinator;
pub use paste_coordinator::PasteError;
pub use paste_coordinator::PasteOutcome;
pub use render::renderable::Renderable;
pub use text_buffer::TextBuffer;
pub use tui::TuiEvent;
pub use version::KEYPROMPT_VERSION;
