//! Presentation for [`ApiKeyInput`].
//!
//! Styling is injected through [`ApiKeyInputStyles`]; nothing here reads global theme state. The
//! view only reads from the field, so it can be rebuilt for every frame.

use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::WidgetRef;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use crate::api_key_input::ApiKeyInput;
use crate::api_key_state::ApiKeyInputState;
use crate::render::renderable::ColumnRenderable;
use crate::render::renderable::Renderable;

const PLACEHOLDER: &str = "Enter your API key...";

/// Colors and glyphs used by the API key dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyInputStyles {
    pub prompt: Style,
    pub accent: Style,
    pub error: Style,
    pub muted: Style,
    pub warning: Style,
    pub check_icon: &'static str,
    pub error_icon: &'static str,
    /// Replaces every character of the secret when set.
    pub mask: Option<char>,
}

impl Default for ApiKeyInputStyles {
    fn default() -> Self {
        Self {
            prompt: Style::default().fg(Color::Rgb(0x6B, 0x50, 0xFF)),
            accent: Style::default()
                .fg(Color::Rgb(0x00, 0xFF, 0xB2))
                .add_modifier(Modifier::BOLD),
            error: Style::default().fg(Color::Rgb(0xFF, 0x38, 0x8B)),
            muted: Style::default().fg(Color::DarkGray),
            warning: Style::default().fg(Color::Rgb(0xFF, 0x38, 0x8B)),
            check_icon: "✓",
            error_icon: "×",
            mask: Some('•'),
        }
    }
}

/// Environment variable that lets users skip the dialog, e.g. `OPENAI_API_KEY`.
pub fn provider_env_var(provider_name: &str) -> String {
    let mut name: String = provider_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    name.push_str("_API_KEY");
    name
}

pub fn title_line(input: &ApiKeyInput, styles: &ApiKeyInputStyles) -> Line<'static> {
    let key_label = format!("{} API Key", input.provider_name());
    let spans: Vec<Span<'static>> = match input.state() {
        ApiKeyInputState::Initial => vec![
            Span::styled("Enter your ", styles.prompt),
            Span::styled(key_label, styles.accent),
            Span::styled(".", styles.prompt),
        ],
        ApiKeyInputState::Verifying => vec![
            Span::styled("Verifying your ", styles.prompt),
            Span::styled(key_label, styles.accent),
            Span::styled("...", styles.prompt),
        ],
        ApiKeyInputState::Verified => vec![
            Span::styled(key_label, styles.accent),
            Span::styled(" validated.", styles.prompt),
        ],
        ApiKeyInputState::Error => vec![
            Span::styled("Invalid ", styles.error),
            Span::styled(key_label, styles.accent),
            Span::styled(". Try again?", styles.error),
        ],
    };
    Line::from(spans)
}

/// Everything the dialog draws for one frame.
pub struct ApiKeyInputView<'a> {
    input: &'a ApiKeyInput,
    styles: &'a ApiKeyInputStyles,
    config_path_display: Option<&'a str>,
    now: Instant,
}

impl<'a> ApiKeyInputView<'a> {
    pub fn new(input: &'a ApiKeyInput, styles: &'a ApiKeyInputStyles, now: Instant) -> Self {
        Self {
            input,
            styles,
            config_path_display: None,
            now,
        }
    }

    /// Show where the key will be stored, e.g. `~/.keyprompt/config.toml`.
    pub fn config_path_display(mut self, path: &'a str) -> Self {
        self.config_path_display = Some(path);
        self
    }

    fn column(&self) -> ColumnRenderable<'a> {
        let styles = self.styles;
        let mut column = ColumnRenderable::new();
        if self.input.show_title() {
            column.push(title_line(self.input, styles));
            column.push("");
        }
        column.push(InputRow {
            input: self.input,
            styles,
        });

        if self.input.state().is_initial() {
            column.push("");
            column.push(Line::styled("💡 Tips:", styles.muted));
            if self.input.focus_warning_visible(self.now) {
                column.push(Line::styled(
                    "  ⚠ Click here to focus before pasting",
                    styles.warning,
                ));
            }
            column.push(Line::styled(
                "  • Try Ctrl+Shift+V or Shift+Insert to paste",
                styles.muted,
            ));
            column.push(Line::styled(
                format!(
                    "  • Set {} environment variable to skip this step",
                    provider_env_var(self.input.provider_name())
                ),
                styles.muted,
            ));
        }

        if let Some(path) = self.config_path_display {
            column.push("");
            column.push(Line::styled(
                format!("This will be written to the global configuration: {path}"),
                styles.muted,
            ));
        }
        column
    }
}

impl Renderable for ApiKeyInputView<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        self.column().render(area, buf);
    }

    fn desired_height(&self, width: u16) -> u16 {
        self.column().desired_height(width)
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        self.column().cursor_pos(area)
    }
}

/// Prompt glyph followed by the (masked) value, scrolled so the cursor stays visible.
struct InputRow<'a> {
    input: &'a ApiKeyInput,
    styles: &'a ApiKeyInputStyles,
}

impl InputRow<'_> {
    fn prompt(&self) -> Span<'static> {
        let styles = self.styles;
        match self.input.state() {
            ApiKeyInputState::Initial => Span::styled("> ", styles.prompt),
            ApiKeyInputState::Verifying => {
                Span::styled(format!("{} ", self.input.spinner_frame()), styles.accent)
            }
            ApiKeyInputState::Verified => {
                Span::styled(format!("{} ", styles.check_icon), styles.accent)
            }
            ApiKeyInputState::Error => {
                Span::styled(format!("{} ", styles.error_icon), styles.error)
            }
        }
    }

    fn display_chars(&self) -> Vec<char> {
        match self.styles.mask {
            Some(mask) => vec![mask; self.input.buffer().len()],
            None => self.input.value().chars().collect(),
        }
    }

    /// First visible character and the cursor column relative to the value area.
    fn scroll(&self, chars: &[char], value_width: u16) -> (usize, u16) {
        let cursor = self.input.buffer().cursor().min(chars.len());
        let width_of = |slice: &[char]| -> usize {
            slice.iter().map(|c| c.width().unwrap_or(0)).sum()
        };
        // Keep one column free for the cursor itself.
        let budget = usize::from(value_width).saturating_sub(1);
        let mut start = 0;
        while start < cursor && width_of(&chars[start..cursor]) > budget {
            start += 1;
        }
        let column = width_of(&chars[start..cursor]).min(usize::from(value_width));
        (start, column as u16)
    }
}

impl Renderable for InputRow<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        let prompt = self.prompt();
        let prompt_width = prompt.content.width() as u16;
        let value_width = area.width.saturating_sub(prompt_width);

        let value = if self.input.buffer().is_empty() {
            Span::styled(PLACEHOLDER, self.styles.muted)
        } else {
            let chars = self.display_chars();
            let (start, _) = self.scroll(&chars, value_width);
            Span::raw(chars[start..].iter().collect::<String>())
        };
        Line::from(vec![prompt, value]).render_ref(area, buf);
    }

    fn desired_height(&self, _width: u16) -> u16 {
        1
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if !self.input.state().is_editable() {
            return None;
        }
        let prompt_width = self.prompt().content.width() as u16;
        let value_width = area.width.saturating_sub(prompt_width);
        let chars = self.display_chars();
        let (_, column) = self.scroll(&chars, value_width);
        let x = area
            .x
            .saturating_add(prompt_width)
            .saturating_add(column)
            .min(area.right().saturating_sub(1));
        Some((x, area.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_event::InputEvent;
    use crate::clipboard_paste::ArboardClipboard;
    use crate::paste_coordinator::PasteConfig;
    use crate::paste_coordinator::PasteCoordinator;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn input(now: Instant) -> ApiKeyInput {
        let coordinator = PasteCoordinator::new(Arc::new(ArboardClipboard), PasteConfig::default());
        let mut input = ApiKeyInput::new_at(coordinator, now);
        input.set_provider_name("OpenAI");
        input
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn rows(buf: &Buffer) -> Vec<String> {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    async fn set_state(input: &mut ApiKeyInput, state: ApiKeyInputState, now: Instant) {
        input.handle_event_at(InputEvent::StateChange(state), now).await;
    }

    #[tokio::test]
    async fn title_follows_state() {
        let now = Instant::now();
        let styles = ApiKeyInputStyles::default();
        let mut input = input(now);

        assert_snapshot!(line_text(&title_line(&input, &styles)), @"Enter your OpenAI API Key.");
        set_state(&mut input, ApiKeyInputState::Verifying, now).await;
        assert_snapshot!(line_text(&title_line(&input, &styles)), @"Verifying your OpenAI API Key...");
        set_state(&mut input, ApiKeyInputState::Verified, now).await;
        assert_snapshot!(line_text(&title_line(&input, &styles)), @"OpenAI API Key validated.");
        set_state(&mut input, ApiKeyInputState::Error, now).await;
        assert_snapshot!(line_text(&title_line(&input, &styles)), @"Invalid OpenAI API Key. Try again?");
    }

    #[test]
    fn env_var_name_is_upper_snake_case() {
        assert_eq!(provider_env_var("OpenAI"), "OPENAI_API_KEY");
        assert_eq!(provider_env_var("google vertex-ai"), "GOOGLE_VERTEX_AI_API_KEY");
    }

    #[test]
    fn renders_masked_value_with_cursor_after_title() {
        let now = Instant::now();
        let styles = ApiKeyInputStyles::default();
        let mut input = input(now);
        input.set_value("sk-abc");
        let view = ApiKeyInputView::new(&input, &styles, now);

        let area = Rect::new(0, 0, 60, view.desired_height(60));
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        let rows = rows(&buf);

        assert_eq!(rows[0], "Enter your OpenAI API Key.");
        assert_eq!(rows[1], "");
        assert_eq!(rows[2], "> ••••••");
        assert!(rows.iter().any(|row| row.contains("OPENAI_API_KEY")));
        assert!(!rows.iter().any(|row| row.contains("sk-abc")));
        assert_eq!(view.cursor_pos(area), Some((8, 2)));
    }

    #[test]
    fn placeholder_and_config_path_are_shown() {
        let now = Instant::now();
        let styles = ApiKeyInputStyles::default();
        let mut input = input(now);
        input.set_show_title(false);
        let view =
            ApiKeyInputView::new(&input, &styles, now).config_path_display("~/.keyprompt/config.toml");

        let area = Rect::new(0, 0, 80, view.desired_height(80));
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        let rows = rows(&buf);

        assert_eq!(rows[0], "> Enter your API key...");
        assert_eq!(
            rows.last().map(String::as_str),
            Some("This will be written to the global configuration: ~/.keyprompt/config.toml")
        );
        assert_eq!(view.cursor_pos(area), Some((2, 0)));
    }

    #[test]
    fn focus_warning_appears_once_focus_is_stale() {
        let start = Instant::now();
        let styles = ApiKeyInputStyles::default();
        let input = input(start);

        let fresh = ApiKeyInputView::new(&input, &styles, start);
        let stale = ApiKeyInputView::new(&input, &styles, start + Duration::from_secs(5));

        assert_eq!(stale.desired_height(80), fresh.desired_height(80) + 1);
    }

    #[tokio::test]
    async fn verified_state_hides_tips_and_cursor() {
        let now = Instant::now();
        let styles = ApiKeyInputStyles::default();
        let mut input = input(now);
        input.set_value("sk-abc");
        set_state(&mut input, ApiKeyInputState::Verified, now).await;
        let view = ApiKeyInputView::new(&input, &styles, now);

        let area = Rect::new(0, 0, 40, view.desired_height(40));
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        assert_eq!(view.desired_height(40), 3);
        assert_eq!(rows(&buf)[2], "✓ ••••••");
        assert_eq!(view.cursor_pos(area), None);
    }

    #[test]
    fn long_values_scroll_to_keep_cursor_visible() {
        let now = Instant::now();
        let styles = ApiKeyInputStyles {
            mask: None,
            ..ApiKeyInputStyles::default()
        };
        let mut input = input(now);
        input.set_show_title(false);
        input.set_value("abcdefghijklmnop");
        let view = ApiKeyInputView::new(&input, &styles, now);

        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        // Prompt takes 2 columns, leaving 8; 7 chars fit before the cursor.
        assert_eq!(rows(&buf)[0], "> jklmnop");
        assert_eq!(view.cursor_pos(area), Some((9, 0)));
    }
}
