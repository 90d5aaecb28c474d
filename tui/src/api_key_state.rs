use derive_more::IsVariant;

use crate::app_event::InputIntent;

/// Validation lifecycle of the API key field.
///
/// Only [`ApiKeyInputState::Initial`] and [`ApiKeyInputState::Error`] accept edits or pastes.
/// Transitions are driven from outside the field (e.g. "submitted, now verifying"), so no
/// transition is rejected here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IsVariant)]
pub enum ApiKeyInputState {
    #[default]
    Initial,
    Verifying,
    Verified,
    Error,
}

impl ApiKeyInputState {
    pub fn is_editable(self) -> bool {
        matches!(self, ApiKeyInputState::Initial | ApiKeyInputState::Error)
    }

    /// Move to `next`, returning the intent the presentation layer should act on.
    pub fn transition(&mut self, next: ApiKeyInputState) -> Option<InputIntent> {
        if *self != next {
            tracing::debug!(from = ?*self, to = ?next, "api key input state change");
        }
        *self = next;
        next.is_verifying().then_some(InputIntent::StartProgress)
    }
}
