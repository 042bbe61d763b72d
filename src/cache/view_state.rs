//! Scroll and thread flags for the chat view.
//!
//! These are not cached data, but they share the cache's lifecycle: a cache
//! clear resets them too.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// UI scalars co-located with the display cache.
///
/// `jump_to_reply_id` can only be set while the thread is shown, and hiding
/// the thread clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawViewState")]
pub struct ViewState {
    scroll_offset: f64,
    thread_shown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    jump_to_reply_id: Option<String>,
}

/// Unchecked wire form; converted through [`ViewState::from_parts`].
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawViewState {
    scroll_offset: f64,
    thread_shown: bool,
    jump_to_reply_id: Option<String>,
}

impl From<RawViewState> for ViewState {
    fn from(raw: RawViewState) -> Self {
        ViewState::from_parts(raw.scroll_offset, raw.thread_shown, raw.jump_to_reply_id)
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view state from raw parts, dropping a jump target when the
    /// thread is hidden.
    pub fn from_parts(
        scroll_offset: f64,
        thread_shown: bool,
        jump_to_reply_id: Option<String>,
    ) -> Self {
        let mut state = Self {
            scroll_offset,
            thread_shown,
            jump_to_reply_id: None,
        };
        state.set_jump_to_reply_id(jump_to_reply_id);
        state
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = offset;
    }

    pub fn thread_shown(&self) -> bool {
        self.thread_shown
    }

    pub fn set_thread_shown(&mut self, shown: bool) {
        self.thread_shown = shown;
        if !shown {
            self.jump_to_reply_id = None;
        }
    }

    pub fn jump_to_reply_id(&self) -> Option<&str> {
        self.jump_to_reply_id.as_deref()
    }

    /// Set the reply to jump to once the thread renders.
    ///
    /// Ignored while the thread is hidden.
    pub fn set_jump_to_reply_id(&mut self, reply_id: Option<String>) {
        if reply_id.is_some() && !self.thread_shown {
            debug!(reply_id = ?reply_id, "Thread hidden, ignoring jump target");
            return;
        }
        self.jump_to_reply_id = reply_id;
    }

    pub fn reset(&mut self) {
        self.scroll_offset = 0.0;
        self.set_thread_shown(false);
    }
}
