//! Captured cache state, used to seed a new [`DisplayInfoCache`].
//!
//! [`DisplayInfoCache`]: super::DisplayInfoCache

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::view_state::ViewState;
use crate::message::{MessageId, UserDisplayInfo, UserId};

/// Plain copy of every table plus the view state.
///
/// Serializable when the message type is, so a host can stash it across a
/// view teardown. Nothing in this crate writes it to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSnapshot<M> {
    pub authors: HashMap<MessageId, UserId>,
    pub display_infos: HashMap<UserId, UserDisplayInfo>,
    pub quotes: HashMap<MessageId, M>,
    pub missing_quotes: HashSet<MessageId>,
    pub view: ViewState,
}

impl<M> Default for CacheSnapshot<M> {
    fn default() -> Self {
        Self {
            authors: HashMap::new(),
            display_infos: HashMap::new(),
            quotes: HashMap::new(),
            missing_quotes: HashSet::new(),
            view: ViewState::default(),
        }
    }
}

impl<M> CacheSnapshot<M> {
    /// Total number of table entries, ignoring view state.
    pub fn entry_count(&self) -> usize {
        self.authors.len()
            + self.display_infos.len()
            + self.quotes.len()
            + self.missing_quotes.len()
    }
}
