//! Message-side access to the display cache.
//!
//! Lets rendering code ask a message for its author's display info. The
//! cache is always passed in by the caller.

use crate::cache::DisplayInfoCache;
use crate::message::{ChatMessage, UserDisplayInfo, UserId};

pub trait MessageDisplayExt: ChatMessage + Clone {
    /// Display info of this message's author, memoized in `cache`.
    fn author_display_info(&self, cache: &mut DisplayInfoCache<Self>) -> UserDisplayInfo {
        cache.author_info(self)
    }

    /// Display info for any user already resolved in `cache`.
    fn display_info_for(
        &self,
        user_id: &UserId,
        cache: &DisplayInfoCache<Self>,
    ) -> Option<UserDisplayInfo> {
        cache.display_info(user_id).cloned()
    }
}

impl<M: ChatMessage + Clone> MessageDisplayExt for M {}
