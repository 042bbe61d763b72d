//! Per-message author display info and quoted-message memoization.
//!
//! A chat list re-renders constantly, and every row needs its author's name
//! and avatar plus, for replies, the quoted message. [`DisplayInfoCache`]
//! resolves each of those once per message and serves later calls from
//! memory until the view goes away and the whole cache is cleared.
//!
//! Four tables back the cache:
//!
//! - message id → author user id
//! - user id → [`UserDisplayInfo`]
//! - message id → quoted message
//! - message ids known to quote nothing (negative cache)
//!
//! The first two are always written together. A message id lives in at most
//! one of the last two. Nothing is evicted individually; entries accumulate
//! until [`DisplayInfoCache::clear_cache`].
//!
//! In [`CacheMode::Direct`] every lookup goes straight to the live message
//! and the tables are left alone.
//!
//! The scroll offset and thread flags of the view live here too because a
//! clear resets them along with the tables. See [`ViewState`].

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, info, warn};
use url::Url;

use super::mode::{CacheMode, ModeSource};
use super::snapshot::CacheSnapshot;
use super::view_state::ViewState;
use crate::message::{ChatMessage, MessageId, UserDisplayInfo, UserId};

/// Why the cache is being cleared. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// Explicit reset by the owner.
    Reset,
    /// The chat view was dismissed.
    ViewDismissed,
    /// The host reported memory pressure.
    MemoryPressure,
}

impl fmt::Display for ClearReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClearReason::Reset => "reset",
            ClearReason::ViewDismissed => "view_dismissed",
            ClearReason::MemoryPressure => "memory_pressure",
        };
        f.write_str(s)
    }
}

/// Derived-data cache for one chat view session.
///
/// Not internally synchronized. Wrap it in
/// [`SharedDisplayInfoCache`](super::SharedDisplayInfoCache) when more than
/// one thread needs it.
pub struct DisplayInfoCache<M> {
    authors: HashMap<MessageId, UserId>,
    display_infos: HashMap<UserId, UserDisplayInfo>,
    quotes: HashMap<MessageId, M>,
    missing_quotes: HashSet<MessageId>,
    view: ViewState,
    mode: Box<dyn ModeSource>,
    author_derivations: u64,
    quote_derivations: u64,
    hits: u64,
}

impl<M> Default for DisplayInfoCache<M> {
    fn default() -> Self {
        Self::new(CacheMode::Cached)
    }
}

impl<M> fmt::Debug for DisplayInfoCache<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayInfoCache")
            .field("mode", &self.mode.mode())
            .field("authors", &self.authors.len())
            .field("display_infos", &self.display_infos.len())
            .field("quotes", &self.quotes.len())
            .field("missing_quotes", &self.missing_quotes.len())
            .field("view", &self.view)
            .finish()
    }
}

impl<M> DisplayInfoCache<M> {
    /// Create an empty cache whose mode is read from `mode` on every lookup.
    pub fn new(mode: impl ModeSource + 'static) -> Self {
        Self::from_snapshot(CacheSnapshot::default(), mode)
    }

    pub fn builder() -> DisplayInfoCacheBuilder<M> {
        DisplayInfoCacheBuilder::default()
    }

    /// Restore a cache from previously captured state.
    ///
    /// Entries that would break the table invariants are dropped with a
    /// warning: display records filed under a different user id, author
    /// entries without a display record, and negative quote entries for
    /// messages that also have a stored quote.
    pub fn from_snapshot(snapshot: CacheSnapshot<M>, mode: impl ModeSource + 'static) -> Self {
        let CacheSnapshot {
            mut authors,
            mut display_infos,
            quotes,
            mut missing_quotes,
            view,
        } = snapshot;

        display_infos.retain(|user_id, info| {
            let keep = info.id() == user_id;
            if !keep {
                warn!(
                    key = %user_id,
                    record_id = %info.id(),
                    "Dropping display record filed under another user id"
                );
            }
            keep
        });
        authors.retain(|message_id, user_id| {
            let keep = display_infos.contains_key(user_id);
            if !keep {
                warn!(
                    message_id = %message_id,
                    user_id = %user_id,
                    "Dropping author entry without display record"
                );
            }
            keep
        });
        missing_quotes.retain(|message_id| {
            let keep = !quotes.contains_key(message_id);
            if !keep {
                warn!(
                    message_id = %message_id,
                    "Dropping negative quote entry shadowed by a stored quote"
                );
            }
            keep
        });

        Self {
            authors,
            display_infos,
            quotes,
            missing_quotes,
            view,
            mode: Box::new(mode),
            author_derivations: 0,
            quote_derivations: 0,
            hits: 0,
        }
    }

    /// Mode that the next lookup will use.
    pub fn mode(&self) -> CacheMode {
        self.mode.mode()
    }

    /// Reverse lookup: display record for a user whose messages have been
    /// resolved since the last clear.
    pub fn display_info(&self, user_id: &UserId) -> Option<&UserDisplayInfo> {
        self.display_infos.get(user_id)
    }

    /// Reset the view state and empty all four tables.
    pub fn clear_cache(&mut self) {
        self.clear_for(ClearReason::Reset);
    }

    /// Same as [`clear_cache`](Self::clear_cache), tagging the log event
    /// with `reason`.
    pub fn clear_for(&mut self, reason: ClearReason) {
        let dropped = self.entry_count();
        self.view.reset();
        self.authors.clear();
        self.display_infos.clear();
        self.quotes.clear();
        self.missing_quotes.clear();
        self.author_derivations = 0;
        self.quote_derivations = 0;
        self.hits = 0;
        info!(reason = %reason, entries = dropped, "Display info cache cleared");
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn view_state_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn scroll_offset(&self) -> f64 {
        self.view.scroll_offset()
    }

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.view.set_scroll_offset(offset);
    }

    pub fn thread_shown(&self) -> bool {
        self.view.thread_shown()
    }

    /// Hiding the thread also clears the jump target.
    pub fn set_thread_shown(&mut self, shown: bool) {
        self.view.set_thread_shown(shown);
    }

    pub fn jump_to_reply_id(&self) -> Option<&str> {
        self.view.jump_to_reply_id()
    }

    pub fn set_jump_to_reply_id(&mut self, reply_id: Option<String>) {
        self.view.set_jump_to_reply_id(reply_id);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            authors: self.authors.len(),
            display_infos: self.display_infos.len(),
            quotes: self.quotes.len(),
            missing_quotes: self.missing_quotes.len(),
            author_derivations: self.author_derivations,
            quote_derivations: self.quote_derivations,
            hits: self.hits,
        }
    }

    /// `true` when all four tables are empty. View state is not considered.
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    fn entry_count(&self) -> usize {
        self.authors.len()
            + self.display_infos.len()
            + self.quotes.len()
            + self.missing_quotes.len()
    }
}

impl<M: ChatMessage + Clone> DisplayInfoCache<M> {
    pub fn author_id(&mut self, message: &M) -> UserId {
        self.resolve_author(message).id().clone()
    }

    /// Author's display name, or the author's id when no name is set.
    pub fn author_name(&mut self, message: &M) -> String {
        self.resolve_author(message).name().to_string()
    }

    pub fn author_image_url(&mut self, message: &M) -> Option<Url> {
        self.resolve_author(message).image_url().cloned()
    }

    pub fn author_info(&mut self, message: &M) -> UserDisplayInfo {
        self.resolve_author(message).into_owned()
    }

    /// Message quoted by `message`, if any.
    ///
    /// In cached mode the live message is consulted at most once per message
    /// id; both outcomes are remembered.
    pub fn quoted_message(&mut self, message: &M) -> Option<M> {
        if self.mode.mode() == CacheMode::Direct {
            return message.quoted_message();
        }

        let message_id = message.id();
        if self.missing_quotes.contains(message_id) {
            self.hits += 1;
            return None;
        }
        if let Some(quoted) = self.quotes.get(message_id) {
            self.hits += 1;
            return Some(quoted.clone());
        }

        let quoted = message.quoted_message();
        self.quote_derivations += 1;
        match &quoted {
            Some(q) => {
                debug!(message_id = %message_id, quoted_id = %q.id(), "Resolved quoted message");
                self.quotes.insert(message_id.clone(), q.clone());
            }
            None => {
                debug!(message_id = %message_id, "Message quotes nothing");
                self.missing_quotes.insert(message_id.clone());
            }
        }
        quoted
    }

    /// Capture the tables and view state.
    pub fn snapshot(&self) -> CacheSnapshot<M> {
        CacheSnapshot {
            authors: self.authors.clone(),
            display_infos: self.display_infos.clone(),
            quotes: self.quotes.clone(),
            missing_quotes: self.missing_quotes.clone(),
            view: self.view.clone(),
        }
    }

    fn resolve_author(&mut self, message: &M) -> Cow<'_, UserDisplayInfo> {
        match self.mode.mode() {
            CacheMode::Direct => Cow::Owned(UserDisplayInfo::from_author(&message.author())),
            CacheMode::Cached => Cow::Borrowed(self.memoized_author(message)),
        }
    }

    fn memoized_author(&mut self, message: &M) -> &UserDisplayInfo {
        let known = self
            .authors
            .get(message.id())
            .filter(|user_id| self.display_infos.contains_key(*user_id))
            .cloned();
        if let Some(user_id) = known {
            self.hits += 1;
            return &self.display_infos[&user_id];
        }
        self.derive_author(message)
    }

    fn derive_author(&mut self, message: &M) -> &UserDisplayInfo {
        let info = UserDisplayInfo::from_author(&message.author());
        let user_id = info.id().clone();
        self.author_derivations += 1;
        debug!(
            message_id = %message.id(),
            user_id = %user_id,
            "Derived author display info"
        );
        self.authors.insert(message.id().clone(), user_id.clone());
        self.display_infos.insert(user_id.clone(), info);
        &self.display_infos[&user_id]
    }
}

/// Table sizes and lookup counters since the last clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Messages with a known author.
    pub authors: usize,
    /// Distinct display records.
    pub display_infos: usize,
    /// Messages with a stored quoted message.
    pub quotes: usize,
    /// Messages known to quote nothing.
    pub missing_quotes: usize,
    /// Times an author was read from a live message in cached mode.
    pub author_derivations: u64,
    /// Times a quoted message was read from a live message in cached mode.
    pub quote_derivations: u64,
    /// Lookups answered from the tables.
    pub hits: u64,
}

/// Builder for a [`DisplayInfoCache`] seeded with initial state.
pub struct DisplayInfoCacheBuilder<M> {
    snapshot: CacheSnapshot<M>,
    scroll_offset: f64,
    thread_shown: bool,
    jump_to_reply_id: Option<String>,
    mode: Box<dyn ModeSource>,
}

impl<M> Default for DisplayInfoCacheBuilder<M> {
    fn default() -> Self {
        Self {
            snapshot: CacheSnapshot::default(),
            scroll_offset: 0.0,
            thread_shown: false,
            jump_to_reply_id: None,
            mode: Box::new(CacheMode::Cached),
        }
    }
}

impl<M> DisplayInfoCacheBuilder<M> {
    pub fn mode(mut self, mode: impl ModeSource + 'static) -> Self {
        self.mode = Box::new(mode);
        self
    }

    pub fn authors(mut self, authors: HashMap<MessageId, UserId>) -> Self {
        self.snapshot.authors = authors;
        self
    }

    pub fn display_infos(mut self, display_infos: HashMap<UserId, UserDisplayInfo>) -> Self {
        self.snapshot.display_infos = display_infos;
        self
    }

    pub fn quotes(mut self, quotes: HashMap<MessageId, M>) -> Self {
        self.snapshot.quotes = quotes;
        self
    }

    pub fn missing_quotes(mut self, missing_quotes: HashSet<MessageId>) -> Self {
        self.snapshot.missing_quotes = missing_quotes;
        self
    }

    pub fn scroll_offset(mut self, offset: f64) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn thread_shown(mut self, shown: bool) -> Self {
        self.thread_shown = shown;
        self
    }

    pub fn jump_to_reply_id(mut self, reply_id: impl Into<String>) -> Self {
        self.jump_to_reply_id = Some(reply_id.into());
        self
    }

    pub fn build(self) -> DisplayInfoCache<M> {
        let Self {
            mut snapshot,
            scroll_offset,
            thread_shown,
            jump_to_reply_id,
            mode,
        } = self;
        snapshot.view = ViewState::from_parts(scroll_offset, thread_shown, jump_to_reply_id);
        DisplayInfoCache::from_snapshot(snapshot, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::mode::ModeFlag;
    use crate::message::{Author, UserRole};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone)]
    struct TestMessage {
        id: MessageId,
        author: Rc<RefCell<Author>>,
        quoted: Option<Box<TestMessage>>,
        author_reads: Rc<Cell<usize>>,
        quote_reads: Rc<Cell<usize>>,
    }

    impl TestMessage {
        fn new(id: &str, author: Author) -> Self {
            Self {
                id: MessageId::from(id),
                author: Rc::new(RefCell::new(author)),
                quoted: None,
                author_reads: Rc::new(Cell::new(0)),
                quote_reads: Rc::new(Cell::new(0)),
            }
        }

        fn quoting(mut self, quoted: TestMessage) -> Self {
            self.quoted = Some(Box::new(quoted));
            self
        }
    }

    impl ChatMessage for TestMessage {
        fn id(&self) -> &MessageId {
            &self.id
        }

        fn author(&self) -> Author {
            self.author_reads.set(self.author_reads.get() + 1);
            self.author.borrow().clone()
        }

        fn quoted_message(&self) -> Option<Self> {
            self.quote_reads.set(self.quote_reads.get() + 1);
            self.quoted.as_deref().cloned()
        }
    }

    fn alice() -> Author {
        Author::new("u1")
            .with_name("Alice")
            .with_image_url(Url::parse("https://cdn.example.com/alice.png").unwrap())
            .with_role(UserRole::Admin)
    }

    #[test]
    fn test_author_info_derived_once() {
        let mut cache = DisplayInfoCache::default();
        let msg = TestMessage::new("m1", alice());

        let first = cache.author_info(&msg);
        let second = cache.author_info(&msg);
        assert_eq!(first, second);
        assert_eq!(msg.author_reads.get(), 1);
        assert_eq!(cache.stats().author_derivations, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_author_projections_share_memo() {
        let mut cache = DisplayInfoCache::default();
        let msg = TestMessage::new("m1", alice());

        assert_eq!(cache.author_id(&msg), UserId::from("u1"));
        assert_eq!(cache.author_name(&msg), "Alice");
        assert_eq!(
            cache.author_image_url(&msg).map(|u| u.to_string()),
            Some("https://cdn.example.com/alice.png".to_string())
        );
        assert_eq!(msg.author_reads.get(), 1);
    }

    #[test]
    fn test_author_name_falls_back_to_id() {
        let mut cache = DisplayInfoCache::default();
        let msg = TestMessage::new("m1", Author::new("u7"));
        assert_eq!(cache.author_name(&msg), "u7");
        assert_eq!(cache.author_image_url(&msg), None);
    }

    #[test]
    fn test_author_tables_written_together() {
        let mut cache = DisplayInfoCache::default();
        cache.author_id(&TestMessage::new("m1", alice()));
        cache.author_id(&TestMessage::new("m2", alice()));
        let stats = cache.stats();
        assert_eq!(stats.authors, 2);
        assert_eq!(stats.display_infos, 1);
    }

    #[test]
    fn test_quoted_message_negative_cache() {
        let mut cache = DisplayInfoCache::default();
        let msg = TestMessage::new("m1", alice());

        assert!(cache.quoted_message(&msg).is_none());
        assert!(cache.quoted_message(&msg).is_none());
        assert_eq!(msg.quote_reads.get(), 1);
        let stats = cache.stats();
        assert_eq!(stats.missing_quotes, 1);
        assert_eq!(stats.quotes, 0);
    }

    #[test]
    fn test_quoted_message_positive_cache() {
        let mut cache = DisplayInfoCache::default();
        let original = TestMessage::new("m0", alice());
        let reply = TestMessage::new("m1", alice()).quoting(original);

        let first = cache.quoted_message(&reply).map(|q| q.id.clone());
        let second = cache.quoted_message(&reply).map(|q| q.id.clone());
        assert_eq!(first, Some(MessageId::from("m0")));
        assert_eq!(second, first);
        assert_eq!(reply.quote_reads.get(), 1);
        let stats = cache.stats();
        assert_eq!(stats.quotes, 1);
        assert_eq!(stats.missing_quotes, 0);
    }

    #[test]
    fn test_display_info_reverse_lookup() {
        let mut cache = DisplayInfoCache::default();
        let info = cache.author_info(&TestMessage::new("m1", alice()));

        assert_eq!(cache.display_info(&UserId::from("u1")), Some(&info));
        assert_eq!(cache.display_info(&UserId::from("unknown")), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cache = DisplayInfoCache::default();
        let msg = TestMessage::new("m1", alice()).quoting(TestMessage::new("m0", alice()));
        let lonely = TestMessage::new("m2", alice());
        cache.author_info(&msg);
        cache.quoted_message(&msg);
        cache.quoted_message(&lonely);
        cache.set_scroll_offset(42.0);
        cache.set_thread_shown(true);
        cache.set_jump_to_reply_id(Some("r1".into()));

        cache.clear_cache();

        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.scroll_offset(), 0.0);
        assert!(!cache.thread_shown());
        assert_eq!(cache.jump_to_reply_id(), None);

        cache.author_info(&msg);
        assert_eq!(msg.author_reads.get(), 2);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cache: DisplayInfoCache<TestMessage> = DisplayInfoCache::default();
        cache.clear_for(ClearReason::MemoryPressure);
        cache.clear_for(ClearReason::ViewDismissed);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_direct_mode_bypasses_tables() {
        let mut cache = DisplayInfoCache::new(CacheMode::Direct);
        let msg = TestMessage::new("m1", alice()).quoting(TestMessage::new("m0", alice()));

        let before = cache.author_info(&msg);
        msg.author.borrow_mut().name = Some("Alicia".into());
        let after = cache.author_info(&msg);

        assert_eq!(before.name(), "Alice");
        assert_eq!(after.name(), "Alicia");
        assert!(cache.quoted_message(&msg).is_some());
        assert!(cache.quoted_message(&msg).is_some());
        assert_eq!(msg.quote_reads.get(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_mode_flag_checked_per_lookup() {
        let flag = ModeFlag::new(CacheMode::Cached);
        let mut cache = DisplayInfoCache::new(flag.clone());
        let msg = TestMessage::new("m1", alice());

        cache.author_info(&msg);
        assert_eq!(cache.stats().authors, 1);

        flag.set_mode(CacheMode::Direct);
        assert_eq!(cache.mode(), CacheMode::Direct);
        msg.author.borrow_mut().name = Some("Alicia".into());
        assert_eq!(cache.author_name(&msg), "Alicia");
        assert_eq!(msg.author_reads.get(), 2);
    }

    #[test]
    fn test_builder_seeds_state() {
        let info = UserDisplayInfo::from_author(&alice());
        let cache: DisplayInfoCache<TestMessage> = DisplayInfoCache::builder()
            .authors(HashMap::from([(MessageId::from("m1"), UserId::from("u1"))]))
            .display_infos(HashMap::from([(UserId::from("u1"), info.clone())]))
            .missing_quotes(HashSet::from([MessageId::from("m1")]))
            .scroll_offset(8.0)
            .thread_shown(true)
            .jump_to_reply_id("r9")
            .build();

        assert_eq!(cache.display_info(&UserId::from("u1")), Some(&info));
        assert_eq!(cache.scroll_offset(), 8.0);
        assert_eq!(cache.jump_to_reply_id(), Some("r9"));
        assert_eq!(cache.stats().missing_quotes, 1);
    }

    #[test]
    fn test_seeded_author_served_without_derivation() {
        let info = UserDisplayInfo::from_author(&alice());
        let mut cache = DisplayInfoCache::builder()
            .authors(HashMap::from([(MessageId::from("m1"), UserId::from("u1"))]))
            .display_infos(HashMap::from([(UserId::from("u1"), info.clone())]))
            .build();
        let msg = TestMessage::new("m1", Author::new("someone-else"));

        assert_eq!(cache.author_info(&msg), info);
        assert_eq!(msg.author_reads.get(), 0);
    }

    #[test]
    fn test_from_snapshot_repairs_invariants() {
        let info = UserDisplayInfo::from_author(&alice());
        let mut snapshot: CacheSnapshot<TestMessage> = CacheSnapshot::default();
        snapshot.authors.insert(MessageId::from("m1"), UserId::from("u1"));
        snapshot.authors.insert(MessageId::from("m2"), UserId::from("ghost"));
        snapshot.display_infos.insert(UserId::from("u1"), info.clone());
        snapshot.display_infos.insert(UserId::from("misfiled"), info.clone());
        snapshot.quotes.insert(MessageId::from("m3"), TestMessage::new("m0", alice()));
        snapshot.missing_quotes.insert(MessageId::from("m3"));
        snapshot.missing_quotes.insert(MessageId::from("m4"));

        let cache = DisplayInfoCache::from_snapshot(snapshot, CacheMode::Cached);
        let stats = cache.stats();
        assert_eq!(stats.authors, 1);
        assert_eq!(stats.display_infos, 1);
        assert_eq!(stats.quotes, 1);
        assert_eq!(stats.missing_quotes, 1);
        assert_eq!(cache.display_info(&UserId::from("misfiled")), None);
    }

    #[test]
    fn test_snapshot_round_trip_through_restore() {
        let mut cache = DisplayInfoCache::default();
        let msg = TestMessage::new("m1", alice());
        cache.author_info(&msg);
        cache.quoted_message(&msg);
        cache.set_thread_shown(true);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.entry_count(), 3);
        let restored = DisplayInfoCache::from_snapshot(snapshot, CacheMode::Cached);
        assert_eq!(restored.stats().authors, 1);
        assert_eq!(restored.stats().missing_quotes, 1);
        assert!(restored.thread_shown());
    }

    #[test]
    fn test_clear_reason_display() {
        assert_eq!(ClearReason::MemoryPressure.to_string(), "memory_pressure");
        assert_eq!(ClearReason::ViewDismissed.to_string(), "view_dismissed");
    }
}
