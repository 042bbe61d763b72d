//! chatview-cache: derived-data cache for chat message list views.
//!
//! Memoizes per-message author display info and quoted-message resolution
//! so a chat view can re-render without going back to the message store,
//! and carries the view's scroll/thread flags which reset with the cache.
//!
//! ```rust
//! use chatview_cache::{Author, CacheMode, ChatMessage, DisplayInfoCache, MessageId};
//!
//! #[derive(Clone)]
//! struct Msg {
//!     id: MessageId,
//!     sender: String,
//! }
//!
//! impl ChatMessage for Msg {
//!     fn id(&self) -> &MessageId {
//!         &self.id
//!     }
//!     fn author(&self) -> Author {
//!         Author::new(self.sender.as_str()).with_name("Alice")
//!     }
//!     fn quoted_message(&self) -> Option<Self> {
//!         None
//!     }
//! }
//!
//! let mut cache = DisplayInfoCache::new(CacheMode::Cached);
//! let msg = Msg { id: MessageId::from("m1"), sender: "u1".into() };
//! assert_eq!(cache.author_name(&msg), "Alice");
//! assert!(cache.quoted_message(&msg).is_none());
//! cache.clear_cache();
//! assert!(cache.is_empty());
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod extension;
pub mod message;

pub use cache::{
    CacheMode, CacheSnapshot, CacheStats, ClearReason, DisplayInfoCache, ModeFlag, ModeSource,
    SharedDisplayInfoCache, ViewState,
};
pub use config::{CacheConfig, Config};
pub use error::{ChatViewError, Result};
pub use extension::MessageDisplayExt;
pub use message::{Author, ChatMessage, MessageId, UserDisplayInfo, UserId, UserRole};
