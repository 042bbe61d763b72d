//! Display-info caching for chat views: author records, quoted messages,
//! and the view flags that share their lifecycle.

pub mod display_info;
pub mod mode;
pub mod shared;
pub mod snapshot;
pub mod view_state;

pub use display_info::{CacheStats, ClearReason, DisplayInfoCache, DisplayInfoCacheBuilder};
pub use mode::{CacheMode, ModeFlag, ModeSource};
pub use shared::SharedDisplayInfoCache;
pub use snapshot::CacheSnapshot;
pub use view_state::ViewState;
