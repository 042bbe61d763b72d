//! Direct vs cached lookup strategy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How author and quote lookups are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Lookups go through the memo tables (default).
    #[default]
    Cached,
    /// Every lookup re-derives from the live message. Tables stay untouched.
    Direct,
}

impl CacheMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheMode::Cached => "cached",
            CacheMode::Direct => "direct",
        }
    }

    /// Parse a mode name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cached" => Some(CacheMode::Cached),
            "direct" => Some(CacheMode::Direct),
            _ => None,
        }
    }
}

/// Source of the current [`CacheMode`], read once at the top of every lookup.
pub trait ModeSource: Send + Sync {
    fn mode(&self) -> CacheMode;
}

impl ModeSource for CacheMode {
    fn mode(&self) -> CacheMode {
        *self
    }
}

impl<T: ModeSource + ?Sized> ModeSource for Box<T> {
    fn mode(&self) -> CacheMode {
        (**self).mode()
    }
}

/// Process-wide mode toggle owned by the runtime configuration.
///
/// Clones share the same flag, so the config layer keeps one handle and the
/// cache keeps another.
#[derive(Debug, Clone, Default)]
pub struct ModeFlag {
    direct: Arc<AtomicBool>,
}

impl ModeFlag {
    pub fn new(mode: CacheMode) -> Self {
        Self {
            direct: Arc::new(AtomicBool::new(mode == CacheMode::Direct)),
        }
    }

    pub fn set_mode(&self, mode: CacheMode) {
        self.direct.store(mode == CacheMode::Direct, Ordering::Release);
    }
}

impl ModeSource for ModeFlag {
    fn mode(&self) -> CacheMode {
        if self.direct.load(Ordering::Acquire) {
            CacheMode::Direct
        } else {
            CacheMode::Cached
        }
    }
}
