use serde::Deserialize;

use crate::clock::DEFAULT_CLOCK_SECONDS;
use crate::layout::Layout;

/// Session settings. Every field may be omitted by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub clock_seconds: u32,
    pub clock_enforced: bool,
    pub layout: Layout,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            clock_seconds: DEFAULT_CLOCK_SECONDS,
            clock_enforced: true,
            layout: Layout::default(),
        }
    }
}
