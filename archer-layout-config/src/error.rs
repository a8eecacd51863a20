// SPDX-License-Identifier: MPL-2.0-only

use thiserror::Error;

/// A layout definition that can't describe a valid desktop
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("widget {widget} of panel {panel} has an empty plugin id")]
    EmptyPluginId { panel: usize, widget: usize },
    #[error("widget {plugin_id:?} has an empty pinned entry")]
    EmptyPinnedEntry { plugin_id: String },
    #[error("panel {panel} has a height of zero")]
    ZeroHeight { panel: usize },
    #[error("desktop {desktop} has an empty wallpaper plugin")]
    EmptyWallpaperPlugin { desktop: usize },
    #[error("more than one desktop is defined for screen {screen}")]
    DuplicateScreen { screen: u32 },
}
