// SPDX-License-Identifier: MPL-2.0-only

//! Layout definitions for archer-layout

mod error;
mod layout_config;
mod panel_config;
mod templates;

pub use error::*;
pub use layout_config::*;
pub use panel_config::*;
pub use templates::*;

pub use shell_host::{DesktopKind, PanelAlignment, PanelEdge};
