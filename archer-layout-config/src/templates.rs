// SPDX-License-Identifier: MPL-2.0-only

//! Built-in layouts

use std::{fmt::Display, str::FromStr};

use shell_host::{DesktopKind, PanelAlignment, PanelEdge};

use crate::{DesktopSpec, LayoutSpec, PanelSpec, WidgetSpec};

pub const KICKOFF: &str = "org.kde.plasma.kickoff";
pub const GLOBAL_MENU: &str = "org.kde.plasma.globalmenu";
pub const ICON_TASKS: &str = "org.kde.plasma.icontasks";
pub const PAGER: &str = "org.kde.plasma.pager";
pub const MARGINS_SEPARATOR: &str = "org.kde.plasma.marginsseparator";
pub const SYSTEM_TRAY: &str = "org.kde.plasma.systemtray";
pub const DIGITAL_CLOCK: &str = "org.kde.plasma.digitalclock";
pub const SHOW_DESKTOP: &str = "org.kde.plasma.showdesktop";

/// A layout compiled into the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTemplate {
    /// macOS-like: menu bar on top, centered dock at the bottom
    Cupertini,
    /// Windows-like: a single floating taskbar
    Redmondi,
    /// the Plasma default: one bottom panel and a folder view desktop
    Vanilla,
}

impl LayoutTemplate {
    pub const ALL: [LayoutTemplate; 3] = [Self::Cupertini, Self::Redmondi, Self::Vanilla];

    pub fn description(&self) -> &'static str {
        match self {
            Self::Cupertini => "menu bar on top, centered dock at the bottom",
            Self::Redmondi => "single floating taskbar at the bottom",
            Self::Vanilla => "default bottom panel with a folder view desktop",
        }
    }

    pub fn spec(&self) -> LayoutSpec {
        match self {
            Self::Cupertini => LayoutSpec {
                desktops: vec![DesktopSpec::new(DesktopKind::Plain)],
                panels: vec![
                    PanelSpec::new(PanelEdge::Top).height(36).widgets([
                        KICKOFF,
                        GLOBAL_MENU,
                        SYSTEM_TRAY,
                        DIGITAL_CLOCK,
                    ]),
                    PanelSpec::new(PanelEdge::Bottom)
                        .height(56)
                        .floating(true)
                        .alignment(PanelAlignment::Center)
                        .widget(
                            WidgetSpec::new(ICON_TASKS)
                                .with_pinned(["org.kde.firefox.desktop", "org.kde.konsole.desktop"]),
                        ),
                ],
            },
            Self::Redmondi => LayoutSpec {
                desktops: vec![DesktopSpec::new(DesktopKind::Plain)],
                panels: vec![PanelSpec::new(PanelEdge::Bottom)
                    .height(44)
                    .floating(true)
                    .widgets([KICKOFF, ICON_TASKS, SYSTEM_TRAY, DIGITAL_CLOCK])],
            },
            Self::Vanilla => LayoutSpec {
                desktops: vec![DesktopSpec::new(DesktopKind::FolderView)],
                panels: vec![PanelSpec::new(PanelEdge::Bottom).widgets([
                    KICKOFF,
                    PAGER,
                    ICON_TASKS,
                    MARGINS_SEPARATOR,
                    SYSTEM_TRAY,
                    DIGITAL_CLOCK,
                    SHOW_DESKTOP,
                ])],
            },
        }
    }
}

impl Display for LayoutTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutTemplate::Cupertini => write!(f, "cupertini"),
            LayoutTemplate::Redmondi => write!(f, "redmondi"),
            LayoutTemplate::Vanilla => write!(f, "vanilla"),
        }
    }
}

impl FromStr for LayoutTemplate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cupertini" | "macos" => Ok(Self::Cupertini),
            "redmondi" | "windows" => Ok(Self::Redmondi),
            "vanilla" | "default" => Ok(Self::Vanilla),
            _ => Err(anyhow::anyhow!("Not a valid LayoutTemplate")),
        }
    }
}
