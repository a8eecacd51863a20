// SPDX-License-Identifier: MPL-2.0

//! Vocabulary shared between layout definitions and the shells they are applied to.

use std::{fmt, marker::PhantomData, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Screen edge a panel docks to.
///
/// Layout files name it as a string (`"top"`) or with Plasma's numeric location code (`3`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PanelEdge {
    /// docked to the top edge
    Top,
    /// docked to the bottom edge
    Bottom,
    /// docked to the left edge
    Left,
    /// docked to the right edge
    Right,
}

impl PanelEdge {
    pub const ALL: [PanelEdge; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    /// location name understood by the Plasma scripting api
    pub fn location(&self) -> &'static str {
        match self {
            PanelEdge::Top => "top",
            PanelEdge::Bottom => "bottom",
            PanelEdge::Left => "left",
            PanelEdge::Right => "right",
        }
    }

    /// numeric location code used by older layout scripts
    pub fn location_code(&self) -> u32 {
        match self {
            PanelEdge::Top => 3,
            PanelEdge::Bottom => 4,
            PanelEdge::Left => 5,
            PanelEdge::Right => 6,
        }
    }

    pub fn from_location_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|edge| edge.location_code() == code)
    }
}

impl fmt::Display for PanelEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelEdge::Top => write!(f, "Top"),
            PanelEdge::Bottom => write!(f, "Bottom"),
            PanelEdge::Left => write!(f, "Left"),
            PanelEdge::Right => write!(f, "Right"),
        }
    }
}

impl FromStr for PanelEdge {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(edge) = Self::ALL
            .into_iter()
            .find(|edge| edge.location().eq_ignore_ascii_case(s))
        {
            return Ok(edge);
        }
        s.parse()
            .ok()
            .and_then(Self::from_location_code)
            .ok_or_else(|| ParseError::new("PanelEdge", s))
    }
}

impl Serialize for PanelEdge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.location())
    }
}

impl<'de> Deserialize<'de> for PanelEdge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NameOrCode::new("a panel location such as \"top\" or 3..=6"))
    }
}

/// Placement of the panel contents along its edge.
///
/// Layout files name it as a string (`"center"`) or with the Qt alignment flags Plasma
/// stores in its config (`1`, `4`, `132`, `2`).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PanelAlignment {
    /// left or top
    #[default]
    Start,
    /// centered
    Center,
    /// right or bottom
    End,
}

impl PanelAlignment {
    /// alignment name understood by the Plasma scripting api
    pub fn plasma_name(&self) -> &'static str {
        match self {
            PanelAlignment::Start => "left",
            PanelAlignment::Center => "center",
            PanelAlignment::End => "right",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PanelAlignment::Start => "start",
            PanelAlignment::Center => "center",
            PanelAlignment::End => "end",
        }
    }
}

impl fmt::Display for PanelAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelAlignment::Start => write!(f, "Start"),
            PanelAlignment::Center => write!(f, "Center"),
            PanelAlignment::End => write!(f, "End"),
        }
    }
}

impl FromStr for PanelAlignment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "left" | "1" => Ok(Self::Start),
            // AlignHCenter, alone or with AlignVCenter
            "center" | "4" | "132" => Ok(Self::Center),
            "end" | "right" | "2" => Ok(Self::End),
            _ => Err(ParseError::new("PanelAlignment", s.trim())),
        }
    }
}

impl Serialize for PanelAlignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PanelAlignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NameOrCode::new("a panel alignment such as \"center\""))
    }
}

/// Visits either a name or a numeric code and hands both to `FromStr`
struct NameOrCode<T> {
    expecting: &'static str,
    marker: PhantomData<T>,
}

impl<T> NameOrCode<T> {
    fn new(expecting: &'static str) -> Self {
        Self {
            expecting,
            marker: PhantomData,
        }
    }
}

impl<'de, T: FromStr<Err = ParseError>> de::Visitor<'de> for NameOrCode<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
        }
    }
}

/// Desktop containment variant
#[derive(Debug, Default, Deserialize, Serialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DesktopKind {
    /// plain desktop without icons
    #[default]
    Plain,
    /// desktop showing the contents of a folder
    FolderView,
}

impl DesktopKind {
    /// containment plugin implementing this kind of desktop
    pub fn plugin_id(&self) -> &'static str {
        match self {
            DesktopKind::Plain => "org.kde.desktopcontainment",
            DesktopKind::FolderView => "org.kde.plasma.folder",
        }
    }
}

impl fmt::Display for DesktopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesktopKind::Plain => write!(f, "Plain"),
            DesktopKind::FolderView => write!(f, "FolderView"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Not a valid {kind}: {value:?}")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A typed containment property write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// wallpaper plugin of a desktop
    WallpaperPlugin(String),
    /// whether the containment is locked against editing
    Immutable(bool),
    /// panel thickness in pixels
    Height(u32),
    /// detached dock style instead of flush with the edge
    Floating(bool),
    /// placement of the panel contents
    Alignment(PanelAlignment),
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::WallpaperPlugin(_) => "wallpaperPlugin",
            Property::Immutable(_) => "immutable",
            Property::Height(_) => "height",
            Property::Floating(_) => "floating",
            Property::Alignment(_) => "alignment",
        }
    }
}

/// Opaque reference to a desktop or panel owned by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainmentHandle(pub u32);

impl fmt::Display for ContainmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "containment #{}", self.0)
    }
}

/// Opaque reference to a widget owned by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetHandle(pub u32);

impl fmt::Display for WidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget #{}", self.0)
    }
}

/// Widget as reported by a shell that supports introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetState {
    pub plugin_id: String,
    pub pinned_entries: Vec<String>,
}

/// Containment as reported by a shell that supports introspection.
///
/// A shell may report properties the layout never sets, in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainmentState {
    Desktop {
        kind: DesktopKind,
        screen: u32,
        properties: Vec<Property>,
    },
    Panel {
        edge: PanelEdge,
        properties: Vec<Property>,
        widgets: Vec<WidgetState>,
    },
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown widget plugin {0:?}")]
    UnknownPlugin(String),
    #[error("no such {0}")]
    NoSuchContainment(ContainmentHandle),
    #[error("no such {0}")]
    NoSuchWidget(WidgetHandle),
    #[error("shell rejected the operation: {0}")]
    Rejected(String),
    #[error("shell connection failed: {0}")]
    Transport(String),
}

/// The scripting surface of a desktop shell.
///
/// Calls are synchronous and must be issued by a single writer; the shell's
/// containment list is shared mutable state.
pub trait HostShell {
    /// human readable name of the backend
    fn name(&self) -> &str;

    fn list_desktops(&mut self) -> Result<Vec<ContainmentHandle>, HostError>;

    fn list_panels(&mut self) -> Result<Vec<ContainmentHandle>, HostError>;

    fn remove_containment(&mut self, handle: ContainmentHandle) -> Result<(), HostError>;

    /// create the desktop containment for `screen`, reusing the one the shell keeps there if any
    fn create_desktop(
        &mut self,
        kind: DesktopKind,
        screen: u32,
    ) -> Result<ContainmentHandle, HostError>;

    fn create_panel(&mut self, edge: PanelEdge) -> Result<ContainmentHandle, HostError>;

    fn set_property(
        &mut self,
        handle: ContainmentHandle,
        property: &Property,
    ) -> Result<(), HostError>;

    /// append a widget after the existing widgets of the containment
    fn add_widget(
        &mut self,
        handle: ContainmentHandle,
        plugin_id: &str,
    ) -> Result<WidgetHandle, HostError>;

    /// append an application to the launchers pinned on a widget
    fn pin_entry(&mut self, widget: WidgetHandle, application_id: &str) -> Result<(), HostError>;

    /// report the full state of a containment, or `None` if the shell can't introspect it
    fn describe(
        &mut self,
        _handle: ContainmentHandle,
    ) -> Result<Option<ContainmentState>, HostError> {
        Ok(None)
    }
}
