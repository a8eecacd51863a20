// SPDX-License-Identifier: MPL-2.0-only

//! Panel and widget definitions

use serde::{Deserialize, Serialize};
use shell_host::{PanelAlignment, PanelEdge, Property};

use crate::SpecError;

/// A widget placed on a panel
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WidgetSpec {
    /// plugin implementing the widget, eg. `org.kde.plasma.kickoff`
    pub plugin_id: String,
    /// applications pinned to a launcher or task list widget, in order.
    ///
    /// Which plugins take launchers is up to the shell; pinning onto any other widget
    /// is refused there and stops the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pinned_entries: Vec<String>,
}

impl WidgetSpec {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            pinned_entries: Vec::new(),
        }
    }

    pub fn with_pinned<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pinned_entries
            .extend(entries.into_iter().map(Into::into));
        self
    }
}

/// Config structure for a single panel
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PanelSpec {
    /// edge which the panel is docked to
    pub edge: PanelEdge,
    /// thickness in pixels, or None for the shell's default
    #[serde(default)]
    pub height: Option<u32>,
    /// detached dock style instead of flush with the edge
    #[serde(default)]
    pub floating: bool,
    /// placement of the widgets along the edge
    #[serde(default)]
    pub alignment: PanelAlignment,
    /// lock the panel against editing
    #[serde(default)]
    pub immutable: bool,
    /// widgets from left to right, or top to bottom
    #[serde(default)]
    pub widgets: Vec<WidgetSpec>,
}

impl PanelSpec {
    pub fn new(edge: PanelEdge) -> Self {
        Self {
            edge,
            height: None,
            floating: false,
            alignment: PanelAlignment::Start,
            immutable: false,
            widgets: Vec::new(),
        }
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn floating(mut self, floating: bool) -> Self {
        self.floating = floating;
        self
    }

    pub fn alignment(mut self, alignment: PanelAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    pub fn widget(mut self, widget: WidgetSpec) -> Self {
        self.widgets.push(widget);
        self
    }

    pub fn widgets<I, S>(mut self, plugin_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.widgets
            .extend(plugin_ids.into_iter().map(WidgetSpec::new));
        self
    }

    /// property writes which configure the panel, in the order they are applied
    pub fn properties(&self) -> Vec<Property> {
        let mut properties = Vec::with_capacity(4);
        if let Some(height) = self.height {
            properties.push(Property::Height(height));
        }
        properties.push(Property::Floating(self.floating));
        properties.push(Property::Alignment(self.alignment));
        properties.push(Property::Immutable(self.immutable));
        properties
    }

    pub(crate) fn validate(&self, panel: usize) -> Result<(), SpecError> {
        if self.height == Some(0) {
            return Err(SpecError::ZeroHeight { panel });
        }
        for (widget, w) in self.widgets.iter().enumerate() {
            if w.plugin_id.trim().is_empty() {
                return Err(SpecError::EmptyPluginId { panel, widget });
            }
            if w.pinned_entries.iter().any(|e| e.trim().is_empty()) {
                return Err(SpecError::EmptyPinnedEntry {
                    plugin_id: w.plugin_id.clone(),
                });
            }
        }
        Ok(())
    }
}
