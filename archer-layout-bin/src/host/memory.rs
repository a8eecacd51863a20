// SPDX-License-Identifier: MPL-2.0-only

//! A shell that lives entirely in memory, used for dry runs

use std::collections::{HashMap, HashSet};

use shell_host::{
    ContainmentHandle, ContainmentState, DesktopKind, HostError, HostShell, PanelEdge, Property,
    WidgetHandle, WidgetState,
};
use tracing::trace;

/// Containments of a [`MemoryShell`] without their handles, comparable across rebuilds
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShellState {
    pub desktops: Vec<ContainmentState>,
    pub panels: Vec<ContainmentState>,
}

#[derive(Debug, Default)]
pub struct MemoryShell {
    next_id: u32,
    desktops: Vec<(ContainmentHandle, ContainmentState)>,
    panels: Vec<(ContainmentHandle, ContainmentState)>,
    widgets: HashMap<WidgetHandle, (ContainmentHandle, usize)>,
    known_plugins: Option<HashSet<String>>,
    unpinnable_plugins: HashSet<String>,
    locked: HashSet<ContainmentHandle>,
    failing_properties: HashSet<&'static str>,
    refused_edges: HashSet<PanelEdge>,
    mutations: usize,
}

impl MemoryShell {
    /// a shell without containments that accepts any widget plugin
    pub fn new() -> Self {
        Self::default()
    }

    /// a shell that only knows the given widget plugins
    pub fn with_plugins<I, S>(plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_plugins: Some(plugins.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// make removals of `handle` fail
    pub fn refuse_removal(&mut self, handle: ContainmentHandle) {
        self.locked.insert(handle);
    }

    /// make every write of the named property fail
    pub fn fail_property(&mut self, name: &'static str) {
        self.failing_properties.insert(name);
    }

    /// make creating panels on `edge` fail
    pub fn refuse_panels(&mut self, edge: PanelEdge) {
        self.refused_edges.insert(edge);
    }

    /// make pinning entries on widgets of `plugin_id` fail
    pub fn refuse_pins(&mut self, plugin_id: &str) {
        self.unpinnable_plugins.insert(plugin_id.to_string());
    }

    /// add a desktop as if it existed before, without counting it as a mutation
    pub fn seed_desktop(&mut self, kind: DesktopKind, screen: u32) -> ContainmentHandle {
        let handle = self.next_handle();
        self.desktops.push((
            handle,
            ContainmentState::Desktop {
                kind,
                screen,
                properties: Vec::new(),
            },
        ));
        handle
    }

    /// add a panel as if it existed before, without counting it as a mutation
    pub fn seed_panel<I, S>(&mut self, edge: PanelEdge, plugin_ids: I) -> ContainmentHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handle = self.next_handle();
        let widgets = plugin_ids
            .into_iter()
            .map(|id| WidgetState {
                plugin_id: id.into(),
                pinned_entries: Vec::new(),
            })
            .collect::<Vec<_>>();
        for index in 0..widgets.len() {
            let widget = WidgetHandle(self.next_id);
            self.next_id += 1;
            self.widgets.insert(widget, (handle, index));
        }
        self.panels.push((
            handle,
            ContainmentState::Panel {
                edge,
                properties: Vec::new(),
                widgets,
            },
        ));
        handle
    }

    pub fn state(&self) -> ShellState {
        ShellState {
            desktops: self.desktops.iter().map(|(_, s)| s.clone()).collect(),
            panels: self.panels.iter().map(|(_, s)| s.clone()).collect(),
        }
    }

    /// number of mutating calls that succeeded
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    fn next_handle(&mut self) -> ContainmentHandle {
        let handle = ContainmentHandle(self.next_id);
        self.next_id += 1;
        handle
    }

    fn containment_mut(&mut self, handle: ContainmentHandle) -> Option<&mut ContainmentState> {
        self.desktops
            .iter_mut()
            .chain(self.panels.iter_mut())
            .find(|(h, _)| *h == handle)
            .map(|(_, s)| s)
    }

    fn widget_mut(&mut self, widget: WidgetHandle) -> Result<&mut WidgetState, HostError> {
        let (handle, index) = *self
            .widgets
            .get(&widget)
            .ok_or(HostError::NoSuchWidget(widget))?;
        match self.containment_mut(handle) {
            Some(ContainmentState::Panel { widgets, .. }) => widgets
                .get_mut(index)
                .ok_or(HostError::NoSuchWidget(widget)),
            _ => Err(HostError::NoSuchWidget(widget)),
        }
    }
}

impl HostShell for MemoryShell {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_desktops(&mut self) -> Result<Vec<ContainmentHandle>, HostError> {
        Ok(self.desktops.iter().map(|(h, _)| *h).collect())
    }

    fn list_panels(&mut self) -> Result<Vec<ContainmentHandle>, HostError> {
        Ok(self.panels.iter().map(|(h, _)| *h).collect())
    }

    fn remove_containment(&mut self, handle: ContainmentHandle) -> Result<(), HostError> {
        if self.locked.contains(&handle) {
            return Err(HostError::Rejected(format!("{} is locked", handle)));
        }
        let before = self.desktops.len() + self.panels.len();
        self.desktops.retain(|(h, _)| *h != handle);
        self.panels.retain(|(h, _)| *h != handle);
        if self.desktops.len() + self.panels.len() == before {
            return Err(HostError::NoSuchContainment(handle));
        }
        self.widgets.retain(|_, (h, _)| *h != handle);
        self.mutations += 1;
        trace!("removed {}", handle);
        Ok(())
    }

    fn create_desktop(
        &mut self,
        kind: DesktopKind,
        screen: u32,
    ) -> Result<ContainmentHandle, HostError> {
        self.mutations += 1;
        let existing = self.desktops.iter_mut().find(|(_, s)| {
            matches!(s, ContainmentState::Desktop { screen: s, .. } if *s == screen)
        });
        if let Some((handle, ContainmentState::Desktop { kind: k, .. })) = existing {
            *k = kind;
            return Ok(*handle);
        }
        let handle = self.next_handle();
        self.desktops.push((
            handle,
            ContainmentState::Desktop {
                kind,
                screen,
                properties: Vec::new(),
            },
        ));
        Ok(handle)
    }

    fn create_panel(&mut self, edge: PanelEdge) -> Result<ContainmentHandle, HostError> {
        if self.refused_edges.contains(&edge) {
            return Err(HostError::Rejected(format!("no room for a panel on the {} edge", edge)));
        }
        let handle = self.next_handle();
        self.panels.push((
            handle,
            ContainmentState::Panel {
                edge,
                properties: Vec::new(),
                widgets: Vec::new(),
            },
        ));
        self.mutations += 1;
        Ok(handle)
    }

    fn set_property(
        &mut self,
        handle: ContainmentHandle,
        property: &Property,
    ) -> Result<(), HostError> {
        if self.failing_properties.contains(property.name()) {
            return Err(HostError::Rejected(format!(
                "{} is read-only",
                property.name()
            )));
        }
        let properties = match self.containment_mut(handle) {
            Some(ContainmentState::Desktop { properties, .. })
            | Some(ContainmentState::Panel { properties, .. }) => properties,
            None => return Err(HostError::NoSuchContainment(handle)),
        };
        match properties.iter_mut().find(|p| p.name() == property.name()) {
            Some(existing) => *existing = property.clone(),
            None => properties.push(property.clone()),
        }
        self.mutations += 1;
        Ok(())
    }

    fn add_widget(
        &mut self,
        handle: ContainmentHandle,
        plugin_id: &str,
    ) -> Result<WidgetHandle, HostError> {
        if let Some(known) = &self.known_plugins {
            if !known.contains(plugin_id) {
                return Err(HostError::UnknownPlugin(plugin_id.to_string()));
            }
        }
        let index = match self.containment_mut(handle) {
            Some(ContainmentState::Panel { widgets, .. }) => {
                widgets.push(WidgetState {
                    plugin_id: plugin_id.to_string(),
                    pinned_entries: Vec::new(),
                });
                widgets.len() - 1
            }
            Some(ContainmentState::Desktop { .. }) => {
                return Err(HostError::Rejected(format!(
                    "{} is a desktop, widgets go on panels",
                    handle
                )))
            }
            None => return Err(HostError::NoSuchContainment(handle)),
        };
        let widget = WidgetHandle(self.next_id);
        self.next_id += 1;
        self.widgets.insert(widget, (handle, index));
        self.mutations += 1;
        Ok(widget)
    }

    fn pin_entry(&mut self, widget: WidgetHandle, application_id: &str) -> Result<(), HostError> {
        let plugin_id = self.widget_mut(widget)?.plugin_id.clone();
        if self.unpinnable_plugins.contains(&plugin_id) {
            return Err(HostError::Rejected(format!("{} has no launchers", plugin_id)));
        }
        self.widget_mut(widget)?
            .pinned_entries
            .push(application_id.to_string());
        self.mutations += 1;
        Ok(())
    }

    fn describe(
        &mut self,
        handle: ContainmentHandle,
    ) -> Result<Option<ContainmentState>, HostError> {
        match self.containment_mut(handle) {
            Some(state) => Ok(Some(state.clone())),
            None => Err(HostError::NoSuchContainment(handle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widgets_keep_insertion_order() {
        let mut shell = MemoryShell::new();
        let panel = shell.create_panel(PanelEdge::Top).unwrap();
        shell.add_widget(panel, "a").unwrap();
        let b = shell.add_widget(panel, "b").unwrap();
        shell.add_widget(panel, "c").unwrap();
        shell.pin_entry(b, "browser").unwrap();
        shell.pin_entry(b, "terminal").unwrap();

        let state = shell.state();
        let ContainmentState::Panel { widgets, .. } = &state.panels[0] else {
            panic!("expected a panel");
        };
        let ids: Vec<&str> = widgets.iter().map(|w| w.plugin_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(widgets[1].pinned_entries, ["browser", "terminal"]);
        assert_eq!(shell.mutations(), 6);
    }

    #[test]
    fn unknown_plugins_are_refused() {
        let mut shell = MemoryShell::with_plugins(["clock"]);
        let panel = shell.create_panel(PanelEdge::Bottom).unwrap();
        assert!(shell.add_widget(panel, "clock").is_ok());
        assert!(matches!(
            shell.add_widget(panel, "weather"),
            Err(HostError::UnknownPlugin(id)) if id == "weather"
        ));
    }

    #[test]
    fn property_writes_replace_earlier_values() {
        let mut shell = MemoryShell::new();
        let panel = shell.create_panel(PanelEdge::Left).unwrap();
        shell.set_property(panel, &Property::Height(30)).unwrap();
        shell.set_property(panel, &Property::Floating(true)).unwrap();
        shell.set_property(panel, &Property::Height(40)).unwrap();
        let Some(ContainmentState::Panel { properties, .. }) = shell.describe(panel).unwrap() else {
            panic!("expected a panel");
        };
        assert_eq!(properties, [Property::Height(40), Property::Floating(true)]);
    }

    #[test]
    fn removing_drops_widgets() {
        let mut shell = MemoryShell::new();
        let panel = shell.seed_panel(PanelEdge::Top, ["a"]);
        shell.remove_containment(panel).unwrap();
        assert!(shell.state().panels.is_empty());
        assert!(shell.widgets.is_empty());
        assert!(matches!(
            shell.remove_containment(panel),
            Err(HostError::NoSuchContainment(_))
        ));
    }

    #[test]
    fn desktops_are_reused_per_screen() {
        let mut shell = MemoryShell::new();
        let seeded = shell.seed_desktop(DesktopKind::Plain, 0);
        let reused = shell.create_desktop(DesktopKind::FolderView, 0).unwrap();
        assert_eq!(seeded, reused);
        let other = shell.create_desktop(DesktopKind::Plain, 1).unwrap();
        assert_ne!(other, seeded);
        assert_eq!(shell.state().desktops.len(), 2);
        assert!(matches!(
            shell.state().desktops[0],
            ContainmentState::Desktop { kind: DesktopKind::FolderView, .. }
        ));
    }

    #[test]
    fn refused_edges_create_nothing() {
        let mut shell = MemoryShell::new();
        shell.refuse_panels(PanelEdge::Left);
        assert!(matches!(
            shell.create_panel(PanelEdge::Left),
            Err(HostError::Rejected(_))
        ));
        assert!(shell.create_panel(PanelEdge::Right).is_ok());
        assert_eq!(shell.state().panels.len(), 1);
        assert_eq!(shell.mutations(), 1);
    }

    #[test]
    fn widgets_are_not_placed_on_desktops() {
        let mut shell = MemoryShell::new();
        let desktop = shell.create_desktop(DesktopKind::Plain, 0).unwrap();
        assert!(matches!(
            shell.add_widget(desktop, "clock"),
            Err(HostError::Rejected(_))
        ));
    }
}
