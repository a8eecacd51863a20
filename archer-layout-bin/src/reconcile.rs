// SPDX-License-Identifier: MPL-2.0-only

//! Reconciles a shell's containments with a layout definition.
//!
//! The shell is rebuilt from scratch: every existing desktop and panel is removed, then
//! the layout's containments are created in order. Shells rarely expose enough about
//! their widgets to diff them reliably. When the shell can describe its containments and
//! they already match the layout, nothing is touched.

use std::fmt;

use archer_layout_config::{DesktopSpec, LayoutSpec, PanelSpec, SpecError};
use shell_host::{
    ContainmentHandle, ContainmentState, DesktopKind, HostError, HostShell, PanelEdge, Property,
    WidgetHandle, WidgetState,
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("invalid layout: {0}")]
    InvalidSpec(#[from] SpecError),
    #[error("failed to read the current layout: {0}")]
    Snapshot(#[source] HostError),
    #[error("failed to remove {handle}: {source}")]
    ContainmentRemovalFailed {
        handle: ContainmentHandle,
        source: HostError,
    },
    #[error("failed to create {what}: {source}")]
    ContainmentCreationFailed { what: String, source: HostError },
    #[error("failed to add widget {plugin_id:?} to panel {panel}: {source}")]
    WidgetCreationFailed {
        plugin_id: String,
        panel: usize,
        source: HostError,
    },
    #[error("failed to pin {entry:?} to widget {plugin_id:?}: {source}")]
    EntryPinFailed {
        plugin_id: String,
        entry: String,
        source: HostError,
    },
}

/// A property write the shell refused. The layout is still usable without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySetFailed {
    pub handle: ContainmentHandle,
    pub property: &'static str,
    pub reason: String,
}

impl fmt::Display for PropertySetFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not set {} on {}: {}", self.property, self.handle, self.reason)
    }
}

/// A mutation issued to the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Removed(ContainmentHandle),
    CreatedDesktop {
        handle: ContainmentHandle,
        kind: DesktopKind,
        screen: u32,
    },
    CreatedPanel {
        handle: ContainmentHandle,
        edge: PanelEdge,
    },
    PropertySet {
        handle: ContainmentHandle,
        property: Property,
    },
    WidgetAdded {
        panel: ContainmentHandle,
        widget: WidgetHandle,
        plugin_id: String,
    },
    EntryPinned {
        widget: WidgetHandle,
        application_id: String,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Removed(handle) => write!(f, "remove {}", handle),
            Operation::CreatedDesktop {
                handle,
                kind,
                screen,
            } => write!(f, "create {} desktop {} on screen {}", kind, handle, screen),
            Operation::CreatedPanel { handle, edge } => {
                write!(f, "create {} panel {}", edge, handle)
            }
            Operation::PropertySet { handle, property } => {
                write!(f, "set {:?} on {}", property, handle)
            }
            Operation::WidgetAdded {
                panel,
                widget,
                plugin_id,
            } => write!(f, "add {} {} to {}", plugin_id, widget, panel),
            Operation::EntryPinned {
                widget,
                application_id,
            } => write!(f, "pin {} to {}", application_id, widget),
        }
    }
}

/// Everything a run did, in execution order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub operations: Vec<Operation>,
    pub warnings: Vec<PropertySetFailed>,
    /// the shell already matched the layout
    pub converged: bool,
}

impl ReconciliationReport {
    pub fn removed(&self) -> impl Iterator<Item = ContainmentHandle> + '_ {
        self.operations.iter().filter_map(|op| match op {
            Operation::Removed(handle) => Some(*handle),
            _ => None,
        })
    }

    pub fn created(&self) -> impl Iterator<Item = ContainmentHandle> + '_ {
        self.operations.iter().filter_map(|op| match op {
            Operation::CreatedDesktop { handle, .. } | Operation::CreatedPanel { handle, .. } => {
                Some(*handle)
            }
            _ => None,
        })
    }

    pub fn widgets_added(&self) -> impl Iterator<Item = &str> + '_ {
        self.operations.iter().filter_map(|op| match op {
            Operation::WidgetAdded { plugin_id, .. } => Some(plugin_id.as_str()),
            _ => None,
        })
    }

    pub fn is_noop(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.converged {
            return write!(f, "layout already applied, nothing to do");
        }
        let pinned = self
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::EntryPinned { .. }))
            .count();
        write!(
            f,
            "removed {} containments, created {}, added {} widgets, pinned {} entries",
            self.removed().count(),
            self.created().count(),
            self.widgets_added().count(),
            pinned
        )?;
        if !self.warnings.is_empty() {
            write!(f, " ({} warnings)", self.warnings.len())?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

/// Drives one shell towards layout definitions.
///
/// Runs are strictly sequential; nothing else may mutate the shell while one is in
/// progress.
pub struct Reconciler<'a, H: HostShell + ?Sized> {
    host: &'a mut H,
    phase: Phase,
    report: ReconciliationReport,
}

impl<'a, H: HostShell + ?Sized> Reconciler<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        Self {
            host,
            phase: Phase::NotStarted,
            report: ReconciliationReport::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// operations of the latest run, including the ones done before a failure
    pub fn report(&self) -> &ReconciliationReport {
        &self.report
    }

    pub fn apply(&mut self, spec: &LayoutSpec) -> Result<ReconciliationReport, ReconciliationError> {
        self.phase = Phase::InProgress;
        self.report = ReconciliationReport::default();
        match self.run(spec) {
            Ok(()) => {
                self.phase = Phase::Completed;
                info!(shell = self.host.name(), "{}", self.report);
                Ok(self.report.clone())
            }
            Err(err) => {
                self.phase = Phase::Failed;
                warn!(
                    shell = self.host.name(),
                    operations = self.report.operations.len(),
                    "reconciliation stopped: {}",
                    err
                );
                Err(err)
            }
        }
    }

    fn run(&mut self, spec: &LayoutSpec) -> Result<(), ReconciliationError> {
        spec.validate()?;

        let desktops = self
            .host
            .list_desktops()
            .map_err(ReconciliationError::Snapshot)?;
        let panels = self
            .host
            .list_panels()
            .map_err(ReconciliationError::Snapshot)?;
        debug!(desktops = desktops.len(), panels = panels.len(), "snapshot");

        if self.matches(spec, &desktops, &panels)? {
            self.report.converged = true;
            return Ok(());
        }

        for handle in desktops.into_iter().chain(panels) {
            self.host
                .remove_containment(handle)
                .map_err(|source| ReconciliationError::ContainmentRemovalFailed { handle, source })?;
            self.report.operations.push(Operation::Removed(handle));
        }

        for desktop in &spec.desktops {
            self.build_desktop(desktop)?;
        }
        for (index, panel) in spec.panels.iter().enumerate() {
            self.build_panel(index, panel)?;
        }
        Ok(())
    }

    /// whether the shell reports exactly the containments the layout describes
    fn matches(
        &mut self,
        spec: &LayoutSpec,
        desktops: &[ContainmentHandle],
        panels: &[ContainmentHandle],
    ) -> Result<bool, ReconciliationError> {
        if desktops.len() != spec.desktops.len() || panels.len() != spec.panels.len() {
            return Ok(false);
        }
        let wanted = spec
            .desktops
            .iter()
            .map(desired_desktop)
            .chain(spec.panels.iter().map(desired_panel));
        for (handle, wanted) in desktops.iter().chain(panels).zip(wanted) {
            match self
                .host
                .describe(*handle)
                .map_err(ReconciliationError::Snapshot)?
            {
                Some(state) if satisfies(&state, &wanted) => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    fn build_desktop(&mut self, desktop: &DesktopSpec) -> Result<(), ReconciliationError> {
        let handle = self
            .host
            .create_desktop(desktop.kind, desktop.screen)
            .map_err(|source| ReconciliationError::ContainmentCreationFailed {
                what: format!("{} desktop on screen {}", desktop.kind, desktop.screen),
                source,
            })?;
        self.report.operations.push(Operation::CreatedDesktop {
            handle,
            kind: desktop.kind,
            screen: desktop.screen,
        });
        for property in desktop.properties() {
            self.set_property(handle, property);
        }
        Ok(())
    }

    fn build_panel(&mut self, index: usize, panel: &PanelSpec) -> Result<(), ReconciliationError> {
        let handle = self.host.create_panel(panel.edge).map_err(|source| {
            ReconciliationError::ContainmentCreationFailed {
                what: format!("{} panel {}", panel.edge, index),
                source,
            }
        })?;
        self.report
            .operations
            .push(Operation::CreatedPanel { handle, edge: panel.edge });
        for property in panel.properties() {
            self.set_property(handle, property);
        }

        for widget_spec in &panel.widgets {
            let widget = self
                .host
                .add_widget(handle, &widget_spec.plugin_id)
                .map_err(|source| ReconciliationError::WidgetCreationFailed {
                    plugin_id: widget_spec.plugin_id.clone(),
                    panel: index,
                    source,
                })?;
            self.report.operations.push(Operation::WidgetAdded {
                panel: handle,
                widget,
                plugin_id: widget_spec.plugin_id.clone(),
            });

            for entry in &widget_spec.pinned_entries {
                self.host
                    .pin_entry(widget, entry)
                    .map_err(|source| ReconciliationError::EntryPinFailed {
                        plugin_id: widget_spec.plugin_id.clone(),
                        entry: entry.clone(),
                        source,
                    })?;
                self.report.operations.push(Operation::EntryPinned {
                    widget,
                    application_id: entry.clone(),
                });
            }
        }
        Ok(())
    }

    fn set_property(&mut self, handle: ContainmentHandle, property: Property) {
        match self.host.set_property(handle, &property) {
            Ok(()) => self
                .report
                .operations
                .push(Operation::PropertySet { handle, property }),
            Err(err) => {
                warn!("Failed to set {} on {}: {}", property.name(), handle, err);
                self.report.warnings.push(PropertySetFailed {
                    handle,
                    property: property.name(),
                    reason: err.to_string(),
                });
            }
        }
    }
}

/// whether a described containment already is what `wanted` asks for
///
/// Properties the layout leaves unset may hold anything, widgets must match exactly.
fn satisfies(actual: &ContainmentState, wanted: &ContainmentState) -> bool {
    fn has_all(actual: &[Property], wanted: &[Property]) -> bool {
        wanted.iter().all(|p| actual.contains(p))
    }

    match (actual, wanted) {
        (
            ContainmentState::Desktop {
                kind,
                screen,
                properties,
            },
            ContainmentState::Desktop {
                kind: wanted_kind,
                screen: wanted_screen,
                properties: wanted_properties,
            },
        ) => kind == wanted_kind && screen == wanted_screen && has_all(properties, wanted_properties),
        (
            ContainmentState::Panel {
                edge,
                properties,
                widgets,
            },
            ContainmentState::Panel {
                edge: wanted_edge,
                properties: wanted_properties,
                widgets: wanted_widgets,
            },
        ) => edge == wanted_edge && widgets == wanted_widgets && has_all(properties, wanted_properties),
        _ => false,
    }
}

fn desired_desktop(desktop: &DesktopSpec) -> ContainmentState {
    ContainmentState::Desktop {
        kind: desktop.kind,
        screen: desktop.screen,
        properties: desktop.properties(),
    }
}

fn desired_panel(panel: &PanelSpec) -> ContainmentState {
    ContainmentState::Panel {
        edge: panel.edge,
        properties: panel.properties(),
        widgets: panel
            .widgets
            .iter()
            .map(|w| WidgetState {
                plugin_id: w.plugin_id.clone(),
                pinned_entries: w.pinned_entries.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryShell, ShellState};
    use archer_layout_config::{LayoutTemplate, WidgetSpec};
    use shell_host::PanelAlignment;

    fn apply(
        spec: &LayoutSpec,
        shell: &mut MemoryShell,
    ) -> Result<ReconciliationReport, ReconciliationError> {
        Reconciler::new(shell).apply(spec)
    }

    fn widget_ids(state: &ContainmentState) -> Vec<&str> {
        match state {
            ContainmentState::Panel { widgets, .. } => {
                widgets.iter().map(|w| w.plugin_id.as_str()).collect()
            }
            ContainmentState::Desktop { .. } => vec![],
        }
    }

    fn panel_widgets(state: &ContainmentState) -> &[WidgetState] {
        match state {
            ContainmentState::Panel { widgets, .. } => widgets,
            ContainmentState::Desktop { .. } => &[],
        }
    }

    fn panel_edge(state: &ContainmentState) -> Option<PanelEdge> {
        match state {
            ContainmentState::Panel { edge, .. } => Some(*edge),
            ContainmentState::Desktop { .. } => None,
        }
    }

    fn mac_like() -> LayoutSpec {
        LayoutSpec {
            desktops: vec![DesktopSpec::default()],
            panels: vec![
                PanelSpec::new(PanelEdge::Top).widgets(["launcher", "global-menu", "system-tray", "clock"]),
                PanelSpec::new(PanelEdge::Bottom)
                    .floating(true)
                    .alignment(PanelAlignment::Center)
                    .widget(WidgetSpec::new("task-list").with_pinned(["browser", "terminal"])),
            ],
        }
    }

    fn windows_like() -> LayoutSpec {
        LayoutSpec {
            desktops: vec![DesktopSpec::default()],
            panels: vec![PanelSpec::new(PanelEdge::Bottom)
                .floating(true)
                .widgets(["launcher", "task-list", "system-tray", "clock"])],
        }
    }

    fn vanilla() -> LayoutSpec {
        LayoutSpec {
            desktops: vec![DesktopSpec::new(DesktopKind::FolderView)],
            panels: vec![PanelSpec::new(PanelEdge::Bottom).widgets([
                "launcher",
                "pager",
                "task-list",
                "separator",
                "system-tray",
                "clock",
                "show-desktop",
            ])],
        }
    }

    fn cluttered_shell() -> MemoryShell {
        let mut shell = MemoryShell::new();
        shell.seed_desktop(DesktopKind::FolderView, 0);
        shell.seed_desktop(DesktopKind::Plain, 1);
        shell.seed_panel(PanelEdge::Left, ["old-launcher", "old-clock"]);
        shell.seed_panel(PanelEdge::Top, ["weather"]);
        shell.seed_panel(PanelEdge::Top, Vec::<String>::new());
        shell
    }

    #[test]
    fn scenario_mac_like() {
        let mut shell = cluttered_shell();
        let report = apply(&mac_like(), &mut shell).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.removed().count(), 5);

        let state = shell.state();
        assert_eq!(state.panels.len(), 2);
        assert_eq!(
            widget_ids(&state.panels[0]),
            ["launcher", "global-menu", "system-tray", "clock"]
        );
        let dock = panel_widgets(&state.panels[1]);
        assert_eq!(dock.len(), 1);
        assert_eq!(dock[0].pinned_entries, ["browser", "terminal"]);
        match &state.panels[1] {
            ContainmentState::Panel { properties, .. } => {
                assert!(properties.contains(&Property::Floating(true)));
                assert!(properties.contains(&Property::Alignment(PanelAlignment::Center)));
            }
            other => panic!("expected a panel, got {:?}", other),
        }
    }

    #[test]
    fn scenario_windows_like() {
        let mut shell = cluttered_shell();
        apply(&windows_like(), &mut shell).unwrap();
        let state = shell.state();
        assert_eq!(state.panels.len(), 1);
        assert_eq!(panel_edge(&state.panels[0]), Some(PanelEdge::Bottom));
        assert_eq!(
            widget_ids(&state.panels[0]),
            ["launcher", "task-list", "system-tray", "clock"]
        );
    }

    #[test]
    fn scenario_vanilla() {
        let mut shell = cluttered_shell();
        apply(&vanilla(), &mut shell).unwrap();
        let state = shell.state();
        assert!(matches!(
            state.desktops.as_slice(),
            [ContainmentState::Desktop { kind: DesktopKind::FolderView, .. }]
        ));
        assert_eq!(
            widget_ids(&state.panels[0]),
            ["launcher", "pager", "task-list", "separator", "system-tray", "clock", "show-desktop"]
        );
    }

    #[test]
    fn second_run_changes_nothing() {
        for spec in [mac_like(), windows_like(), vanilla(), LayoutTemplate::Cupertini.spec()] {
            let mut shell = cluttered_shell();
            apply(&spec, &mut shell).unwrap();
            let first: ShellState = shell.state();
            let mutations = shell.mutations();

            let report = apply(&spec, &mut shell).unwrap();
            assert!(report.converged);
            assert!(report.is_noop());
            assert_eq!(shell.mutations(), mutations);
            assert_eq!(shell.state(), first);
        }
    }

    #[test]
    fn rebuild_after_drift_converges_to_same_state() {
        let spec = mac_like();
        let mut shell = MemoryShell::new();
        apply(&spec, &mut shell).unwrap();
        let first = shell.state();

        shell.seed_panel(PanelEdge::Right, ["stray"]);
        let report = apply(&spec, &mut shell).unwrap();
        assert!(!report.converged);
        assert_eq!(report.removed().count(), 4);
        assert_eq!(shell.state(), first);
    }

    #[test]
    fn full_reset_leaves_only_the_layout() {
        let mut shell = cluttered_shell();
        let spec = mac_like();
        apply(&spec, &mut shell).unwrap();
        let state = shell.state();
        assert_eq!(state.desktops.len(), spec.desktops.len());
        assert_eq!(state.panels.len(), spec.panels.len());
        assert!(state
            .panels
            .iter()
            .flat_map(widget_ids)
            .all(|id| !id.starts_with("old-") && id != "weather"));
    }

    #[test]
    fn operations_are_ordered() {
        let mut shell = MemoryShell::new();
        shell.seed_panel(PanelEdge::Left, ["x"]);
        let report = apply(&mac_like(), &mut shell).unwrap();

        assert!(matches!(report.operations[0], Operation::Removed(_)));
        assert!(matches!(report.operations[1], Operation::CreatedDesktop { .. }));
        let added: Vec<&str> = report.widgets_added().collect();
        assert_eq!(added, ["launcher", "global-menu", "system-tray", "clock", "task-list"]);

        let pins: Vec<&str> = report
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::EntryPinned { application_id, .. } => Some(application_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(pins, ["browser", "terminal"]);
        assert!(matches!(
            report.operations.last(),
            Some(Operation::EntryPinned { application_id, .. }) if application_id == "terminal"
        ));
    }

    #[test]
    fn unknown_widget_stops_the_run() {
        let spec = LayoutSpec {
            desktops: vec![DesktopSpec::default()],
            panels: vec![
                PanelSpec::new(PanelEdge::Top).widgets(["launcher", "no-such-widget", "clock"]),
                PanelSpec::new(PanelEdge::Bottom).widgets(["task-list"]),
            ],
        };
        let mut shell = MemoryShell::with_plugins(["launcher", "clock", "task-list"]);
        let mut reconciler = Reconciler::new(&mut shell);
        let err = reconciler.apply(&spec).unwrap_err();
        assert!(matches!(
            &err,
            ReconciliationError::WidgetCreationFailed { plugin_id, panel: 0, .. } if plugin_id == "no-such-widget"
        ));
        assert_eq!(reconciler.phase(), Phase::Failed);
        assert_eq!(reconciler.report().widgets_added().collect::<Vec<_>>(), ["launcher"]);

        let state = shell.state();
        assert_eq!(state.desktops.len(), 1);
        assert_eq!(state.panels.len(), 1);
        assert_eq!(widget_ids(&state.panels[0]), ["launcher"]);
    }

    #[test]
    fn rejected_pin_stops_the_run() {
        let mut shell = MemoryShell::new();
        shell.refuse_pins("clock");
        let spec = LayoutSpec {
            desktops: vec![],
            panels: vec![PanelSpec::new(PanelEdge::Top)
                .widget(WidgetSpec::new("clock").with_pinned(["browser"]))
                .widgets(["tray"])],
        };
        let err = apply(&spec, &mut shell).unwrap_err();
        assert!(matches!(err, ReconciliationError::EntryPinFailed { .. }));
        assert_eq!(widget_ids(&shell.state().panels[0]), ["clock"]);
    }

    #[test]
    fn removal_failure_aborts_before_building() {
        let mut shell = MemoryShell::new();
        shell.seed_panel(PanelEdge::Top, ["a"]);
        let locked = shell.seed_panel(PanelEdge::Bottom, ["b"]);
        shell.refuse_removal(locked);

        let err = apply(&windows_like(), &mut shell).unwrap_err();
        assert!(matches!(
            err,
            ReconciliationError::ContainmentRemovalFailed { handle, .. } if handle == locked
        ));
        let state = shell.state();
        assert!(state.desktops.is_empty());
        assert_eq!(state.panels.len(), 1);
        assert_eq!(widget_ids(&state.panels[0]), ["b"]);
    }

    #[test]
    fn property_failures_are_warnings() {
        let mut shell = MemoryShell::new();
        shell.fail_property("floating");
        let report = apply(&windows_like(), &mut shell).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].property, "floating");
        assert_eq!(widget_ids(&shell.state().panels[0]).len(), 4);

        // the missing property keeps the shell from matching, so the next run rebuilds
        let report = apply(&windows_like(), &mut shell).unwrap();
        assert!(!report.converged);
    }

    #[test]
    fn invalid_layout_touches_nothing() {
        let mut shell = cluttered_shell();
        let before = shell.state();
        let spec = LayoutSpec {
            desktops: vec![],
            panels: vec![PanelSpec::new(PanelEdge::Top).widgets(["launcher", ""])],
        };
        let mut reconciler = Reconciler::new(&mut shell);
        assert!(matches!(
            reconciler.apply(&spec),
            Err(ReconciliationError::InvalidSpec(SpecError::EmptyPluginId { panel: 0, widget: 1 }))
        ));
        assert!(reconciler.report().is_noop());
        assert_eq!(shell.state(), before);
        assert_eq!(shell.mutations(), 0);
    }

    #[test]
    fn desktop_only_layout() {
        let mut shell = cluttered_shell();
        let spec = LayoutSpec {
            desktops: vec![DesktopSpec::default()],
            panels: vec![],
        };
        apply(&spec, &mut shell).unwrap();
        let state = shell.state();
        assert_eq!(state.desktops.len(), 1);
        assert!(state.panels.is_empty());
    }

    #[test]
    fn panels_may_share_an_edge() {
        let spec = LayoutSpec {
            desktops: vec![DesktopSpec::default()],
            panels: vec![
                PanelSpec::new(PanelEdge::Top).height(28).widgets(["global-menu", "clock"]),
                PanelSpec::new(PanelEdge::Top)
                    .alignment(PanelAlignment::Center)
                    .widgets(["task-list"]),
            ],
        };
        let mut shell = cluttered_shell();
        apply(&spec, &mut shell).unwrap();

        let state = shell.state();
        assert_eq!(state.panels.len(), 2);
        assert!(state
            .panels
            .iter()
            .all(|p| panel_edge(p) == Some(PanelEdge::Top)));
        assert_eq!(widget_ids(&state.panels[0]), ["global-menu", "clock"]);
        assert_eq!(widget_ids(&state.panels[1]), ["task-list"]);

        let mutations = shell.mutations();
        let report = apply(&spec, &mut shell).unwrap();
        assert!(report.converged);
        assert_eq!(shell.mutations(), mutations);
    }

    #[test]
    fn creation_failure_keeps_what_was_built() {
        let mut shell = MemoryShell::new();
        shell.refuse_panels(PanelEdge::Bottom);
        let mut reconciler = Reconciler::new(&mut shell);
        let err = reconciler.apply(&mac_like()).unwrap_err();
        assert!(matches!(
            &err,
            ReconciliationError::ContainmentCreationFailed { what, .. } if what.starts_with("Bottom panel 1")
        ));
        assert_eq!(reconciler.phase(), Phase::Failed);
        assert_eq!(reconciler.report().created().count(), 2);

        let state = shell.state();
        assert_eq!(state.desktops.len(), 1);
        assert_eq!(state.panels.len(), 1);
        assert_eq!(
            widget_ids(&state.panels[0]),
            ["launcher", "global-menu", "system-tray", "clock"]
        );
    }

    #[test]
    fn unset_properties_do_not_block_convergence() {
        let wanted = desired_panel(&PanelSpec::new(PanelEdge::Left).widgets(["clock"]));
        let reported = ContainmentState::Panel {
            edge: PanelEdge::Left,
            properties: vec![
                Property::Immutable(false),
                Property::Height(44),
                Property::Alignment(PanelAlignment::Start),
                Property::Floating(false),
            ],
            widgets: vec![WidgetState {
                plugin_id: "clock".into(),
                pinned_entries: vec![],
            }],
        };
        assert!(satisfies(&reported, &wanted));

        let floating = ContainmentState::Panel {
            edge: PanelEdge::Left,
            properties: vec![Property::Floating(true)],
            widgets: vec![],
        };
        assert!(!satisfies(&floating, &wanted));
        assert!(!satisfies(&wanted, &desired_desktop(&DesktopSpec::default())));
    }

    #[test]
    fn phase_tracks_the_run() {
        let mut shell = MemoryShell::new();
        let mut reconciler = Reconciler::new(&mut shell);
        assert_eq!(reconciler.phase(), Phase::NotStarted);
        reconciler.apply(&vanilla()).unwrap();
        assert_eq!(reconciler.phase(), Phase::Completed);
    }

    #[test]
    fn report_summary() {
        let mut shell = MemoryShell::new();
        let report = apply(&mac_like(), &mut shell).unwrap();
        assert_eq!(
            report.to_string(),
            "removed 0 containments, created 3, added 5 widgets, pinned 2 entries"
        );
        let report = apply(&mac_like(), &mut shell).unwrap();
        assert_eq!(report.to_string(), "layout already applied, nothing to do");
    }
}
