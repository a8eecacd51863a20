// SPDX-License-Identifier: MPL-2.0-only

//! A running plasmashell, driven over the session bus

use std::collections::HashMap;

use anyhow::Context;
use serde::Deserialize;
use shell_host::{
    ContainmentHandle, ContainmentState, DesktopKind, HostError, HostShell, PanelAlignment,
    PanelEdge, Property, WidgetHandle, WidgetState,
};
use tokio::runtime::{self, Runtime};
use tracing::{debug, trace};

use super::script;

#[zbus::proxy(
    interface = "org.kde.PlasmaShell",
    default_service = "org.kde.plasmashell",
    default_path = "/PlasmaShell"
)]
trait Scripting {
    #[zbus(name = "evaluateScript")]
    async fn evaluate_script(&self, script: &str) -> zbus::Result<String>;
}

/// Handles are plasma containment and applet ids. Every call evaluates one script.
///
/// Containments can be described, so re-applying the layout they already show is a no-op.
pub struct PlasmaShell {
    proxy: ScriptingProxy<'static>,
    runtime: Runtime,
    widgets: HashMap<WidgetHandle, ContainmentHandle>,
}

impl PlasmaShell {
    pub fn connect() -> anyhow::Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let conn = runtime
            .block_on(zbus::Connection::session())
            .context("Failed to connect to the session bus")?;
        let proxy = runtime
            .block_on(ScriptingProxy::new(&conn))
            .context("Failed to reach org.kde.plasmashell")?;
        Ok(Self {
            proxy,
            runtime,
            widgets: HashMap::new(),
        })
    }

    fn evaluate(&self, script: &str) -> Result<String, HostError> {
        trace!("evaluating:\n{}", script);
        let output = self
            .runtime
            .block_on(self.proxy.evaluate_script(script))
            .map_err(host_error)?;
        debug!(output = output.trim(), "script evaluated");
        Ok(output)
    }

    fn list(&self, collection: &str) -> Result<Vec<ContainmentHandle>, HostError> {
        let output = self.evaluate(&script::print_ids(collection))?;
        parse_ids(&output).map(|ids| ids.into_iter().map(ContainmentHandle).collect())
    }
}

/// expression for a containment by id, whichever kind it is
fn containment(handle: ContainmentHandle) -> String {
    format!("(panelById({0}) || desktopById({0}))", handle.0)
}

/// bind `var` to a containment, failing the script if it is gone
fn bind(var: &str, handle: ContainmentHandle) -> String {
    format!(
        "var {var} = {expr};\nif (!{var}) {{ throw \"no containment {id}\"; }}",
        var = var,
        expr = containment(handle),
        id = handle.0,
    )
}

/// print the containment bound to `c` as one line of JSON, see [`Described`]
fn describe_script(handle: ContainmentHandle) -> String {
    format!(
        "{bind}
var widgets = c.widgets().map(function (w) {{
    w.currentConfigGroup = [\"General\"];
    return {{ plugin: w.type, launchers: String(w.readConfig(\"launchers\", \"\")) }};
}});
print(JSON.stringify(panelById({id}) ? {{ panel: {{
    location: c.location, height: c.height, floating: !!c.floating,
    alignment: c.alignment, locked: !!c.locked, widgets: widgets }} }}
  : {{ desktop: {{
    plugin: c.type, screen: c.screen, wallpaper: c.wallpaperPlugin, locked: !!c.locked }} }}));",
        bind = bind("c", handle),
        id = handle.0,
    )
}

/// A containment as printed by [`describe_script`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Described {
    Panel {
        location: PanelEdge,
        height: u32,
        floating: bool,
        alignment: PanelAlignment,
        locked: bool,
        widgets: Vec<DescribedWidget>,
    },
    Desktop {
        plugin: String,
        screen: i64,
        #[serde(default)]
        wallpaper: String,
        locked: bool,
    },
}

#[derive(Debug, Deserialize)]
struct DescribedWidget {
    plugin: String,
    /// comma separated, as stored in the `General` group
    launchers: String,
}

impl Described {
    /// `None` for desktops this tool doesn't create, they never match a layout
    fn into_state(self) -> Option<ContainmentState> {
        match self {
            Described::Panel {
                location,
                height,
                floating,
                alignment,
                locked,
                widgets,
            } => Some(ContainmentState::Panel {
                edge: location,
                properties: vec![
                    Property::Height(height),
                    Property::Floating(floating),
                    Property::Alignment(alignment),
                    Property::Immutable(locked),
                ],
                widgets: widgets.into_iter().map(DescribedWidget::into_state).collect(),
            }),
            Described::Desktop {
                plugin,
                screen,
                wallpaper,
                locked,
            } => {
                let kind = [DesktopKind::Plain, DesktopKind::FolderView]
                    .into_iter()
                    .find(|kind| kind.plugin_id() == plugin)?;
                Some(ContainmentState::Desktop {
                    kind,
                    screen: u32::try_from(screen).ok()?,
                    properties: vec![
                        Property::WallpaperPlugin(wallpaper),
                        Property::Immutable(locked),
                    ],
                })
            }
        }
    }
}

impl DescribedWidget {
    fn into_state(self) -> WidgetState {
        let pinned_entries = self
            .launchers
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| l.strip_prefix("applications:").unwrap_or(l).to_string())
            .collect();
        WidgetState {
            plugin_id: self.plugin,
            pinned_entries,
        }
    }
}

/// the state printed by [`describe_script`] on the last line of `output`
fn parse_state(output: &str) -> Result<Option<ContainmentState>, HostError> {
    let line = output.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    let described: Described = serde_json::from_str(line).map_err(|err| {
        HostError::Rejected(format!("unexpected description {:?}: {}", line, err))
    })?;
    Ok(described.into_state())
}

fn host_error(err: zbus::Error) -> HostError {
    match err {
        zbus::Error::MethodError(name, detail, _) => {
            HostError::Rejected(detail.unwrap_or_else(|| name.to_string()))
        }
        err => HostError::Transport(err.to_string()),
    }
}

/// ids printed by a script, one comma separated line
fn parse_ids(output: &str) -> Result<Vec<u32>, HostError> {
    let line = output.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    line.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| HostError::Rejected(format!("unexpected script output {:?}", output)))
        })
        .collect()
}

fn parse_id(output: &str) -> Result<u32, HostError> {
    match parse_ids(output)?.as_slice() {
        [id] => Ok(*id),
        _ => Err(HostError::Rejected(format!(
            "expected one id from the script, got {:?}",
            output
        ))),
    }
}

impl HostShell for PlasmaShell {
    fn name(&self) -> &str {
        "plasmashell"
    }

    fn list_desktops(&mut self) -> Result<Vec<ContainmentHandle>, HostError> {
        self.list("desktops")
    }

    fn list_panels(&mut self) -> Result<Vec<ContainmentHandle>, HostError> {
        self.list("panels")
    }

    fn remove_containment(&mut self, handle: ContainmentHandle) -> Result<(), HostError> {
        self.evaluate(&format!("{}\n{}", bind("c", handle), script::remove("c")))?;
        self.widgets.retain(|_, c| *c != handle);
        Ok(())
    }

    fn create_desktop(
        &mut self,
        kind: DesktopKind,
        screen: u32,
    ) -> Result<ContainmentHandle, HostError> {
        let output = self.evaluate(&format!(
            "{}\nprint(d.id);",
            script::desktop("d", kind, screen)
        ))?;
        parse_id(&output).map(ContainmentHandle)
    }

    fn create_panel(&mut self, edge: PanelEdge) -> Result<ContainmentHandle, HostError> {
        let output = self.evaluate(&format!("{}\nprint(p.id);", script::panel("p", edge)))?;
        parse_id(&output).map(ContainmentHandle)
    }

    fn set_property(
        &mut self,
        handle: ContainmentHandle,
        property: &Property,
    ) -> Result<(), HostError> {
        self.evaluate(&format!(
            "{}\n{}",
            bind("c", handle),
            script::assign("c", property)
        ))?;
        Ok(())
    }

    fn add_widget(
        &mut self,
        handle: ContainmentHandle,
        plugin_id: &str,
    ) -> Result<WidgetHandle, HostError> {
        let output = self.evaluate(&format!(
            "{}\n{}\nprint(w.id);",
            bind("c", handle),
            script::add_widget("w", "c", plugin_id)
        ))?;
        let widget = WidgetHandle(parse_id(&output)?);
        self.widgets.insert(widget, handle);
        Ok(widget)
    }

    fn pin_entry(&mut self, widget: WidgetHandle, application_id: &str) -> Result<(), HostError> {
        let handle = *self
            .widgets
            .get(&widget)
            .ok_or(HostError::NoSuchWidget(widget))?;
        self.evaluate(&format!(
            "{}\nvar w = c.widgetById({id});\nif (!w) {{ throw \"no widget {id}\"; }}\n{}",
            bind("c", handle),
            script::pin_launcher("w", application_id),
            id = widget.0,
        ))?;
        Ok(())
    }

    fn describe(
        &mut self,
        handle: ContainmentHandle,
    ) -> Result<Option<ContainmentState>, HostError> {
        let state = parse_state(&self.evaluate(&describe_script(handle))?)?;
        if state.is_none() {
            debug!("{} can't be compared with a layout", handle);
        }
        Ok(state)
    }
}
