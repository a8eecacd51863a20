// SPDX-License-Identifier: MPL-2.0-only

//! Plasma desktop scripting.
//!
//! The statement builders here are shared by [`ScriptShell`], which collects a whole
//! layout into one script, and the D-Bus shell, which evaluates them one at a time.

use std::collections::HashMap;

use serde_json::Value;
use shell_host::{
    ContainmentHandle, DesktopKind, HostError, HostShell, PanelEdge, Property, WidgetHandle,
};

/// `immutability` values of a Plasma containment
const MUTABLE: u8 = 1;
const USER_IMMUTABLE: u8 = 2;

/// quote `s` as a javascript string literal
pub(crate) fn literal(s: &str) -> String {
    Value::from(s).to_string()
}

/// print the comma separated ids of `desktops()` or `panels()`
pub(crate) fn print_ids(collection: &str) -> String {
    format!(
        "print({}().map(function (c) {{ return c.id; }}).join(\",\"));",
        collection
    )
}

pub(crate) fn remove_all(collection: &str) -> String {
    format!("{}().forEach(function (c) {{ c.remove(); }});", collection)
}

pub(crate) fn remove(target: &str) -> String {
    format!("{}.remove();", target)
}

pub(crate) fn assign(target: &str, property: &Property) -> String {
    match property {
        Property::WallpaperPlugin(plugin) => {
            format!("{}.wallpaperPlugin = {};", target, literal(plugin))
        }
        Property::Immutable(locked) => format!(
            "{}.immutability = {};",
            target,
            if *locked { USER_IMMUTABLE } else { MUTABLE }
        ),
        Property::Height(height) => format!("{}.height = {};", target, height),
        Property::Floating(floating) => format!("{}.floating = {};", target, floating),
        Property::Alignment(alignment) => format!(
            "{}.alignment = {};",
            target,
            literal(alignment.plasma_name())
        ),
    }
}

/// bind `var` to the desktop of `screen` and switch it to `kind`
pub(crate) fn desktop(var: &str, kind: DesktopKind, screen: u32) -> String {
    format!(
        "var {var} = desktopForScreen({screen}) || desktops()[{screen}];\n\
         if (!{var}) {{ throw \"no desktop on screen {screen}\"; }}\n\
         {var}.plugin = {plugin};",
        var = var,
        screen = screen,
        plugin = literal(kind.plugin_id()),
    )
}

pub(crate) fn panel(var: &str, edge: PanelEdge) -> String {
    format!(
        "var {var} = new Panel;\n{var}.location = {location};",
        var = var,
        location = literal(edge.location()),
    )
}

pub(crate) fn add_widget(var: &str, target: &str, plugin_id: &str) -> String {
    let plugin = literal(plugin_id);
    format!(
        "var {var} = {target}.addWidget({plugin});\n\
         if (!{var}) {{ throw \"unknown widget plugin \" + {plugin}; }}",
        var = var,
        target = target,
        plugin = plugin,
    )
}

/// append an application to the launchers of a task manager widget
pub(crate) fn pin_launcher(widget: &str, application_id: &str) -> String {
    format!(
        "{w}.currentConfigGroup = [\"General\"];\n\
         {w}.writeConfig(\"launchers\", String({w}.readConfig(\"launchers\", \"\")).split(\",\")\
         .filter(function (l) {{ return l.length > 0; }}).concat([{launcher}]));",
        w = widget,
        launcher = literal(&format!("applications:{}", application_id)),
    )
}

#[derive(Debug, Clone)]
enum Target {
    /// every containment returned by `desktops()` or `panels()`
    All(&'static str),
    /// a containment bound to a script variable
    Var(String),
}

/// Renders the operations into one Plasma desktop script instead of running them.
///
/// The script is meant for `org.kde.PlasmaShell.evaluateScript` or a look-and-feel
/// layout. Nothing is known about the shell it will run on, so each listing returns a
/// single handle standing for the whole collection.
#[derive(Debug, Default)]
pub struct ScriptShell {
    title: String,
    statements: Vec<String>,
    next_id: u32,
    targets: HashMap<ContainmentHandle, Target>,
    widgets: HashMap<WidgetHandle, String>,
}

impl ScriptShell {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// the complete script
    pub fn script(&self) -> String {
        let mut script = format!("// archer layout: {}\n\nfunction main() {{\n", self.title);
        for statement in &self.statements {
            for line in statement.lines() {
                script.push_str("    ");
                script.push_str(line);
                script.push('\n');
            }
        }
        script.push_str("}\n\nmain();\n");
        script
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn var(&self, handle: ContainmentHandle) -> Result<&str, HostError> {
        match self.targets.get(&handle) {
            Some(Target::Var(var)) => Ok(var),
            Some(Target::All(collection)) => Err(HostError::Rejected(format!(
                "{} stands for all of {}()",
                handle, collection
            ))),
            None => Err(HostError::NoSuchContainment(handle)),
        }
    }

    fn list(&mut self, collection: &'static str) -> Vec<ContainmentHandle> {
        let handle = ContainmentHandle(self.next());
        self.targets.insert(handle, Target::All(collection));
        vec![handle]
    }
}

impl HostShell for ScriptShell {
    fn name(&self) -> &str {
        "script"
    }

    fn list_desktops(&mut self) -> Result<Vec<ContainmentHandle>, HostError> {
        Ok(self.list("desktops"))
    }

    fn list_panels(&mut self) -> Result<Vec<ContainmentHandle>, HostError> {
        Ok(self.list("panels"))
    }

    fn remove_containment(&mut self, handle: ContainmentHandle) -> Result<(), HostError> {
        let statement = match self.targets.remove(&handle) {
            Some(Target::All(collection)) => remove_all(collection),
            Some(Target::Var(var)) => remove(&var),
            None => return Err(HostError::NoSuchContainment(handle)),
        };
        self.statements.push(statement);
        Ok(())
    }

    fn create_desktop(
        &mut self,
        kind: DesktopKind,
        screen: u32,
    ) -> Result<ContainmentHandle, HostError> {
        let handle = ContainmentHandle(self.next());
        let var = format!("desktop{}", handle.0);
        self.statements.push(desktop(&var, kind, screen));
        self.targets.insert(handle, Target::Var(var));
        Ok(handle)
    }

    fn create_panel(&mut self, edge: PanelEdge) -> Result<ContainmentHandle, HostError> {
        let handle = ContainmentHandle(self.next());
        let var = format!("panel{}", handle.0);
        self.statements.push(panel(&var, edge));
        self.targets.insert(handle, Target::Var(var));
        Ok(handle)
    }

    fn set_property(
        &mut self,
        handle: ContainmentHandle,
        property: &Property,
    ) -> Result<(), HostError> {
        let statement = assign(self.var(handle)?, property);
        self.statements.push(statement);
        Ok(())
    }

    fn add_widget(
        &mut self,
        handle: ContainmentHandle,
        plugin_id: &str,
    ) -> Result<WidgetHandle, HostError> {
        let target = self.var(handle)?.to_string();
        let widget = WidgetHandle(self.next());
        let var = format!("widget{}", widget.0);
        self.statements.push(add_widget(&var, &target, plugin_id));
        self.widgets.insert(widget, var);
        Ok(widget)
    }

    fn pin_entry(&mut self, widget: WidgetHandle, application_id: &str) -> Result<(), HostError> {
        let var = self
            .widgets
            .get(&widget)
            .ok_or(HostError::NoSuchWidget(widget))?;
        let statement = pin_launcher(var, application_id);
        self.statements.push(statement);
        Ok(())
    }
}
