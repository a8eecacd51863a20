// SPDX-License-Identifier: MPL-2.0-only

use std::{
    collections::HashSet,
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shell_host::{DesktopKind, Property};
use tracing::{debug, warn};
use xdg::BaseDirectories;

use crate::{LayoutTemplate, PanelSpec, SpecError};

static XDG_PREFIX: &str = "archer";
static LAYOUT_DIR: &str = "layouts";
static LAYOUT_EXTENSION: &str = "ron";

fn default_wallpaper() -> String {
    "org.kde.image".to_string()
}

/// Config structure for the desktop containment of one screen
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DesktopSpec {
    /// which desktop containment variant to use
    #[serde(default)]
    pub kind: DesktopKind,
    /// wallpaper plugin, eg. `org.kde.image`
    #[serde(default = "default_wallpaper")]
    pub wallpaper_plugin: String,
    /// lock the desktop against editing
    #[serde(default)]
    pub immutable: bool,
    /// physical screen index
    #[serde(default)]
    pub screen: u32,
}

impl Default for DesktopSpec {
    fn default() -> Self {
        Self {
            kind: DesktopKind::Plain,
            wallpaper_plugin: default_wallpaper(),
            immutable: false,
            screen: 0,
        }
    }
}

impl DesktopSpec {
    pub fn new(kind: DesktopKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// property writes which configure the desktop, in the order they are applied
    pub fn properties(&self) -> Vec<Property> {
        vec![
            Property::WallpaperPlugin(self.wallpaper_plugin.clone()),
            Property::Immutable(self.immutable),
        ]
    }
}

/// The desired end state of the desktop.
///
/// Panels are created in the listed order and any number of them may share an edge.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LayoutSpec {
    #[serde(default)]
    pub desktops: Vec<DesktopSpec>,
    #[serde(default)]
    pub panels: Vec<PanelSpec>,
}

/// Where a resolved layout came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    /// a definition file named on the command line
    File(PathBuf),
    /// a definition in the user's layout directory
    User(PathBuf),
    /// a template compiled into the binary
    Builtin(LayoutTemplate),
}

impl fmt::Display for LayoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutSource::File(p) => write!(f, "file {}", p.display()),
            LayoutSource::User(p) => write!(f, "user layout {}", p.display()),
            LayoutSource::Builtin(t) => write!(f, "built-in template {}", t),
        }
    }
}

impl LayoutSpec {
    pub fn validate(&self) -> Result<(), SpecError> {
        let mut screens = HashSet::new();
        for (desktop, d) in self.desktops.iter().enumerate() {
            if !screens.insert(d.screen) {
                return Err(SpecError::DuplicateScreen { screen: d.screen });
            }
            if d.wallpaper_plugin.trim().is_empty() {
                return Err(SpecError::EmptyWallpaperPlugin { desktop });
            }
        }
        for (panel, p) in self.panels.iter().enumerate() {
            p.validate(panel)?;
        }
        Ok(())
    }

    /// parse and validate a RON layout definition
    pub fn from_ron(s: &str) -> anyhow::Result<Self> {
        let spec: Self = ron::de::from_str(s)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn to_ron(&self) -> anyhow::Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// load a layout definition from a file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                anyhow::bail!("Failed to open '{}': {}", path.display(), err);
            }
        };
        let spec: Self = match ron::de::from_reader(file) {
            Ok(spec) => spec,
            Err(err) => {
                anyhow::bail!("Failed to parse '{}': {}", path.display(), err);
            }
        };
        spec.validate()
            .with_context(|| format!("Invalid layout in '{}'", path.display()))?;
        Ok(spec)
    }

    /// write the layout definition to a file
    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let f = File::create(path)
            .with_context(|| format!("Failed to create '{}'", path.display()))?;
        ron::ser::to_writer_pretty(&f, self, ron::ser::PrettyConfig::default())?;
        Ok(())
    }

    /// write the layout to the user layout directory, returning the path written
    pub fn write(&self, name: &str) -> anyhow::Result<PathBuf> {
        let xdg = BaseDirectories::with_prefix(XDG_PREFIX)?;
        let path = xdg
            .place_config_file(layout_file_name(name)?)
            .context("Failed to create the layout directory")?;
        self.write_to(&path)?;
        debug!(name, path = %path.display(), "wrote layout");
        Ok(path)
    }

    /// names of the layouts in the user layout directory
    pub fn user_layouts() -> Vec<String> {
        let xdg = match BaseDirectories::with_prefix(XDG_PREFIX) {
            Ok(xdg) => xdg,
            Err(err) => {
                warn!("Failed to get config path: {}", err);
                return Vec::new();
            }
        };
        let mut names: Vec<String> = xdg
            .list_config_files(LAYOUT_DIR)
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == LAYOUT_EXTENSION))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Resolve a layout argument.
    ///
    /// An existing file path wins, then a user layout of that name, then a built-in template.
    pub fn resolve(arg: &str) -> anyhow::Result<(Self, LayoutSource)> {
        let path = Path::new(arg);
        if path.is_file() {
            return Ok((Self::load_from(path)?, LayoutSource::File(path.to_path_buf())));
        }
        if let Some(path) = Self::find_user_layout(arg)? {
            return Ok((Self::load_from(&path)?, LayoutSource::User(path)));
        }
        match arg.parse::<LayoutTemplate>() {
            Ok(template) => Ok((template.spec(), LayoutSource::Builtin(template))),
            Err(_) => anyhow::bail!(
                "No layout named {:?}; expected a file, a user layout or one of: {}",
                arg,
                LayoutTemplate::ALL
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    fn find_user_layout(name: &str) -> anyhow::Result<Option<PathBuf>> {
        let Ok(file_name) = layout_file_name(name) else {
            return Ok(None);
        };
        let xdg = BaseDirectories::with_prefix(XDG_PREFIX)?;
        Ok(xdg.find_config_file(file_name))
    }
}

fn layout_file_name(name: &str) -> anyhow::Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        anyhow::bail!("Not a valid layout name: {:?}", name);
    }
    Ok(Path::new(LAYOUT_DIR).join(format!("{}.{}", name, LAYOUT_EXTENSION)))
}
