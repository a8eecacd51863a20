// SPDX-License-Identifier: MPL-2.0-only

//! shells a layout can be applied to

mod memory;
mod plasma;
mod script;

pub use memory::*;
pub use plasma::PlasmaShell;
pub use script::ScriptShell;
