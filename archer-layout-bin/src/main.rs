// SPDX-License-Identifier: MPL-2.0-only

use anyhow::{Context, Result};
use archer_layout_config::{LayoutSpec, LayoutTemplate};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod host;
mod reconcile;

use host::{MemoryShell, PlasmaShell, ScriptShell};
use reconcile::{ReconciliationReport, Reconciler};
use shell_host::HostShell;

/// Apply a desktop panel layout to the Plasma shell
#[derive(Debug, Parser)]
#[command(name = "archer-layout", version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replace the current panels and desktops with a layout
    Apply {
        /// A built-in template, a user layout name or a path to a layout file
        #[arg(env = "ARCHER_LAYOUT")]
        layout: String,
        /// Where to apply the layout
        #[arg(long, value_enum, env = "ARCHER_LAYOUT_HOST", default_value_t = HostKind::Plasma)]
        host: HostKind,
    },
    /// Print a layout as a Plasma desktop script
    Script {
        layout: String,
    },
    /// List built-in templates and user layouts
    List,
    /// Print a layout definition
    Show {
        layout: String,
    },
    /// Copy a built-in template into the user layout directory
    Export {
        template: LayoutTemplate,
        /// Name of the user layout, defaults to the template name
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HostKind {
    /// dry run against an empty in-memory shell
    Memory,
    /// print the Plasma script instead of running it
    Script,
    /// the running plasmashell, over D-Bus
    Plasma,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let journald_layer = tracing_journald::layer().ok();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(journald_layer)
        .init();
    log_panics::init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Apply { layout, host } => apply(&layout, host),
        Command::Script { layout } => apply(&layout, HostKind::Script),
        Command::List => {
            for template in LayoutTemplate::ALL {
                println!("{:<12} {}", template, template.description());
            }
            for name in LayoutSpec::user_layouts() {
                println!("{:<12} user layout", name);
            }
            Ok(())
        }
        Command::Show { layout } => {
            let (spec, source) = LayoutSpec::resolve(&layout)?;
            info!(%source, "resolved layout");
            println!("{}", spec.to_ron()?);
            Ok(())
        }
        Command::Export { template, name } => {
            let name = name.unwrap_or_else(|| template.to_string());
            let path = template.spec().write(&name)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn apply(layout: &str, host: HostKind) -> Result<()> {
    let (spec, source) = LayoutSpec::resolve(layout)?;
    info!(%source, ?host, "applying layout");

    let report = match host {
        HostKind::Memory => {
            let mut shell = MemoryShell::new();
            let report = reconcile(&spec, &mut shell, layout)?;
            for operation in &report.operations {
                println!("{}", operation);
            }
            report
        }
        HostKind::Script => {
            let mut shell = ScriptShell::new(layout);
            let report = reconcile(&spec, &mut shell, layout)?;
            print!("{}", shell.script());
            warn_about(&report);
            return Ok(());
        }
        HostKind::Plasma => {
            let mut shell = PlasmaShell::connect()?;
            reconcile(&spec, &mut shell, layout)?
        }
    };
    println!("{}", report);
    warn_about(&report);
    Ok(())
}

fn reconcile<H: HostShell>(
    spec: &LayoutSpec,
    shell: &mut H,
    layout: &str,
) -> Result<ReconciliationReport> {
    let mut reconciler = Reconciler::new(shell);
    match reconciler.apply(spec) {
        Ok(report) => Ok(report),
        Err(err) => {
            let done = &reconciler.report().operations;
            if !done.is_empty() {
                warn!(
                    phase = ?reconciler.phase(),
                    "{} operations were applied before the failure and stay in place",
                    done.len()
                );
                for operation in done {
                    info!("applied: {}", operation);
                }
            }
            Err(err).with_context(|| format!("Failed to apply layout {:?}", layout))
        }
    }
}

fn warn_about(report: &ReconciliationReport) {
    for warning in &report.warnings {
        warn!("{}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_defaults_to_plasma() {
        let cli = Cli::try_parse_from(["archer-layout", "apply", "cupertini"]).unwrap();
        match cli.command {
            Command::Apply { layout, host } => {
                assert_eq!(layout, "cupertini");
                assert_eq!(host, HostKind::Plasma);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn host_and_verbosity_parse() {
        let cli =
            Cli::try_parse_from(["archer-layout", "-vv", "apply", "--host", "memory", "x.ron"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Apply { host: HostKind::Memory, .. }));
    }

    #[test]
    fn export_takes_template_aliases() {
        let cli = Cli::try_parse_from(["archer-layout", "export", "macos", "--name", "mine"]).unwrap();
        match cli.command {
            Command::Export { template, name } => {
                assert_eq!(template, LayoutTemplate::Cupertini);
                assert_eq!(name.as_deref(), Some("mine"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["archer-layout", "export", "gnome"]).is_err());
    }

    #[test]
    fn dry_run_of_every_template() {
        for template in LayoutTemplate::ALL {
            let mut shell = MemoryShell::new();
            let report = reconcile(&template.spec(), &mut shell, "test").unwrap();
            assert_eq!(report.removed().count(), 0);
            assert_eq!(
                shell.state().panels.len(),
                template.spec().panels.len(),
                "{}",
                template
            );
        }
    }
}
