//! vatSys Manager - install, update and remove vatSys profiles and plugins.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;

use vatsys_manager::commands::{self, Command, PluginTarget};
use vatsys_manager::core::catalog::ReconciledBundle;
use vatsys_manager::core::error::{ManagerError, ManagerResult};
use vatsys_manager::core::state::{default_settings_path, AppContext, Settings};
use vatsys_manager::core::workflow::WorkflowReport;

#[derive(Parser)]
#[command(name = "vatsys-manager")]
#[command(author, version, about = "Profile and plugin manager for vatSys")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// vatSys install directory (overrides settings)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Profile directory (overrides settings)
    #[arg(long, global = true)]
    profile_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configured directories and whether vatSys is running
    Status,

    /// Start vatSys
    Launch,

    /// Kill every running vatSys process
    Stop,

    /// Manage profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Manage plugins
    Plugins {
        #[command(subcommand)]
        action: PluginAction,
    },

    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List installed and available profiles
    List,
    /// Install a profile from the catalog
    Install { name: String },
    /// Replace an installed profile with the catalog version
    Update { name: String },
    /// Delete an installed profile
    Delete { name: String },
}

#[derive(Subcommand)]
enum PluginAction {
    /// List installed and available plugins
    List,
    /// Install a plugin into a profile, or into the shared plugin folder
    Install {
        name: String,
        /// Profile to install into
        #[arg(long, conflicts_with = "shared")]
        profile: Option<String>,
        /// Install for every profile
        #[arg(long)]
        shared: bool,
    },
    /// Reinstall a plugin in the folder it was found in
    Update { name: String, directory: PathBuf },
    /// Delete a plugin folder
    Delete { directory: PathBuf },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        profiles_catalog_url: Option<String>,
        #[arg(long)]
        plugins_catalog_url: Option<String>,
        /// Host of plugin release archives
        #[arg(long)]
        plugin_download_base: Option<String>,
        /// Request timeout in seconds, 0 for none
        #[arg(long)]
        http_timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    vatsys_manager::init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(kind = ?e.kind(), "{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ManagerResult<bool> {
    let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);
    let mut settings = Settings::load_from(&settings_path);
    if cli.base_dir.is_some() {
        settings.base_directory = cli.base_dir.clone();
    }
    if cli.profile_dir.is_some() {
        settings.profile_directory = cli.profile_dir.clone();
    }

    let ctx = AppContext::new(settings)?;
    match cli.command {
        Commands::Settings { action } => {
            settings_command(action, ctx.settings.clone(), &settings_path, cli.json)
        }
        Commands::Status => {
            let status = commands::host_status(&ctx);
            if cli.json {
                print_json(&status)?;
            } else {
                println!("Base directory:    {}", or_dash(&status.base_directory));
                println!("Profile directory: {}", or_dash(&status.profile_directory));
                println!("vatSys executable: {}", found(status.executable_found));
                println!("vatSys running:    {}", status.running);
            }
            Ok(true)
        }
        Commands::Launch => {
            let pid = ctx.host()?.launch()?;
            println!("vatSys started (pid {pid})");
            Ok(true)
        }
        Commands::Stop => {
            let stopped = ctx.host()?.stop();
            println!("Stopped {stopped} vatSys process(es)");
            Ok(true)
        }
        Commands::Profiles { action } => match action {
            ProfileAction::List => {
                print_bundles(&commands::list_profiles(&ctx).await?, cli.json)?;
                Ok(true)
            }
            ProfileAction::Install { name } => {
                dispatch(&ctx, Command::InstallProfile(name), cli.json).await
            }
            ProfileAction::Update { name } => {
                dispatch(&ctx, Command::UpdateProfile(name), cli.json).await
            }
            ProfileAction::Delete { name } => {
                dispatch(&ctx, Command::DeleteProfile(name), cli.json).await
            }
        },
        Commands::Plugins { action } => match action {
            PluginAction::List => {
                print_bundles(&commands::list_plugins(&ctx).await?, cli.json)?;
                Ok(true)
            }
            PluginAction::Install {
                name,
                profile,
                shared,
            } => {
                let target = match (profile, shared) {
                    (Some(profile), false) => PluginTarget::Profile(profile),
                    (None, true) => PluginTarget::Shared,
                    _ => {
                        return Err(ManagerError::Other(
                            "Choose either --profile <NAME> or --shared".into(),
                        ))
                    }
                };
                dispatch(&ctx, Command::InstallPlugin { name, target }, cli.json).await
            }
            PluginAction::Update { name, directory } => {
                dispatch(&ctx, Command::UpdatePlugin { name, directory }, cli.json).await
            }
            PluginAction::Delete { directory } => {
                dispatch(&ctx, Command::DeletePlugin(directory), cli.json).await
            }
        },
    }
}

/// Run a workflow command; vatSys must not hold the files open.
async fn dispatch(ctx: &AppContext, command: Command, json: bool) -> ManagerResult<bool> {
    if let Ok(host) = ctx.host() {
        if host.is_running() {
            return Err(ManagerError::HostRunning);
        }
    }

    let report = commands::execute(ctx, command).await?;
    print_report(&report, json)?;
    Ok(report.success)
}

fn settings_command(
    action: SettingsAction,
    mut settings: Settings,
    path: &std::path::Path,
    json: bool,
) -> ManagerResult<bool> {
    match action {
        SettingsAction::Show => {
            if json {
                print_json(&settings)?;
            } else {
                println!("{}", serde_json::to_string_pretty(&settings)?);
                println!("(from {})", path.display());
            }
        }
        SettingsAction::Set {
            profiles_catalog_url,
            plugins_catalog_url,
            plugin_download_base,
            http_timeout_secs,
        } => {
            if profiles_catalog_url.is_some() {
                settings.profiles_catalog_url = profiles_catalog_url;
            }
            if plugins_catalog_url.is_some() {
                settings.plugins_catalog_url = plugins_catalog_url;
            }
            if let Some(base) = plugin_download_base {
                settings.plugin_download_base = base;
            }
            if let Some(secs) = http_timeout_secs {
                settings.http_timeout_secs = secs;
            }
            settings.save_to(path)?;
            println!("Saved {}", path.display());
        }
    }
    Ok(true)
}

fn print_report(report: &WorkflowReport, json: bool) -> ManagerResult<()> {
    if json {
        return print_json(report);
    }
    for line in &report.log {
        println!("{line}");
    }
    match (&report.failed_step, report.success) {
        (_, true) => println!("Done."),
        (Some(step), false) => println!("Failed at step: {step}"),
        (None, false) => println!("Nothing to do: target is not in the expected state."),
    }
    Ok(())
}

fn print_bundles(bundles: &[ReconciledBundle], json: bool) -> ManagerResult<()> {
    if json {
        return print_json(&bundles);
    }
    println!(
        "{:<32} {:<10} {:<14} {:<14} {:<8} LOCATION",
        "NAME", "INSTALLED", "LOCAL", "REMOTE", "UPDATE"
    );
    for bundle in bundles {
        let location = bundle
            .install_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "{:<32} {:<10} {:<14} {:<14} {:<8} {}",
            bundle.name,
            yes_no(bundle.installed),
            bundle.local_version.to_string(),
            bundle.remote_version.to_string(),
            yes_no(bundle.update_available),
            location
        );
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ManagerResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn found(present: bool) -> &'static str {
    if present {
        "found"
    } else {
        "missing"
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
