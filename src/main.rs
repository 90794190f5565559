// bridge/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use kconfig_bridge::{backend::INFO, integration, BridgeConfig};

#[derive(Parser)]
#[command(name = "kconfig-bridge", version, about = "Inspect the KDE settings bridge: profiles and integrated options")]
struct Args {
    /// Bridge config file; replaces the system and user layers
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the store files
    #[arg(long, global = true)]
    dir: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List saved profiles
    Profiles,
    /// Delete a saved profile
    DeleteProfile { name: String },
    /// Print the integrated-option table
    Table {
        /// Only rows for this plugin
        #[arg(long)]
        plugin: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective bridge configuration
    ShowConfig,
    /// Describe the backend
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::load(),
    };
    if args.dir.is_some() {
        config.config_dir = args.dir.clone();
    }

    match args.cmd {
        Cmd::Profiles => {
            let layout = config.layout().context("resolve store directory")?;
            for profile in layout.list_profiles() {
                println!("{profile}");
            }
        }
        Cmd::DeleteProfile { name } => {
            let layout = config.layout().context("resolve store directory")?;
            layout
                .delete_profile(&name)
                .with_context(|| format!("delete profile {name:?}"))?;
            info!(profile = %name, "profile deleted");
        }
        Cmd::Table { plugin, json } => {
            let rows: Vec<_> = integration::OPTIONS
                .iter()
                .filter(|o| plugin.as_deref().is_none_or(|p| o.plugin == p))
                .map(|o| o.describe())
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for r in rows {
                    let key = r.external_key.unwrap_or("-");
                    let ro = if r.read_only { " (read-only)" } else { "" };
                    println!("{}/{}\t{}/{}\t{}{}", r.plugin, r.setting, r.group, key, r.kind, ro);
                }
            }
        }
        Cmd::ShowConfig => print!("{}", config.to_toml()?),
        Cmd::Info => println!("{}", serde_json::to_string_pretty(&INFO)?),
    }
    Ok(())
}
