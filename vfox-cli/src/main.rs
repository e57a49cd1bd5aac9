//! # vfox
//!
//! SDK version manager driven by Lua plugins.
//!
//! Each SDK is backed by a plugin at `<plugin dir>/<name>.lua`. This binary
//! loads plugins on demand and drives their read-only hooks.
//!
//! ## Configuration
//!
//! Configuration is read from `$XDG_CONFIG_HOME/vfox/config.toml`, created
//! with defaults on first run.
//!
//! ## Running
//!
//! ```bash
//! # Versions a plugin offers
//! vfox search java
//!
//! # Plugin details and the download plan for a version
//! vfox info java@21 --json
//!
//! # With debug logging
//! RUST_LOG=debug vfox plugins
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use vfox::{Config, PluginListing, SdkArg, SdkInfo, SdkManager};
use vfox_plugin::Package;

/// vfox - manage SDK versions through Lua plugins
#[derive(Parser, Debug)]
#[command(name = "vfox")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Use this configuration file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the versions available for an SDK
    Search {
        /// SDK name
        sdk: SdkArg,
    },
    /// Show plugin details; with name@version, also resolve that version
    Info {
        /// SDK as name[@version]
        sdk: SdkArg,
    },
    /// List plugins in the plugin directory
    Plugins,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    };
    let (config, config_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) if args.config.is_some() => return Err(e),
        Err(e) => (Config::default(), Some(e)),
    };

    let level = if args.debug { "debug" } else { config.log.level.as_str() };
    init_logging(level);
    if let Some(e) = config_error {
        warn!("Failed to load config, using defaults: {:#}", e);
    }

    let manager = SdkManager::new(&config)?;
    debug!("Using plugin directory {}", manager.plugin_dir().display());

    match args.command {
        Command::Search { sdk } => {
            let packages = manager.search(&sdk.name)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&packages)?);
            } else {
                print_packages(&sdk.name, &packages);
            }
        }
        Command::Info { sdk } => {
            let info = manager.info(&sdk)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_info(&info);
            }
        }
        Command::Plugins => {
            let plugins = manager.plugins();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&plugins)?);
            } else {
                print_plugins(&plugins);
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_packages(name: &str, packages: &[Package]) {
    if packages.is_empty() {
        println!("No versions available for {name}");
        return;
    }
    for package in packages {
        let main = &package.main;
        if main.note.is_empty() {
            println!("{}", main.version);
        } else {
            println!("{} ({})", main.version, main.note);
        }
        for addition in &package.additions {
            println!("  + {}", addition.label());
        }
    }
}

fn print_info(info: &SdkInfo) {
    let plugin = &info.plugin;
    println!("Name:        {}", plugin.name);
    println!("Version:     {}", plugin.version);
    println!("Author:      {}", plugin.author);
    println!("Description: {}", plugin.description);
    println!("Update URL:  {}", plugin.update_url);
    if !plugin.min_runtime_version.is_empty() {
        println!("Requires:    vfox >= {}", plugin.min_runtime_version);
    }
    println!("Source:      {}", plugin.filepath.display());
    println!("Install dir: {}", info.install_dir.display());

    let Some(package) = &info.resolved else {
        return;
    };
    println!();
    for artifact in std::iter::once(&package.main).chain(&package.additions) {
        println!("{}", artifact.label());
        if !artifact.path.is_empty() {
            println!("  url:      {}", artifact.path);
        }
        if !artifact.checksum.is_none() {
            println!("  checksum: {}:{}", artifact.checksum.kind, artifact.checksum.value);
        }
    }
}

fn print_plugins(plugins: &[PluginListing]) {
    if plugins.is_empty() {
        println!("No plugins installed");
        return;
    }
    for plugin in plugins {
        match &plugin.error {
            Some(e) => println!("{:<16} (broken: {})", plugin.name, e),
            None => println!("{:<16} {:<10} {}", plugin.name, plugin.version, plugin.description),
        }
    }
}
