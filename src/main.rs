//! friday-rs: voice-driven personal assistant.

mod assistant;
mod capability;
mod config;
mod dispatcher;
mod error;
mod features;
mod history;
mod platform;
mod responder;
mod setup;
mod speech;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "friday-rs", about = "Voice-driven personal assistant")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read commands from stdin instead of the voice transcriber
    #[arg(short, long)]
    text: bool,

    /// Run the interactive configuration wizard and exit
    #[arg(long)]
    setup: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("friday-rs starting");

    let config = config::Config::load(args.config.as_deref());
    let profile = platform::PlatformProfile::detect();
    info!("Platform: {profile}");

    let mut inventory = platform::PlatformInventory::new(profile, &config.scan);

    if args.setup {
        return match setup::run_wizard(args.config.as_deref(), &mut inventory) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Setup failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let voice = config
        .speech
        .voice
        .clone()
        .unwrap_or_else(|| inventory.default_voice());

    let providers = features::build_providers(&config, profile, voice, args.text);
    let capabilities = capability::CapabilityTable::probe(&providers);

    let mut assistant = assistant::Assistant::new(config, providers, inventory, capabilities);
    if let Err(e) = assistant.run() {
        error!("{e}");
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
