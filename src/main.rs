use std::path::PathBuf;

use clap::{ArgAction, Parser};
use waynoted::Config;
use waynoted::daemon::Daemon;

#[derive(Parser, Debug)]
#[command(name = "waynoted")]
#[command(
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WAYNOTED_GIT_HASH"), ")"),
    about = "Desktop notification daemon with stacked popups"
)]
struct Cli {
    /// Run as daemon and own org.freedesktop.Notifications on the session bus
    #[arg(long, short = 'd', action = ArgAction::SetTrue)]
    daemon: bool,

    /// Write the documented default config to ~/.config/waynoted/config.toml
    #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["daemon", "check_config"])]
    init_config: bool,

    /// Validate a config file (defaults to the user config) and exit
    #[arg(long, value_name = "PATH", num_args = 0..=1, conflicts_with = "daemon")]
    check_config: Option<Option<PathBuf>>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.init_config {
        let path = Config::create_default_file()?;
        println!("Wrote default config to {}", path.display());
    } else if let Some(path) = cli.check_config {
        let path = match path {
            Some(path) => path,
            None => Config::get_config_path()?,
        };
        if !path.exists() {
            return Err(anyhow::anyhow!("No config file at {}", path.display()));
        }
        let config = Config::load_from(&path)?;
        println!("{} is valid", path.display());
        println!(
            "  popups {}x{} anchored {:?}, {} modifier stage(s)",
            config.popups.width,
            config.popups.height,
            config.popups.anchor,
            config.modifiers.pipeline.len()
        );
    } else if cli.daemon {
        log::info!("Starting in daemon mode");
        let config = Config::load()?;
        let mut daemon = Daemon::new(config);
        daemon.run()?;
    } else {
        println!("waynoted: Desktop notification daemon with stacked popups");
        println!();
        println!("Usage:");
        println!("  waynoted --daemon         Serve notifications on the session bus");
        println!("  waynoted --init-config    Write a documented default config");
        println!("  waynoted --check-config   Validate the config file");
        println!("  waynoted --help           Show help");
        println!();
        println!("Signals:");
        println!("  pkill -SIGUSR1 waynoted   Drop every popup and queued notification");
        println!("  pkill -SIGHUP waynoted    Reload ~/.config/waynoted/config.toml");
    }

    Ok(())
}
