//! lintel
//!
//! A small reparenting X11 window manager. Every top-level window gets a plain
//! frame with a drag bar and resize margins; Mod1+F4 closes and Mod1+Tab cycles.

mod config;
mod error;
mod shared;
mod wm;

use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::WmError;
use crate::wm::WindowManager;
use crate::wm::x11::X11Session;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lintel=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        debug!("Ignoring command line arguments: {:?}", args);
    }

    info!("Starting lintel {}", env!("CARGO_PKG_VERSION"));
    let config = Config::load();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if let Some(source) = std::error::Error::source(&e) {
                error!("Caused by: {:#}", source);
            }
            e.exit_code()
        }
    }
}

fn run(config: &Config) -> Result<(), WmError> {
    let session = X11Session::connect(config.display.as_deref())?;
    let mut wm = WindowManager::start(session, config)?;
    wm.run()
}
