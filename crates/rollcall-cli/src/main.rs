use anyhow::{Context, Result};
use clap::Parser;
use rollcall_core::CascadeDetector;
use rollcall_hw::Camera;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod console;
mod session;

use config::Config;
use session::Session;

#[derive(Parser)]
#[command(
    name = "rollcall",
    about = "Webcam attendance tool: cascade face detection, pixel-norm matching, append-only ledger"
)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// V4L2 camera device (overrides config)
    #[arg(short, long)]
    device: Option<String>,
    /// Cascade model JSON file (overrides config)
    #[arg(short, long)]
    model: Option<PathBuf>,
    /// List V4L2 capture devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        let devices = Camera::list_devices();
        if devices.is_empty() {
            println!("No V4L2 capture devices found.");
        }
        for d in devices {
            println!("{}  {} ({})", d.path, d.name, d.driver);
        }
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(device) = cli.device {
        config.camera_device = device;
    }
    if let Some(model) = cli.model {
        config.cascade_model = model;
    }

    std::fs::create_dir_all(&config.faces_dir)
        .with_context(|| format!("failed to create {}", config.faces_dir.display()))?;
    for file in [&config.details_file, &config.attendance_file] {
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    // Fatal before the menu: nothing below works without a detector.
    let detector =
        CascadeDetector::load(&config.cascade_model).context("failed to load cascade model")?;

    let mut session = Session::new(detector, &config);
    println!("Attendance system initialized.");

    loop {
        println!();
        println!("1. Mark Attendance");
        println!("2. Register New Person");
        println!("3. Exit");
        let choice = console::prompt_line("Choose an option: ")?;
        match choice.as_str() {
            "1" => {
                if let Err(e) = session.mark_attendance() {
                    eprintln!("Error: {e:#}");
                }
            }
            "2" => {
                if let Err(e) = session.register_once() {
                    eprintln!("Error: {e:#}");
                }
            }
            "3" => break,
            _ => println!("Invalid option. Try again."),
        }
    }

    Ok(())
}
