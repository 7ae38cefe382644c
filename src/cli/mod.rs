use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file (defaults to ./notebridge.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List available MIDI devices
    Devices,

    /// Send notes given as `pitch,velocity,length,position` lines
    SendNotes {
        /// Read notes from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output device (overrides the configured one)
        #[arg(long)]
        device: Option<String>,

        /// Do not draw a progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Send a tempo change (clamped to 20-999 BPM)
    SendTempo {
        #[arg(allow_negative_numbers = true)]
        bpm: i64,

        /// Output device (overrides the configured one)
        #[arg(long)]
        device: Option<String>,
    },

    /// Decode incoming transfers into an in-memory timeline
    Listen {
        /// Input device (overrides the configured one)
        #[arg(long)]
        device: Option<String>,

        /// Append every received note to this file as text lines
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

pub fn handle_device_list() -> Vec<String> {
    // Re-export from the crate root
    crate::handle_device_list()
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
