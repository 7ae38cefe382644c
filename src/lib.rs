pub mod cli;
pub mod config;
pub mod host;
pub mod logging;
pub mod midi;
pub mod protocol;
pub mod receiver;
pub mod sender;
pub mod ui;

pub use cli::Args;
pub use config::Settings;
pub use host::{SequencerHost, Timeline};
pub use receiver::{Framing, Handled, MessageHandler, Placement};
pub use sender::{Timing, TransferError, TransferReport, Transmitter};

#[cfg(not(feature = "test-mock"))]
pub fn handle_device_list() -> Vec<String> {
    midi::MidirEngine::list_devices()
}

#[cfg(feature = "test-mock")]
pub fn handle_device_list() -> Vec<String> {
    // Mock implementation for tests - simple format as expected by tests
    vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
}
