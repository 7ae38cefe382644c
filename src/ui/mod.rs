//! Terminal feedback for the command line tools
//!
//! Transfer progress bars and the listener spinner, built with indicatif.

mod progress;

pub use progress::{create_listen_spinner, create_transfer_progress};
