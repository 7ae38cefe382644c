//! Sending side: drives protocol frames onto a MIDI output
//!
//! Every frame becomes a note-on, a short hold, a note-off and an optional
//! gap. The transport has no flow control, so the sleeps are the only thing
//! giving the receiving host time to process each value.

use crate::midi::{MidiEngine, MidiError, MidiMessage};
use crate::protocol::{digits_to_bpm, tempo_frames, Frame, NoteEvent, Transfer};
use crate::ui::create_transfer_progress;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt;
use std::thread;
use std::time::Duration;

/// Note-on velocity for marker frames.
pub const MARKER_VELOCITY: u8 = 127;
/// Note-on velocity for data frames. Never 0, which would read as a note-off.
pub const DATA_VELOCITY: u8 = 1;

#[derive(Debug)]
pub enum TransferError {
    /// No valid notes; nothing was sent
    Empty,
    /// The MIDI output failed part way through
    Midi(MidiError),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Empty => write!(f, "no valid notes to transfer"),
            TransferError::Midi(e) => write!(f, "transfer failed: {}", e),
        }
    }
}

impl Error for TransferError {}

impl From<MidiError> for TransferError {
    fn from(e: MidiError) -> Self {
        TransferError::Midi(e)
    }
}

/// Timing of a single frame on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Between note-on and note-off
    pub hold: Duration,
    /// After every data frame
    pub gap: Duration,
    /// After start, count and tempo marker frames
    pub marker_gap: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            hold: Duration::from_millis(10),
            gap: Duration::ZERO,
            marker_gap: Duration::from_millis(10),
        }
    }
}

impl Timing {
    /// No sleeping at all, for tests and loopback use.
    pub fn immediate() -> Self {
        Timing {
            hold: Duration::ZERO,
            gap: Duration::ZERO,
            marker_gap: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub notes_sent: usize,
    pub frames_sent: usize,
    pub declared_count: u8,
    pub saturated: bool,
}

pub struct Transmitter<E: MidiEngine> {
    engine: E,
    channel: u8,
    timing: Timing,
    show_progress: bool,
}

impl<E: MidiEngine> Transmitter<E> {
    pub fn new(engine: E, channel: u8, timing: Timing) -> Self {
        Transmitter {
            engine,
            channel: channel & 0x0F,
            timing,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Sends one frame as a note-on/note-off pair.
    pub fn send_frame(&mut self, frame: Frame) -> Result<(), MidiError> {
        let velocity = if frame.marker {
            MARKER_VELOCITY
        } else {
            DATA_VELOCITY
        };
        debug!(
            "Sending {} {}",
            if frame.marker { "marker" } else { "value" },
            frame.value
        );

        self.engine.send(MidiMessage::NoteOn {
            channel: self.channel,
            note: frame.value,
            velocity,
        })?;
        pause(self.timing.hold);
        self.engine.send(MidiMessage::NoteOff {
            channel: self.channel,
            note: frame.value,
            velocity: 0,
        })?;
        Ok(())
    }

    /// Sends a complete note transfer.
    pub fn send_transfer(&mut self, transfer: &Transfer) -> Result<TransferReport, TransferError> {
        let frames = transfer.frames();
        if transfer.is_saturated() {
            warn!(
                "{} notes exceed the count limit; receiver will stop after {}",
                transfer.notes().len(),
                transfer.declared_count()
            );
        }
        info!(
            "Transferring {} notes ({} MIDI values)",
            transfer.notes().len(),
            frames.len()
        );

        let progress = self
            .show_progress
            .then(|| create_transfer_progress(frames.len() as u64, "Notes"));

        for (index, frame) in frames.iter().enumerate() {
            if let Err(e) = self.send_frame(*frame) {
                if let Some(pb) = &progress {
                    pb.abandon_with_message("failed");
                }
                return Err(e.into());
            }
            // Start marker and count get extra settling time
            pause(if index < 2 {
                self.timing.marker_gap
            } else {
                self.timing.gap
            });
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &progress {
            pb.finish_with_message("sent");
        }

        Ok(TransferReport {
            notes_sent: transfer.notes().len(),
            frames_sent: frames.len(),
            declared_count: transfer.declared_count(),
            saturated: transfer.is_saturated(),
        })
    }

    /// Builds and sends a transfer, refusing empty input before touching the port.
    pub fn send_notes(&mut self, notes: Vec<NoteEvent>) -> Result<TransferReport, TransferError> {
        let transfer = Transfer::new(notes).ok_or(TransferError::Empty)?;
        self.send_transfer(&transfer)
    }

    /// Sends a tempo change; returns the BPM actually sent.
    pub fn send_tempo(&mut self, bpm: i64) -> Result<u32, MidiError> {
        let frames = tempo_frames(bpm);
        let digits: Vec<u8> = frames[1..frames.len() - 1]
            .iter()
            .map(|f| f.value)
            .collect();
        let sent_bpm = digits_to_bpm(&digits);
        info!("Setting tempo to {} BPM using digits {:?}", sent_bpm, digits);

        for frame in frames {
            self.send_frame(frame)?;
            pause(if frame.marker {
                self.timing.marker_gap
            } else {
                self.timing.gap
            });
        }
        Ok(sent_bpm)
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
