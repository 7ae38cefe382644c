//! Receiving side: the sequencer host's MIDI message callback
//!
//! [`MessageHandler`] is invoked once per inbound MIDI message. It never
//! blocks; partial transfers simply stay in its [`DecoderState`] until the
//! next message arrives.

use crate::host::{beats_to_ticks, SequencerHost};
use crate::midi::{MidiEngine, MidiError, MidiMessage};
use crate::protocol::{
    DecodeOutcome, DecoderState, Frame, NoteEvent, TempoOutcome, TempoState, TRANSFER_START,
};
use crate::sender::MARKER_VELOCITY;
use log::{debug, error, info, warn};
use std::fmt;
use std::str::FromStr;

/// How a receiver tells markers from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// Markers are note-ons sent at [`MARKER_VELOCITY`]
    #[default]
    Tagged,
    /// Velocity is ignored; any frame with a marker value acts as a marker,
    /// except that 0 only starts a transfer from idle
    Positional,
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tagged" => Ok(Framing::Tagged),
            "positional" => Ok(Framing::Positional),
            other => Err(format!(
                "unknown framing '{}', expected 'tagged' or 'positional'",
                other
            )),
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Tagged => write!(f, "tagged"),
            Framing::Positional => write!(f, "positional"),
        }
    }
}

impl Framing {
    /// Maps a note-on to a protocol frame. Note-offs and zero-velocity
    /// note-ons carry no frame.
    pub fn classify(&self, note: u8, velocity: u8) -> Option<Frame> {
        if velocity == 0 {
            return None;
        }
        let marker = match self {
            Framing::Tagged => velocity == MARKER_VELOCITY,
            Framing::Positional => true,
        };
        Some(Frame {
            value: note.min(127),
            marker,
        })
    }
}

/// Where completed notes end up in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub channel: u8,
    pub pan: u8,
}

/// What the handler did with one message, mostly for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    Ignored,
    Note(NoteEvent),
    Tempo(u32),
    TransferFinished { received: u8 },
    Consumed,
}

pub struct MessageHandler<H: SequencerHost> {
    host: H,
    framing: Framing,
    midi_channel: Option<u8>,
    placement: Placement,
    decoder: DecoderState,
    tempo: TempoState,
}

impl<H: SequencerHost> MessageHandler<H> {
    pub fn new(host: H, framing: Framing, placement: Placement) -> Self {
        MessageHandler {
            host,
            framing,
            midi_channel: None,
            placement,
            decoder: DecoderState::new(),
            tempo: TempoState::new(),
        }
    }

    /// Only accept messages on this MIDI channel (0-15).
    pub fn listen_on_channel(mut self, channel: u8) -> Self {
        self.midi_channel = Some(channel & 0x0F);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn decoder(&self) -> &DecoderState {
        &self.decoder
    }

    pub fn on_midi_message(&mut self, msg: &MidiMessage) -> Handled {
        match *msg {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => {
                if self.midi_channel.map_or(false, |c| c != channel) {
                    debug!("Ignoring note on channel {}", channel);
                    return Handled::Ignored;
                }
                match self.framing.classify(note, velocity) {
                    Some(frame) => self.on_frame(frame),
                    None => Handled::Ignored,
                }
            }
            _ => Handled::Ignored,
        }
    }

    /// Routes a frame to the tempo collector or the note decoder.
    pub fn on_frame(&mut self, frame: Frame) -> Handled {
        let frame = self.demote_positional_start(frame);

        // Tempo markers only count between note transfers
        if self.decoder.is_idle() {
            if frame.is_marker(TRANSFER_START) && self.tempo.is_collecting() {
                let digits = self.tempo.abandon();
                warn!(
                    "Start marker while collecting tempo, discarding digits {:?}",
                    digits
                );
            }
            match self.tempo.feed(frame) {
                TempoOutcome::NotTempo => {}
                TempoOutcome::Complete(Some(bpm)) => {
                    self.host.set_tempo(bpm);
                    return Handled::Tempo(bpm);
                }
                _ => return Handled::Consumed,
            }
        }

        match self.decoder.feed(frame) {
            DecodeOutcome::Ignored => Handled::Ignored,
            DecodeOutcome::Note { note, finished } => {
                self.insert(&note);
                if finished {
                    info!("Transfer complete");
                }
                Handled::Note(note)
            }
            DecodeOutcome::Ended { received } => Handled::TransferFinished { received },
            _ => Handled::Consumed,
        }
    }

    /// Without velocity tags a 0 inside a transfer is a field value, so
    /// positional receivers only start a transfer from idle.
    fn demote_positional_start(&self, frame: Frame) -> Frame {
        if self.framing == Framing::Positional
            && !self.decoder.is_idle()
            && frame.is_marker(TRANSFER_START)
        {
            debug!("Reading 0 as data inside a positional transfer");
            return Frame::data(frame.value);
        }
        frame
    }

    fn insert(&mut self, note: &NoteEvent) {
        let ppq = self.host.ppq();
        let position_ticks = beats_to_ticks(note.position, ppq);
        let length_ticks = beats_to_ticks(note.length, ppq);
        self.host.insert_note(
            self.placement.channel,
            position_ticks,
            length_ticks,
            note.pitch,
            note.velocity,
            self.placement.pan,
        );
    }
}

/// Feeds every message from `engine` into `handler` until the engine fails.
pub fn run_listener<E, H, F>(
    engine: &mut E,
    handler: &mut MessageHandler<H>,
    mut on_handled: F,
) -> Result<(), MidiError>
where
    E: MidiEngine,
    H: SequencerHost,
    F: FnMut(&Handled, &H),
{
    info!("Listener started");
    loop {
        match engine.recv() {
            Ok(msg) => {
                let handled = handler.on_midi_message(&msg);
                on_handled(&handled, handler.host());
            }
            Err(e) => {
                error!("Listener stopping: {}", e);
                return Err(e);
            }
        }
    }
}
