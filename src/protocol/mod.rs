//! Note-transfer protocol
//!
//! This module turns note events into 7-bit frames and back again:
//! - [`Frame`] and the reserved marker values shared by both sides
//! - [`Transfer`] for building the framed value sequence of a note list
//! - [`DecoderState`] for the incremental, one-frame-at-a-time decoder
//! - [`TempoState`] and [`tempo_frames`] for the tempo digit sequence
//!
//! Nothing in here touches a MIDI port; see [`crate::sender`] and
//! [`crate::receiver`] for the wire side.
//!
mod decoder;
mod encoder;
mod framing;
mod note;
mod tempo;

pub use decoder::{DecodeOutcome, DecoderState, Phase};
pub use encoder::{parse_note_line, parse_note_lines, LineOutcome, ParseError, Transfer};
pub use framing::{
    Frame, FIELDS_PER_NOTE, MAX_NOTE_COUNT, TEMPO_END, TEMPO_START, TRANSFER_END, TRANSFER_START,
};
pub use note::{NoteEvent, RawNote};
pub use tempo::{
    bpm_to_digits, clamp_bpm, digits_to_bpm, has_marker_valued_digit, tempo_frames, TempoOutcome,
    TempoState, MAX_BPM, MIN_BPM,
};
