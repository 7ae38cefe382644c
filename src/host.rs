//! Sequencer-host side of the bridge
//!
//! The decoder never talks to a sequencer directly. It goes through
//! [`SequencerHost`], which exposes exactly the two operations the protocol
//! needs. [`Timeline`] is the in-memory implementation used by `listen` and
//! by the tests.

use crate::protocol::NoteEvent;
use log::info;

pub const DEFAULT_PPQ: u32 = 96;
pub const CENTER_PAN: u8 = 64;

/// Operations provided by the sequencer host. Both are treated as
/// infallible side effects.
pub trait SequencerHost {
    fn insert_note(
        &mut self,
        channel: u8,
        position_ticks: u32,
        length_ticks: u32,
        pitch: u8,
        velocity: u8,
        pan: u8,
    );

    fn set_tempo(&mut self, bpm: u32);

    /// Ticks per quarter note
    fn ppq(&self) -> u32 {
        DEFAULT_PPQ
    }
}

pub fn beats_to_ticks(beats: f64, ppq: u32) -> u32 {
    let ticks = (beats * f64::from(ppq)).round();
    if ticks <= 0.0 {
        0
    } else if ticks >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        ticks as u32
    }
}

/// A note as the host stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedNote {
    pub channel: u8,
    pub position_ticks: u32,
    pub length_ticks: u32,
    pub pitch: u8,
    pub velocity: u8,
    pub pan: u8,
}

impl PlacedNote {
    /// Converts back to beats, rounded to the protocol's tenth-of-a-beat grid.
    pub fn to_note_event(&self, ppq: u32) -> NoteEvent {
        let to_beats = |ticks: u32| (f64::from(ticks) * 10.0 / f64::from(ppq)).round() / 10.0;
        NoteEvent::new(
            self.pitch,
            self.velocity,
            to_beats(self.length_ticks),
            to_beats(self.position_ticks),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Timeline {
    ppq: u32,
    notes: Vec<PlacedNote>,
    tempo: Option<u32>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_PPQ)
    }
}

impl Timeline {
    pub fn new(ppq: u32) -> Self {
        Timeline {
            ppq: ppq.max(1),
            notes: Vec::new(),
            tempo: None,
        }
    }

    pub fn notes(&self) -> &[PlacedNote] {
        &self.notes
    }

    pub fn tempo(&self) -> Option<u32> {
        self.tempo
    }

    pub fn note_events(&self) -> Vec<NoteEvent> {
        self.notes
            .iter()
            .map(|n| n.to_note_event(self.ppq))
            .collect()
    }

    /// The received notes in `pitch,velocity,length,position` form, one per line.
    pub fn to_note_lines(&self) -> String {
        self.note_events()
            .iter()
            .map(|note| format!("{}\n", note))
            .collect()
    }
}

impl SequencerHost for Timeline {
    fn insert_note(
        &mut self,
        channel: u8,
        position_ticks: u32,
        length_ticks: u32,
        pitch: u8,
        velocity: u8,
        pan: u8,
    ) {
        info!(
            "Inserted note {} vel {} at tick {} for {} ticks on channel {}",
            pitch, velocity, position_ticks, length_ticks, channel
        );
        self.notes.push(PlacedNote {
            channel,
            position_ticks,
            length_ticks,
            pitch,
            velocity,
            pan,
        });
    }

    fn set_tempo(&mut self, bpm: u32) {
        info!("Tempo set to {} BPM", bpm);
        self.tempo = Some(bpm);
    }

    fn ppq(&self) -> u32 {
        self.ppq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beats_to_ticks() {
        assert_eq!(beats_to_ticks(1.0, 96), 96);
        assert_eq!(beats_to_ticks(0.3, 96), 29);
        assert_eq!(beats_to_ticks(0.0, 96), 0);
        assert_eq!(beats_to_ticks(127.9, 960), 122_784);
    }

    #[test]
    fn test_placed_note_back_to_beats() {
        let placed = PlacedNote {
            channel: 0,
            position_ticks: beats_to_ticks(12.3, 96),
            length_ticks: beats_to_ticks(0.5, 96),
            pitch: 60,
            velocity: 100,
            pan: CENTER_PAN,
        };
        assert_eq!(placed.to_note_event(96), NoteEvent::new(60, 100, 0.5, 12.3));
    }

    #[test]
    fn test_timeline_records_notes_and_tempo() {
        let mut timeline = Timeline::new(96);
        timeline.insert_note(2, 0, 48, 60, 100, CENTER_PAN);
        timeline.set_tempo(140);

        assert_eq!(timeline.notes().len(), 1);
        assert_eq!(timeline.notes()[0].channel, 2);
        assert_eq!(timeline.tempo(), Some(140));
        assert_eq!(timeline.to_note_lines(), "60,100,0.5,0.0\n");
    }
}
