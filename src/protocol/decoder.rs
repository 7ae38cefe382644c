use super::framing::{Frame, FIELDS_PER_NOTE, TRANSFER_END, TRANSFER_START};
use super::note::NoteEvent;
use log::{debug, info, warn};

/// Where the decoder is within a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingCount,
    Receiving,
}

/// What a single frame did to the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// Frame arrived while idle and carried no start marker
    Ignored,
    /// A start marker opened a transfer; `restarted` is set when an
    /// unfinished transfer was thrown away
    Started { restarted: bool },
    /// The count frame was read
    Expecting(u8),
    /// One field of the current note was stored
    Field { cursor: usize },
    /// A note was completed. `finished` is set when it was the last one the
    /// count announced.
    Note { note: NoteEvent, finished: bool },
    /// The transfer ended on an end marker or a zero count
    Ended { received: u8 },
}

/// Accumulation state for exactly one transfer.
///
/// The host's message handler owns one of these and passes every inbound
/// frame to [`DecoderState::feed`]. No frame ever blocks or waits.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderState {
    phase: Phase,
    cursor: usize,
    expected_count: u8,
    received_count: u8,
    fields: [u8; FIELDS_PER_NOTE],
}

impl Default for DecoderState {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderState {
    pub fn new() -> Self {
        DecoderState {
            phase: Phase::Idle,
            cursor: 0,
            expected_count: 0,
            received_count: 0,
            fields: [0; FIELDS_PER_NOTE],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn expected_count(&self) -> u8 {
        self.expected_count
    }

    pub fn received_count(&self) -> u8 {
        self.received_count
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Advances the state machine by one frame.
    pub fn feed(&mut self, frame: Frame) -> DecodeOutcome {
        if frame.is_marker(TRANSFER_START) {
            return self.start();
        }

        match self.phase {
            Phase::Idle => DecodeOutcome::Ignored,
            Phase::AwaitingCount => self.read_count(frame.value),
            Phase::Receiving => {
                if self.cursor == 0 && frame.is_marker(TRANSFER_END) {
                    let received = self.received_count;
                    info!(
                        "End marker after {} of {} notes",
                        received, self.expected_count
                    );
                    self.reset();
                    return DecodeOutcome::Ended { received };
                }
                self.store_field(frame.value)
            }
        }
    }

    fn start(&mut self) -> DecodeOutcome {
        let restarted = self.phase != Phase::Idle;
        if restarted {
            warn!(
                "Start marker during transfer, discarding {} of {} notes and {} pending fields",
                self.received_count, self.expected_count, self.cursor
            );
        } else {
            info!("Started receiving notes");
        }

        self.reset();
        self.phase = Phase::AwaitingCount;
        DecodeOutcome::Started { restarted }
    }

    fn read_count(&mut self, count: u8) -> DecodeOutcome {
        let count = count.min(127);
        if count == 0 {
            info!("Transfer declared zero notes");
            self.reset();
            return DecodeOutcome::Ended { received: 0 };
        }

        info!("Expecting {} notes", count);
        self.expected_count = count;
        self.received_count = 0;
        self.cursor = 0;
        self.phase = Phase::Receiving;
        DecodeOutcome::Expecting(count)
    }

    fn store_field(&mut self, value: u8) -> DecodeOutcome {
        self.fields[self.cursor] = value.min(127);
        self.cursor += 1;
        debug!("Field {} = {}", self.cursor - 1, value);

        if self.cursor < FIELDS_PER_NOTE {
            return DecodeOutcome::Field {
                cursor: self.cursor - 1,
            };
        }

        let note = NoteEvent::from_fields(self.fields);
        self.cursor = 0;
        self.fields = [0; FIELDS_PER_NOTE];
        self.received_count += 1;
        info!(
            "Note {}/{}: {}",
            self.received_count, self.expected_count, note
        );

        let finished = self.received_count >= self.expected_count;
        if finished {
            info!("Received all {} expected notes", self.expected_count);
            self.reset();
        }
        DecodeOutcome::Note { note, finished }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_data(state: &mut DecoderState, values: &[u8]) -> Vec<DecodeOutcome> {
        values.iter().map(|&v| state.feed(Frame::data(v))).collect()
    }

    #[test]
    fn test_idle_ignores_data() {
        let mut state = DecoderState::new();
        assert_eq!(state.feed(Frame::data(60)), DecodeOutcome::Ignored);
        assert_eq!(state.feed(Frame::marker(TRANSFER_END)), DecodeOutcome::Ignored);
        assert!(state.is_idle());
    }

    #[test]
    fn test_data_zero_does_not_start_transfer() {
        let mut state = DecoderState::new();
        assert_eq!(state.feed(Frame::data(0)), DecodeOutcome::Ignored);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_phase_transitions() {
        let mut state = DecoderState::new();
        assert_eq!(
            state.feed(Frame::marker(TRANSFER_START)),
            DecodeOutcome::Started { restarted: false }
        );
        assert_eq!(state.phase(), Phase::AwaitingCount);

        assert_eq!(state.feed(Frame::data(2)), DecodeOutcome::Expecting(2));
        assert_eq!(state.phase(), Phase::Receiving);
        assert_eq!(state.expected_count(), 2);
        assert_eq!(state.received_count(), 0);
    }

    #[test]
    fn test_single_note_completes_transfer() {
        let mut state = DecoderState::new();
        state.feed(Frame::marker(TRANSFER_START));
        state.feed(Frame::data(1));

        let outcomes = feed_data(&mut state, &[60, 100, 1, 5, 0, 0]);
        for (i, outcome) in outcomes[..5].iter().enumerate() {
            assert_eq!(*outcome, DecodeOutcome::Field { cursor: i });
        }
        assert_eq!(
            outcomes[5],
            DecodeOutcome::Note {
                note: NoteEvent::new(60, 100, 1.5, 0.0),
                finished: true
            }
        );
        assert!(state.is_idle());
    }

    #[test]
    fn test_end_marker_only_between_notes() {
        let mut state = DecoderState::new();
        state.feed(Frame::marker(TRANSFER_START));
        state.feed(Frame::data(3));

        // 127 inside the note window is a field value
        feed_data(&mut state, &[60, 100]);
        assert_eq!(
            state.feed(Frame::marker(TRANSFER_END)),
            DecodeOutcome::Field { cursor: 2 }
        );
        let outcomes = feed_data(&mut state, &[0, 4, 0]);
        assert_eq!(
            outcomes[2],
            DecodeOutcome::Note {
                note: NoteEvent::new(60, 100, 127.0, 4.0),
                finished: false
            }
        );

        // At a note boundary it ends the transfer early
        assert_eq!(
            state.feed(Frame::marker(TRANSFER_END)),
            DecodeOutcome::Ended { received: 1 }
        );
        assert!(state.is_idle());
    }

    #[test]
    fn test_data_127_at_note_boundary_is_pitch() {
        let mut state = DecoderState::new();
        state.feed(Frame::marker(TRANSFER_START));
        state.feed(Frame::data(1));
        assert_eq!(
            state.feed(Frame::data(127)),
            DecodeOutcome::Field { cursor: 0 }
        );
    }

    #[test]
    fn test_restart_discards_partial_note() {
        let mut state = DecoderState::new();
        state.feed(Frame::marker(TRANSFER_START));
        state.feed(Frame::data(2));
        feed_data(&mut state, &[60, 100, 1]);
        assert_eq!(state.cursor(), 3);

        assert_eq!(
            state.feed(Frame::marker(TRANSFER_START)),
            DecodeOutcome::Started { restarted: true }
        );
        assert_eq!(state.phase(), Phase::AwaitingCount);
        assert_eq!(state.cursor(), 0);

        state.feed(Frame::data(1));
        let outcomes = feed_data(&mut state, &[64, 90, 2, 0, 1, 0]);
        assert_eq!(
            outcomes[5],
            DecodeOutcome::Note {
                note: NoteEvent::new(64, 90, 2.0, 1.0),
                finished: true
            }
        );
    }

    #[test]
    fn test_restart_while_awaiting_count() {
        let mut state = DecoderState::new();
        state.feed(Frame::marker(TRANSFER_START));
        assert_eq!(
            state.feed(Frame::marker(TRANSFER_START)),
            DecodeOutcome::Started { restarted: true }
        );
        assert_eq!(state.phase(), Phase::AwaitingCount);
    }

    #[test]
    fn test_zero_count_ends_immediately() {
        let mut state = DecoderState::new();
        state.feed(Frame::marker(TRANSFER_START));
        assert_eq!(
            state.feed(Frame::data(0)),
            DecodeOutcome::Ended { received: 0 }
        );
        assert!(state.is_idle());
    }

    #[test]
    fn test_stalled_transfer_keeps_state() {
        let mut state = DecoderState::new();
        state.feed(Frame::marker(TRANSFER_START));
        state.feed(Frame::data(4));
        feed_data(&mut state, &[60, 100]);

        // Nothing but a new start marker moves a stalled transfer on
        assert_eq!(state.phase(), Phase::Receiving);
        assert_eq!(state.cursor(), 2);
        assert_eq!(state.feed(Frame::data(1)), DecodeOutcome::Field { cursor: 2 });
        assert_eq!(
            state.feed(Frame::marker(TRANSFER_START)),
            DecodeOutcome::Started { restarted: true }
        );
    }
}
