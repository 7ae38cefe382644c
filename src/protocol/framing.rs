/// Start-of-transfer marker.
pub const TRANSFER_START: u8 = 0;
/// End-of-transfer marker. Only honoured outside an in-progress note.
pub const TRANSFER_END: u8 = 127;
/// Begins a tempo digit sequence.
pub const TEMPO_START: u8 = 72;
/// Ends a tempo digit sequence and applies it.
pub const TEMPO_END: u8 = 73;

/// Pitch, velocity, length whole/decimal, position whole/decimal.
pub const FIELDS_PER_NOTE: usize = 6;

/// The count frame saturates here; longer transfers still send every note.
pub const MAX_NOTE_COUNT: u8 = 127;

/// One 7-bit value on the wire.
///
/// `marker` records whether the value was sent as a protocol marker. The
/// sender encodes it in the note-on velocity; a receiver running positional
/// framing treats every frame as a possible marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub value: u8,
    pub marker: bool,
}

impl Frame {
    pub fn data(value: u8) -> Self {
        Frame {
            value: value.min(127),
            marker: false,
        }
    }

    pub fn marker(value: u8) -> Self {
        Frame {
            value: value.min(127),
            marker: true,
        }
    }

    pub fn is_marker(&self, value: u8) -> bool {
        self.marker && self.value == value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_values_are_seven_bit() {
        assert_eq!(Frame::data(200).value, 127);
        assert_eq!(Frame::marker(255).value, 127);
    }

    #[test]
    fn test_marker_matching() {
        assert!(Frame::marker(TRANSFER_START).is_marker(TRANSFER_START));
        assert!(!Frame::data(TRANSFER_START).is_marker(TRANSFER_START));
        assert!(!Frame::marker(TRANSFER_END).is_marker(TRANSFER_START));
    }

    #[test]
    fn test_markers_are_distinct() {
        let markers = [TRANSFER_START, TRANSFER_END, TEMPO_START, TEMPO_END];
        for (i, a) in markers.iter().enumerate() {
            for b in &markers[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
