use std::fmt;

/// Largest length/position expressible on the wire, in tenths of a beat (127.9).
const MAX_TENTHS: u32 = 127 * 10 + 9;

/// A note tuple exactly as the caller supplied it, before any clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNote {
    pub pitch: i64,
    pub velocity: i64,
    pub length: f64,
    pub position: f64,
}

impl RawNote {
    pub fn new(pitch: i64, velocity: i64, length: f64, position: f64) -> Self {
        RawNote {
            pitch,
            velocity,
            length,
            position,
        }
    }
}

/// A note ready for transfer. Lengths and positions are in beats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: u8,
    pub length: f64,
    pub position: f64,
}

impl NoteEvent {
    pub fn new(pitch: u8, velocity: u8, length: f64, position: f64) -> Self {
        NoteEvent {
            pitch,
            velocity,
            length,
            position,
        }
    }

    /// Clamps a raw tuple into the transferable domain.
    ///
    /// Pitch and velocity end up in 0..=127, length and position are rounded
    /// to the nearest tenth of a beat and limited to 0.0..=127.9.
    pub fn normalized(raw: RawNote) -> Self {
        NoteEvent {
            pitch: clamp_7bit(raw.pitch),
            velocity: clamp_7bit(raw.velocity),
            length: from_tenths(to_tenths(raw.length)),
            position: from_tenths(to_tenths(raw.position)),
        }
    }

    /// The six wire fields in transmission order.
    pub fn fields(&self) -> [u8; 6] {
        let (length_whole, length_decimal) = split_beats(self.length);
        let (position_whole, position_decimal) = split_beats(self.position);
        [
            self.pitch.min(127),
            self.velocity.min(127),
            length_whole,
            length_decimal,
            position_whole,
            position_decimal,
        ]
    }

    /// Rebuilds a note from the six wire fields. Decimal digits above 9 are
    /// clamped to 9.
    pub fn from_fields(fields: [u8; 6]) -> Self {
        NoteEvent {
            pitch: fields[0].min(127),
            velocity: fields[1].min(127),
            length: join_beats(fields[2], fields[3]),
            position: join_beats(fields[4], fields[5]),
        }
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{:.1},{:.1}",
            self.pitch, self.velocity, self.length, self.position
        )
    }
}

fn clamp_7bit(value: i64) -> u8 {
    value.clamp(0, 127) as u8
}

fn to_tenths(beats: f64) -> u32 {
    if beats.is_nan() || beats <= 0.0 {
        return 0;
    }
    let tenths = (beats * 10.0).round();
    if tenths >= f64::from(MAX_TENTHS) {
        MAX_TENTHS
    } else {
        tenths as u32
    }
}

// Single division keeps decoded values equal to their one-decimal literals.
fn from_tenths(tenths: u32) -> f64 {
    f64::from(tenths) / 10.0
}

/// Splits beats into a whole part (0..=127) and a tenths digit (0..=9).
pub(crate) fn split_beats(beats: f64) -> (u8, u8) {
    let tenths = to_tenths(beats);
    ((tenths / 10) as u8, (tenths % 10) as u8)
}

pub(crate) fn join_beats(whole: u8, decimal: u8) -> f64 {
    from_tenths(u32::from(whole.min(127)) * 10 + u32::from(decimal.min(9)))
}
