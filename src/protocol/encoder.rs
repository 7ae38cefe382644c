use super::framing::{Frame, FIELDS_PER_NOTE, MAX_NOTE_COUNT, TRANSFER_END, TRANSFER_START};
use super::note::{NoteEvent, RawNote};
use log::{debug, warn};
use std::error::Error;
use std::fmt;

/// Why a `pitch,velocity,length,position` line was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The line did not have exactly four comma-separated fields
    FieldCount(usize),
    /// A field could not be read as a number
    InvalidNumber { field: &'static str, text: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::FieldCount(count) => write!(f, "expected 4 fields, found {}", count),
            ParseError::InvalidNumber { field, text } => {
                write!(f, "invalid {} value '{}'", field, text)
            }
        }
    }
}

impl Error for ParseError {}

/// Per-line result of reading note text, used for the sender's summary.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Accepted { line: usize, note: NoteEvent },
    Skipped { line: usize, text: String, reason: ParseError },
}

const FIELD_NAMES: [&str; 4] = ["pitch", "velocity", "length", "position"];

/// Whole numbers for pitch and velocity. Decimals are truncated and values
/// beyond `i64` saturate, so clamping later sees every numeric input.
fn parse_int(field: usize, text: &str) -> Result<i64, ParseError> {
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }
    parse_beats(field, text).map(|value| value.trunc() as i64)
}

fn parse_beats(field: usize, text: &str) -> Result<f64, ParseError> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::InvalidNumber {
            field: FIELD_NAMES[field],
            text: text.to_string(),
        }),
    }
}

/// Reads one `pitch,velocity,length,position` line without clamping.
pub fn parse_note_line(line: &str) -> Result<RawNote, ParseError> {
    let parts: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(ParseError::FieldCount(parts.len()));
    }

    Ok(RawNote {
        pitch: parse_int(0, parts[0])?,
        velocity: parse_int(1, parts[1])?,
        length: parse_beats(2, parts[2])?,
        position: parse_beats(3, parts[3])?,
    })
}

/// Reads note text line by line. Blank lines are dropped, malformed lines
/// are reported as skipped and the rest are normalized.
pub fn parse_note_lines(text: &str) -> Vec<LineOutcome> {
    let mut outcomes = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let line_number = index + 1;
        match parse_note_line(line) {
            Ok(raw) => {
                let note = NoteEvent::normalized(raw);
                debug!("Line {}: accepted note {}", line_number, note);
                outcomes.push(LineOutcome::Accepted {
                    line: line_number,
                    note,
                });
            }
            Err(reason) => {
                warn!("Skipping line {} '{}': {}", line_number, line.trim(), reason);
                outcomes.push(LineOutcome::Skipped {
                    line: line_number,
                    text: line.trim().to_string(),
                    reason,
                });
            }
        }
    }

    outcomes
}

/// An ordered list of notes about to be framed and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    notes: Vec<NoteEvent>,
}

impl Transfer {
    /// Returns `None` when there is nothing to send.
    pub fn new(notes: Vec<NoteEvent>) -> Option<Self> {
        if notes.is_empty() {
            None
        } else {
            Some(Transfer { notes })
        }
    }

    pub fn from_raw(raw: &[RawNote]) -> Option<Self> {
        Self::new(raw.iter().copied().map(NoteEvent::normalized).collect())
    }

    pub fn from_outcomes(outcomes: &[LineOutcome]) -> Option<Self> {
        Self::new(
            outcomes
                .iter()
                .filter_map(|outcome| match outcome {
                    LineOutcome::Accepted { note, .. } => Some(*note),
                    LineOutcome::Skipped { .. } => None,
                })
                .collect(),
        )
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    /// The value sent in the count frame.
    pub fn declared_count(&self) -> u8 {
        self.notes.len().min(usize::from(MAX_NOTE_COUNT)) as u8
    }

    /// True when the count frame cannot represent the real note count.
    pub fn is_saturated(&self) -> bool {
        self.notes.len() > usize::from(MAX_NOTE_COUNT)
    }

    /// Start marker, count, six frames per note, end marker.
    pub fn frames(&self) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(self.notes.len() * FIELDS_PER_NOTE + 3);
        frames.push(Frame::marker(TRANSFER_START));
        frames.push(Frame::data(self.declared_count()));
        for note in &self.notes {
            frames.extend(note.fields().iter().map(|&value| Frame::data(value)));
        }
        frames.push(Frame::marker(TRANSFER_END));
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let raw = parse_note_line(" 60, 100, 1.5, 0.0 ").unwrap();
        assert_eq!(raw, RawNote::new(60, 100, 1.5, 0.0));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        assert_eq!(
            parse_note_line("60,100,1.0"),
            Err(ParseError::FieldCount(3))
        );
    }

    #[test]
    fn test_parse_non_numeric() {
        match parse_note_line("C4,100,1.0,0.0") {
            Err(ParseError::InvalidNumber { field, text }) => {
                assert_eq!(field, "pitch");
                assert_eq!(text, "C4");
            }
            other => panic!("Expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_decimal_and_huge_pitch_velocity() {
        assert_eq!(
            parse_note_line("60.0,99.7,1.0,0.0").unwrap(),
            RawNote::new(60, 99, 1.0, 0.0)
        );
        let raw = parse_note_line("99999999999999999999,-1e30,1.0,0.0").unwrap();
        assert_eq!(raw.pitch, i64::MAX);
        assert_eq!(raw.velocity, i64::MIN);

        let note = NoteEvent::normalized(raw);
        assert_eq!((note.pitch, note.velocity), (127, 0));
        assert!(parse_note_line("inf,100,1.0,0.0").is_err());
    }

    #[test]
    fn test_parse_rejects_non_finite_beats() {
        assert!(parse_note_line("60,100,inf,0.0").is_err());
        assert!(parse_note_line("60,100,1.0,NaN").is_err());
    }

    #[test]
    fn test_lines_skip_malformed_and_blank() {
        let outcomes = parse_note_lines("60,100,1.0\n\n60,100,1.0,0.0\n");
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], LineOutcome::Skipped { line: 1, .. }));
        assert!(matches!(outcomes[1], LineOutcome::Accepted { line: 3, .. }));
        let transfer = Transfer::from_outcomes(&outcomes).unwrap();
        assert_eq!(transfer.notes().len(), 1);
    }

    #[test]
    fn test_empty_transfer_is_rejected() {
        assert!(Transfer::new(Vec::new()).is_none());
        assert!(Transfer::from_outcomes(&parse_note_lines("bad\n1,2")).is_none());
    }

    #[test]
    fn test_frame_layout() {
        let transfer = Transfer::new(vec![NoteEvent::new(60, 100, 1.5, 2.0)]).unwrap();
        let values: Vec<u8> = transfer.frames().iter().map(|f| f.value).collect();
        assert_eq!(values, vec![0, 1, 60, 100, 1, 5, 2, 0, 127]);

        let frames = transfer.frames();
        assert!(frames[0].marker);
        assert!(frames[1..frames.len() - 1].iter().all(|f| !f.marker));
        assert!(frames[frames.len() - 1].marker);
    }

    #[test]
    fn test_count_saturates() {
        let notes = vec![NoteEvent::new(60, 100, 1.0, 0.0); 200];
        let transfer = Transfer::new(notes).unwrap();
        assert_eq!(transfer.declared_count(), 127);
        assert!(transfer.is_saturated());
        assert_eq!(transfer.frames().len(), 200 * 6 + 3);
    }
}
