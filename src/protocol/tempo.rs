use super::framing::{Frame, TEMPO_END, TEMPO_START, TRANSFER_START};
use log::{debug, info, warn};

pub const MIN_BPM: u32 = 20;
pub const MAX_BPM: u32 = 999;

pub fn clamp_bpm(bpm: i64) -> u32 {
    bpm.clamp(i64::from(MIN_BPM), i64::from(MAX_BPM)) as u32
}

/// Base-128 digits, most significant first. Zero is the single digit 0.
pub fn bpm_to_digits(value: u32) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }

    let mut digits = Vec::new();
    let mut rest = value;
    while rest > 0 {
        digits.push((rest & 0x7F) as u8);
        rest >>= 7;
    }
    digits.reverse();
    digits
}

/// Folds received digits back into a tempo, clamped to the valid range.
pub fn digits_to_bpm(digits: &[u8]) -> u32 {
    let value = digits.iter().fold(0u64, |acc, &digit| {
        acc.saturating_mul(128)
            .saturating_add(u64::from(digit.min(127)))
    });
    value.clamp(u64::from(MIN_BPM), u64::from(MAX_BPM)) as u32
}

/// True when a receiver that ignores velocity would read one of the digits
/// as a marker: 72 restarts collection, 73 ends it, 0 starts a note transfer.
pub fn has_marker_valued_digit(digits: &[u8]) -> bool {
    digits
        .iter()
        .any(|&d| d == TEMPO_START || d == TEMPO_END || d == TRANSFER_START)
}

/// Tempo start marker, digits, tempo end marker.
pub fn tempo_frames(bpm: i64) -> Vec<Frame> {
    let clamped = clamp_bpm(bpm);
    if i64::from(clamped) != bpm {
        warn!("BPM {} is outside {}-{}, using {}", bpm, MIN_BPM, MAX_BPM, clamped);
    }

    let digits = bpm_to_digits(clamped);
    if has_marker_valued_digit(&digits) {
        warn!(
            "Tempo digits {:?} contain a marker value; positional receivers will misread them",
            digits
        );
    }

    let mut frames = Vec::with_capacity(digits.len() + 2);
    frames.push(Frame::marker(TEMPO_START));
    frames.extend(digits.into_iter().map(Frame::data));
    frames.push(Frame::marker(TEMPO_END));
    frames
}

/// Result of passing a frame to [`TempoState::feed`].
#[derive(Debug, Clone, PartialEq)]
pub enum TempoOutcome {
    /// The frame is not part of a tempo sequence
    NotTempo,
    Started,
    Digit(u8),
    /// The end marker arrived; `None` when no digits were collected
    Complete(Option<u32>),
}

/// Digit collection between the tempo markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempoState {
    collecting: bool,
    digits: Vec<u8>,
}

impl TempoState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Drops an unfinished sequence, returning the digits collected so far.
    pub fn abandon(&mut self) -> Vec<u8> {
        self.collecting = false;
        std::mem::take(&mut self.digits)
    }

    pub fn feed(&mut self, frame: Frame) -> TempoOutcome {
        if !self.collecting {
            if frame.is_marker(TEMPO_START) {
                debug!("Started collecting tempo digits");
                self.collecting = true;
                self.digits.clear();
                return TempoOutcome::Started;
            }
            return TempoOutcome::NotTempo;
        }

        if frame.is_marker(TEMPO_END) {
            self.collecting = false;
            let digits = std::mem::take(&mut self.digits);
            if digits.is_empty() {
                info!("No tempo digits collected, tempo unchanged");
                return TempoOutcome::Complete(None);
            }
            let bpm = digits_to_bpm(&digits);
            info!("Tempo {} BPM from digits {:?}", bpm, digits);
            return TempoOutcome::Complete(Some(bpm));
        }

        if frame.is_marker(TEMPO_START) {
            warn!("Tempo start marker while collecting, discarding {:?}", self.digits);
            self.digits.clear();
            return TempoOutcome::Started;
        }

        self.digits.push(frame.value);
        TempoOutcome::Digit(frame.value)
    }
}
