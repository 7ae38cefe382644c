use crate::midi::{MidiEngine, MidiError, MidiMessage, Result};
use std::collections::VecDeque;

/// In-memory engine: records everything sent and replays a queue of
/// inbound messages.
#[derive(Debug, Default)]
pub struct MockMidiEngine {
    sent: Vec<MidiMessage>,
    inbox: VecDeque<MidiMessage>,
    fail_after: Option<usize>,
}

impl MockMidiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inbox<I>(messages: I) -> Self
    where
        I: IntoIterator<Item = MidiMessage>,
    {
        MockMidiEngine {
            inbox: messages.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Makes every send after the first `count` fail.
    pub fn failing_after(count: usize) -> Self {
        MockMidiEngine {
            fail_after: Some(count),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> &[MidiMessage] {
        &self.sent
    }

    pub fn push_inbound(&mut self, msg: MidiMessage) {
        self.inbox.push_back(msg);
    }
}

impl MidiEngine for MockMidiEngine {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        if let Some(limit) = self.fail_after {
            if self.sent.len() >= limit {
                return Err(MidiError::SendError("Mock output closed".to_string()));
            }
        }
        self.sent.push(msg);
        Ok(())
    }

    fn recv(&mut self) -> Result<MidiMessage> {
        self.inbox
            .pop_front()
            .ok_or_else(|| MidiError::RecvError("Mock inbox empty".to_string()))
    }
}
