use crate::midi::{MidiEngine, MidiError, MidiMessage, Result};
use crossbeam::channel::{unbounded, Receiver};
use log::{debug, info};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "notebridge";

pub struct MidirEngine {
    #[allow(dead_code)]
    input: Option<MidiInputConnection<()>>,
    output: Option<MidiOutputConnection>,
    rx: Option<Receiver<Vec<u8>>>,
}

impl MidirEngine {
    /// Connects to the ports whose names contain the given strings. Either
    /// side may be left unconnected.
    pub fn new(input_device: Option<&str>, output_device: Option<&str>) -> Result<Self> {
        let (input, rx) = match input_device {
            Some(name) => {
                let (connection, rx) = Self::connect_input(name)?;
                (Some(connection), Some(rx))
            }
            None => (None, None),
        };

        let output = match output_device {
            Some(name) => Some(Self::connect_output(name)?),
            None => None,
        };

        Ok(MidirEngine { input, output, rx })
    }

    fn connect_input(name: &str) -> Result<(MidiInputConnection<()>, Receiver<Vec<u8>>)> {
        let mut midi_in = MidiInput::new(&format!("{}-in", CLIENT_NAME))?;
        midi_in.ignore(Ignore::None);

        let in_ports = midi_in.ports();
        let in_port = in_ports
            .iter()
            .find(|p| midi_in.port_name(p).unwrap_or_default().contains(name))
            .ok_or_else(|| {
                MidiError::ConnectionError(format!("Input device '{}' not found", name))
            })?;
        let port_name = midi_in.port_name(in_port)?;
        info!("Connecting to MIDI input port: {}", port_name);

        let (tx, rx) = unbounded();
        let connection = midi_in.connect(
            in_port,
            &format!("{}-input", CLIENT_NAME),
            move |stamp, message, _| {
                debug!("MIDI in @{}: {:02X?}", stamp, message);
                let _ = tx.send(message.to_vec());
            },
            (),
        )?;
        Ok((connection, rx))
    }

    fn connect_output(name: &str) -> Result<MidiOutputConnection> {
        let midi_out = MidiOutput::new(&format!("{}-out", CLIENT_NAME))?;

        let out_ports = midi_out.ports();
        let out_port = out_ports
            .iter()
            .find(|p| midi_out.port_name(p).unwrap_or_default().contains(name))
            .ok_or_else(|| {
                MidiError::ConnectionError(format!("Output device '{}' not found", name))
            })?;
        let port_name = midi_out.port_name(out_port)?;
        info!("Connecting to MIDI output port: {}", port_name);

        Ok(midi_out.connect(out_port, &format!("{}-output", CLIENT_NAME))?)
    }

    /// Names of every input and output port, tagged with their direction.
    pub fn list_devices() -> Vec<String> {
        let mut devices = Vec::new();

        if let Ok(midi_in) = MidiInput::new(&format!("{}-list-in", CLIENT_NAME)) {
            for port in midi_in.ports() {
                if let Ok(name) = midi_in.port_name(&port) {
                    devices.push(format!("{} [Input]", name));
                }
            }
        }

        if let Ok(midi_out) = MidiOutput::new(&format!("{}-list-out", CLIENT_NAME)) {
            for port in midi_out.ports() {
                if let Ok(name) = midi_out.port_name(&port) {
                    devices.push(format!("{} [Output]", name));
                }
            }
        }

        devices
    }
}

impl MidiEngine for MidirEngine {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| MidiError::SendError("No output connection".to_string()))?;
        output.send(&msg.to_bytes())?;
        Ok(())
    }

    fn recv(&mut self) -> Result<MidiMessage> {
        let rx = self
            .rx
            .as_ref()
            .ok_or_else(|| MidiError::RecvError("No input connection".to_string()))?;

        loop {
            let data = rx.recv()?;
            match MidiMessage::from_bytes(&data) {
                Some(msg) => return Ok(msg),
                None => debug!("Skipping unsupported MIDI message {:02X?}", data),
            }
        }
    }
}
