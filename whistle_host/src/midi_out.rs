use anyhow::{anyhow, bail, Result};
use micro_whistle::midi::MidiEvent;
use midir::{MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "micro-whistle";

/// A destination for MIDI messages outside the audio thread.
pub trait EventPort {
    fn send(&mut self, event: &MidiEvent) -> Result<()>;
}

/// An open MIDI output port.
pub struct MidiPort {
    connection: MidiOutputConnection,
    name: String,
}

impl MidiPort {
    pub fn port_names() -> Result<Vec<String>> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        Ok(midi_out
            .ports()
            .iter()
            .filter_map(|port| midi_out.port_name(port).ok())
            .collect())
    }

    /// Connects to the first port whose name contains `port_name`, or to the first
    /// available port if `port_name` is `None`.
    pub fn connect(port_name: Option<&str>) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let ports = midi_out.ports();
        let port = ports.iter().find(|port| match port_name {
            Some(wanted) => midi_out
                .port_name(port)
                .map(|name| name.contains(wanted))
                .unwrap_or(false),
            None => true,
        });
        let port = match (port, port_name) {
            (Some(port), _) => port,
            (None, Some(wanted)) => bail!("No MIDI output port matching \"{}\"", wanted),
            (None, None) => bail!("No MIDI output ports available"),
        };
        let name = midi_out.port_name(port)?;
        let connection = midi_out
            .connect(port, "whistle-output")
            .map_err(|error| anyhow!("Failed to connect to MIDI port \"{}\": {}", name, error))?;
        log::info!("Using MIDI output port \"{}\"", name);
        Ok(MidiPort { connection, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl EventPort for MidiPort {
    fn send(&mut self, event: &MidiEvent) -> Result<()> {
        self.connection
            .send(&event.to_bytes())
            .map_err(|error| anyhow!("Failed to send MIDI message to \"{}\": {}", self.name, error))
    }
}

/// Note name with octave, `note_name(60) == "C4"`.
pub fn note_name(note_number: u8) -> String {
    let note_names = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = (note_number / 12) as i32 - 1;
    format!("{}{}", note_names[(note_number % 12) as usize], octave)
}

/// A one line description of `event` for logging.
pub fn describe(event: &MidiEvent) -> String {
    match *event {
        MidiEvent::NoteOn {
            channel,
            note,
            velocity,
        } => format!(
            "note on  {:>4} ({:3}) velocity {:3}, channel {}",
            note_name(note),
            note,
            velocity,
            channel + 1
        ),
        MidiEvent::NoteOff { channel, note, .. } => format!(
            "note off {:>4} ({:3}), channel {}",
            note_name(note),
            note,
            channel + 1
        ),
        MidiEvent::ControlChange {
            channel,
            controller,
            value,
        } => format!("cc {:3} = {:3}, channel {}", controller, value, channel + 1),
    }
}
