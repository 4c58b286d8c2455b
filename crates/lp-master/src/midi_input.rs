//! External MIDI input feeding the link-sync queue.
//!
//! The backend delivers messages on its own thread; each real-time status
//! byte is pushed into the [`MidiSender`] end of the queue and picked up by
//! the frame loop on its next iteration.

use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{info, warn};

use crate::error::MidiError;
use crate::midi::MidiSender;

/// Port opened when no name is given and a port with this exact name exists.
pub const PREFERRED_PORT: &str = "M8";

const CLIENT_NAME: &str = "linkpace";

/// Pick an input port from `names`.
///
/// With `wanted`, an exact name match wins over the first port containing
/// it. Without, [`PREFERRED_PORT`] wins, then the last port listed.
pub fn select_port(names: &[String], wanted: Option<&str>) -> Option<usize> {
    match wanted {
        Some(wanted) => names
            .iter()
            .position(|name| name == wanted)
            .or_else(|| names.iter().position(|name| name.contains(wanted))),
        None => names
            .iter()
            .position(|name| name == PREFERRED_PORT)
            .or_else(|| names.len().checked_sub(1)),
    }
}

/// Names of the available MIDI input ports.
pub fn midi_input_names() -> Result<Vec<String>, MidiError> {
    let input = MidiInput::new(CLIENT_NAME)?;
    Ok(named_ports(&input).into_iter().map(|(_, name)| name).collect())
}

fn named_ports(input: &MidiInput) -> Vec<(MidiInputPort, String)> {
    input
        .ports()
        .into_iter()
        .filter_map(|port| match input.port_name(&port) {
            Ok(name) => Some((port, name)),
            Err(e) => {
                warn!("skipping MIDI input port without a name: {}", e);
                None
            }
        })
        .collect()
}

/// Forward the status byte of one incoming message.
fn forward(message: &[u8], sender: &mut MidiSender) {
    if let Some(&status) = message.first() {
        sender.send_status(status);
    }
}

/// An input port chosen by [`select_port`], not yet connected.
pub struct MidiPort {
    input: MidiInput,
    port: MidiInputPort,
    name: String,
}

impl MidiPort {
    pub fn find(wanted: Option<&str>) -> Result<Self, MidiError> {
        let mut input = MidiInput::new(CLIENT_NAME)?;
        // Timing clock must get through; sysex and active sensing are noise here.
        input.ignore(Ignore::SysexAndActiveSense);

        let mut ports = named_ports(&input);
        for (i, (_, name)) in ports.iter().enumerate() {
            info!(index = i, name = %name, "MIDI input port");
        }

        let names: Vec<String> = ports.iter().map(|(_, name)| name.clone()).collect();
        let Some(index) = select_port(&names, wanted) else {
            return Err(match wanted {
                Some(wanted) => MidiError::PortNotFound(wanted.to_string()),
                None => MidiError::NoPorts,
            });
        };
        let (port, name) = ports.swap_remove(index);
        Ok(Self { input, port, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start forwarding messages into `sender`.
    pub fn connect(self, sender: MidiSender) -> Result<MidiInputLink, MidiError> {
        let Self { input, port, name } = self;
        let connection = input
            .connect(
                &port,
                "linkpace-in",
                |_stamp, message, sender: &mut MidiSender| forward(message, sender),
                sender,
            )
            .map_err(|e| MidiError::Connect {
                port: name.clone(),
                reason: e.to_string(),
            })?;

        info!(port = %name, "MIDI input opened");
        Ok(MidiInputLink {
            connection,
            port: name,
        })
    }
}

/// Open connection from a MIDI input port into the link-sync queue.
///
/// Dropping it closes the port.
pub struct MidiInputLink {
    connection: MidiInputConnection<MidiSender>,
    port: String,
}

impl MidiInputLink {
    pub fn open(sender: MidiSender, wanted: Option<&str>) -> Result<Self, MidiError> {
        MidiPort::find(wanted)?.connect(sender)
    }

    pub fn port_name(&self) -> &str {
        &self.port
    }

    /// Close the port and hand back the queue end.
    pub fn close(self) -> MidiSender {
        info!(port = %self.port, "closing MIDI input");
        let (_input, sender) = self.connection.close();
        sender
    }
}
