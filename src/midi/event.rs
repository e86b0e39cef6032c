use alloc::vec::Vec;
use core::convert::Infallible;

/// The controller number of the MIDI expression controller.
pub const EXPRESSION_CONTROLLER: u8 = 11;

/// A channel voice message. Channels are in `0..=15`, data bytes in `0..=127`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiEvent {
    /// The three byte wire representation of the event.
    pub fn to_bytes(&self) -> [u8; 3] {
        match *self {
            MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            } => [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiEvent::NoteOff {
                channel,
                note,
                velocity,
            } => [0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiEvent::ControlChange {
                channel,
                controller,
                value,
            } => [0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F],
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. } => channel,
        }
    }
}

/// A destination for MIDI events.
///
/// Sinks driven from an audio callback must not block. Delivery is fire-and-forget:
/// a failed send is reported to the caller, nothing is retried.
pub trait EventSink {
    type Error;

    fn send(&mut self, event: MidiEvent) -> Result<(), Self::Error>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    type Error = S::Error;

    fn send(&mut self, event: MidiEvent) -> Result<(), Self::Error> {
        (**self).send(event)
    }
}

/// Collects events in memory. Pushing may allocate, so this is meant for
/// offline processing and tests rather than audio callbacks.
impl EventSink for Vec<MidiEvent> {
    type Error = Infallible;

    fn send(&mut self, event: MidiEvent) -> Result<(), Self::Error> {
        self.push(event);
        Ok(())
    }
}

/// Queues events for another thread without blocking or allocating. Fails
/// if the queue is full.
#[cfg(feature = "rtrb")]
impl EventSink for rtrb::Producer<MidiEvent> {
    type Error = rtrb::PushError<MidiEvent>;

    fn send(&mut self, event: MidiEvent) -> Result<(), Self::Error> {
        self.push(event)
    }
}
