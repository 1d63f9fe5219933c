//! Trait for the outbound transport of slot updates.

use std::convert::Infallible;

use crate::occupancy::{SlotField, SlotMessage, SlotValue};

/// Trait for transports publishing slot updates.
///
/// Implement this to connect the occupancy table to a pub/sub transport;
/// each message is addressed by `SlotMessage::address`.
///
/// # Example
///
/// ```ignore
/// use zone_occupancy::{SlotSink, SlotMessage};
///
/// struct UdpSink { /* socket */ }
///
/// impl SlotSink for UdpSink {
///     type Error = std::io::Error;
///
///     fn send(&mut self, message: SlotMessage) -> Result<(), Self::Error> {
///         // encode and send `message.address()` with `message.value`
///         Ok(())
///     }
/// }
/// ```
pub trait SlotSink {
    /// Error type for transport failures.
    type Error;

    fn send(&mut self, message: SlotMessage) -> Result<(), Self::Error>;
}

impl<S: SlotSink + ?Sized> SlotSink for &mut S {
    type Error = S::Error;

    fn send(&mut self, message: SlotMessage) -> Result<(), Self::Error> {
        (**self).send(message)
    }
}

/// Keeps every message in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    messages: Vec<SlotMessage>,
}

impl RecordingSink {
    pub fn messages(&self) -> &[SlotMessage] {
        &self.messages
    }

    /// Most recent value sent for one field of one slot.
    pub fn latest(&self, slot: usize, field: SlotField) -> Option<SlotValue> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.slot == slot && m.field == field)
            .map(|m| m.value)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl SlotSink for RecordingSink {
    type Error = Infallible;

    fn send(&mut self, message: SlotMessage) -> Result<(), Self::Error> {
        self.messages.push(message);
        Ok(())
    }
}

/// Logs every message instead of sending it anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl SlotSink for TracingSink {
    type Error = Infallible;

    fn send(&mut self, message: SlotMessage) -> Result<(), Self::Error> {
        tracing::info!(address = %message.address(), value = %message.value, "slot update");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(slot: usize, field: SlotField, value: SlotValue) -> SlotMessage {
        SlotMessage { slot, field, value }
    }

    #[test]
    fn test_recording_sink_latest() {
        let mut sink = RecordingSink::default();
        sink.send(message(0, SlotField::Position, SlotValue::Float(10.0)))
            .unwrap();
        sink.send(message(1, SlotField::Position, SlotValue::Float(20.0)))
            .unwrap();
        sink.send(message(0, SlotField::Position, SlotValue::Float(30.0)))
            .unwrap();

        assert_eq!(
            sink.latest(0, SlotField::Position),
            Some(SlotValue::Float(30.0))
        );
        assert_eq!(sink.latest(0, SlotField::Moving), None);

        sink.clear();
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_sink_by_mutable_reference() {
        fn push<S: SlotSink>(mut sink: S) -> Result<(), S::Error> {
            sink.send(message(2, SlotField::Inside, SlotValue::Int(1)))
        }

        let mut sink = RecordingSink::default();
        push(&mut sink).unwrap();
        push(&mut sink).unwrap();
        assert_eq!(sink.messages().len(), 2);
    }
}
