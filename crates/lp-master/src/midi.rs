//! Queue carrying MIDI real-time messages into the frame loop.

use lp_core::MidiMessage;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Create a bounded single-producer single-consumer queue.
pub fn midi_channel(capacity: usize) -> (MidiSender, MidiReceiver) {
    let (producer, consumer) = HeapRb::<MidiMessage>::new(capacity.max(1)).split();
    let dropped = Arc::new(AtomicU64::new(0));
    (
        MidiSender {
            producer,
            dropped: dropped.clone(),
        },
        MidiReceiver { consumer, dropped },
    )
}

/// Input-thread end. Never blocks; messages that do not fit are dropped.
pub struct MidiSender {
    producer: HeapProd<MidiMessage>,
    dropped: Arc<AtomicU64>,
}

impl MidiSender {
    /// Returns false if the queue was full.
    pub fn send(&mut self, message: MidiMessage) -> bool {
        if self.producer.try_push(message).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Forward a raw status byte. Bytes other than the handled real-time
    /// messages are ignored and return false.
    pub fn send_status(&mut self, status: u8) -> bool {
        match MidiMessage::from_status(status) {
            Some(message) => self.send(message),
            None => false,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Frame-loop end.
pub struct MidiReceiver {
    consumer: HeapCons<MidiMessage>,
    dropped: Arc<AtomicU64>,
}

impl MidiReceiver {
    pub fn try_recv(&mut self) -> Option<MidiMessage> {
        self.consumer.try_pop()
    }

    pub fn pending(&self) -> usize {
        self.consumer.occupied_len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
