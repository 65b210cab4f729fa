//! The transmit queue.
//!
//! Outgoing frames are queued whole and drained through a [`TxSink`] as the
//! underlying transport reports space, so a frame's header and payload may
//! be pushed out across many calls. A queue entry is popped only once its
//! payload has been fully handed to the sink.

use std::collections::VecDeque;

use crate::constants::{MessageType, FRAME_HEADER_SIZE};
use crate::frame::header_bytes;

/// The transport beneath the sender, typically an ASH-style acknowledged
/// byte pipe. `enqueue_tx` returns how many of the offered bytes the
/// transport accepted, which may be fewer than offered or zero.
pub trait TxSink {
    /// Whether the transport can accept any bytes right now.
    fn tx_space_available(&self) -> bool;

    /// Hand bytes to the transport; returns the number accepted.
    fn enqueue_tx(&mut self, data: &[u8]) -> usize;

    /// Called when a whole frame has been handed over.
    fn flush_tx(&mut self);
}

struct QueuedFrame {
    message_type: MessageType,
    payload: Vec<u8>,
}

/// FIFO of outgoing frames plus the partial-transmission cursor for the
/// frame at the head of the queue.
#[derive(Default)]
pub struct FrameSender {
    queue: VecDeque<QueuedFrame>,
    header: [u8; FRAME_HEADER_SIZE],
    header_index: usize,
    byte_index: usize,
    loading: bool,
}

impl FrameSender {
    /// Create an empty sender.
    pub fn new() -> Self {
        FrameSender {
            queue: VecDeque::new(),
            header: [0; FRAME_HEADER_SIZE],
            header_index: 0,
            byte_index: 0,
            loading: false,
        }
    }

    /// Queue one whole frame for transmission. The payload must be
    /// nonzero-length; the protocol forbids empty frames.
    pub fn send(&mut self, message_type: MessageType, payload: Vec<u8>) {
        assert!(!payload.is_empty(), "frame payload must be nonzero");
        self.queue.push_back(QueuedFrame {
            message_type,
            payload,
        });
    }

    /// Number of frames waiting (including one partially transmitted).
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Push queued bytes into `sink` while it has space. Safe to call from
    /// anywhere, including from code reached inside a drain already in
    /// progress; the nested call is a no-op rather than a recursive send.
    pub fn load_tx(&mut self, sink: &mut dyn TxSink) {
        if self.loading {
            // No loops please.
            return;
        }
        self.loading = true;

        loop {
            let Some(message) = self.queue.front() else {
                break;
            };
            if !sink.tx_space_available() {
                break;
            }

            let mut progressed = false;

            if self.header_index < FRAME_HEADER_SIZE {
                if self.header_index == 0 && self.byte_index == 0 {
                    self.header = header_bytes(message.message_type, message.payload.len());
                    log::debug!(
                        "tx frame start (type {:?}, length {})",
                        message.message_type,
                        message.payload.len()
                    );
                }
                let taken = sink.enqueue_tx(&self.header[self.header_index..]);
                self.header_index += taken;
                progressed |= taken > 0;
            }

            if self.header_index == FRAME_HEADER_SIZE {
                let taken = sink.enqueue_tx(&message.payload[self.byte_index..]);
                self.byte_index += taken;
                progressed |= taken > 0;

                if self.byte_index == message.payload.len() {
                    // Frame complete: flush and move to the next one.
                    sink.flush_tx();
                    self.queue.pop_front();
                    self.header_index = 0;
                    self.byte_index = 0;
                    continue;
                }
            }

            if !progressed {
                break;
            }
        }

        self.loading = false;
    }

    /// Drop all queued frames and any partial-transmission state.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.header_index = 0;
        self.byte_index = 0;
        self.loading = false;
    }
}
