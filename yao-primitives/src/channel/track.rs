use super::{Message, MessageTag};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters of the traffic written to a channel, per message tag.
#[derive(Debug, Default)]
pub struct TrafficStats {
    messages: [AtomicUsize; MessageTag::COUNT],
    bytes: [AtomicUsize; MessageTag::COUNT],
    aborts: AtomicUsize,
}

impl TrafficStats {
    pub(crate) fn record(&self, message: &Message) {
        match message {
            Message::Data { key, payload } => {
                let i = key.tag.index();
                self.messages[i].fetch_add(1, Ordering::Relaxed);
                self.bytes[i].fetch_add(payload.num_bytes(), Ordering::Relaxed);
            }
            Message::Abort(_) => {
                self.aborts.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of messages with `tag` written.
    pub fn messages_written(&self, tag: MessageTag) -> usize {
        self.messages[tag.index()].load(Ordering::Relaxed)
    }

    /// Number of payload bytes with `tag` written.
    pub fn bytes_written(&self, tag: MessageTag) -> usize {
        self.bytes[tag.index()].load(Ordering::Relaxed)
    }

    /// Number of abort notices written.
    pub fn aborts_written(&self) -> usize {
        self.aborts.load(Ordering::Relaxed)
    }

    /// Return the number of kilobytes written to the channel.
    pub fn kilobytes_written(&self) -> f64 {
        let total: usize = MessageTag::ALL
            .iter()
            .map(|tag| self.bytes_written(*tag))
            .sum();
        total as f64 / 1024.0
    }

    /// Clear all counters.
    pub fn clear(&self) {
        for counter in self.messages.iter().chain(self.bytes.iter()) {
            counter.store(0, Ordering::Relaxed);
        }
        self.aborts.store(0, Ordering::Relaxed);
    }
}
