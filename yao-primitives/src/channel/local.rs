use super::{Message, TrafficStats, Transport};
use crate::errors::ChannelError;
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

/// One endpoint of an in-process connection between two parties.
pub struct LocalChannel {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    stats: Arc<TrafficStats>,
}

/// Make a connected pair of in-process channels.
pub fn local_channel_pair() -> (LocalChannel, LocalChannel) {
    let (a_tx, b_rx) = unbounded();
    let (b_tx, a_rx) = unbounded();
    (
        LocalChannel {
            sender: a_tx,
            receiver: a_rx,
            stats: Arc::new(TrafficStats::default()),
        },
        LocalChannel {
            sender: b_tx,
            receiver: b_rx,
            stats: Arc::new(TrafficStats::default()),
        },
    )
}

impl LocalChannel {
    /// The inbound side, for handing to a dispatcher.
    pub fn receiver(&self) -> Receiver<Message> {
        self.receiver.clone()
    }

    /// Counters of what this endpoint has written.
    pub fn stats(&self) -> Arc<TrafficStats> {
        self.stats.clone()
    }
}

impl Transport for LocalChannel {
    fn send(&self, message: Message) -> Result<(), ChannelError> {
        log::trace!("sending {:?}", message_summary(&message));
        self.stats.record(&message);
        self.sender
            .send(message)
            .map_err(|_| ChannelError::Disconnected)
    }
}

fn message_summary(message: &Message) -> String {
    match message {
        Message::Data { key, payload } => format!("{} ({} bytes)", key, payload.num_bytes()),
        Message::Abort(reason) => format!("abort ({})", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::{MessageKey, MessageTag, Payload},
        Block,
    };

    #[test]
    fn test_pair_and_stats() {
        let (a, b) = local_channel_pair();
        let key = MessageKey::new(3, MessageTag::GarbledTables);
        let payload = Payload::Blocks(vec![Block::ZERO; 2]);
        a.send(Message::Data {
            key,
            payload: payload.clone(),
        })
        .unwrap();
        assert_eq!(
            b.receiver().recv().unwrap(),
            Message::Data { key, payload }
        );
        assert_eq!(a.stats().messages_written(MessageTag::GarbledTables), 1);
        assert_eq!(a.stats().bytes_written(MessageTag::GarbledTables), 32);
        assert_eq!(a.stats().messages_written(MessageTag::Ot), 0);
        assert_eq!(b.stats().kilobytes_written(), 0.0);
    }

    #[test]
    fn test_send_after_peer_dropped() {
        let (a, b) = local_channel_pair();
        drop(b);
        assert_eq!(
            a.send(Message::Abort("x".to_string())),
            Err(ChannelError::Disconnected)
        );
    }
}
