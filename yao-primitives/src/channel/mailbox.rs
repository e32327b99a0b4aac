use super::{Message, MessageKey, Payload};
use crate::{
    errors::{ChannelError, HandoffError},
    sync::{promise, AbortRegistry, Abortable, BlockingFuture, Promise},
};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc, thread::JoinHandle};

struct Slot {
    promise: Option<Promise<Payload>>,
    future: BlockingFuture<Payload>,
    expected: bool,
}

impl Slot {
    fn new() -> Self {
        let (promise, future) = promise();
        Slot {
            promise: Some(promise),
            future,
            expected: false,
        }
    }
}

#[derive(Default)]
struct MailboxState {
    slots: HashMap<MessageKey, Slot>,
    closed: Option<String>,
}

/// Inbound messages, parked in single-assignment slots until a gate asks for
/// them. Delivery and request may happen in either order.
#[derive(Default)]
pub struct Mailbox {
    state: Mutex<MailboxState>,
}

impl Mailbox {
    /// Make an empty mailbox.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A future for the message with `key`.
    pub fn expect(&self, key: MessageKey) -> BlockingFuture<Payload> {
        let mut state = self.state.lock();
        let closed = state.closed.clone();
        let slot = state.slots.entry(key).or_insert_with(Slot::new);
        slot.expected = true;
        let future = slot.future.clone();
        if slot.promise.is_none() {
            state.slots.remove(&key);
        } else if let Some(reason) = closed {
            drop(state);
            future.abort(&reason);
        }
        future
    }

    /// Hand `payload` to whoever waits for `key`.
    pub fn deliver(&self, key: MessageKey, payload: Payload) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        let slot = state.slots.entry(key).or_insert_with(Slot::new);
        let promise = slot
            .promise
            .take()
            .ok_or(ChannelError::DuplicateMessage(key))?;
        if slot.expected {
            state.slots.remove(&key);
        }
        drop(state);
        log::trace!("delivered {}", key);
        promise.set(payload).map_err(ChannelError::from)
    }

    /// Fail every slot that has not been delivered yet, and every slot
    /// requested from now on.
    pub fn close(&self, reason: &str) {
        let pending: Vec<_> = {
            let mut state = self.state.lock();
            if state.closed.is_some() {
                return;
            }
            state.closed = Some(reason.to_string());
            state
                .slots
                .values()
                .filter(|slot| slot.promise.is_some())
                .map(|slot| slot.future.clone())
                .collect()
        };
        for future in pending {
            future.abort(reason);
        }
    }

    /// Number of slots still held.
    pub fn pending(&self) -> usize {
        self.state.lock().slots.len()
    }
}

impl Abortable for Mailbox {
    fn abort(&self, reason: &str) {
        self.close(reason);
    }
}

/// Route messages from `receiver` into `mailbox` until the peer hangs up.
///
/// A disconnect closes the mailbox, failing whatever is still awaited from
/// the peer. An abort notice from the peer, or a malformed message, aborts
/// the whole local computation through `aborts`.
pub fn spawn_dispatcher(
    receiver: Receiver<Message>,
    mailbox: Arc<Mailbox>,
    aborts: Arc<AbortRegistry>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("yao-dispatcher".to_string())
        .spawn(move || {
            for message in receiver.iter() {
                match message {
                    Message::Data { key, payload } => {
                        if let Err(e) = mailbox.deliver(key, payload) {
                            match e {
                                ChannelError::Handoff(HandoffError::Aborted(_)) => {}
                                e => {
                                    aborts.abort(&format!("protocol violation: {}", e));
                                }
                            }
                        }
                    }
                    Message::Abort(reason) => {
                        log::warn!("peer aborted: {}", reason);
                        aborts.abort(&format!("peer aborted: {}", reason));
                    }
                }
            }
            log::warn!("peer disconnected");
            mailbox.close("peer disconnected");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::{local_channel_pair, MessageTag, Transport},
        Block,
    };

    fn key(id: u64) -> MessageKey {
        MessageKey::new(id, MessageTag::InputLabels)
    }

    #[test]
    fn test_deliver_then_expect() {
        let mailbox = Mailbox::new();
        mailbox.deliver(key(1), Payload::Empty).unwrap();
        assert_eq!(mailbox.expect(key(1)).get(), Ok(Payload::Empty));
        assert_eq!(mailbox.pending(), 0);
    }

    #[test]
    fn test_expect_then_deliver() {
        let mailbox = Mailbox::new();
        let future = mailbox.expect(key(2));
        assert!(!future.is_ready());
        mailbox
            .deliver(key(2), Payload::Blocks(vec![Block::ZERO]))
            .unwrap();
        assert_eq!(future.get(), Ok(Payload::Blocks(vec![Block::ZERO])));
        assert_eq!(mailbox.pending(), 0);
    }

    #[test]
    fn test_duplicate_delivery() {
        let mailbox = Mailbox::new();
        mailbox.deliver(key(3), Payload::Empty).unwrap();
        assert_eq!(
            mailbox.deliver(key(3), Payload::Empty),
            Err(ChannelError::DuplicateMessage(key(3)))
        );
    }

    #[test]
    fn test_close_fails_pending_only() {
        let mailbox = Mailbox::new();
        mailbox.deliver(key(4), Payload::Empty).unwrap();
        let waiting = mailbox.expect(key(5));
        mailbox.close("gone");
        assert_eq!(mailbox.expect(key(4)).get(), Ok(Payload::Empty));
        assert!(waiting.is_failed());
        assert!(mailbox.expect(key(6)).is_failed());
    }

    #[test]
    fn test_dispatcher_routes_and_closes_on_disconnect() {
        let (a, b) = local_channel_pair();
        let mailbox = Mailbox::new();
        let aborts = AbortRegistry::new();
        let handle = spawn_dispatcher(b.receiver(), mailbox.clone(), aborts.clone()).unwrap();
        let pending = mailbox.expect(key(8));
        a.send(Message::Data {
            key: key(7),
            payload: Payload::Empty,
        })
        .unwrap();
        assert_eq!(mailbox.expect(key(7)).get(), Ok(Payload::Empty));
        drop(a);
        handle.join().unwrap();
        assert!(pending.get().is_err());
        assert!(!aborts.is_aborted());
    }

    #[test]
    fn test_dispatcher_peer_abort() {
        let (a, b) = local_channel_pair();
        let mailbox = Mailbox::new();
        let aborts = AbortRegistry::new();
        let _handle = spawn_dispatcher(b.receiver(), mailbox.clone(), aborts.clone()).unwrap();
        let pending = mailbox.expect(key(9));
        aborts.register_abortable(Arc::downgrade(&mailbox) as std::sync::Weak<dyn Abortable>);
        a.send(Message::Abort("boom".to_string())).unwrap();
        assert!(matches!(pending.get(), Err(HandoffError::Aborted(_))));
        assert!(aborts.is_aborted());
    }
}
