//! Oblivious transfer traits + instantiations.
//!
//! This module provides traits for standard 1-out-of-2 oblivious transfer (OT)
//! and fixed-XOR-correlated OT, where every pair of messages differs by the
//! same offset `Δ`. The only instantiation is `dummy`, a completely insecure
//! OT for testing purposes.
//!
//! Every transfer is named by an `id` (the engine uses the gate id), which
//! lets the sender post its side in one phase and the receiver collect in
//! another, in either order.

pub mod dummy;

use crate::errors::Error;
use bitvec::slice::BitSlice;
use yao_primitives::{Block, BlockingFuture, Payload};

/// Instantiation of the dummy OT sender.
pub type DummySender = dummy::Sender;
/// Instantiation of the dummy OT receiver.
pub type DummyReceiver = dummy::Receiver;
/// Instantiation of the dummy correlated OT sender.
pub type DummyCorrelatedSender = dummy::CorrelatedSender;
/// Instantiation of the dummy correlated OT receiver.
pub type DummyCorrelatedReceiver = dummy::Receiver;

type Decoder = Box<dyn Fn(&Payload) -> Result<Vec<Block>, Error> + Send + Sync>;

/// The messages of a transfer, possibly still in flight.
pub struct OtFuture {
    inner: OtFutureInner,
}

enum OtFutureInner {
    Ready(Vec<Block>),
    Pending {
        future: BlockingFuture<Payload>,
        decode: Decoder,
    },
}

impl OtFuture {
    /// A transfer whose result is already known.
    pub fn ready(messages: Vec<Block>) -> Self {
        OtFuture {
            inner: OtFutureInner::Ready(messages),
        }
    }

    /// A transfer that completes when `future` does, post-processed by `decode`.
    pub fn pending(
        future: BlockingFuture<Payload>,
        decode: impl Fn(&Payload) -> Result<Vec<Block>, Error> + Send + Sync + 'static,
    ) -> Self {
        OtFuture {
            inner: OtFutureInner::Pending {
                future,
                decode: Box::new(decode),
            },
        }
    }

    /// Block until the transfer completes.
    pub fn wait(self) -> Result<Vec<Block>, Error> {
        match self.inner {
            OtFutureInner::Ready(messages) => Ok(messages),
            OtFutureInner::Pending { future, decode } => future.with(|payload| decode(payload))?,
        }
    }

    /// Whether [`OtFuture::wait`] would return without blocking.
    pub fn is_ready(&self) -> bool {
        match &self.inner {
            OtFutureInner::Ready(_) => true,
            OtFutureInner::Pending { future, .. } => future.is_ready() || future.is_failed(),
        }
    }
}

/// Trait for one-out-of-two oblivious transfer from the sender's point-of-view.
pub trait Sender: Send + Sync {
    /// Runs any one-time initialization, such as base OTs.
    fn init(&self) -> Result<(), Error> {
        Ok(())
    }
    /// Sends message pairs for transfer `id`. Does not wait for the receiver.
    fn send(&self, id: u64, inputs: &[(Block, Block)]) -> Result<(), Error>;
}

/// Trait for one-out-of-two oblivious transfer from the receiver's
/// point-of-view.
pub trait Receiver: Send + Sync {
    /// Runs any one-time initialization, such as base OTs.
    fn init(&self) -> Result<(), Error> {
        Ok(())
    }
    /// Receives the messages selected by `choices` for transfer `id`.
    fn receive(&self, id: u64, choices: &BitSlice) -> Result<OtFuture, Error>;
}

/// Trait for fixed-XOR-correlated oblivious transfer from the sender's
/// point-of-view.
///
/// The sender's offset `Δ` is fixed for the lifetime of the object. The
/// sender learns random zero messages `k₀`, the receiver learns
/// `k₀ ⊕ c·Δ` for its choice bits `c`. The sender's future resolves without
/// waiting for the receiver to choose.
pub trait CorrelatedSender: Send + Sync {
    /// Runs any one-time initialization, such as base OTs.
    fn init(&self) -> Result<(), Error> {
        Ok(())
    }
    /// The fixed offset between the two messages of every pair.
    fn delta(&self) -> Block;
    /// Runs `count` correlated transfers for `id`, returning the zero messages.
    fn send_correlated(&self, id: u64, count: usize) -> Result<OtFuture, Error>;
}

/// Trait for fixed-XOR-correlated oblivious transfer from the receiver's
/// point-of-view.
pub trait CorrelatedReceiver: Send + Sync {
    /// Runs any one-time initialization, such as base OTs.
    fn init(&self) -> Result<(), Error> {
        Ok(())
    }
    /// Receives `k₀ ⊕ c·Δ` for every choice bit `c` of transfer `id`.
    fn receive_correlated(&self, id: u64, choices: &BitSlice) -> Result<OtFuture, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::*;
    use std::sync::Arc;
    use yao_primitives::{
        channel::{local_channel_pair, spawn_dispatcher, Mailbox},
        AbortRegistry, AesRng,
    };

    struct Setup {
        sender_channel: Arc<yao_primitives::channel::LocalChannel>,
        receiver_mailbox: Arc<Mailbox>,
        _peer: yao_primitives::channel::LocalChannel,
    }

    fn setup() -> Setup {
        let (a, b) = local_channel_pair();
        let mailbox = Mailbox::new();
        spawn_dispatcher(b.receiver(), mailbox.clone(), AbortRegistry::new()).unwrap();
        Setup {
            sender_channel: Arc::new(a),
            receiver_mailbox: mailbox,
            _peer: b,
        }
    }

    fn rand_block_pairs(n: usize) -> Vec<(Block, Block)> {
        (0..n)
            .map(|_| (rand::random::<Block>(), rand::random::<Block>()))
            .collect()
    }

    fn rand_bits(n: usize) -> BitVec {
        (0..n).map(|_| rand::random::<bool>()).collect()
    }

    fn test_ot(sender: impl Sender, receiver: impl Receiver, n: usize) {
        let m0s = rand_block_pairs(n);
        let bs = rand_bits(n);
        sender.init().unwrap();
        receiver.init().unwrap();
        let pending = receiver.receive(7, &bs).unwrap();
        sender.send(7, &m0s).unwrap();
        let results = pending.wait().unwrap();
        for j in 0..n {
            assert_eq!(results[j], if bs[j] { m0s[j].1 } else { m0s[j].0 });
        }
    }

    fn test_correlated_ot(
        sender: impl CorrelatedSender,
        receiver: impl CorrelatedReceiver,
        n: usize,
    ) {
        let bs = rand_bits(n);
        let zeros = sender.send_correlated(9, n).unwrap().wait().unwrap();
        let results = receiver.receive_correlated(9, &bs).unwrap().wait().unwrap();
        let delta = sender.delta();
        for j in 0..n {
            assert_eq!(results[j], zeros[j] ^ delta.and_bit(bs[j]));
        }
    }

    #[test]
    fn test_dummy() {
        let s = setup();
        let sender = DummySender::new(s.sender_channel.clone());
        let receiver = DummyReceiver::new(s.receiver_mailbox.clone());
        test_ot(sender, receiver, 128);
    }

    #[test]
    fn test_dummy_correlated() {
        let s = setup();
        let delta = rand::random::<Block>().set_lsb();
        let sender =
            DummyCorrelatedSender::new(s.sender_channel.clone(), delta, AesRng::new());
        let receiver = DummyCorrelatedReceiver::new(s.receiver_mailbox.clone());
        test_correlated_ot(sender, receiver, 64);
    }

    #[test]
    fn test_ready_future() {
        let f = OtFuture::ready(vec![Block::ZERO]);
        assert!(f.is_ready());
        assert_eq!(f.wait(), Ok(vec![Block::ZERO]));
    }
}
