//! Implementation of an **entirely insecure** oblivious transfer protocol for
//! testing purposes.
//!
//! The sender ships both messages of every pair and the receiver keeps the
//! one it chose.

use crate::{
    errors::Error,
    ot::{
        CorrelatedReceiver as OtCorrelatedReceiver, CorrelatedSender as OtCorrelatedSender,
        OtFuture, Receiver as OtReceiver, Sender as OtSender,
    },
};
use bitvec::{slice::BitSlice, vec::BitVec};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use yao_primitives::{
    channel::Mailbox, AesRng, Block, Message, MessageKey, MessageTag, Payload, Transport,
};

fn send_pairs(
    transport: &dyn Transport,
    id: u64,
    inputs: impl Iterator<Item = (Block, Block)>,
) -> Result<(), Error> {
    let blocks: Vec<Block> = inputs.flat_map(|(m0, m1)| [m0, m1]).collect();
    log::trace!("dummy OT {}: {} pairs", id, blocks.len() / 2);
    transport.send(Message::Data {
        key: MessageKey::new(id, MessageTag::Ot),
        payload: Payload::Blocks(blocks),
    })?;
    Ok(())
}

fn select(payload: &Payload, choices: &BitSlice) -> Result<Vec<Block>, Error> {
    let blocks = match payload {
        Payload::Blocks(blocks) => blocks,
        _ => return Err(Error::UnexpectedPayload),
    };
    if blocks.len() != 2 * choices.len() {
        return Err(Error::InvalidInputLength {
            got: blocks.len(),
            needed: 2 * choices.len(),
        });
    }
    Ok(blocks
        .chunks_exact(2)
        .zip(choices.iter())
        .map(|(pair, b)| if *b { pair[1] } else { pair[0] })
        .collect())
}

/// Oblivious transfer sender.
pub struct Sender {
    transport: Arc<dyn Transport>,
    transfers: AtomicUsize,
}

impl Sender {
    /// Make a sender writing to `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Sender {
            transport,
            transfers: AtomicUsize::new(0),
        }
    }

    /// Number of message pairs sent so far.
    pub fn num_transfers(&self) -> usize {
        self.transfers.load(Ordering::Relaxed)
    }
}

impl OtSender for Sender {
    fn send(&self, id: u64, inputs: &[(Block, Block)]) -> Result<(), Error> {
        self.transfers.fetch_add(inputs.len(), Ordering::Relaxed);
        send_pairs(self.transport.as_ref(), id, inputs.iter().copied())
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Dummy Sender")
    }
}

/// Oblivious transfer receiver, for both the plain and the correlated flavor.
pub struct Receiver {
    mailbox: Arc<Mailbox>,
    transfers: AtomicUsize,
}

impl Receiver {
    /// Make a receiver reading from `mailbox`.
    pub fn new(mailbox: Arc<Mailbox>) -> Self {
        Receiver {
            mailbox,
            transfers: AtomicUsize::new(0),
        }
    }

    /// Number of choices made so far.
    pub fn num_transfers(&self) -> usize {
        self.transfers.load(Ordering::Relaxed)
    }

    fn receive_pairs(&self, id: u64, choices: &BitSlice) -> OtFuture {
        self.transfers.fetch_add(choices.len(), Ordering::Relaxed);
        let choices: BitVec = choices.to_bitvec();
        let future = self.mailbox.expect(MessageKey::new(id, MessageTag::Ot));
        OtFuture::pending(future, move |payload| select(payload, &choices))
    }
}

impl OtReceiver for Receiver {
    fn receive(&self, id: u64, choices: &BitSlice) -> Result<OtFuture, Error> {
        Ok(self.receive_pairs(id, choices))
    }
}

impl OtCorrelatedReceiver for Receiver {
    fn receive_correlated(&self, id: u64, choices: &BitSlice) -> Result<OtFuture, Error> {
        Ok(self.receive_pairs(id, choices))
    }
}

impl std::fmt::Display for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Dummy Receiver")
    }
}

/// Fixed-XOR-correlated oblivious transfer sender.
pub struct CorrelatedSender {
    transport: Arc<dyn Transport>,
    delta: Block,
    rng: Mutex<AesRng>,
    transfers: AtomicUsize,
}

impl CorrelatedSender {
    /// Make a sender with offset `delta`, drawing zero messages from `rng`.
    pub fn new(transport: Arc<dyn Transport>, delta: Block, rng: AesRng) -> Self {
        CorrelatedSender {
            transport,
            delta,
            rng: Mutex::new(rng),
            transfers: AtomicUsize::new(0),
        }
    }

    /// Number of correlated pairs sent so far.
    pub fn num_transfers(&self) -> usize {
        self.transfers.load(Ordering::Relaxed)
    }
}

impl OtCorrelatedSender for CorrelatedSender {
    fn delta(&self) -> Block {
        self.delta
    }

    fn send_correlated(&self, id: u64, count: usize) -> Result<OtFuture, Error> {
        self.transfers.fetch_add(count, Ordering::Relaxed);
        let mut zeros = vec![Block::ZERO; count];
        self.rng.lock().fill_blocks(&mut zeros);
        let delta = self.delta;
        send_pairs(
            self.transport.as_ref(),
            id,
            zeros.iter().map(|k0| (*k0, *k0 ^ delta)),
        )?;
        Ok(OtFuture::ready(zeros))
    }
}

impl std::fmt::Display for CorrelatedSender {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Dummy Correlated Sender")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::*;

    #[test]
    fn test_select_rejects_short_payload() {
        let payload = Payload::Blocks(vec![Block::ZERO; 3]);
        assert_eq!(
            select(&payload, bits![0, 1]),
            Err(Error::InvalidInputLength { got: 3, needed: 4 })
        );
        assert_eq!(
            select(&Payload::Empty, bits![0]),
            Err(Error::UnexpectedPayload)
        );
    }

    #[test]
    fn test_select_picks_chosen() {
        let blocks: Vec<Block> = (0..4u128).map(Block::from).collect();
        let payload = Payload::Blocks(blocks);
        assert_eq!(
            select(&payload, bits![1, 0]).unwrap(),
            vec![Block::from(1), Block::from(2)]
        );
    }

    proptest::proptest! {
        #[test]
        fn test_select_matches_choices(
            pairs in proptest::collection::vec(proptest::prelude::any::<(u128, u128)>(), 1..32),
            seed in proptest::prelude::any::<u64>(),
        ) {
            let choices: BitVec = (0..pairs.len()).map(|i| (seed >> (i % 64)) & 1 == 1).collect();
            let blocks = pairs
                .iter()
                .flat_map(|(a, b)| [Block::from(*a), Block::from(*b)])
                .collect();
            let chosen = select(&Payload::Blocks(blocks), &choices).unwrap();
            for (i, (a, b)) in pairs.iter().enumerate() {
                let want = if choices[i] { *b } else { *a };
                proptest::prop_assert_eq!(chosen[i], Block::from(want));
            }
        }
    }
}
