// -*- mode: rust; -*-
//
// This file is part of `yao-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Messages exchanged between the two parties, and the plumbing that moves
//! them: a [`Transport`] for the send side and a [`Mailbox`] that turns
//! inbound messages into single-assignment futures keyed by
//! [`MessageKey`].

mod local;
mod mailbox;
mod track;

pub use local::{local_channel_pair, LocalChannel};
pub use mailbox::{spawn_dispatcher, Mailbox};
pub use track::TrafficStats;

use crate::{errors::ChannelError, Block};
use bitvec::vec::BitVec;
use std::fmt::{self, Display, Formatter};

/// What a message carries. Together with an id this names the slot the
/// receiver waits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageTag {
    /// Active labels for inputs owned by the garbler.
    InputLabels,
    /// Oblivious transfer traffic.
    Ot,
    /// Garbled tables of AND gates.
    GarbledTables,
    /// Permute bits of output wires, sent by the garbler.
    DecodingInfo,
    /// Permute bits of the evaluator's active output labels.
    OutputBits,
    /// Synchronization barrier.
    Barrier,
}

impl MessageTag {
    /// Number of distinct tags.
    pub const COUNT: usize = 6;

    /// All tags, in declaration order.
    pub const ALL: [MessageTag; MessageTag::COUNT] = [
        MessageTag::InputLabels,
        MessageTag::Ot,
        MessageTag::GarbledTables,
        MessageTag::DecodingInfo,
        MessageTag::OutputBits,
        MessageTag::Barrier,
    ];

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Identifies one message: usually the id of the gate that sends it, plus its tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey {
    /// Gate id, or a sequence number for barriers.
    pub id: u64,
    /// What the message carries.
    pub tag: MessageTag,
}

impl MessageKey {
    /// Make a new key.
    pub fn new(id: u64, tag: MessageTag) -> Self {
        MessageKey { id, tag }
    }
}

impl Display for MessageKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}#{}", self.tag, self.id)
    }
}

/// The body of a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// A vector of 128-bit blocks (labels, tables, OT messages).
    Blocks(Vec<Block>),
    /// A vector of bits (permute bits, decoded values).
    Bits(BitVec),
    /// No body.
    Empty,
}

impl Payload {
    /// Size of the payload on the wire, in bytes.
    pub fn num_bytes(&self) -> usize {
        match self {
            Payload::Blocks(blocks) => blocks.len() * 16,
            Payload::Bits(bits) => (bits.len() + 7) / 8,
            Payload::Empty => 0,
        }
    }
}

/// A message between the parties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Data for one mailbox slot.
    Data {
        /// Slot the data is for.
        key: MessageKey,
        /// The data.
        payload: Payload,
    },
    /// The sender aborted its computation.
    Abort(String),
}

/// The sending half of a connection to the other party.
pub trait Transport: Send + Sync {
    /// Send `message` to the other party. Never blocks on the receiver.
    fn send(&self, message: Message) -> Result<(), ChannelError>;
}
