// -*- mode: rust; -*-
//
// This file is part of `yao-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

#![allow(clippy::many_single_char_names)]

//! Building blocks shared by the garbled-circuit engine and the oblivious
//! transfer layer: 128-bit blocks, fixed-key AES (key schedule, counter-mode
//! keystream, correlation-robust hashes), an AES-based RNG, single-assignment
//! futures, and the message plumbing between the two parties.

mod aes;
mod block;
/// Module for encapsulating communication channels.
pub mod channel;
pub mod errors;
mod hash_aes;
mod rand_aes;
pub mod sync;

pub use crate::{
    aes::{
        aes128::{key_expansion, Aes128, AES_BLOCK_SIZE, AES_ROUND_KEYS_SIZE, FIXED_KEY_AES128},
        ctr::{ctr_stream_blocks, ctr_stream_blocks_unaligned, ctr_stream_single_block_unaligned},
    },
    block::Block,
    channel::{Message, MessageKey, MessageTag, Payload, Transport},
    errors::{ChannelError, HandoffError},
    hash_aes::{AesHash, AES_HASH},
    rand_aes::AesRng,
    sync::{promise, AbortRegistry, BlockingFuture, Promise},
};

/// A marker trait denoting that the given scheme is semi-honest secure.
pub trait SemiHonest {}
