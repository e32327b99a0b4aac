// -*- mode: rust; -*-
//
// This file is part of `yao-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Errors produced by the handoff and channel plumbing.

use crate::channel::MessageKey;
use std::fmt::{self, Display, Formatter};

/// Errors observed by the consumer or producer of a single-assignment future.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandoffError {
    /// The computation was aborted before a value arrived.
    Aborted(String),
    /// The promise was dropped without ever being fulfilled.
    PromiseDropped,
    /// A value was already written.
    AlreadyFulfilled,
}

/// Errors from the message transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelError {
    /// The peer hung up.
    Disconnected,
    /// A second message arrived for a key that was already delivered.
    DuplicateMessage(MessageKey),
    /// Delivering into the mailbox failed.
    Handoff(HandoffError),
}

impl From<HandoffError> for ChannelError {
    fn from(e: HandoffError) -> ChannelError {
        ChannelError::Handoff(e)
    }
}

impl Display for HandoffError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            HandoffError::Aborted(reason) => write!(f, "aborted: {}", reason),
            HandoffError::PromiseDropped => "promise dropped before being fulfilled".fmt(f),
            HandoffError::AlreadyFulfilled => "value already written".fmt(f),
        }
    }
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ChannelError::Disconnected => "peer disconnected".fmt(f),
            ChannelError::DuplicateMessage(key) => write!(f, "duplicate message for {}", key),
            ChannelError::Handoff(e) => write!(f, "handoff error: {}", e),
        }
    }
}

impl std::error::Error for HandoffError {}
impl std::error::Error for ChannelError {}
