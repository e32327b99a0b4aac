// -*- mode: rust; -*-
//
// This file is part of yao-ot.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use yao_primitives::{ChannelError, HandoffError};

/// Errors produced by `yao-ot`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input length is invalid.
    InvalidInputLength {
        /// Number of messages received.
        got: usize,
        /// Number of messages expected.
        needed: usize,
    },
    /// The peer sent something other than blocks.
    UnexpectedPayload,
    /// The transport failed.
    ChannelError(ChannelError),
    /// The transfer was aborted or its producer went away.
    HandoffError(HandoffError),
    /// Some other error, given by `String`.
    Other(String),
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Error {
        Error::ChannelError(e)
    }
}

impl From<HandoffError> for Error {
    fn from(e: HandoffError) -> Error {
        Error::HandoffError(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidInputLength { got, needed } => {
                write!(f, "invalid input length: got {}, needed {}", got, needed)
            }
            Error::UnexpectedPayload => "unexpected payload".fmt(f),
            Error::ChannelError(e) => write!(f, "channel error: {}", e),
            Error::HandoffError(e) => write!(f, "handoff error: {}", e),
            Error::Other(s) => write!(f, "other error: {}", s),
        }
    }
}

impl std::error::Error for Error {}
