//! Errors that may be output by this library.

use std::fmt::{self, Display, Formatter};
use yao_primitives::{ChannelError, HandoffError};

/// The two passes a gate can be asked to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Input-independent work.
    Setup,
    /// Input-dependent work.
    Online,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Phase::Setup => "setup".fmt(f),
            Phase::Online => "online".fmt(f),
        }
    }
}

/// Errors raised inside a gate pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum YaoError {
    /// Garbled material or decoding information from the peer is malformed
    /// or missing.
    ProtocolViolation(String),
    /// A future was aborted, or the transport failed.
    ChannelFailure(String),
    /// The oblivious transfer layer failed.
    OtError(yao_ot::Error),
    /// The engine was used in a way its API does not allow.
    ContractViolation(String),
    /// A configuration could not be parsed.
    InvalidConfig(String),
}

impl From<HandoffError> for YaoError {
    fn from(e: HandoffError) -> YaoError {
        YaoError::ChannelFailure(e.to_string())
    }
}

impl From<ChannelError> for YaoError {
    fn from(e: ChannelError) -> YaoError {
        match e {
            ChannelError::DuplicateMessage(key) => {
                YaoError::ProtocolViolation(format!("duplicate message {}", key))
            }
            e => YaoError::ChannelFailure(e.to_string()),
        }
    }
}

impl From<yao_ot::Error> for YaoError {
    fn from(e: yao_ot::Error) -> YaoError {
        match e {
            yao_ot::Error::HandoffError(e) => e.into(),
            yao_ot::Error::ChannelError(e) => e.into(),
            e => YaoError::OtError(e),
        }
    }
}

impl From<serde_json::Error> for YaoError {
    fn from(e: serde_json::Error) -> YaoError {
        YaoError::InvalidConfig(e.to_string())
    }
}

impl Display for YaoError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            YaoError::ProtocolViolation(s) => write!(f, "protocol violation: {}", s),
            YaoError::ChannelFailure(s) => write!(f, "channel failure: {}", s),
            YaoError::OtError(e) => write!(f, "oblivious transfer error: {}", e),
            YaoError::ContractViolation(s) => write!(f, "contract violation: {}", s),
            YaoError::InvalidConfig(s) => write!(f, "invalid configuration: {}", s),
        }
    }
}

impl std::error::Error for YaoError {}

/// Errors reported by the gate executor. A failed evaluation is reported
/// whole; no partial outputs are produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutorError {
    /// A gate pass failed.
    Gate {
        /// Id of the failing gate.
        gate_id: usize,
        /// The pass that failed.
        phase: Phase,
        /// What went wrong.
        source: YaoError,
    },
    /// The preprocessing callback failed.
    Preprocessing(YaoError),
    /// The synchronization callback failed.
    Synchronization(YaoError),
    /// The computation was aborted from elsewhere, e.g. by the peer.
    Aborted(String),
    /// A worker thread panicked.
    WorkerPanicked,
}

impl ExecutorError {
    /// The id of the gate that failed, if a gate failed.
    pub fn gate_id(&self) -> Option<usize> {
        match self {
            ExecutorError::Gate { gate_id, .. } => Some(*gate_id),
            _ => None,
        }
    }
}

impl Display for ExecutorError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ExecutorError::Gate {
                gate_id,
                phase,
                source,
            } => write!(f, "gate {} failed in {} phase: {}", gate_id, phase, source),
            ExecutorError::Preprocessing(e) => write!(f, "preprocessing failed: {}", e),
            ExecutorError::Synchronization(e) => write!(f, "synchronization failed: {}", e),
            ExecutorError::Aborted(reason) => write!(f, "evaluation aborted: {}", reason),
            ExecutorError::WorkerPanicked => "a worker thread panicked".fmt(f),
        }
    }
}

impl std::error::Error for ExecutorError {}
