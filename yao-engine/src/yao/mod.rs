//! The gates of Yao's protocol, one type per (role, operation).
//!
//! Garbler-side wires hold the zero label of every slot; the one label is the
//! zero label XOR the global delta, whose least significant bit is set, so the
//! permute bit of a label is its least significant bit. Evaluator-side wires
//! hold the active label. XOR and INV are free: no tables, no messages, no
//! OT. AND is garbled with half gates, two ciphertexts per slot.

mod and;
mod basic;
mod half_gate;
mod input;
mod output;

pub use and::{AndGateEvaluator, AndGateGarbler};
pub use basic::{InvGateEvaluator, InvGateGarbler, XorGateEvaluator, XorGateGarbler};
pub use input::{InputGateEvaluator, InputGateGarbler};
pub use output::{OutputGateEvaluator, OutputGateGarbler, OutputRecipient};

use crate::{
    errors::YaoError,
    provider::YaoProvider,
    wire::{WireId, WireKeys},
};
use bitvec::{slice::BitSlice, vec::BitVec};
use yao_primitives::{Block, BlockingFuture, Payload};

/// Plaintext bits of a bundle of wires: one `BitVec` per wire, one bit per
/// SIMD slot.
pub type BitValues = Vec<BitVec>;

pub(crate) fn check_values(
    values: &[BitVec],
    num_wires: usize,
    num_simd: usize,
) -> Result<(), YaoError> {
    if values.len() != num_wires || values.iter().any(|v| v.len() != num_simd) {
        return Err(YaoError::ContractViolation(format!(
            "expected {} wires of {} bits each",
            num_wires, num_simd
        )));
    }
    Ok(())
}

pub(crate) fn split_values(flat: &BitSlice, num_simd: usize) -> BitValues {
    flat.chunks(num_simd).map(|c| c.to_bitvec()).collect()
}

pub(crate) fn wire_keys(
    provider: &YaoProvider,
    wires: &[WireId],
) -> Result<Vec<WireKeys>, YaoError> {
    wires.iter().map(|w| provider.wires().keys(*w)).collect()
}

pub(crate) fn set_wire_keys(
    provider: &YaoProvider,
    wires: &[WireId],
    num_simd: usize,
    flat: &[Block],
) -> Result<(), YaoError> {
    if flat.len() != wires.len() * num_simd {
        return Err(YaoError::ProtocolViolation(format!(
            "expected {} labels, got {}",
            wires.len() * num_simd,
            flat.len()
        )));
    }
    for (w, keys) in wires.iter().zip(flat.chunks(num_simd)) {
        provider.wires().set_keys(*w, keys.to_vec())?;
    }
    Ok(())
}

pub(crate) fn permute_bits(keys: &[WireKeys]) -> BitVec {
    keys.iter()
        .flat_map(|k| k.iter().map(|b| b.lsb()))
        .collect()
}

pub(crate) fn receive_blocks(
    future: &BlockingFuture<Payload>,
    n: usize,
    what: &str,
) -> Result<Vec<Block>, YaoError> {
    future.with(|payload| match payload {
        Payload::Blocks(blocks) if blocks.len() == n => Ok(blocks.clone()),
        Payload::Blocks(blocks) => Err(YaoError::ProtocolViolation(format!(
            "expected {} {} blocks, got {}",
            n,
            what,
            blocks.len()
        ))),
        _ => Err(YaoError::ProtocolViolation(format!(
            "expected {} blocks",
            what
        ))),
    })?
}

pub(crate) fn receive_bits(
    future: &BlockingFuture<Payload>,
    n: usize,
    what: &str,
) -> Result<BitVec, YaoError> {
    future.with(|payload| match payload {
        Payload::Bits(bits) if bits.len() == n => Ok(bits.clone()),
        Payload::Bits(bits) => Err(YaoError::ProtocolViolation(format!(
            "expected {} {} bits, got {}",
            n,
            what,
            bits.len()
        ))),
        _ => Err(YaoError::ProtocolViolation(format!("expected {} bits", what))),
    })?
}

/// Allocate the output wires of a gate combining `a` and `b` slot-wise.
pub(crate) fn binary_outputs(
    provider: &YaoProvider,
    a: &[WireId],
    b: &[WireId],
) -> Result<(Vec<WireId>, usize), YaoError> {
    if a.is_empty() || a.len() != b.len() {
        return Err(YaoError::ContractViolation(format!(
            "binary gate over bundles of {} and {} wires",
            a.len(),
            b.len()
        )));
    }
    let num_simd = provider.wires().num_simd(a[0])?;
    for w in a.iter().chain(b.iter()) {
        if provider.wires().num_simd(*w)? != num_simd {
            return Err(YaoError::ContractViolation(
                "binary gate over wires of different widths".to_string(),
            ));
        }
    }
    Ok((provider.wires().new_wires(a.len(), num_simd), num_simd))
}

pub(crate) fn check_shape(num_wires: usize, num_simd: usize) -> Result<(), YaoError> {
    if num_wires == 0 || num_simd == 0 {
        return Err(YaoError::ContractViolation(format!(
            "cannot build a gate over {} wires of {} slots",
            num_wires, num_simd
        )));
    }
    Ok(())
}

pub(crate) fn unary_width(provider: &YaoProvider, a: &[WireId]) -> Result<usize, YaoError> {
    let num_simd = match a.first() {
        Some(w) => provider.wires().num_simd(*w)?,
        None => return Err(YaoError::ContractViolation("empty wire bundle".to_string())),
    };
    for w in a.iter() {
        if provider.wires().num_simd(*w)? != num_simd {
            return Err(YaoError::ContractViolation(
                "bundle of wires of different widths".to_string(),
            ));
        }
    }
    Ok(num_simd)
}
